use schemars::JsonSchema;
use serde::Serialize;

/// Trades quality (0) against faithfulness to the input (1).
pub const FIDELITY: f64 = 0.7;

/// Used when an upload does not declare its content type.
pub const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

#[derive(Debug, Serialize, JsonSchema)]
pub struct Restored {
	/// Where the restored image can be downloaded.
	pub restored_image_url: String,
}
