pub use crate::route::model::Paginate;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Directory below the media root that admin uploads are stored in.
pub const UPLOAD_DIR: &str = "admin_files";

/// A file uploaded by an administrator.
#[derive(Debug, Serialize, JsonSchema, sqlx::FromRow)]
pub struct AdminFile {
	/// The unique identifier of the file.
	pub id: Uuid,
	/// An optional description of the file.
	pub description: Option<String>,
	/// The URL the file is served from.
	#[serde(serialize_with = "crate::media::serialize_url")]
	pub file: String,
	/// The administrator that uploaded the file.
	#[serde(rename = "uploader")]
	pub uploader_id: Uuid,
	/// The uploader's username.
	#[sqlx(default)]
	pub uploader_username: String,
	/// The upload time of the file.
	pub uploaded_at: chrono::DateTime<chrono::Utc>,
}

/// The text fields of the multipart form used to upload or change a file.
/// The file itself is sent in the `file` part.
#[derive(Debug, Validate)]
pub struct AdminFileForm {
	#[validate(length(max = 255))]
	pub description: Option<String>,
}

#[derive(Deserialize, Validate, JsonSchema)]
pub struct AdminFilePath {
	/// The unique identifier of the file.
	pub id: Uuid,
}
