//! Client for the remote image-restoration service.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

const REPLICATE_API: &str = "https://api.replicate.com/v1";

/// `sczhou/codeformer`, pinned to the version the service was built against.
pub const CODEFORMER_VERSION: &str =
	"cc4956dd26fa5a7185d5660cc9100fab1b8070a1d1654a8bb5eb6d443b020bb2";

const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Errors raised while restoring an image. The Display output is returned to
/// the caller verbatim.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("REPLICATE_API_TOKEN is not configured")]
	MissingToken,
	#[error("restoration request failed: {0}")]
	Http(#[from] reqwest::Error),
	#[error("restoration failed: {0}")]
	Failed(String),
	#[error("restoration was canceled")]
	Canceled,
	#[error("restoration finished without an output")]
	NoOutput,
}

/// A service that restores a degraded photo.
#[axum::async_trait]
pub trait Restorer: Send + Sync {
	/// Restores the image given as a `data:` URI and returns the URL of the
	/// restored image. `fidelity` trades quality (0) against faithfulness (1).
	async fn restore(&self, image: &str, fidelity: f64) -> Result<String, Error>;
}

#[derive(Serialize)]
struct PredictionInput<'a> {
	image: &'a str,
	codeformer_fidelity: f64,
}

#[derive(Serialize)]
struct PredictionRequest<'a> {
	version: &'a str,
	input: PredictionInput<'a>,
}

#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
enum Status {
	Starting,
	Processing,
	Succeeded,
	Failed,
	Canceled,
	/// Any status this client does not know about.
	#[serde(other)]
	Unknown,
}

#[derive(Debug, Deserialize)]
struct PredictionUrls {
	get: String,
}

#[derive(Debug, Deserialize)]
struct Prediction {
	id: String,
	status: Status,
	#[serde(default)]
	output: Option<Value>,
	#[serde(default)]
	error: Option<Value>,
	urls: Option<PredictionUrls>,
}

impl Prediction {
	/// The final result, or `None` while the prediction is still running.
	fn outcome(&mut self) -> Option<Result<String, Error>> {
		match self.status {
			Status::Starting | Status::Processing => None,
			Status::Succeeded => Some(self.output.take().and_then(output_url).ok_or(Error::NoOutput)),
			Status::Failed => {
				let reason = self
					.error
					.take()
					.map_or_else(|| "unknown error".into(), value_to_string);

				Some(Err(Error::Failed(reason)))
			}
			Status::Canceled => Some(Err(Error::Canceled)),
			Status::Unknown => Some(Err(Error::Failed("unexpected prediction status".into()))),
		}
	}
}

/// [`Restorer`] backed by the Replicate predictions API.
#[derive(Clone)]
pub struct Replicate {
	client: Client,
	token: Option<String>,
	base_url: String,
}

impl Replicate {
	pub fn new(token: Option<String>) -> Self {
		Self {
			client: Client::new(),
			token,
			base_url: REPLICATE_API.into(),
		}
	}

	async fn fetch(&self, url: &str, token: &str) -> Result<Prediction, Error> {
		Ok(self
			.client
			.get(url)
			.bearer_auth(token)
			.send()
			.await?
			.error_for_status()?
			.json()
			.await?)
	}
}

#[axum::async_trait]
impl Restorer for Replicate {
	#[tracing::instrument(skip(self, image), fields(bytes = image.len()))]
	async fn restore(&self, image: &str, fidelity: f64) -> Result<String, Error> {
		let token = self.token.as_deref().ok_or(Error::MissingToken)?;

		let mut prediction: Prediction = self
			.client
			.post(format!("{}/predictions", self.base_url))
			.bearer_auth(token)
			// blocks until the prediction finishes or a server-side timeout hits
			.header("Prefer", "wait")
			.json(&PredictionRequest {
				version: CODEFORMER_VERSION,
				input: PredictionInput {
					image,
					codeformer_fidelity: fidelity,
				},
			})
			.send()
			.await?
			.error_for_status()?
			.json()
			.await?;

		tracing::debug!(id = %prediction.id, status = ?prediction.status, "prediction created");

		loop {
			if let Some(outcome) = prediction.outcome() {
				return outcome;
			}

			tokio::time::sleep(POLL_INTERVAL).await;

			let url = prediction.urls.as_ref().map_or_else(
				|| format!("{}/predictions/{}", self.base_url, prediction.id),
				|urls| urls.get.clone(),
			);

			prediction = self.fetch(&url, token).await?;
		}
	}
}

fn value_to_string(value: Value) -> String {
	match value {
		Value::String(string) => string,
		other => other.to_string(),
	}
}

/// Renders a prediction output as a URL.
///
/// Models return either a single URL or a list of them; for a list the first
/// URL is used.
fn output_url(output: Value) -> Option<String> {
	match output {
		Value::Null => None,
		Value::String(url) => Some(url),
		Value::Array(items) => items.into_iter().find_map(|item| match item {
			Value::String(url) => Some(url),
			_ => None,
		}),
		other => Some(other.to_string()),
	}
}

#[cfg(test)]
mod test {
	use serde_json::json;

	use super::*;

	#[test]
	fn test_output_url() {
		assert_eq!(
			output_url(json!("https://example.com/out.png")).as_deref(),
			Some("https://example.com/out.png")
		);
		assert_eq!(
			output_url(json!([null, "https://example.com/a.png", "https://example.com/b.png"]))
				.as_deref(),
			Some("https://example.com/a.png")
		);
		assert_eq!(output_url(Value::Null), None);
		assert_eq!(output_url(json!([])), None);
	}

	#[test]
	fn test_prediction_parses() {
		let prediction: Prediction = serde_json::from_value(json!({
			"id": "abc",
			"status": "processing",
			"urls": { "get": "https://api.replicate.com/v1/predictions/abc", "cancel": "x" },
			"logs": ""
		}))
		.unwrap();

		assert_eq!(prediction.status, Status::Processing);
		assert!(prediction.output.is_none());
		assert_eq!(
			prediction.urls.unwrap().get,
			"https://api.replicate.com/v1/predictions/abc"
		);
	}

	#[test]
	fn test_unknown_status_ends_the_prediction() {
		let mut prediction: Prediction = serde_json::from_value(json!({
			"id": "abc",
			"status": "aborted",
			"urls": { "get": "https://api.replicate.com/v1/predictions/abc" }
		}))
		.unwrap();

		assert_eq!(prediction.status, Status::Unknown);
		assert!(matches!(
			prediction.outcome(),
			Some(Err(Error::Failed(reason))) if reason == "unexpected prediction status"
		));
	}

	#[test]
	fn test_outcome() {
		let mut prediction: Prediction = serde_json::from_value(json!({
			"id": "abc",
			"status": "starting"
		}))
		.unwrap();

		assert!(prediction.outcome().is_none());

		prediction.status = Status::Succeeded;
		prediction.output = Some(json!(["https://example.com/out.png"]));

		assert_eq!(
			prediction.outcome().unwrap().unwrap(),
			"https://example.com/out.png"
		);

		prediction.status = Status::Failed;
		prediction.error = Some(json!("out of memory"));

		assert!(matches!(
			prediction.outcome(),
			Some(Err(Error::Failed(reason))) if reason == "out of memory"
		));
	}

	#[test]
	fn test_request_body() {
		let body = serde_json::to_value(PredictionRequest {
			version: CODEFORMER_VERSION,
			input: PredictionInput {
				image: "data:image/png;base64,AAAA",
				codeformer_fidelity: 0.7,
			},
		})
		.unwrap();

		assert_eq!(
			body,
			json!({
				"version": CODEFORMER_VERSION,
				"input": {
					"image": "data:image/png;base64,AAAA",
					"codeformer_fidelity": 0.7
				}
			})
		);
	}

	#[tokio::test]
	async fn test_missing_token() {
		let error = Replicate::new(None)
			.restore("data:image/png;base64,AAAA", 0.7)
			.await
			.unwrap_err();

		assert!(matches!(error, Error::MissingToken));
	}
}
