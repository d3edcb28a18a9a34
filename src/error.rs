use std::borrow::Cow;

use axum::{
	body::Body,
	extract::rejection,
	http::{Response, StatusCode},
	response::IntoResponse,
};
use axum_jsonschema::JsonSchemaRejection;
use schemars::JsonSchema;
use serde::Serialize;

use crate::permission::Denied;

pub type Map = serde_json::Map<String, serde_json::Value>;

/// A single error message sent to the client.
#[derive(Debug, Serialize, JsonSchema)]
pub struct Message<'a> {
	/// A human-readable description of the problem.
	pub content: Cow<'a, str>,
	/// The input field that caused the error, if any.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub field: Option<Cow<'a, str>>,
	/// Extra machine-readable context.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub details: Option<Cow<'a, Map>>,
}

impl<'a> Message<'a> {
	pub fn new(content: impl Into<Cow<'a, str>>) -> Self {
		Self {
			content: content.into(),
			field: None,
			details: None,
		}
	}

	#[must_use]
	pub fn field(mut self, field: impl Into<Cow<'a, str>>) -> Self {
		self.field = Some(field.into());
		self
	}

	#[must_use]
	pub fn detail(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
		self.details
			.get_or_insert_with(|| Cow::Owned(Map::new()))
			.to_mut()
			.insert(key.into(), value.into());
		self
	}

	pub fn into_vec(self) -> Vec<Self> {
		vec![self]
	}
}

/// The body of every error response.
#[derive(Debug, Serialize, JsonSchema)]
pub struct ErrorBody {
	/// A summary of what went wrong.
	pub error: String,
	/// Individual messages, omitted when there is nothing beyond the summary.
	#[serde(skip_serializing_if = "Vec::is_empty")]
	pub errors: Vec<Message<'static>>,
}

pub fn respond(
	status: StatusCode,
	error: impl Into<String>,
	errors: Vec<Message<'static>>,
) -> Response<Body> {
	(
		status,
		axum::Json(ErrorBody {
			error: error.into(),
			errors,
		}),
	)
		.into_response()
}

/// The shape of a route-specific error: which status it maps to and which
/// messages it carries. The [`std::fmt::Display`] output becomes the `error`
/// field of the response, so it must not contain sensitive information.
pub trait ErrorShape: std::error::Error {
	fn status(&self) -> StatusCode;

	fn into_errors(self) -> Vec<Message<'static>>
	where
		Self: Sized,
	{
		Vec::new()
	}
}

/// Errors shared by every route: extraction, validation, permissions and
/// infrastructure failures.
///
/// The Display output of the infrastructure variants is logged but never
/// sent to the client.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
	#[error("validation error: {0}")]
	Validation(#[from] validator::ValidationErrors),
	#[error("invalid json body")]
	Json(JsonSchemaRejection),
	#[error("invalid query string: {0}")]
	Query(#[from] rejection::QueryRejection),
	#[error("invalid path: {0}")]
	Path(#[from] rejection::PathRejection),
	#[error("invalid multipart body: {0}")]
	MultipartRejection(#[from] axum::extract::multipart::MultipartRejection),
	#[error("invalid multipart body: {0}")]
	Multipart(#[from] axum::extract::multipart::MultipartError),
	#[error("{0}")]
	Permission(#[from] Denied),
	#[error("database error: {0}")]
	Database(#[from] sqlx::Error),
	#[error("io error: {0}")]
	Io(#[from] std::io::Error),
}

impl From<JsonSchemaRejection> for AppError {
	fn from(rejection: JsonSchemaRejection) -> Self {
		Self::Json(rejection)
	}
}

impl IntoResponse for AppError {
	fn into_response(self) -> Response<Body> {
		match self {
			Self::Validation(errors) => {
				let messages = errors
					.field_errors()
					.into_iter()
					.flat_map(|(field, errors)| {
						errors.iter().map(move |error| {
							let content = error.message.as_ref().map_or_else(
								|| error.code.to_string(),
								ToString::to_string,
							);

							Message::new(content).field(field.to_string())
						})
					})
					.collect();

				respond(StatusCode::BAD_REQUEST, "validation failed", messages)
			}
			Self::Json(rejection) => rejection.into_response(),
			Self::Query(rejection) => {
				respond(rejection.status(), rejection.body_text(), Vec::new())
			}
			Self::Path(rejection) => respond(rejection.status(), rejection.body_text(), Vec::new()),
			Self::MultipartRejection(rejection) => {
				respond(rejection.status(), rejection.body_text(), Vec::new())
			}
			Self::Multipart(error) => respond(error.status(), error.body_text(), Vec::new()),
			Self::Permission(denied) => {
				let status = match denied {
					Denied::Unauthenticated => StatusCode::UNAUTHORIZED,
					Denied::Forbidden => StatusCode::FORBIDDEN,
				};

				respond(status, denied.to_string(), Vec::new())
			}
			Self::Database(..) | Self::Io(..) => {
				tracing::error!(error = %self, "request failed");

				respond(
					StatusCode::INTERNAL_SERVER_ERROR,
					"internal server error",
					Vec::new(),
				)
			}
		}
	}
}

/// The error type returned by handlers: either a shared [`AppError`] or the
/// route's own error `E`.
#[derive(Debug)]
pub enum RouteError<E> {
	App(AppError),
	Route(E),
}

impl<E: ErrorShape> From<E> for RouteError<E> {
	fn from(error: E) -> Self {
		Self::Route(error)
	}
}

impl<E> From<AppError> for RouteError<E> {
	fn from(error: AppError) -> Self {
		Self::App(error)
	}
}

impl<E> From<sqlx::Error> for RouteError<E> {
	fn from(error: sqlx::Error) -> Self {
		Self::App(AppError::Database(error))
	}
}

impl<E> From<std::io::Error> for RouteError<E> {
	fn from(error: std::io::Error) -> Self {
		Self::App(AppError::Io(error))
	}
}

impl<E> From<Denied> for RouteError<E> {
	fn from(denied: Denied) -> Self {
		Self::App(AppError::Permission(denied))
	}
}

impl<E: ErrorShape> IntoResponse for RouteError<E> {
	fn into_response(self) -> Response<Body> {
		match self {
			Self::App(error) => error.into_response(),
			Self::Route(error) => {
				let status = error.status();
				let summary = error.to_string();

				if status.is_server_error() {
					tracing::error!(error = %summary, "request failed");
				}

				respond(status, summary, error.into_errors())
			}
		}
	}
}

impl<E> aide::OperationOutput for RouteError<E> {
	type Inner = ErrorBody;
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn test_message_details_accumulate() {
		let message = Message::new("unknown post")
			.detail("post", "abc")
			.detail("kind", 1);

		let details = message.details.expect("details should be set");

		assert_eq!(details["post"], "abc");
		assert_eq!(details["kind"], 1);
	}

	#[test]
	fn test_error_body_omits_empty_errors() {
		let body = serde_json::to_value(ErrorBody {
			error: "boom".into(),
			errors: Vec::new(),
		})
		.unwrap();

		assert_eq!(body, serde_json::json!({ "error": "boom" }));
	}
}
