use aide::axum::{routing::post_with, ApiRouter};
use axum::http::StatusCode;

use crate::{error, restorer, AppState};

pub mod model;
pub mod route;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("no image was submitted")]
	MissingImage,
	#[error("{0}")]
	Restore(#[from] restorer::Error),
}

pub type RouteError = error::RouteError<Error>;

pub fn routes() -> ApiRouter<AppState> {
	use route::*;

	ApiRouter::new().api_route("/", post_with(restore_photo, restore_photo_docs))
}

impl error::ErrorShape for Error {
	fn status(&self) -> StatusCode {
		match self {
			Self::MissingImage => StatusCode::BAD_REQUEST,
			Self::Restore(..) => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}
}
