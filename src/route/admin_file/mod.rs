use aide::axum::{routing::get_with, ApiRouter};
use axum::http::StatusCode;
use uuid::Uuid;

use crate::{error, AppState};

pub mod model;
pub mod route;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("unknown file")]
	UnknownFile(Uuid),
	#[error("no file was submitted")]
	MissingFile,
}

pub type RouteError = error::RouteError<Error>;

pub fn routes() -> ApiRouter<AppState> {
	use route::*;

	ApiRouter::new()
		.api_route(
			"/",
			get_with(list_admin_files, list_admin_files_docs)
				.post_with(create_admin_file, create_admin_file_docs),
		)
		.api_route(
			"/:id",
			get_with(get_admin_file, get_admin_file_docs)
				.put_with(update_admin_file, update_admin_file_docs)
				.patch_with(update_admin_file, update_admin_file_docs)
				.delete_with(delete_admin_file, delete_admin_file_docs),
		)
}

impl error::ErrorShape for Error {
	fn status(&self) -> StatusCode {
		match self {
			Self::UnknownFile(..) => StatusCode::NOT_FOUND,
			Self::MissingFile => StatusCode::BAD_REQUEST,
		}
	}

	fn into_errors(self) -> Vec<error::Message<'static>> {
		let message = error::Message::new(self.to_string());

		match self {
			Self::UnknownFile(file) => message.detail("file", file.to_string()),
			Self::MissingFile => message.field("file"),
		}
		.into_vec()
	}
}
