use std::sync::Arc;

use axum::extract::State;
use base64::{engine::general_purpose::STANDARD, Engine};
use macros::route;

use crate::{
	extract::{Admin, Form, Json, UploadedFile},
	openapi::tag,
	restorer::Restorer,
};

use super::{model, Error, RouteError};

/// Encodes an upload as a `data:` URI.
fn data_uri(file: &UploadedFile) -> String {
	let content_type = file
		.content_type
		.as_deref()
		.unwrap_or(model::FALLBACK_CONTENT_TYPE);

	format!("data:{content_type};base64,{}", STANDARD.encode(&file.data))
}

/// Restore photo
/// Sends the `image` part of a `multipart/form-data` body to the restoration
/// service and returns the URL of the restored image.
#[route(tag = tag::RESTORE, response(status = 200, description = "The photo was restored.", shape = "Json<model::Restored>"))]
pub async fn restore_photo(
	State(restorer): State<Arc<dyn Restorer>>,
	Admin(admin): Admin,
	mut form: Form,
) -> Result<Json<model::Restored>, RouteError> {
	let image = form.take_file("image").ok_or(Error::MissingImage)?;

	tracing::info!(user = %admin.user.id, bytes = image.data.len(), "restoring photo");

	let restored_image_url = restorer
		.restore(&data_uri(&image), model::FIDELITY)
		.await
		.map_err(Error::Restore)?;

	Ok(Json(model::Restored { restored_image_url }))
}

#[cfg(test)]
mod test {
	use axum::body::Bytes;

	use super::*;

	#[test]
	fn test_data_uri_falls_back_to_octet_stream() {
		let file = UploadedFile {
			file_name: Some("scan".into()),
			content_type: None,
			data: Bytes::from_static(b"abc"),
		};

		assert_eq!(data_uri(&file), "data:application/octet-stream;base64,YWJj");
	}
}
