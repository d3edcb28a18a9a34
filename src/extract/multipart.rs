use std::collections::HashMap;

use aide::OperationInput;
use axum::{
	body::Bytes,
	extract::{FromRequest, Multipart, Request},
};

use crate::error::AppError;

/// A file received as part of a multipart form.
#[derive(Debug)]
pub struct UploadedFile {
	/// The file name declared by the client.
	pub file_name: Option<String>,
	/// The content type declared by the client.
	pub content_type: Option<String>,
	pub data: Bytes,
}

/// Extractor that reads a whole `multipart/form-data` body.
///
/// Parts that carry a file name are collected as files, every other part is
/// read as text. When a name repeats, the last part wins. A file part with
/// neither a name nor content counts as absent.
#[derive(Debug, Default)]
pub struct Form {
	text: HashMap<String, String>,
	files: HashMap<String, UploadedFile>,
}

impl Form {
	pub fn text(&self, name: &str) -> Option<&str> {
		self.text.get(name).map(String::as_str)
	}

	pub fn take_file(&mut self, name: &str) -> Option<UploadedFile> {
		self.files.remove(name)
	}
}

#[axum::async_trait]
impl<S> FromRequest<S> for Form
where
	S: Send + Sync,
{
	type Rejection = AppError;

	async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
		let mut multipart = Multipart::from_request(req, state).await?;
		let mut form = Self::default();

		while let Some(field) = multipart.next_field().await? {
			let Some(name) = field.name().map(str::to_owned) else {
				continue;
			};

			if field.file_name().is_some() {
				let file_name = field.file_name().map(str::to_owned);
				let content_type = field.content_type().map(str::to_owned);
				let data = field.bytes().await?;

				// browsers send an empty part for a file input left blank
				if data.is_empty() && file_name.as_deref() == Some("") {
					continue;
				}

				form.files.insert(
					name,
					UploadedFile {
						file_name,
						content_type,
						data,
					},
				);
			} else {
				form.text.insert(name, field.text().await?);
			}
		}

		Ok(form)
	}
}

impl OperationInput for Form {}
