use aide::axum::IntoApiResponse;
use axum::{extract::State, http::StatusCode, response::IntoResponse};
use macros::route;
use uuid::Uuid;
use validator::Validate;

use crate::{
	extract::{Admin, Form, Json, Path, Query},
	media::MediaStore,
	openapi::tag,
	Database,
};

use super::{model, Error, RouteError};

const SELECT_ADMIN_FILE: &str = r#"
	SELECT admin_file.*, "user".username AS uploader_username
	FROM admin_file
	JOIN "user" ON "user".id = admin_file.uploader_id
"#;

async fn fetch_admin_file(database: &Database, id: Uuid) -> Result<model::AdminFile, RouteError> {
	let file = sqlx::query_as::<_, model::AdminFile>(&format!(
		"{SELECT_ADMIN_FILE} WHERE admin_file.id = ?"
	))
	.bind(id)
	.fetch_optional(database)
	.await?;

	Ok(file.ok_or(Error::UnknownFile(id))?)
}

/// Reads and validates the text fields of an upload form.
fn read_form(form: &Form) -> Result<model::AdminFileForm, RouteError> {
	let input = model::AdminFileForm {
		description: form.text("description").map(str::to_owned),
	};

	input.validate().map_err(crate::error::AppError::from)?;
	Ok(input)
}

/// Get all files
/// Returns all uploaded files, newest first. Pass `page` and/or `size` to
/// paginate.
#[route(tag = tag::ADMIN_FILE)]
pub async fn list_admin_files(
	State(database): State<Database>,
	_admin: Admin,
	Query(paginate): Query<model::Paginate>,
) -> Result<Json<Vec<model::AdminFile>>, RouteError> {
	let files = sqlx::query_as::<_, model::AdminFile>(&format!(
		"{SELECT_ADMIN_FILE} ORDER BY admin_file.uploaded_at DESC, admin_file.rowid DESC LIMIT ? OFFSET ?"
	))
	.bind(paginate.limit())
	.bind(paginate.offset())
	.fetch_all(&database)
	.await?;

	Ok(Json(files))
}

/// Get single file
#[route(tag = tag::ADMIN_FILE)]
pub async fn get_admin_file(
	State(database): State<Database>,
	_admin: Admin,
	Path(path): Path<model::AdminFilePath>,
) -> Result<Json<model::AdminFile>, RouteError> {
	Ok(Json(fetch_admin_file(&database, path.id).await?))
}

/// Upload file
/// Uploads a file as `multipart/form-data`: the `file` part is required,
/// `description` is optional.
#[route(tag = tag::ADMIN_FILE)]
pub async fn create_admin_file(
	State(database): State<Database>,
	State(media): State<MediaStore>,
	Admin(admin): Admin,
	mut form: Form,
) -> Result<Json<model::AdminFile>, RouteError> {
	let input = read_form(&form)?;
	let file = form.take_file("file").ok_or(Error::MissingFile)?;

	let stored = media
		.save(model::UPLOAD_DIR, file.file_name.as_deref(), &file.data)
		.await?;

	let id = Uuid::new_v4();
	let inserted = sqlx::query(
		r#"
			INSERT INTO admin_file (id, description, file, uploader_id, uploaded_at)
			VALUES (?, ?, ?, ?, ?)
		"#,
	)
	.bind(id)
	.bind(input.description.filter(|description| !description.is_empty()))
	.bind(&stored)
	.bind(admin.user.id)
	.bind(chrono::Utc::now())
	.execute(&database)
	.await;

	if let Err(error) = inserted {
		if let Err(cleanup) = media.remove(&stored).await {
			tracing::warn!(file = %stored, error = %cleanup, "failed to remove orphaned upload");
		}

		return Err(error.into());
	}

	tracing::info!(file = %id, uploader = %admin.user.id, bytes = file.data.len(), "uploaded file");

	Ok(Json(fetch_admin_file(&database, id).await?))
}

/// Update file
/// Changes the description and/or replaces the stored file. Both parts are
/// optional; an empty `description` clears it.
#[route(tag = tag::ADMIN_FILE)]
pub async fn update_admin_file(
	State(database): State<Database>,
	State(media): State<MediaStore>,
	_admin: Admin,
	Path(path): Path<model::AdminFilePath>,
	mut form: Form,
) -> Result<Json<model::AdminFile>, RouteError> {
	let existing = fetch_admin_file(&database, path.id).await?;
	let input = read_form(&form)?;

	let replacement = match form.take_file("file") {
		Some(file) => Some(
			media
				.save(model::UPLOAD_DIR, file.file_name.as_deref(), &file.data)
				.await?,
		),
		None => None,
	};

	let description = input.description.as_deref();

	let updated = sqlx::query(
		r#"
			UPDATE admin_file
			SET
				description = CASE WHEN ? THEN NULLIF(?, '') ELSE description END,
				file = COALESCE(?, file)
			WHERE id = ?
		"#,
	)
	.bind(description.is_some())
	.bind(description)
	.bind(replacement.as_deref())
	.bind(existing.id)
	.execute(&database)
	.await;

	if let Err(error) = updated {
		if let Some(replacement) = &replacement {
			if let Err(cleanup) = media.remove(replacement).await {
				tracing::warn!(file = %replacement, error = %cleanup, "failed to remove orphaned upload");
			}
		}

		return Err(error.into());
	}

	if replacement.is_some() {
		if let Err(error) = media.remove(&existing.file).await {
			tracing::warn!(file = %existing.file, %error, "failed to remove replaced upload");
		}
	}

	Ok(Json(fetch_admin_file(&database, existing.id).await?))
}

/// Delete file
/// Deletes the record and, best-effort, the stored file.
#[route(tag = tag::ADMIN_FILE, response(status = 204, description = "The file was deleted."))]
pub async fn delete_admin_file(
	State(database): State<Database>,
	State(media): State<MediaStore>,
	_admin: Admin,
	Path(path): Path<model::AdminFilePath>,
) -> Result<impl IntoApiResponse, RouteError> {
	let existing = fetch_admin_file(&database, path.id).await?;

	sqlx::query("DELETE FROM admin_file WHERE id = ?")
		.bind(existing.id)
		.execute(&database)
		.await?;

	if let Err(error) = media.remove(&existing.file).await {
		tracing::warn!(file = %existing.file, %error, "failed to remove deleted upload");
	}

	Ok(StatusCode::NO_CONTENT.into_response())
}
