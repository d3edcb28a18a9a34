use aide::axum::IntoApiResponse;
use axum::{extract::State, http::StatusCode, response::IntoResponse};
use macros::route;
use uuid::Uuid;

use crate::{
	extract::{Json, MaybeSession, Path},
	openapi::tag,
	permission::{self, Access},
	route::post::model::PostPath,
	Database,
};

use super::{model, Error, RouteError};

const SELECT_COMMENT: &str = r#"
	SELECT comment.*, "user".username AS author_username
	FROM comment
	LEFT JOIN "user" ON "user".id = comment.author_id
"#;

/// Returns the comments of a post, oldest first.
pub(crate) async fn fetch_comments(
	database: &Database,
	post_id: Uuid,
) -> Result<Vec<model::Comment>, sqlx::Error> {
	let comments = sqlx::query_as::<_, model::Comment>(&format!(
		"{SELECT_COMMENT} WHERE comment.post_id = ? ORDER BY comment.created_at ASC, comment.rowid ASC"
	))
	.bind(post_id)
	.fetch_all(database)
	.await?;

	Ok(comments.into_iter().map(model::Comment::resolve).collect())
}

/// Fetches a comment, which must belong to the post in the path.
async fn fetch_comment(
	database: &Database,
	path: &model::CommentPath,
) -> Result<model::Comment, RouteError> {
	let comment = sqlx::query_as::<_, model::Comment>(&format!(
		"{SELECT_COMMENT} WHERE comment.id = ? AND comment.post_id = ?"
	))
	.bind(path.id)
	.bind(path.post_id)
	.fetch_optional(database)
	.await?;

	Ok(comment.ok_or(Error::UnknownComment(path.id))?.resolve())
}

/// Get comments
/// Returns the comments of a post, oldest first. An unknown post has no
/// comments.
#[route(tag = tag::COMMENT)]
pub async fn list_comments(
	State(database): State<Database>,
	Path(path): Path<PostPath>,
) -> Result<Json<Vec<model::Comment>>, RouteError> {
	Ok(Json(fetch_comments(&database, path.post_id).await?))
}

/// Get single comment
#[route(tag = tag::COMMENT)]
pub async fn get_comment(
	State(database): State<Database>,
	Path(path): Path<model::CommentPath>,
) -> Result<Json<model::Comment>, RouteError> {
	Ok(Json(fetch_comment(&database, &path).await?))
}

/// Create comment
/// Comments on a post. Authenticated callers become the author, anyone else
/// comments anonymously under the optional nickname.
#[route(tag = tag::COMMENT)]
pub async fn create_comment(
	State(database): State<Database>,
	session: MaybeSession,
	Path(path): Path<PostPath>,
	Json(input): Json<model::CreateComment>,
) -> Result<Json<model::Comment>, RouteError> {
	let exists = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM post WHERE id = ?")
		.bind(path.post_id)
		.fetch_one(&database)
		.await?;

	if exists == 0 {
		return Err(Error::UnknownPost(path.post_id).into());
	}

	let now = chrono::Utc::now();
	let id = Uuid::new_v4();
	let author = session.user().map(|user| user.id);

	sqlx::query(
		r#"
			INSERT INTO comment (id, content, nickname, post_id, author_id, created_at, updated_at)
			VALUES (?, ?, ?, ?, ?, ?, ?)
		"#,
	)
	.bind(id)
	.bind(&input.content)
	.bind(&input.nickname)
	.bind(path.post_id)
	.bind(author)
	.bind(now)
	.bind(now)
	.execute(&database)
	.await?;

	tracing::info!(comment = %id, post = %path.post_id, "created comment");

	let path = model::CommentPath {
		post_id: path.post_id,
		id,
	};

	Ok(Json(fetch_comment(&database, &path).await?))
}

/// Update comment
/// Updates a comment. Omitted fields are left untouched. Only the author may
/// update a comment.
#[route(tag = tag::COMMENT)]
pub async fn update_comment(
	State(database): State<Database>,
	session: MaybeSession,
	Path(path): Path<model::CommentPath>,
	Json(input): Json<model::UpdateComment>,
) -> Result<Json<model::Comment>, RouteError> {
	let comment = fetch_comment(&database, &path).await?;

	permission::check_owner(session.user(), comment.author_id, Access::Write)?;

	sqlx::query(
		r#"
			UPDATE comment
			SET content = COALESCE(?, content), nickname = COALESCE(?, nickname), updated_at = ?
			WHERE id = ?
		"#,
	)
	.bind(input.content)
	.bind(input.nickname)
	.bind(chrono::Utc::now())
	.bind(comment.id)
	.execute(&database)
	.await?;

	Ok(Json(fetch_comment(&database, &path).await?))
}

/// Delete comment
/// Only the author may delete a comment.
#[route(tag = tag::COMMENT, response(status = 204, description = "The comment was deleted."))]
pub async fn delete_comment(
	State(database): State<Database>,
	session: MaybeSession,
	Path(path): Path<model::CommentPath>,
) -> Result<impl IntoApiResponse, RouteError> {
	let comment = fetch_comment(&database, &path).await?;

	permission::check_owner(session.user(), comment.author_id, Access::Write)?;

	sqlx::query("DELETE FROM comment WHERE id = ?")
		.bind(comment.id)
		.execute(&database)
		.await?;

	Ok(StatusCode::NO_CONTENT.into_response())
}
