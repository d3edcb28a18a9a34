use aide::axum::IntoApiResponse;
use axum::{extract::State, http::StatusCode, response::IntoResponse};
use macros::route;
use uuid::Uuid;

use crate::{
	extract::{Json, MaybeSession, Path, Query},
	openapi::tag,
	permission::{self, Access},
	route::comment,
	Database,
};

use super::{model, Error, RouteError};

const SELECT_POST: &str = r#"
	SELECT post.*, "user".username AS author_username
	FROM post
	LEFT JOIN "user" ON "user".id = post.author_id
"#;

pub(crate) async fn fetch_post(database: &Database, post_id: Uuid) -> Result<model::Post, RouteError> {
	let post = sqlx::query_as::<_, model::Post>(&format!("{SELECT_POST} WHERE post.id = ?"))
		.bind(post_id)
		.fetch_optional(database)
		.await?;

	Ok(post.ok_or(Error::UnknownPost(post_id))?.resolve())
}

/// Get all posts
/// Returns all posts, newest first. Pass `page` and/or `size` to paginate.
#[route(tag = tag::POST)]
pub async fn list_posts(
	State(database): State<Database>,
	Query(paginate): Query<model::Paginate>,
) -> Result<Json<Vec<model::Post>>, RouteError> {
	let posts = sqlx::query_as::<_, model::Post>(&format!(
		"{SELECT_POST} ORDER BY post.created_at DESC, post.rowid DESC LIMIT ? OFFSET ?"
	))
	.bind(paginate.limit())
	.bind(paginate.offset())
	.fetch_all(&database)
	.await?;

	Ok(Json(posts.into_iter().map(model::Post::resolve).collect()))
}

/// Get single post
/// Returns a single post by its unique id, together with its comments.
#[route(tag = tag::POST)]
pub async fn get_post(
	State(database): State<Database>,
	Path(path): Path<model::PostPath>,
) -> Result<Json<model::PostDetail>, RouteError> {
	let post = fetch_post(&database, path.post_id).await?;
	let comments = comment::route::fetch_comments(&database, post.id).await?;

	Ok(Json(model::PostDetail { post, comments }))
}

/// Create post
/// Creates a new post. Authenticated callers become its author, anyone else
/// posts anonymously under the optional nickname.
#[route(tag = tag::POST)]
pub async fn create_post(
	State(database): State<Database>,
	session: MaybeSession,
	Json(input): Json<model::CreatePost>,
) -> Result<Json<model::Post>, RouteError> {
	let now = chrono::Utc::now();
	let id = Uuid::new_v4();
	let author = session.user().map(|user| user.id);

	sqlx::query(
		r#"
			INSERT INTO post (id, title, content, nickname, author_id, created_at, updated_at)
			VALUES (?, ?, ?, ?, ?, ?, ?)
		"#,
	)
	.bind(id)
	.bind(&input.title)
	.bind(&input.content)
	.bind(&input.nickname)
	.bind(author)
	.bind(now)
	.bind(now)
	.execute(&database)
	.await?;

	tracing::info!(post = %id, author = ?author, "created post");

	Ok(Json(fetch_post(&database, id).await?))
}

/// Update post
/// Updates an existing post by its unique id. Omitted fields are left
/// untouched. Only the author may update a post.
#[route(tag = tag::POST)]
pub async fn update_post(
	State(database): State<Database>,
	session: MaybeSession,
	Path(path): Path<model::PostPath>,
	Json(input): Json<model::UpdatePost>,
) -> Result<Json<model::Post>, RouteError> {
	let post = fetch_post(&database, path.post_id).await?;

	permission::check_owner(session.user(), post.author_id, Access::Write)?;

	sqlx::query(
		r#"
			UPDATE post
			SET
				title = COALESCE(?, title),
				content = COALESCE(?, content),
				nickname = COALESCE(?, nickname),
				updated_at = ?
			WHERE id = ?
		"#,
	)
	.bind(input.title)
	.bind(input.content)
	.bind(input.nickname)
	.bind(chrono::Utc::now())
	.bind(post.id)
	.execute(&database)
	.await?;

	Ok(Json(fetch_post(&database, post.id).await?))
}

/// Delete post
/// Deletes an existing post and its comments. Only the author may delete a
/// post.
#[route(tag = tag::POST, response(status = 204, description = "The post was deleted."))]
pub async fn delete_post(
	State(database): State<Database>,
	session: MaybeSession,
	Path(path): Path<model::PostPath>,
) -> Result<impl IntoApiResponse, RouteError> {
	let post = fetch_post(&database, path.post_id).await?;

	permission::check_owner(session.user(), post.author_id, Access::Write)?;

	sqlx::query("DELETE FROM post WHERE id = ?")
		.bind(post.id)
		.execute(&database)
		.await?;

	tracing::info!(post = %post.id, "deleted post");

	Ok(StatusCode::NO_CONTENT.into_response())
}
