use aide::axum::{routing::get_with, ApiRouter};
use axum::http::StatusCode;
use uuid::Uuid;

use crate::{error, AppState};

pub mod model;
pub mod route;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("unknown post")]
	UnknownPost(Uuid),
	#[error("unknown comment")]
	UnknownComment(Uuid),
}

pub type RouteError = error::RouteError<Error>;

/// Routes nested below `/posts/:post_id/comments`.
pub fn routes() -> ApiRouter<AppState> {
	use route::*;

	ApiRouter::new()
		.api_route(
			"/",
			get_with(list_comments, list_comments_docs)
				.post_with(create_comment, create_comment_docs),
		)
		.api_route(
			"/:id",
			get_with(get_comment, get_comment_docs)
				.put_with(update_comment, update_comment_docs)
				.patch_with(update_comment, update_comment_docs)
				.delete_with(delete_comment, delete_comment_docs),
		)
}

impl error::ErrorShape for Error {
	fn status(&self) -> StatusCode {
		match self {
			Self::UnknownPost(..) | Self::UnknownComment(..) => StatusCode::NOT_FOUND,
		}
	}

	fn into_errors(self) -> Vec<error::Message<'static>> {
		let message = error::Message::new(self.to_string());

		match self {
			Self::UnknownPost(post) => message.detail("post", post.to_string()),
			Self::UnknownComment(comment) => message.detail("comment", comment.to_string()),
		}
		.into_vec()
	}
}

#[cfg(test)]
mod test {
	use crate::test::*;

	async fn create_post(app: &TestServer) -> String {
		let response = app
			.post("/posts")
			.json(&json!({ "title": "Hello", "content": "World" }))
			.await;

		assert_eq!(response.status_code(), 200);

		response.json::<serde_json::Value>()["id"]
			.as_str()
			.unwrap()
			.to_owned()
	}

	#[sqlx::test]
	async fn test_create_and_list_oldest_first(pool: Database) {
		let app = app(pool);
		let post = create_post(&app).await;
		let jane = register(&app, "jane").await;

		let (name, value) = bearer(&jane);
		let response = app
			.post(&format!("/posts/{post}/comments"))
			.add_header(name, value)
			.json(&json!({ "content": "first" }))
			.await;

		assert_eq!(response.status_code(), 200);

		let comment = response.json::<serde_json::Value>();

		assert_eq!(comment["post"], post);
		assert_eq!(comment["display_name"], "jane");

		app.post(&format!("/posts/{post}/comments"))
			.json(&json!({ "content": "second", "nickname": "Bob" }))
			.await;

		let comments = app
			.get(&format!("/posts/{post}/comments"))
			.await
			.json::<Vec<serde_json::Value>>();

		assert_eq!(comments.len(), 2);
		assert_eq!(comments[0]["content"], "first");
		assert_eq!(comments[1]["content"], "second");
		assert_eq!(comments[1]["author"], serde_json::Value::Null);
		assert_eq!(comments[1]["display_name"], "Bob");
	}

	#[sqlx::test]
	async fn test_comment_needs_an_existing_post(pool: Database) {
		let app = app(pool);
		let post = uuid::Uuid::new_v4();

		let response = app
			.post(&format!("/posts/{post}/comments"))
			.json(&json!({ "content": "hello?" }))
			.await;

		assert_eq!(response.status_code(), 404);

		let comments = app
			.get(&format!("/posts/{post}/comments"))
			.await
			.json::<Vec<serde_json::Value>>();

		assert!(comments.is_empty());
	}

	#[sqlx::test]
	async fn test_post_cannot_be_supplied(pool: Database) {
		let app = app(pool);
		let post = create_post(&app).await;
		let other = create_post(&app).await;

		let response = app
			.post(&format!("/posts/{post}/comments"))
			.json(&json!({ "content": "hi", "post": other }))
			.await;

		assert_eq!(response.status_code(), 400);
	}

	#[sqlx::test]
	async fn test_comment_is_scoped_to_its_post(pool: Database) {
		let app = app(pool);
		let post = create_post(&app).await;
		let other = create_post(&app).await;

		let comment = app
			.post(&format!("/posts/{post}/comments"))
			.json(&json!({ "content": "hi" }))
			.await
			.json::<serde_json::Value>();
		let id = comment["id"].as_str().unwrap();

		assert_eq!(
			app.get(&format!("/posts/{post}/comments/{id}")).await.status_code(),
			200
		);
		assert_eq!(
			app.get(&format!("/posts/{other}/comments/{id}")).await.status_code(),
			404
		);
	}

	#[sqlx::test]
	async fn test_only_the_author_can_change_a_comment(pool: Database) {
		let app = app(pool);
		let post = create_post(&app).await;
		let jane = register(&app, "jane").await;
		let john = register(&app, "john").await;

		let (name, value) = bearer(&jane);
		let comment = app
			.post(&format!("/posts/{post}/comments"))
			.add_header(name, value)
			.json(&json!({ "content": "hi" }))
			.await
			.json::<serde_json::Value>();
		let path = format!("/posts/{post}/comments/{}", comment["id"].as_str().unwrap());

		let (name, value) = bearer(&john);
		let response = app
			.put(&path)
			.add_header(name, value)
			.json(&json!({ "content": "mine now" }))
			.await;

		assert_eq!(response.status_code(), 403);

		let response = app.delete(&path).await;

		assert_eq!(response.status_code(), 401);

		let (name, value) = bearer(&jane);
		let response = app
			.patch(&path)
			.add_header(name, value)
			.json(&json!({ "content": "edited" }))
			.await;

		assert_eq!(response.status_code(), 200);
		assert_eq!(response.json::<serde_json::Value>()["content"], "edited");

		let (name, value) = bearer(&jane);
		let response = app.delete(&path).add_header(name, value).await;

		assert_eq!(response.status_code(), 204);
		assert_eq!(app.get(&path).await.status_code(), 404);
	}

	#[sqlx::test]
	async fn test_deleting_the_user_deletes_their_comments(pool: Database) {
		let app = app(pool);
		let post = create_post(&app).await;
		let jane = register(&app, "jane").await;
		let path = format!("/posts/{post}/comments");

		let (name, value) = bearer(&jane);
		app.post(&path)
			.add_header(name, value)
			.json(&json!({ "content": "mine" }))
			.await;
		app.post(&path)
			.json(&json!({ "content": "anonymous" }))
			.await;

		let (name, value) = bearer(&jane);
		let response = app.delete("/auth/me").add_header(name, value).await;

		assert_eq!(response.status_code(), 204);

		let comments = app.get(&path).await.json::<Vec<serde_json::Value>>();

		assert_eq!(comments.len(), 1);
		assert_eq!(comments[0]["content"], "anonymous");
	}
}
