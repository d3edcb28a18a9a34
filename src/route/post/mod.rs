use aide::axum::{routing::get_with, ApiRouter};
use axum::http::StatusCode;
use uuid::Uuid;

use crate::{error, AppState};

use super::comment;

pub mod model;
pub mod route;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("unknown post")]
	UnknownPost(Uuid),
}

pub type RouteError = error::RouteError<Error>;

pub fn routes() -> ApiRouter<AppState> {
	use route::*;

	ApiRouter::new()
		.api_route(
			"/",
			get_with(list_posts, list_posts_docs).post_with(create_post, create_post_docs),
		)
		.api_route(
			"/:post_id",
			get_with(get_post, get_post_docs)
				.put_with(update_post, update_post_docs)
				.patch_with(update_post, update_post_docs)
				.delete_with(delete_post, delete_post_docs),
		)
		.nest("/:post_id/comments", comment::routes())
}

impl error::ErrorShape for Error {
	fn status(&self) -> StatusCode {
		match self {
			Self::UnknownPost(..) => StatusCode::NOT_FOUND,
		}
	}

	fn into_errors(self) -> Vec<error::Message<'static>> {
		let message = error::Message::new(self.to_string());
		let Self::UnknownPost(post) = self;

		message.detail("post", post.to_string()).into_vec()
	}
}

#[cfg(test)]
mod test {
	use crate::test::*;

	async fn create(app: &TestServer, session: Option<&str>, body: serde_json::Value) -> serde_json::Value {
		let mut request = app.post("/posts").json(&body);

		if let Some(session) = session {
			let (name, value) = bearer(session);
			request = request.add_header(name, value);
		}

		let response = request.await;

		assert_eq!(response.status_code(), 200);
		response.json()
	}

	#[sqlx::test]
	async fn test_create_stamps_the_author(pool: Database) {
		let app = app(pool);
		let session = register(&app, "jane").await;

		let post = create(
			&app,
			Some(&session),
			json!({ "title": "Hello", "content": "World" }),
		)
		.await;

		let me = {
			let (name, value) = bearer(&session);
			app.get("/auth/me").add_header(name, value).await.json::<serde_json::Value>()
		};

		assert_eq!(post["author"], me["id"]);
		assert_eq!(post["author_username"], "jane");
		assert_eq!(post["display_name"], "jane");
		assert_eq!(post["created_at"], post["updated_at"]);
	}

	#[sqlx::test]
	async fn test_anonymous_post_keeps_the_nickname(pool: Database) {
		let app = app(pool);

		let post = create(
			&app,
			None,
			json!({ "title": "Hello", "content": "World", "nickname": "Bob" }),
		)
		.await;

		assert_eq!(post["author"], serde_json::Value::Null);
		assert_eq!(post["nickname"], "Bob");
		assert_eq!(post["display_name"], "Bob");

		let post = create(&app, None, json!({ "title": "Hi", "content": "" })).await;

		assert_eq!(post["display_name"], "anonymous");
	}

	#[sqlx::test]
	async fn test_author_cannot_be_supplied(pool: Database) {
		let app = app(pool);
		let session = register(&app, "jane").await;

		let (name, value) = bearer(&session);
		let response = app
			.post("/posts")
			.add_header(name, value)
			.json(&json!({
				"title": "Hello",
				"content": "World",
				"author": uuid::Uuid::new_v4(),
			}))
			.await;

		assert_eq!(response.status_code(), 400);
	}

	#[sqlx::test]
	async fn test_title_is_validated(pool: Database) {
		let app = app(pool);

		let response = app
			.post("/posts")
			.json(&json!({ "title": "x".repeat(201), "content": "World" }))
			.await;

		assert_eq!(response.status_code(), 400);
	}

	#[sqlx::test]
	async fn test_list_is_newest_first(pool: Database) {
		let app = app(pool);

		for title in ["first", "second", "third"] {
			create(&app, None, json!({ "title": title, "content": "" })).await;
		}

		let posts = app.get("/posts").await.json::<Vec<serde_json::Value>>();
		let titles = posts.iter().map(|post| post["title"].as_str().unwrap()).collect::<Vec<_>>();

		assert_eq!(titles, ["third", "second", "first"]);
		assert!(posts[0].get("comments").is_none());

		let page = app
			.get("/posts")
			.add_query_param("page", 2)
			.add_query_param("size", 2)
			.await
			.json::<Vec<serde_json::Value>>();

		assert_eq!(page.len(), 1);
		assert_eq!(page[0]["title"], "first");
	}

	#[sqlx::test]
	async fn test_huge_pages_are_rejected(pool: Database) {
		let app = app(pool);

		create(&app, None, json!({ "title": "only", "content": "" })).await;

		let response = app
			.get("/posts")
			.add_query_param("page", i64::MAX)
			.add_query_param("size", 100)
			.await;

		assert_eq!(response.status_code(), 400);
	}

	#[sqlx::test]
	async fn test_update_is_partial_and_owner_only(pool: Database) {
		let app = app(pool);
		let jane = register(&app, "jane").await;
		let john = register(&app, "john").await;

		let post = create(&app, Some(&jane), json!({ "title": "Hello", "content": "World" })).await;
		let path = format!("/posts/{}", post["id"].as_str().unwrap());

		let (name, value) = bearer(&john);
		let response = app
			.patch(&path)
			.add_header(name, value)
			.json(&json!({ "title": "Stolen" }))
			.await;

		assert_eq!(response.status_code(), 403);

		let response = app.put(&path).json(&json!({ "title": "Stolen" })).await;

		assert_eq!(response.status_code(), 401);

		let (name, value) = bearer(&jane);
		let response = app
			.patch(&path)
			.add_header(name, value)
			.json(&json!({ "title": "Goodbye" }))
			.await;

		assert_eq!(response.status_code(), 200);

		let updated = response.json::<serde_json::Value>();

		assert_eq!(updated["title"], "Goodbye");
		assert_eq!(updated["content"], "World");
		assert_eq!(updated["created_at"], post["created_at"]);
		assert_ne!(updated["updated_at"], post["updated_at"]);
	}

	#[sqlx::test]
	async fn test_anonymous_posts_are_read_only(pool: Database) {
		let app = app(pool);
		let jane = register(&app, "jane").await;

		let post = create(&app, None, json!({ "title": "Hello", "content": "World" })).await;
		let path = format!("/posts/{}", post["id"].as_str().unwrap());

		let (name, value) = bearer(&jane);
		let response = app.delete(&path).add_header(name, value).await;

		assert_eq!(response.status_code(), 403);

		let response = app.delete(&path).await;

		assert_eq!(response.status_code(), 401);
	}

	#[sqlx::test]
	async fn test_delete_cascades_to_comments(pool: Database) {
		let app = app(pool.clone());
		let jane = register(&app, "jane").await;

		let post = create(&app, Some(&jane), json!({ "title": "Hello", "content": "World" })).await;
		let path = format!("/posts/{}", post["id"].as_str().unwrap());

		let response = app
			.post(&format!("{path}/comments"))
			.json(&json!({ "content": "Nice" }))
			.await;

		assert_eq!(response.status_code(), 200);

		let detail = app.get(&path).await.json::<serde_json::Value>();

		assert_eq!(detail["comments"][0]["content"], "Nice");

		let (name, value) = bearer(&jane);
		let response = app.delete(&path).add_header(name, value).await;

		assert_eq!(response.status_code(), 204);
		assert_eq!(app.get(&path).await.status_code(), 404);

		let (comments,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM comment")
			.fetch_one(&pool)
			.await
			.unwrap();

		assert_eq!(comments, 0);
	}

	#[sqlx::test]
	async fn test_deleting_the_user_deletes_their_posts(pool: Database) {
		let app = app(pool);
		let jane = register(&app, "jane").await;

		create(&app, Some(&jane), json!({ "title": "Hello", "content": "World" })).await;
		create(&app, None, json!({ "title": "Anonymous", "content": "" })).await;

		let (name, value) = bearer(&jane);
		let response = app.delete("/auth/me").add_header(name, value).await;

		assert_eq!(response.status_code(), 204);

		let posts = app.get("/posts").await.json::<Vec<serde_json::Value>>();

		assert_eq!(posts.len(), 1);
		assert_eq!(posts[0]["title"], "Anonymous");
	}

	#[sqlx::test]
	async fn test_unknown_post(pool: Database) {
		let app = app(pool);
		let id = uuid::Uuid::new_v4();

		let response = app.get(&format!("/posts/{id}")).await;

		assert_eq!(response.status_code(), 404);

		let body = response.json::<serde_json::Value>();

		assert_eq!(body["error"], "unknown post");
		assert_eq!(body["errors"][0]["details"]["post"], id.to_string());
	}
}
