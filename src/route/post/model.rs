pub use crate::route::model::Paginate;

use macros::model;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::route::{comment::model::Comment, model::display_name};

/// A single post, written by a user or anonymously.
#[model]
#[derive(Debug, Serialize, JsonSchema, Validate, sqlx::FromRow)]
pub struct Post {
	/// The unique identifier of the post.
	#[model(read_only)]
	pub id: Uuid,
	/// The title of the post.
	#[validate(length(min = 1, max = 200))]
	pub title: String,
	/// The body of the post.
	pub content: String,
	/// The name to show when the post has no author.
	#[validate(length(max = 50))]
	pub nickname: Option<String>,
	/// The user that wrote the post, or `null` for anonymous posts.
	#[model(read_only)]
	#[serde(rename = "author")]
	pub author_id: Option<Uuid>,
	/// The author's username.
	#[model(read_only)]
	#[sqlx(default)]
	pub author_username: Option<String>,
	/// The author's username, the nickname or "anonymous", in that order.
	#[model(read_only)]
	#[sqlx(skip)]
	pub display_name: String,
	/// The creation time of the post.
	#[model(read_only)]
	pub created_at: chrono::DateTime<chrono::Utc>,
	/// The time of the last change to the post.
	#[model(read_only)]
	pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl Post {
	#[must_use]
	pub fn resolve(mut self) -> Self {
		self.display_name =
			display_name(self.author_username.as_deref(), self.nickname.as_deref()).to_owned();
		self
	}
}

/// A post together with its comments, oldest first.
#[derive(Debug, Serialize, JsonSchema)]
pub struct PostDetail {
	#[serde(flatten)]
	pub post: Post,
	pub comments: Vec<Comment>,
}

#[derive(Deserialize, Validate, JsonSchema)]
pub struct PostPath {
	/// The unique identifier of the post.
	pub post_id: Uuid,
}
