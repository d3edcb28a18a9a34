use macros::model;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::route::model::display_name;

/// A comment on a post.
#[model]
#[derive(Debug, Serialize, JsonSchema, Validate, sqlx::FromRow)]
pub struct Comment {
	/// The unique identifier of the comment.
	#[model(read_only)]
	pub id: Uuid,
	/// The body of the comment.
	#[validate(length(min = 1))]
	pub content: String,
	/// The name to show when the comment has no author.
	#[validate(length(max = 50))]
	pub nickname: Option<String>,
	/// The post the comment belongs to.
	#[model(read_only)]
	#[serde(rename = "post")]
	pub post_id: Uuid,
	/// The user that wrote the comment, or `null` for anonymous comments.
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
	/// The creation time of the comment.
	#[model(read_only)]
	pub created_at: chrono::DateTime<chrono::Utc>,
	/// The time of the last change to the comment.
	#[model(read_only)]
	pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl Comment {
	#[must_use]
	pub fn resolve(mut self) -> Self {
		self.display_name =
			display_name(self.author_username.as_deref(), self.nickname.as_deref()).to_owned();
		self
	}
}

#[derive(Deserialize, Validate, JsonSchema)]
pub struct CommentPath {
	/// The post the comment belongs to.
	pub post_id: Uuid,
	/// The unique identifier of the comment.
	pub id: Uuid,
}
