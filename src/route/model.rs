use schemars::JsonSchema;
use serde::Deserialize;
use validator::Validate;

/// Shown for records that have neither an author nor a nickname.
pub const ANONYMOUS: &str = "anonymous";

pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Optional pagination. Without `page` or `size`, everything is returned.
#[derive(Debug, Default, Deserialize, Validate, JsonSchema)]
pub struct Paginate {
	/// The page number to return (1-indexed).
	#[validate(range(min = 1, max = 10000))]
	pub page: Option<i64>,
	/// The number of items to return per page.
	#[validate(range(min = 1, max = 100))]
	pub size: Option<i64>,
}

impl Paginate {
	fn is_paginated(&self) -> bool {
		self.page.is_some() || self.size.is_some()
	}

	pub fn offset(&self) -> i64 {
		if self.is_paginated() {
			(self.page.unwrap_or(1) - 1) * self.limit()
		} else {
			0
		}
	}

	/// A negative limit means "no limit" to SQLite.
	pub fn limit(&self) -> i64 {
		if self.is_paginated() {
			self.size.unwrap_or(DEFAULT_PAGE_SIZE)
		} else {
			-1
		}
	}
}

/// The name shown for a post or comment: the author's username, then the
/// nickname, then [`ANONYMOUS`].
pub fn display_name<'a>(author_username: Option<&'a str>, nickname: Option<&'a str>) -> &'a str {
	author_username
		.or(nickname.filter(|nickname| !nickname.is_empty()))
		.unwrap_or(ANONYMOUS)
}
