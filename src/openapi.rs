use aide::{
	openapi::{ApiKeyLocation, SecurityScheme, Tag},
	transform::TransformOpenApi,
};

use crate::{error, extract::Json, session};

pub const SECURITY_SCHEME_SESSION: &str = "Session";
pub const SECURITY_SCHEME_BEARER: &str = "Bearer";

pub mod tag {
	pub const AUTH: &str = "Auth";
	pub const POST: &str = "Post";
	pub const COMMENT: &str = "Comment";
	pub const ADMIN_FILE: &str = "Admin file";
	pub const RESTORE: &str = "Restore";
}

fn describe_tag(name: &str, description: &str) -> Tag {
	Tag {
		name: name.into(),
		description: Some(description.into()),
		..Default::default()
	}
}

pub fn docs(api: TransformOpenApi) -> TransformOpenApi {
	api.title("Reframe")
		.summary("Posts, comments, admin uploads and photo restoration")
		.description(include_str!("../README.md"))
		.tag(describe_tag(tag::AUTH, "Accounts and sessions"))
		.tag(describe_tag(tag::POST, "Posts, written by users or anonymously"))
		.tag(describe_tag(tag::COMMENT, "Comments on a post"))
		.tag(describe_tag(tag::ADMIN_FILE, "Files uploaded by administrators"))
		.tag(describe_tag(tag::RESTORE, "AI photo restoration, for administrators"))
		.security_scheme(
			SECURITY_SCHEME_SESSION,
			SecurityScheme::ApiKey {
				location: ApiKeyLocation::Cookie,
				name: session::COOKIE_NAME.into(),
				description: Some("A user session cookie".into()),
				extensions: Default::default(),
			},
		)
		.security_scheme(
			SECURITY_SCHEME_BEARER,
			SecurityScheme::ApiKey {
				location: ApiKeyLocation::Header,
				name: "Authorization".into(),
				description: Some("`Bearer <session_id>`".into()),
				extensions: Default::default(),
			},
		)
		.default_response_with::<Json<error::ErrorBody>, _>(|res| {
			res.example(error::ErrorBody {
				error: "unknown post".into(),
				errors: error::Message::new("unknown post")
					.detail("post", "4f5a3c1e-8a4e-4b8e-9a57-3b0c6f3b9d2e")
					.into_vec(),
			})
		})
}
