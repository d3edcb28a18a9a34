use aide::axum::{
	routing::{get_with, post_with},
	ApiRouter,
};
use axum::http::StatusCode;

use crate::{config::Superuser, error, AppState};

pub mod model;
pub mod route;

/// An error that can occur during authentication.
///
/// Note that the messages are presented to the client, so they should not contain
/// sensitive information.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("invalid email or password")]
	InvalidEmailOrPassword,
	#[error("password hashing error")]
	Argon(#[from] argon2::Error),
	#[error("no session cookie or bearer token")]
	NoCredentials,
	#[error("invalid or expired session")]
	InvalidSession,
	#[error("username already taken")]
	UsernameTaken,
	#[error("email already taken")]
	EmailTaken,
}

pub type RouteError = error::RouteError<Error>;

pub fn routes() -> ApiRouter<AppState> {
	use route::*;

	ApiRouter::new()
		.api_route("/login", post_with(login, login_docs))
		.api_route("/logout", get_with(logout, logout_docs))
		.api_route("/register", post_with(register, register_docs))
		.api_route(
			"/me",
			get_with(get_me, get_me_docs)
				.put_with(update_me, update_me_docs)
				.delete_with(delete_me, delete_me_docs),
		)
}

impl error::ErrorShape for Error {
	fn status(&self) -> StatusCode {
		match self {
			Self::InvalidEmailOrPassword | Self::NoCredentials | Self::InvalidSession => {
				StatusCode::UNAUTHORIZED
			}
			Self::Argon(..) => StatusCode::INTERNAL_SERVER_ERROR,
			Self::UsernameTaken | Self::EmailTaken => StatusCode::CONFLICT,
		}
	}

	fn into_errors(self) -> Vec<error::Message<'static>> {
		match self {
			Self::UsernameTaken => error::Message::new(self.to_string())
				.field("username")
				.into_vec(),
			Self::EmailTaken => error::Message::new(self.to_string())
				.field("email")
				.into_vec(),
			_ => Vec::new(),
		}
	}
}

/// Makes sure the configured superuser exists and carries the staff and
/// superuser flags, creating the account if needed.
pub async fn ensure_superuser(state: &AppState, superuser: &Superuser) -> Result<(), RouteError> {
	let promoted = sqlx::query(
		r#"UPDATE "user" SET is_staff = TRUE, is_superuser = TRUE WHERE email = ?"#,
	)
	.bind(&superuser.email)
	.execute(&state.database)
	.await?;

	if promoted.rows_affected() > 0 {
		tracing::info!(email = %superuser.email, "promoted existing superuser");
		return Ok(());
	}

	let user_id = uuid::Uuid::new_v4();
	let hashed =
		route::hash_password(&state.hasher, &superuser.password, &user_id).map_err(Error::Argon)?;

	sqlx::query(
		r#"
			INSERT INTO "user" (id, email, username, password, is_staff, is_superuser, created_at)
			VALUES (?, ?, ?, ?, TRUE, TRUE, ?)
		"#,
	)
	.bind(user_id)
	.bind(&superuser.email)
	.bind(&superuser.username)
	.bind(&hashed[..])
	.bind(chrono::Utc::now())
	.execute(&state.database)
	.await?;

	tracing::info!(email = %superuser.email, "created superuser");

	Ok(())
}
