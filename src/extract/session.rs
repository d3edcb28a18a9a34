use aide::OperationInput;
use axum::{
	extract::{FromRef, FromRequestParts},
	http::{header, request},
};
use uuid::Uuid;

use crate::{
	error::RouteError,
	openapi::{SECURITY_SCHEME_BEARER, SECURITY_SCHEME_SESSION},
	permission,
	route::auth,
	session, Database,
};

pub const AUTHORIZATION_PREFIX: &str = "Bearer ";

/// The authenticated principal of a request.
///
/// The session id is accepted either from the session cookie or as a bearer
/// token in the `Authorization` header.
///
/// If no credentials are present, [`auth::Error::NoCredentials`] is returned.
/// If they do not resolve to a user, [`auth::Error::InvalidSession`] is returned.
///
/// ```rust
/// async fn route(session: Session) {
///   println!("{:?}", session.user);
/// }
/// ```
#[derive(Debug)]
pub struct Session {
	pub id: Uuid,
	pub user: auth::model::User,
}

/// The principal of a request that may also be made anonymously.
///
/// Missing credentials yield `None`; credentials that are present but
/// invalid are still rejected.
#[derive(Debug)]
pub struct MaybeSession(pub Option<Session>);

impl MaybeSession {
	pub fn user(&self) -> Option<&auth::model::User> {
		self.0.as_ref().map(|session| &session.user)
	}
}

/// A principal that passed [`permission::require_admin`].
#[derive(Debug)]
pub struct Admin(pub Session);

type Rejection = RouteError<auth::Error>;

/// Reads the raw session id from the request, preferring the
/// `Authorization` header over the cookie.
fn credentials(parts: &request::Parts) -> Result<Option<String>, auth::Error> {
	if let Some(value) = parts.headers.get(header::AUTHORIZATION) {
		let value = value.to_str().map_err(|_| auth::Error::InvalidSession)?;
		let token = value
			.strip_prefix(AUTHORIZATION_PREFIX)
			.ok_or(auth::Error::InvalidSession)?;

		return Ok(Some(token.trim().to_owned()));
	}

	Ok(parts
		.headers
		.get_all(header::COOKIE)
		.into_iter()
		.filter_map(|value| value.to_str().ok())
		.find_map(session::find_session_id))
}

async fn authenticate(
	parts: &request::Parts,
	database: &Database,
) -> Result<Option<Session>, Rejection> {
	let Some(raw) = credentials(parts)? else {
		return Ok(None);
	};

	let session_id = Uuid::parse_str(&raw).map_err(|_| auth::Error::InvalidSession)?;

	let user = sqlx::query_as::<_, auth::model::User>(
		r#"
			SELECT * FROM "user" WHERE id = (
				SELECT user_id FROM session WHERE id = ?
			)
		"#,
	)
	.bind(session_id)
	.fetch_optional(database)
	.await?;

	let user = user.ok_or(auth::Error::InvalidSession)?;

	Ok(Some(Session {
		id: session_id,
		user,
	}))
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for MaybeSession
where
	Database: FromRef<S>,
	S: Sync + Send,
{
	type Rejection = Rejection;

	async fn from_request_parts(
		parts: &mut request::Parts,
		state: &S,
	) -> Result<Self, Self::Rejection> {
		let database = Database::from_ref(state);

		Ok(Self(authenticate(parts, &database).await?))
	}
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for Session
where
	Database: FromRef<S>,
	S: Sync + Send,
{
	type Rejection = Rejection;

	async fn from_request_parts(
		parts: &mut request::Parts,
		state: &S,
	) -> Result<Self, Self::Rejection> {
		let MaybeSession(session) = MaybeSession::from_request_parts(parts, state).await?;

		Ok(session.ok_or(auth::Error::NoCredentials)?)
	}
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for Admin
where
	Database: FromRef<S>,
	S: Sync + Send,
{
	type Rejection = Rejection;

	async fn from_request_parts(
		parts: &mut request::Parts,
		state: &S,
	) -> Result<Self, Self::Rejection> {
		let MaybeSession(session) = MaybeSession::from_request_parts(parts, state).await?;

		permission::require_admin(session.as_ref().map(|session| &session.user))?;

		// `require_admin` rejects a missing session, so this always matches
		let Some(session) = session else {
			return Err(permission::Denied::Unauthenticated.into());
		};

		Ok(Self(session))
	}
}

/// Adds the session cookie and bearer token requirements to an operation.
fn require_credentials(operation: &mut aide::openapi::Operation) {
	operation.security.extend([
		[(SECURITY_SCHEME_SESSION.to_string(), Vec::new())]
			.into_iter()
			.collect(),
		[(SECURITY_SCHEME_BEARER.to_string(), Vec::new())]
			.into_iter()
			.collect(),
	]);
}

impl OperationInput for Session {
	fn operation_input(_ctx: &mut aide::gen::GenContext, operation: &mut aide::openapi::Operation) {
		require_credentials(operation);
	}
}

impl OperationInput for Admin {
	fn operation_input(_ctx: &mut aide::gen::GenContext, operation: &mut aide::openapi::Operation) {
		require_credentials(operation);
	}
}

impl OperationInput for MaybeSession {
	/// Credentials are optional, which `OpenAPI` expresses as an extra empty
	/// security requirement.
	fn operation_input(_ctx: &mut aide::gen::GenContext, operation: &mut aide::openapi::Operation) {
		require_credentials(operation);
		operation.security.push(Default::default());
	}
}
