//! Shared helpers for the HTTP-level tests.

use std::sync::{Arc, Mutex};

pub use axum_test::{
	multipart::{MultipartForm, Part},
	TestServer,
};
pub use serde_json::json;

pub use crate::Database;

use argon2::Argon2;
use axum::http::{header, HeaderName, HeaderValue};

use crate::{
	media::MediaStore,
	restorer::{self, Restorer},
	route, AppState,
};

/// A [`Restorer`] that answers with a fixed result and records its calls.
pub struct MockRestorer {
	result: Result<String, String>,
	calls: Mutex<Vec<(String, f64)>>,
}

impl MockRestorer {
	pub fn succeeding(url: &str) -> Arc<Self> {
		Arc::new(Self {
			result: Ok(url.to_owned()),
			calls: Mutex::default(),
		})
	}

	pub fn failing(reason: &str) -> Arc<Self> {
		Arc::new(Self {
			result: Err(reason.to_owned()),
			calls: Mutex::default(),
		})
	}

	/// The `(image, fidelity)` pairs received so far.
	pub fn calls(&self) -> Vec<(String, f64)> {
		self.calls.lock().unwrap().clone()
	}
}

#[axum::async_trait]
impl Restorer for MockRestorer {
	async fn restore(&self, image: &str, fidelity: f64) -> Result<String, restorer::Error> {
		self.calls.lock().unwrap().push((image.to_owned(), fidelity));

		self.result.clone().map_err(restorer::Error::Failed)
	}
}

fn media() -> MediaStore {
	MediaStore::new(std::env::temp_dir().join(format!("reframe-test-{}", uuid::Uuid::new_v4())))
}

pub fn state(pool: Database) -> AppState {
	AppState {
		database: pool,
		hasher: Argon2::default(),
		media: media(),
		restorer: MockRestorer::succeeding("https://example.com/out.png"),
	}
}

fn server(state: AppState) -> TestServer {
	TestServer::new(route::app(state, None)).unwrap()
}

pub fn app(pool: Database) -> TestServer {
	server(state(pool))
}

/// Like [`app`], also returning the store uploads are written to.
pub fn app_with_media(pool: Database) -> (TestServer, MediaStore) {
	let state = state(pool);
	let media = state.media.clone();

	(server(state), media)
}

pub fn app_with_restorer(pool: Database, restorer: Arc<MockRestorer>) -> TestServer {
	server(AppState {
		restorer,
		..state(pool)
	})
}

/// Registers `{name}@example.com` and returns the session id.
pub async fn register(app: &TestServer, name: &str) -> String {
	let response = app
		.post("/auth/register")
		.json(&json!({
			"email": format!("{name}@example.com"),
			"username": name,
			"password": "hunter2hunter",
		}))
		.await;

	assert_eq!(response.status_code(), 200);

	response.json::<serde_json::Value>()["session_id"]
		.as_str()
		.unwrap()
		.to_owned()
}

/// Gives the user staff rights.
pub async fn make_admin(pool: &Database, username: &str) {
	sqlx::query(r#"UPDATE "user" SET is_staff = TRUE WHERE username = ?"#)
		.bind(username)
		.execute(pool)
		.await
		.unwrap();
}

pub fn bearer(session: &str) -> (HeaderName, HeaderValue) {
	(
		header::AUTHORIZATION,
		HeaderValue::from_str(&format!("Bearer {session}")).unwrap(),
	)
}
