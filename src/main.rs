#![warn(clippy::pedantic)]

mod config;
mod error;
mod extract;
mod media;
mod openapi;
mod permission;
mod ratelimit;
mod restorer;
mod route;
mod session;
#[cfg(test)]
mod test;
mod trace;

use std::{net::SocketAddr, sync::Arc};

use argon2::Argon2;
use axum::{
	extract::{DefaultBodyLimit, Request},
	ServiceExt,
};
use sqlx::sqlite::SqlitePoolOptions;
use tower::Layer;
use tower_http::{
	compression::CompressionLayer,
	cors::CorsLayer,
	normalize_path::NormalizePathLayer,
	request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
};

use crate::{config::Config, media::MediaStore, restorer::Restorer};

pub type Database = sqlx::SqlitePool;
pub type AppState = State;

/// The shared application state.
///
/// Handlers pick the parts they need through [`axum::extract::FromRef`],
/// e.g. `State<Database>` or `State<MediaStore>`.
#[derive(Clone, axum::extract::FromRef)]
pub struct State {
	pub database: Database,
	pub hasher: Argon2<'static>,
	pub media: MediaStore,
	pub restorer: Arc<dyn Restorer>,
}

#[tokio::main]
async fn main() {
	let config = Config::from_env().expect("invalid configuration");
	let _guard = trace::init_tracing_subscriber(config.otlp_endpoint.as_deref())
		.expect("failed to initialize tracing");

	let database = SqlitePoolOptions::new()
		.connect(&config.database_url)
		.await
		.expect("failed to connect to database");

	sqlx::migrate!()
		.run(&database)
		.await
		.expect("failed to run migrations");

	let state = State {
		database,
		hasher: Argon2::default(),
		media: MediaStore::new(config.media_root.clone()),
		restorer: Arc::new(restorer::Replicate::new(config.replicate_api_token.clone())),
	};

	if let Some(superuser) = &config.superuser {
		route::auth::ensure_superuser(&state, superuser)
			.await
			.expect("failed to create the superuser");
	}

	let limits = ratelimit::Limits::new();
	limits.spawn_cleanup();

	let app = route::app(state, Some(&limits))
		.layer(DefaultBodyLimit::max(config.max_upload_bytes))
		.layer(CompressionLayer::new())
		.layer(CorsLayer::permissive())
		.layer(PropagateRequestIdLayer::x_request_id())
		.layer(SetRequestIdLayer::x_request_id(MakeRequestUuid));

	// trailing slashes are trimmed before routing, so `/posts/` matches `/posts`
	let app = NormalizePathLayer::trim_trailing_slash().layer(app);

	let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port))
		.await
		.expect("failed to bind to port");

	tracing::info!("listening on port {}", config.port);

	axum::serve(
		listener,
		ServiceExt::<Request>::into_make_service_with_connect_info::<SocketAddr>(app),
	)
	.await
	.expect("server error");
}
