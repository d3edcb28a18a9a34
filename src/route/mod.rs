use std::sync::Arc;

use aide::{axum::ApiRouter, openapi::OpenApi};
use axum::{Extension, Router};
use tower_governor::GovernorLayer;
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::{media::MEDIA_URL, openapi, ratelimit, AppState};

pub mod admin_file;
pub mod auth;
pub mod comment;
pub mod docs;
pub mod model;
pub mod post;
pub mod restore;

/// Every documented route, without state.
///
/// With `limits`, the authentication and restore routes get the stricter
/// limit on top of the default one applied in [`app`].
pub fn routes(limits: Option<&ratelimit::Limits>) -> ApiRouter<AppState> {
	let mut auth = auth::routes();
	let mut restore = restore::routes();

	if let Some(limits) = limits {
		auth = auth.layer(GovernorLayer {
			config: limits.secure.clone(),
		});
		restore = restore.layer(GovernorLayer {
			config: limits.secure.clone(),
		});
	}

	ApiRouter::new()
		.nest("/auth", auth)
		.nest("/posts", post::routes())
		.nest("/admin-files", admin_file::routes())
		.nest("/restore-photo", restore)
		.nest("/docs", docs::routes())
}

/// Builds the application: routes, the `OpenAPI` document, stored media and
/// request tracing.
pub fn app(state: AppState, limits: Option<&ratelimit::Limits>) -> Router {
	let mut api = OpenApi::default();
	let media_root = state.media.root().to_path_buf();

	let router = routes(limits)
		.finish_api_with(&mut api, openapi::docs)
		.nest_service(MEDIA_URL, ServeDir::new(media_root))
		.layer(Extension(Arc::new(api)))
		.layer(TraceLayer::new_for_http())
		.with_state(state);

	match limits {
		Some(limits) => router.layer(GovernorLayer {
			config: limits.default.clone(),
		}),
		None => router,
	}
}
