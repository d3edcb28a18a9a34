use std::{sync::Arc, time::Duration};

use axum::{body::Body, http::StatusCode, response::Response};
use governor::middleware::StateInformationMiddleware;
use tower_governor::{
	governor::{GovernorConfig, GovernorConfigBuilder},
	key_extractor::PeerIpKeyExtractor,
	GovernorError,
};

use crate::error;

pub type Config = Arc<GovernorConfig<PeerIpKeyExtractor, StateInformationMiddleware>>;

/// Per peer IP limits. They need the peer address, so the server must be
/// started with `into_make_service_with_connect_info`.
#[derive(Clone)]
pub struct Limits {
	/// Applied to every request.
	pub default: Config,
	/// Applied on top of the default to logins, registrations and photo
	/// restoration.
	pub secure: Config,
}

impl Limits {
	pub fn new() -> Self {
		Self {
			default: build(GovernorConfigBuilder::default().per_second(1).burst_size(50)),
			secure: build(GovernorConfigBuilder::default().per_second(4).burst_size(5)),
		}
	}

	/// Periodically forgets peers that have not been limited recently.
	pub fn spawn_cleanup(&self) {
		let limiters = [self.default.limiter().clone(), self.secure.limiter().clone()];
		let interval = Duration::from_secs(60);

		std::thread::spawn(move || loop {
			std::thread::sleep(interval);

			for limiter in &limiters {
				tracing::debug!("rate limiting storage size: {}", limiter.len());

				limiter.retain_recent();
			}
		});
	}
}

fn build(
	builder: &mut GovernorConfigBuilder<PeerIpKeyExtractor, governor::middleware::NoOpMiddleware>,
) -> Config {
	Arc::new(
		builder
			.use_headers()
			.error_handler(error_handler)
			.finish()
			.expect("rate limits are non-zero"),
	)
}

fn error_handler(error: GovernorError) -> Response<Body> {
	let (status, message, headers) = match error {
		GovernorError::TooManyRequests { wait_time, headers } => (
			StatusCode::TOO_MANY_REQUESTS,
			format!("too many requests, retry in {wait_time}s"),
			headers,
		),
		GovernorError::UnableToExtractKey => (
			StatusCode::INTERNAL_SERVER_ERROR,
			"unable to determine the client address".to_owned(),
			None,
		),
		GovernorError::Other { code, msg, headers } => (
			code,
			msg.unwrap_or_else(|| "rate limiting failed".to_owned()),
			headers,
		),
	};

	let mut response = error::respond(status, message, Vec::new());

	if let Some(headers) = headers {
		response.headers_mut().extend(headers);
	}

	response
}
