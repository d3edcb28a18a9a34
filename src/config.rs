use std::{env, path::PathBuf, str::FromStr};

const DEFAULT_DATABASE_URL: &str = "sqlite://reframe.db?mode=rwc";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_MEDIA_ROOT: &str = "./media";
const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("{name} has an invalid value {value:?}")]
	Invalid { name: &'static str, value: String },
}

/// Credentials of the account promoted to staff and superuser at startup.
#[derive(Debug, Clone)]
pub struct Superuser {
	pub email: String,
	pub username: String,
	pub password: String,
}

/// Process configuration, read from the environment.
///
/// A `.env` file is loaded first if one exists, so every value can be set
/// there as well.
#[derive(Debug, Clone)]
pub struct Config {
	pub database_url: String,
	pub port: u16,
	/// Directory that uploaded admin files are written to.
	pub media_root: PathBuf,
	/// Upper bound for request bodies, which bounds uploads.
	pub max_upload_bytes: usize,
	pub replicate_api_token: Option<String>,
	/// Exporting traces and metrics over OTLP is enabled when this is set.
	pub otlp_endpoint: Option<String>,
	pub superuser: Option<Superuser>,
}

impl Config {
	pub fn from_env() -> Result<Self, Error> {
		dotenvy::dotenv().ok();

		let superuser = match (
			var("SUPERUSER_EMAIL"),
			var("SUPERUSER_USERNAME"),
			var("SUPERUSER_PASSWORD"),
		) {
			(Some(email), Some(username), Some(password)) => Some(Superuser {
				email,
				username,
				password,
			}),
			_ => None,
		};

		Ok(Self {
			database_url: var("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.into()),
			port: parse("PORT")?.unwrap_or(DEFAULT_PORT),
			media_root: var("MEDIA_ROOT")
				.map_or_else(|| PathBuf::from(DEFAULT_MEDIA_ROOT), PathBuf::from),
			max_upload_bytes: parse("MAX_UPLOAD_BYTES")?.unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),
			replicate_api_token: var("REPLICATE_API_TOKEN"),
			otlp_endpoint: var("OTEL_EXPORTER_OTLP_ENDPOINT"),
			superuser,
		})
	}
}

/// Reads a variable, treating an empty value as unset.
fn var(name: &str) -> Option<String> {
	env::var(name).ok().filter(|value| !value.trim().is_empty())
}

fn parse<T: FromStr>(name: &'static str) -> Result<Option<T>, Error> {
	var(name)
		.map(|value| {
			value
				.trim()
				.parse()
				.map_err(|_| Error::Invalid { name, value })
		})
		.transpose()
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn test_parse_rejects_garbage() {
		env::set_var("REFRAME_TEST_PORT", "eighty");

		let result = parse::<u16>("REFRAME_TEST_PORT");

		assert!(matches!(
			result,
			Err(Error::Invalid { name: "REFRAME_TEST_PORT", .. })
		));
	}

	#[test]
	fn test_parse_treats_blank_as_unset() {
		env::set_var("REFRAME_TEST_LIMIT", "  ");

		assert!(matches!(parse::<usize>("REFRAME_TEST_LIMIT"), Ok(None)));
	}
}
