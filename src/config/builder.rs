//! Validated construction of [`RelayConfig`](crate::config::RelayConfig).

// self
use crate::{
	_prelude::*,
	config::{DEFAULT_REFRESH_PATH, ExcludedPaths, RelayConfig},
};

/// Errors raised while constructing or validating relay configurations.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum RelayConfigError {
	/// Base origin must be reachable over HTTP(S).
	#[error("The base URL must use http or https: {url}.")]
	UnsupportedScheme {
		/// Base URL that failed validation.
		url: String,
	},
	/// Base origin cannot carry query strings or fragments that relative paths would clobber.
	#[error("The base URL must not contain a query or fragment: {url}.")]
	BaseUrlHasQuery {
		/// Base URL that failed validation.
		url: String,
	},
	/// Refresh path must be relative to the base origin.
	#[error("The refresh path must start with `/`: {path}.")]
	RelativeRefreshPath {
		/// Refresh path that failed validation.
		path: String,
	},
	/// Empty exclusion substrings would match every URL.
	#[error("Excluded paths must not contain empty entries.")]
	EmptyExcludedPath,
	/// Default header cannot be sent over HTTP.
	#[error("Default header `{name}` is not a valid HTTP header.")]
	InvalidHeader {
		/// Header name as configured.
		name: String,
	},
	/// `Authorization` is owned by the token holder and cannot be configured statically.
	#[error("Default header `{name}` is managed by the relay and cannot be configured.")]
	ReservedHeader {
		/// Header name as configured.
		name: String,
	},
	/// Timeout must be strictly positive.
	#[error("The timeout must be positive.")]
	NonPositiveTimeout,
}

/// Builder for [`RelayConfig`] values.
#[derive(Debug)]
pub struct RelayConfigBuilder {
	/// Backend origin.
	pub base_url: Url,
	/// Substrings that bypass token handling.
	pub excluded_paths: ExcludedPaths,
	/// Refresh endpoint path.
	pub refresh_path: String,
	/// Headers merged into every request.
	pub default_headers: BTreeMap<String, String>,
	/// Cookie-store toggle.
	pub with_credentials: bool,
	/// Optional whole-request timeout.
	pub timeout: Option<Duration>,
}
impl RelayConfigBuilder {
	/// Creates a new builder seeded with the default exclusions, refresh path, and JSON content
	/// type.
	pub fn new(base_url: Url) -> Self {
		let mut default_headers = BTreeMap::new();

		default_headers.insert(CONTENT_TYPE.as_str().to_owned(), "application/json".to_owned());

		Self {
			base_url,
			excluded_paths: ExcludedPaths::default(),
			refresh_path: DEFAULT_REFRESH_PATH.to_owned(),
			default_headers,
			with_credentials: true,
			timeout: None,
		}
	}

	/// Replaces the exclusion set.
	pub fn excluded_paths(mut self, paths: ExcludedPaths) -> Self {
		self.excluded_paths = paths;

		self
	}

	/// Adds one substring to the exclusion set.
	pub fn exclude_path(mut self, path: impl Into<String>) -> Self {
		self.excluded_paths.insert(path);

		self
	}

	/// Overrides the refresh endpoint path.
	pub fn refresh_path(mut self, path: impl Into<String>) -> Self {
		self.refresh_path = path.into();

		self
	}

	/// Adds or replaces a default header.
	pub fn default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.default_headers.insert(name.into().to_ascii_lowercase(), value.into());

		self
	}

	/// Toggles the cookie store used for credentialed requests.
	pub fn with_credentials(mut self, enabled: bool) -> Self {
		self.with_credentials = enabled;

		self
	}

	/// Sets the whole-request timeout.
	pub fn timeout(mut self, timeout: Duration) -> Self {
		self.timeout = Some(timeout);

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	pub fn build(self) -> Result<RelayConfig, RelayConfigError> {
		let config = RelayConfig {
			base_url: self.base_url,
			excluded_paths: self.excluded_paths,
			refresh_path: self.refresh_path,
			default_headers: self.default_headers,
			with_credentials: self.with_credentials,
			timeout: self.timeout,
		};

		config.validate()?;

		Ok(config)
	}
}

impl RelayConfig {
	/// Validates invariants for the configuration.
	pub fn validate(&self) -> Result<(), RelayConfigError> {
		if !matches!(self.base_url.scheme(), "http" | "https") {
			return Err(RelayConfigError::UnsupportedScheme { url: self.base_url.to_string() });
		}
		if self.base_url.query().is_some() || self.base_url.fragment().is_some() {
			return Err(RelayConfigError::BaseUrlHasQuery { url: self.base_url.to_string() });
		}
		if !self.refresh_path.starts_with('/') {
			return Err(RelayConfigError::RelativeRefreshPath { path: self.refresh_path.clone() });
		}
		if self.excluded_paths.iter().any(str::is_empty) {
			return Err(RelayConfigError::EmptyExcludedPath);
		}
		if let Some(timeout) = self.timeout
			&& !timeout.is_positive()
		{
			return Err(RelayConfigError::NonPositiveTimeout);
		}

		for (name, value) in &self.default_headers {
			if name.eq_ignore_ascii_case(AUTHORIZATION.as_str()) {
				return Err(RelayConfigError::ReservedHeader { name: name.clone() });
			}
			if HeaderName::from_bytes(name.as_bytes()).is_err()
				|| HeaderValue::from_str(value).is_err()
			{
				return Err(RelayConfigError::InvalidHeader { name: name.clone() });
			}
		}

		Ok(())
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn url(value: &str) -> Url {
		Url::parse(value).expect("URL fixture should parse.")
	}

	#[test]
	fn defaults_match_backend_contract() {
		let config = RelayConfig::builder(url("https://relay.example.com/api"))
			.build()
			.expect("Default configuration should build.");

		assert_eq!(config.refresh_path, "/refresh-token");
		assert_eq!(config.excluded_paths.iter().collect::<Vec<_>>(), [
			"/auth/login",
			"/members/register"
		]);
		assert!(config.with_credentials);
		assert!(config.timeout.is_none());
		assert_eq!(
			config.default_headers.get("content-type").map(String::as_str),
			Some("application/json")
		);
	}

	#[test]
	fn builder_rejects_invalid_settings() {
		let err = RelayConfig::builder(url("ftp://relay.example.com"))
			.build()
			.expect_err("Non-HTTP base URLs should be rejected.");

		assert!(matches!(err, RelayConfigError::UnsupportedScheme { .. }));

		let err = RelayConfig::builder(url("https://relay.example.com/api?tenant=a"))
			.build()
			.expect_err("Base URLs with queries should be rejected.");

		assert!(matches!(err, RelayConfigError::BaseUrlHasQuery { .. }));

		let err = RelayConfig::builder(url("https://relay.example.com"))
			.refresh_path("refresh-token")
			.build()
			.expect_err("Refresh paths without a leading slash should be rejected.");

		assert!(matches!(err, RelayConfigError::RelativeRefreshPath { .. }));

		let err = RelayConfig::builder(url("https://relay.example.com"))
			.exclude_path("")
			.build()
			.expect_err("Empty exclusions should be rejected.");

		assert_eq!(err, RelayConfigError::EmptyExcludedPath);

		let err = RelayConfig::builder(url("https://relay.example.com"))
			.timeout(Duration::ZERO)
			.build()
			.expect_err("Zero timeouts should be rejected.");

		assert_eq!(err, RelayConfigError::NonPositiveTimeout);

		let err = RelayConfig::builder(url("https://relay.example.com"))
			.default_header("x bad", "value")
			.build()
			.expect_err("Header names with spaces should be rejected.");

		assert_eq!(err, RelayConfigError::InvalidHeader { name: "x bad".into() });
	}

	#[test]
	fn authorization_cannot_be_a_default_header() {
		let err = RelayConfig::builder(url("https://relay.example.com"))
			.default_header("Authorization", "Bearer static")
			.build()
			.expect_err("A static bearer would leak into excluded requests.");

		assert_eq!(err, RelayConfigError::ReservedHeader { name: "authorization".into() });

		let mut config = RelayConfig::builder(url("https://relay.example.com"))
			.build()
			.expect("Default configuration should build.");

		config.default_headers.insert("AUTHORIZATION".into(), "Bearer static".into());

		assert_eq!(
			config.validate(),
			Err(RelayConfigError::ReservedHeader { name: "AUTHORIZATION".into() })
		);
	}

	#[test]
	fn config_round_trips_through_json() {
		let config = RelayConfig::builder(url("https://relay.example.com/api"))
			.exclude_path("/auth/reissue")
			.default_header("X-Client", "bitamin-web")
			.timeout(Duration::seconds(10))
			.build()
			.expect("Configuration should build.");
		let json = serde_json::to_string(&config).expect("Configuration should serialize.");
		let decoded: RelayConfig =
			serde_json::from_str(&json).expect("Configuration should deserialize.");

		assert_eq!(decoded, config);
		assert!(decoded.excluded_paths.matches("/auth/reissue"));
		assert_eq!(
			decoded.default_headers.get("x-client").map(String::as_str),
			Some("bitamin-web")
		);
	}
}
