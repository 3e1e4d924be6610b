//! Relay configuration: base origin, excluded paths, refresh endpoint, and transport knobs.
//!
//! The module exposes a validated [`RelayConfig`] built through [`RelayConfigBuilder`], along
//! with the substring-matched [`ExcludedPaths`] set consulted by both interceptors.

/// Builder API for assembling relay configurations.
pub mod builder;

pub use builder::*;

// self
use crate::{_prelude::*, error::ConfigError};

/// Login and registration endpoints, excluded unless overridden.
pub const DEFAULT_EXCLUDED_PATHS: [&str; 2] = ["/auth/login", "/members/register"];
/// Refresh endpoint used when none is configured.
pub const DEFAULT_REFRESH_PATH: &str = "/refresh-token";

/// Path substrings for which no token is attached and no refresh is attempted.
///
/// Matching is substring containment anywhere in the request URL, so `/v2/auth/login?next=/`
/// is excluded by `/auth/login`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExcludedPaths(Vec<String>);
impl ExcludedPaths {
	/// Creates a set from the provided substrings.
	pub fn new<I, S>(paths: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self(paths.into_iter().map(Into::into).collect())
	}

	/// Creates a set that excludes nothing.
	pub fn none() -> Self {
		Self(Vec::new())
	}

	/// Checks whether `url` contains any excluded substring.
	pub fn matches(&self, url: &str) -> bool {
		self.0.iter().any(|path| url.contains(path.as_str()))
	}

	/// Adds a substring to the set.
	pub fn insert(&mut self, path: impl Into<String>) {
		let path = path.into();

		if !self.0.contains(&path) {
			self.0.push(path);
		}
	}

	/// Iterates over the configured substrings.
	pub fn iter(&self) -> impl Iterator<Item = &str> {
		self.0.iter().map(String::as_str)
	}
}
impl Default for ExcludedPaths {
	fn default() -> Self {
		Self::new(DEFAULT_EXCLUDED_PATHS)
	}
}

/// Validated relay configuration consumed by [`RelayClient`](crate::client::RelayClient).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayConfig {
	/// Backend origin every relative request URL is joined onto.
	pub base_url: Url,
	/// Substrings that bypass token injection and refresh.
	pub excluded_paths: ExcludedPaths,
	/// Path of the refresh endpoint, relative to [`base_url`](RelayConfig::base_url).
	pub refresh_path: String,
	/// Headers merged into every request before per-request headers.
	pub default_headers: BTreeMap<String, String>,
	/// Keeps a cookie store so HTTP-only refresh cookies travel with the refresh call.
	pub with_credentials: bool,
	/// Whole-request timeout applied by the transport.
	pub timeout: Option<Duration>,
}
impl RelayConfig {
	/// Creates a new builder for the provided base origin.
	pub fn builder(base_url: Url) -> RelayConfigBuilder {
		RelayConfigBuilder::new(base_url)
	}

	/// Resolves a request URL against the base origin.
	///
	/// Absolute URLs are returned unchanged. Relative URLs are appended to the base URL's path,
	/// so `https://host/api` + `/members/me` yields `https://host/api/members/me`.
	pub fn resolve(&self, url: &str) -> Result<Url, ConfigError> {
		let joined = if is_absolute(url) {
			url.to_owned()
		} else {
			let base = self.base_url.as_str().trim_end_matches('/');
			let path = url.trim_start_matches('/');

			if path.is_empty() { base.to_owned() } else { format!("{base}/{path}") }
		};

		Url::parse(&joined)
			.map_err(|source| ConfigError::InvalidUrl { url: url.to_owned(), source })
	}

	/// Resolves the refresh endpoint.
	pub fn refresh_url(&self) -> Result<Url, ConfigError> {
		self.resolve(&self.refresh_path)
	}

	/// Converts [`default_headers`](RelayConfig::default_headers) into a [`HeaderMap`].
	pub fn header_map(&self) -> Result<HeaderMap, ConfigError> {
		let mut headers = HeaderMap::with_capacity(self.default_headers.len());

		for (name, value) in &self.default_headers {
			let invalid = || ConfigError::InvalidHeader { name: name.clone() };
			let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| invalid())?;
			let header_value = HeaderValue::from_str(value).map_err(|_| invalid())?;

			headers.insert(header_name, header_value);
		}

		Ok(headers)
	}

	/// Converts the configured timeout into the standard library representation.
	pub fn std_timeout(&self) -> Result<Option<std::time::Duration>, ConfigError> {
		self.timeout
			.map(|timeout| {
				std::time::Duration::try_from(timeout).map_err(|_| ConfigError::InvalidTimeout)
			})
			.transpose()
	}
}

fn is_absolute(url: &str) -> bool {
	let Some((scheme, _)) = url.split_once("://") else {
		return false;
	};
	let mut chars = scheme.chars();

	matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
		&& chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}
