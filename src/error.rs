//! Relay-level error types shared across the client, session, and transports.

// self
use crate::{_prelude::*, auth::TokenError, config::RelayConfigError, http::RelayResponse};

/// Relay-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical relay error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Token refresh failed; the original 401 is discarded.
	#[error(transparent)]
	Refresh(#[from] RefreshError),

	/// Backend answered with a status outside the 2xx range.
	#[error("Request to {url} failed with status {status}.")]
	Status {
		/// HTTP status code.
		status: u16,
		/// Resolved request URL.
		url: String,
		/// Full response, kept so callers can inspect the error body.
		response: Box<RelayResponse>,
	},
	/// Response body could not be decoded into the requested type.
	#[error("Response body could not be decoded.")]
	Decode {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
}
impl Error {
	/// Returns the HTTP status carried by the error, if any.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Status { status, .. } => Some(*status),
			Self::Refresh(RefreshError::Status { status, .. }) => Some(*status),
			_ => None,
		}
	}

	/// Checks whether the error is a 401 response from the backend.
	pub fn is_unauthorized(&self) -> bool {
		matches!(self, Self::Status { status: 401, .. })
	}
}

/// Configuration and validation failures raised by the relay.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Relay configuration failed validation.
	#[error(transparent)]
	Invalid(#[from] RelayConfigError),
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] ::http::Error),
	/// Request URL cannot be resolved against the base origin.
	#[error("Request URL `{url}` is invalid.")]
	InvalidUrl {
		/// URL as supplied by the caller.
		url: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Default header name or value is not valid HTTP.
	#[error("Default header `{name}` is invalid.")]
	InvalidHeader {
		/// Header name as configured.
		name: String,
	},
	/// Request body could not be serialized to JSON.
	#[error("Request body could not be serialized.")]
	BodySerialize(#[from] serde_json::Error),
	/// Configured timeout cannot be represented by the transport.
	#[error("The timeout value must be positive.")]
	InvalidTimeout,
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Failures of the `/refresh-token` exchange.
#[derive(Debug, ThisError)]
pub enum RefreshError {
	/// Refresh endpoint answered with a non-2xx status.
	#[error("Refresh endpoint returned status {status}.")]
	Status {
		/// HTTP status code.
		status: u16,
		/// Lossy UTF-8 rendering of the response body.
		body: String,
	},
	/// Refresh endpoint responded with JSON that does not match the refresh contract.
	#[error("Refresh endpoint returned malformed JSON.")]
	Parse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// Refresh body omitted `accessToken` or left it empty.
	#[error("Refresh response is missing accessToken.")]
	MissingAccessToken,
	/// Refresh body carried a token that cannot be sent as a header.
	#[error("Refresh response carried an unusable access token.")]
	InvalidToken(#[source] TokenError),
	/// Refresh request could not be built.
	#[error("Refresh request could not be built.")]
	Config(#[source] ConfigError),
	/// Transport failed while calling the refresh endpoint.
	#[error("Transport failed while calling the refresh endpoint.")]
	Transport(#[source] TransportError),
}

/// Failures that produced no HTTP response at all.
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the backend.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn status_helpers_report_backend_codes() {
		let response = RelayResponse::new(StatusCode::UNAUTHORIZED, HeaderMap::new(), Vec::new());
		let err = Error::Status {
			status: 401,
			url: "https://relay.example.com/api/members/me".into(),
			response: Box::new(response),
		};

		assert!(err.is_unauthorized());
		assert_eq!(err.status(), Some(401));
		assert_eq!(
			err.to_string(),
			"Request to https://relay.example.com/api/members/me failed with status 401."
		);

		let refresh = Error::from(RefreshError::Status { status: 403, body: String::new() });

		assert!(!refresh.is_unauthorized());
		assert_eq!(refresh.status(), Some(403));
	}
}
