//! Transport primitives the relay dispatches requests through.
//!
//! The module exposes [`HttpTransport`] alongside [`RelayResponse`] so downstream crates can
//! plug in custom HTTP stacks without losing the relay's interception pipeline. The relay hands
//! transports fully resolved [`WireRequest`] values (absolute URL, merged headers, final body)
//! and expects a [`RelayResponse`] for every request that reached the backend, whatever its
//! status. Only failures that produced no HTTP response at all surface as [`TransportError`].

// self
use crate::{
	_prelude::*,
	error::{Error, TransportError},
};
#[cfg(feature = "reqwest")] use crate::{config::RelayConfig, error::ConfigError};

/// Fully resolved request handed to an [`HttpTransport`].
pub type WireRequest = ::http::Request<Vec<u8>>;

/// Boxed future returned by [`HttpTransport::execute`].
pub type TransportFuture<'a> =
	Pin<Box<dyn Future<Output = Result<RelayResponse, TransportError>> + 'a + Send>>;

/// Abstraction over HTTP stacks capable of executing relay requests.
///
/// The trait is the relay's only dependency on an HTTP client. Implementations must be
/// `Send + Sync + 'static` so one transport can be shared by the client and the refresh flow
/// behind an `Arc`, and the returned futures must be `Send` so callers can spawn sends onto
/// multi-threaded executors.
pub trait HttpTransport
where
	Self: 'static + Send + Sync,
{
	/// Executes `request` and returns the backend's response, regardless of status.
	fn execute(&self, request: WireRequest) -> TransportFuture<'_>;
}

/// Status, headers, and body of a backend response.
#[derive(Clone, Debug)]
pub struct RelayResponse {
	/// HTTP status code.
	pub status: StatusCode,
	/// Response headers.
	pub headers: HeaderMap,
	/// Raw response body.
	pub body: Vec<u8>,
}
impl RelayResponse {
	/// Assembles a response from its parts.
	pub fn new(status: StatusCode, headers: HeaderMap, body: Vec<u8>) -> Self {
		Self { status, headers, body }
	}

	/// Checks whether the status is in the 2xx range.
	pub fn is_success(&self) -> bool {
		self.status.is_success()
	}

	/// Converts non-2xx responses into [`Error::Status`].
	pub fn error_for_status(self, url: &Url) -> Result<Self> {
		if self.is_success() {
			Ok(self)
		} else {
			Err(Error::Status {
				status: self.status.as_u16(),
				url: url.to_string(),
				response: Box::new(self),
			})
		}
	}

	/// Decodes the body as JSON, reporting the failing path on mismatch.
	pub fn json<T>(&self) -> Result<T>
	where
		T: for<'de> Deserialize<'de>,
	{
		let mut deserializer = serde_json::Deserializer::from_slice(&self.body);

		serde_path_to_error::deserialize(&mut deserializer)
			.map_err(|source| Error::Decode { source })
	}

	/// Returns the body as lossy UTF-8.
	pub fn text(&self) -> String {
		String::from_utf8_lossy(&self.body).into_owned()
	}
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransport(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	/// Wraps an existing reqwest [`ReqwestClient`].
	///
	/// The caller owns cookie and timeout policy for clients built this way.
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	/// Builds a client that honors the configuration's credentials mode and timeout.
	pub fn from_config(config: &RelayConfig) -> Result<Self, ConfigError> {
		let mut builder = ReqwestClient::builder().cookie_store(config.with_credentials);

		if let Some(timeout) = config.std_timeout()? {
			builder = builder.timeout(timeout);
		}

		Ok(Self(builder.build()?))
	}
}
#[cfg(feature = "reqwest")]
impl HttpTransport for ReqwestTransport {
	fn execute(&self, request: WireRequest) -> TransportFuture<'_> {
		let client = self.0.clone();

		Box::pin(async move {
			let request = reqwest::Request::try_from(request)?;
			let response = client.execute(request).await?;
			let status = response.status();
			let headers = response.headers().to_owned();
			let body = response.bytes().await?.to_vec();

			Ok(RelayResponse::new(status, headers, body))
		})
	}
}
