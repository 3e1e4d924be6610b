//! Outgoing request description captured before interception.

// self
use crate::{_prelude::*, auth::AccessToken, error::ConfigError};

/// Per-request position in the token-refresh state machine.
///
/// Terminal outcomes are carried by the `Result` returned from
/// [`RelayClient::send`](crate::client::RelayClient::send), not by this enum.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum RefreshState {
	/// Not yet answered with a 401.
	#[default]
	Initial,
	/// Marked retried; the refresh call is in flight.
	Refreshing,
	/// Refresh succeeded and the request carries the new token for its single replay.
	Retried,
}
impl RefreshState {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			RefreshState::Initial => "initial",
			RefreshState::Refreshing => "refreshing",
			RefreshState::Retried => "retried",
		}
	}
}
impl Display for RefreshState {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Method, URL, headers, and body of an outgoing request, plus its one-shot retry guard.
///
/// The URL is kept exactly as the caller wrote it (relative path or absolute URL) so
/// excluded-path matching sees the same string; resolution against the base origin happens at
/// dispatch time.
#[derive(Clone, Debug)]
pub struct PendingRequest {
	/// HTTP method.
	pub method: Method,
	/// Request URL as supplied by the caller.
	pub url: String,
	/// Per-request headers; these override the client's default headers.
	pub headers: HeaderMap,
	/// Optional request body.
	pub body: Option<Vec<u8>>,
	state: RefreshState,
}
impl PendingRequest {
	/// Creates a request with no headers and no body.
	pub fn new(method: Method, url: impl Into<String>) -> Self {
		Self {
			method,
			url: url.into(),
			headers: HeaderMap::new(),
			body: None,
			state: RefreshState::Initial,
		}
	}

	/// Shorthand for a `GET` request.
	pub fn get(url: impl Into<String>) -> Self {
		Self::new(Method::GET, url)
	}

	/// Shorthand for a `POST` request.
	pub fn post(url: impl Into<String>) -> Self {
		Self::new(Method::POST, url)
	}

	/// Shorthand for a `PUT` request.
	pub fn put(url: impl Into<String>) -> Self {
		Self::new(Method::PUT, url)
	}

	/// Shorthand for a `PATCH` request.
	pub fn patch(url: impl Into<String>) -> Self {
		Self::new(Method::PATCH, url)
	}

	/// Shorthand for a `DELETE` request.
	pub fn delete(url: impl Into<String>) -> Self {
		Self::new(Method::DELETE, url)
	}

	/// Adds or replaces a header.
	pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
		self.headers.insert(name, value);

		self
	}

	/// Sets a raw body.
	pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
		self.body = Some(body.into());

		self
	}

	/// Serializes `body` as JSON and sets the `Content-Type` header accordingly.
	pub fn with_json<T>(mut self, body: &T) -> Result<Self, ConfigError>
	where
		T: ?Sized + Serialize,
	{
		self.body = Some(serde_json::to_vec(body)?);
		self.headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

		Ok(self)
	}

	/// Sets `Authorization: Bearer <token>`, replacing any existing value.
	pub fn set_bearer(&mut self, token: &AccessToken) {
		self.headers.insert(AUTHORIZATION, token.bearer_header());
	}

	/// Returns the current `Authorization` header, if any.
	pub fn authorization(&self) -> Option<&HeaderValue> {
		self.headers.get(AUTHORIZATION)
	}

	/// Current refresh state.
	pub fn refresh_state(&self) -> RefreshState {
		self.state
	}

	/// Checks whether the request has already spent its one refresh attempt.
	pub fn is_retried(&self) -> bool {
		self.state != RefreshState::Initial
	}

	pub(crate) fn mark_refreshing(&mut self) {
		self.state = RefreshState::Refreshing;
	}

	pub(crate) fn mark_retried(&mut self, token: &AccessToken) {
		self.set_bearer(token);
		self.state = RefreshState::Retried;
	}
}
