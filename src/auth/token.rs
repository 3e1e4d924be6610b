//! Redacted bearer credential that keeps token material out of logs.

// self
use crate::_prelude::*;

/// Error returned when a string cannot serve as a bearer credential.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ThisError)]
pub enum TokenError {
	/// The token was empty or whitespace.
	#[error("Access token cannot be empty.")]
	Empty,
	/// The token contains bytes that are not valid in an HTTP header value.
	#[error("Access token contains characters that are not valid in an HTTP header.")]
	InvalidHeaderValue,
}

/// Opaque bearer credential with a precomputed `Authorization` header value.
///
/// The header value is flagged sensitive so HTTP stacks that honor the flag skip it when
/// logging.
#[derive(Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccessToken {
	value: String,
	bearer: HeaderValue,
}
impl AccessToken {
	/// Validates the raw token and prepares its `Bearer` header value.
	pub fn new(value: impl Into<String>) -> Result<Self, TokenError> {
		let value = value.into();

		if value.trim().is_empty() {
			return Err(TokenError::Empty);
		}

		let mut bearer = HeaderValue::from_str(&format!("Bearer {value}"))
			.map_err(|_| TokenError::InvalidHeaderValue)?;

		bearer.set_sensitive(true);

		Ok(Self { value, bearer })
	}

	/// Returns the inner token value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.value
	}

	/// Returns the `Bearer <token>` header value for this credential.
	pub fn bearer_header(&self) -> HeaderValue {
		self.bearer.clone()
	}
}
impl PartialEq for AccessToken {
	fn eq(&self, other: &Self) -> bool {
		self.value == other.value
	}
}
impl Eq for AccessToken {}
impl AsRef<str> for AccessToken {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl TryFrom<String> for AccessToken {
	type Error = TokenError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		Self::new(value)
	}
}
impl TryFrom<&str> for AccessToken {
	type Error = TokenError;

	fn try_from(value: &str) -> Result<Self, Self::Error> {
		Self::new(value)
	}
}
impl From<AccessToken> for String {
	fn from(token: AccessToken) -> Self {
		token.value
	}
}
impl Debug for AccessToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("AccessToken").field(&"<redacted>").finish()
	}
}
impl Display for AccessToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn token_formatters_redact() {
		let token = AccessToken::new("super-secret").expect("Token fixture should be valid.");

		assert_eq!(format!("{token:?}"), "AccessToken(\"<redacted>\")");
		assert_eq!(format!("{token}"), "<redacted>");
		assert_eq!(token.expose(), "super-secret");
	}

	#[test]
	fn bearer_header_is_prefixed_and_sensitive() {
		let token = AccessToken::new("abc").expect("Token fixture should be valid.");
		let header = token.bearer_header();

		assert_eq!(header.to_str().expect("Bearer header should be ASCII."), "Bearer abc");
		assert!(header.is_sensitive());
	}

	#[test]
	fn rejects_empty_and_non_header_tokens() {
		assert_eq!(AccessToken::new("").unwrap_err(), TokenError::Empty);
		assert_eq!(AccessToken::new("   ").unwrap_err(), TokenError::Empty);
		assert_eq!(AccessToken::new("line\nbreak").unwrap_err(), TokenError::InvalidHeaderValue);
	}

	#[test]
	fn serde_round_trips_through_plain_string() {
		let token: AccessToken =
			serde_json::from_str("\"xyz\"").expect("Token should deserialize from a string.");

		assert_eq!(token.expose(), "xyz");
		assert_eq!(serde_json::to_string(&token).expect("Token should serialize."), "\"xyz\"");
		assert!(serde_json::from_str::<AccessToken>("\"\"").is_err());
	}
}
