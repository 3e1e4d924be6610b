//! Single-slot in-memory token cell.

// self
use crate::{_prelude::*, auth::AccessToken};

/// Mutable single-slot store for the current access token.
///
/// The slot doubles as the source of the client's default `Authorization` header: every
/// [`set`](TokenHolder::set) replaces the token and the header in one write, so readers never
/// observe one without the other. Later writes overwrite earlier ones unconditionally.
#[derive(Debug, Default)]
pub struct TokenHolder(RwLock<Option<AccessToken>>);
impl TokenHolder {
	/// Overwrites the current token.
	pub fn set(&self, token: AccessToken) {
		*self.0.write() = Some(token);
	}

	/// Empties the slot and drops the default `Authorization` header.
	pub fn clear(&self) {
		*self.0.write() = None;
	}

	/// Returns a copy of the current token, if any.
	pub fn get(&self) -> Option<AccessToken> {
		self.0.read().clone()
	}

	/// Returns the default `Authorization` header derived from the current token.
	pub fn default_authorization(&self) -> Option<HeaderValue> {
		self.0.read().as_ref().map(AccessToken::bearer_header)
	}
}
