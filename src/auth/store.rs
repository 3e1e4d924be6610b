//! Contract for the externally owned auth store plus an in-memory implementation.

// self
use crate::{_prelude::*, auth::AccessToken};

/// Externally owned auth state the relay mirrors tokens into.
///
/// The relay only reads the current token as a fallback and writes back refreshed tokens;
/// persistence and logout belong to the implementor.
pub trait AuthStore
where
	Self: Send + Sync,
{
	/// Returns the store's current access token, if any.
	fn access_token(&self) -> Option<AccessToken>;

	/// Replaces the store's access token.
	fn set_access_token(&self, token: AccessToken);
}

/// Thread-safe store that keeps the token in-process for tests and demos.
#[derive(Clone, Debug, Default)]
pub struct MemoryAuthStore(Arc<RwLock<Option<AccessToken>>>);
impl MemoryAuthStore {
	/// Creates a store seeded with `token`.
	pub fn with_token(token: AccessToken) -> Self {
		Self(Arc::new(RwLock::new(Some(token))))
	}
}
impl AuthStore for MemoryAuthStore {
	fn access_token(&self) -> Option<AccessToken> {
		self.0.read().clone()
	}

	fn set_access_token(&self, token: AccessToken) {
		*self.0.write() = Some(token);
	}
}
