//! Outgoing half of the interception pipeline: bearer injection.

// self
use crate::{config::ExcludedPaths, request::PendingRequest, session::AuthSession};

/// Attaches `Authorization: Bearer <token>` to requests outside the excluded paths.
#[derive(Clone, Copy, Debug)]
pub struct RequestInterceptor<'a> {
	excluded: &'a ExcludedPaths,
	session: &'a AuthSession,
}
impl<'a> RequestInterceptor<'a> {
	/// Creates an interceptor reading tokens from `session`.
	pub fn new(excluded: &'a ExcludedPaths, session: &'a AuthSession) -> Self {
		Self { excluded, session }
	}

	/// Sets the bearer header when the URL is not excluded and a token is known.
	///
	/// Returns `true` when a header was written. Requests without a known token, and excluded
	/// requests, are left untouched.
	pub fn intercept(&self, request: &mut PendingRequest) -> bool {
		if self.excluded.matches(&request.url) {
			return false;
		}

		match self.session.current_token() {
			Some(token) => {
				request.set_bearer(&token);

				true
			},
			None => false,
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{
		_prelude::*,
		auth::{AccessToken, AuthStore, MemoryAuthStore},
		session::RefreshPolicy,
	};

	fn session_with(token: Option<&str>) -> AuthSession {
		let store = match token {
			Some(value) => MemoryAuthStore::with_token(
				AccessToken::new(value).expect("Token should be valid."),
			),
			None => MemoryAuthStore::default(),
		};
		let store: Arc<dyn AuthStore> = Arc::new(store);

		AuthSession::new(store, RefreshPolicy::default())
	}

	#[test]
	fn attaches_bearer_to_non_excluded_urls() {
		let session = session_with(Some("abc"));
		let excluded = ExcludedPaths::default();
		let interceptor = RequestInterceptor::new(&excluded, &session);
		let mut request = PendingRequest::get("/members/me");

		assert!(interceptor.intercept(&mut request));
		assert_eq!(request.authorization().expect("Bearer should be set."), "Bearer abc");
	}

	#[test]
	fn skips_excluded_urls_even_with_a_token() {
		let session = session_with(Some("abc"));
		let excluded = ExcludedPaths::default();
		let interceptor = RequestInterceptor::new(&excluded, &session);

		for url in ["/auth/login", "/members/register", "https://other.example.com/x/auth/login"] {
			let mut request = PendingRequest::post(url);

			assert!(!interceptor.intercept(&mut request));
			assert!(request.authorization().is_none(), "{url} must not carry a bearer.");
		}
	}

	#[test]
	fn leaves_requests_alone_without_a_token() {
		let session = session_with(None);
		let excluded = ExcludedPaths::default();
		let interceptor = RequestInterceptor::new(&excluded, &session);
		let mut request = PendingRequest::get("/members/me");

		assert!(!interceptor.intercept(&mut request));
		assert!(request.authorization().is_none());
	}

	#[test]
	fn replaces_a_stale_authorization_header() {
		let session = session_with(Some("fresh"));
		let excluded = ExcludedPaths::default();
		let interceptor = RequestInterceptor::new(&excluded, &session);
		let mut request = PendingRequest::get("/missions")
			.with_header(AUTHORIZATION, HeaderValue::from_static("Bearer stale"));

		interceptor.intercept(&mut request);

		assert_eq!(request.authorization().expect("Bearer should be set."), "Bearer fresh");
	}
}
