//! Relay client tying configuration, session, interceptors, and transport together.

// self
use crate::{
	_prelude::*,
	auth::AccessToken,
	config::RelayConfig,
	error::ConfigError,
	http::{HttpTransport, RelayResponse, WireRequest},
	intercept::{RequestInterceptor, ResponseDecision, ResponseInterceptor},
	obs::{self, RelaySpan, RelayStage, StageOutcome},
	request::PendingRequest,
	session::AuthSession,
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestTransport;

#[cfg(feature = "reqwest")]
/// Relay client specialized for the crate's default reqwest transport.
pub type ReqwestRelayClient = RelayClient<ReqwestTransport>;

/// Authenticated HTTP client for a single backend origin.
///
/// [`send`](RelayClient::send) runs every request through the request interceptor, the
/// transport, and the response interceptor. A 401 on a non-excluded request triggers exactly one
/// refresh through the shared [`AuthSession`], after which the request is replayed once with the
/// refreshed token. The replay bypasses the request interceptor so it carries the token that its
/// own refresh produced.
pub struct RelayClient<T>
where
	T: ?Sized + HttpTransport,
{
	config: Arc<RelayConfig>,
	default_headers: Arc<HeaderMap>,
	session: Arc<AuthSession>,
	transport: Arc<T>,
}
impl<T> RelayClient<T>
where
	T: ?Sized + HttpTransport,
{
	/// Creates a client that reuses the caller-provided transport.
	pub fn with_transport(
		config: RelayConfig,
		session: Arc<AuthSession>,
		transport: Arc<T>,
	) -> Result<Self> {
		config.validate().map_err(ConfigError::from)?;

		let default_headers = config.header_map()?;

		Ok(Self {
			config: Arc::new(config),
			default_headers: Arc::new(default_headers),
			session,
			transport,
		})
	}

	/// Borrows the validated configuration.
	pub fn config(&self) -> &RelayConfig {
		&self.config
	}

	/// Borrows the shared auth session.
	pub fn session(&self) -> &Arc<AuthSession> {
		&self.session
	}

	/// Borrows the underlying transport.
	pub fn transport(&self) -> &Arc<T> {
		&self.transport
	}

	/// Returns the headers [`send_raw`](RelayClient::send_raw) would merge into a request,
	/// including the default `Authorization` derived from the token holder.
	pub fn default_headers(&self) -> HeaderMap {
		let mut headers = (*self.default_headers).clone();

		if let Some(authorization) = self.session.holder().default_authorization() {
			headers.insert(AUTHORIZATION, authorization);
		}

		headers
	}

	/// Installs a token obtained by login.
	pub fn set_access_token(&self, token: AccessToken) {
		self.session.set_access_token(token);
	}

	/// Forces a refresh outside the 401 path.
	pub async fn refresh(&self) -> Result<AccessToken> {
		let generation = self.session.generation();

		Ok(self.session.refresh(self.transport.as_ref(), &self.config, generation).await?)
	}

	/// Sends `request` through both interceptors with at most one refresh-and-replay.
	pub async fn send(&self, mut request: PendingRequest) -> Result<RelayResponse> {
		const STAGE: RelayStage = RelayStage::Send;

		let span = RelaySpan::new(STAGE, "send");

		obs::record_stage_outcome(STAGE, StageOutcome::Attempt);

		let result = span
			.instrument(async {
				let excluded = &self.config.excluded_paths;

				RequestInterceptor::new(excluded, &self.session).intercept(&mut request);

				let generation = self.session.generation();
				let outcome = self.dispatch(&request, false).await;
				let decision = ResponseInterceptor::new(excluded).decide(&request, &outcome);

				span.record_decision(decision);
				obs::record_decision(decision);

				match decision {
					ResponseDecision::PassThrough | ResponseDecision::Reject(_) => outcome,
					ResponseDecision::RefreshAndReplay => {
						request.mark_refreshing();

						let token = self
							.session
							.refresh(self.transport.as_ref(), &self.config, generation)
							.await?;

						request.mark_retried(&token);

						self.replay(&request).await
					},
				}
			})
			.await;

		match &result {
			Ok(_) => obs::record_stage_outcome(STAGE, StageOutcome::Success),
			Err(_) => obs::record_stage_outcome(STAGE, StageOutcome::Failure),
		}

		result
	}

	/// Sends `request` with the default headers only, skipping both interceptors.
	pub async fn send_raw(&self, request: PendingRequest) -> Result<RelayResponse> {
		self.dispatch(&request, true).await
	}

	/// Sends a `GET` request through the interceptors.
	pub async fn get(&self, url: impl Into<String>) -> Result<RelayResponse> {
		self.send(PendingRequest::get(url)).await
	}

	/// Sends a `DELETE` request through the interceptors.
	pub async fn delete(&self, url: impl Into<String>) -> Result<RelayResponse> {
		self.send(PendingRequest::delete(url)).await
	}

	/// Sends a JSON `POST` request through the interceptors.
	pub async fn post_json<B>(&self, url: impl Into<String>, body: &B) -> Result<RelayResponse>
	where
		B: ?Sized + Serialize,
	{
		self.send(PendingRequest::post(url).with_json(body)?).await
	}

	/// Sends a JSON `PUT` request through the interceptors.
	pub async fn put_json<B>(&self, url: impl Into<String>, body: &B) -> Result<RelayResponse>
	where
		B: ?Sized + Serialize,
	{
		self.send(PendingRequest::put(url).with_json(body)?).await
	}

	/// Sends a JSON `PATCH` request through the interceptors.
	pub async fn patch_json<B>(&self, url: impl Into<String>, body: &B) -> Result<RelayResponse>
	where
		B: ?Sized + Serialize,
	{
		self.send(PendingRequest::patch(url).with_json(body)?).await
	}

	async fn replay(&self, request: &PendingRequest) -> Result<RelayResponse> {
		const STAGE: RelayStage = RelayStage::Replay;

		let span = RelaySpan::new(STAGE, "replay");

		obs::record_stage_outcome(STAGE, StageOutcome::Attempt);
		self.session.metrics().record_replay();

		let result = span.instrument(self.dispatch(request, false)).await;
		// A retried request never earns another refresh, so a 401 lands on `Reject(Retried)`.
		let decision =
			ResponseInterceptor::new(&self.config.excluded_paths).decide(request, &result);

		span.record_decision(decision);
		obs::record_decision(decision);

		match &result {
			Ok(_) => obs::record_stage_outcome(STAGE, StageOutcome::Success),
			Err(_) => obs::record_stage_outcome(STAGE, StageOutcome::Failure),
		}

		result
	}

	async fn dispatch(
		&self,
		request: &PendingRequest,
		default_authorization: bool,
	) -> Result<RelayResponse> {
		let url = self.config.resolve(&request.url)?;
		let wire = self.wire_request(request, &url, default_authorization)?;
		let response = self.transport.execute(wire).await?;

		response.error_for_status(&url)
	}

	fn wire_request(
		&self,
		request: &PendingRequest,
		url: &Url,
		default_authorization: bool,
	) -> Result<WireRequest> {
		let mut headers = if default_authorization {
			self.default_headers()
		} else {
			(*self.default_headers).clone()
		};

		merge_headers(&mut headers, &request.headers);

		let mut wire = ::http::Request::builder()
			.method(request.method.clone())
			.uri(url.as_str())
			.body(request.body.clone().unwrap_or_default())
			.map_err(ConfigError::from)?;

		*wire.headers_mut() = headers;

		Ok(wire)
	}
}
#[cfg(feature = "reqwest")]
impl RelayClient<ReqwestTransport> {
	/// Creates a client that provisions its own reqwest transport from `config`.
	pub fn new(config: RelayConfig, session: Arc<AuthSession>) -> Result<Self> {
		let transport = ReqwestTransport::from_config(&config)?;

		Self::with_transport(config, session, Arc::new(transport))
	}
}
impl<T> Clone for RelayClient<T>
where
	T: ?Sized + HttpTransport,
{
	fn clone(&self) -> Self {
		Self {
			config: Arc::clone(&self.config),
			default_headers: Arc::clone(&self.default_headers),
			session: Arc::clone(&self.session),
			transport: Arc::clone(&self.transport),
		}
	}
}
impl<T> Debug for RelayClient<T>
where
	T: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RelayClient")
			.field("base_url", &self.config.base_url.as_str())
			.field("session", &self.session)
			.finish()
	}
}

/// Overlays `overrides` onto `base`, replacing every value of each overridden header name.
fn merge_headers(base: &mut HeaderMap, overrides: &HeaderMap) {
	for name in overrides.keys() {
		base.remove(name);

		for value in overrides.get_all(name) {
			base.append(name.clone(), value.clone());
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{
		_preludet::*,
		auth::{AuthStore, MemoryAuthStore, TokenError},
		config::RelayConfigError,
		error::{Error, RefreshError, TransportError},
		request::RefreshState,
		session::RefreshPolicy,
	};

	fn token(value: &str) -> AccessToken {
		AccessToken::new(value).expect("Token fixture should be valid.")
	}

	#[test]
	fn merge_headers_overrides_every_value() {
		let mut base = HeaderMap::new();
		let mut overrides = HeaderMap::new();

		base.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
		base.insert(AUTHORIZATION, HeaderValue::from_static("Bearer default"));
		overrides.insert(AUTHORIZATION, HeaderValue::from_static("Bearer request"));

		merge_headers(&mut base, &overrides);

		assert_eq!(base.get_all(AUTHORIZATION).iter().count(), 1);
		assert_eq!(
			base.get(AUTHORIZATION).expect("Authorization should be set."),
			"Bearer request"
		);
		assert_eq!(
			base.get(CONTENT_TYPE).expect("Content-Type should be kept."),
			"application/json"
		);
	}

	#[tokio::test]
	async fn send_attaches_current_token() {
		let (client, transport, store) = build_scripted_client(RefreshPolicy::default());

		store.set_access_token(token("abc"));
		transport.respond(200, r#"{"nickname":"bit"}"#);

		let response = client.get("/members/me").await.expect("Request should succeed.");
		let recorded = transport.recorded();

		assert_eq!(response.text(), r#"{"nickname":"bit"}"#);
		assert_eq!(recorded[0].url, "https://relay.example.com/api/members/me");
		assert_eq!(recorded[0].authorization(), Some("Bearer abc"));
		assert_eq!(
			recorded[0].headers.get(CONTENT_TYPE).expect("Content-Type should be set."),
			"application/json"
		);
	}

	#[tokio::test]
	async fn excluded_paths_never_carry_a_bearer_or_refresh() {
		let (client, transport, _store) = build_scripted_client(RefreshPolicy::default());

		client.set_access_token(token("abc"));
		transport.respond(401, "bad credentials");

		let err = client
			.post_json("/auth/login", &serde_json::json!({ "email": "a@b.c" }))
			.await
			.expect_err("401 on login should propagate.");

		assert!(err.is_unauthorized());
		assert_eq!(transport.recorded().len(), 1);
		assert!(transport.recorded()[0].authorization().is_none());
		assert_eq!(transport.hits("/refresh-token"), 0);
	}

	#[tokio::test]
	async fn unauthorized_refreshes_once_and_replays_with_new_token() {
		let (client, transport, store) = build_scripted_client(RefreshPolicy::default());

		client.set_access_token(token("abc"));
		transport
			.respond(401, "expired")
			.respond(200, r#"{"accessToken":"xyz"}"#)
			.respond(200, r#"{"nickname":"bit"}"#);

		let response = client.get("/members/me").await.expect("Replay should succeed.");
		let recorded = transport.recorded();

		assert_eq!(response.text(), r#"{"nickname":"bit"}"#);
		assert_eq!(recorded.len(), 3);
		assert_eq!(recorded[0].authorization(), Some("Bearer abc"));
		assert!(recorded[1].url.ends_with("/refresh-token"));
		assert!(recorded[1].authorization().is_none());
		assert_eq!(recorded[2].authorization(), Some("Bearer xyz"));
		assert_eq!(store.access_token().map(|t| t.expose().to_owned()), Some("xyz".into()));
		assert_eq!(
			client.default_headers().get(AUTHORIZATION).expect("Default bearer should be set."),
			"Bearer xyz"
		);
		assert_eq!(client.session().metrics().refresh_attempts(), 1);
		assert_eq!(client.session().metrics().replays(), 1);
	}

	#[tokio::test]
	async fn second_unauthorized_is_propagated_without_another_refresh() {
		let (client, transport, _store) = build_scripted_client(RefreshPolicy::default());

		client.set_access_token(token("abc"));
		transport
			.respond(401, "expired")
			.respond(200, r#"{"accessToken":"xyz"}"#)
			.respond(401, "still expired");

		let err = client.get("/members/me").await.expect_err("Second 401 should propagate.");

		match err {
			Error::Status { status, response, .. } => {
				assert_eq!(status, 401);
				assert_eq!(response.text(), "still expired");
			},
			other => panic!("Unexpected error: {other:?}"),
		}

		assert_eq!(transport.hits("/refresh-token"), 1);
		assert_eq!(transport.recorded().len(), 3);
	}

	#[tokio::test]
	async fn refresh_failure_replaces_the_original_unauthorized() {
		let (client, transport, _store) = build_scripted_client(RefreshPolicy::default());

		client.set_access_token(token("abc"));
		transport.respond(401, "expired").respond(401, "refresh cookie missing");

		let err = client.get("/members/me").await.expect_err("Refresh failure should propagate.");

		assert!(matches!(err, Error::Refresh(RefreshError::Status { status: 401, .. })));
		assert!(!err.is_unauthorized());
		assert_eq!(transport.recorded().len(), 2);
	}

	#[tokio::test]
	async fn refresh_transport_failure_surfaces_without_replay() {
		let (client, transport, store) = build_scripted_client(RefreshPolicy::default());

		client.set_access_token(token("abc"));
		transport
			.respond(401, "expired")
			.fail(TransportError::network(std::io::Error::other("connection reset")));

		let err = client.get("/members/me").await.expect_err("Refresh failure should propagate.");

		assert!(matches!(
			err,
			Error::Refresh(RefreshError::Transport(TransportError::Network { .. }))
		));
		assert_eq!(transport.recorded().len(), 2);
		assert_eq!(store.access_token().map(|t| t.expose().to_owned()), Some("abc".into()));
		assert_eq!(client.session().metrics().refresh_failures(), 1);
		assert_eq!(client.session().metrics().replays(), 0);
	}

	#[tokio::test]
	async fn refreshed_token_that_cannot_be_a_header_is_rejected() {
		let (client, transport, store) = build_scripted_client(RefreshPolicy::default());

		client.set_access_token(token("abc"));
		transport.respond(401, "expired").respond(200, r#"{"accessToken":"line\nbreak"}"#);

		let err = client.get("/members/me").await.expect_err("Unusable token should propagate.");

		assert!(matches!(
			err,
			Error::Refresh(RefreshError::InvalidToken(TokenError::InvalidHeaderValue))
		));
		assert_eq!(transport.recorded().len(), 2);
		assert_eq!(store.access_token().map(|t| t.expose().to_owned()), Some("abc".into()));
	}

	#[test]
	fn configured_authorization_header_is_rejected_before_any_send() {
		let mut config = RelayConfig::builder(
			Url::parse(TEST_BASE_URL).expect("Test base URL should parse successfully."),
		)
		.build()
		.expect("Default configuration should build.");

		config.default_headers.insert("Authorization".into(), "Bearer static".into());

		let store: Arc<dyn AuthStore> = Arc::new(MemoryAuthStore::default());
		let session = Arc::new(AuthSession::new(store, RefreshPolicy::default()));
		let transport = Arc::new(ScriptedTransport::default());
		let err = RelayClient::with_transport(config, session, Arc::clone(&transport))
			.expect_err("A static bearer would reach excluded paths.");

		assert!(matches!(
			err,
			Error::Config(ConfigError::Invalid(RelayConfigError::ReservedHeader { .. }))
		));
		assert!(transport.recorded().is_empty());
	}

	#[tokio::test]
	async fn non_auth_errors_pass_through() {
		let (client, transport, _store) = build_scripted_client(RefreshPolicy::default());

		client.set_access_token(token("abc"));
		transport.respond(500, "boom");

		let err = client.get("/missions").await.expect_err("500 should propagate.");

		assert_eq!(err.status(), Some(500));
		assert_eq!(transport.hits("/refresh-token"), 0);
	}

	#[tokio::test]
	async fn send_raw_uses_default_headers_only() {
		let (client, transport, store) = build_scripted_client(RefreshPolicy::default());

		store.set_access_token(token("store-only"));
		transport.respond(200, "").respond(401, "").respond(200, "");

		client.send_raw(PendingRequest::get("/health")).await.expect("Raw send should succeed.");

		assert!(transport.recorded()[0].authorization().is_none());

		client.set_access_token(token("abc"));

		let err = client
			.send_raw(PendingRequest::get("/members/me"))
			.await
			.expect_err("Raw sends never refresh.");

		assert!(err.is_unauthorized());
		assert_eq!(transport.recorded()[1].authorization(), Some("Bearer abc"));

		client
			.send_raw(PendingRequest::get("/auth/login"))
			.await
			.expect("Raw send should succeed.");

		assert_eq!(transport.recorded()[2].authorization(), Some("Bearer abc"));
		assert_eq!(transport.hits("/refresh-token"), 0);
	}

	#[tokio::test]
	async fn explicit_refresh_installs_token() {
		let (client, transport, _store) = build_scripted_client(RefreshPolicy::Coalesced);

		transport.respond(200, r#"{"accessToken":"manual"}"#);

		let token = client.refresh().await.expect("Manual refresh should succeed.");

		assert_eq!(token.expose(), "manual");
		assert_eq!(
			client.session().current_token().map(|t| t.expose().to_owned()),
			Some("manual".into())
		);
	}

	#[test]
	fn refresh_state_labels_are_stable() {
		assert_eq!(RefreshState::Initial.to_string(), "initial");
		assert_eq!(RefreshState::Refreshing.to_string(), "refreshing");
		assert_eq!(RefreshState::Retried.to_string(), "retried");
	}
}
