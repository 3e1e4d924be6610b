//! Auth session: the single owner of token state and refresh coordination.
//!
//! [`AuthSession`] pairs the in-memory [`TokenHolder`] with the externally owned
//! [`AuthStore`], resolves the token for each outgoing request, and performs the
//! `POST /refresh-token` exchange. Clients receive the session explicitly (usually behind an
//! `Arc`) instead of reaching for process-wide state.
//!
//! Whether concurrent 401s share one refresh call is a [`RefreshPolicy`] decision. The default
//! lets every eligible request refresh independently, and the last refresh to complete wins.

mod metrics;

pub use metrics::RelayMetrics;

// std
use std::sync::atomic::{AtomicU64, Ordering};
// self
use crate::{
	_prelude::*,
	auth::{AccessToken, AuthStore, TokenHolder},
	config::RelayConfig,
	error::RefreshError,
	http::{HttpTransport, WireRequest},
	obs::{self, RefreshResolution, RelaySpan, RelayStage, StageOutcome},
};

/// How concurrent refresh attempts are coordinated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshPolicy {
	/// Every eligible 401 issues its own refresh call.
	#[default]
	Independent,
	/// Refreshes serialize; a caller whose request predates a completed refresh reuses its token.
	Coalesced,
}
impl RefreshPolicy {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			RefreshPolicy::Independent => "independent",
			RefreshPolicy::Coalesced => "coalesced",
		}
	}
}

/// Body returned by the refresh endpoint.
#[derive(Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
	/// Newly minted access token.
	#[serde(default)]
	pub access_token: Option<String>,
}
impl RefreshResponse {
	/// Validates the body and extracts the token.
	pub fn into_token(self) -> Result<AccessToken, RefreshError> {
		let raw = self
			.access_token
			.filter(|value| !value.trim().is_empty())
			.ok_or(RefreshError::MissingAccessToken)?;

		AccessToken::new(raw).map_err(RefreshError::InvalidToken)
	}
}
impl Debug for RefreshResponse {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RefreshResponse")
			.field("access_token_set", &self.access_token.is_some())
			.finish()
	}
}

/// Token state and refresh coordinator shared by a relay client.
pub struct AuthSession {
	holder: TokenHolder,
	store: Arc<dyn AuthStore>,
	policy: RefreshPolicy,
	generation: AtomicU64,
	refresh_lock: AsyncMutex<()>,
	last_refreshed_at: Mutex<Option<OffsetDateTime>>,
	metrics: RelayMetrics,
}
impl AuthSession {
	/// Creates a session mirroring tokens into `store`.
	pub fn new(store: Arc<dyn AuthStore>, policy: RefreshPolicy) -> Self {
		Self {
			holder: TokenHolder::default(),
			store,
			policy,
			generation: AtomicU64::new(0),
			refresh_lock: AsyncMutex::new(()),
			last_refreshed_at: Mutex::new(None),
			metrics: RelayMetrics::default(),
		}
	}

	/// Installs a token obtained outside the relay (typically by login).
	pub fn set_access_token(&self, token: AccessToken) {
		self.install(token);
	}

	/// Returns the token for the next request: the in-memory holder first, then the store.
	pub fn current_token(&self) -> Option<AccessToken> {
		self.holder.get().or_else(|| self.store.access_token())
	}

	/// Borrows the in-memory token holder.
	pub fn holder(&self) -> &TokenHolder {
		&self.holder
	}

	/// Borrows the external auth store.
	pub fn store(&self) -> &Arc<dyn AuthStore> {
		&self.store
	}

	/// Returns the refresh coordination policy.
	pub fn policy(&self) -> RefreshPolicy {
		self.policy
	}

	/// Returns a counter that advances on every token installation.
	pub fn generation(&self) -> u64 {
		self.generation.load(Ordering::Acquire)
	}

	/// Returns the instant of the last successful refresh.
	pub fn last_refreshed_at(&self) -> Option<OffsetDateTime> {
		*self.last_refreshed_at.lock()
	}

	/// Borrows the session's refresh counters.
	pub fn metrics(&self) -> &RelayMetrics {
		&self.metrics
	}

	/// Exchanges the current credentials for a new access token.
	///
	/// `observed_generation` is the [`generation`](AuthSession::generation) captured when the
	/// failing request was dispatched. Under [`RefreshPolicy::Coalesced`] a newer generation
	/// means another caller already refreshed, so its token is returned without a second call.
	pub async fn refresh<T>(
		&self,
		transport: &T,
		config: &RelayConfig,
		observed_generation: u64,
	) -> Result<AccessToken, RefreshError>
	where
		T: ?Sized + HttpTransport,
	{
		const STAGE: RelayStage = RelayStage::Refresh;

		let span = RelaySpan::new(STAGE, "refresh");

		span.instrument(async {
			let _singleflight = match self.policy {
				RefreshPolicy::Independent => None,
				RefreshPolicy::Coalesced => Some(self.refresh_lock.lock().await),
			};

			if self.policy == RefreshPolicy::Coalesced
				&& self.generation() != observed_generation
				&& let Some(token) = self.holder.get()
			{
				self.metrics.record_refresh_coalesced();
				self.resolved(&span, RefreshResolution::Reused);
				span.note("reused token installed by a concurrent refresh");

				return Ok(token);
			}

			self.resolved(&span, RefreshResolution::Exchanged);
			self.exchange(transport, config, &span).await
		})
		.await
	}

	fn resolved(&self, span: &RelaySpan, resolution: RefreshResolution) {
		span.record_refresh(self.policy, resolution);
		obs::record_refresh_resolution(self.policy, resolution);
	}

	async fn exchange<T>(
		&self,
		transport: &T,
		config: &RelayConfig,
		span: &RelaySpan,
	) -> Result<AccessToken, RefreshError>
	where
		T: ?Sized + HttpTransport,
	{
		const STAGE: RelayStage = RelayStage::Refresh;

		obs::record_stage_outcome(STAGE, StageOutcome::Attempt);
		self.metrics.record_refresh_attempt();

		let result = async {
			let request = build_refresh_request(config)?;
			let response = transport.execute(request).await.map_err(RefreshError::Transport)?;

			if !response.is_success() {
				return Err(RefreshError::Status {
					status: response.status.as_u16(),
					body: response.text(),
				});
			}

			let mut deserializer = serde_json::Deserializer::from_slice(&response.body);
			let body: RefreshResponse = serde_path_to_error::deserialize(&mut deserializer)
				.map_err(|source| RefreshError::Parse { source })?;
			let token = body.into_token()?;

			self.install(token.clone());
			*self.last_refreshed_at.lock() = Some(OffsetDateTime::now_utc());
			span.note("installed refreshed access token");

			Ok::<_, RefreshError>(token)
		}
		.await;

		match &result {
			Ok(_) => {
				self.metrics.record_refresh_success();
				obs::record_stage_outcome(STAGE, StageOutcome::Success);
			},
			Err(_) => {
				self.metrics.record_refresh_failure();
				obs::record_stage_outcome(STAGE, StageOutcome::Failure);
			},
		}

		result
	}

	fn install(&self, token: AccessToken) {
		self.holder.set(token.clone());
		self.store.set_access_token(token);
		self.generation.fetch_add(1, Ordering::AcqRel);
	}
}
impl Debug for AuthSession {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AuthSession")
			.field("policy", &self.policy)
			.field("token_set", &self.holder.get().is_some())
			.field("generation", &self.generation())
			.finish()
	}
}

/// Builds the bare refresh request: default headers only, no bearer, no body.
fn build_refresh_request(config: &RelayConfig) -> Result<WireRequest, RefreshError> {
	let url = config.refresh_url().map_err(RefreshError::Config)?;
	let headers = config.header_map().map_err(RefreshError::Config)?;
	let mut request = ::http::Request::builder()
		.method(Method::POST)
		.uri(url.as_str())
		.body(Vec::new())
		.map_err(|err| RefreshError::Config(err.into()))?;

	*request.headers_mut() = headers;

	Ok(request)
}
