//! Demonstrates plugging a non-reqwest transport into the relay.
//!
//! 1. Implement [`HttpTransport`] so the relay can hand it fully resolved requests.
//! 2. Wrap it in an `Arc` and pass it to [`RelayClient::with_transport`].
//! 3. Watch the first 401 trigger one refresh and one replay.

// std
use std::sync::{
	Arc,
	atomic::{AtomicBool, Ordering},
};
// crates.io
use color_eyre::Result;
use http::{StatusCode, header::AUTHORIZATION};
use url::Url;
// self
use bearer_relay::{
	auth::{AccessToken, AuthStore, MemoryAuthStore},
	client::RelayClient,
	config::RelayConfig,
	http::{HttpTransport, RelayResponse, TransportFuture, WireRequest},
	session::{AuthSession, RefreshPolicy},
};

/// Rejects the first bearer it sees, then accepts whatever the refresh endpoint minted.
#[derive(Default)]
struct ExpiringBackend {
	refreshed: AtomicBool,
}
impl HttpTransport for ExpiringBackend {
	fn execute(&self, request: WireRequest) -> TransportFuture<'_> {
		let bearer = request.headers().get(AUTHORIZATION).and_then(|v| v.to_str().ok());
		let (status, body) = match (request.uri().path(), bearer) {
			("/api/refresh-token", _) => {
				self.refreshed.store(true, Ordering::SeqCst);

				(StatusCode::OK, "{\"accessToken\":\"minted\"}")
			},
			(_, Some("Bearer minted")) if self.refreshed.load(Ordering::SeqCst) =>
				(StatusCode::OK, "{\"nickname\":\"bit\"}"),
			_ => (StatusCode::UNAUTHORIZED, ""),
		};

		println!("{} {} -> {status}", request.method(), request.uri());

		Box::pin(async move {
			Ok(RelayResponse::new(status, Default::default(), body.as_bytes().to_vec()))
		})
	}
}

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let config = RelayConfig::builder(Url::parse("https://backend.example.com/api")?).build()?;
	let store: Arc<dyn AuthStore> =
		Arc::new(MemoryAuthStore::with_token(AccessToken::new("stale")?));
	let session = Arc::new(AuthSession::new(store, RefreshPolicy::default()));
	let transport = Arc::new(ExpiringBackend::default());
	let client = RelayClient::with_transport(config, session, transport)?;
	let profile = client.get("/members/me").await?;

	println!("profile: {}", profile.text());

	Ok(())
}
