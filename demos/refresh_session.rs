//! Logs in against a backend, then fetches the member profile through the relay.
//!
//! Set `RELAY_BASE_URL` (for example `https://i11b105.p.ssafy.io/api`) plus `RELAY_EMAIL` and
//! `RELAY_PASSWORD`. If the access token expires between calls, the relay refreshes it through
//! `POST /refresh-token` using the HTTP-only cookie set by login and replays the request.

// std
use std::{env, sync::Arc};
// crates.io
use color_eyre::Result;
use serde::Deserialize;
use url::Url;
// self
use bearer_relay::{
	auth::{AccessToken, AuthStore, MemoryAuthStore},
	client::ReqwestRelayClient,
	config::RelayConfig,
	session::{AuthSession, RefreshPolicy},
};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginResponse {
	access_token: String,
}

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let base_url = Url::parse(&env::var("RELAY_BASE_URL")?)?;
	let email = env::var("RELAY_EMAIL")?;
	let password = env::var("RELAY_PASSWORD")?;
	let config = RelayConfig::builder(base_url).timeout(time::Duration::seconds(10)).build()?;
	let store: Arc<dyn AuthStore> = Arc::new(MemoryAuthStore::default());
	let session = Arc::new(AuthSession::new(store, RefreshPolicy::Coalesced));
	let client = ReqwestRelayClient::new(config, session)?;
	let login: LoginResponse = client
		.post_json("/auth/login", &serde_json::json!({ "email": email, "password": password }))
		.await?
		.json()?;

	client.set_access_token(AccessToken::new(login.access_token)?);

	let profile = client.get("/members/me").await?;

	println!("profile: {}", profile.text());
	println!("refreshes issued: {}", client.session().metrics().refresh_attempts());

	Ok(())
}
