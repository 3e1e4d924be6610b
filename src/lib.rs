//! Bearer-token HTTP client for a single backend origin: header injection on every outgoing
//! request, one-shot refresh-and-replay on 401, and transport-aware observability.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod intercept;
pub mod obs;
pub mod request;
pub mod session;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for tests; enabled via `cfg(test)` or the `test` crate
	//! feature.

	pub use crate::_prelude::*;

	// std
	use std::collections::VecDeque;
	// self
	use crate::{
		auth::{AuthStore, MemoryAuthStore},
		client::RelayClient,
		config::RelayConfig,
		error::TransportError,
		http::{HttpTransport, RelayResponse, TransportFuture, WireRequest},
		session::{AuthSession, RefreshPolicy},
	};
	#[cfg(feature = "reqwest")]
	use crate::{client::ReqwestRelayClient, http::ReqwestTransport};

	/// Request captured by [`ScriptedTransport`].
	#[derive(Clone, Debug)]
	pub struct RecordedRequest {
		/// HTTP method of the dispatched request.
		pub method: Method,
		/// Fully resolved URL.
		pub url: String,
		/// Headers as they left the client.
		pub headers: HeaderMap,
	}
	impl RecordedRequest {
		/// Returns the `Authorization` header as a string, if present.
		pub fn authorization(&self) -> Option<&str> {
			self.headers.get(AUTHORIZATION).and_then(|value| value.to_str().ok())
		}
	}

	/// In-process transport that replays queued responses in order and records every request.
	#[derive(Debug, Default)]
	pub struct ScriptedTransport {
		responses: Mutex<VecDeque<Result<RelayResponse, TransportError>>>,
		recorded: Mutex<Vec<RecordedRequest>>,
	}
	impl ScriptedTransport {
		/// Queues a response with the provided status and body.
		pub fn respond(&self, status: u16, body: &str) -> &Self {
			let status = StatusCode::from_u16(status).expect("Scripted status must be valid.");

			self.responses.lock().push_back(Ok(RelayResponse::new(
				status,
				HeaderMap::new(),
				body.as_bytes().to_vec(),
			)));

			self
		}

		/// Queues a transport-level failure.
		pub fn fail(&self, error: TransportError) -> &Self {
			self.responses.lock().push_back(Err(error));

			self
		}

		/// Returns every request dispatched so far.
		pub fn recorded(&self) -> Vec<RecordedRequest> {
			self.recorded.lock().clone()
		}

		/// Counts dispatched requests whose URL ends with `suffix`.
		pub fn hits(&self, suffix: &str) -> usize {
			self.recorded.lock().iter().filter(|request| request.url.ends_with(suffix)).count()
		}
	}
	impl HttpTransport for ScriptedTransport {
		fn execute(&self, request: WireRequest) -> TransportFuture<'_> {
			self.recorded.lock().push(RecordedRequest {
				method: request.method().clone(),
				url: request.uri().to_string(),
				headers: request.headers().clone(),
			});

			let next = self.responses.lock().pop_front();

			Box::pin(async move {
				next.unwrap_or_else(|| {
					Err(TransportError::network(std::io::Error::other(
						"Scripted transport ran out of responses.",
					)))
				})
			})
		}
	}

	/// Base origin used by scripted tests.
	pub const TEST_BASE_URL: &str = "https://relay.example.com/api";

	/// Builds a client over a [`ScriptedTransport`] with an in-memory auth store.
	pub fn build_scripted_client(
		policy: RefreshPolicy,
	) -> (RelayClient<ScriptedTransport>, Arc<ScriptedTransport>, Arc<MemoryAuthStore>) {
		let config = RelayConfig::builder(
			Url::parse(TEST_BASE_URL).expect("Test base URL should parse successfully."),
		)
		.build()
		.expect("Default relay configuration should build successfully.");
		let store_backend = Arc::new(MemoryAuthStore::default());
		let store: Arc<dyn AuthStore> = store_backend.clone();
		let session = Arc::new(AuthSession::new(store, policy));
		let transport = Arc::new(ScriptedTransport::default());
		let client = RelayClient::with_transport(config, session, transport.clone())
			.expect("Scripted relay client should build successfully.");

		(client, transport, store_backend)
	}

	/// Builds a reqwest transport that accepts the self-signed certificates produced by
	/// `httpmock` and keeps a cookie store, mirroring credentials mode.
	#[cfg(feature = "reqwest")]
	pub fn test_reqwest_transport() -> ReqwestTransport {
		let client = ReqwestClient::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.cookie_store(true)
			.build()
			.expect("Failed to build insecure Reqwest client for tests.");

		ReqwestTransport::with_client(client)
	}

	/// Constructs a [`ReqwestRelayClient`] for `base_url` over [`test_reqwest_transport`], backed
	/// by an in-memory auth store.
	#[cfg(feature = "reqwest")]
	pub fn build_reqwest_test_client(
		base_url: Url,
		policy: RefreshPolicy,
	) -> (ReqwestRelayClient, Arc<MemoryAuthStore>) {
		let config = RelayConfig::builder(base_url)
			.build()
			.expect("Relay configuration should build successfully.");
		let store_backend = Arc::new(MemoryAuthStore::default());
		let store: Arc<dyn AuthStore> = store_backend.clone();
		let session = Arc::new(AuthSession::new(store, policy));
		let client =
			RelayClient::with_transport(config, session, Arc::new(test_reqwest_transport()))
				.expect("Reqwest relay client should build successfully.");

		(client, store_backend)
	}
}

mod _prelude {
	pub use std::{
		collections::BTreeMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
	};

	pub use ::http::{
		HeaderMap, HeaderValue, Method, StatusCode,
		header::{AUTHORIZATION, CONTENT_TYPE, HeaderName},
	};
	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use ::http as http_types;
#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
