//! Optional observability helpers for relay stages.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `bearer_relay.stage` with the `stage` and
//!   `call_site` fields, plus `decision`/`reject_reason` on sends and `policy`/`resolution` on
//!   refreshes.
//! - Enable `metrics` to increment `bearer_relay_stage_total` (labeled by `stage` + `outcome`),
//!   `bearer_relay_decision_total` (labeled by `decision` + `reject_reason`), and
//!   `bearer_relay_refresh_total` (labeled by `policy` + `resolution`).

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Pipeline stages observed by the relay.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RelayStage {
	/// Intercepted send through [`RelayClient::send`](crate::client::RelayClient::send).
	Send,
	/// Call to the refresh endpoint.
	Refresh,
	/// Single replay of a request after a successful refresh.
	Replay,
}
impl RelayStage {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			RelayStage::Send => "send",
			RelayStage::Refresh => "refresh",
			RelayStage::Replay => "replay",
		}
	}
}
impl Display for RelayStage {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StageOutcome {
	/// Entry to a stage.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl StageOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			StageOutcome::Attempt => "attempt",
			StageOutcome::Success => "success",
			StageOutcome::Failure => "failure",
		}
	}
}
impl Display for StageOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// How a refresh obtained the token it returned.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RefreshResolution {
	/// The refresh endpoint was called.
	Exchanged,
	/// A concurrent caller's newer token was reused without a call.
	Reused,
}
impl RefreshResolution {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			RefreshResolution::Exchanged => "exchanged",
			RefreshResolution::Reused => "reused",
		}
	}
}
