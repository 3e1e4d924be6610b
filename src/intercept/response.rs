//! Incoming half of the interception pipeline: the refresh-and-replay decision.

// self
use crate::{_prelude::*, config::ExcludedPaths, http::RelayResponse, request::PendingRequest};

/// What the client does with a request's outcome.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResponseDecision {
	/// Successful response; return it unchanged.
	PassThrough,
	/// Error that is final for this request; return it unchanged.
	Reject(RejectReason),
	/// First 401 on a non-excluded request; refresh once and replay.
	RefreshAndReplay,
}
impl ResponseDecision {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			ResponseDecision::PassThrough => "pass_through",
			ResponseDecision::Reject(_) => "reject",
			ResponseDecision::RefreshAndReplay => "refresh_and_replay",
		}
	}

	/// Returns why the outcome was final, for rejections.
	pub const fn reject_reason(self) -> Option<RejectReason> {
		match self {
			ResponseDecision::Reject(reason) => Some(reason),
			_ => None,
		}
	}
}

/// Why an error outcome is returned to the caller without a refresh.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RejectReason {
	/// Backend answered with a non-2xx status other than 401.
	Status,
	/// 401 on a URL matching the excluded paths.
	Excluded,
	/// 401 on a request that already spent its refresh.
	Retried,
	/// No HTTP response was received.
	Transport,
	/// The request failed locally before reaching a transport.
	Local,
}
impl RejectReason {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			RejectReason::Status => "status",
			RejectReason::Excluded => "excluded",
			RejectReason::Retried => "retried",
			RejectReason::Transport => "transport",
			RejectReason::Local => "local",
		}
	}
}

/// Classifies outcomes for the token-refresh state machine.
///
/// | outcome                                   | decision             |
/// |-------------------------------------------|----------------------|
/// | 2xx response                              | `PassThrough`        |
/// | non-401 status                            | `Reject(Status)`     |
/// | no response from the transport            | `Reject(Transport)`  |
/// | local failure before dispatch             | `Reject(Local)`      |
/// | 401 on an excluded URL                    | `Reject(Excluded)`   |
/// | 401 on a request already marked retried   | `Reject(Retried)`    |
/// | 401 otherwise                             | `RefreshAndReplay`   |
#[derive(Clone, Copy, Debug)]
pub struct ResponseInterceptor<'a> {
	excluded: &'a ExcludedPaths,
}
impl<'a> ResponseInterceptor<'a> {
	/// Creates an interceptor honoring `excluded`.
	pub fn new(excluded: &'a ExcludedPaths) -> Self {
		Self { excluded }
	}

	/// Decides how to handle `outcome` for `request`.
	pub fn decide(
		&self,
		request: &PendingRequest,
		outcome: &Result<RelayResponse>,
	) -> ResponseDecision {
		let error = match outcome {
			Ok(_) => return ResponseDecision::PassThrough,
			Err(error) => error,
		};

		let reason = match error {
			Error::Transport(_) => RejectReason::Transport,
			Error::Status { .. } if !error.is_unauthorized() => RejectReason::Status,
			Error::Status { .. } if self.excluded.matches(&request.url) => RejectReason::Excluded,
			Error::Status { .. } if request.is_retried() => RejectReason::Retried,
			Error::Status { .. } => return ResponseDecision::RefreshAndReplay,
			_ => RejectReason::Local,
		};

		ResponseDecision::Reject(reason)
	}
}
