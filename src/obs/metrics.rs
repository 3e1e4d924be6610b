// self
use crate::{
	intercept::ResponseDecision,
	obs::{RefreshResolution, RelayStage, StageOutcome},
	session::RefreshPolicy,
};

/// Records a stage outcome via the global metrics recorder (when enabled).
pub fn record_stage_outcome(stage: RelayStage, outcome: StageOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"bearer_relay_stage_total",
			"stage" => stage.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (stage, outcome);
	}
}

/// Counts response-interceptor decisions, labeled by `decision` and `reject_reason`.
///
/// Non-reject decisions carry `reject_reason="none"`.
pub fn record_decision(decision: ResponseDecision) {
	#[cfg(feature = "metrics")]
	{
		let reason = decision.reject_reason().map_or("none", |reason| reason.as_str());

		metrics::counter!(
			"bearer_relay_decision_total",
			"decision" => decision.as_str(),
			"reject_reason" => reason
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = decision;
	}
}

/// Counts refresh resolutions, labeled by `policy` and `resolution`.
pub fn record_refresh_resolution(policy: RefreshPolicy, resolution: RefreshResolution) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"bearer_relay_refresh_total",
			"policy" => policy.as_str(),
			"resolution" => resolution.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (policy, resolution);
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::intercept::RejectReason;

	#[test]
	fn recorders_are_noops_without_metrics() {
		record_stage_outcome(RelayStage::Refresh, StageOutcome::Failure);
		record_decision(ResponseDecision::Reject(RejectReason::Transport));
		record_decision(ResponseDecision::PassThrough);
		record_refresh_resolution(RefreshPolicy::Independent, RefreshResolution::Exchanged);
	}
}
