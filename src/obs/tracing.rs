// self
use crate::{
	_prelude::*,
	intercept::ResponseDecision,
	obs::{RefreshResolution, RelayStage},
	session::RefreshPolicy,
};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedStage<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedStage<F> = F;

/// Span wrapping one relay stage.
///
/// Every span carries `stage` and `call_site`. Send spans fill in `decision` and
/// `reject_reason` once the response interceptor has classified the outcome; refresh spans fill
/// in `policy` and `resolution`. Token material is never recorded.
#[derive(Clone, Debug)]
pub struct RelaySpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl RelaySpan {
	/// Creates a new span tagged with the provided stage + call site.
	pub fn new(stage: RelayStage, call_site: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!(
				"bearer_relay.stage",
				stage = stage.as_str(),
				call_site,
				decision = tracing::field::Empty,
				reject_reason = tracing::field::Empty,
				policy = tracing::field::Empty,
				resolution = tracing::field::Empty,
			);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (stage, call_site);

			Self {}
		}
	}

	/// Records how the response interceptor classified the outcome.
	pub fn record_decision(&self, decision: ResponseDecision) {
		#[cfg(feature = "tracing")]
		{
			self.span.record("decision", decision.as_str());

			if let Some(reason) = decision.reject_reason() {
				self.span.record("reject_reason", reason.as_str());
			}
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = decision;
		}
	}

	/// Records the policy a refresh ran under and how it obtained its token.
	pub fn record_refresh(&self, policy: RefreshPolicy, resolution: RefreshResolution) {
		#[cfg(feature = "tracing")]
		{
			self.span.record("policy", policy.as_str());
			self.span.record("resolution", resolution.as_str());
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (policy, resolution);
		}
	}

	/// Emits a debug event inside the span; token material must never be passed here.
	pub fn note(&self, message: &'static str) {
		#[cfg(feature = "tracing")]
		{
			self.span.in_scope(|| tracing::debug!("{message}"));
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = message;
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedStage<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}
