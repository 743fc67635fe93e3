// self
use crate::{_prelude::*, cache::DisposalError, obs::PoolOp};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedOp<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedOp<F> = F;

/// A span builder used by pool operations.
#[derive(Clone, Debug)]
pub struct PoolSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl PoolSpan {
	/// Creates a new span tagged with the provided operation + stage.
	pub fn new(op: PoolOp, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("client_pool.op", op = op.as_str(), stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (op, stage);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedOp<Fut>
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

/// Logs a swallowed disposal failure at warn level (when enabled).
pub(crate) fn warn_disposal_failure(cache: &'static str, context: &str, error: &DisposalError) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(cache, context, %error, "cache entry disposal failed");
	}

	#[cfg(not(feature = "tracing"))]
	{
		let _ = (cache, context, error);
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[tokio::test]
	async fn instrument_passes_the_value_through() {
		let span = PoolSpan::new(PoolOp::GetClient, "instrument_passes_the_value_through");
		let value = span.instrument(async { 42 }).await;

		assert_eq!(value, 42);
	}

	#[test]
	fn disposal_warnings_never_panic() {
		warn_disposal_failure("client", "clear", &DisposalError::new("already closed"));
	}
}
