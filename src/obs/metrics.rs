// self
use crate::obs::{CacheEvent, OpOutcome, PoolOp};

/// Records a pool operation outcome via the global metrics recorder (when enabled).
pub fn record_op_outcome(op: PoolOp, outcome: OpOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"client_pool_op_total",
			"op" => op.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (op, outcome);
	}
}

/// Records a cache event for the named cache instance (when enabled).
pub fn record_cache_event(cache: &'static str, event: CacheEvent) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"client_pool_cache_event_total",
			"cache" => cache,
			"event" => event.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (cache, event);
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn recorders_noop_without_metrics() {
		record_op_outcome(PoolOp::GetClient, OpOutcome::Failure);
		record_cache_event("client", CacheEvent::Evict);
	}
}
