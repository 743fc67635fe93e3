//! Optional observability helpers for pool operations.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `client_pool.op` with the `op` and
//!   `stage` fields, plus warn-level events for swallowed disposal failures.
//! - Enable `metrics` to increment the `client_pool_op_total` counter for every
//!   attempt/success/failure (labeled by `op` + `outcome`) and the
//!   `client_pool_cache_event_total` counter for cache hits, misses, evictions, and
//!   disposals (labeled by `cache` + `event`).

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Pool operations observed by spans and counters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PoolOp {
	/// Client lookup or construction.
	GetClient,
	/// Explicit client-cache invalidation.
	InvalidateClient,
	/// Application-credential lookup or construction.
	ApplicationCredential,
	/// Delegated-credential construction.
	DelegatedCredential,
}
impl PoolOp {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			PoolOp::GetClient => "get_client",
			PoolOp::InvalidateClient => "invalidate_client",
			PoolOp::ApplicationCredential => "application_credential",
			PoolOp::DelegatedCredential => "delegated_credential",
		}
	}
}
impl Display for PoolOp {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OpOutcome {
	/// Entry to a pool helper.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl OpOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OpOutcome::Attempt => "attempt",
			OpOutcome::Success => "success",
			OpOutcome::Failure => "failure",
		}
	}
}
impl Display for OpOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Cache life-cycle events observed per cache instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CacheEvent {
	/// Fresh entry served.
	Hit,
	/// No fresh entry; a construction follows.
	Miss,
	/// Entry removed (TTL, LRU, delete, or clear).
	Evict,
	/// Disposal hook ran for an evicted value.
	Dispose,
}
impl CacheEvent {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			CacheEvent::Hit => "hit",
			CacheEvent::Miss => "miss",
			CacheEvent::Evict => "evict",
			CacheEvent::Dispose => "dispose",
		}
	}
}
impl Display for CacheEvent {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
