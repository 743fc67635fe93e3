//! Disposal capability seam for values owned by a cache.

// self
use crate::_prelude::*;

/// Boxed future returned by disposal hooks and [`Disposable::dispose`].
pub type DisposalFuture<'a> =
	Pin<Box<dyn Future<Output = Result<(), DisposalError>> + 'a + Send>>;

/// Shared teardown hook invoked with ownership of an evicted value.
pub type DisposeHook<T> = Arc<dyn Fn(T) -> DisposalFuture<'static> + Send + Sync>;

/// Error surfaced by a disposal hook.
///
/// Disposal failures are logged and swallowed by the cache; they never propagate to
/// callers, so the type carries a message rather than a typed cause.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("Disposal failed: {message}.")]
pub struct DisposalError {
	/// Human-readable failure payload.
	pub message: String,
}
impl DisposalError {
	/// Creates a new disposal error from any displayable payload.
	pub fn new(message: impl Into<String>) -> Self {
		Self { message: message.into() }
	}
}

/// Single teardown capability for values that need cleanup on eviction.
///
/// External APIs with synchronous, asynchronous, or scope-based cleanup are adapted to
/// this one interface at the seam where values enter a cache.
pub trait Disposable
where
	Self: Send + Sync,
{
	/// Releases resources held by the value.
	fn dispose(&self) -> DisposalFuture<'_>;
}

/// Builds a [`DisposeHook`] that forwards to the value's own [`Disposable`] capability.
pub fn disposable_hook<T>() -> DisposeHook<T>
where
	T: 'static + Disposable,
{
	Arc::new(|value: T| Box::pin(async move { value.dispose().await }))
}

#[cfg(test)]
mod tests {
	// std
	use std::sync::atomic::{AtomicUsize, Ordering};
	// self
	use super::*;

	struct Closable(Arc<AtomicUsize>);
	impl Disposable for Closable {
		fn dispose(&self) -> DisposalFuture<'_> {
			self.0.fetch_add(1, Ordering::SeqCst);

			Box::pin(async { Ok(()) })
		}
	}

	#[tokio::test]
	async fn disposable_hook_forwards_to_the_capability() {
		let closed = Arc::new(AtomicUsize::new(0));
		let hook = disposable_hook::<Closable>();

		hook(Closable(closed.clone())).await.expect("Disposal fixture should succeed.");

		assert_eq!(closed.load(Ordering::SeqCst), 1);
	}
}
