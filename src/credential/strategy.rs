//! Credential strategy contracts backed by external identity-provider adapters.

// self
use crate::{_prelude::*, auth::UserAssertion};

/// Error type strategies surface; the manager wraps it into a pool-level failure.
pub type StrategyError = Box<dyn StdError + Send + Sync>;

/// Boxed future returned by credential strategies.
pub type StrategyFuture<'a, K> =
	Pin<Box<dyn Future<Output = Result<K, StrategyError>> + 'a + Send>>;

/// Constructs credentials representing the process's own identity.
///
/// Concrete adapters (developer CLI, managed identity, ...) live outside this crate;
/// the configured [`StrategyKind`](crate::config::StrategyKind) tells hosts which one
/// to wire in. Application credentials are reusable across users and are cached by the
/// credential manager.
pub trait ApplicationStrategy<K>
where
	Self: Send + Sync,
{
	/// Acquires a fresh application credential.
	fn create(&self) -> StrategyFuture<'_, K>;
}

/// Constructs credentials bound to one user assertion.
///
/// Implementations may re-check the assertion deadline themselves; the manager already
/// filters expired assertions before invoking this trait.
pub trait DelegatedStrategy<K>
where
	Self: Send + Sync,
{
	/// Acquires a credential delegating the asserted user's identity.
	fn create<'a>(&'a self, assertion: &'a UserAssertion) -> StrategyFuture<'a, K>;
}

/// Application strategy that tries a list of links in order, returning the first success.
///
/// This is the in-crate realization of the `chain` strategy selection; the links
/// themselves remain external adapters.
pub struct ChainApplicationStrategy<K> {
	links: Vec<Arc<dyn ApplicationStrategy<K>>>,
}
impl<K> ChainApplicationStrategy<K> {
	/// Creates a chain over the provided links; evaluation order follows the list.
	pub fn new(links: Vec<Arc<dyn ApplicationStrategy<K>>>) -> Self {
		Self { links }
	}
}
impl<K> ApplicationStrategy<K> for ChainApplicationStrategy<K>
where
	K: Send + Sync,
{
	fn create(&self) -> StrategyFuture<'_, K> {
		Box::pin(async move {
			let mut last_error: Option<StrategyError> = None;

			for link in &self.links {
				match link.create().await {
					Ok(credential) => return Ok(credential),
					Err(error) => last_error = Some(error),
				}
			}

			Err(last_error.unwrap_or_else(|| "credential chain has no links".into()))
		})
	}
}
impl<K> Debug for ChainApplicationStrategy<K> {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ChainApplicationStrategy").field("links", &self.links.len()).finish()
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::sync::atomic::{AtomicUsize, Ordering};
	// self
	use super::*;

	struct Flaky {
		calls: Arc<AtomicUsize>,
		succeed: bool,
	}
	impl ApplicationStrategy<&'static str> for Flaky {
		fn create(&self) -> StrategyFuture<'_, &'static str> {
			self.calls.fetch_add(1, Ordering::SeqCst);

			let succeed = self.succeed;

			Box::pin(async move {
				if succeed {
					Ok("credential")
				} else {
					Err("unavailable".into())
				}
			})
		}
	}

	#[tokio::test]
	async fn chain_returns_the_first_success() {
		let first_calls = Arc::new(AtomicUsize::new(0));
		let second_calls = Arc::new(AtomicUsize::new(0));
		let third_calls = Arc::new(AtomicUsize::new(0));
		let chain = ChainApplicationStrategy::new(vec![
			Arc::new(Flaky { calls: first_calls.clone(), succeed: false }),
			Arc::new(Flaky { calls: second_calls.clone(), succeed: true }),
			Arc::new(Flaky { calls: third_calls.clone(), succeed: true }),
		]);
		let credential = chain.create().await.expect("Chain with a healthy link should succeed.");

		assert_eq!(credential, "credential");
		assert_eq!(first_calls.load(Ordering::SeqCst), 1);
		assert_eq!(second_calls.load(Ordering::SeqCst), 1);
		assert_eq!(third_calls.load(Ordering::SeqCst), 0, "Later links must not be consulted.");
	}

	#[tokio::test]
	async fn chain_surfaces_the_last_failure() {
		let calls = Arc::new(AtomicUsize::new(0));
		let chain = ChainApplicationStrategy::new(vec![
			Arc::new(Flaky { calls: calls.clone(), succeed: false }) as Arc<dyn ApplicationStrategy<&'static str>>,
			Arc::new(Flaky { calls: calls.clone(), succeed: false }),
		]);

		let error = chain.create().await.expect_err("All-failing chain should error.");

		assert_eq!(error.to_string(), "unavailable");
		assert_eq!(calls.load(Ordering::SeqCst), 2);
	}

	#[tokio::test]
	async fn empty_chain_errors() {
		let chain = ChainApplicationStrategy::<&'static str>::new(Vec::new());

		assert!(chain.create().await.is_err());
	}
}
