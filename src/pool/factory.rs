//! Client factory contract supplied by pool users.

// self
use crate::{_prelude::*, cache::DisposalFuture, credential::CredentialProvider};

/// Error type factories surface; the pool wraps it into a pool-level failure.
pub type FactoryError = Box<dyn StdError + Send + Sync>;

/// Boxed future returned by [`ClientFactory::create_client`].
pub type ClientFuture<'a, C> =
	Pin<Box<dyn Future<Output = Result<C, FactoryError>> + 'a + Send>>;

/// Pure constructor for service clients, invoked on cache misses.
///
/// The pool owns every constructed client's lifetime: clients are stored behind
/// [`Arc`], handed out as clones, and routed through [`dispose_client`] when their
/// cache entry is evicted. A client returned from the pool is guaranteed safe for the
/// current call; user code that retains it across a possible eviction accepts the
/// associated teardown race.
///
/// [`dispose_client`]: ClientFactory::dispose_client
pub trait ClientFactory
where
	Self: 'static + Send + Sync,
{
	/// Credential type the factory consumes through its [`CredentialProvider`].
	type Credential: Clone + Send + Sync + 'static;
	/// Options value distinguishing client variants; serialized into cache keys.
	type Options: Serialize + Send + Sync;
	/// Constructed client type.
	type Client: Send + Sync + 'static;

	/// Builds a client. Credentials are materialized lazily through the provider view.
	fn create_client<'a>(
		&'a self,
		credentials: CredentialProvider<Self::Credential>,
		options: Option<&'a Self::Options>,
	) -> ClientFuture<'a, Self::Client>;

	/// Short, stable summary of an options value used for key derivation.
	///
	/// Returning `None` (the default) falls back to a canonical serialization hash of
	/// the options.
	fn fingerprint(&self, options: &Self::Options) -> Option<String> {
		let _ = options;

		None
	}

	/// Releases resources held by an evicted client.
	///
	/// The default is a no-op; the shim exists so external cleanup APIs of any shape can
	/// be adapted at this seam.
	fn dispose_client(&self, client: Arc<Self::Client>) -> DisposalFuture<'static> {
		Box::pin(async move {
			drop(client);

			Ok(())
		})
	}
}
