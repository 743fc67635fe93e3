//! Client pool tying the cache, key, and credential layers together.

pub mod factory;

pub use factory::*;

// self
use crate::{
	_prelude::*,
	auth::AuthRequest,
	cache::{CachePolicy, CacheStats, DisposalFuture, TtlCache},
	config::PoolConfig,
	credential::{ApplicationStrategy, CredentialManager, CredentialProvider, DelegatedStrategy},
	key::KeyBuilder,
	obs::{self, OpOutcome, PoolOp, PoolSpan},
};

/// Point-in-time counters for both pool caches.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PoolStats {
	/// Client-cache counters.
	pub clients: CacheStats,
	/// Application-credential cache counters.
	pub credentials: CacheStats,
}

/// Pool of ready-to-use clients keyed by (auth context, options), with token-aware TTLs.
///
/// For token-bound requests the effective client TTL is the assertion's remaining
/// lifetime minus the configured safety buffer, so a cached client never outlives the
/// credentials that may be derived through it. Concurrent requests for the same key
/// share a single factory invocation.
pub struct ClientPool<F>
where
	F: ClientFactory,
{
	factory: Arc<F>,
	credentials: Arc<CredentialManager<F::Credential>>,
	clients: Arc<TtlCache<Arc<F::Client>>>,
	keys: KeyBuilder,
	buffer: Duration,
}
impl<F> ClientPool<F>
where
	F: ClientFactory,
{
	/// Creates a pool from a factory, credential strategies, and validated configuration.
	pub fn new(
		factory: F,
		application: Arc<dyn ApplicationStrategy<F::Credential>>,
		delegated: Arc<dyn DelegatedStrategy<F::Credential>>,
		config: PoolConfig,
	) -> Result<Self> {
		config.validate()?;

		let factory = Arc::new(factory);
		let disposer = factory.clone();
		let clients = TtlCache::new("client", CachePolicy {
			sliding_ttl: config.cache.client_sliding_ttl(),
			absolute_ttl: None,
			max_size: config.cache.client_cache_max_size,
		})
		.with_disposer(Arc::new(move |client: Arc<F::Client>| -> DisposalFuture<'static> {
			let disposer = disposer.clone();

			Box::pin(async move { disposer.dispose_client(client).await })
		}));

		Ok(Self {
			credentials: Arc::new(CredentialManager::new(application, delegated, &config.cache)),
			clients: Arc::new(clients),
			keys: KeyBuilder::new(&*config.cache.key_prefix),
			buffer: config.cache.client_buffer(),
			factory,
		})
	}

	/// Returns a client for the auth request, constructing one only on cache misses.
	pub async fn get_client(
		&self,
		request: &AuthRequest,
		options: Option<&F::Options>,
	) -> Result<Arc<F::Client>> {
		let span = PoolSpan::new(PoolOp::GetClient, "get_client");

		obs::record_op_outcome(PoolOp::GetClient, OpOutcome::Attempt);

		let result = span
			.instrument(async move {
				let now = OffsetDateTime::now_utc();
				let context = request.validate_at(now)?;
				let fingerprint = options.and_then(|options| self.factory.fingerprint(options));
				let key = self.keys.client_key(&context, fingerprint, options)?;
				// Stay strictly below the assertion lifetime; a non-positive remainder
				// means "construct but do not cache".
				let ttl_override =
					context.identity().map(|identity| identity.expires_at - now - self.buffer);
				let factory = self.factory.clone();
				let provider = CredentialProvider::new(self.credentials.clone(), context);

				self.clients
					.get_or_create(key.stable(), ttl_override, key.log_view(), move || async move {
						let client = factory
							.create_client(provider, options)
							.await
							.map_err(Error::factory)?;

						Ok(Arc::new(client))
					})
					.await
			})
			.await;

		match &result {
			Ok(_) => obs::record_op_outcome(PoolOp::GetClient, OpOutcome::Success),
			Err(_) => obs::record_op_outcome(PoolOp::GetClient, OpOutcome::Failure),
		}

		result
	}

	/// Evicts the cached client for the request, reporting whether one was present.
	pub async fn invalidate_client(
		&self,
		request: &AuthRequest,
		options: Option<&F::Options>,
	) -> Result<bool> {
		let span = PoolSpan::new(PoolOp::InvalidateClient, "invalidate_client");

		obs::record_op_outcome(PoolOp::InvalidateClient, OpOutcome::Attempt);

		let result = span
			.instrument(async move {
				let context = request.validate()?;
				let fingerprint = options.and_then(|options| self.factory.fingerprint(options));
				let key = self.keys.client_key(&context, fingerprint, options)?;

				Ok(self.clients.delete(key.stable()).await)
			})
			.await;

		match &result {
			Ok(_) => obs::record_op_outcome(PoolOp::InvalidateClient, OpOutcome::Success),
			Err(_) => obs::record_op_outcome(PoolOp::InvalidateClient, OpOutcome::Failure),
		}

		result
	}

	/// Borrows the shared factory handle.
	pub fn factory(&self) -> &Arc<F> {
		&self.factory
	}

	/// Counters for both caches.
	pub fn stats(&self) -> PoolStats {
		PoolStats { clients: self.clients.stats(), credentials: self.credentials.stats() }
	}

	/// Removes and disposes every cached client and application credential.
	pub async fn clear(&self) {
		self.clients.clear().await;
		self.credentials.clear().await;
	}

	/// Evicts entries past their deadline in both caches, returning how many left.
	pub async fn purge_expired(&self) -> usize {
		self.clients.purge_expired().await + self.credentials.purge_expired().await
	}

	/// Spawns a background task that periodically purges both caches.
	#[cfg(feature = "tokio")]
	pub fn spawn_sweeper(
		self: &Arc<Self>,
		every: std::time::Duration,
	) -> tokio::task::JoinHandle<()> {
		let pool = Arc::downgrade(self);

		tokio::spawn(async move {
			let mut ticker = tokio::time::interval(every);

			loop {
				ticker.tick().await;

				let Some(pool) = pool.upgrade() else { break };

				pool.purge_expired().await;
			}
		})
	}
}
impl<F> Debug for ClientPool<F>
where
	F: ClientFactory,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ClientPool")
			.field("clients", &self.clients.stats())
			.field("credentials", &self.credentials.stats())
			.finish()
	}
}
