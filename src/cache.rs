//! Bounded TTL cache with single-flight construction and disposable-aware teardown.

pub mod dispose;

pub use dispose::*;

// self
use crate::{
	_prelude::*,
	obs::{self, CacheEvent},
};

/// TTL and size bounds applied to one [`TtlCache`] instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CachePolicy {
	/// Default sliding TTL applied to entries stored without an override.
	pub sliding_ttl: Duration,
	/// Optional hard expiry measured from an entry's creation, independent of access.
	pub absolute_ttl: Option<Duration>,
	/// Bound on concurrently cached entries; exceeding it evicts the least recently used.
	pub max_size: usize,
}

/// Point-in-time cache counters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CacheStats {
	/// Entries currently stored.
	pub size: usize,
	/// Configured entry bound.
	pub max_size: usize,
	/// In-flight constructions not yet settled.
	pub pending: usize,
}

/// Shared state of one single-flight construction.
enum Flight<T> {
	/// No holder has settled this slot yet.
	Open,
	/// The flight finished; waiters receive clones of the outcome.
	Settled(Result<T>),
}

struct Entry<T> {
	value: T,
	sliding_ttl: Duration,
	deadline: OffsetDateTime,
	absolute_deadline: Option<OffsetDateTime>,
	touched: u64,
}
impl<T> Entry<T> {
	fn new(
		value: T,
		sliding_ttl: Duration,
		absolute_ttl: Option<Duration>,
		now: OffsetDateTime,
		tick: u64,
	) -> Self {
		Self {
			value,
			sliding_ttl,
			deadline: now + sliding_ttl,
			absolute_deadline: absolute_ttl.map(|ttl| now + ttl),
			touched: tick,
		}
	}

	fn effective_deadline(&self) -> OffsetDateTime {
		match self.absolute_deadline {
			Some(absolute) if absolute < self.deadline => absolute,
			_ => self.deadline,
		}
	}

	fn is_expired_at(&self, now: OffsetDateTime) -> bool {
		now >= self.effective_deadline()
	}

	fn touch(&mut self, now: OffsetDateTime, tick: u64) {
		self.deadline = now + self.sliding_ttl;
		self.touched = tick;
	}
}

struct Inner<T> {
	entries: HashMap<String, Entry<T>>,
	tick: u64,
}

/// Bounded mapping from stable keys to values with sliding + absolute expiry.
///
/// Bookkeeping is guarded by one lock per cache instance; value construction and
/// disposal always run outside it. Concurrent `get_or_create` calls for the same key
/// coalesce onto a single construction, and every removal path (TTL, LRU, explicit
/// delete, clear) routes the evicted value through the configured disposal hook.
pub struct TtlCache<T> {
	name: &'static str,
	policy: CachePolicy,
	disposer: Option<DisposeHook<T>>,
	inner: Mutex<Inner<T>>,
	flights: Mutex<HashMap<String, Arc<AsyncMutex<Flight<T>>>>>,
}
impl<T> TtlCache<T>
where
	T: Clone,
{
	/// Creates a cache with the provided policy and no disposal hook.
	///
	/// The name labels log messages and metric series for this instance.
	pub fn new(name: &'static str, policy: CachePolicy) -> Self {
		Self {
			name,
			policy,
			disposer: None,
			inner: Mutex::new(Inner { entries: HashMap::new(), tick: 0 }),
			flights: Mutex::new(HashMap::new()),
		}
	}

	/// Installs a teardown hook invoked with ownership of every evicted value.
	pub fn with_disposer(mut self, hook: DisposeHook<T>) -> Self {
		self.disposer = Some(hook);

		self
	}

	/// Convenience for value types that carry their own [`Disposable`] capability.
	pub fn with_disposable_values(self) -> Self
	where
		T: 'static + Disposable,
	{
		self.with_disposer(disposable_hook())
	}

	/// Returns the cached value for `key`, or constructs it via `build`.
	///
	/// A fresh entry is returned immediately, resetting its sliding deadline. On a miss,
	/// concurrent callers for the same key share one `build` invocation: the first
	/// arrival constructs, everyone else awaits the same outcome (value or error). A
	/// `ttl_override` replaces the default sliding TTL for this entry; a non-positive
	/// override means the value is constructed and returned without being stored.
	///
	/// `context` is a log-safe description of the key (stored keys are opaque digests).
	pub async fn get_or_create<B, Fut>(
		&self,
		key: &str,
		ttl_override: Option<Duration>,
		context: &str,
		build: B,
	) -> Result<T>
	where
		B: FnOnce() -> Fut,
		Fut: Future<Output = Result<T>>,
	{
		if let Some(value) = self.lookup(key, context).await {
			obs::record_cache_event(self.name, CacheEvent::Hit);

			return Ok(value);
		}

		obs::record_cache_event(self.name, CacheEvent::Miss);

		let flight = self.flight(key);
		let mut slot = flight.lock().await;

		if let Flight::Settled(outcome) = &*slot {
			return outcome.clone();
		}
		// Losing the race against a flight that already retired leaves the value in the
		// cache but a fresh slot in hand, so re-check before constructing.
		if let Some(value) = self.lookup(key, context).await {
			obs::record_cache_event(self.name, CacheEvent::Hit);

			return Ok(value);
		}

		let outcome = build().await;
		let mut evicted = Vec::new();

		if let Ok(value) = &outcome {
			if let Some(ttl) = self.effective_ttl(ttl_override) {
				evicted = self.store(key, value.clone(), ttl);
			}
		}

		*slot = Flight::Settled(outcome.clone());

		self.flights.lock().remove(key);
		drop(slot);
		self.dispose_all(context, evicted).await;

		outcome
	}

	/// Removes and disposes the entry for `key`, reporting whether one was present.
	pub async fn delete(&self, key: &str) -> bool {
		let removed = self.inner.lock().entries.remove(key);

		match removed {
			Some(entry) => {
				obs::record_cache_event(self.name, CacheEvent::Evict);
				self.dispose_one(key, entry.value).await;

				true
			},
			None => false,
		}
	}

	/// Removes and disposes every entry.
	pub async fn clear(&self) {
		let drained = {
			let mut inner = self.inner.lock();

			inner.entries.drain().map(|(_, entry)| entry.value).collect::<Vec<_>>()
		};

		self.dispose_all("clear", drained).await;
	}

	/// Removes and disposes entries past their deadline, returning how many were evicted.
	pub async fn purge_expired(&self) -> usize {
		let now = OffsetDateTime::now_utc();
		let dead = {
			let mut inner = self.inner.lock();
			let keys = inner
				.entries
				.iter()
				.filter(|(_, entry)| entry.is_expired_at(now))
				.map(|(key, _)| key.clone())
				.collect::<Vec<_>>();

			keys.into_iter()
				.filter_map(|key| inner.entries.remove(&key))
				.map(|entry| entry.value)
				.collect::<Vec<_>>()
		};
		let count = dead.len();

		self.dispose_all("purge_expired", dead).await;

		count
	}

	/// Point-in-time counters for this cache.
	pub fn stats(&self) -> CacheStats {
		CacheStats {
			size: self.inner.lock().entries.len(),
			max_size: self.policy.max_size,
			pending: self.flights.lock().len(),
		}
	}

	/// Spawns a background task that periodically purges expired entries.
	///
	/// The task holds only a weak handle and exits once the cache is dropped.
	#[cfg(feature = "tokio")]
	pub fn spawn_sweeper(self: &Arc<Self>, every: std::time::Duration) -> tokio::task::JoinHandle<()>
	where
		T: 'static + Send + Sync,
	{
		let cache = Arc::downgrade(self);

		tokio::spawn(async move {
			let mut ticker = tokio::time::interval(every);

			loop {
				ticker.tick().await;

				let Some(cache) = cache.upgrade() else { break };

				cache.purge_expired().await;
			}
		})
	}

	async fn lookup(&self, key: &str, context: &str) -> Option<T> {
		let now = OffsetDateTime::now_utc();
		let (hit, dead) = {
			let mut inner = self.inner.lock();
			let Inner { entries, tick } = &mut *inner;

			match entries.get_mut(key) {
				None => (None, None),
				Some(entry) if entry.is_expired_at(now) =>
					(None, entries.remove(key).map(|entry| entry.value)),
				Some(entry) => {
					*tick += 1;

					entry.touch(now, *tick);

					(Some(entry.value.clone()), None)
				},
			}
		};

		if let Some(value) = dead {
			obs::record_cache_event(self.name, CacheEvent::Evict);
			self.dispose_one(context, value).await;
		}

		hit
	}

	fn flight(&self, key: &str) -> Arc<AsyncMutex<Flight<T>>> {
		let mut flights = self.flights.lock();

		flights
			.entry(key.to_owned())
			.or_insert_with(|| Arc::new(AsyncMutex::new(Flight::Open)))
			.clone()
	}

	fn effective_ttl(&self, ttl_override: Option<Duration>) -> Option<Duration> {
		match ttl_override {
			Some(ttl) if !ttl.is_positive() => None,
			Some(ttl) => Some(ttl),
			None => Some(self.policy.sliding_ttl),
		}
	}

	fn store(&self, key: &str, value: T, sliding_ttl: Duration) -> Vec<T> {
		let now = OffsetDateTime::now_utc();
		let mut inner = self.inner.lock();
		let Inner { entries, tick } = &mut *inner;
		let mut evicted = Vec::new();

		// Expired entries leave first so they do not count against the bound.
		let dead_keys = entries
			.iter()
			.filter(|(_, entry)| entry.is_expired_at(now))
			.map(|(key, _)| key.clone())
			.collect::<Vec<_>>();

		for dead in dead_keys {
			if let Some(entry) = entries.remove(&dead) {
				evicted.push(entry.value);
			}
		}

		while !entries.contains_key(key) && entries.len() >= self.policy.max_size {
			let lru = entries
				.iter()
				.min_by_key(|(_, entry)| entry.touched)
				.map(|(key, _)| key.clone());
			let Some(lru) = lru else { break };

			if let Some(entry) = entries.remove(&lru) {
				evicted.push(entry.value);
			}
		}

		*tick += 1;

		if let Some(previous) =
			entries.insert(key.to_owned(), Entry::new(value, sliding_ttl, self.policy.absolute_ttl, now, *tick))
		{
			evicted.push(previous.value);
		}

		evicted
	}

	async fn dispose_all(&self, context: &str, values: Vec<T>) {
		for value in values {
			obs::record_cache_event(self.name, CacheEvent::Evict);
			self.dispose_one(context, value).await;
		}
	}

	async fn dispose_one(&self, context: &str, value: T) {
		let Some(disposer) = &self.disposer else { return };

		if let Err(error) = disposer(value).await {
			obs::warn_disposal_failure(self.name, context, &error);
		}

		obs::record_cache_event(self.name, CacheEvent::Dispose);
	}
}
impl<T> Debug for TtlCache<T> {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TtlCache")
			.field("name", &self.name)
			.field("policy", &self.policy)
			.field("size", &self.inner.lock().entries.len())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::sync::atomic::{AtomicUsize, Ordering};
	// self
	use super::*;

	fn policy(sliding_ms: i64, max_size: usize) -> CachePolicy {
		CachePolicy {
			sliding_ttl: Duration::milliseconds(sliding_ms),
			absolute_ttl: None,
			max_size,
		}
	}

	async fn build_value(counter: &Arc<AtomicUsize>) -> Result<u64> {
		Ok(counter.fetch_add(1, Ordering::SeqCst) as u64)
	}

	#[tokio::test]
	async fn hits_skip_the_factory() {
		let cache = TtlCache::new("test", policy(60_000, 4));
		let built = Arc::new(AtomicUsize::new(0));
		let first = cache
			.get_or_create("k", None, "k", || build_value(&built))
			.await
			.expect("First construction should succeed.");
		let second = cache
			.get_or_create("k", None, "k", || build_value(&built))
			.await
			.expect("Cache hit should succeed.");

		assert_eq!(first, second);
		assert_eq!(built.load(Ordering::SeqCst), 1);
		assert_eq!(cache.stats().size, 1);
	}

	#[tokio::test]
	async fn non_positive_override_skips_the_store() {
		let cache = TtlCache::new("test", policy(60_000, 4));
		let built = Arc::new(AtomicUsize::new(0));

		cache
			.get_or_create("k", Some(Duration::ZERO), "k", || build_value(&built))
			.await
			.expect("Uncacheable construction should still succeed.");

		assert_eq!(cache.stats().size, 0);

		cache
			.get_or_create("k", Some(Duration::milliseconds(-5)), "k", || build_value(&built))
			.await
			.expect("Negative override should behave like zero.");

		assert_eq!(built.load(Ordering::SeqCst), 2);
		assert_eq!(cache.stats().size, 0);
	}

	#[tokio::test]
	async fn sliding_deadline_resets_on_access() {
		let cache = TtlCache::new("test", policy(150, 4));
		let built = Arc::new(AtomicUsize::new(0));

		cache
			.get_or_create("k", None, "k", || build_value(&built))
			.await
			.expect("Initial construction should succeed.");

		// Three touches, each inside the window; the entry outlives 2x the sliding TTL.
		for _ in 0_u8..3 {
			tokio::time::sleep(std::time::Duration::from_millis(80)).await;
			cache
				.get_or_create("k", None, "k", || build_value(&built))
				.await
				.expect("Refreshed entry should still be served.");
		}

		assert_eq!(built.load(Ordering::SeqCst), 1);

		tokio::time::sleep(std::time::Duration::from_millis(250)).await;
		cache
			.get_or_create("k", None, "k", || build_value(&built))
			.await
			.expect("Expired entry should be rebuilt.");

		assert_eq!(built.load(Ordering::SeqCst), 2);
	}

	#[tokio::test]
	async fn absolute_ttl_caps_refreshed_entries() {
		let cache = TtlCache::new(
			"test",
			CachePolicy {
				sliding_ttl: Duration::milliseconds(400),
				absolute_ttl: Some(Duration::milliseconds(150)),
				max_size: 4,
			},
		);
		let built = Arc::new(AtomicUsize::new(0));

		cache
			.get_or_create("k", None, "k", || build_value(&built))
			.await
			.expect("Initial construction should succeed.");
		tokio::time::sleep(std::time::Duration::from_millis(80)).await;
		cache
			.get_or_create("k", None, "k", || build_value(&built))
			.await
			.expect("Entry should still be inside the absolute window.");
		tokio::time::sleep(std::time::Duration::from_millis(120)).await;
		cache
			.get_or_create("k", None, "k", || build_value(&built))
			.await
			.expect("Entry past its absolute deadline should be rebuilt.");

		assert_eq!(built.load(Ordering::SeqCst), 2);
	}

	#[tokio::test]
	async fn lru_eviction_disposes_the_coldest_entry() {
		let disposed = Arc::new(parking_lot::Mutex::new(Vec::<u64>::new()));
		let sink = disposed.clone();
		let cache = TtlCache::new("test", policy(60_000, 2)).with_disposer(Arc::new(
			move |value: u64| {
				let sink = sink.clone();

				Box::pin(async move {
					sink.lock().push(value);

					Ok(())
				})
			},
		));

		for (key, value) in [("a", 1_u64), ("b", 2)] {
			cache
				.get_or_create(key, None, key, || async move { Ok(value) })
				.await
				.expect("Seeding the cache should succeed.");
		}

		// Touch `a` so `b` becomes the LRU candidate.
		cache
			.get_or_create("a", None, "a", || async { Ok(0) })
			.await
			.expect("Touching entry should succeed.");
		cache
			.get_or_create("c", None, "c", || async { Ok(3) })
			.await
			.expect("Insert past the bound should succeed.");

		assert_eq!(*disposed.lock(), vec![2]);
		assert_eq!(cache.stats().size, 2);
	}

	#[tokio::test]
	async fn delete_and_clear_dispose_exactly_once() {
		let disposed = Arc::new(AtomicUsize::new(0));
		let sink = disposed.clone();
		let cache = TtlCache::new("test", policy(60_000, 4)).with_disposer(Arc::new(
			move |_: u64| {
				let sink = sink.clone();

				Box::pin(async move {
					sink.fetch_add(1, Ordering::SeqCst);

					Ok(())
				})
			},
		));

		for key in ["a", "b", "c"] {
			cache
				.get_or_create(key, None, key, || async { Ok(7) })
				.await
				.expect("Seeding the cache should succeed.");
		}

		assert!(cache.delete("a").await);
		assert!(!cache.delete("a").await);
		assert_eq!(disposed.load(Ordering::SeqCst), 1);

		cache.clear().await;

		assert_eq!(disposed.load(Ordering::SeqCst), 3);
		assert_eq!(cache.stats().size, 0);
	}

	#[tokio::test]
	async fn disposal_failures_are_swallowed() {
		let cache = TtlCache::new("test", policy(60_000, 4))
			.with_disposer(Arc::new(|_: u64| {
				Box::pin(async { Err(DisposalError::new("socket already closed")) })
			}));

		cache
			.get_or_create("k", None, "k", || async { Ok(1) })
			.await
			.expect("Seeding the cache should succeed.");

		assert!(cache.delete("k").await, "Delete must succeed even when disposal fails.");
	}

	#[tokio::test]
	async fn coalesced_waiters_share_one_construction() {
		let cache = Arc::new(TtlCache::new("test", policy(60_000, 4)));
		let built = Arc::new(AtomicUsize::new(0));
		let gate = Arc::new(AsyncMutex::new(()));
		let held = gate.lock().await;
		let tasks = (0_u8..16)
			.map(|_| {
				let cache = cache.clone();
				let built = built.clone();
				let gate = gate.clone();

				tokio::spawn(async move {
					cache
						.get_or_create("k", None, "k", || async move {
							let _gate = gate.lock().await;

							Ok(built.fetch_add(1, Ordering::SeqCst))
						})
						.await
				})
			})
			.collect::<Vec<_>>();

		tokio::time::sleep(std::time::Duration::from_millis(50)).await;
		drop(held);

		for task in tasks {
			let value = task
				.await
				.expect("Coalesced task should not panic.")
				.expect("Coalesced construction should succeed.");

			assert_eq!(value, 0);
		}

		assert_eq!(built.load(Ordering::SeqCst), 1);
		assert_eq!(cache.stats().pending, 0);
	}

	#[tokio::test]
	async fn factory_errors_reach_every_coalesced_waiter_and_are_not_stored() {
		let cache = Arc::new(TtlCache::<u64>::new("test", policy(60_000, 4)));
		let attempts = Arc::new(AtomicUsize::new(0));
		let gate = Arc::new(AsyncMutex::new(()));
		let held = gate.lock().await;
		let tasks = (0_u8..8)
			.map(|_| {
				let cache = cache.clone();
				let attempts = attempts.clone();
				let gate = gate.clone();

				tokio::spawn(async move {
					cache
						.get_or_create("k", None, "k", || async move {
							let _gate = gate.lock().await;

							attempts.fetch_add(1, Ordering::SeqCst);

							Err(Error::Internal { message: "backend offline".into() })
						})
						.await
				})
			})
			.collect::<Vec<_>>();

		tokio::time::sleep(std::time::Duration::from_millis(50)).await;
		drop(held);

		for task in tasks {
			let outcome = task.await.expect("Coalesced task should not panic.");

			assert!(matches!(outcome, Err(Error::Internal { .. })));
		}

		assert_eq!(attempts.load(Ordering::SeqCst), 1, "One flight serves every waiter.");
		assert_eq!(cache.stats().size, 0);
		assert_eq!(cache.stats().pending, 0);

		// Errors are not cached; the next caller retries.
		cache
			.get_or_create("k", None, "k", || async { Ok(9) })
			.await
			.expect("Retry after a failed flight should succeed.");
	}

	#[tokio::test]
	async fn purge_expired_reports_evictions() {
		let cache = TtlCache::new("test", policy(50, 8));

		for key in ["a", "b"] {
			cache
				.get_or_create(key, None, key, || async { Ok(1) })
				.await
				.expect("Seeding the cache should succeed.");
		}

		tokio::time::sleep(std::time::Duration::from_millis(120)).await;

		assert_eq!(cache.purge_expired().await, 2);
		assert_eq!(cache.stats().size, 0);
	}
}
