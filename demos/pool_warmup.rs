//! Demonstrates pooling clients for application and delegated requests, including warm
//! reuse, fingerprint partitioning, and explicit invalidation.

// std
use std::sync::Arc;
// crates.io
use time::Duration;
// self
use client_pool::{
	Result,
	auth::AuthRequest,
	config::PoolConfig,
	pool::ClientPool,
	testutil::{
		CountingClientFactory, StaticApplicationStrategy, StaticDelegatedStrategy, StubOptions,
		delegated,
	},
};

#[tokio::main]
async fn main() -> Result<()> {
	let pool = ClientPool::new(
		CountingClientFactory::default(),
		Arc::new(StaticApplicationStrategy::default()),
		Arc::new(StaticDelegatedStrategy::default()),
		PoolConfig::default(),
	)?;

	// Cold construction, then a warm hit on the identical entry.
	let first = pool.get_client(&AuthRequest::Application, None).await?;
	let second = pool.get_client(&AuthRequest::Application, None).await?;

	println!("warm reuse shares the instance: {}", Arc::ptr_eq(&first, &second));

	// Delegated requests are partitioned per (tenant, user).
	let alice = delegated("tenant-acme", "user-alice", Duration::hours(1));
	let bob = delegated("tenant-acme", "user-bob", Duration::hours(1));

	pool.get_client(&alice, None).await?;
	pool.get_client(&bob, None).await?;

	// Options with distinct fingerprints map to distinct cache entries.
	let east = StubOptions::new("eastus").with_fingerprint("east");
	let west = StubOptions::new("westus").with_fingerprint("west");

	pool.get_client(&alice, Some(&east)).await?;
	pool.get_client(&alice, Some(&west)).await?;

	println!("constructions: {}", pool.factory().built());
	println!("cached clients: {}", pool.stats().clients.size);

	// Explicit invalidation evicts (and disposes) exactly one entry.
	let invalidated = pool.invalidate_client(&alice, None).await?;

	println!("invalidated alice's plain client: {invalidated}");
	println!("disposed clients: {}", pool.factory().disposed());

	Ok(())
}
