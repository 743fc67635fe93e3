//! Shared fixtures for exercising the pool: counting factories, static credential
//! strategies, and assertion builders.
//!
//! The module backs this crate's own integration tests and is equally usable from
//! downstream test code; it pulls in no dependencies beyond the crate's own.

// std
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
// self
use crate::{
	_prelude::*,
	auth::{AuthMode, AuthRequest, UserAssertion},
	cache::DisposalFuture,
	credential::{
		ApplicationStrategy, CredentialKind, CredentialProvider, DelegatedStrategy,
		StrategyFuture,
	},
	pool::{ClientFactory, ClientFuture},
};

/// Options value used by [`CountingClientFactory`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StubOptions {
	/// Endpoint the stub client would talk to.
	pub endpoint: String,
	/// Fingerprint the factory reports for this value, when set.
	#[serde(skip)]
	pub fingerprint: Option<String>,
}
impl StubOptions {
	/// Creates options for the provided endpoint, without a fingerprint.
	pub fn new(endpoint: impl Into<String>) -> Self {
		Self { endpoint: endpoint.into(), fingerprint: None }
	}

	/// Sets the fingerprint the factory will report.
	pub fn with_fingerprint(mut self, fingerprint: impl Into<String>) -> Self {
		self.fingerprint = Some(fingerprint.into());

		self
	}
}

/// Credential value produced by the static strategies.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StubCredential {
	/// Kind the credential was created as.
	pub kind: CredentialKind,
	/// Asserted user for delegated credentials.
	pub subject: Option<String>,
}

/// Client value produced by [`CountingClientFactory`].
#[derive(Debug)]
pub struct StubClient {
	/// Construction ordinal, unique per factory instance.
	pub serial: usize,
	/// Auth mode the client was constructed under.
	pub mode: AuthMode,
	/// Primary credential materialized during construction.
	pub credential: StubCredential,
	/// Application credential additionally fetched for composite requests.
	pub application_credential: Option<StubCredential>,
	/// Endpoint from the options, when provided.
	pub endpoint: Option<String>,
}

/// Client factory that counts constructions and disposals.
///
/// Construction waits on an internal gate, so tests can hold the gate locked to
/// simulate a slow factory and release it to let a coalesced flight finish.
#[derive(Default)]
pub struct CountingClientFactory {
	built: AtomicUsize,
	disposed: AtomicUsize,
	fail_next: AtomicBool,
	gate: Arc<AsyncMutex<()>>,
}
impl CountingClientFactory {
	/// Number of successful constructions so far.
	pub fn built(&self) -> usize {
		self.built.load(Ordering::SeqCst)
	}

	/// Number of disposed clients so far.
	pub fn disposed(&self) -> usize {
		self.disposed.load(Ordering::SeqCst)
	}

	/// Makes the next construction fail with a factory error.
	pub fn fail_next(&self) {
		self.fail_next.store(true, Ordering::SeqCst);
	}

	/// Gate awaited at the start of every construction; lock it to stall the factory.
	pub fn gate(&self) -> Arc<AsyncMutex<()>> {
		self.gate.clone()
	}
}
impl ClientFactory for CountingClientFactory {
	type Client = StubClient;
	type Credential = StubCredential;
	type Options = StubOptions;

	fn create_client<'a>(
		&'a self,
		credentials: CredentialProvider<Self::Credential>,
		options: Option<&'a Self::Options>,
	) -> ClientFuture<'a, Self::Client> {
		Box::pin(async move {
			drop(self.gate.lock().await);

			if self.fail_next.swap(false, Ordering::SeqCst) {
				return Err("factory offline".into());
			}

			let mode = credentials.mode();
			let kind = match mode {
				AuthMode::Application => CredentialKind::Application,
				AuthMode::Delegated | AuthMode::Composite => CredentialKind::Delegated,
			};
			let credential = credentials.credential(kind).await?;
			let application_credential = match mode {
				AuthMode::Composite =>
					Some(credentials.credential(CredentialKind::Application).await?),
				_ => None,
			};

			Ok(StubClient {
				serial: self.built.fetch_add(1, Ordering::SeqCst),
				mode,
				credential,
				application_credential,
				endpoint: options.map(|options| options.endpoint.clone()),
			})
		})
	}

	fn fingerprint(&self, options: &Self::Options) -> Option<String> {
		options.fingerprint.clone()
	}

	fn dispose_client(&self, client: Arc<Self::Client>) -> DisposalFuture<'static> {
		self.disposed.fetch_add(1, Ordering::SeqCst);

		Box::pin(async move {
			drop(client);

			Ok(())
		})
	}
}

/// Application strategy returning a fresh [`StubCredential`] and counting invocations.
#[derive(Debug, Default)]
pub struct StaticApplicationStrategy {
	created: AtomicUsize,
}
impl StaticApplicationStrategy {
	/// Number of credentials created so far.
	pub fn created(&self) -> usize {
		self.created.load(Ordering::SeqCst)
	}
}
impl ApplicationStrategy<StubCredential> for StaticApplicationStrategy {
	fn create(&self) -> StrategyFuture<'_, StubCredential> {
		self.created.fetch_add(1, Ordering::SeqCst);

		Box::pin(async { Ok(StubCredential { kind: CredentialKind::Application, subject: None }) })
	}
}

/// Delegated strategy echoing the asserted user and counting invocations.
#[derive(Debug, Default)]
pub struct StaticDelegatedStrategy {
	created: AtomicUsize,
}
impl StaticDelegatedStrategy {
	/// Number of credentials created so far.
	pub fn created(&self) -> usize {
		self.created.load(Ordering::SeqCst)
	}
}
impl DelegatedStrategy<StubCredential> for StaticDelegatedStrategy {
	fn create<'a>(&'a self, assertion: &'a UserAssertion) -> StrategyFuture<'a, StubCredential> {
		self.created.fetch_add(1, Ordering::SeqCst);

		let subject = assertion.user_object_id.clone();

		Box::pin(async move {
			Ok(StubCredential { kind: CredentialKind::Delegated, subject: Some(subject) })
		})
	}
}

/// Application strategy that always fails; pairs with retry and error-propagation tests.
#[derive(Debug, Default)]
pub struct FailingApplicationStrategy;
impl ApplicationStrategy<StubCredential> for FailingApplicationStrategy {
	fn create(&self) -> StrategyFuture<'_, StubCredential> {
		Box::pin(async { Err("identity provider unreachable".into()) })
	}
}

/// Builds an assertion for the tenant/user pair expiring `ttl` from now.
pub fn assertion(tenant: &str, user: &str, ttl: Duration) -> UserAssertion {
	UserAssertion::new("test-bearer", tenant, user, OffsetDateTime::now_utc() + ttl)
}

/// Builds a delegated auth request expiring `ttl` from now.
pub fn delegated(tenant: &str, user: &str, ttl: Duration) -> AuthRequest {
	AuthRequest::Delegated(assertion(tenant, user, ttl))
}

/// Builds a composite auth request expiring `ttl` from now.
pub fn composite(tenant: &str, user: &str, ttl: Duration) -> AuthRequest {
	AuthRequest::Composite(assertion(tenant, user, ttl))
}
