//! Credential kinds, the caching credential manager, and the provider view handed to
//! client factories.

pub mod strategy;

pub use strategy::*;

// self
use crate::{
	_prelude::*,
	auth::{AuthContext, AuthMode},
	cache::{CachePolicy, CacheStats, TtlCache},
	config::CacheSettings,
	key::KeyBuilder,
	obs::{self, OpOutcome, PoolOp},
};

/// Credential kinds a client factory may request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CredentialKind {
	/// The process's own identity; reusable across users and cacheable.
	Application,
	/// A credential derived from one user assertion; never cached.
	Delegated,
}
impl CredentialKind {
	/// Returns a stable label suitable for spans or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			CredentialKind::Application => "application",
			CredentialKind::Delegated => "delegated",
		}
	}
}
impl Display for CredentialKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Caches long-lived application credentials and constructs delegated credentials on
/// demand.
///
/// Only application credentials are cached (sliding TTL plus a hard absolute expiry
/// from configuration). Delegated credentials are cheap to reconstruct from their
/// assertion and must never outlive it, so every delegated request re-invokes the
/// strategy.
pub struct CredentialManager<K> {
	application: Arc<dyn ApplicationStrategy<K>>,
	delegated: Arc<dyn DelegatedStrategy<K>>,
	cache: TtlCache<K>,
	application_key: String,
}
impl<K> CredentialManager<K>
where
	K: Clone + Send + Sync + 'static,
{
	/// Creates a manager over the provided strategies, sized per configuration.
	pub fn new(
		application: Arc<dyn ApplicationStrategy<K>>,
		delegated: Arc<dyn DelegatedStrategy<K>>,
		settings: &CacheSettings,
	) -> Self {
		let cache = TtlCache::new("credential", CachePolicy {
			sliding_ttl: settings.credential_sliding_ttl(),
			absolute_ttl: Some(settings.credential_absolute_ttl()),
			max_size: settings.credential_cache_max_size,
		});

		Self {
			application,
			delegated,
			cache,
			application_key: KeyBuilder::new(&*settings.key_prefix).application_credential_key(),
		}
	}

	/// Returns a credential of the requested kind for the validated context.
	///
	/// Cross-mode safety: a delegated credential can only be derived from a context that
	/// actually carries a user identity, and an application credential is refused for
	/// plain delegated contexts ([`AuthMode::Composite`] exists to allow both kinds).
	pub async fn credential(&self, context: &AuthContext, kind: CredentialKind) -> Result<K> {
		match kind {
			CredentialKind::Application => self.application_credential(context).await,
			CredentialKind::Delegated => self.delegated_credential(context).await,
		}
	}

	/// Counters for the application-credential cache.
	pub fn stats(&self) -> CacheStats {
		self.cache.stats()
	}

	/// Removes and disposes every cached application credential.
	pub async fn clear(&self) {
		self.cache.clear().await;
	}

	/// Evicts application credentials past their deadline.
	pub async fn purge_expired(&self) -> usize {
		self.cache.purge_expired().await
	}

	async fn application_credential(&self, context: &AuthContext) -> Result<K> {
		if context.mode() == AuthMode::Delegated {
			return Err(Error::AuthModeMismatch {
				requested: CredentialKind::Application,
				mode: context.mode(),
			});
		}

		obs::record_op_outcome(PoolOp::ApplicationCredential, OpOutcome::Attempt);

		let strategy = self.application.clone();
		let result = self
			.cache
			.get_or_create(&self.application_key, None, &self.application_key, || async move {
				strategy.create().await.map_err(Error::credential)
			})
			.await;

		match &result {
			Ok(_) => obs::record_op_outcome(PoolOp::ApplicationCredential, OpOutcome::Success),
			Err(_) => obs::record_op_outcome(PoolOp::ApplicationCredential, OpOutcome::Failure),
		}

		result
	}

	async fn delegated_credential(&self, context: &AuthContext) -> Result<K> {
		let Some(identity) = context.identity() else {
			return Err(Error::AuthModeMismatch {
				requested: CredentialKind::Delegated,
				mode: context.mode(),
			});
		};

		// Belt-and-braces: the adapter validated the assertion, but time has passed since.
		if identity.assertion.is_expired() {
			return Err(Error::TokenExpired { expired_at: identity.expires_at });
		}

		obs::record_op_outcome(PoolOp::DelegatedCredential, OpOutcome::Attempt);

		let result =
			self.delegated.create(&identity.assertion).await.map_err(Error::credential);

		match &result {
			Ok(_) => obs::record_op_outcome(PoolOp::DelegatedCredential, OpOutcome::Success),
			Err(_) => obs::record_op_outcome(PoolOp::DelegatedCredential, OpOutcome::Failure),
		}

		result
	}
}
impl<K> Debug for CredentialManager<K> {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CredentialManager").field("application_key", &self.application_key).finish()
	}
}

/// Capability handed to client factories for lazily materializing credentials.
///
/// The view binds the validated auth context in, so a factory can only ever obtain
/// credentials the presented request authorizes.
pub struct CredentialProvider<K> {
	manager: Arc<CredentialManager<K>>,
	context: AuthContext,
}
impl<K> CredentialProvider<K>
where
	K: Clone + Send + Sync + 'static,
{
	/// Binds a manager to a validated context.
	pub fn new(manager: Arc<CredentialManager<K>>, context: AuthContext) -> Self {
		Self { manager, context }
	}

	/// Materializes a credential of the requested kind.
	pub async fn credential(&self, kind: CredentialKind) -> Result<K> {
		self.manager.credential(&self.context, kind).await
	}

	/// Mode of the bound auth context.
	pub fn mode(&self) -> AuthMode {
		self.context.mode()
	}
}
impl<K> Clone for CredentialProvider<K> {
	fn clone(&self) -> Self {
		Self { manager: self.manager.clone(), context: self.context.clone() }
	}
}
impl<K> Debug for CredentialProvider<K> {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CredentialProvider").field("mode", &self.context.mode()).finish()
	}
}
