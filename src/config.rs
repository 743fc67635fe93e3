//! Pool configuration model, defaults, and construction-time validation.

// self
use crate::{_prelude::*, error::ConfigError, key::DEFAULT_KEY_PREFIX};

/// Top-level pool configuration, resolved once at pool construction.
///
/// Later changes to the source value are unobservable; the pool copies what it needs.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PoolConfig {
	/// Cache sizing and TTL settings.
	pub cache: CacheSettings,
	/// Identity settings consumed by external credential strategies.
	pub auth: AuthSettings,
}
impl PoolConfig {
	/// Rejects malformed or contradictory settings.
	pub fn validate(&self) -> Result<(), ConfigError> {
		self.cache.validate()?;
		self.auth.validate()?;

		Ok(())
	}
}

/// Cache section of the pool configuration. Durations are in milliseconds.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CacheSettings {
	/// Prefix prepended to every raw cache key.
	pub key_prefix: String,
	/// Default sliding TTL for cached clients.
	pub client_cache_sliding_ttl: u64,
	/// Bound on concurrently cached clients.
	pub client_cache_max_size: usize,
	/// Safety buffer subtracted from a token's remaining lifetime.
	pub client_cache_buffer_ms: u64,
	/// Sliding TTL for cached application credentials.
	pub credential_cache_sliding_ttl: u64,
	/// Bound on cached application credentials.
	pub credential_cache_max_size: usize,
	/// Hard expiry for application credentials, independent of access.
	pub credential_cache_absolute_ttl: u64,
}
impl CacheSettings {
	/// Default client sliding TTL (5 minutes).
	pub const DEFAULT_CLIENT_SLIDING_TTL_MS: u64 = 300_000;
	/// Default bound on cached clients.
	pub const DEFAULT_CLIENT_MAX_SIZE: usize = 100;
	/// Default token-lifetime safety buffer (5 seconds).
	pub const DEFAULT_CLIENT_BUFFER_MS: u64 = 5_000;
	/// Default application-credential sliding TTL (5 minutes).
	pub const DEFAULT_CREDENTIAL_SLIDING_TTL_MS: u64 = 300_000;
	/// Default bound on cached application credentials.
	pub const DEFAULT_CREDENTIAL_MAX_SIZE: usize = 10;
	/// Default application-credential hard expiry (1 hour).
	pub const DEFAULT_CREDENTIAL_ABSOLUTE_TTL_MS: u64 = 3_600_000;

	/// Client sliding TTL as a duration.
	pub fn client_sliding_ttl(&self) -> Duration {
		millis(self.client_cache_sliding_ttl)
	}

	/// Token-lifetime buffer as a duration.
	pub fn client_buffer(&self) -> Duration {
		millis(self.client_cache_buffer_ms)
	}

	/// Application-credential sliding TTL as a duration.
	pub fn credential_sliding_ttl(&self) -> Duration {
		millis(self.credential_cache_sliding_ttl)
	}

	/// Application-credential hard expiry as a duration.
	pub fn credential_absolute_ttl(&self) -> Duration {
		millis(self.credential_cache_absolute_ttl)
	}

	fn validate(&self) -> Result<(), ConfigError> {
		if self.key_prefix.is_empty() {
			return Err(ConfigError::EmptyField { key: "keyPrefix" });
		}
		if self.client_cache_sliding_ttl == 0 {
			return Err(ConfigError::NonPositiveTtl { key: "clientCacheSlidingTtl" });
		}
		if self.credential_cache_sliding_ttl == 0 {
			return Err(ConfigError::NonPositiveTtl { key: "credentialCacheSlidingTtl" });
		}
		if self.credential_cache_absolute_ttl == 0 {
			return Err(ConfigError::NonPositiveTtl { key: "credentialCacheAbsoluteTtl" });
		}
		if self.client_cache_max_size == 0 {
			return Err(ConfigError::ZeroCacheSize { key: "clientCacheMaxSize" });
		}
		if self.credential_cache_max_size == 0 {
			return Err(ConfigError::ZeroCacheSize { key: "credentialCacheMaxSize" });
		}

		Ok(())
	}
}
impl Default for CacheSettings {
	fn default() -> Self {
		Self {
			key_prefix: DEFAULT_KEY_PREFIX.into(),
			client_cache_sliding_ttl: Self::DEFAULT_CLIENT_SLIDING_TTL_MS,
			client_cache_max_size: Self::DEFAULT_CLIENT_MAX_SIZE,
			client_cache_buffer_ms: Self::DEFAULT_CLIENT_BUFFER_MS,
			credential_cache_sliding_ttl: Self::DEFAULT_CREDENTIAL_SLIDING_TTL_MS,
			credential_cache_max_size: Self::DEFAULT_CREDENTIAL_MAX_SIZE,
			credential_cache_absolute_ttl: Self::DEFAULT_CREDENTIAL_ABSOLUTE_TTL_MS,
		}
	}
}

/// Auth section of the pool configuration, consumed by external credential strategies.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AuthSettings {
	/// Which external application-credential strategy hosts should wire in.
	pub application_strategy: StrategyKind,
	/// Tenant (directory) the application identity belongs to, when required.
	pub tenant_id: Option<String>,
	/// Client identifier of the application registration, when required.
	pub client_id: Option<String>,
}
impl AuthSettings {
	fn validate(&self) -> Result<(), ConfigError> {
		if matches!(&self.tenant_id, Some(value) if value.is_empty()) {
			return Err(ConfigError::EmptyField { key: "tenantId" });
		}
		if matches!(&self.client_id, Some(value) if value.is_empty()) {
			return Err(ConfigError::EmptyField { key: "clientId" });
		}

		Ok(())
	}
}

/// External application-credential strategy selections.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyKind {
	/// Developer CLI credential.
	Cli,
	/// Platform managed identity.
	ManagedIdentity,
	/// Try a chain of strategies in order.
	#[default]
	Chain,
}
impl StrategyKind {
	/// Returns the configuration literal for this strategy.
	pub const fn as_str(self) -> &'static str {
		match self {
			StrategyKind::Cli => "cli",
			StrategyKind::ManagedIdentity => "managed-identity",
			StrategyKind::Chain => "chain",
		}
	}
}
impl Display for StrategyKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
impl FromStr for StrategyKind {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"cli" => Ok(Self::Cli),
			"managed-identity" => Ok(Self::ManagedIdentity),
			"chain" => Ok(Self::Chain),
			_ => Err(ConfigError::UnknownStrategy { value: s.to_owned() }),
		}
	}
}

fn millis(value: u64) -> Duration {
	Duration::milliseconds(i64::try_from(value).unwrap_or(i64::MAX))
}
