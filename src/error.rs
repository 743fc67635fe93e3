//! Pool-level error types shared across caches, credentials, and the facade.

// self
use crate::{_prelude::*, auth::AuthMode, credential::CredentialKind};

/// Pool-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn StdError + Send + Sync>;

/// Canonical pool error exposed by public APIs.
///
/// The type is [`Clone`] so a single in-flight construction failure can be handed
/// verbatim to every coalesced waiter; wrapped causes are shared behind [`SharedCause`].
#[derive(Clone, Debug, ThisError)]
pub enum Error {
	/// Auth request carries no usable tenant identifier.
	#[error("Auth request is missing a tenant identifier.")]
	MissingTenant,
	/// Auth request carries no usable user identifier.
	#[error("Auth request is missing a user identifier.")]
	MissingUser,
	/// The user assertion's deadline has passed.
	#[error("User assertion expired at {expired_at}.")]
	TokenExpired {
		/// Instant at which the assertion stopped being valid.
		expired_at: OffsetDateTime,
	},
	/// A credential kind was requested that the auth mode does not permit.
	#[error("A {requested} credential cannot be derived from an {mode} auth request.")]
	AuthModeMismatch {
		/// Credential kind the caller asked for.
		requested: CredentialKind,
		/// Mode of the auth request that was presented.
		mode: AuthMode,
	},
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// A user-supplied client factory failed.
	#[error("Client factory failed: {source}.")]
	Factory {
		/// Shared inner cause raised by the factory.
		#[source]
		source: SharedCause,
	},
	/// An external credential strategy failed.
	#[error("Credential strategy failed: {source}.")]
	Credential {
		/// Shared inner cause raised by the strategy.
		#[source]
		source: SharedCause,
	},
	/// Unexpected invariant violation; not recoverable by retrying.
	#[error("Internal invariant violated: {message}.")]
	Internal {
		/// Human-readable description of the violated invariant.
		message: String,
	},
}
impl Error {
	/// Wraps a factory failure while preserving the inner cause.
	pub fn factory(source: impl Into<BoxError>) -> Self {
		Self::Factory { source: SharedCause::new(source) }
	}

	/// Wraps a credential strategy failure while preserving the inner cause.
	pub fn credential(source: impl Into<BoxError>) -> Self {
		Self::Credential { source: SharedCause::new(source) }
	}

	/// Stable machine-readable code for the error kind.
	pub const fn code(&self) -> &'static str {
		match self {
			Self::MissingTenant => "missing_tenant",
			Self::MissingUser => "missing_user",
			Self::TokenExpired { .. } => "token_expired",
			Self::AuthModeMismatch { .. } => "auth_mode_mismatch",
			Self::Config(_) => "configuration_invalid",
			Self::Factory { .. } => "factory_failure",
			Self::Credential { .. } => "credential_failure",
			Self::Internal { .. } => "internal",
		}
	}
}

/// Configuration and validation failures raised during pool construction.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum ConfigError {
	/// A TTL setting resolved to zero milliseconds.
	#[error("Cache setting `{key}` must be a positive duration.")]
	NonPositiveTtl {
		/// Offending configuration key.
		key: &'static str,
	},
	/// A cache size bound resolved to zero entries.
	#[error("Cache setting `{key}` must allow at least one entry.")]
	ZeroCacheSize {
		/// Offending configuration key.
		key: &'static str,
	},
	/// A recognized setting was present but empty.
	#[error("Auth setting `{key}` cannot be empty when provided.")]
	EmptyField {
		/// Offending configuration key.
		key: &'static str,
	},
	/// The application strategy literal is not recognized.
	#[error("Unknown application strategy `{value}`.")]
	UnknownStrategy {
		/// Literal that failed to parse.
		value: String,
	},
}

/// Reference-counted error cause that keeps [`Error`] cloneable.
///
/// Coalesced waiters on a single-flight construction all receive clones of the same
/// failure, so the underlying cause has to be shareable rather than owned.
#[derive(Clone)]
pub struct SharedCause(Arc<dyn StdError + Send + Sync>);
impl SharedCause {
	/// Wraps the provided cause behind a shared reference.
	pub fn new(source: impl Into<BoxError>) -> Self {
		Self(Arc::from(source.into()))
	}

	/// Borrows the wrapped cause.
	pub fn inner(&self) -> &(dyn StdError + Send + Sync) {
		self.0.as_ref()
	}
}
impl Debug for SharedCause {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		Debug::fmt(&self.0, f)
	}
}
impl Display for SharedCause {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		Display::fmt(&self.0, f)
	}
}
impl StdError for SharedCause {
	fn source(&self) -> Option<&(dyn StdError + 'static)> {
		self.0.source()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[derive(Debug, ThisError)]
	#[error("boom")]
	struct Boom;

	#[test]
	fn codes_are_stable() {
		assert_eq!(Error::MissingTenant.code(), "missing_tenant");
		assert_eq!(Error::MissingUser.code(), "missing_user");
		assert_eq!(Error::factory(Boom).code(), "factory_failure");
		assert_eq!(Error::credential(Boom).code(), "credential_failure");
		assert_eq!(
			Error::Config(ConfigError::NonPositiveTtl { key: "clientCacheSlidingTtl" }).code(),
			"configuration_invalid"
		);
	}

	#[test]
	fn cloned_errors_share_one_cause() {
		let original = Error::factory(Boom);
		let clone = original.clone();

		assert_eq!(original.to_string(), clone.to_string());
		assert!(clone.to_string().contains("boom"));
	}

	#[test]
	fn shared_cause_preserves_source_chain() {
		let error = Error::credential(Boom);
		let source =
			StdError::source(&error).expect("Wrapped strategy failure should expose its cause.");

		assert_eq!(source.to_string(), "boom");
	}
}
