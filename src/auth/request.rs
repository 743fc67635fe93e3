//! Auth-request variants and the adapter that validates them into contexts.

// self
use crate::{
	_prelude::*,
	auth::{TenantId, UserAssertion, UserId},
};

/// Authentication modes supported by the pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AuthMode {
	/// The process acts as itself; no user identity involved.
	Application,
	/// The process acts on behalf of one user assertion.
	Delegated,
	/// Delegated shape, but the client factory may request either credential kind.
	Composite,
}
impl AuthMode {
	/// Returns a stable label suitable for keys, spans, or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			AuthMode::Application => "application",
			AuthMode::Delegated => "delegated",
			AuthMode::Composite => "composite",
		}
	}

	/// Returns `true` for modes whose cache lifetime is bound to a user assertion.
	pub const fn is_token_bound(self) -> bool {
		!matches!(self, AuthMode::Application)
	}
}
impl Display for AuthMode {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Incoming authentication request, tagged by mode.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AuthRequest {
	/// Application-only request; carries no payload.
	Application,
	/// Request bound to a single user assertion.
	Delegated(UserAssertion),
	/// Same shape as [`AuthRequest::Delegated`], but the factory may ask the credential
	/// provider for an application credential in addition to the delegated one.
	Composite(UserAssertion),
}
impl AuthRequest {
	/// Mode tag of the request.
	pub const fn mode(&self) -> AuthMode {
		match self {
			AuthRequest::Application => AuthMode::Application,
			AuthRequest::Delegated(_) => AuthMode::Delegated,
			AuthRequest::Composite(_) => AuthMode::Composite,
		}
	}

	/// Borrows the user assertion for token-bound modes.
	pub const fn assertion(&self) -> Option<&UserAssertion> {
		match self {
			AuthRequest::Application => None,
			AuthRequest::Delegated(assertion) | AuthRequest::Composite(assertion) =>
				Some(assertion),
		}
	}

	/// Validates the request at the provided instant.
	///
	/// This adapter is the only place a raw assertion is accepted: token-bound modes
	/// require non-empty tenant and user claims plus a strictly-future expiry, and every
	/// downstream component consumes the resulting [`AuthContext`] instead of the request.
	pub fn validate_at(&self, now: OffsetDateTime) -> Result<AuthContext> {
		let assertion = match self {
			AuthRequest::Application =>
				return Ok(AuthContext { mode: AuthMode::Application, identity: None }),
			AuthRequest::Delegated(assertion) | AuthRequest::Composite(assertion) => assertion,
		};
		let tenant = TenantId::new(&assertion.tenant_id).map_err(|_| Error::MissingTenant)?;
		let user = UserId::new(&assertion.user_object_id).map_err(|_| Error::MissingUser)?;

		if assertion.is_expired_at(now) {
			return Err(Error::TokenExpired { expired_at: assertion.expires_at });
		}

		Ok(AuthContext {
			mode: self.mode(),
			identity: Some(DelegatedIdentity {
				tenant,
				user,
				expires_at: assertion.expires_at,
				assertion: assertion.clone(),
			}),
		})
	}

	/// Validates the request against the current UTC instant.
	pub fn validate(&self) -> Result<AuthContext> {
		self.validate_at(OffsetDateTime::now_utc())
	}
}

/// Validated user identity carried by token-bound auth contexts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DelegatedIdentity {
	/// Tenant the assertion was issued under.
	pub tenant: TenantId,
	/// User object the assertion delegates.
	pub user: UserId,
	/// Absolute expiry instant of the backing assertion.
	pub expires_at: OffsetDateTime,
	/// The validated assertion itself, retained for delegated credential construction.
	pub assertion: UserAssertion,
}

/// Validated, normalized form of an [`AuthRequest`], safe to hand downstream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthContext {
	mode: AuthMode,
	identity: Option<DelegatedIdentity>,
}
impl AuthContext {
	/// Mode tag the context was validated under.
	pub const fn mode(&self) -> AuthMode {
		self.mode
	}

	/// Borrows the delegated identity for token-bound modes.
	pub const fn identity(&self) -> Option<&DelegatedIdentity> {
		self.identity.as_ref()
	}

	/// Returns `true` when the context's cache lifetime is bound to an assertion.
	pub const fn is_token_bound(&self) -> bool {
		self.mode.is_token_bound()
	}
}
