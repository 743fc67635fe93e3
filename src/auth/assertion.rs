//! User-assertion models and the validator seam that produces them.

// self
use crate::_prelude::*;

/// Redacted bearer-token wrapper keeping sensitive material out of logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssertionSecret(String);
impl AssertionSecret {
	/// Wraps a new secret string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner token value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}
}
impl AsRef<str> for AssertionSecret {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl Debug for AssertionSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("AssertionSecret").field(&"<redacted>").finish()
	}
}
impl Display for AssertionSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

/// An opaque bearer token delegating a user's identity, together with its verified claims.
///
/// The claim fields are raw strings as produced by an external token validator; the
/// auth-request adapter is the only component that promotes them into typed identifiers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAssertion {
	/// Raw bearer string; redacted in all formatting output.
	pub token: AssertionSecret,
	/// Tenant (directory) identifier claim.
	pub tenant_id: String,
	/// User object identifier claim.
	pub user_object_id: String,
	/// Absolute expiry instant of the assertion.
	pub expires_at: OffsetDateTime,
}
impl UserAssertion {
	/// Creates an assertion from an opaque token and its verified claims.
	pub fn new(
		token: impl Into<String>,
		tenant_id: impl Into<String>,
		user_object_id: impl Into<String>,
		expires_at: OffsetDateTime,
	) -> Self {
		Self {
			token: AssertionSecret::new(token),
			tenant_id: tenant_id.into(),
			user_object_id: user_object_id.into(),
			expires_at,
		}
	}

	/// Remaining validity at the provided instant; negative once expired.
	pub fn remaining_at(&self, instant: OffsetDateTime) -> Duration {
		self.expires_at - instant
	}

	/// Returns `true` if the assertion deadline has passed at the provided instant.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		instant >= self.expires_at
	}

	/// Convenience helper that checks expiry against the current UTC instant.
	pub fn is_expired(&self) -> bool {
		self.is_expired_at(OffsetDateTime::now_utc())
	}
}

/// Boxed future returned by [`AssertionValidator::validate`].
pub type AssertionFuture<'a> = Pin<Box<dyn Future<Output = Result<UserAssertion>> + 'a + Send>>;

/// Verification seam turning raw bearer strings into [`UserAssertion`] values.
///
/// Implementations own the JWKS fetch and signature pipeline; the pool itself only
/// consumes already-verified assertions, so this trait lives at the transport edge.
pub trait AssertionValidator
where
	Self: Send + Sync,
{
	/// Verifies the raw assertion and extracts its claims.
	fn validate<'a>(&'a self, raw: &'a str) -> AssertionFuture<'a>;
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn secret_formatters_redact() {
		let secret = AssertionSecret::new("header.payload.signature");

		assert_eq!(format!("{secret:?}"), "AssertionSecret(\"<redacted>\")");
		assert_eq!(format!("{secret}"), "<redacted>");
	}

	#[test]
	fn assertion_debug_redacts_token() {
		let now = OffsetDateTime::now_utc();
		let assertion = UserAssertion::new("raw-bearer", "tenant-1", "user-1", now);

		assert!(!format!("{assertion:?}").contains("raw-bearer"));
	}

	#[test]
	fn expiry_is_exclusive_of_the_deadline() {
		let now = OffsetDateTime::now_utc();
		let assertion = UserAssertion::new("t", "tenant-1", "user-1", now + Duration::seconds(30));

		assert!(!assertion.is_expired_at(now));
		assert!(assertion.is_expired_at(now + Duration::seconds(30)));
		assert_eq!(assertion.remaining_at(now), Duration::seconds(30));
	}
}
