//! Deterministic cache-key construction from auth contexts and client options.

// std
use std::fmt::Write as _;
// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use serde_json::Value;
use sha2::{Digest, Sha256};
// self
use crate::{_prelude::*, auth::AuthContext};

/// Default prefix prepended to every raw cache key.
pub const DEFAULT_KEY_PREFIX: &str = "client";

/// Raw keys are truncated to this many characters before they reach log output.
const RAW_KEY_LOG_LIMIT: usize = 50;

/// Derived cache key pairing the stored digest with a log-safe view of the raw form.
///
/// The raw `::`-separated key never reaches the cache; only its fixed-width digest is
/// stored, and the raw form is retained solely for log messages (truncated).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheKey {
	stable: String,
	log_view: String,
}
impl CacheKey {
	fn new(raw: String) -> Self {
		Self { stable: digest128(&raw), log_view: truncate_for_logs(&raw) }
	}

	/// Fixed-width stored key (URL-safe base64 of a 128-bit digest).
	pub fn stable(&self) -> &str {
		&self.stable
	}

	/// Truncated raw key, safe to embed in log messages.
	pub fn log_view(&self) -> &str {
		&self.log_view
	}
}
impl Display for CacheKey {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.stable)
	}
}

/// Builds deterministic, stable keys for client and credential cache entries.
#[derive(Clone, Debug)]
pub struct KeyBuilder {
	prefix: String,
}
impl KeyBuilder {
	/// Creates a builder using the provided raw-key prefix.
	pub fn new(prefix: impl Into<String>) -> Self {
		Self { prefix: prefix.into() }
	}

	/// Derives the client-cache key for a validated context.
	///
	/// Ordering of the raw segments: prefix, mode literal, tenant + user for token-bound
	/// modes, then either the factory fingerprint (when non-empty) or the canonical hash
	/// of the options value.
	pub fn client_key<O>(
		&self,
		context: &AuthContext,
		fingerprint: Option<String>,
		options: Option<&O>,
	) -> Result<CacheKey>
	where
		O: Serialize,
	{
		let mut raw = String::with_capacity(96);

		raw.push_str(&self.prefix);
		raw.push_str("::");
		raw.push_str(context.mode().as_str());

		if let Some(identity) = context.identity() {
			let _ = write!(raw, "::tenant:{}::user:{}", identity.tenant, identity.user);
		}

		match fingerprint.filter(|value| !value.is_empty()) {
			Some(value) => {
				raw.push_str("::fingerprint:");
				raw.push_str(&value);
			},
			None =>
				if let Some(options) = options {
					raw.push_str("::options:");
					raw.push_str(&canonical_hash(options)?);
				},
		}

		Ok(CacheKey::new(raw))
	}

	/// Key under which the shared application credential is cached.
	pub fn application_credential_key(&self) -> String {
		format!("{}::application", self.prefix)
	}
}
impl Default for KeyBuilder {
	fn default() -> Self {
		Self::new(DEFAULT_KEY_PREFIX)
	}
}

/// Hashes an options value canonically: deeply equal values (modulo object key order)
/// produce identical hashes.
pub fn canonical_hash<O>(options: &O) -> Result<String>
where
	O: Serialize,
{
	let value = serde_json::to_value(options)
		.map_err(|e| Error::Internal { message: format!("options are not serializable: {e}") })?;
	let mut canonical = String::new();

	write_canonical(&value, &mut canonical);

	Ok(digest128(&canonical))
}

fn write_canonical(value: &Value, out: &mut String) {
	match value {
		Value::Array(items) => {
			out.push('[');

			for (idx, item) in items.iter().enumerate() {
				if idx > 0 {
					out.push(',');
				}

				write_canonical(item, out);
			}

			out.push(']');
		},
		Value::Object(map) => {
			let mut keys = map.keys().collect::<Vec<_>>();

			keys.sort();

			out.push('{');

			for (idx, key) in keys.into_iter().enumerate() {
				if idx > 0 {
					out.push(',');
				}

				push_json_string(key, out);
				out.push(':');

				if let Some(item) = map.get(key) {
					write_canonical(item, out);
				}
			}

			out.push('}');
		},
		scalar => {
			// Scalar `Display` already emits canonical JSON, escaping included.
			let _ = write!(out, "{scalar}");
		},
	}
}

fn push_json_string(value: &str, out: &mut String) {
	out.push('"');

	for c in value.chars() {
		match c {
			'"' => out.push_str("\\\""),
			'\\' => out.push_str("\\\\"),
			'\n' => out.push_str("\\n"),
			'\r' => out.push_str("\\r"),
			'\t' => out.push_str("\\t"),
			c if (c as u32) < 0x20 => {
				let _ = write!(out, "\\u{:04x}", c as u32);
			},
			c => out.push(c),
		}
	}

	out.push('"');
}

fn digest128(input: &str) -> String {
	let mut hasher = Sha256::new();

	hasher.update(input.as_bytes());

	let digest = hasher.finalize();

	URL_SAFE_NO_PAD.encode(&digest[..16])
}

fn truncate_for_logs(raw: &str) -> String {
	if raw.chars().count() <= RAW_KEY_LOG_LIMIT {
		return raw.to_owned();
	}

	let mut out = raw.chars().take(RAW_KEY_LOG_LIMIT).collect::<String>();

	out.push_str("...");

	out
}
