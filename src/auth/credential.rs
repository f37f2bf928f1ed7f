//! Short-lived bearer credentials bound to a principal.

// self
use crate::{_prelude::*, auth::PrincipalId};

/// Redacted bearer secret wrapper keeping sensitive material out of logs.
///
/// Deliberately not serializable: bearer secrets live in memory only.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerSecret(String);
impl BearerSecret {
	/// Wraps a new secret string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner token value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}
}
impl AsRef<str> for BearerSecret {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl Debug for BearerSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("BearerSecret").field(&"<redacted>").finish()
	}
}
impl Display for BearerSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

/// Short-lived bearer credential minted by the identity provider for one principal.
///
/// Held in memory only; never persisted. The session observer replaces or clears the
/// credential whenever the provider reports a session change, so a credential must never
/// outlive the principal it was minted for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Credential {
	/// Principal the credential was minted for.
	pub principal: PrincipalId,
	/// Opaque bearer secret attached to authenticated requests.
	pub bearer: BearerSecret,
	/// Instant the provider minted the credential.
	pub minted_at: OffsetDateTime,
}
impl Credential {
	/// Creates a credential minted now for the provided principal.
	pub fn new(principal: PrincipalId, bearer: impl Into<String>) -> Self {
		Self { principal, bearer: BearerSecret::new(bearer), minted_at: OffsetDateTime::now_utc() }
	}

	/// Overrides the mint instant.
	pub fn with_minted_at(mut self, instant: OffsetDateTime) -> Self {
		self.minted_at = instant;

		self
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn secret_formatters_redact() {
		let secret = BearerSecret::new("super-secret");

		assert_eq!(format!("{secret:?}"), "BearerSecret(\"<redacted>\")");
		assert_eq!(format!("{secret}"), "<redacted>");
	}

	#[test]
	fn credential_debug_redacts_bearer() {
		let credential = Credential::new(
			PrincipalId::new("u-1").expect("Principal fixture should be valid."),
			"token-1",
		);
		let rendered = format!("{credential:?}");

		assert!(rendered.contains("<redacted>"));
		assert!(!rendered.contains("token-1"));
	}
}
