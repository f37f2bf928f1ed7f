//! Principal model reported by the identity provider.

// self
use crate::{_prelude::*, auth::PrincipalId};

/// Currently authenticated end user as reported by the identity provider.
///
/// Principals are owned by the session observer and replaced wholesale on every provider
/// notification; individual fields are never mutated in place.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Principal {
	/// Stable identifier assigned by the identity provider.
	pub id: PrincipalId,
	/// Email address the principal signed in with.
	pub email: String,
	/// Human-readable display name, when the provider supplies one.
	pub display_name: Option<String>,
	/// Avatar URL, when the provider supplies one.
	pub avatar_url: Option<Url>,
}
impl Principal {
	/// Creates a principal with the mandatory identifier + email pair.
	pub fn new(id: PrincipalId, email: impl Into<String>) -> Self {
		Self { id, email: email.into(), display_name: None, avatar_url: None }
	}

	/// Sets the display name.
	pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
		self.display_name = Some(name.into());

		self
	}

	/// Sets the avatar URL.
	pub fn with_avatar_url(mut self, url: Url) -> Self {
		self.avatar_url = Some(url);

		self
	}
}

/// Profile fields a signed-in principal may rewrite through the identity provider.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
	/// Replacement display name, when present.
	pub display_name: Option<String>,
	/// Replacement avatar URL, when present.
	pub avatar_url: Option<Url>,
}
impl ProfileUpdate {
	/// Sets the replacement display name.
	pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
		self.display_name = Some(name.into());

		self
	}

	/// Sets the replacement avatar URL.
	pub fn with_avatar_url(mut self, url: Url) -> Self {
		self.avatar_url = Some(url);

		self
	}

	/// Applies the update to a principal, replacing it wholesale.
	pub fn apply(&self, principal: &Principal) -> Principal {
		let mut updated = principal.clone();

		if let Some(name) = self.display_name.as_ref() {
			updated.display_name = Some(name.clone());
		}
		if let Some(url) = self.avatar_url.as_ref() {
			updated.avatar_url = Some(url.clone());
		}

		updated
	}
}
