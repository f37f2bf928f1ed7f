//! Authorization role levels and the role-resolution state machine.

// self
use crate::_prelude::*;

/// Authorization level resolved from the backend for the current principal.
///
/// Ordering follows privilege: `User < Moderator < Admin`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
	/// Baseline student-level access.
	User,
	/// Review and scholarship moderation access.
	Moderator,
	/// Full administrative access.
	Admin,
}
impl Role {
	/// Parses a backend role label.
	///
	/// Unrecognized labels yield `None` (absence of privilege), never a default grant.
	pub fn parse(label: &str) -> Option<Self> {
		match label {
			"user" => Some(Self::User),
			"moderator" => Some(Self::Moderator),
			"admin" => Some(Self::Admin),
			_ => None,
		}
	}

	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::User => "user",
			Self::Moderator => "moderator",
			Self::Admin => "admin",
		}
	}

	/// Returns true when this role grants at least the required level.
	pub fn satisfies(self, required: Role) -> bool {
		self >= required
	}
}
impl Display for Role {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Role-resolution lifecycle for the current credential.
///
/// Any credential clear or replacement resets the machine to [`RoleState::Unresolved`];
/// a resolved role must never survive into a different principal's session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoleState {
	/// No resolution attempted yet, or credential absent.
	#[default]
	Unresolved,
	/// A role fetch is in flight for the current credential.
	Resolving,
	/// The backend reported a role for the current credential.
	Resolved(Role),
	/// The fetch failed; guards fall back to least privilege.
	Failed,
}
impl RoleState {
	/// Returns the role guards should act on, if any.
	///
	/// [`RoleState::Failed`] falls back to [`Role::User`] so a broken backend never blocks
	/// the UI indefinitely nor grants elevated access. Unresolved/Resolving yield `None`;
	/// guards must keep showing a loading indicator for both.
	pub fn effective_role(&self) -> Option<Role> {
		match self {
			Self::Resolved(role) => Some(*role),
			Self::Failed => Some(Role::User),
			Self::Unresolved | Self::Resolving => None,
		}
	}

	/// Returns true while a resolution outcome is still pending.
	pub fn is_pending(&self) -> bool {
		matches!(self, Self::Unresolved | Self::Resolving)
	}
}
impl Display for RoleState {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			Self::Unresolved => f.write_str("unresolved"),
			Self::Resolving => f.write_str("resolving"),
			Self::Resolved(role) => write!(f, "resolved({role})"),
			Self::Failed => f.write_str("failed"),
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn parse_accepts_known_labels_only() {
		assert_eq!(Role::parse("user"), Some(Role::User));
		assert_eq!(Role::parse("moderator"), Some(Role::Moderator));
		assert_eq!(Role::parse("admin"), Some(Role::Admin));
		assert_eq!(Role::parse("owner"), None);
		assert_eq!(Role::parse("Admin"), None, "Labels are case-sensitive.");
		assert_eq!(Role::parse(""), None);
	}

	#[test]
	fn privilege_ordering_drives_satisfies() {
		assert!(Role::Admin.satisfies(Role::Moderator));
		assert!(Role::Moderator.satisfies(Role::User));
		assert!(!Role::User.satisfies(Role::Moderator));
		assert!(Role::User.satisfies(Role::User));
	}

	#[test]
	fn failed_state_falls_back_to_least_privilege() {
		assert_eq!(RoleState::Failed.effective_role(), Some(Role::User));
		assert_eq!(RoleState::Resolved(Role::Admin).effective_role(), Some(Role::Admin));
		assert_eq!(RoleState::Unresolved.effective_role(), None);
		assert_eq!(RoleState::Resolving.effective_role(), None);
	}

	#[test]
	fn pending_states_cover_unresolved_and_resolving() {
		assert!(RoleState::Unresolved.is_pending());
		assert!(RoleState::Resolving.is_pending());
		assert!(!RoleState::Failed.is_pending());
		assert!(!RoleState::Resolved(Role::User).is_pending());
	}

	#[test]
	fn serde_uses_lowercase_labels() {
		let payload = serde_json::to_string(&Role::Moderator)
			.expect("Role should serialize to a JSON string.");

		assert_eq!(payload, "\"moderator\"");

		let round_trip: Role =
			serde_json::from_str(&payload).expect("Serialized role should deserialize.");

		assert_eq!(round_trip, Role::Moderator);
	}
}
