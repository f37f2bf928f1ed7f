//! Route-guard decisions for a navigation layer.
//!
//! Guards read one atomic session snapshot per check, so a decision can never mix a new
//! principal with a role resolved for an old one. Unresolved and Resolving are treated
//! identically: keep rendering a loading indicator until the resolution settles.

// self
use crate::{_prelude::*, auth::Role, session::{SessionHandle, SessionSnapshot}};

/// Outcome of a guard check, consumed by the navigation layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RouteDecision {
	/// Render the protected view.
	Render,
	/// Defer rendering; session or role resolution is still in progress.
	Loading,
	/// Nobody is signed in; redirect to the login view.
	RedirectToLogin,
	/// Signed in, but the effective role is below the requirement.
	Forbidden,
}

/// Guard over one route's access requirement.
#[derive(Clone, Debug)]
pub struct RouteGuard {
	session: SessionHandle,
	required: Option<Role>,
}
impl RouteGuard {
	/// Guard that only requires a signed-in principal.
	pub fn authenticated(session: SessionHandle) -> Self {
		Self { session, required: None }
	}

	/// Guard that additionally requires at least the provided role.
	pub fn with_required_role(session: SessionHandle, required: Role) -> Self {
		Self { session, required: Some(required) }
	}

	/// Evaluates the guard against the live session.
	pub fn evaluate(&self) -> RouteDecision {
		decide(&self.session.snapshot(), self.required)
	}
}

/// Pure decision function over one session snapshot.
pub fn decide(snapshot: &SessionSnapshot, required: Option<Role>) -> RouteDecision {
	if snapshot.loading {
		return RouteDecision::Loading;
	}
	if !snapshot.is_authenticated() {
		return RouteDecision::RedirectToLogin;
	}

	let Some(required) = required else {
		return RouteDecision::Render;
	};

	match snapshot.role.effective_role() {
		None => RouteDecision::Loading,
		Some(role) if role.satisfies(required) => RouteDecision::Render,
		Some(_) => RouteDecision::Forbidden,
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::auth::{Credential, Principal, PrincipalId, RoleState};

	fn snapshot(role: RoleState) -> SessionSnapshot {
		let id = PrincipalId::new("u-1").expect("Principal fixture should be valid.");

		SessionSnapshot {
			principal: Some(Principal::new(id.clone(), "student@example.com")),
			credential: Some(Credential::new(id, "T1")),
			role,
			loading: false,
		}
	}

	#[test]
	fn loading_defers_every_requirement() {
		let mut snapshot = snapshot(RoleState::Resolved(Role::Admin));

		snapshot.loading = true;

		assert_eq!(decide(&snapshot, None), RouteDecision::Loading);
		assert_eq!(decide(&snapshot, Some(Role::Admin)), RouteDecision::Loading);
	}

	#[test]
	fn absent_principal_redirects_after_loading() {
		let snapshot = SessionSnapshot {
			principal: None,
			credential: None,
			role: RoleState::Unresolved,
			loading: false,
		};

		assert_eq!(decide(&snapshot, None), RouteDecision::RedirectToLogin);
		assert_eq!(decide(&snapshot, Some(Role::User)), RouteDecision::RedirectToLogin);
	}

	#[test]
	fn pending_resolution_defers_role_gated_routes() {
		for state in [RoleState::Unresolved, RoleState::Resolving] {
			let snapshot = snapshot(state);

			assert_eq!(decide(&snapshot, Some(Role::Admin)), RouteDecision::Loading);
			assert_eq!(
				decide(&snapshot, None),
				RouteDecision::Render,
				"Authentication-only routes need no role."
			);
		}
	}

	#[test]
	fn resolved_roles_gate_by_privilege() {
		assert_eq!(
			decide(&snapshot(RoleState::Resolved(Role::Admin)), Some(Role::Admin)),
			RouteDecision::Render,
		);
		assert_eq!(
			decide(&snapshot(RoleState::Resolved(Role::Moderator)), Some(Role::Admin)),
			RouteDecision::Forbidden,
		);
		assert_eq!(
			decide(&snapshot(RoleState::Resolved(Role::Admin)), Some(Role::User)),
			RouteDecision::Render,
		);
	}

	#[test]
	fn failed_resolution_grants_least_privilege_only() {
		assert_eq!(decide(&snapshot(RoleState::Failed), Some(Role::User)), RouteDecision::Render);
		assert_eq!(
			decide(&snapshot(RoleState::Failed), Some(Role::Moderator)),
			RouteDecision::Forbidden,
		);
	}
}
