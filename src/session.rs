//! Session state: the single shared mutable resource of the broker.
//!
//! [`SessionHandle`] is an explicit, injectable handle with exactly one writer per field
//! (the observer writes principal + credential, the resolver writes role) and any number
//! of readers. Correctness does not rely on mutual exclusion across await points: every
//! provider notification is tagged with a monotonically increasing sequence number at
//! receipt, and asynchronous completions carrying a stale sequence number are discarded.
//! The published state therefore always reflects the *last received* notification,
//! regardless of the completion order of in-flight work.

pub mod observer;

pub use observer::{LoginRegistrar, RegistrarFuture, SessionObserver};

// self
use crate::{
	_prelude::*,
	auth::{Credential, Principal, RoleState},
};

/// Point-in-time view of the session composite.
///
/// Exactly one of present/absent holds for principal and credential; a credential never
/// appears without its principal, and an absent credential forces
/// [`RoleState::Unresolved`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionSnapshot {
	/// Currently authenticated principal, if any.
	pub principal: Option<Principal>,
	/// Bearer credential minted for the current principal, if any.
	pub credential: Option<Credential>,
	/// Role-resolution state for the current credential.
	pub role: RoleState,
	/// True only between observer start and the first processed notification.
	pub loading: bool,
}
impl SessionSnapshot {
	fn initial() -> Self {
		Self { principal: None, credential: None, role: RoleState::Unresolved, loading: true }
	}

	/// Returns true when a principal is signed in.
	pub fn is_authenticated(&self) -> bool {
		self.principal.is_some()
	}
}

struct SessionInner {
	seq_issued: u64,
	snapshot: SessionSnapshot,
}

/// Shared, injectable handle over the session composite.
#[derive(Clone)]
pub struct SessionHandle(Arc<RwLock<SessionInner>>);
impl SessionHandle {
	/// Creates a fresh handle in the loading state with nobody signed in.
	pub fn new() -> Self {
		Self(Arc::new(RwLock::new(SessionInner {
			seq_issued: 0,
			snapshot: SessionSnapshot::initial(),
		})))
	}

	/// Returns a point-in-time copy of the session composite.
	pub fn snapshot(&self) -> SessionSnapshot {
		self.0.read().snapshot.clone()
	}

	/// Returns the current principal, if any.
	pub fn principal(&self) -> Option<Principal> {
		self.0.read().snapshot.principal.clone()
	}

	/// Returns the live credential, if any.
	///
	/// Read this at dispatch time, never at request-construction time; the observer may
	/// have cleared or replaced the credential in between.
	pub fn credential(&self) -> Option<Credential> {
		self.0.read().snapshot.credential.clone()
	}

	/// Returns the role-resolution state for the current credential.
	pub fn role(&self) -> RoleState {
		self.0.read().snapshot.role
	}

	/// Returns true while the first notification is still being processed.
	pub fn is_loading(&self) -> bool {
		self.0.read().snapshot.loading
	}

	/// Issues the sequence number for a freshly received notification.
	///
	/// Must be called synchronously at receipt so numbering reflects arrival order.
	pub(crate) fn begin_change(&self) -> u64 {
		let mut inner = self.0.write();

		inner.seq_issued += 1;
		inner.seq_issued
	}

	/// Invalidates all in-flight completions without touching the published state.
	pub(crate) fn invalidate_inflight(&self) {
		self.0.write().seq_issued += 1;
	}

	/// Publishes the signed-out state for notification `seq`.
	///
	/// Returns false when a newer notification has superseded `seq`.
	pub(crate) fn clear(&self, seq: u64) -> bool {
		let mut inner = self.0.write();

		if seq < inner.seq_issued {
			return false;
		}

		inner.snapshot = SessionSnapshot {
			principal: None,
			credential: None,
			role: RoleState::Unresolved,
			loading: false,
		};

		true
	}

	/// Publishes a signed-in principal + freshly minted credential for notification `seq`.
	///
	/// The role resets to [`RoleState::Unresolved`] on every publish: a replaced
	/// credential always requires a fresh role resolution, even for the same principal.
	/// Returns false when a newer notification has superseded `seq`.
	pub(crate) fn publish(&self, seq: u64, principal: Principal, credential: Credential) -> bool {
		let mut inner = self.0.write();

		if seq < inner.seq_issued {
			return false;
		}

		inner.snapshot = SessionSnapshot {
			principal: Some(principal),
			credential: Some(credential),
			role: RoleState::Unresolved,
			loading: false,
		};

		true
	}

	/// Returns the live credential together with the sequence number it was published
	/// under, for stale-completion checks by the resolver.
	pub(crate) fn credential_view(&self) -> (Option<Credential>, u64) {
		let inner = self.0.read();

		(inner.snapshot.credential.clone(), inner.seq_issued)
	}

	/// Writes the role state for the credential published under `seq`.
	///
	/// Rejected when `seq` is stale or the credential is gone, which keeps the invariant
	/// that an absent credential implies [`RoleState::Unresolved`]. Returns whether the
	/// write was applied.
	pub(crate) fn set_role(&self, seq: u64, state: RoleState) -> bool {
		let mut inner = self.0.write();

		if seq < inner.seq_issued || inner.snapshot.credential.is_none() {
			return false;
		}

		inner.snapshot.role = state;

		true
	}
}
impl Default for SessionHandle {
	fn default() -> Self {
		Self::new()
	}
}
impl Debug for SessionHandle {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		let inner = self.0.read();

		f.debug_struct("SessionHandle")
			.field("seq_issued", &inner.seq_issued)
			.field("snapshot", &inner.snapshot)
			.finish()
	}
}
