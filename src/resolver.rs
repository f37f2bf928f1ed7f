//! Role resolution for the current credential.
//!
//! The resolver owns the role field of the session. Each resolution snapshots the
//! credential and its sequence number at issue time; by the time the fetch lands, a
//! sign-out or credential replacement may have superseded it, in which case the result
//! is discarded and the session stays on the newer state. Fetch failures become
//! [`RoleState::Failed`] rather than propagating, so guards can fall back to least
//! privilege instead of blocking the UI.

// self
use crate::{
	_prelude::*,
	auth::{Role, RoleState},
	backend::BackendClient,
	http::HttpTransport,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	session::SessionHandle,
};

/// Resolves the current principal's role through the backend.
pub struct RoleResolver<C>
where
	C: ?Sized + HttpTransport,
{
	client: BackendClient<C>,
	session: SessionHandle,
	singleflight: AsyncMutex<()>,
}
impl<C> RoleResolver<C>
where
	C: ?Sized + HttpTransport,
{
	/// Creates a resolver writing into the provided session.
	pub fn new(client: BackendClient<C>, session: SessionHandle) -> Self {
		Self { client, session, singleflight: AsyncMutex::new(()) }
	}

	/// Resolves the role for the credential current at issue time.
	///
	/// Returns the role state the session settled on, which is the issuing credential's
	/// outcome unless a newer notification superseded it mid-flight. Concurrent calls
	/// coalesce: a settled state for an unchanged credential is returned without a second
	/// fetch, while every credential replacement forces a fresh one.
	pub async fn resolve(&self) -> RoleState {
		const KIND: FlowKind = FlowKind::RoleResolve;

		let span = FlowSpan::new(KIND, "resolve");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		span.instrument(async move {
			let _singleflight = self.singleflight.lock().await;
			// Snapshot under the guard so a coalesced caller sees the winner's epoch.
			let (credential, seq) = self.session.credential_view();

			if credential.is_none() {
				obs::record_flow_outcome(KIND, FlowOutcome::Success);

				return RoleState::Unresolved;
			}

			let settled = self.session.role();

			if !settled.is_pending() {
				obs::record_flow_outcome(KIND, FlowOutcome::Success);

				return settled;
			}

			self.session.set_role(seq, RoleState::Resolving);

			match self.client.fetch_role().await {
				Ok(envelope) => {
					// Unknown labels fail closed to baseline access, never elevated.
					let role = Role::parse(&envelope.role).unwrap_or(Role::User);

					obs::record_flow_outcome(KIND, FlowOutcome::Success);
					self.session.set_role(seq, RoleState::Resolved(role));
				},
				Err(e) => {
					obs::record_flow_outcome(KIND, FlowOutcome::Failure);
					obs::warn_flow_failure(KIND, &e.to_string());
					self.session.set_role(seq, RoleState::Failed);
				},
			}

			self.session.role()
		})
		.await
	}

	/// Returns the session this resolver writes into.
	pub fn session(&self) -> &SessionHandle {
		&self.session
	}
}
impl<C> Debug for RoleResolver<C>
where
	C: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RoleResolver").field("session", &self.session).finish()
	}
}
