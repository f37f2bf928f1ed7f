//! Bridges identity-provider notifications into the session state.
//!
//! The observer registers a single long-lived subscription. Each notification is
//! numbered synchronously at receipt; sign-outs clear the session in the same call,
//! while sign-ins mint a fresh credential asynchronously before publishing. A slower
//! mint finishing after a newer notification is discarded by the sequence check in
//! [`SessionHandle`], so rapid refresh-then-sign-out interleavings settle on the state
//! of the last notification received.

// self
use crate::{
	_prelude::*,
	auth::Principal,
	identity::{IdentityProvider, SessionChange, SessionUpdate, Subscription},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	session::SessionHandle,
};

/// Boxed future returned by [`LoginRegistrar::record_login`].
pub type RegistrarFuture<'a> = Pin<Box<dyn Future<Output = Result<()>> + 'a + Send>>;

/// Backend hook invoked after every successful credential mint.
///
/// Mirrors the login-registration upsert the backend expects on each sign-in. Failures
/// are logged and never block session publication.
pub trait LoginRegistrar
where
	Self: Send + Sync,
{
	/// Records a login for the provided principal.
	fn record_login<'a>(&'a self, principal: &'a Principal) -> RegistrarFuture<'a>;
}

/// Observer owning the provider subscription and the principal/credential fields.
pub struct SessionObserver {
	provider: Arc<dyn IdentityProvider>,
	session: SessionHandle,
	registrar: Option<Arc<dyn LoginRegistrar>>,
	subscription: Mutex<Option<Subscription>>,
}
impl SessionObserver {
	/// Creates an observer for the provided provider + session pair.
	pub fn new(provider: Arc<dyn IdentityProvider>, session: SessionHandle) -> Self {
		Self { provider, session, registrar: None, subscription: Mutex::new(None) }
	}

	/// Attaches a login registrar invoked after each successful mint.
	pub fn with_registrar(mut self, registrar: Arc<dyn LoginRegistrar>) -> Self {
		self.registrar = Some(registrar);

		self
	}

	/// Registers the long-lived provider subscription.
	///
	/// Calling `start` again replaces the previous subscription; in-flight work from the
	/// old registration is superseded by the sequence check.
	pub fn start(&self) {
		let session = self.session.clone();
		let provider = self.provider.clone();
		let registrar = self.registrar.clone();
		let subscription = self.provider.subscribe(Box::new(move |change| {
			handle_change(&session, &provider, registrar.clone(), change)
		}));

		if let Some(previous) = self.subscription.lock().replace(subscription) {
			previous.cancel();
		}
	}

	/// Unregisters the subscription and invalidates in-flight observer work.
	///
	/// Idempotent and safe to call without a prior [`start`](Self::start); no further
	/// observer-driven session updates occur after `stop` returns.
	pub fn stop(&self) {
		if let Some(subscription) = self.subscription.lock().take() {
			subscription.cancel();
		}

		self.session.invalidate_inflight();
	}

	/// Returns the session handle this observer writes into.
	pub fn session(&self) -> &SessionHandle {
		&self.session
	}
}
impl Drop for SessionObserver {
	fn drop(&mut self) {
		self.stop();
	}
}
impl Debug for SessionObserver {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SessionObserver")
			.field("subscribed", &self.subscription.lock().is_some())
			.field("session", &self.session)
			.finish()
	}
}

/// Processes one notification: numbering happens here, synchronously at receipt.
fn handle_change(
	session: &SessionHandle,
	provider: &Arc<dyn IdentityProvider>,
	registrar: Option<Arc<dyn LoginRegistrar>>,
	change: SessionChange,
) -> SessionUpdate {
	const KIND: FlowKind = FlowKind::SessionChange;

	let seq = session.begin_change();

	obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

	match change.principal {
		None => {
			session.clear(seq);
			obs::record_flow_outcome(KIND, FlowOutcome::Success);

			Box::pin(async {})
		},
		Some(principal) => {
			let span = FlowSpan::new(KIND, "handle_change");
			let session = session.clone();
			let provider = provider.clone();

			Box::pin(span.instrument(async move {
				mint_and_publish(&session, &provider, registrar.as_deref(), seq, principal).await;
			}))
		},
	}
}

async fn mint_and_publish(
	session: &SessionHandle,
	provider: &Arc<dyn IdentityProvider>,
	registrar: Option<&dyn LoginRegistrar>,
	seq: u64,
	principal: Principal,
) {
	const KIND: FlowKind = FlowKind::CredentialMint;

	obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

	match provider.mint_credential(&principal).await {
		Ok(credential) => {
			obs::record_flow_outcome(KIND, FlowOutcome::Success);

			if !session.publish(seq, principal.clone(), credential) {
				return;
			}
			if let Some(registrar) = registrar {
				if let Err(e) = registrar.record_login(&principal).await {
					obs::warn_flow_failure(KIND, &e.to_string());
				}
			}
		},
		Err(e) => {
			// Fail open to logged out; no retry loop.
			obs::record_flow_outcome(KIND, FlowOutcome::Failure);
			obs::warn_flow_failure(KIND, &e.to_string());
			session.clear(seq);
		},
	}
}
