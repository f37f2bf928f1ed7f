//! Identity-provider boundary: session-change notifications and account operations.
//!
//! The external provider is modeled as a source of [`SessionChange`] notifications plus a
//! mint operation for fresh bearer credentials. Listeners receive each notification
//! synchronously (so receipt order is observable) and hand back a [`SessionUpdate`]
//! future holding the asynchronous remainder; the notification source is responsible for
//! driving that future to completion, inline or spawned. Notifications may fire zero or
//! more times per process lifetime in any order dictated by user action, and each mint
//! may fail or succeed independently.

pub mod simulated;

pub use simulated::SimulatedIdentityProvider;

// self
use crate::{
	_prelude::*,
	auth::{Credential, Principal, ProfileUpdate},
	error::ProviderError,
};

/// Boxed future returned by identity-provider operations.
pub type ProviderFuture<'a, T> =
	Pin<Box<dyn Future<Output = Result<T, ProviderError>> + 'a + Send>>;
/// Asynchronous remainder of a session-change notification.
///
/// Produced by a [`SessionListener`]; the notification source must drive it to
/// completion. Completion order across overlapping notifications is deliberately
/// unspecified — consumers guard against stale completions by sequence number.
pub type SessionUpdate = Pin<Box<dyn Future<Output = ()> + Send>>;
/// Callback registered through [`IdentityProvider::subscribe`].
pub type SessionListener = Box<dyn Fn(SessionChange) -> SessionUpdate + Send + Sync>;

/// Session-change notification reported by the identity provider.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionChange {
	/// Principal now signed in, or `None` after sign-out.
	pub principal: Option<Principal>,
}
impl SessionChange {
	/// Notification for a freshly signed-in (or refreshed) principal.
	pub fn signed_in(principal: Principal) -> Self {
		Self { principal: Some(principal) }
	}

	/// Notification for a signed-out session.
	pub fn signed_out() -> Self {
		Self { principal: None }
	}
}

/// External identity-provider contract consumed by the session observer.
///
/// Implementations bridge a real provider SDK; [`SimulatedIdentityProvider`] ships for
/// demos and deterministic tests. All account operations are thin passthroughs whose
/// session effects arrive via the subscription, never through return values.
pub trait IdentityProvider
where
	Self: Send + Sync,
{
	/// Registers a session-change listener and returns its cancellation handle.
	fn subscribe(&self, listener: SessionListener) -> Subscription;

	/// Mints a fresh bearer credential for the provided principal.
	fn mint_credential<'a>(&'a self, principal: &'a Principal) -> ProviderFuture<'a, Credential>;

	/// Creates an account and signs the new principal in.
	fn register<'a>(&'a self, email: &'a str, password: &'a str) -> ProviderFuture<'a, Principal>;

	/// Signs an existing principal in with an email/password pair.
	fn sign_in<'a>(&'a self, email: &'a str, password: &'a str) -> ProviderFuture<'a, Principal>;

	/// Signs the current principal out.
	fn sign_out(&self) -> ProviderFuture<'_, ()>;

	/// Requests a password-reset flow for the provided email.
	fn reset_password<'a>(&'a self, email: &'a str) -> ProviderFuture<'a, ()>;

	/// Replaces profile fields of the signed-in principal.
	fn update_profile<'a>(&'a self, update: &'a ProfileUpdate) -> ProviderFuture<'a, Principal>;
}

/// Cancellation handle for a registered [`SessionListener`].
///
/// Cancelling (or dropping) the subscription guarantees the listener is never invoked
/// again; cancellation is idempotent.
pub struct Subscription {
	cancel: Mutex<Option<Box<dyn FnOnce() + Send>>>,
}
impl Subscription {
	/// Wraps a provider-specific cancellation closure.
	pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
		Self { cancel: Mutex::new(Some(Box::new(cancel))) }
	}

	/// Cancels the registration. Safe to call more than once.
	pub fn cancel(&self) {
		if let Some(cancel) = self.cancel.lock().take() {
			cancel();
		}
	}
}
impl Drop for Subscription {
	fn drop(&mut self) {
		self.cancel();
	}
}
impl Debug for Subscription {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Subscription")
			.field("active", &self.cancel.lock().is_some())
			.finish()
	}
}
