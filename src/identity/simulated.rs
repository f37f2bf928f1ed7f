//! In-process [`IdentityProvider`] implementation for demos and deterministic tests.
//!
//! Accounts live in memory; session updates produced by account operations are driven
//! inline before the operation resolves, while [`SimulatedIdentityProvider::emit`] hands
//! the update future back to the caller so tests can interleave completions explicitly.

// std
use std::{
	collections::VecDeque,
	sync::atomic::{AtomicU64, Ordering},
};
// self
use crate::{
	_prelude::*,
	auth::{Credential, Principal, PrincipalId, ProfileUpdate},
	error::ProviderError,
	identity::{
		IdentityProvider, ProviderFuture, SessionChange, SessionListener, SessionUpdate,
		Subscription,
	},
};

#[derive(Clone, Debug)]
struct SimulatedAccount {
	principal: Principal,
	password: String,
}

#[derive(Default)]
struct SimulatedShared {
	accounts: RwLock<HashMap<String, SimulatedAccount>>,
	current: RwLock<Option<Principal>>,
	listeners: Arc<Mutex<BTreeMap<u64, SessionListener>>>,
	next_listener: AtomicU64,
	next_principal: AtomicU64,
	next_mint: AtomicU64,
	mint_script: Mutex<VecDeque<Result<String, ProviderError>>>,
	reset_requests: Mutex<Vec<String>>,
}

/// Identity provider backed by in-process account state.
#[derive(Clone, Default)]
pub struct SimulatedIdentityProvider(Arc<SimulatedShared>);
impl SimulatedIdentityProvider {
	/// Creates a provider with no accounts and no signed-in principal.
	pub fn new() -> Self {
		Self::default()
	}

	/// Emits a raw session-change notification and returns its update future.
	///
	/// Callers drive the returned future themselves, which makes out-of-order completion
	/// across rapid successive notifications reproducible in tests.
	pub fn emit(&self, principal: Option<Principal>) -> SessionUpdate {
		*self.0.current.write() = principal.clone();

		self.notify(SessionChange { principal })
	}

	/// Queues a successful mint outcome returning the provided bearer token.
	pub fn enqueue_mint(&self, token: impl Into<String>) {
		self.0.mint_script.lock().push_back(Ok(token.into()));
	}

	/// Queues a failed mint outcome with the provided reason.
	pub fn enqueue_mint_failure(&self, reason: impl Into<String>) {
		self.0
			.mint_script
			.lock()
			.push_back(Err(ProviderError::CredentialMint { reason: reason.into() }));
	}

	/// Returns the emails that requested a password reset, in order.
	pub fn reset_requests(&self) -> Vec<String> {
		self.0.reset_requests.lock().clone()
	}

	/// Returns the number of live listener registrations.
	pub fn listener_count(&self) -> usize {
		self.0.listeners.lock().len()
	}

	/// Returns the provider's view of the signed-in principal.
	pub fn current_principal(&self) -> Option<Principal> {
		self.0.current.read().clone()
	}

	fn notify(&self, change: SessionChange) -> SessionUpdate {
		let updates: Vec<SessionUpdate> =
			self.0.listeners.lock().values().map(|listener| listener(change.clone())).collect();

		Box::pin(async move {
			for update in updates {
				update.await;
			}
		})
	}

	fn fresh_principal(&self, email: &str) -> Principal {
		let n = self.0.next_principal.fetch_add(1, Ordering::Relaxed);
		let id = PrincipalId::new(format!("sim-{n}"))
			.expect("Counter-derived identifier should always be valid.");

		Principal::new(id, email)
	}

	fn next_mint_outcome(&self, principal: &Principal) -> Result<Credential, ProviderError> {
		let scripted = self.0.mint_script.lock().pop_front();

		match scripted {
			Some(Ok(token)) => Ok(Credential::new(principal.id.clone(), token)),
			Some(Err(e)) => Err(e),
			None => {
				let n = self.0.next_mint.fetch_add(1, Ordering::Relaxed);

				Ok(Credential::new(principal.id.clone(), format!("simulated-bearer-{n}")))
			},
		}
	}
}
impl IdentityProvider for SimulatedIdentityProvider {
	fn subscribe(&self, listener: SessionListener) -> Subscription {
		let id = self.0.next_listener.fetch_add(1, Ordering::Relaxed);

		self.0.listeners.lock().insert(id, listener);

		let listeners = self.0.listeners.clone();

		Subscription::new(move || {
			listeners.lock().remove(&id);
		})
	}

	fn mint_credential<'a>(&'a self, principal: &'a Principal) -> ProviderFuture<'a, Credential> {
		Box::pin(async move { self.next_mint_outcome(principal) })
	}

	fn register<'a>(&'a self, email: &'a str, password: &'a str) -> ProviderFuture<'a, Principal> {
		Box::pin(async move {
			if self.0.accounts.read().contains_key(email) {
				return Err(ProviderError::DuplicateAccount { email: email.to_owned() });
			}

			let principal = self.fresh_principal(email);

			self.0.accounts.write().insert(
				email.to_owned(),
				SimulatedAccount { principal: principal.clone(), password: password.to_owned() },
			);
			self.emit(Some(principal.clone())).await;

			Ok(principal)
		})
	}

	fn sign_in<'a>(&'a self, email: &'a str, password: &'a str) -> ProviderFuture<'a, Principal> {
		Box::pin(async move {
			let principal = {
				let accounts = self.0.accounts.read();
				let account = accounts
					.get(email)
					.ok_or(ProviderError::UnknownAccount { email: email.to_owned() })?;

				if account.password != password {
					return Err(ProviderError::InvalidCredentials);
				}

				account.principal.clone()
			};

			self.emit(Some(principal.clone())).await;

			Ok(principal)
		})
	}

	fn sign_out(&self) -> ProviderFuture<'_, ()> {
		Box::pin(async move {
			self.emit(None).await;

			Ok(())
		})
	}

	fn reset_password<'a>(&'a self, email: &'a str) -> ProviderFuture<'a, ()> {
		Box::pin(async move {
			if !self.0.accounts.read().contains_key(email) {
				return Err(ProviderError::UnknownAccount { email: email.to_owned() });
			}

			self.0.reset_requests.lock().push(email.to_owned());

			Ok(())
		})
	}

	fn update_profile<'a>(&'a self, update: &'a ProfileUpdate) -> ProviderFuture<'a, Principal> {
		Box::pin(async move {
			let current = self.0.current.read().clone().ok_or(ProviderError::NotSignedIn)?;
			let updated = update.apply(&current);

			if let Some(account) = self.0.accounts.write().get_mut(&updated.email) {
				account.principal = updated.clone();
			}

			self.emit(Some(updated.clone())).await;

			Ok(updated)
		})
	}
}
impl Debug for SimulatedIdentityProvider {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SimulatedIdentityProvider")
			.field("accounts", &self.0.accounts.read().len())
			.field("listeners", &self.listener_count())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::sync::atomic::{AtomicU32, Ordering};
	// self
	use super::*;

	#[tokio::test]
	async fn register_rejects_duplicate_emails() {
		let provider = SimulatedIdentityProvider::new();

		provider
			.register("student@example.com", "hunter2")
			.await
			.expect("First registration should succeed.");

		let err = provider
			.register("student@example.com", "hunter2")
			.await
			.expect_err("Second registration for the same email should fail.");

		assert!(matches!(err, ProviderError::DuplicateAccount { .. }));
	}

	#[tokio::test]
	async fn sign_in_validates_password() {
		let provider = SimulatedIdentityProvider::new();

		provider
			.register("student@example.com", "hunter2")
			.await
			.expect("Registration should succeed.");
		provider.sign_out().await.expect("Sign-out should succeed.");

		let err = provider
			.sign_in("student@example.com", "wrong")
			.await
			.expect_err("Wrong password should be rejected.");

		assert!(matches!(err, ProviderError::InvalidCredentials));
		assert_eq!(provider.current_principal(), None);

		provider
			.sign_in("student@example.com", "hunter2")
			.await
			.expect("Correct password should be accepted.");

		assert!(provider.current_principal().is_some());
	}

	#[tokio::test]
	async fn notifications_reach_listeners_until_cancelled() {
		let provider = SimulatedIdentityProvider::new();
		let seen = Arc::new(AtomicU32::new(0));
		let counted = seen.clone();
		let subscription = provider.subscribe(Box::new(move |_| {
			counted.fetch_add(1, Ordering::SeqCst);

			Box::pin(async {})
		}));

		provider.emit(None).await;

		assert_eq!(seen.load(Ordering::SeqCst), 1);

		subscription.cancel();
		provider.emit(None).await;

		assert_eq!(seen.load(Ordering::SeqCst), 1);
		assert_eq!(provider.listener_count(), 0);
	}

	#[tokio::test]
	async fn scripted_mints_pop_in_order() {
		let provider = SimulatedIdentityProvider::new();
		let principal = provider
			.register("student@example.com", "hunter2")
			.await
			.expect("Registration should succeed.");

		provider.enqueue_mint("T1");
		provider.enqueue_mint_failure("expired session");

		let first = provider
			.mint_credential(&principal)
			.await
			.expect("Scripted mint should succeed.");

		assert_eq!(first.bearer.expose(), "T1");

		let err = provider
			.mint_credential(&principal)
			.await
			.expect_err("Scripted failure should surface.");

		assert!(matches!(err, ProviderError::CredentialMint { .. }));
	}

	#[tokio::test]
	async fn reset_password_records_known_accounts_only() {
		let provider = SimulatedIdentityProvider::new();

		provider
			.register("student@example.com", "hunter2")
			.await
			.expect("Registration should succeed.");
		provider
			.reset_password("student@example.com")
			.await
			.expect("Reset for a known account should succeed.");

		let err = provider
			.reset_password("stranger@example.com")
			.await
			.expect_err("Reset for an unknown account should fail.");

		assert!(matches!(err, ProviderError::UnknownAccount { .. }));
		assert_eq!(provider.reset_requests(), vec!["student@example.com".to_owned()]);
	}
}
