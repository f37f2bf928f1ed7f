//! Typed calls against the backend's session-facing endpoints.

// self
use crate::{
	_prelude::*,
	auth::Principal,
	dispatch::{ApiRequest, Dispatcher},
	http::HttpTransport,
	session::{LoginRegistrar, RegistrarFuture},
};

/// Role payload returned by the backend, label left raw for fail-closed mapping.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleEnvelope {
	/// Role label: `user`, `moderator`, or `admin`.
	pub role: String,
}

/// Login-registration upsert the backend expects on every sign-in.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRegistration<'a> {
	/// Email the principal signed in with.
	pub email: &'a str,
	/// Role the backend should seed for first-time principals.
	pub role: &'a str,
	/// Login increment applied by the backend.
	pub login_count: u32,
}

/// Typed client over the session-facing backend endpoints.
pub struct BackendClient<C>
where
	C: ?Sized + HttpTransport,
{
	dispatcher: Arc<Dispatcher<C>>,
}
impl<C> BackendClient<C>
where
	C: ?Sized + HttpTransport,
{
	/// Creates a client over the provided dispatcher.
	pub fn new(dispatcher: Arc<Dispatcher<C>>) -> Self {
		Self { dispatcher }
	}

	/// Returns the dispatcher backing this client.
	pub fn dispatcher(&self) -> &Arc<Dispatcher<C>> {
		&self.dispatcher
	}

	/// Fetches the current principal's role envelope.
	pub async fn fetch_role(&self) -> Result<RoleEnvelope> {
		let path = self.dispatcher.backend().role_path.clone();
		let response = self.dispatcher.send(ApiRequest::get(path)).await?;

		response.json()
	}

	/// Posts the login-registration upsert for the provided principal.
	pub async fn register_login(&self, principal: &Principal) -> Result<()> {
		let path = self.dispatcher.backend().login_registration_path.clone();
		let registration =
			LoginRegistration { email: &principal.email, role: "user", login_count: 1 };

		self.dispatcher.send(ApiRequest::post(path, &registration)?).await?;

		Ok(())
	}
}
impl<C> LoginRegistrar for BackendClient<C>
where
	C: ?Sized + HttpTransport,
{
	fn record_login<'a>(&'a self, principal: &'a Principal) -> RegistrarFuture<'a> {
		Box::pin(self.register_login(principal))
	}
}
impl<C> Clone for BackendClient<C>
where
	C: ?Sized + HttpTransport,
{
	fn clone(&self) -> Self {
		Self { dispatcher: self.dispatcher.clone() }
	}
}
impl<C> Debug for BackendClient<C>
where
	C: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("BackendClient").field("dispatcher", &self.dispatcher).finish()
	}
}
