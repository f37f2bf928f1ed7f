//! Walks an admin-only route's guard through the session lifecycle: initial loading,
//! anonymous redirect, pending role resolution, and the final render.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
// self
use session_broker::{
	auth::Role,
	backend::{BackendClient, BackendDescriptor},
	dispatch::Dispatcher,
	guard::RouteGuard,
	http::ReqwestTransport,
	identity::{IdentityProvider, SimulatedIdentityProvider},
	reqwest::Client,
	resolver::RoleResolver,
	session::{SessionHandle, SessionObserver},
	url::Url,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;

	server
		.mock_async(|when, then| {
			when.method(GET).path("/get-user-role");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"role\":\"admin\"}");
		})
		.await;

	let backend = BackendDescriptor::builder(Url::parse(&server.url("/"))?).build()?;
	let provider = SimulatedIdentityProvider::new();
	let session = SessionHandle::new();
	let transport = ReqwestTransport::with_client(
		Client::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()?,
	);
	let dispatcher = Arc::new(Dispatcher::with_transport(backend, session.clone(), transport));
	let observer = SessionObserver::new(
		Arc::new(provider.clone()) as Arc<dyn IdentityProvider>,
		session.clone(),
	);

	observer.start();

	let guard = RouteGuard::with_required_role(session.clone(), Role::Admin);

	println!("Before the first provider event: {:?}.", guard.evaluate());

	provider.emit(None).await;

	println!("After a signed-out notification:  {:?}.", guard.evaluate());

	provider.register("admin@example.com", "hunter2").await?;

	println!("Signed in, role still pending:    {:?}.", guard.evaluate());

	let resolver = RoleResolver::new(BackendClient::new(dispatcher), session.clone());

	resolver.resolve().await;

	println!("After role resolution:            {:?}.", guard.evaluate());

	observer.stop();

	Ok(())
}
