//! Demonstrates the full sign-in pipeline: a simulated identity provider feeding the
//! session observer, bearer-stamped dispatch with login registration, and role
//! resolution against a mock backend.

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
	session::{LoginRegistrar, SessionHandle, SessionObserver},
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
				.body("{\"role\":\"moderator\"}");
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(POST).path("/get-users");
			then.status(200).header("content-type", "application/json").body("{\"ok\":true}");
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
	let client = BackendClient::new(dispatcher.clone());
	let registrar: Arc<dyn LoginRegistrar> = Arc::new(client.clone());
	let observer = SessionObserver::new(
		Arc::new(provider.clone()) as Arc<dyn IdentityProvider>,
		session.clone(),
	)
	.with_registrar(registrar);

	observer.start();

	let principal = provider.register("student@example.com", "hunter2").await?;

	println!("Signed in as: {} ({}).", principal.email, principal.id);
	println!(
		"Live bearer: {}.",
		session.credential().map(|c| c.bearer.expose().to_owned()).unwrap_or_default(),
	);

	let resolver = RoleResolver::new(client, session.clone());
	let state = resolver.resolve().await;

	println!("Resolved role state: {state}.");

	let decision = RouteGuard::with_required_role(session.clone(), Role::Moderator).evaluate();

	println!("Moderator dashboard decision: {decision:?}.");

	observer.stop();

	Ok(())
}
