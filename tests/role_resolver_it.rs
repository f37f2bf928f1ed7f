// std
use std::{
	collections::VecDeque,
	sync::{Arc, Mutex},
};
// crates.io
use httpmock::prelude::*;
use tokio::sync::{Notify, mpsc};
// self
use session_broker::{
	auth::{Principal, PrincipalId, Role, RoleState},
	backend::{BackendClient, BackendDescriptor},
	dispatch::Dispatcher,
	guard::{RouteDecision, RouteGuard},
	http::{HttpTransport, ReqwestTransport, TransportFuture, TransportRequest, TransportResponse},
	identity::{IdentityProvider, SimulatedIdentityProvider},
	reqwest::Client,
	resolver::RoleResolver,
	session::{SessionHandle, SessionObserver},
	url::Url,
};

fn test_transport() -> ReqwestTransport {
	let client = Client::builder()
		.danger_accept_invalid_certs(true)
		.danger_accept_invalid_hostnames(true)
		.build()
		.expect("Failed to build insecure Reqwest client for tests.");

	ReqwestTransport::with_client(client)
}

fn principal(id: &str, email: &str) -> Principal {
	Principal::new(
		PrincipalId::new(id).expect("Principal fixture should be valid for resolver tests."),
		email,
	)
}

struct Stack<C>
where
	C: ?Sized + HttpTransport,
{
	provider: SimulatedIdentityProvider,
	session: SessionHandle,
	_observer: SessionObserver,
	resolver: Arc<RoleResolver<C>>,
}

fn build_stack<C>(base: Url, transport: impl Into<Arc<C>>) -> Stack<C>
where
	C: ?Sized + HttpTransport,
{
	let backend = BackendDescriptor::builder(base)
		.build()
		.expect("Backend descriptor should build successfully.");
	let provider = SimulatedIdentityProvider::new();
	let session = SessionHandle::new();
	let dispatcher = Arc::new(Dispatcher::with_transport(backend, session.clone(), transport));
	let resolver =
		Arc::new(RoleResolver::new(BackendClient::new(dispatcher), session.clone()));
	let observer = SessionObserver::new(
		Arc::new(provider.clone()) as Arc<dyn IdentityProvider>,
		session.clone(),
	);

	observer.start();

	Stack { provider, session, _observer: observer, resolver }
}

fn build_reqwest_stack(server: &MockServer) -> Stack<ReqwestTransport> {
	build_stack(
		Url::parse(&server.url("/")).expect("Mock server URL should parse successfully."),
		test_transport(),
	)
}

async fn sign_in(stack: &Stack<impl HttpTransport>, id: &str, token: &str) {
	stack.provider.enqueue_mint(token);
	stack.provider.emit(Some(principal(id, &format!("{id}@example.com")))).await;
}

/// Transport that parks every request until the test releases the gate, so a session
/// change can be interleaved while a role fetch is provably in flight.
struct GateTransport {
	started: mpsc::UnboundedSender<()>,
	gate: Arc<Notify>,
	responses: Mutex<VecDeque<TransportResponse>>,
}
impl GateTransport {
	fn new(started: mpsc::UnboundedSender<()>, gate: Arc<Notify>) -> Self {
		Self { started, gate, responses: Mutex::new(VecDeque::new()) }
	}

	fn enqueue_role(&self, label: &str) {
		self.responses
			.lock()
			.expect("Response queue lock should never be poisoned.")
			.push_back(TransportResponse {
				status: 200,
				retry_after: None,
				body: format!("{{\"role\":\"{label}\"}}").into_bytes(),
			});
	}
}
impl HttpTransport for GateTransport {
	fn execute(&self, _request: TransportRequest) -> TransportFuture<'_> {
		let _ = self.started.send(());

		let gate = self.gate.clone();
		let response = self
			.responses
			.lock()
			.expect("Response queue lock should never be poisoned.")
			.pop_front();

		Box::pin(async move {
			gate.notified().await;

			Ok(response.expect("Every gated request needs a scripted response."))
		})
	}
}

#[tokio::test]
async fn resolved_admin_unlocks_admin_routes() {
	let server = MockServer::start_async().await;
	let stack = build_reqwest_stack(&server);
	let role_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/get-user-role").header("authorization", "Bearer T1");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"role\":\"admin\"}");
		})
		.await;

	sign_in(&stack, "u-1", "T1").await;

	let outcome = stack.resolver.resolve().await;

	assert_eq!(outcome, RoleState::Resolved(Role::Admin));
	assert_eq!(stack.session.role(), RoleState::Resolved(Role::Admin));
	assert_eq!(
		RouteGuard::with_required_role(stack.session.clone(), Role::Admin).evaluate(),
		RouteDecision::Render,
	);

	role_mock.assert_async().await;
}

#[tokio::test]
async fn unknown_labels_fail_closed_to_user() {
	let server = MockServer::start_async().await;
	let stack = build_reqwest_stack(&server);

	server
		.mock_async(|when, then| {
			when.method(GET).path("/get-user-role");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"role\":\"superuser\"}");
		})
		.await;

	sign_in(&stack, "u-1", "T1").await;

	assert_eq!(stack.resolver.resolve().await, RoleState::Resolved(Role::User));
	assert_eq!(
		RouteGuard::with_required_role(stack.session.clone(), Role::Moderator).evaluate(),
		RouteDecision::Forbidden,
		"An unrecognized label must never unlock elevated access.",
	);
}

#[tokio::test]
async fn fetch_failure_falls_back_to_least_privilege() {
	let server = MockServer::start_async().await;
	let stack = build_reqwest_stack(&server);

	server
		.mock_async(|when, then| {
			when.method(GET).path("/get-user-role");
			then.status(500).body("role store offline");
		})
		.await;

	sign_in(&stack, "u-1", "T1").await;

	assert_eq!(stack.resolver.resolve().await, RoleState::Failed);
	assert_eq!(
		RouteGuard::with_required_role(stack.session.clone(), Role::User).evaluate(),
		RouteDecision::Render,
		"Failed resolution still grants baseline access.",
	);
	assert_eq!(
		RouteGuard::with_required_role(stack.session.clone(), Role::Moderator).evaluate(),
		RouteDecision::Forbidden,
	);
}

#[tokio::test]
async fn absent_credential_resolves_unresolved_without_network() {
	let server = MockServer::start_async().await;
	let stack = build_reqwest_stack(&server);
	let role_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/get-user-role");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"role\":\"admin\"}");
		})
		.await;

	stack.provider.emit(None).await;

	assert_eq!(stack.resolver.resolve().await, RoleState::Unresolved);

	role_mock.assert_calls_async(0).await;
}

#[tokio::test]
async fn concurrent_resolves_fetch_once() {
	let server = MockServer::start_async().await;
	let stack = build_reqwest_stack(&server);
	let role_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/get-user-role");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"role\":\"moderator\"}");
		})
		.await;

	sign_in(&stack, "u-1", "T1").await;

	let (first, second) =
		tokio::join!(stack.resolver.resolve(), stack.resolver.resolve());

	assert_eq!(first, RoleState::Resolved(Role::Moderator));
	assert_eq!(second, RoleState::Resolved(Role::Moderator));

	role_mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn relogin_always_refetches_the_role() {
	let server = MockServer::start_async().await;
	let stack = build_reqwest_stack(&server);
	let role_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/get-user-role");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"role\":\"admin\"}");
		})
		.await;

	sign_in(&stack, "u-1", "T1").await;

	assert_eq!(stack.resolver.resolve().await, RoleState::Resolved(Role::Admin));

	stack.provider.emit(None).await;

	assert_eq!(stack.session.role(), RoleState::Unresolved);

	sign_in(&stack, "u-1", "T2").await;

	assert_eq!(
		stack.session.role(),
		RoleState::Unresolved,
		"A role resolved before sign-out must not be reused.",
	);
	assert_eq!(stack.resolver.resolve().await, RoleState::Resolved(Role::Admin));

	role_mock.assert_calls_async(2).await;
}

#[tokio::test]
async fn logout_mid_flight_discards_the_resolution() {
	let gate = Arc::new(Notify::new());
	let (started_tx, mut started_rx) = mpsc::unbounded_channel();
	let transport = GateTransport::new(started_tx, gate.clone());

	transport.enqueue_role("admin");

	let stack = build_stack(
		Url::parse("https://api.example.com").expect("Static base URL should parse."),
		transport,
	);

	sign_in(&stack, "u-1", "T1").await;

	let resolver = stack.resolver.clone();
	let in_flight = tokio::spawn(async move { resolver.resolve().await });

	started_rx.recv().await.expect("The role fetch should have been issued.");

	// Sign-out lands while the fetch for T1 is still parked.
	stack.provider.emit(None).await;
	gate.notify_one();

	let outcome = in_flight.await.expect("Resolver task should not panic.");

	assert_eq!(outcome, RoleState::Unresolved);
	assert_eq!(stack.session.role(), RoleState::Unresolved);
	assert_eq!(
		RouteGuard::with_required_role(stack.session.clone(), Role::Admin).evaluate(),
		RouteDecision::RedirectToLogin,
	);
}

#[tokio::test]
async fn principal_switch_mid_flight_never_leaks_the_previous_role() {
	let gate = Arc::new(Notify::new());
	let (started_tx, mut started_rx) = mpsc::unbounded_channel();
	let transport = GateTransport::new(started_tx, gate.clone());

	transport.enqueue_role("admin");

	let stack = build_stack(
		Url::parse("https://api.example.com").expect("Static base URL should parse."),
		transport,
	);

	sign_in(&stack, "u-a", "T-a").await;

	let resolver = stack.resolver.clone();
	let in_flight = tokio::spawn(async move { resolver.resolve().await });

	started_rx.recv().await.expect("The role fetch should have been issued.");

	// Principal B takes over while A's admin response is still parked.
	sign_in(&stack, "u-b", "T-b").await;
	gate.notify_one();

	let outcome = in_flight.await.expect("Resolver task should not panic.");

	assert_eq!(outcome, RoleState::Unresolved, "A's resolution must not survive the switch.");
	assert_eq!(stack.session.role(), RoleState::Unresolved);
	assert_eq!(
		RouteGuard::with_required_role(stack.session.clone(), Role::Admin).evaluate(),
		RouteDecision::Loading,
		"Guards must show loading for B, never A's stale admin role.",
	);
}

#[tokio::test]
async fn switch_after_resolution_resets_to_loading() {
	let server = MockServer::start_async().await;
	let stack = build_reqwest_stack(&server);

	server
		.mock_async(|when, then| {
			when.method(GET).path("/get-user-role");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"role\":\"admin\"}");
		})
		.await;

	sign_in(&stack, "u-a", "T-a").await;

	assert_eq!(stack.resolver.resolve().await, RoleState::Resolved(Role::Admin));

	sign_in(&stack, "u-b", "T-b").await;

	assert_eq!(
		RouteGuard::with_required_role(stack.session.clone(), Role::Admin).evaluate(),
		RouteDecision::Loading,
		"B inherits nothing from A's resolved role.",
	);
}
