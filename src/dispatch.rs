//! Authenticated request dispatch against the backend REST endpoint.
//!
//! [`Dispatcher::send`] reads the live credential from the session at the moment the
//! request goes out, never at construction time, so a request built before a sign-out
//! still leaves anonymously. Authorization failures surface as
//! [`Error::Unauthorized`](crate::error::Error::Unauthorized); the dispatcher performs
//! no refresh and no retry.

// crates.io
use http::Method;
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	backend::BackendDescriptor,
	error::{ConfigError, TransientError},
	http::{HttpTransport, TransportRequest, TransportResponse},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	session::SessionHandle,
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestTransport;

const BODY_PREVIEW_LEN: usize = 200;

/// Backend request description, path-relative to the backend base endpoint.
#[derive(Clone, Debug)]
pub struct ApiRequest {
	/// HTTP method.
	pub method: Method,
	/// Request path, starting with `/`.
	pub path: String,
	/// JSON body, if any.
	pub body: Option<serde_json::Value>,
}
impl ApiRequest {
	/// Builds a GET request for the provided path.
	pub fn get(path: impl Into<String>) -> Self {
		Self { method: Method::GET, path: path.into(), body: None }
	}

	/// Builds a POST request carrying a JSON body.
	pub fn post(
		path: impl Into<String>,
		body: &impl Serialize,
	) -> Result<Self, ConfigError> {
		Ok(Self {
			method: Method::POST,
			path: path.into(),
			body: Some(serde_json::to_value(body)?),
		})
	}

	/// Builds a PUT request carrying a JSON body.
	pub fn put(path: impl Into<String>, body: &impl Serialize) -> Result<Self, ConfigError> {
		Ok(Self {
			method: Method::PUT,
			path: path.into(),
			body: Some(serde_json::to_value(body)?),
		})
	}

	/// Builds a DELETE request for the provided path.
	pub fn delete(path: impl Into<String>) -> Self {
		Self { method: Method::DELETE, path: path.into(), body: None }
	}
}

/// Successful backend response.
#[derive(Clone, Debug)]
pub struct ApiResponse {
	/// HTTP status code (always 2xx).
	pub status: u16,
	body: Vec<u8>,
}
impl ApiResponse {
	/// Returns the raw body bytes.
	pub fn bytes(&self) -> &[u8] {
		&self.body
	}

	/// Decodes the body as JSON, reporting the failing path on mismatch.
	pub fn json<T>(&self) -> Result<T>
	where
		T: DeserializeOwned,
	{
		let mut deserializer = serde_json::Deserializer::from_slice(&self.body);

		serde_path_to_error::deserialize(&mut deserializer).map_err(|source| {
			TransientError::ResponseParse { source, status: Some(self.status) }.into()
		})
	}
}

/// Attaches the live session credential to every outgoing backend call.
pub struct Dispatcher<C>
where
	C: ?Sized + HttpTransport,
{
	backend: BackendDescriptor,
	session: SessionHandle,
	transport: Arc<C>,
}
impl<C> Dispatcher<C>
where
	C: ?Sized + HttpTransport,
{
	/// Creates a dispatcher that reuses the caller-provided transport.
	pub fn with_transport(
		backend: BackendDescriptor,
		session: SessionHandle,
		transport: impl Into<Arc<C>>,
	) -> Self {
		Self { backend, session, transport: transport.into() }
	}

	/// Returns the backend descriptor requests are dispatched against.
	pub fn backend(&self) -> &BackendDescriptor {
		&self.backend
	}

	/// Returns the session whose credential is read at dispatch time.
	pub fn session(&self) -> &SessionHandle {
		&self.session
	}

	/// Dispatches a request, stamping the live bearer credential when one is present.
	///
	/// Anonymous calls go out unchanged when nobody is signed in. 401/403 statuses map to
	/// [`Error::Unauthorized`]; other non-2xx statuses surface as
	/// [`TransientError::Backend`] with any Retry-After hint preserved.
	pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
		const KIND: FlowKind = FlowKind::Dispatch;

		let span = FlowSpan::new(KIND, "send");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let url = self.backend.endpoint(&request.path)?;
				let body = match request.body.as_ref() {
					Some(value) => Some(serde_json::to_vec(value).map_err(ConfigError::from)?),
					None => None,
				};
				// The live read: whatever credential the session holds right now.
				let bearer = self.session.credential().map(|credential| credential.bearer);
				let response = self
					.transport
					.execute(TransportRequest { method: request.method, url, bearer, body })
					.await?;

				classify(response)
			})
			.await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}
}
#[cfg(feature = "reqwest")]
impl Dispatcher<ReqwestTransport> {
	/// Creates a dispatcher with the crate's default reqwest transport.
	pub fn new(backend: BackendDescriptor, session: SessionHandle) -> Self {
		Self::with_transport(backend, session, ReqwestTransport::default())
	}
}
impl<C> Debug for Dispatcher<C>
where
	C: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Dispatcher").field("backend", &self.backend).finish()
	}
}

fn classify(response: TransportResponse) -> Result<ApiResponse> {
	if response.is_success() {
		return Ok(ApiResponse { status: response.status, body: response.body });
	}

	let preview = body_preview(&response.body);

	match response.status {
		401 | 403 => Err(Error::Unauthorized { status: response.status, reason: preview }),
		status => Err(TransientError::Backend {
			message: format!("HTTP {status}: {preview}"),
			status: Some(status),
			retry_after: response.retry_after,
		}
		.into()),
	}
}

fn body_preview(body: &[u8]) -> String {
	let text = String::from_utf8_lossy(body);
	let trimmed = text.trim();

	if trimmed.is_empty() {
		return "<empty body>".into();
	}

	trimmed.chars().take(BODY_PREVIEW_LEN).collect()
}
