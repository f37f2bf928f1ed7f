//! Broker-level error types shared across session tracking, dispatch, and role resolution.

// self
use crate::_prelude::*;

/// Broker-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical broker error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Identity-provider boundary failure.
	#[error(transparent)]
	Provider(#[from] ProviderError),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Temporary upstream failure; callers may resubmit.
	#[error(transparent)]
	Transient(#[from] TransientError),
	/// Transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),

	/// Backend rejected the credential attached to the request.
	///
	/// The dispatcher never refreshes or retries on its own; the caller is responsible for
	/// prompting re-authentication.
	#[error("Backend rejected the request credential (HTTP {status}): {reason}.")]
	Unauthorized {
		/// HTTP status reported by the backend (401 or 403).
		status: u16,
		/// Backend- or broker-supplied reason string.
		reason: String,
	},
}
impl Error {
	/// Returns true when the error indicates a rejected or missing credential.
	pub fn is_unauthorized(&self) -> bool {
		matches!(self, Self::Unauthorized { .. })
	}
}

/// Failures raised at the identity-provider boundary.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum ProviderError {
	/// Supplied email/password pair was rejected.
	#[error("Identity provider rejected the supplied credentials.")]
	InvalidCredentials,
	/// An account already exists for the supplied email.
	#[error("An account already exists for `{email}`.")]
	DuplicateAccount {
		/// Email address that collided.
		email: String,
	},
	/// No account exists for the supplied email.
	#[error("No account exists for `{email}`.")]
	UnknownAccount {
		/// Email address that failed lookup.
		email: String,
	},
	/// No principal is signed in for the requested operation.
	#[error("No principal is currently signed in.")]
	NotSignedIn,
	/// The provider failed to mint a credential for the current principal.
	#[error("Credential mint failed: {reason}.")]
	CredentialMint {
		/// Provider-supplied reason string.
		reason: String,
	},
}

/// Configuration and validation failures raised by the broker.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Request path could not be joined onto the backend base endpoint.
	#[error("Request path `{path}` is invalid.")]
	InvalidPath {
		/// Path that failed to join.
		path: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Request body could not be serialized.
	#[error("Request body could not be serialized.")]
	BodySerialize(#[from] serde_json::Error),
	/// Backend descriptor validation failed.
	#[error(transparent)]
	InvalidDescriptor(#[from] crate::backend::BackendDescriptorError),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}

/// Temporary failure variants (safe to resubmit).
#[derive(Debug, ThisError)]
pub enum TransientError {
	/// Backend returned an unexpected but non-fatal response.
	#[error("Backend returned an unexpected response: {message}.")]
	Backend {
		/// Backend- or broker-supplied message summarizing the failure.
		message: String,
		/// HTTP status code, when available.
		status: Option<u16>,
		/// Retry-After hint from upstream, if supplied.
		retry_after: Option<Duration>,
	},
	/// Backend responded with malformed JSON that could not be parsed.
	#[error("Backend returned malformed JSON.")]
	ResponseParse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::error::Error>,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
}
/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the backend.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the backend.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}
