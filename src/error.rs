//! Session-level error types shared across the manager, client, stores, and flows.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical session error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Identity-provider failure; terminal, never retried.
	#[error(transparent)]
	Provider(#[from] crate::provider::ProviderError),
	/// Transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),

	/// Backend responded with an envelope that could not be parsed.
	#[error("Backend returned a malformed response envelope.")]
	Envelope {
		/// Structured parsing failure with the offending JSON path.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status of the offending response.
		status: u16,
	},
	/// Request body serialization failed before any network I/O.
	#[error("Request body could not be serialized.")]
	RequestBody {
		/// Underlying serialization failure.
		#[source]
		source: serde_json::Error,
	},
	/// No refresh token is stored; callers must route to login, not retry.
	#[error("No refresh token is available; a fresh login is required.")]
	MissingRefreshToken,
	/// Backend rejected the social identity token during login.
	#[error("Social token validation failed: {reason}.")]
	TokenRejected {
		/// Backend-supplied reason string.
		reason: String,
	},
	/// Backend rejected the request body as invalid.
	#[error("Request was rejected as invalid: {reason}.")]
	Validation {
		/// Backend-supplied reason string.
		reason: String,
	},
	/// Session is no longer valid; the user must re-authenticate.
	#[error("Session is no longer valid: {reason}.")]
	Unauthorized {
		/// Backend-supplied reason string.
		reason: String,
	},
	/// Backend error passed through with its envelope fields.
	#[error("Backend responded with status {status}: {message}.")]
	Api {
		/// HTTP status code of the response.
		status: u16,
		/// Backend error code from the envelope, when present.
		code: Option<String>,
		/// Backend message from the envelope.
		message: String,
	},
	/// Overall operation exceeded its deadline.
	#[error("Operation timed out after {seconds} seconds.")]
	Timeout {
		/// Deadline that elapsed, in seconds.
		seconds: u64,
	},
}
impl Error {
	/// HTTP status attached to the error, when one exists.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Api { status, .. } | Self::Envelope { status, .. } => Some(*status),
			Self::Validation { .. } => Some(400),
			Self::TokenRejected { .. } | Self::Unauthorized { .. } => Some(401),
			_ => None,
		}
	}
}

/// Transport-level failures (network, IO, addressing).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the backend.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Request URL could not be assembled from the base URL and path.
	#[error("Request URL is invalid.")]
	InvalidUrl(#[from] url::ParseError),
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
