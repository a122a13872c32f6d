//! Unverified bearer-token inspection: expiry prediction and claim decoding.
//!
//! The client is not the trust boundary, so payloads are decoded without any
//! signature verification; the backend verifies signatures on every request.
//! Every decoding failure is treated as "expired" by [`should_refresh`] so the
//! caller always has a safe default.

// crates.io
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
// self
use crate::_prelude::*;

/// Remaining lifetime, in seconds, under which an access token is refreshed
/// proactively. Sized so a refresh can complete and propagate before the token
/// would be rejected server-side, accounting for request latency and clock drift.
pub const REFRESH_SKEW_SECS: i64 = 90;

/// Claims this client reads from a bearer token payload.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Claims {
	/// Expiry instant in Unix seconds.
	pub exp: i64,
	/// Role granted to the session, when the backend embeds one.
	#[serde(default)]
	pub role: Option<String>,
	/// Subject identifier, when the backend embeds one.
	#[serde(default)]
	pub sub: Option<String>,
}

/// Decode failures for unverified token inspection.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum InspectError {
	/// Token is not a three-segment JWT.
	#[error("Token is not a three-segment JWT.")]
	Malformed,
	/// Payload segment is not valid base64url.
	#[error("Token payload is not valid base64url.")]
	PayloadEncoding,
	/// Payload bytes are not valid claim JSON.
	#[error("Token payload is not valid claim JSON.")]
	PayloadJson,
}

/// Decodes the payload claims of an unverified bearer token.
pub fn decode_claims(token: &str) -> Result<Claims, InspectError> {
	let mut segments = token.split('.');
	let (Some(_), Some(payload), Some(_), None) =
		(segments.next(), segments.next(), segments.next(), segments.next())
	else {
		return Err(InspectError::Malformed);
	};
	let bytes = URL_SAFE_NO_PAD.decode(payload).map_err(|_| InspectError::PayloadEncoding)?;

	serde_json::from_slice(&bytes).map_err(|_| InspectError::PayloadJson)
}

/// Decodes only the expiry instant (Unix seconds) of an unverified token.
pub fn decode_expiry(token: &str) -> Result<i64, InspectError> {
	decode_claims(token).map(|claims| claims.exp)
}

/// Returns `true` iff the token expires within [`REFRESH_SKEW_SECS`] of `now`.
///
/// Fails closed: an undecodable token is reported as needing refresh rather
/// than surfacing a decode error.
pub fn should_refresh(token: &str, now_epoch_secs: i64) -> bool {
	match decode_expiry(token) {
		Ok(exp) => exp - now_epoch_secs <= REFRESH_SKEW_SECS,
		Err(_) => true,
	}
}

/// [`should_refresh`] evaluated against the current UTC clock.
pub fn should_refresh_now(token: &str) -> bool {
	should_refresh(token, OffsetDateTime::now_utc().unix_timestamp())
}
