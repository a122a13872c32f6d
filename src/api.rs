//! Backend wire contract: the response envelope, request bodies, and the
//! closed login classification.
//!
//! Every backend response, success or failure, arrives in one JSON envelope
//! (`code`, `httpStatus`, `message`, `data`, `error`). Login status branching
//! is concentrated in [`classify_login`] so the session manager matches a
//! closed enum instead of re-deriving semantics from numeric codes.

// crates.io
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	provider::{AppleUser, Provider},
	token::{TokenPair, TokenSecret},
};

/// JSON envelope wrapping every backend response body.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<T> {
	/// Backend-defined result code.
	#[serde(default)]
	pub code: Option<String>,
	/// HTTP status echoed in the body.
	#[serde(default)]
	pub http_status: Option<u16>,
	/// Human-readable message.
	#[serde(default)]
	pub message: Option<String>,
	/// Payload for successful responses; also used by 404 login responses to
	/// carry a signup name hint.
	#[serde(default = "Option::default")]
	pub data: Option<T>,
	/// Structured error payload for failures.
	#[serde(default)]
	pub error: Option<String>,
}
impl<T> Envelope<T>
where
	T: DeserializeOwned,
{
	/// Parses an envelope, reporting the offending JSON path on failure.
	pub fn parse(status: u16, bytes: &[u8]) -> Result<Self> {
		let mut deserializer = serde_json::Deserializer::from_slice(bytes);

		serde_path_to_error::deserialize(&mut deserializer)
			.map_err(|source| Error::Envelope { source, status })
	}
}

/// Token pair as issued by the auth endpoints.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenGrant {
	/// Freshly issued access token.
	pub access_token: String,
	/// Freshly issued refresh token.
	pub refresh_token: String,
}
impl From<TokenGrant> for TokenPair {
	fn from(grant: TokenGrant) -> Self {
		TokenPair::new(grant.access_token, grant.refresh_token)
	}
}
impl Debug for TokenGrant {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenGrant")
			.field("access_token", &"<redacted>")
			.field("refresh_token", &"<redacted>")
			.finish()
	}
}

/// Wrapper the backend expects around Apple's one-shot name grant.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppleUserPayload {
	/// Given/family name from the first Apple consent.
	pub name: AppleUser,
}

/// Body for `POST /auth/login`.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
	/// Identity assertion obtained from the provider SDK.
	pub id_token: TokenSecret,
	/// Provider that issued the assertion.
	pub provider: Provider,
	/// Apple's one-shot name grant, forwarded on first sign-in only.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub apple_user_payload: Option<AppleUserPayload>,
}

/// Body for `POST /auth/signup`: the signup form plus the identity assertion.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
	/// Identity assertion obtained from the provider SDK.
	pub id_token: TokenSecret,
	/// Provider that issued the assertion.
	pub provider: Provider,
	/// Display name for the account.
	pub name: String,
	/// Birthday in `YYYY-MM-DD` form.
	pub birthday: String,
	/// Primary phone number.
	pub phone: String,
	/// Caregiver phone number, when the user registered one.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub caregiver_phone: Option<String>,
	/// Whether the user consented to push notifications.
	pub is_push_consent: bool,
}

/// Body for `POST /auth/refresh`.
#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
	/// Refresh token being exchanged.
	pub refresh_token: String,
}
impl Debug for RefreshRequest {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RefreshRequest").field("refresh_token", &"<redacted>").finish()
	}
}

/// Body for `POST /auth/logout`.
#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogoutRequest {
	/// Refresh token to invalidate server-side.
	pub refresh_token: String,
}
impl Debug for LogoutRequest {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("LogoutRequest").field("refresh_token", &"<redacted>").finish()
	}
}

/// Body for `POST /push-tokens` and `DELETE /push-tokens`.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PushTokenRequest {
	/// Device push token.
	pub token: String,
	/// Platform label (`ios`, `android`).
	pub platform: String,
}

/// `data` payload of a 404 login response.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NameHintData {
	/// Display name harvested server-side, e.g. from a prior partial
	/// registration; pre-fills the signup form.
	#[serde(default)]
	pub name_hint: Option<String>,
}

/// Closed classification of a login response.
///
/// Produced by [`classify_login`] alone so the status branching is checked
/// exhaustively by the type system.
#[derive(Clone, Debug)]
pub enum LoginClassification {
	/// 2xx: identity recognized, session issued.
	Success(TokenGrant),
	/// 404: identity valid but no account exists yet.
	NotRegistered {
		/// Optional display name to pre-fill the signup form.
		name_hint: Option<String>,
	},
	/// 409: account exists but conflicts; routed to signup without a hint.
	Conflict,
	/// 400: malformed input; needs distinct user-facing messaging.
	ValidationError {
		/// Backend-supplied reason string.
		message: String,
	},
	/// 401: backend rejected the identity assertion itself.
	TokenInvalid {
		/// Backend-supplied reason string.
		message: String,
	},
	/// Any other status, passed through with its envelope fields.
	Other {
		/// HTTP status code of the response.
		status: u16,
		/// Backend error code from the envelope, when present.
		code: Option<String>,
		/// Backend message from the envelope.
		message: String,
	},
}

/// Classifies a login response by status code and envelope contents.
pub fn classify_login(status: u16, bytes: &[u8]) -> Result<LoginClassification> {
	match status {
		200..=299 => {
			let envelope = Envelope::<TokenGrant>::parse(status, bytes)?;
			let grant = envelope.data.ok_or(Error::Api {
				status,
				code: envelope.code,
				message: "Login response is missing token data".into(),
			})?;

			Ok(LoginClassification::Success(grant))
		},
		404 => {
			let envelope = Envelope::<NameHintData>::parse(status, bytes)?;

			Ok(LoginClassification::NotRegistered {
				name_hint: envelope.data.and_then(|data| data.name_hint),
			})
		},
		409 => Ok(LoginClassification::Conflict),
		400 => {
			let (_, message) = error_fields(status, bytes);

			Ok(LoginClassification::ValidationError { message })
		},
		401 => {
			let (_, message) = error_fields(status, bytes);

			Ok(LoginClassification::TokenInvalid { message })
		},
		_ => {
			let (code, message) = error_fields(status, bytes);

			Ok(LoginClassification::Other { status, code, message })
		},
	}
}

/// Maps a non-login error response onto the crate error taxonomy.
pub fn api_error(status: u16, bytes: &[u8]) -> Error {
	let (code, message) = error_fields(status, bytes);

	match status {
		400 => Error::Validation { reason: message },
		401 => Error::Unauthorized { reason: message },
		_ => Error::Api { status, code, message },
	}
}

/// Serializes a request body, mapping failures onto [`Error::RequestBody`].
pub fn to_body<T>(value: &T) -> Result<serde_json::Value>
where
	T: Serialize,
{
	serde_json::to_value(value).map_err(|source| Error::RequestBody { source })
}

/// Extracts (code, message) from an error envelope, tolerating bodies that are
/// not envelopes at all.
fn error_fields(status: u16, bytes: &[u8]) -> (Option<String>, String) {
	match Envelope::<serde_json::Value>::parse(status, bytes) {
		Ok(envelope) => {
			let message = envelope
				.message
				.or(envelope.error)
				.unwrap_or_else(|| format!("status {status}"));

			(envelope.code, message)
		},
		Err(_) => (None, format!("status {status}")),
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn classify_success_extracts_grant() {
		let body = br#"{"code":"OK","httpStatus":200,"message":"ok","data":{"accessToken":"A","refreshToken":"B"},"error":null}"#;
		let classified =
			classify_login(200, body).expect("Success envelope should classify cleanly.");

		let LoginClassification::Success(grant) = classified else {
			panic!("Expected Success, got {classified:?}");
		};

		assert_eq!(grant.access_token, "A");
		assert_eq!(grant.refresh_token, "B");
	}

	#[test]
	fn classify_not_registered_carries_name_hint() {
		let body = "{\"code\":\"USER_NOT_FOUND\",\"httpStatus\":404,\"message\":\"not registered\",\"data\":{\"nameHint\":\"홍길동\"},\"error\":null}";
		let classified = classify_login(404, body.as_bytes())
			.expect("404 envelope should classify as NotRegistered.");

		assert!(matches!(
			classified,
			LoginClassification::NotRegistered { name_hint: Some(ref hint) } if hint == "홍길동",
		));
	}

	#[test]
	fn classify_not_registered_tolerates_missing_hint() {
		let body = br#"{"code":"USER_NOT_FOUND","httpStatus":404,"message":"not registered","data":null,"error":null}"#;
		let classified = classify_login(404, body)
			.expect("404 envelope without data should classify as NotRegistered.");

		assert!(matches!(classified, LoginClassification::NotRegistered { name_hint: None }));
	}

	#[test]
	fn classify_conflict_and_hard_failures() {
		let conflict = br#"{"code":"CONFLICT","httpStatus":409,"message":"exists","data":null,"error":null}"#;

		assert!(matches!(
			classify_login(409, conflict).expect("409 should classify as Conflict."),
			LoginClassification::Conflict,
		));

		let invalid = br#"{"code":"BAD_INPUT","httpStatus":400,"message":"missing provider","data":null,"error":null}"#;

		assert!(matches!(
			classify_login(400, invalid).expect("400 should classify as ValidationError."),
			LoginClassification::ValidationError { ref message } if message == "missing provider",
		));

		let rejected = br#"{"code":"INVALID_ID_TOKEN","httpStatus":401,"message":"bad idToken","data":null,"error":null}"#;

		assert!(matches!(
			classify_login(401, rejected).expect("401 should classify as TokenInvalid."),
			LoginClassification::TokenInvalid { ref message } if message == "bad idToken",
		));
	}

	#[test]
	fn success_without_data_is_an_api_error() {
		let body = br#"{"code":"OK","httpStatus":200,"message":"ok","data":null,"error":null}"#;
		let err = classify_login(200, body)
			.expect_err("Success envelope without token data should error.");

		assert!(matches!(err, Error::Api { status: 200, .. }));
	}

	#[test]
	fn api_error_maps_status_onto_taxonomy() {
		let body = br#"{"code":"E1","httpStatus":400,"message":"bad phone","data":null,"error":null}"#;

		assert!(
			matches!(api_error(400, body), Error::Validation { ref reason } if reason == "bad phone")
		);
		assert!(matches!(api_error(401, body), Error::Unauthorized { .. }));
		assert!(matches!(api_error(500, body), Error::Api { status: 500, .. }));
	}

	#[test]
	fn error_fields_tolerate_non_envelope_bodies() {
		let (code, message) = error_fields(502, b"<html>bad gateway</html>");

		assert_eq!(code, None);
		assert_eq!(message, "status 502");
	}

	#[test]
	fn login_request_omits_absent_apple_payload() {
		let request = LoginRequest {
			id_token: TokenSecret::new("tok123"),
			provider: Provider::Google,
			apple_user_payload: None,
		};
		let json = serde_json::to_string(&request).expect("Login request should serialize.");

		assert_eq!(json, "{\"idToken\":\"tok123\",\"provider\":\"GOOGLE\"}");
	}

	#[test]
	fn login_request_nests_apple_name_payload() {
		let request = LoginRequest {
			id_token: TokenSecret::new("tok-apple"),
			provider: Provider::Apple,
			apple_user_payload: Some(AppleUserPayload {
				name: AppleUser { first_name: "Jane".into(), last_name: "Doe".into() },
			}),
		};
		let value = to_body(&request).expect("Login request should serialize to a value.");

		assert_eq!(value["appleUserPayload"]["name"]["firstName"], "Jane");
		assert_eq!(value["appleUserPayload"]["name"]["lastName"], "Doe");
	}
}
