//! Identity-provider surface: the closed provider set and the exchange seam.
//!
//! The four provider SDKs are external collaborators; this module normalizes
//! them into one idToken-producing call behind [`IdentityExchange`]. Apple's
//! one-shot name grant travels inside the exchange result value instead of a
//! mutable side cache, so it cannot leak into a later login attempt.

// self
use crate::{_prelude::*, token::TokenSecret};

/// Social identity providers supported by the backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Provider {
	/// Google Sign-In.
	Google,
	/// Sign in with Apple.
	Apple,
	/// Kakao Login.
	Kakao,
	/// Naver Login.
	Naver,
}
impl Provider {
	/// Returns the stable wire label for this provider.
	pub const fn as_str(self) -> &'static str {
		match self {
			Provider::Google => "GOOGLE",
			Provider::Apple => "APPLE",
			Provider::Kakao => "KAKAO",
			Provider::Naver => "NAVER",
		}
	}
}
impl Display for Provider {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Name granted by Apple exactly once, on the user's first consent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppleUser {
	/// Given name from the one-time grant.
	pub first_name: String,
	/// Family name from the one-time grant.
	pub last_name: String,
}

/// Result of one identity exchange against a provider SDK.
#[derive(Clone)]
pub struct IdentityToken {
	/// Opaque identity assertion to exchange with the backend. Never parsed
	/// for authorization decisions client-side.
	pub id_token: TokenSecret,
	/// Provider that issued the assertion.
	pub provider: Provider,
	/// Present only on the very first Apple sign-in; the provider never
	/// returns it again, so it is single-use per login attempt.
	pub apple_user: Option<AppleUser>,
}
impl Debug for IdentityToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("IdentityToken")
			.field("id_token", &"<redacted>")
			.field("provider", &self.provider)
			.field("apple_user", &self.apple_user)
			.finish()
	}
}

/// Boxed future returned by [`IdentityExchange::exchange`].
pub type ExchangeFuture<'a> =
	Pin<Box<dyn Future<Output = Result<IdentityToken, ProviderError>> + 'a + Send>>;

/// Normalizes a provider SDK into one idToken-producing call.
///
/// Implementations wrap the platform SDK for one provider and must surface SDK
/// failures as [`ProviderError`] without retrying; those outcomes are terminal
/// for the login attempt.
pub trait IdentityExchange
where
	Self: Send + Sync,
{
	/// Provider this adapter fronts.
	fn provider(&self) -> Provider;

	/// Runs the provider's sign-in and yields the identity assertion.
	fn exchange(&self) -> ExchangeFuture<'_>;
}

/// Failures raised by identity-provider SDKs; terminal, never retried.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum ProviderError {
	/// User dismissed the provider's sign-in surface.
	#[error("User cancelled the {provider} sign-in.")]
	Cancelled {
		/// Provider whose sign-in was dismissed.
		provider: Provider,
	},
	/// Provider SDK reported an internal failure.
	#[error("{provider} SDK reported an error: {message}.")]
	Sdk {
		/// Provider whose SDK failed.
		provider: Provider,
		/// SDK-supplied failure description.
		message: String,
	},
	/// Provider SDK is not usable on this device or configuration.
	#[error("{provider} SDK is unavailable: {message}.")]
	Unavailable {
		/// Provider whose SDK is unavailable.
		provider: Provider,
		/// SDK-supplied failure description.
		message: String,
	},
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn provider_labels_match_wire_form() {
		for (provider, label) in [
			(Provider::Google, "\"GOOGLE\""),
			(Provider::Apple, "\"APPLE\""),
			(Provider::Kakao, "\"KAKAO\""),
			(Provider::Naver, "\"NAVER\""),
		] {
			let json =
				serde_json::to_string(&provider).expect("Provider should serialize to JSON.");

			assert_eq!(json, label);
			assert_eq!(format!("\"{provider}\""), label);
		}
	}

	#[test]
	fn apple_user_uses_camel_case_wire_names() {
		let user = AppleUser { first_name: "Jane".into(), last_name: "Doe".into() };
		let json = serde_json::to_string(&user).expect("Apple user should serialize to JSON.");

		assert_eq!(json, "{\"firstName\":\"Jane\",\"lastName\":\"Doe\"}");
	}

	#[test]
	fn identity_token_debug_redacts_assertion() {
		let identity = IdentityToken {
			id_token: TokenSecret::new("assertion"),
			provider: Provider::Kakao,
			apple_user: None,
		};
		let rendered = format!("{identity:?}");

		assert!(!rendered.contains("assertion"));
		assert!(rendered.contains("Kakao"));
	}
}
