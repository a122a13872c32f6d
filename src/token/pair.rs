//! Access/refresh pair as it is persisted and exchanged with the backend.

// self
use crate::{_prelude::*, token::secret::TokenSecret};

/// Access/refresh token pair issued by the backend.
///
/// A pair is always persisted and replaced wholesale; no component stores one
/// half without the other. See [`crate::store::save_pair`] for the write-order
/// invariant that keeps readers from observing a torn pair.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
	/// Short-lived bearer credential attached to API requests.
	pub access_token: TokenSecret,
	/// Longer-lived credential used solely to obtain a new pair.
	pub refresh_token: TokenSecret,
}
impl TokenPair {
	/// Builds a pair from raw bearer strings.
	pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
		Self {
			access_token: TokenSecret::new(access_token),
			refresh_token: TokenSecret::new(refresh_token),
		}
	}

	/// Returns `true` when both halves are present and non-empty.
	pub fn is_complete(&self) -> bool {
		!self.access_token.is_empty() && !self.refresh_token.is_empty()
	}
}
impl Debug for TokenPair {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenPair")
			.field("access_token", &"<redacted>")
			.field("refresh_token", &"<redacted>")
			.finish()
	}
}
