//! Shared fixtures for the integration suites.

#![allow(dead_code)]

// std
use std::sync::Arc;
// crates.io
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
// self
use pillbox_session::{
	client::ApiClient,
	http::ReqwestTransport,
	session::SessionManager,
	store::{MemoryStore, SessionStore, StoreKey},
	url::Url,
};

/// Builds a three-segment token whose payload carries the provided expiry.
pub fn fake_jwt(exp: i64) -> String {
	let header = URL_SAFE_NO_PAD.encode(b"{\"alg\":\"HS256\",\"typ\":\"JWT\"}");
	let payload = URL_SAFE_NO_PAD
		.encode(serde_json::json!({ "exp": exp, "role": "USER", "sub": "1" }).to_string());

	format!("{header}.{payload}.sig")
}

/// Current Unix time in seconds.
pub fn now_epoch() -> i64 {
	time::OffsetDateTime::now_utc().unix_timestamp()
}

/// Constructs a session manager + authenticated client over an in-memory
/// store and the reqwest transport used across integration tests.
pub fn build_session(base_url: &str) -> (Arc<SessionManager>, ApiClient, Arc<MemoryStore>) {
	let store_backend = Arc::new(MemoryStore::default());
	let store: Arc<dyn SessionStore> = store_backend.clone();
	let transport = Arc::new(ReqwestTransport::new(
		Url::parse(base_url).expect("Test base URL should parse."),
	));
	let session = Arc::new(SessionManager::new(store, transport.clone()));
	let client = ApiClient::new(session.clone(), transport);

	(session, client, store_backend)
}

/// Seeds both token slots directly on the backing store.
pub async fn seed_tokens(store: &MemoryStore, access: &str, refresh: &str) {
	store
		.set(StoreKey::RefreshToken, refresh)
		.await
		.expect("Seeding the refresh slot should succeed.");
	store
		.set(StoreKey::AccessToken, access)
		.await
		.expect("Seeding the access slot should succeed.");
}

/// Reads both token slots directly from the backing store.
pub async fn stored_tokens(store: &MemoryStore) -> (Option<String>, Option<String>) {
	let access = store
		.get(StoreKey::AccessToken)
		.await
		.expect("Reading the access slot should succeed.");
	let refresh = store
		.get(StoreKey::RefreshToken)
		.await
		.expect("Reading the refresh slot should succeed.");

	(access, refresh)
}

/// Standard success envelope wrapping a token grant.
pub fn grant_envelope(access: &str, refresh: &str) -> serde_json::Value {
	serde_json::json!({
		"code": "OK",
		"httpStatus": 200,
		"message": "ok",
		"data": { "accessToken": access, "refreshToken": refresh },
		"error": null,
	})
}

/// Standard error envelope for a given status/code/message triple.
pub fn error_envelope(status: u16, code: &str, message: &str) -> serde_json::Value {
	serde_json::json!({
		"code": code,
		"httpStatus": status,
		"message": message,
		"data": null,
		"error": message,
	})
}
