//! Refresh rotation, fail-fast, and single-flight reuse.

mod common;

// crates.io
use httpmock::prelude::*;
// self
use common::*;
use pillbox_session::error::Error;

#[tokio::test]
async fn refresh_rotates_and_persists_the_pair() {
	let server = MockServer::start_async().await;
	let (session, _, store) = build_session(&server.base_url());

	seed_tokens(&store, "access-old", "refresh-old").await;

	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/api/v1/auth/refresh")
				.json_body_includes(r#"{"refreshToken":"refresh-old"}"#);
			then.status(200).json_body(grant_envelope("access-new", "refresh-new"));
		})
		.await;
	let pair = session.refresh(Some("access-old")).await.expect("Refresh should succeed.");

	mock.assert_async().await;

	assert_eq!(pair.access_token.expose(), "access-new");
	assert_eq!(pair.refresh_token.expose(), "refresh-new");

	let (access, refresh) = stored_tokens(&store).await;

	assert_eq!(access.as_deref(), Some("access-new"));
	assert_eq!(refresh.as_deref(), Some("refresh-new"));
}

#[tokio::test]
async fn refresh_without_stored_token_rejects_before_any_network_call() {
	let server = MockServer::start_async().await;
	let (session, _, _) = build_session(&server.base_url());
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/v1/auth/refresh");
			then.status(200).json_body(grant_envelope("x", "y"));
		})
		.await;
	let err = session
		.refresh(None)
		.await
		.expect_err("Refresh with no stored refresh token must fail fast.");

	assert!(matches!(err, Error::MissingRefreshToken));
	assert_eq!(mock.hits_async().await, 0);
}

#[tokio::test]
async fn refresh_reuses_a_pair_rotated_by_another_caller() {
	let server = MockServer::start_async().await;
	let (session, _, store) = build_session(&server.base_url());

	// The store already holds a different access token than the caller saw.
	seed_tokens(&store, "access-current", "refresh-current").await;

	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/v1/auth/refresh");
			then.status(200).json_body(grant_envelope("x", "y"));
		})
		.await;
	let pair = session
		.refresh(Some("access-stale"))
		.await
		.expect("Refresh should reuse the already-rotated pair.");

	assert_eq!(pair.access_token.expose(), "access-current");
	assert_eq!(mock.hits_async().await, 0);
	assert_eq!(session.refresh_metrics.attempts(), 1);
	assert_eq!(session.refresh_metrics.successes(), 1);
}

#[tokio::test]
async fn refresh_rejection_leaves_the_store_untouched() {
	let server = MockServer::start_async().await;
	let (session, _, store) = build_session(&server.base_url());

	seed_tokens(&store, "access-old", "refresh-expired").await;

	server
		.mock_async(|when, then| {
			when.method(POST).path("/api/v1/auth/refresh");
			then.status(401).json_body(error_envelope(401, "INVALID_REFRESH", "expired"));
		})
		.await;

	let err = session
		.refresh(Some("access-old"))
		.await
		.expect_err("A rejected refresh must surface an error.");

	assert!(matches!(err, Error::Unauthorized { .. }));

	// The caller decides whether to log out; refresh itself never clears.
	let (access, refresh) = stored_tokens(&store).await;

	assert_eq!(access.as_deref(), Some("access-old"));
	assert_eq!(refresh.as_deref(), Some("refresh-expired"));
	assert_eq!(session.refresh_metrics.failures(), 1);
}

#[tokio::test]
async fn concurrent_refreshes_hit_the_backend_once() {
	let server = MockServer::start_async().await;
	let (session, _, store) = build_session(&server.base_url());

	seed_tokens(&store, "access-old", "refresh-old").await;

	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/v1/auth/refresh");
			then.status(200).json_body(grant_envelope("access-new", "refresh-new"));
		})
		.await;
	let (first, second, third) = tokio::join!(
		session.refresh(Some("access-old")),
		session.refresh(Some("access-old")),
		session.refresh(Some("access-old")),
	);

	for pair in [
		first.expect("First concurrent refresh should succeed."),
		second.expect("Second concurrent refresh should succeed."),
		third.expect("Third concurrent refresh should succeed."),
	] {
		assert_eq!(pair.access_token.expose(), "access-new");
	}

	assert_eq!(mock.hits_async().await, 1);
	assert_eq!(session.refresh_metrics.attempts(), 3);
	assert_eq!(session.refresh_metrics.successes(), 3);
}
