//! Session state machine: login, signup, refresh, and logout against the backend.
//!
//! [`SessionManager`] owns every store mutation in the crate. Refresh is a
//! single-flight operation: concurrent callers serialize on one process-wide
//! guard, and a caller that arrives after another caller already rotated the
//! pair reuses the stored result instead of issuing a duplicate backend call.
//! The manager is constructed over a BARE transport (one that never routes
//! through the interception pipeline), so refresh and logout cannot recurse
//! into themselves on a 401.

mod metrics;

pub use metrics::RefreshMetrics;

// self
use crate::{
	_prelude::*,
	api::{
		self, Envelope, LoginClassification, LoginRequest, LogoutRequest, RefreshRequest,
		SignupRequest, TokenGrant,
	},
	http::{ApiRequest, Method, Transport},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	provider::{AppleUser, Provider},
	store::{self, SessionStore, StoreKey},
	token::{TokenPair, TokenSecret},
};

/// Outcome of a login exchange that is not a hard failure.
#[derive(Clone, Debug)]
pub enum LoginOutcome {
	/// Backend recognized the identity and issued a session; the pair is
	/// already persisted.
	Registered(TokenPair),
	/// Identity is valid but no matching account exists (404) or the account
	/// conflicts (409); the caller routes to the signup flow. Nothing was
	/// persisted.
	NeedsSignup {
		/// Optional display name to pre-fill the signup form (404 only).
		name_hint: Option<String>,
	},
}

/// Coordinates the auth endpoints and owns the persisted token pair.
pub struct SessionManager {
	store: Arc<dyn SessionStore>,
	transport: Arc<dyn Transport>,
	refresh_guard: AsyncMutex<()>,
	/// Shared counters for refresh outcomes.
	pub refresh_metrics: Arc<RefreshMetrics>,
}
impl SessionManager {
	/// Creates a manager over the provided store and bare transport.
	///
	/// The transport must be handed in directly, not wrapped by
	/// [`crate::client::ApiClient`]; the manager relies on its calls being
	/// unintercepted.
	pub fn new(store: Arc<dyn SessionStore>, transport: Arc<dyn Transport>) -> Self {
		Self {
			store,
			transport,
			refresh_guard: AsyncMutex::new(()),
			refresh_metrics: Default::default(),
		}
	}

	/// Exchanges a provider idToken for a session.
	///
	/// Persists the returned pair on success. 404/409 are not errors; they
	/// surface as [`LoginOutcome::NeedsSignup`] with no store mutation. 400 and
	/// 401 are rethrown ([`Error::Validation`] / [`Error::TokenRejected`])
	/// because they need distinct user-facing messaging upstream.
	pub async fn login(
		&self,
		id_token: &TokenSecret,
		provider: Provider,
		apple_user: Option<AppleUser>,
	) -> Result<LoginOutcome> {
		const KIND: FlowKind = FlowKind::Login;

		let span = FlowSpan::new(KIND, "login");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let body = api::to_body(&LoginRequest {
					id_token: id_token.clone(),
					provider,
					apple_user_payload: apple_user
						.map(|name| crate::api::AppleUserPayload { name }),
				})?;
				let response =
					self.transport.send(ApiRequest::json(Method::Post, "/auth/login", body)).await?;

				match api::classify_login(response.status, &response.bytes)? {
					LoginClassification::Success(grant) => {
						let pair = TokenPair::from(grant);

						store::save_pair(self.store.as_ref(), &pair).await?;

						Ok(LoginOutcome::Registered(pair))
					},
					LoginClassification::NotRegistered { name_hint } =>
						Ok(LoginOutcome::NeedsSignup { name_hint }),
					LoginClassification::Conflict =>
						Ok(LoginOutcome::NeedsSignup { name_hint: None }),
					LoginClassification::ValidationError { message } =>
						Err(Error::Validation { reason: message }),
					LoginClassification::TokenInvalid { message } =>
						Err(Error::TokenRejected { reason: message }),
					LoginClassification::Other { status, code, message } =>
						Err(Error::Api { status, code, message }),
				}
			})
			.await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}

	/// Registers a new account and persists the issued pair.
	///
	/// Errors propagate untouched; a 409 "already registered" surfaces as
	/// [`Error::Api`] with status 409 and the caller is expected to recover by
	/// falling back to [`SessionManager::login`].
	pub async fn signup(&self, request: &SignupRequest) -> Result<TokenPair> {
		const KIND: FlowKind = FlowKind::Signup;

		let span = FlowSpan::new(KIND, "signup");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let body = api::to_body(request)?;
				let response = self
					.transport
					.send(ApiRequest::json(Method::Post, "/auth/signup", body))
					.await?;

				if !response.is_success() {
					return Err(api::api_error(response.status, &response.bytes));
				}

				let pair = Self::grant_from(response.status, &response.bytes)?;

				store::save_pair(self.store.as_ref(), &pair).await?;

				Ok(pair)
			})
			.await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}

	/// Exchanges the stored refresh token for a new pair, single-flight.
	///
	/// `observed_access` is the access token the caller last read. When the
	/// stored token already differs once the guard is acquired, another caller
	/// completed the rotation and the current pair is returned without a
	/// network call; this is what bounds N concurrent refreshes to one backend
	/// hit. Passing `None` always rotates.
	///
	/// Fails fast with [`Error::MissingRefreshToken`] when no refresh token is
	/// stored. On failure the store is left untouched; the caller decides
	/// whether to log out.
	pub async fn refresh(&self, observed_access: Option<&str>) -> Result<TokenPair> {
		const KIND: FlowKind = FlowKind::Refresh;

		let span = FlowSpan::new(KIND, "refresh");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);
		self.refresh_metrics.record_attempt();

		let result = span
			.instrument(async move {
				let _singleflight = self.refresh_guard.lock().await;
				let current = store::load_pair(self.store.as_ref()).await.map_err(|err| {
					self.refresh_metrics.record_failure();
					Error::from(err)
				})?;

				// Another caller may have rotated the pair while we waited on the guard.
				let rotated = current.as_ref().filter(|pair| {
					observed_access.is_some_and(|observed| pair.access_token.expose() != observed)
				});

				if let Some(pair) = rotated {
					self.refresh_metrics.record_success();

					return Ok(pair.clone());
				}

				let refresh_token = match self
					.store
					.get(StoreKey::RefreshToken)
					.await
					.map_err(|err| {
						self.refresh_metrics.record_failure();
						Error::from(err)
					})? {
					Some(token) if !token.is_empty() => token,
					_ => {
						self.refresh_metrics.record_failure();

						return Err(Error::MissingRefreshToken);
					},
				};
				let body = api::to_body(&RefreshRequest { refresh_token })?;
				let response = self
					.transport
					.send(ApiRequest::json(Method::Post, "/auth/refresh", body))
					.await
					.map_err(|err| {
						self.refresh_metrics.record_failure();
						Error::from(err)
					})?;

				if !response.is_success() {
					self.refresh_metrics.record_failure();

					return Err(api::api_error(response.status, &response.bytes));
				}

				let pair = Self::grant_from(response.status, &response.bytes).inspect_err(|_| {
					self.refresh_metrics.record_failure();
				})?;

				store::save_pair(self.store.as_ref(), &pair).await.map_err(|err| {
					self.refresh_metrics.record_failure();
					Error::from(err)
				})?;
				self.refresh_metrics.record_success();

				Ok(pair)
			})
			.await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}

	/// Tears the session down, locally always and server-side best-effort.
	///
	/// With no stored refresh token this clears local state and returns
	/// without any HTTP call. Otherwise the logout endpoint is notified on the
	/// bare transport and both slots are cleared regardless of the server
	/// outcome; local logout is never blocked by a network failure.
	pub async fn logout(&self) -> Result<()> {
		const KIND: FlowKind = FlowKind::Logout;

		let span = FlowSpan::new(KIND, "logout");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let refresh_token =
					self.store.get(StoreKey::RefreshToken).await?.filter(|token| !token.is_empty());
				let Some(refresh_token) = refresh_token else {
					store::clear_pair(self.store.as_ref()).await?;

					return Ok(());
				};
				let server_result = async {
					let body = api::to_body(&LogoutRequest { refresh_token })?;
					let response = self
						.transport
						.send(ApiRequest::json(Method::Post, "/auth/logout", body))
						.await?;

					if !response.is_success() {
						return Err(api::api_error(response.status, &response.bytes));
					}

					Ok::<_, Error>(())
				}
				.await;

				if let Err(err) = server_result {
					#[cfg(feature = "tracing")]
					tracing::warn!("Logout call failed; clearing the local session anyway: {err}");
					#[cfg(not(feature = "tracing"))]
					let _ = err;
				}

				store::clear_pair(self.store.as_ref()).await?;

				Ok(())
			})
			.await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}

	/// Reads the stored access token, if any.
	pub async fn access_token(&self) -> Result<Option<String>> {
		Ok(self.store.get(StoreKey::AccessToken).await?)
	}

	/// Reads the stored refresh token, if any.
	pub async fn refresh_token(&self) -> Result<Option<String>> {
		Ok(self.store.get(StoreKey::RefreshToken).await?)
	}

	/// Returns `true` iff both tokens are present and non-empty.
	pub async fn is_authenticated(&self) -> Result<bool> {
		Ok(store::load_pair(self.store.as_ref()).await?.is_some())
	}

	fn grant_from(status: u16, bytes: &[u8]) -> Result<TokenPair> {
		let envelope = Envelope::<TokenGrant>::parse(status, bytes)?;
		let grant = envelope.data.ok_or(Error::Api {
			status,
			code: envelope.code,
			message: "Response is missing token data".into(),
		})?;

		Ok(TokenPair::from(grant))
	}
}
impl Debug for SessionManager {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SessionManager").finish_non_exhaustive()
	}
}
