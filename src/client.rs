//! Authenticated API client: proactive refresh before dispatch, one reactive
//! refresh-and-retry after a 401.
//!
//! Every outbound request except the session manager's own calls flows through
//! [`ApiClient::send`]. The pipeline recovers from exactly one class of failure
//! automatically (a stale-token 401) by refreshing and retrying once; every
//! other failure is surfaced unmodified. Forced-logout navigation is NOT owned
//! here: when a reactive refresh fails, the host-bound session-expired hook
//! fires and the original 401 propagates.

// self
use crate::{
	_prelude::*,
	api::{self, Envelope, PushTokenRequest},
	http::{ApiBody, ApiRequest, ApiResponse, ImagePart, Method, Transport},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	session::SessionManager,
	token::inspector,
};

/// Host callback fired when a reactive refresh fails and the session is gone.
pub type SessionExpiredHook = Arc<dyn Fn() + Send + Sync>;

/// Authenticated transport wrapper executing the interception pipeline.
pub struct ApiClient {
	session: Arc<SessionManager>,
	transport: Arc<dyn Transport>,
	on_session_expired: Option<SessionExpiredHook>,
}
impl ApiClient {
	/// Creates a client over the shared session manager and transport.
	pub fn new(session: Arc<SessionManager>, transport: Arc<dyn Transport>) -> Self {
		Self { session, transport, on_session_expired: None }
	}

	/// Binds the host callback fired when a reactive refresh fails.
	///
	/// The crate deliberately does not own "navigate to login"; the host
	/// application decides what an expired session means for its UI.
	pub fn on_session_expired(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
		self.on_session_expired = Some(Arc::new(hook));

		self
	}

	/// Sends a request through the interception pipeline.
	///
	/// Request phase: a stored access token within the refresh window triggers
	/// a proactive [`SessionManager::refresh`]; a refresh failure falls back to
	/// the stale token optimistically instead of blocking the request. Response
	/// phase: a 401 triggers one refresh-and-retry of the original request; a
	/// second 401 propagates without another refresh attempt.
	pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
		const KIND: FlowKind = FlowKind::Request;

		let span = FlowSpan::new(KIND, "send");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span.instrument(self.send_inner(request)).await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}

	async fn send_inner(&self, mut request: ApiRequest) -> Result<ApiResponse> {
		let sent_token = match self.session.access_token().await? {
			Some(token) if inspector::should_refresh_now(&token) => {
				match self.session.refresh(Some(&token)).await {
					Ok(pair) => Some(pair.access_token.expose().to_owned()),
					// Optimistic: the stale token may still be accepted; the
					// response phase handles the 401 if it is not.
					Err(_) => Some(token),
				}
			},
			Some(token) => Some(token),
			None => None,
		};

		request.bearer = sent_token.clone();

		let response = self.transport.send(request.clone()).await?;

		if response.status != 401 {
			return Self::classify(response);
		}

		match self.session.refresh(sent_token.as_deref()).await {
			Ok(pair) => {
				let mut retry = request;

				retry.bearer = Some(pair.access_token.expose().to_owned());

				// Single retry; a 401 here falls through to the caller.
				Self::classify(self.transport.send(retry).await?)
			},
			Err(_) => {
				if let Some(hook) = &self.on_session_expired {
					hook();
				}

				Self::classify(response)
			},
		}
	}

	fn classify(response: ApiResponse) -> Result<ApiResponse> {
		if response.is_success() {
			Ok(response)
		} else {
			Err(api::api_error(response.status, &response.bytes))
		}
	}

	async fn send_for_data(&self, request: ApiRequest) -> Result<serde_json::Value> {
		let response = self.send(request).await?;
		let envelope = Envelope::<serde_json::Value>::parse(response.status, &response.bytes)?;

		Ok(envelope.data.unwrap_or(serde_json::Value::Null))
	}

	/// Fetches the authenticated user's profile page.
	pub async fn get_my_page(&self) -> Result<serde_json::Value> {
		self.send_for_data(ApiRequest::new(Method::Get, "/users/mypage")).await
	}

	/// Updates the authenticated user's profile page.
	pub async fn update_my_page(&self, profile: serde_json::Value) -> Result<serde_json::Value> {
		self.send_for_data(ApiRequest::json(Method::Put, "/users/mypage", profile)).await
	}

	/// Deletes the authenticated user's account.
	pub async fn delete_account(&self) -> Result<()> {
		self.send(ApiRequest::new(Method::Delete, "/users")).await.map(|_| ())
	}

	/// Lists registered medications.
	pub async fn list_medications(&self) -> Result<serde_json::Value> {
		self.send_for_data(ApiRequest::new(Method::Get, "/medications")).await
	}

	/// Registers a medication: a `request` JSON part plus an `image` file part.
	pub async fn create_medication(
		&self,
		request: serde_json::Value,
		image: ImagePart,
	) -> Result<serde_json::Value> {
		let api_request = ApiRequest {
			method: Method::Post,
			path: "/medications".into(),
			bearer: None,
			body: ApiBody::Multipart { request, image },
		};

		self.send_for_data(api_request).await
	}

	/// Removes a registered medication.
	pub async fn delete_medication(&self, id: u64) -> Result<()> {
		self.send(ApiRequest::new(Method::Delete, format!("/medications/{id}"))).await.map(|_| ())
	}

	/// Registers a device push token. Failures are surfaced but callers treat
	/// them as non-fatal.
	pub async fn register_push_token(&self, token: &str, platform: &str) -> Result<()> {
		let body = api::to_body(&PushTokenRequest {
			token: token.to_owned(),
			platform: platform.to_owned(),
		})?;

		self.send(ApiRequest::json(Method::Post, "/push-tokens", body)).await.map(|_| ())
	}

	/// Removes a device push token. Failures are surfaced but callers treat
	/// them as non-fatal.
	pub async fn remove_push_token(&self, token: &str, platform: &str) -> Result<()> {
		let body = api::to_body(&PushTokenRequest {
			token: token.to_owned(),
			platform: platform.to_owned(),
		})?;

		self.send(ApiRequest::json(Method::Delete, "/push-tokens", body)).await.map(|_| ())
	}
}
impl Debug for ApiClient {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ApiClient")
			.field("session", &self.session)
			.field("hook_bound", &self.on_session_expired.is_some())
			.finish_non_exhaustive()
	}
}
