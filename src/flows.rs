//! Social-login orchestration: one provider exchange, one backend login, one
//! navigation verdict, all under a single deadline.

// std
use std::time::Duration as StdDuration;
// self
use crate::{
	_prelude::*,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	provider::{IdentityExchange, Provider},
	session::{LoginOutcome, SessionManager},
	token::TokenSecret,
};

/// Navigation verdict produced by [`LoginFlow::kickoff`].
#[derive(Clone, Debug)]
pub enum Kickoff {
	/// Session established; route to the home screen.
	Home {
		/// Identity assertion that completed the exchange.
		id_token: TokenSecret,
	},
	/// Identity is valid but unregistered; route to the signup form.
	Signup {
		/// Identity assertion to resubmit with the signup form.
		id_token: TokenSecret,
		/// Provider that issued the assertion.
		provider: Provider,
		/// Optional display name to pre-fill the signup form.
		name_hint: Option<String>,
	},
}

/// Runs the social login kickoff against a provider adapter.
pub struct LoginFlow {
	session: Arc<SessionManager>,
	deadline: StdDuration,
}
impl LoginFlow {
	/// Default kickoff deadline.
	pub const DEFAULT_DEADLINE: StdDuration = StdDuration::from_secs(60);

	/// Creates a flow over the shared session manager with the default deadline.
	pub fn new(session: Arc<SessionManager>) -> Self {
		Self { session, deadline: Self::DEFAULT_DEADLINE }
	}

	/// Overrides the kickoff deadline.
	pub fn with_deadline(mut self, deadline: StdDuration) -> Self {
		self.deadline = deadline;

		self
	}

	/// Exchanges an identity with the provider, logs in, and maps the outcome
	/// to a navigation verdict.
	///
	/// Provider failures (user cancellation, SDK errors) propagate unmodified;
	/// they are terminal for the attempt. A 401 from the backend surfaces as
	/// [`Error::TokenRejected`], distinct from generic failures. The deadline
	/// drops the in-flight future on elapse, which aborts a pending backend
	/// call; a provider SDK that does not observe cancellation may still run
	/// to completion, but its result is discarded.
	pub async fn kickoff(&self, adapter: &dyn IdentityExchange) -> Result<Kickoff> {
		const KIND: FlowKind = FlowKind::Kickoff;

		let span = FlowSpan::new(KIND, "kickoff");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				match tokio::time::timeout(self.deadline, self.kickoff_inner(adapter)).await {
					Ok(result) => result,
					Err(_) => Err(Error::Timeout { seconds: self.deadline.as_secs() }),
				}
			})
			.await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}

	async fn kickoff_inner(&self, adapter: &dyn IdentityExchange) -> Result<Kickoff> {
		let identity = adapter.exchange().await?;
		// The Apple name grant is single-use: it is moved out of the exchange
		// result and never stored anywhere else.
		let apple_user = identity.apple_user;
		let outcome =
			self.session.login(&identity.id_token, identity.provider, apple_user).await?;

		match outcome {
			LoginOutcome::Registered(_) => Ok(Kickoff::Home { id_token: identity.id_token }),
			LoginOutcome::NeedsSignup { name_hint } => Ok(Kickoff::Signup {
				id_token: identity.id_token,
				provider: identity.provider,
				name_hint,
			}),
		}
	}
}
impl Debug for LoginFlow {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("LoginFlow").field("deadline", &self.deadline).finish_non_exhaustive()
	}
}
