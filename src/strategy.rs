//! Host framework plugin contract.
//!
//! A host authentication framework routes login requests to a [`Strategy`] by its
//! [`name`](Strategy::name). The strategy either asks the host to redirect the user to the
//! provider, or handles the provider's callback and reports success or failure. Applications
//! decide who the user is through a [`Verify`] callback that receives the issued tokens and
//! the normalized [`Profile`].

// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	error::BoxError,
	flows::AuthorizationSession,
	profile::Profile,
};

/// Boxed future returned by [`Strategy`] operations.
pub type StrategyFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + 'a + Send>>;

/// Boxed future returned by [`Verify`] callbacks.
pub type VerifyFuture<T> = Pin<Box<dyn Future<Output = Result<Option<T>, BoxError>> + Send>>;

/// Capability set a host framework needs from a login strategy.
pub trait Strategy
where
	Self: Send + Sync,
{
	/// Application user type produced by a successful login.
	type User: Send;

	/// Name the host uses to route requests to this strategy.
	fn name(&self) -> &str;

	/// Handles one step of the login: start the redirect or consume the callback.
	fn authenticate<'a>(
		&'a self,
		request: AuthenticateRequest,
	) -> StrategyFuture<'a, AuthenticateOutcome<Self::User>>;

	/// Loads and normalizes the user's profile with an access token.
	fn user_profile<'a>(&'a self, access_token: &'a TokenSecret) -> StrategyFuture<'a, Profile>;
}

/// Application callback deciding which user (if any) the provider identity maps to.
///
/// Return `Ok(Some(user))` to log the user in, `Ok(None)` to reject the credentials, and
/// `Err(_)` when the lookup itself failed. Any `Fn(TokenSecret, Option<TokenSecret>, Profile)`
/// closure returning a matching future implements this trait.
pub trait Verify
where
	Self: Send + Sync,
{
	/// Application user type.
	type User: Send;

	/// Maps tokens and profile to an application user.
	fn verify(
		&self,
		access_token: TokenSecret,
		refresh_token: Option<TokenSecret>,
		profile: Profile,
	) -> VerifyFuture<Self::User>;
}
impl<F, Fut, U> Verify for F
where
	F: Send + Sync + Fn(TokenSecret, Option<TokenSecret>, Profile) -> Fut,
	Fut: 'static + Send + Future<Output = Result<Option<U>, BoxError>>,
	U: Send,
{
	type User = U;

	fn verify(
		&self,
		access_token: TokenSecret,
		refresh_token: Option<TokenSecret>,
		profile: Profile,
	) -> VerifyFuture<U> {
		Box::pin((self)(access_token, refresh_token, profile))
	}
}

/// Inputs for a single [`Strategy::authenticate`] call.
///
/// Hosts fill the callback parameters from the redirect's query string and hand back the
/// [`AuthorizationSession`] they stored under the strategy's session key.
#[derive(Clone, Debug, Default)]
pub struct AuthenticateRequest {
	/// Authorization code returned by the provider.
	pub code: Option<String>,
	/// State echoed back by the provider.
	pub state: Option<String>,
	/// OAuth `error` parameter.
	pub error: Option<String>,
	/// OAuth `error_description` parameter.
	pub error_description: Option<String>,
	/// Pending session stored when the redirect was issued.
	pub session: Option<AuthorizationSession>,
	/// Scopes to request instead of the configured default.
	pub scope: Option<Vec<String>>,
	/// Redirect URI to use instead of the configured callback URL.
	pub callback_url: Option<Url>,
}
impl AuthenticateRequest {
	/// Builds a request from the callback URL the provider redirected to.
	///
	/// Only `code`, `state`, `error`, and `error_description` are read; other parameters are
	/// ignored.
	pub fn from_callback(url: &Url) -> Self {
		let mut request = Self::default();

		for (key, value) in url.query_pairs() {
			let slot = match key.as_ref() {
				"code" => &mut request.code,
				"state" => &mut request.state,
				"error" => &mut request.error,
				"error_description" => &mut request.error_description,
				_ => continue,
			};

			*slot = Some(value.into_owned());
		}

		request
	}

	/// Attaches the session the host stored for this login attempt.
	pub fn with_session(mut self, session: Option<AuthorizationSession>) -> Self {
		self.session = session;

		self
	}

	/// Overrides the requested scopes.
	pub fn with_scope<I, S>(mut self, scope: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.scope = Some(scope.into_iter().map(Into::into).collect());

		self
	}

	/// Overrides the redirect URI.
	pub fn with_callback_url(mut self, url: Url) -> Self {
		self.callback_url = Some(url);

		self
	}
}

/// Result of a [`Strategy::authenticate`] step.
#[derive(Debug)]
pub enum AuthenticateOutcome<U> {
	/// Send the user to `session.authorize_url` after storing the session.
	Redirect(AuthorizationSession),
	/// Login succeeded.
	Success {
		/// User returned by the verify callback.
		user: U,
		/// Profile the user was verified with.
		profile: Profile,
	},
	/// Login was rejected without an internal error.
	Fail {
		/// Human-readable reason.
		message: String,
	},
}
impl<U> AuthenticateOutcome<U> {
	/// Returns the user for successful outcomes.
	pub fn user(&self) -> Option<&U> {
		match self {
			AuthenticateOutcome::Success { user, .. } => Some(user),
			_ => None,
		}
	}

	pub(crate) fn fail(message: impl Into<String>) -> Self {
		AuthenticateOutcome::Fail { message: message.into() }
	}
}
