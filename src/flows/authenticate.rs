//! Callback handling: state check, code exchange, profile load, and application verify.

// self
use crate::{
	_prelude::*,
	flows::FeideConnectStrategy,
	http::TokenHttpClient,
	obs::{self, FlowKind},
	oauth::TransportErrorMapper,
	strategy::{AuthenticateOutcome, AuthenticateRequest, Verify},
};

const ACCESS_DENIED: &str = "access_denied";
const MISSING_SESSION: &str = "Unable to verify authorization request state.";
const STATE_MISMATCH: &str = "Invalid authorization request state.";
const VERIFY_REJECTED: &str = "User was not accepted by the application.";

impl<V, C, M> FeideConnectStrategy<V, C, M>
where
	V: Verify,
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Runs one login step.
	///
	/// Without a `code` (and without an `error`) the request starts a new login and the outcome
	/// is [`AuthenticateOutcome::Redirect`]. With a `code` the stored session must be present and
	/// its `state` must match before the code is exchanged; the exchanged tokens and the loaded
	/// profile are then handed to the [`Verify`] callback.
	///
	/// A provider `access_denied` answer and verify rejections are failures, not errors. Any
	/// other provider error, exchange or profile failure, or verify error is returned as `Err`.
	pub async fn authenticate_request(
		&self,
		request: AuthenticateRequest,
	) -> Result<AuthenticateOutcome<V::User>> {
		obs::observe(FlowKind::Authenticate, "authenticate", self.run_authenticate(request)).await
	}

	async fn run_authenticate(
		&self,
		request: AuthenticateRequest,
	) -> Result<AuthenticateOutcome<V::User>> {
		let AuthenticateRequest {
			code,
			state,
			error,
			error_description,
			session,
			scope,
			callback_url,
		} = request;

		if let Some(error) = error {
			if error == ACCESS_DENIED {
				return Ok(AuthenticateOutcome::fail(
					error_description.unwrap_or_else(|| "User denied the authorization request.".into()),
				));
			}

			return Err(Error::Authorization { error, description: error_description });
		}

		let Some(code) = code else {
			return Ok(AuthenticateOutcome::Redirect(self.start_authorization(scope, callback_url)?));
		};
		let Some(session) = session else {
			return Ok(AuthenticateOutcome::fail(MISSING_SESSION));
		};

		if !state.as_deref().is_some_and(|state| session.state_matches(state)) {
			return Ok(AuthenticateOutcome::fail(STATE_MISMATCH));
		}

		let grant = self.exchange_code(&session, &code).await?;
		let profile = self.fetch_profile(&grant.access_token).await?;
		let verified = self
			.verify
			.verify(grant.access_token, grant.refresh_token, profile.clone())
			.await
			.map_err(|source| Error::Verify { source })?;

		Ok(match verified {
			Some(user) => AuthenticateOutcome::Success { user, profile },
			None => AuthenticateOutcome::fail(VERIFY_REJECTED),
		})
	}
}
