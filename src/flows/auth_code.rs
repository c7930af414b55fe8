//! Authorization Code flow: building the authorize redirect and exchanging the returned code.

mod session;

pub use session::*;

// self
use crate::{
	_prelude::*,
	auth::TokenGrant,
	flows::{FeideConnectStrategy, common},
	http::TokenHttpClient,
	obs::{self, FlowKind},
	oauth::TransportErrorMapper,
};

impl<V, C, M> FeideConnectStrategy<V, C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Builds a new authorization session with a random `state` (and PKCE challenge when
	/// enabled).
	///
	/// `scope` replaces the configured default scopes when provided; an empty list omits the
	/// `scope` parameter. `redirect_uri` replaces the configured callback URL. Hosts store the
	/// returned session under [`session_key`](Self::session_key) and redirect the user to
	/// [`AuthorizationSession::authorize_url`].
	pub fn start_authorization(
		&self,
		scope: Option<Vec<String>>,
		redirect_uri: Option<Url>,
	) -> Result<AuthorizationSession> {
		obs::observe_sync(FlowKind::Authorize, "start_authorization", || {
			let redirect_uri = common::resolve_redirect(&self.config, redirect_uri)?;
			let scope = scope.unwrap_or_else(|| self.config.scope.clone());

			Ok(session::build_session(&self.config, scope, redirect_uri))
		})
	}

	/// Exchanges the authorization code returned to the redirect handler.
	///
	/// The caller must have already checked the returned `state` against the session. The
	/// session's redirect URI and PKCE verifier are replayed to the token endpoint.
	pub async fn exchange_code(
		&self,
		session: &AuthorizationSession,
		code: &str,
	) -> Result<TokenGrant> {
		obs::observe(
			FlowKind::Exchange,
			"exchange_code",
			self.client.exchange_code(code, session.pkce_verifier(), &session.redirect_uri),
		)
		.await
	}
}
