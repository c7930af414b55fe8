//! The Feide Connect strategy and its flows.

pub mod auth_code;
pub mod common;

mod authenticate;
mod user_profile;

pub use auth_code::*;

// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	config::{ProviderConfig, StrategyOptions},
	http::TokenHttpClient,
	oauth::{OAuth2Client, TransportErrorMapper},
	profile::Profile,
	strategy::{AuthenticateOutcome, AuthenticateRequest, Strategy, StrategyFuture, Verify},
};
#[cfg(feature = "reqwest")]
use crate::{http::ReqwestHttpClient, oauth::ReqwestTransportErrorMapper};

#[cfg(feature = "reqwest")]
/// Strategy specialized for the crate's default reqwest transport stack.
pub type ReqwestStrategy<V> =
	FeideConnectStrategy<V, ReqwestHttpClient, ReqwestTransportErrorMapper>;

/// Feide Connect login strategy.
///
/// The strategy owns the resolved [`ProviderConfig`], the generic [`OAuth2Client`] used for
/// every provider request, and the application's [`Verify`] callback. It is immutable after
/// construction and can be shared across concurrent requests.
pub struct FeideConnectStrategy<V, C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	config: ProviderConfig,
	client: OAuth2Client<C, M>,
	verify: V,
}
impl<V, C, M> FeideConnectStrategy<V, C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Name hosts use to route requests to this strategy.
	pub const NAME: &'static str = "feideconnect";

	/// Resolves `options` and builds a strategy on top of the caller-provided transport +
	/// mapper pair.
	pub fn with_http_client(
		options: StrategyOptions,
		verify: V,
		http_client: impl Into<Arc<C>>,
		mapper: impl Into<Arc<M>>,
	) -> Result<Self> {
		let config = options.resolve()?;
		let client = OAuth2Client::from_config(&config, http_client, mapper)?;

		Ok(Self { config, client, verify })
	}

	/// Resolved configuration.
	pub fn config(&self) -> &ProviderConfig {
		&self.config
	}

	/// Key under which hosts store the pending [`AuthorizationSession`].
	pub fn session_key(&self) -> &str {
		&self.config.session_key
	}

	/// User-info endpoint the profile is read from.
	pub fn profile_url(&self) -> &Url {
		&self.config.endpoints.user_info
	}

	/// Generic OAuth 2.0 client backing this strategy.
	pub fn oauth_client(&self) -> &OAuth2Client<C, M> {
		&self.client
	}
}
#[cfg(feature = "reqwest")]
impl<V> FeideConnectStrategy<V, ReqwestHttpClient, ReqwestTransportErrorMapper> {
	/// Creates a new strategy from `options` and the application's verify callback.
	///
	/// The strategy provisions its own reqwest-backed transport so callers do not need to
	/// pass HTTP handles explicitly.
	pub fn new(options: StrategyOptions, verify: V) -> Result<Self> {
		let config = options.resolve()?;
		let client = OAuth2Client::reqwest(&config)?;

		Ok(Self { config, client, verify })
	}
}
impl<V, C, M> Strategy for FeideConnectStrategy<V, C, M>
where
	V: Verify,
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	type User = V::User;

	fn name(&self) -> &str {
		Self::NAME
	}

	fn authenticate<'a>(
		&'a self,
		request: AuthenticateRequest,
	) -> StrategyFuture<'a, AuthenticateOutcome<Self::User>> {
		Box::pin(self.authenticate_request(request))
	}

	fn user_profile<'a>(&'a self, access_token: &'a TokenSecret) -> StrategyFuture<'a, Profile> {
		Box::pin(self.fetch_profile(access_token))
	}
}
impl<V, C, M> Debug for FeideConnectStrategy<V, C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("FeideConnectStrategy")
			.field("name", &Self::NAME)
			.field("config", &self.config)
			.field("client", &self.client)
			.finish()
	}
}
