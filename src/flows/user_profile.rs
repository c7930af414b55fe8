//! User-info read and profile normalization.

// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	flows::FeideConnectStrategy,
	http::TokenHttpClient,
	obs::{self, FlowKind},
	oauth::TransportErrorMapper,
	profile::Profile,
};

impl<V, C, M> FeideConnectStrategy<V, C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Fetches the user-info document with `access_token` and normalizes it into a [`Profile`].
	///
	/// Transport failures and non-2xx answers surface as errors before any parsing happens.
	/// The request carries the configured custom headers (`User-Agent` included).
	pub async fn fetch_profile(&self, access_token: &TokenSecret) -> Result<Profile> {
		obs::observe(FlowKind::UserProfile, "fetch_profile", async {
			let response = self
				.client
				.get(&self.config.endpoints.user_info, access_token)
				.await?
				.error_for_status()?;

			Ok(Profile::from_body(response.body)?)
		})
		.await
	}
}
