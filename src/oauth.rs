//! Generic OAuth 2.0 client capability the strategy composes.
//!
//! [`OAuth2Client`] wraps the `oauth2` crate's [`BasicClient`] together with a
//! [`TokenHttpClient`] transport and a [`TransportErrorMapper`]. It knows nothing about
//! Feide Connect: it exchanges authorization codes and performs bearer-authenticated reads,
//! attaching the configured custom headers to every request.

pub use oauth2;

// std
use std::borrow::Cow;
// crates.io
use oauth2::{
	AsyncHttpClient, AuthType, AuthUrl, AuthorizationCode, ClientId, ClientSecret,
	EndpointNotSet, EndpointSet, HttpClientError, PkceCodeVerifier, RedirectUrl,
	RequestTokenError, TokenResponse, TokenUrl,
	basic::{BasicClient, BasicErrorResponse, BasicErrorResponseType, BasicRequestTokenError},
	http::{
		HeaderMap, Method, Request,
		header::{ACCEPT, AUTHORIZATION},
	},
};
// self
use crate::{
	_prelude::*,
	auth::{TokenGrant, TokenSecret},
	config::{ClientAuthMethod, ProviderConfig},
	error::{ConfigError, Endpoint, TransientError, TransportError},
	http::{HeaderedHandle, ResponseMetadata, ResponseMetadataSlot, TokenHttpClient},
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestHttpClient;

type ConfiguredBasicClient =
	BasicClient<EndpointSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

const BODY_PREVIEW_LIMIT: usize = 256;

/// Maps HTTP transport failures into strategy [`Error`] values.
pub trait TransportErrorMapper<E>
where
	Self: 'static + Send + Sync,
	E: 'static + Send + Sync + StdError,
{
	/// Converts an [`HttpClientError`] emitted by the transport into a strategy error.
	fn map_transport_error(
		&self,
		endpoint: Endpoint,
		metadata: Option<&ResponseMetadata>,
		error: HttpClientError<E>,
	) -> Error;
}

/// Default mapper for reqwest-backed transports.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransportErrorMapper;
#[cfg(feature = "reqwest")]
impl TransportErrorMapper<ReqwestError> for ReqwestTransportErrorMapper {
	fn map_transport_error(
		&self,
		endpoint: Endpoint,
		meta: Option<&ResponseMetadata>,
		err: HttpClientError<ReqwestError>,
	) -> Error {
		match err {
			HttpClientError::Reqwest(inner) => map_reqwest_error(endpoint, meta, *inner),
			HttpClientError::Http(inner) => ConfigError::from(inner).into(),
			HttpClientError::Io(inner) => TransportError::Io(inner).into(),
			HttpClientError::Other(message) => map_generic_transport_error(endpoint, meta, message),
			_ => map_generic_transport_error(endpoint, meta, "unknown transport failure"),
		}
	}
}

/// Status and body returned by a protected resource read.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResourceResponse {
	/// HTTP status code.
	pub status: u16,
	/// Response body decoded as UTF-8 (invalid sequences replaced).
	pub body: String,
}
impl ResourceResponse {
	/// Returns `true` for 2xx statuses.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}

	/// Converts non-2xx responses into [`Error::ResourceStatus`].
	pub fn error_for_status(self) -> Result<Self> {
		if self.is_success() {
			Ok(self)
		} else {
			let body_preview =
				if self.body.is_empty() { None } else { Some(truncate_preview(&self.body)) };

			Err(Error::ResourceStatus { status: self.status, body_preview })
		}
	}
}

/// Provider-agnostic OAuth 2.0 client: code exchange plus bearer-authenticated reads.
pub struct OAuth2Client<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	oauth_client: ConfiguredBasicClient,
	http_client: Arc<C>,
	error_mapper: Arc<M>,
	headers: Arc<HeaderMap>,
}
impl<C, M> OAuth2Client<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Configures the client from resolved provider settings.
	pub fn from_config(
		config: &ProviderConfig,
		http_client: impl Into<Arc<C>>,
		error_mapper: impl Into<Arc<M>>,
	) -> Result<Self, ConfigError> {
		let auth_url = AuthUrl::new(config.endpoints.authorization.to_string())
			.map_err(|source| ConfigError::InvalidEndpoint { endpoint: "authorization", source })?;
		let token_url = TokenUrl::new(config.endpoints.token.to_string())
			.map_err(|source| ConfigError::InvalidEndpoint { endpoint: "token", source })?;
		let mut oauth_client = BasicClient::new(ClientId::new(config.client_id.clone()))
			.set_auth_uri(auth_url)
			.set_token_uri(token_url);

		if let Some(secret) = config.client_secret.as_ref() {
			oauth_client = oauth_client.set_client_secret(ClientSecret::new(secret.expose().into()));
		}
		if matches!(config.client_auth_method, ClientAuthMethod::ClientSecretPost) {
			oauth_client = oauth_client.set_auth_type(AuthType::RequestBody);
		}

		Ok(Self {
			oauth_client,
			http_client: http_client.into(),
			error_mapper: error_mapper.into(),
			headers: Arc::new(config.header_map()?),
		})
	}

	/// Exchanges an authorization code at the token endpoint.
	pub async fn exchange_code(
		&self,
		code: &str,
		pkce_verifier: Option<&TokenSecret>,
		redirect_uri: &Url,
	) -> Result<TokenGrant> {
		let meta = ResponseMetadataSlot::default();
		let handle = self.handle(meta.clone());
		let redirect_url = RedirectUrl::new(redirect_uri.to_string())
			.map_err(|source| ConfigError::InvalidRedirect { source })?;
		let mut request = self
			.oauth_client
			.exchange_code(AuthorizationCode::new(code.to_owned()))
			.set_redirect_uri(Cow::Owned(redirect_url));

		if let Some(verifier) = pkce_verifier {
			request = request.set_pkce_verifier(PkceCodeVerifier::new(verifier.expose().into()));
		}

		let response = request
			.request_async(&handle)
			.await
			.map_err(|err| self.map_request_error(meta.take(), err))?;
		let issued_at = OffsetDateTime::now_utc();
		let expires_at = response
			.expires_in()
			.and_then(|expires_in| i64::try_from(expires_in.as_secs()).ok())
			.filter(|secs| *secs > 0)
			.map(|secs| issued_at + Duration::seconds(secs));
		let scope = response
			.scopes()
			.map(|scopes| scopes.iter().map(|scope| scope.to_string()).collect())
			.unwrap_or_default();

		Ok(TokenGrant {
			access_token: TokenSecret::new(response.access_token().secret().as_str()),
			refresh_token: response
				.refresh_token()
				.map(|token| TokenSecret::new(token.secret().as_str())),
			scope,
			issued_at,
			expires_at,
		})
	}

	/// Performs a bearer-authenticated `GET` against a protected resource.
	///
	/// Any HTTP status is returned as-is; use [`ResourceResponse::error_for_status`] to treat
	/// non-2xx answers as failures.
	pub async fn get(&self, url: &Url, access_token: &TokenSecret) -> Result<ResourceResponse> {
		let meta = ResponseMetadataSlot::default();
		let handle = self.handle(meta.clone());
		let request = Request::builder()
			.method(Method::GET)
			.uri(url.as_str())
			.header(AUTHORIZATION, format!("Bearer {}", access_token.expose()))
			.header(ACCEPT, "application/json")
			.body(Vec::new())
			.map_err(ConfigError::from)?;
		let response = handle.call(request).await.map_err(|err| {
			self.error_mapper.map_transport_error(Endpoint::UserInfo, meta.take().as_ref(), err)
		})?;

		Ok(ResourceResponse {
			status: response.status().as_u16(),
			body: String::from_utf8_lossy(response.body()).into_owned(),
		})
	}

	fn handle(&self, slot: ResponseMetadataSlot) -> HeaderedHandle<C> {
		HeaderedHandle::new(self.http_client.with_metadata(slot), self.headers.clone())
	}

	fn map_request_error(
		&self,
		meta: Option<ResponseMetadata>,
		err: BasicRequestTokenError<HttpClientError<C::TransportError>>,
	) -> Error {
		let meta_ref = meta.as_ref();

		match err {
			RequestTokenError::ServerResponse(response) =>
				map_server_response_error(response, meta_ref),
			RequestTokenError::Request(error) =>
				self.error_mapper.map_transport_error(Endpoint::Token, meta_ref, error),
			RequestTokenError::Parse(error, _body) =>
				TransientError::TokenResponseParse { source: error, status: meta_status(meta_ref) }
					.into(),
			RequestTokenError::Other(message) => TransientError::TokenEndpoint {
				message,
				status: meta_status(meta_ref),
				retry_after: meta_retry_after(meta_ref),
			}
			.into(),
		}
	}
}
#[cfg(feature = "reqwest")]
impl OAuth2Client<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	/// Configures a client backed by the crate's default reqwest transport.
	pub fn reqwest(config: &ProviderConfig) -> Result<Self, ConfigError> {
		Self::from_config(config, ReqwestHttpClient::new()?, ReqwestTransportErrorMapper)
	}
}
impl<C, M> Debug for OAuth2Client<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("OAuth2Client")
			.field("client_id", &self.oauth_client.client_id().as_str())
			.field("auth_uri", &self.oauth_client.auth_uri().as_str())
			.field("token_uri", &self.oauth_client.token_uri().as_str())
			.field("headers", &self.headers.len())
			.finish()
	}
}

fn map_server_response_error(
	response: BasicErrorResponse,
	meta: Option<&ResponseMetadata>,
) -> Error {
	let message = match response.error_description() {
		Some(description) => description.clone(),
		None => response.error().as_ref().to_owned(),
	};

	match response.error() {
		BasicErrorResponseType::InvalidGrant => Error::InvalidGrant { reason: message },
		BasicErrorResponseType::InvalidClient | BasicErrorResponseType::UnauthorizedClient =>
			Error::InvalidClient { reason: message },
		BasicErrorResponseType::InvalidScope => Error::InsufficientScope { reason: message },
		_ => TransientError::TokenEndpoint {
			message: format!("OAuth error {}: {message}", response.error().as_ref()),
			status: meta_status(meta),
			retry_after: meta_retry_after(meta),
		}
		.into(),
	}
}

#[cfg(feature = "reqwest")]
fn map_reqwest_error(
	endpoint: Endpoint,
	meta: Option<&ResponseMetadata>,
	err: ReqwestError,
) -> Error {
	if err.is_builder() {
		return ConfigError::from(err).into();
	}
	if err.is_timeout() && matches!(endpoint, Endpoint::Token) {
		return TransientError::TokenEndpoint {
			message: "request timed out".into(),
			status: meta_status(meta).or_else(|| err.status().map(|code| code.as_u16())),
			retry_after: meta_retry_after(meta),
		}
		.into();
	}

	TransportError::network(endpoint, err).into()
}

#[cfg(feature = "reqwest")]
fn map_generic_transport_error(
	endpoint: Endpoint,
	meta: Option<&ResponseMetadata>,
	message: impl Display,
) -> Error {
	match endpoint {
		Endpoint::Token => TransientError::TokenEndpoint {
			message: format!("HTTP client error: {message}"),
			status: meta_status(meta),
			retry_after: meta_retry_after(meta),
		}
		.into(),
		Endpoint::UserInfo =>
			TransportError::network(endpoint, std::io::Error::other(message.to_string())).into(),
	}
}

fn meta_status(meta: Option<&ResponseMetadata>) -> Option<u16> {
	meta.and_then(|value| value.status)
}

fn meta_retry_after(meta: Option<&ResponseMetadata>) -> Option<Duration> {
	meta.and_then(|value| value.retry_after)
}

fn truncate_preview(body: &str) -> String {
	if body.chars().count() <= BODY_PREVIEW_LIMIT {
		return body.to_owned();
	}

	let mut buf: String = body.chars().take(BODY_PREVIEW_LIMIT).collect();

	buf.push('…');

	buf
}
