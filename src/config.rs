//! Strategy options and the validated provider configuration derived from them.
//!
//! [`StrategyOptions`] mirrors what an application passes when registering the strategy:
//! every field is optional and omitted fields fall back to Feide Connect's published
//! endpoints. [`StrategyOptions::resolve`] applies those defaults once, validates the
//! result, and produces the immutable [`ProviderConfig`] owned by the strategy instance.

// crates.io
use oauth2::http::{HeaderMap, HeaderName, HeaderValue, header::USER_AGENT};
// self
use crate::{_prelude::*, auth::TokenSecret, error::ConfigError};

/// Default authorization endpoint.
pub const AUTHORIZATION_URL: &str = "https://auth.feideconnect.no/oauth/authorization";
/// Default token endpoint.
pub const TOKEN_URL: &str = "https://auth.feideconnect.no/oauth/token";
/// Default user-info endpoint.
pub const PROFILE_URL: &str = "https://auth.feideconnect.no/userinfo";
/// Default key under which hosts store the pending authorization session.
pub const SESSION_KEY: &str = "oauth:feideconnect";
/// Default separator used to join requested scopes.
pub const SCOPE_SEPARATOR: char = ' ';
/// Default `User-Agent` sent with every provider request.
pub const USER_AGENT_DEFAULT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// How the client authenticates against the token endpoint.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientAuthMethod {
	/// HTTP Basic with `client_id`/`client_secret`.
	ClientSecretBasic,
	#[default]
	/// Form POST body parameters for `client_id`/`client_secret`.
	ClientSecretPost,
}

/// Options accepted when constructing the strategy.
///
/// Every field may be omitted; see [`StrategyOptions::resolve`] for the defaults. The struct
/// deserializes from any serde format so hosts can keep it in their own configuration files.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyOptions {
	/// OAuth client identifier registered with Feide Connect.
	pub client_id: Option<String>,
	/// OAuth client secret; omit for public clients.
	pub client_secret: Option<TokenSecret>,
	/// Redirect URI Feide Connect sends the user back to.
	pub callback_url: Option<Url>,
	/// Authorization endpoint override.
	pub authorization_url: Option<Url>,
	/// Token endpoint override.
	pub token_url: Option<Url>,
	/// Character used to join scopes in the authorization request.
	pub scope_separator: Option<char>,
	/// Extra headers attached to every provider request.
	pub custom_headers: Option<BTreeMap<String, String>>,
	/// User-info endpoint override.
	pub profile_url: Option<Url>,
	/// `User-Agent` used when `custom_headers` does not set one.
	pub user_agent: Option<String>,
	/// Session key override.
	pub session_key: Option<String>,
	/// Scopes requested when the authorization request does not name its own.
	pub scope: Option<Vec<String>>,
	/// Enables PKCE (S256) on authorization requests.
	pub pkce: bool,
	/// Token endpoint client authentication override.
	pub client_auth_method: Option<ClientAuthMethod>,
}
impl StrategyOptions {
	/// Creates options for the provided client identifier.
	pub fn new(client_id: impl Into<String>) -> Self {
		Self { client_id: Some(client_id.into()), ..Default::default() }
	}

	/// Sets the client secret.
	pub fn client_secret(mut self, secret: impl Into<TokenSecret>) -> Self {
		self.client_secret = Some(secret.into());

		self
	}

	/// Sets the redirect URI.
	pub fn callback_url(mut self, url: Url) -> Self {
		self.callback_url = Some(url);

		self
	}

	/// Overrides the authorization endpoint.
	pub fn authorization_url(mut self, url: Url) -> Self {
		self.authorization_url = Some(url);

		self
	}

	/// Overrides the token endpoint.
	pub fn token_url(mut self, url: Url) -> Self {
		self.token_url = Some(url);

		self
	}

	/// Overrides the user-info endpoint.
	pub fn profile_url(mut self, url: Url) -> Self {
		self.profile_url = Some(url);

		self
	}

	/// Overrides the scope separator.
	pub fn scope_separator(mut self, separator: char) -> Self {
		self.scope_separator = Some(separator);

		self
	}

	/// Adds a custom header sent with every provider request.
	pub fn custom_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.custom_headers.get_or_insert_with(BTreeMap::new).insert(name.into(), value.into());

		self
	}

	/// Sets the fallback `User-Agent`.
	pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
		self.user_agent = Some(user_agent.into());

		self
	}

	/// Overrides the session key.
	pub fn session_key(mut self, key: impl Into<String>) -> Self {
		self.session_key = Some(key.into());

		self
	}

	/// Sets the default requested scopes.
	pub fn scope<I, S>(mut self, scope: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.scope = Some(scope.into_iter().map(Into::into).collect());

		self
	}

	/// Toggles PKCE.
	pub fn pkce(mut self, enabled: bool) -> Self {
		self.pkce = enabled;

		self
	}

	/// Overrides the token endpoint client authentication method.
	pub fn client_auth_method(mut self, method: ClientAuthMethod) -> Self {
		self.client_auth_method = Some(method);

		self
	}

	/// Applies defaults and validates the result.
	///
	/// Explicitly supplied values always win. The `User-Agent` default is inserted only when
	/// no `User-Agent` header (compared case-insensitively) was supplied.
	pub fn resolve(self) -> Result<ProviderConfig, ConfigError> {
		let client_id =
			self.client_id.filter(|id| !id.trim().is_empty()).ok_or(ConfigError::MissingClientId)?;
		let endpoints = ProviderEndpoints {
			authorization: or_default("authorization", self.authorization_url, AUTHORIZATION_URL)?,
			token: or_default("token", self.token_url, TOKEN_URL)?,
			user_info: or_default("user-info", self.profile_url, PROFILE_URL)?,
		};
		let mut custom_headers = self.custom_headers.unwrap_or_default();

		if !custom_headers.keys().any(|name| name.eq_ignore_ascii_case(USER_AGENT.as_str())) {
			custom_headers.insert(
				"User-Agent".into(),
				self.user_agent.unwrap_or_else(|| USER_AGENT_DEFAULT.into()),
			);
		}

		let config = ProviderConfig {
			client_id,
			client_secret: self.client_secret,
			callback_url: self.callback_url,
			endpoints,
			scope_separator: self.scope_separator.unwrap_or(SCOPE_SEPARATOR),
			custom_headers,
			session_key: self.session_key.unwrap_or_else(|| SESSION_KEY.into()),
			scope: self.scope.unwrap_or_default(),
			pkce: self.pkce,
			client_auth_method: self.client_auth_method.unwrap_or_default(),
		};

		config.validate()?;

		Ok(config)
	}
}
impl Debug for StrategyOptions {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("StrategyOptions")
			.field("client_id", &self.client_id)
			.field("client_secret_set", &self.client_secret.is_some())
			.field("callback_url", &self.callback_url)
			.field("authorization_url", &self.authorization_url)
			.field("token_url", &self.token_url)
			.field("profile_url", &self.profile_url)
			.field("scope_separator", &self.scope_separator)
			.field("custom_headers", &self.custom_headers)
			.field("user_agent", &self.user_agent)
			.field("session_key", &self.session_key)
			.field("scope", &self.scope)
			.field("pkce", &self.pkce)
			.field("client_auth_method", &self.client_auth_method)
			.finish()
	}
}

/// Endpoint set the strategy talks to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderEndpoints {
	/// Authorization endpoint users are redirected to.
	pub authorization: Url,
	/// Token endpoint used for code exchanges.
	pub token: Url,
	/// User-info endpoint read after the exchange.
	pub user_info: Url,
}

/// Resolved, validated configuration; immutable once the strategy is built.
#[derive(Clone, PartialEq, Eq)]
pub struct ProviderConfig {
	/// OAuth client identifier.
	pub client_id: String,
	/// OAuth client secret, if the client is confidential.
	pub client_secret: Option<TokenSecret>,
	/// Default redirect URI.
	pub callback_url: Option<Url>,
	/// Provider endpoints (all HTTPS).
	pub endpoints: ProviderEndpoints,
	/// Character used to join scopes.
	pub scope_separator: char,
	/// Headers attached to every provider request, `User-Agent` included.
	pub custom_headers: BTreeMap<String, String>,
	/// Key hosts use to store the pending authorization session.
	pub session_key: String,
	/// Default requested scopes.
	pub scope: Vec<String>,
	/// Whether authorization requests carry a PKCE challenge.
	pub pkce: bool,
	/// Token endpoint client authentication method.
	pub client_auth_method: ClientAuthMethod,
}
impl ProviderConfig {
	/// Converts the custom headers into an HTTP header map.
	pub fn header_map(&self) -> Result<HeaderMap, ConfigError> {
		let mut headers = HeaderMap::with_capacity(self.custom_headers.len());

		for (name, value) in &self.custom_headers {
			let invalid = || ConfigError::InvalidHeader { name: name.clone() };
			let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| invalid())?;
			let header_value = HeaderValue::from_str(value).map_err(|_| invalid())?;

			headers.insert(header_name, header_value);
		}

		Ok(headers)
	}

	/// Returns the configured `User-Agent` header value.
	pub fn user_agent(&self) -> Option<&str> {
		self.custom_headers
			.iter()
			.find(|(name, _)| name.eq_ignore_ascii_case(USER_AGENT.as_str()))
			.map(|(_, value)| value.as_str())
	}

	fn validate(&self) -> Result<(), ConfigError> {
		validate_endpoint("authorization", &self.endpoints.authorization)?;
		validate_endpoint("token", &self.endpoints.token)?;
		validate_endpoint("user-info", &self.endpoints.user_info)?;

		if self.scope_separator.is_control() {
			return Err(ConfigError::InvalidScopeSeparator { separator: self.scope_separator });
		}

		self.header_map()?;

		Ok(())
	}
}
impl Debug for ProviderConfig {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ProviderConfig")
			.field("client_id", &self.client_id)
			.field("client_secret_set", &self.client_secret.is_some())
			.field("callback_url", &self.callback_url)
			.field("endpoints", &self.endpoints)
			.field("scope_separator", &self.scope_separator)
			.field("custom_headers", &self.custom_headers)
			.field("session_key", &self.session_key)
			.field("scope", &self.scope)
			.field("pkce", &self.pkce)
			.field("client_auth_method", &self.client_auth_method)
			.finish()
	}
}

fn or_default(
	endpoint: &'static str,
	supplied: Option<Url>,
	default: &'static str,
) -> Result<Url, ConfigError> {
	match supplied {
		Some(url) => Ok(url),
		None => Url::parse(default).map_err(|source| ConfigError::InvalidEndpoint { endpoint, source }),
	}
}

fn validate_endpoint(name: &'static str, url: &Url) -> Result<(), ConfigError> {
	if url.scheme() != "https" {
		Err(ConfigError::InsecureEndpoint { endpoint: name, url: url.to_string() })
	} else {
		Ok(())
	}
}
