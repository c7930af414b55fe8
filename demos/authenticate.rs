//! Walks through a complete Feide Connect login against a local mock provider: the redirect
//! step, the callback with the authorization code, and the application's verify callback.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use url::Url;
// self
use feideconnect_oauth2::{
	auth::TokenSecret,
	config::StrategyOptions,
	error::BoxError,
	flows::{FeideConnectStrategy, ReqwestStrategy},
	http::ReqwestHttpClient,
	oauth::ReqwestTransportErrorMapper,
	profile::Profile,
	reqwest::{Client, redirect::Policy},
	strategy::{AuthenticateOutcome, AuthenticateRequest, Strategy},
};

async fn find_user(
	_access_token: TokenSecret,
	_refresh_token: Option<TokenSecret>,
	profile: Profile,
) -> Result<Option<String>, BoxError> {
	Ok(Some(format!("local:{}", profile.id)))
}

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth/token");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"demo-access\",\"token_type\":\"bearer\",\"expires_in\":900}",
			);
		})
		.await;
	let user_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/userinfo").header("authorization", "Bearer demo-access");
			then.status(200).header("content-type", "application/json").body(
				"{\"user\":{\"userid\":\"76a7a061\",\"name\":\"Demo User\",\"mail\":\"demo@example.no\",\"profilephoto\":\"p:demo\"}}",
			);
		})
		.await;
	let options = StrategyOptions::new("demo-client")
		.client_secret("demo-secret")
		.callback_url(Url::parse("https://app.example.com/auth/feideconnect/callback")?)
		.token_url(Url::parse(&server.url("/oauth/token"))?)
		.profile_url(Url::parse(&server.url("/userinfo"))?)
		.scope(["userinfo", "userinfo-mail", "userinfo-photo"]);
	let http_client = ReqwestHttpClient::with_client(
		Client::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.redirect(Policy::none())
			.build()?,
	);
	let strategy: ReqwestStrategy<_> = FeideConnectStrategy::with_http_client(
		options,
		find_user,
		http_client,
		Arc::new(ReqwestTransportErrorMapper),
	)?;
	let AuthenticateOutcome::Redirect(session) =
		strategy.authenticate(AuthenticateRequest::default()).await?
	else {
		color_eyre::eyre::bail!("The first login step should redirect.");
	};

	println!("Store under `{}` and redirect to {}", strategy.session_key(), session.authorize_url);

	let mut callback = session.redirect_uri.clone();

	callback.query_pairs_mut().append_pair("code", "demo-code").append_pair("state", &session.state);

	let request = AuthenticateRequest::from_callback(&callback).with_session(Some(session));

	match strategy.authenticate(request).await? {
		AuthenticateOutcome::Success { user, profile } => {
			println!("Logged in as {user} ({}, {:?}).", profile.display_name, profile.email());
			println!("Photo: {:?}", profile.photo());
		},
		AuthenticateOutcome::Fail { message } => println!("Login failed: {message}"),
		AuthenticateOutcome::Redirect(_) => println!("Unexpected second redirect."),
	}

	token_mock.assert_async().await;
	user_mock.assert_async().await;

	Ok(())
}
