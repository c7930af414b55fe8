#![cfg(feature = "reqwest")]

// crates.io
use httpmock::prelude::*;
// self
use feideconnect_oauth2::{
	_preludet::*,
	auth::TokenSecret,
	config::{StrategyOptions, USER_AGENT_DEFAULT},
	error::BoxError,
	profile::{Profile, ProfileError},
	strategy::Strategy,
};

async fn reject_all(
	_access: TokenSecret,
	_refresh: Option<TokenSecret>,
	_profile: Profile,
) -> Result<Option<()>, BoxError> {
	Ok(None)
}

fn options(server: &MockServer) -> StrategyOptions {
	StrategyOptions::new("id1")
		.client_secret("s1")
		.profile_url(
			Url::parse(&server.url("/userinfo")).expect("Mock user-info endpoint should parse."),
		)
}

#[tokio::test]
async fn user_profile_sends_bearer_token_and_default_user_agent() {
	let server = MockServer::start_async().await;
	let body = r#"{"user":{"userid":"u1","name":"Alice","mail":"a@x.no","profilephoto":"p:a3019954"}}"#;
	let mock = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/userinfo")
				.header("authorization", "Bearer access-1")
				.header("user-agent", USER_AGENT_DEFAULT);
			then.status(200).header("content-type", "application/json").body(body);
		})
		.await;
	let strategy = build_reqwest_test_strategy(options(&server), reject_all);
	let profile = strategy
		.user_profile(&TokenSecret::new("access-1"))
		.await
		.expect("User-info read should succeed.");

	mock.assert_async().await;

	assert_eq!(profile.provider, "FeideConnect");
	assert_eq!(profile.id, "u1");
	assert_eq!(profile.display_name, "Alice");
	assert_eq!(profile.email(), Some("a@x.no"));
	assert_eq!(
		profile.photo(),
		Some("https://api.feideconnect.no/userinfo/v1/user/media/p:a3019954")
	);
	assert_eq!(profile.raw, body);
}

#[tokio::test]
async fn custom_headers_reach_the_user_info_endpoint() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/userinfo")
				.header("user-agent", "portal/2.0")
				.header("x-client-tag", "portal");
			then.status(200).body(r#"{"user":{"userid":"u2","name":"Bob"}}"#);
		})
		.await;
	let strategy = build_reqwest_test_strategy(
		options(&server)
			.custom_header("User-Agent", "portal/2.0")
			.custom_header("X-Client-Tag", "portal"),
		reject_all,
	);
	let profile = strategy
		.user_profile(&TokenSecret::new("access-2"))
		.await
		.expect("User-info read should succeed with custom headers.");

	mock.assert_async().await;

	assert_eq!(profile.id, "u2");
	assert!(profile.emails.is_none());
	assert!(profile.photos.is_none());
}

#[tokio::test]
async fn non_success_status_is_a_resource_error() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/userinfo");
			then.status(401).body(r#"{"error":"invalid_token"}"#);
		})
		.await;
	let strategy = build_reqwest_test_strategy(options(&server), reject_all);
	let err = strategy
		.user_profile(&TokenSecret::new("expired"))
		.await
		.expect_err("401 should surface as an error.");

	mock.assert_async().await;

	match err {
		Error::ResourceStatus { status, body_preview } => {
			assert_eq!(status, 401);
			assert_eq!(body_preview.as_deref(), Some(r#"{"error":"invalid_token"}"#));
		},
		other => panic!("Unexpected error: {other:?}."),
	}
}

#[tokio::test]
async fn malformed_body_is_a_profile_error() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/userinfo");
			then.status(200).body("<html>maintenance</html>");
		})
		.await;
	let strategy = build_reqwest_test_strategy(options(&server), reject_all);
	let err = strategy
		.user_profile(&TokenSecret::new("access-3"))
		.await
		.expect_err("Non-JSON body should fail.");

	mock.assert_async().await;

	assert!(matches!(err, Error::Profile(ProfileError::Malformed { .. })));
}

#[tokio::test]
async fn document_without_user_is_incomplete() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/userinfo");
			then.status(200).body(r#"{"audience":"app"}"#);
		})
		.await;
	let strategy = build_reqwest_test_strategy(options(&server), reject_all);
	let err = strategy
		.user_profile(&TokenSecret::new("access-4"))
		.await
		.expect_err("Missing user object should fail.");

	mock.assert_async().await;

	assert!(matches!(err, Error::Profile(ProfileError::Incomplete { field: "user" })));
}
