#![cfg(feature = "reqwest")]

// self
use feideconnect_oauth2::{
	_preludet::*,
	auth::TokenSecret,
	config::{StrategyOptions, USER_AGENT_DEFAULT},
	error::{BoxError, Endpoint, TransportError},
	flows::FeideConnectStrategy,
	http::{ResponseMetadata, ResponseMetadataSlot, TokenHttpClient},
	oauth::{
		TransportErrorMapper,
		oauth2::{
			AsyncHttpClient, HttpClientError, HttpRequest, HttpResponse,
			http::{HeaderMap, StatusCode},
		},
	},
	profile::Profile,
	strategy::Strategy,
};

#[derive(Debug)]
enum FakeTransportError {
	Reset,
}
impl Display for FakeTransportError {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			Self::Reset => write!(f, "Connection reset by peer."),
		}
	}
}
impl StdError for FakeTransportError {}

/// Transport that records request headers and answers from a canned body, or fails.
#[derive(Clone, Default)]
struct FakeHttpClient {
	body: Option<&'static str>,
	seen: Arc<Mutex<Vec<HeaderMap>>>,
}
impl FakeHttpClient {
	fn answering(body: &'static str) -> Self {
		Self { body: Some(body), ..Default::default() }
	}

	fn failing() -> Self {
		Self::default()
	}

	fn seen(&self) -> Vec<HeaderMap> {
		self.seen.lock().clone()
	}
}
impl TokenHttpClient for FakeHttpClient {
	type Handle = FakeHttpHandle;
	type TransportError = FakeTransportError;

	fn with_metadata(&self, slot: ResponseMetadataSlot) -> Self::Handle {
		FakeHttpHandle { slot, client: self.clone() }
	}
}

struct FakeHttpHandle {
	slot: ResponseMetadataSlot,
	client: FakeHttpClient,
}
impl<'a> AsyncHttpClient<'a> for FakeHttpHandle {
	type Error = HttpClientError<FakeTransportError>;
	type Future =
		Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'a + Send + Sync>>;

	fn call(&'a self, request: HttpRequest) -> Self::Future {
		let slot = self.slot.clone();
		let client = self.client.clone();

		Box::pin(async move {
			assert!(
				slot.take().is_none(),
				"ResponseMetadataSlot must be clear before dispatching a request."
			);
			client.seen.lock().push(request.headers().clone());

			let Some(body) = client.body else {
				return Err(HttpClientError::Reqwest(Box::new(FakeTransportError::Reset)));
			};

			slot.store(ResponseMetadata { status: Some(200), retry_after: None });

			let mut response = HttpResponse::new(body.as_bytes().to_vec());

			*response.status_mut() = StatusCode::OK;

			Ok(response)
		})
	}
}

#[derive(Clone, Default)]
struct RecordingTransportErrorMapper {
	endpoints: Arc<Mutex<Vec<Endpoint>>>,
}
impl TransportErrorMapper<FakeTransportError> for RecordingTransportErrorMapper {
	fn map_transport_error(
		&self,
		endpoint: Endpoint,
		_meta: Option<&ResponseMetadata>,
		err: HttpClientError<FakeTransportError>,
	) -> Error {
		self.endpoints.lock().push(endpoint);

		match err {
			HttpClientError::Reqwest(inner) => TransportError::network(endpoint, *inner).into(),
			HttpClientError::Io(inner) => TransportError::Io(inner).into(),
			other => TransportError::network(
				endpoint,
				std::io::Error::other(format!("Unhandled fake transport failure: {other:?}")),
			)
			.into(),
		}
	}
}

async fn accept_all(
	_access: TokenSecret,
	_refresh: Option<TokenSecret>,
	profile: Profile,
) -> Result<Option<String>, BoxError> {
	Ok(Some(profile.id))
}

#[tokio::test]
async fn transport_failure_returns_error_and_no_profile() {
	let http_client = FakeHttpClient::failing();
	let mapper = RecordingTransportErrorMapper::default();
	let strategy = FeideConnectStrategy::with_http_client(
		StrategyOptions::new("id1").client_secret("s1"),
		accept_all,
		http_client.clone(),
		mapper.clone(),
	)
	.expect("Strategy should build with the fake transport.");
	let err = strategy
		.user_profile(&TokenSecret::new("access-1"))
		.await
		.expect_err("Transport failure should surface as an error.");

	match err {
		Error::Transport(TransportError::Network { endpoint, source }) => {
			assert_eq!(endpoint, Endpoint::UserInfo);
			assert_eq!(source.to_string(), "Connection reset by peer.");
		},
		other => panic!("Unexpected error: {other:?}."),
	}

	assert_eq!(*mapper.endpoints.lock(), vec![Endpoint::UserInfo]);
	assert_eq!(http_client.seen().len(), 1);
}

#[tokio::test]
async fn every_request_carries_configured_headers() {
	let http_client = FakeHttpClient::answering(r#"{"user":{"userid":"u1","name":"Alice"}}"#);
	let strategy = FeideConnectStrategy::with_http_client(
		StrategyOptions::new("id1").custom_header("X-Client-Tag", "portal"),
		accept_all,
		http_client.clone(),
		RecordingTransportErrorMapper::default(),
	)
	.expect("Strategy should build with the fake transport.");
	let profile = strategy
		.user_profile(&TokenSecret::new("access-1"))
		.await
		.expect("Canned user-info body should normalize.");

	assert_eq!(profile.id, "u1");

	let seen = http_client.seen();
	let headers = seen.first().expect("One request should be recorded.");

	assert_eq!(
		headers.get("authorization").and_then(|value| value.to_str().ok()),
		Some("Bearer access-1")
	);
	assert_eq!(
		headers.get("accept").and_then(|value| value.to_str().ok()),
		Some("application/json")
	);
	assert_eq!(
		headers.get("user-agent").and_then(|value| value.to_str().ok()),
		Some(USER_AGENT_DEFAULT)
	);
	assert_eq!(headers.get("x-client-tag").and_then(|value| value.to_str().ok()), Some("portal"));
}
