//! Normalized user profiles built from Feide Connect user-info documents.
//!
//! The user-info endpoint answers with
//! `{ "user": { "userid": .., "name": .., "mail": .., "profilephoto": .. } }`.
//! [`Profile::from_body`] maps that document into the provider-agnostic [`Profile`] shape
//! while keeping the raw body and the parsed JSON for callers that need more than the
//! normalized fields.

// self
use crate::_prelude::*;

/// Provider label stamped on every normalized profile.
pub const PROVIDER: &str = "FeideConnect";
/// Base URL prefixed to `profilephoto` identifiers.
pub const PHOTO_BASE_URL: &str = "https://api.feideconnect.no/userinfo/v1/user/media/";

/// Failures raised while turning a user-info body into a [`Profile`].
#[derive(Debug, ThisError)]
pub enum ProfileError {
	/// Body is not valid JSON.
	#[error("User-info response is not valid JSON.")]
	Malformed {
		/// Underlying JSON syntax failure.
		#[source]
		source: serde_json::Error,
	},
	/// A known field has an unexpected type.
	#[error("User-info response has an unexpected shape at `{}`.", .source.path())]
	Schema {
		/// Structured failure, including the JSON path.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// A required field is missing or empty.
	#[error("User-info response is missing `{field}`.")]
	Incomplete {
		/// Dotted path of the missing field.
		field: &'static str,
	},
}

/// Provider-agnostic user profile.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
	/// Always [`PROVIDER`].
	pub provider: String,
	/// Stable user identifier (`user.userid`).
	pub id: String,
	/// Human-readable name (`user.name`).
	pub display_name: String,
	/// Single-entry list holding `user.mail`, when present.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub emails: Option<Vec<String>>,
	/// Single-entry list holding the photo URL, when `user.profilephoto` is present.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub photos: Option<Vec<String>>,
	/// Response body exactly as received.
	#[serde(rename = "_raw")]
	pub raw: String,
	/// Parsed response body.
	#[serde(rename = "_json")]
	pub json: serde_json::Value,
}
impl Profile {
	/// Parses and normalizes a user-info response body.
	pub fn from_body(body: impl Into<String>) -> Result<Self, ProfileError> {
		let raw = body.into();
		let json = serde_json::from_str(&raw).map_err(|source| ProfileError::Malformed { source })?;

		Self::from_json(raw, json)
	}

	/// Normalizes an already parsed user-info document, keeping `raw` as the received body.
	pub fn from_json(raw: String, json: serde_json::Value) -> Result<Self, ProfileError> {
		let document: UserInfoDocument = serde_path_to_error::deserialize(&json)
			.map_err(|source| ProfileError::Schema { source })?;
		let user = document.user.ok_or(ProfileError::Incomplete { field: "user" })?;
		let id = required(user.userid, "user.userid")?;
		let display_name = required(user.name, "user.name")?;
		let emails = present(user.mail).map(|mail| vec![mail]);
		let photos = present(user.profilephoto).map(|photo| vec![format!("{PHOTO_BASE_URL}{photo}")]);

		Ok(Self { provider: PROVIDER.into(), id, display_name, emails, photos, raw, json })
	}

	/// First email address, if any.
	pub fn email(&self) -> Option<&str> {
		self.emails.as_ref().and_then(|emails| emails.first()).map(String::as_str)
	}

	/// First photo URL, if any.
	pub fn photo(&self) -> Option<&str> {
		self.photos.as_ref().and_then(|photos| photos.first()).map(String::as_str)
	}
}

#[derive(Debug, Deserialize)]
struct UserInfoDocument {
	#[serde(default)]
	user: Option<UserInfo>,
}

#[derive(Debug, Deserialize)]
struct UserInfo {
	#[serde(default)]
	userid: Option<String>,
	#[serde(default)]
	name: Option<String>,
	#[serde(default)]
	mail: Option<String>,
	#[serde(default)]
	profilephoto: Option<String>,
}

fn required(value: Option<String>, field: &'static str) -> Result<String, ProfileError> {
	value.filter(|v| !v.trim().is_empty()).ok_or(ProfileError::Incomplete { field })
}

// Only the empty string counts as absent; whitespace is kept as sent.
fn present(value: Option<String>) -> Option<String> {
	value.filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn normalizes_full_document() {
		let body = r#"{"user":{"userid":"76a7a061-3c55","name":"Andreas Solberg","mail":"andreas@uninett.no","profilephoto":"p:a3019954"}}"#;
		let profile = Profile::from_body(body).expect("Full document should normalize.");

		assert_eq!(profile.provider, "FeideConnect");
		assert_eq!(profile.id, "76a7a061-3c55");
		assert_eq!(profile.display_name, "Andreas Solberg");
		assert_eq!(profile.emails, Some(vec!["andreas@uninett.no".to_owned()]));
		assert_eq!(
			profile.photos,
			Some(vec!["https://api.feideconnect.no/userinfo/v1/user/media/p:a3019954".to_owned()])
		);
		assert_eq!(profile.raw, body);
		assert_eq!(profile.json["user"]["userid"], "76a7a061-3c55");
	}

	#[test]
	fn optional_fields_are_omitted_when_absent() {
		let body = r#"{"user":{"userid":"u1","name":"Alice","mail":"a@x.no"}}"#;
		let profile = Profile::from_body(body).expect("Document without photo should normalize.");

		assert_eq!(profile.email(), Some("a@x.no"));
		assert!(profile.photos.is_none());
		assert!(profile.photo().is_none());

		let serialized = serde_json::to_value(&profile).expect("Profile should serialize.");

		assert_eq!(serialized["provider"], "FeideConnect");
		assert_eq!(serialized["displayName"], "Alice");
		assert_eq!(serialized["emails"], serde_json::json!(["a@x.no"]));
		assert_eq!(serialized["_raw"], body);
		assert_eq!(serialized["_json"]["user"]["name"], "Alice");
		assert!(serialized.get("photos").is_none());
	}

	#[test]
	fn empty_optional_fields_count_as_absent() {
		let profile = Profile::from_body(
			r#"{"user":{"userid":"u1","name":"Alice","mail":"","profilephoto":null}}"#,
		)
		.expect("Empty optional fields should normalize.");

		assert!(profile.emails.is_none());
		assert!(profile.photos.is_none());

		let profile = Profile::from_body(
			r#"{"user":{"userid":"u1","name":"Alice","mail":"  ","profilephoto":" "}}"#,
		)
		.expect("Whitespace optional fields should normalize.");

		assert_eq!(profile.email(), Some("  "));
		assert_eq!(profile.photo(), Some("https://api.feideconnect.no/userinfo/v1/user/media/ "));
	}

	#[test]
	fn unknown_fields_are_kept_in_json() {
		let profile = Profile::from_body(
			r#"{"user":{"userid":"u1","name":"Alice","userid_sec":["feide:alice@uninett.no"]},"audience":"app"}"#,
		)
		.expect("Unknown fields should not break normalization.");

		assert_eq!(profile.json["audience"], "app");
		assert_eq!(profile.json["user"]["userid_sec"][0], "feide:alice@uninett.no");
	}

	#[test]
	fn malformed_body_is_a_parse_error() {
		let err = Profile::from_body("<html>502 Bad Gateway</html>")
			.expect_err("Non-JSON body should fail.");

		assert!(matches!(err, ProfileError::Malformed { .. }));

		let err = Profile::from_body(r#"{"user":{"userid":"u1","name":"A"}} trailing"#)
			.expect_err("Trailing characters should fail.");

		assert!(matches!(err, ProfileError::Malformed { .. }));
	}

	#[test]
	fn wrongly_typed_field_reports_its_path() {
		let err = Profile::from_body(r#"{"user":{"userid":42,"name":"Alice"}}"#)
			.expect_err("Numeric userid should fail.");

		match err {
			ProfileError::Schema { source } => assert_eq!(source.path().to_string(), "user.userid"),
			other => panic!("Unexpected error: {other:?}."),
		}
	}

	#[test]
	fn missing_required_fields_are_reported() {
		let err = Profile::from_body(r#"{"status":"ok"}"#).expect_err("Missing user should fail.");

		assert!(matches!(err, ProfileError::Incomplete { field: "user" }));

		let err = Profile::from_body(r#"{"user":{"name":"Alice"}}"#)
			.expect_err("Missing userid should fail.");

		assert!(matches!(err, ProfileError::Incomplete { field: "user.userid" }));

		let err = Profile::from_body(r#"{"user":{"userid":"u1","name":" "}}"#)
			.expect_err("Blank name should fail.");

		assert!(matches!(err, ProfileError::Incomplete { field: "user.name" }));
	}
}
