//! Tokens issued by the authorization code exchange.

// self
use crate::{_prelude::*, auth::TokenSecret};

/// Tokens returned by the token endpoint for a single login attempt.
///
/// The grant is handed to the verify callback and never persisted by the strategy.
#[derive(Clone, Serialize, Deserialize)]
pub struct TokenGrant {
	/// Access token used to read the user-info endpoint.
	pub access_token: TokenSecret,
	/// Refresh token, if the provider issued one.
	pub refresh_token: Option<TokenSecret>,
	/// Scopes the provider reported as granted; empty when the response omitted them.
	pub scope: Vec<String>,
	/// Instant the strategy received the response.
	pub issued_at: OffsetDateTime,
	/// Expiry instant derived from `expires_in`, when the provider returned one.
	pub expires_at: Option<OffsetDateTime>,
}
impl TokenGrant {
	/// Returns `true` once the access token is past its expiry at `instant`.
	///
	/// Grants without an expiry never report as expired.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		self.expires_at.is_some_and(|expires_at| instant >= expires_at)
	}
}
impl Debug for TokenGrant {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenGrant")
			.field("access_token", &"<redacted>")
			.field("refresh_token_set", &self.refresh_token.is_some())
			.field("scope", &self.scope)
			.field("issued_at", &self.issued_at)
			.field("expires_at", &self.expires_at)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn grant(expires_at: Option<OffsetDateTime>) -> TokenGrant {
		TokenGrant {
			access_token: TokenSecret::new("access"),
			refresh_token: Some(TokenSecret::new("refresh")),
			scope: vec!["openid".into()],
			issued_at: time::macros::datetime!(2025-01-01 00:00 UTC),
			expires_at,
		}
	}

	#[test]
	fn expiry_is_optional() {
		let now = time::macros::datetime!(2025-01-01 02:00 UTC);

		assert!(!grant(None).is_expired_at(now));
		assert!(grant(Some(time::macros::datetime!(2025-01-01 01:00 UTC))).is_expired_at(now));
		assert!(!grant(Some(time::macros::datetime!(2025-01-01 03:00 UTC))).is_expired_at(now));
	}

	#[test]
	fn debug_output_redacts_tokens() {
		let rendered = format!("{:?}", grant(None));

		assert!(rendered.contains("<redacted>"));
		assert!(!rendered.contains("\"access\""));
		assert!(rendered.contains("refresh_token_set: true"));
	}
}
