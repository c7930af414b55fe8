//! Shared helpers for flow implementations.

// self
use crate::{_prelude::*, config::ProviderConfig, error::ConfigError};

/// Joins scopes with the provider's delimiter when building requests.
///
/// Returns `None` for an empty list so the `scope` parameter is omitted entirely.
pub(crate) fn format_scope(scope: &[String], delimiter: char) -> Option<String> {
	if scope.is_empty() {
		return None;
	}

	let mut buf = String::new();

	for (idx, value) in scope.iter().enumerate() {
		if idx > 0 {
			buf.push(delimiter);
		}

		buf.push_str(value);
	}

	Some(buf)
}

/// Picks the per-request redirect URI, falling back to the configured callback URL.
pub(crate) fn resolve_redirect(
	config: &ProviderConfig,
	requested: Option<Url>,
) -> Result<Url, ConfigError> {
	requested.or_else(|| config.callback_url.clone()).ok_or(ConfigError::MissingRedirectUri)
}
