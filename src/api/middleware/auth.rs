//! API key check

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header, request::Parts},
};
use tracing::debug;

use crate::api::state::AppState;
use crate::api::types::ApiError;
use crate::config::AuthConfig;

/// Extractor that requires the configured API key.
///
/// The key is read from the configured header (default `X-API-Key`) or from
/// `Authorization: Bearer <key>`. When no key is configured every request
/// passes.
#[derive(Debug, Clone, Copy)]
pub struct RequireApiKey;

impl FromRequestParts<AppState> for RequireApiKey {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        check_api_key(&parts.headers, &state.auth)?;
        Ok(RequireApiKey)
    }
}

fn check_api_key(headers: &HeaderMap, auth: &AuthConfig) -> Result<(), ApiError> {
    let Some(expected) = auth.api_key.as_deref() else {
        return Ok(());
    };

    let provided = extract_api_key(headers, &auth.header_name)
        .ok_or_else(|| ApiError::forbidden("Could not validate credentials"))?;

    if !constant_time_eq(provided.as_bytes(), expected.as_bytes()) {
        debug!(
            key_prefix = %provided.chars().take(4).collect::<String>(),
            "Rejected API key"
        );
        return Err(ApiError::forbidden("Could not validate credentials"));
    }

    Ok(())
}

/// Reads the key from `header_name`, falling back to a bearer token
fn extract_api_key<'a>(headers: &'a HeaderMap, header_name: &str) -> Option<&'a str> {
    if let Some(value) = headers.get(header_name).and_then(|v| v.to_str().ok()) {
        return Some(value.trim());
    }

    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    fn auth(key: Option<&str>) -> AuthConfig {
        AuthConfig {
            api_key: key.map(String::from),
            header_name: "X-API-Key".to_string(),
        }
    }

    #[test]
    fn test_extract_from_configured_header() {
        let mut headers = HeaderMap::new();
        headers.insert("x-api-key", "secret".parse().unwrap());

        assert_eq!(extract_api_key(&headers, "X-API-Key"), Some("secret"));
    }

    #[test]
    fn test_extract_bearer_fallback() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, "Bearer secret".parse().unwrap());

        assert_eq!(extract_api_key(&headers, "X-API-Key"), Some("secret"));
    }

    #[test]
    fn test_check_disabled_without_configured_key() {
        assert!(check_api_key(&HeaderMap::new(), &auth(None)).is_ok());
    }

    #[test]
    fn test_missing_key_forbidden() {
        let err = check_api_key(&HeaderMap::new(), &auth(Some("secret"))).unwrap_err();
        assert_eq!(err.status, StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_wrong_key_forbidden() {
        let mut headers = HeaderMap::new();
        headers.insert("x-api-key", "guess".parse().unwrap());

        let err = check_api_key(&headers, &auth(Some("secret"))).unwrap_err();
        assert_eq!(err.status, StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_correct_key_accepted() {
        let mut headers = HeaderMap::new();
        headers.insert("x-api-key", "secret".parse().unwrap());

        assert!(check_api_key(&headers, &auth(Some("secret"))).is_ok());
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(!constant_time_eq(b"abc", b"abd"));
        assert!(!constant_time_eq(b"abc", b"abcd"));
    }
}
