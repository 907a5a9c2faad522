pub mod auth;
pub mod bard;
pub mod playlist;

use crate::config::Config;
use crate::error::AppError;
use crate::services::{BardClient, RateLimiter, SpotifyClient};
use axum::http::HeaderMap;

pub struct AppState {
    pub config: Config,
    /// Absent when no LLM API key is configured; the bard endpoint then
    /// reports a configuration error instead of attempting a call.
    pub bard: Option<BardClient>,
    pub spotify: SpotifyClient,
    pub rate_limiter: RateLimiter,
}

/// Wrong-verb fallback for the POST-only routes.
pub async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}

/// Client identity for rate limiting: forwarded-for chain first, then the
/// proxy's real-ip header, else a shared "unknown" bucket.
pub fn client_key(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .or_else(|| headers.get("x-real-ip"))
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn client_key_prefers_forwarded_for() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("1.2.3.4, 10.0.0.1"));
        headers.insert("x-real-ip", HeaderValue::from_static("5.6.7.8"));
        assert_eq!(client_key(&headers), "1.2.3.4");
    }

    #[test]
    fn client_key_falls_back_to_real_ip_then_unknown() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("5.6.7.8"));
        assert_eq!(client_key(&headers), "5.6.7.8");
        assert_eq!(client_key(&HeaderMap::new()), "unknown");
    }
}
