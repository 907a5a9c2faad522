pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod services;

use crate::api::AppState;
use crate::config::Config;
use crate::services::{BardClient, RateLimiter, SpotifyClient};
use axum::{
    http::{header, Method},
    routing::post,
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Builds the application router from a loaded configuration.
pub fn app(config: Config) -> Router {
    let bard = config
        .llm_api_key
        .clone()
        .map(|key| BardClient::new(&config, key));
    let spotify = SpotifyClient::new(
        config.spotify_api_url.clone(),
        config.spotify_accounts_url.clone(),
    );

    let state = Arc::new(AppState {
        config,
        bard,
        spotify,
        rate_limiter: RateLimiter::default(),
    });

    Router::new()
        .route(
            "/neural-bard",
            post(api::bard::divine).fallback(api::method_not_allowed),
        )
        .route(
            "/spotify-playlist",
            post(api::playlist::create_playlist).fallback(api::method_not_allowed),
        )
        .route(
            "/spotify-token-exchange",
            post(api::auth::exchange_token).fallback(api::method_not_allowed),
        )
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::POST, Method::OPTIONS])
                .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]),
        )
}
