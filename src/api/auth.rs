use crate::api::AppState;
use crate::error::{AppError, Result};
use crate::models::{TokenExchangeRequest, TokenExchangeResponse};
use axum::{extract::State, Json};
use std::sync::Arc;
use tracing::warn;

/// POST /spotify-token-exchange
pub async fn exchange_token(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TokenExchangeRequest>,
) -> Result<Json<TokenExchangeResponse>> {
    let code = req
        .code
        .as_deref()
        .filter(|code| !code.is_empty())
        .ok_or_else(|| AppError::Validation("Authorization code is required".to_string()))?;

    let (client_id, client_secret) = match (
        state.config.spotify_client_id.as_deref(),
        state.config.spotify_client_secret.as_deref(),
    ) {
        (Some(id), Some(secret)) => (id, secret),
        _ => return Err(AppError::Config("Server configuration error".to_string())),
    };

    let redirect_uri = req
        .redirect_uri
        .as_deref()
        .unwrap_or(&state.config.spotify_redirect_uri);

    let token = state
        .spotify
        .exchange_code(client_id, client_secret, code, redirect_uri)
        .await?;

    // Profile lookup is best-effort; a failure still returns the tokens.
    let user = state.spotify.profile(&token.access_token).await;
    if user.is_none() {
        warn!("Profile lookup after token exchange failed");
    }

    Ok(Json(TokenExchangeResponse {
        success: true,
        access_token: token.access_token,
        refresh_token: token.refresh_token,
        expires_in: token.expires_in,
        token_type: token.token_type,
        user,
    }))
}
