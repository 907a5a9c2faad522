use crate::api::AppState;
use crate::error::{AppError, Result};
use crate::models::PlaylistRequest;
use axum::{extract::State, Json};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{info, warn};

/// POST /spotify-playlist
pub async fn create_playlist(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PlaylistRequest>,
) -> Result<Json<Value>> {
    let access_token = req
        .access_token
        .as_deref()
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AppError::Unauthorized("Access token required".to_string()))?;

    let songs = req
        .songs
        .as_deref()
        .ok_or_else(|| AppError::Validation("Songs array is required".to_string()))?;

    let outcome = state
        .spotify
        .reconcile(
            access_token,
            &req.prompt,
            songs,
            req.custom_title.as_deref(),
            req.replace_existing,
        )
        .await?;

    for warning in &outcome.warnings {
        warn!("Playlist reconciliation: {}", warning);
    }
    info!(
        playlist = %outcome.playlist.name,
        tracks_added = outcome.playlist.tracks_added,
        total_requested = outcome.playlist.total_requested,
        was_existing = outcome.playlist.was_existing,
        "playlist reconciled"
    );

    Ok(Json(json!({
        "success": true,
        "playlist": outcome.playlist,
    })))
}
