//! Spotify REST client and playlist reconciliation.
//!
//! Reconciliation is find-or-create keyed by playlist name + owner: repeated
//! requests with the same title converge on one playlist instead of creating
//! duplicates. Partial failures (unmatched searches, failed clears, failed
//! adds) degrade the result rather than aborting; they surface as warnings on
//! the outcome. Only auth failure, missing input, and playlist-creation
//! failure are hard errors.

use crate::error::{AppError, Result};
use crate::models::PlaylistResult;
use futures::stream::{self, StreamExt};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{info, warn};

const PLAYLIST_PAGE_SIZE: u32 = 50;
const PLAYLIST_NAME_PROMPT_CHARS: usize = 50;
const SEARCH_CONCURRENCY: usize = 8;
const SEARCH_TIMEOUT: Duration = Duration::from_secs(10);

pub struct SpotifyClient {
    client: Client,
    api_url: String,
    accounts_url: String,
}

#[derive(Debug, Deserialize)]
struct SpotifyUser {
    id: String,
}

#[derive(Debug, Deserialize)]
struct PlaylistPage {
    #[serde(default)]
    items: Vec<SpotifyPlaylist>,
}

#[derive(Debug, Deserialize)]
struct SpotifyPlaylist {
    id: String,
    name: String,
    owner: PlaylistOwner,
    #[serde(default)]
    external_urls: ExternalUrls,
}

#[derive(Debug, Default, Deserialize)]
struct PlaylistOwner {
    #[serde(default)]
    id: String,
}

#[derive(Debug, Default, Deserialize)]
struct ExternalUrls {
    #[serde(default)]
    spotify: String,
}

#[derive(Debug, Deserialize)]
struct PlaylistTracksPage {
    #[serde(default)]
    items: Vec<PlaylistTrackItem>,
}

#[derive(Debug, Deserialize)]
struct PlaylistTrackItem {
    track: Option<TrackRef>,
}

#[derive(Debug, Deserialize)]
struct TrackRef {
    uri: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    tracks: Option<SearchTracks>,
}

#[derive(Debug, Deserialize)]
struct SearchTracks {
    #[serde(default)]
    items: Vec<TrackRef>,
}

#[derive(Debug, Deserialize)]
pub struct TokenData {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: Option<u64>,
    pub token_type: Option<String>,
}

/// Reconciliation result plus the non-fatal failures encountered on the way.
#[derive(Debug)]
pub struct ReconcileOutcome {
    pub playlist: PlaylistResult,
    pub warnings: Vec<String>,
}

/// Builds the playlist title: a trimmed custom title wins, otherwise the
/// prompt is truncated to 50 characters under the "Neural Bard:" prefix.
pub fn playlist_name(custom_title: Option<&str>, prompt: &str) -> String {
    if let Some(title) = custom_title {
        let title = title.trim();
        if !title.is_empty() {
            return title.to_string();
        }
    }
    let truncated: String = prompt.chars().take(PLAYLIST_NAME_PROMPT_CHARS).collect();
    if prompt.chars().count() > PLAYLIST_NAME_PROMPT_CHARS {
        format!("Neural Bard: {truncated}...")
    } else {
        format!("Neural Bard: {truncated}")
    }
}

impl SpotifyClient {
    pub fn new(api_url: String, accounts_url: String) -> Self {
        Self {
            client: Client::new(),
            api_url,
            accounts_url,
        }
    }

    /// Finds or creates the named playlist, optionally clears it, resolves
    /// each song name to a track URI via search, and adds what it found.
    pub async fn reconcile(
        &self,
        access_token: &str,
        prompt: &str,
        songs: &[String],
        custom_title: Option<&str>,
        replace_existing: bool,
    ) -> Result<ReconcileOutcome> {
        let user = self.current_user(access_token).await?;
        let name = playlist_name(custom_title, prompt);
        let mut warnings = Vec::new();

        // Best-effort idempotency scan: a failed page fetch is treated as
        // "no match" (matching upstream flakiness should not block creation).
        let existing = match self.find_playlist(access_token, &user.id, &name).await {
            Ok(found) => found,
            Err(e) => {
                warn!("Playlist scan failed: {}", e);
                warnings.push(format!("Could not scan existing playlists: {e}"));
                None
            }
        };

        let was_existing = existing.is_some();
        let playlist = match existing {
            Some(playlist) => {
                info!("Using existing playlist: {}", playlist.name);
                if replace_existing {
                    match self.clear_playlist(access_token, &playlist.id).await {
                        Ok(removed) if removed > 0 => {
                            info!("Cleared {} existing tracks from playlist", removed)
                        }
                        Ok(_) => {}
                        // The add step still runs, so the playlist may end up
                        // holding both old and new tracks; the warning makes
                        // that visible to the caller.
                        Err(e) => {
                            warn!("Failed to clear existing tracks: {}", e);
                            warnings.push(format!("Failed to clear existing tracks: {e}"));
                        }
                    }
                }
                playlist
            }
            None => self.create_playlist(access_token, &user.id, &name, prompt).await?,
        };

        let track_uris = self
            .resolve_tracks(access_token, songs, &mut warnings)
            .await;

        if !track_uris.is_empty() {
            if let Err(e) = self
                .add_tracks(access_token, &playlist.id, &track_uris)
                .await
            {
                warn!("Failed to add tracks: {}", e);
                warnings.push(format!("Failed to add tracks: {e}"));
            }
        }

        Ok(ReconcileOutcome {
            playlist: PlaylistResult {
                id: playlist.id,
                name: playlist.name,
                url: playlist.external_urls.spotify,
                tracks_added: track_uris.len(),
                total_requested: songs.len(),
                was_existing,
            },
            warnings,
        })
    }

    /// Resolves the authenticated user; any rejection is an auth failure.
    async fn current_user(&self, access_token: &str) -> Result<SpotifyUser> {
        let response = self
            .client
            .get(format!("{}/me", self.api_url))
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|_| AppError::Unauthorized("Invalid access token".to_string()))?;

        if !response.status().is_success() {
            return Err(AppError::Unauthorized("Invalid access token".to_string()));
        }

        response
            .json()
            .await
            .map_err(|_| AppError::Unauthorized("Invalid access token".to_string()))
    }

    /// Best-effort raw profile fetch, used by the token-exchange response.
    pub async fn profile(&self, access_token: &str) -> Option<serde_json::Value> {
        let response = self
            .client
            .get(format!("{}/me", self.api_url))
            .bearer_auth(access_token)
            .send()
            .await
            .ok()?;
        if !response.status().is_success() {
            return None;
        }
        response.json().await.ok()
    }

    /// Pages through the user's playlists looking for an exact name + owner
    /// match.
    async fn find_playlist(
        &self,
        access_token: &str,
        user_id: &str,
        name: &str,
    ) -> Result<Option<SpotifyPlaylist>> {
        let mut offset = 0;
        loop {
            let response = self
                .client
                .get(format!("{}/users/{}/playlists", self.api_url, user_id))
                .query(&[("limit", PLAYLIST_PAGE_SIZE), ("offset", offset)])
                .bearer_auth(access_token)
                .send()
                .await
                .map_err(|e| AppError::Upstream {
                    status: None,
                    detail: format!("playlist listing failed: {e}"),
                })?;

            if !response.status().is_success() {
                return Err(AppError::Upstream {
                    status: Some(response.status().as_u16()),
                    detail: "playlist listing failed".to_string(),
                });
            }

            let page: PlaylistPage = response.json().await.map_err(|e| AppError::Upstream {
                status: None,
                detail: format!("invalid playlist page: {e}"),
            })?;

            let page_len = page.items.len();
            if let Some(found) = page
                .items
                .into_iter()
                .find(|p| p.name == name && p.owner.id == user_id)
            {
                return Ok(Some(found));
            }

            if (page_len as u32) < PLAYLIST_PAGE_SIZE {
                return Ok(None);
            }
            offset += PLAYLIST_PAGE_SIZE;
        }
    }

    /// Removes every current track in one batch call; returns the count.
    async fn clear_playlist(&self, access_token: &str, playlist_id: &str) -> Result<usize> {
        let response = self
            .client
            .get(format!("{}/playlists/{}/tracks", self.api_url, playlist_id))
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AppError::Upstream {
                status: None,
                detail: format!("track listing failed: {e}"),
            })?;

        if !response.status().is_success() {
            return Err(AppError::Upstream {
                status: Some(response.status().as_u16()),
                detail: "track listing failed".to_string(),
            });
        }

        let page: PlaylistTracksPage = response.json().await.map_err(|e| AppError::Upstream {
            status: None,
            detail: format!("invalid track page: {e}"),
        })?;

        let uris: Vec<serde_json::Value> = page
            .items
            .into_iter()
            .filter_map(|item| item.track)
            .map(|track| json!({ "uri": track.uri }))
            .collect();

        if uris.is_empty() {
            return Ok(0);
        }

        let removed = uris.len();
        let response = self
            .client
            .delete(format!("{}/playlists/{}/tracks", self.api_url, playlist_id))
            .bearer_auth(access_token)
            .json(&json!({ "tracks": uris }))
            .send()
            .await
            .map_err(|e| AppError::Upstream {
                status: None,
                detail: format!("track removal failed: {e}"),
            })?;

        if !response.status().is_success() {
            return Err(AppError::Upstream {
                status: Some(response.status().as_u16()),
                detail: "track removal failed".to_string(),
            });
        }

        Ok(removed)
    }

    /// Creates a new public playlist; failure here is fatal to the request.
    async fn create_playlist(
        &self,
        access_token: &str,
        user_id: &str,
        name: &str,
        prompt: &str,
    ) -> Result<SpotifyPlaylist> {
        let body = json!({
            "name": name,
            "description": format!("Created by Neural Bard AI - \"{prompt}\""),
            "public": true,
        });

        let response = self
            .client
            .post(format!("{}/users/{}/playlists", self.api_url, user_id))
            .bearer_auth(access_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::PlaylistCreate(e.to_string()))?;

        if !response.status().is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(AppError::PlaylistCreate(detail));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::PlaylistCreate(format!("invalid playlist payload: {e}")))
    }

    /// Adds every resolved URI in one batch call.
    async fn add_tracks(
        &self,
        access_token: &str,
        playlist_id: &str,
        uris: &[String],
    ) -> Result<()> {
        let response = self
            .client
            .post(format!("{}/playlists/{}/tracks", self.api_url, playlist_id))
            .bearer_auth(access_token)
            .json(&json!({ "uris": uris }))
            .send()
            .await
            .map_err(|e| AppError::Upstream {
                status: None,
                detail: format!("track addition failed: {e}"),
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let detail = response.text().await.unwrap_or_default();
            return Err(AppError::Upstream {
                status: Some(status),
                detail,
            });
        }

        Ok(())
    }

    /// Fan-out track search: bounded concurrency, per-call timeout, misses
    /// and failures dropped with a warning. Completion order is irrelevant;
    /// results are re-associated with their song names.
    async fn resolve_tracks(
        &self,
        access_token: &str,
        songs: &[String],
        warnings: &mut Vec<String>,
    ) -> Vec<String> {
        let searches: Vec<(String, std::result::Result<Option<String>, String>)> =
            stream::iter(songs.iter().cloned())
                .map(|song| async move {
                    let outcome = match tokio::time::timeout(
                        SEARCH_TIMEOUT,
                        self.search_track(access_token, &song),
                    )
                    .await
                    {
                        Ok(Ok(uri)) => Ok(uri),
                        Ok(Err(e)) => Err(e.to_string()),
                        Err(_) => Err("search timed out".to_string()),
                    };
                    (song, outcome)
                })
                .buffer_unordered(SEARCH_CONCURRENCY)
                .collect()
                .await;

        let mut track_uris = Vec::new();
        for (song, outcome) in searches {
            match outcome {
                Ok(Some(uri)) => track_uris.push(uri),
                Ok(None) => warnings.push(format!("No match found for \"{song}\"")),
                Err(e) => warnings.push(format!("Search failed for \"{song}\": {e}")),
            }
        }
        track_uris
    }

    /// Searches for a single song name and takes the first hit's URI.
    async fn search_track(&self, access_token: &str, song: &str) -> Result<Option<String>> {
        let response = self
            .client
            .get(format!("{}/search", self.api_url))
            .query(&[("q", song), ("type", "track"), ("limit", "1")])
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AppError::Upstream {
                status: None,
                detail: format!("track search failed: {e}"),
            })?;

        if !response.status().is_success() {
            return Err(AppError::Upstream {
                status: Some(response.status().as_u16()),
                detail: "track search failed".to_string(),
            });
        }

        let result: SearchResponse = response.json().await.map_err(|e| AppError::Upstream {
            status: None,
            detail: format!("invalid search payload: {e}"),
        })?;

        Ok(result
            .tracks
            .and_then(|tracks| tracks.items.into_iter().next())
            .map(|track| track.uri))
    }

    /// Exchanges an OAuth authorization code for tokens.
    pub async fn exchange_code(
        &self,
        client_id: &str,
        client_secret: &str,
        code: &str,
        redirect_uri: &str,
    ) -> Result<TokenData> {
        use base64::{engine::general_purpose::STANDARD, Engine};

        let basic = STANDARD.encode(format!("{client_id}:{client_secret}"));
        let response = self
            .client
            .post(format!("{}/api/token", self.accounts_url))
            .header("Authorization", format!("Basic {basic}"))
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", redirect_uri),
            ])
            .send()
            .await
            .map_err(|e| AppError::TokenExchange(e.to_string()))?;

        if !response.status().is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(AppError::TokenExchange(detail));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::TokenExchange(format!("invalid token payload: {e}")))
    }
}
