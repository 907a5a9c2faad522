use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistRequest {
    /// The original user prompt; only feeds the generated playlist name and
    /// description, so an absent prompt is tolerated.
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub number_of_songs: Option<u32>,
    pub access_token: Option<String>,
    pub songs: Option<Vec<String>>,
    pub custom_title: Option<String>,
    #[serde(default)]
    pub replace_existing: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistResult {
    pub id: String,
    pub name: String,
    pub url: String,
    pub tracks_added: usize,
    pub total_requested: usize,
    pub was_existing: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenExchangeRequest {
    pub code: Option<String>,
    pub redirect_uri: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenExchangeResponse {
    pub success: bool,
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: Option<u64>,
    pub token_type: Option<String>,
    /// Raw Spotify profile, passed through untouched when the lookup succeeds.
    pub user: Option<serde_json::Value>,
}
