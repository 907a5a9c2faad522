use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use validator::{Validate, ValidationError};

fn default_song_count() -> u32 {
    25
}

#[derive(Debug, Deserialize, Validate)]
pub struct BardRequest {
    /// Defaulted so an absent prompt reaches `validate_prompt` and comes back
    /// as a 400 with a JSON error body instead of a deserialization
    /// rejection.
    #[serde(default)]
    #[validate(custom(function = validate_prompt))]
    pub prompt: String,
    #[serde(rename = "numberOfSongs", default = "default_song_count")]
    #[validate(range(min = 5, max = 50, message = "Number of songs must be between 5 and 50"))]
    pub number_of_songs: u32,
}

/// Prompt substrings that suggest script injection rather than a music request.
static SUSPICIOUS_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"(?i)<script").unwrap(),
        Regex::new(r"(?i)javascript:").unwrap(),
        Regex::new(r"(?i)on\w+\s*=").unwrap(),
        Regex::new(r"(?i)eval\s*\(").unwrap(),
        Regex::new(r"(?i)function\s*\(").unwrap(),
    ]
});

fn prompt_error(message: &'static str) -> ValidationError {
    let mut err = ValidationError::new("prompt");
    err.message = Some(Cow::Borrowed(message));
    err
}

fn validate_prompt(prompt: &str) -> Result<(), ValidationError> {
    if prompt.trim().is_empty() {
        return Err(prompt_error("Prompt must be a non-empty string"));
    }
    if prompt.len() < 3 {
        return Err(prompt_error("Prompt too short (min 3 characters)"));
    }
    if prompt.len() > 1000 {
        return Err(prompt_error("Prompt too long (max 1000 characters)"));
    }
    if SUSPICIOUS_PATTERNS.iter().any(|p| p.is_match(prompt)) {
        return Err(prompt_error("Invalid content detected"));
    }
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct BardResponse {
    pub prompt: String,
    pub response: String,
    pub songs: Vec<String>,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "bardData")]
    pub bard_data: BardData,
}

#[derive(Debug, Serialize)]
pub struct BardData {
    pub message: String,
    pub status: String,
    pub tokens_used: u32,
    pub mystical_confidence: f32,
    pub model_used: String,
    #[serde(rename = "rateLimitRemaining", skip_serializing_if = "Option::is_none")]
    pub rate_limit_remaining: Option<usize>,
}
