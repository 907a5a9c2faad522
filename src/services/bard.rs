//! Chat-completions adapter for the Neural Bard persona.
//!
//! One request, one reply, no retries: a failed divination is reported
//! upstream-error style with whatever status and body the service returned.

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::{BardData, BardResponse};
use crate::services::extractor;
use chrono::Utc;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::info;

const MAX_COMPLETION_TOKENS: u32 = 1000;
const BODY_SNIPPET_LEN: usize = 300;

pub struct BardClient {
    client: Client,
    api_url: String,
    api_key: String,
    model: String,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
    model: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    #[serde(default)]
    total_tokens: u32,
}

fn persona(song_count: u32) -> String {
    format!(
        "You are the Neural Bard, a mystical AI that specializes in music curation and \
         playlist generation. You speak in a mystical, tech-savvy manner about music and \
         algorithms. You have deep knowledge of music genres, artists, and audio features. \
         When asked for a playlist, provide exactly {song_count} song recommendations, each \
         on its own line in the format \"Artist - Song Title\". Always maintain your \
         mystical, algorithmic personality while being helpful and informative about music."
    )
}

fn snippet(body: &str) -> String {
    body.chars().take(BODY_SNIPPET_LEN).collect()
}

impl BardClient {
    pub fn new(config: &Config, api_key: String) -> Self {
        Self {
            client: Client::new(),
            api_url: config.llm_api_url.clone(),
            api_key,
            model: config.llm_model.clone(),
            temperature: config.llm_temperature,
        }
    }

    /// Asks the bard for `song_count` recommendations and maps the reply into
    /// a [`BardResponse`], including the songs mined from the free text.
    pub async fn divine(&self, prompt: &str, song_count: u32) -> Result<BardResponse> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: persona(song_count),
                },
                ChatMessage {
                    role: "user",
                    content: prompt.to_string(),
                },
            ],
            temperature: self.temperature,
            max_tokens: MAX_COMPLETION_TOKENS,
        };

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::Upstream {
                status: None,
                detail: format!("chat completion request failed: {e}"),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Upstream {
                status: Some(status.as_u16()),
                detail: snippet(&body),
            });
        }

        let completion: ChatCompletion = response.json().await.map_err(|e| AppError::Upstream {
            status: Some(status.as_u16()),
            detail: format!("invalid chat completion payload: {e}"),
        })?;

        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| AppError::Upstream {
                status: Some(status.as_u16()),
                detail: "missing choices[0].message.content".to_string(),
            })?;

        let songs = extractor::extract_songs(&content);
        info!(
            tokens = completion.usage.as_ref().map(|u| u.total_tokens).unwrap_or(0),
            songs = songs.len(),
            "divination complete"
        );

        Ok(BardResponse {
            prompt: prompt.to_string(),
            response: content,
            songs,
            timestamp: Utc::now(),
            bard_data: BardData {
                message: "The Neural Bard has spoken...".to_string(),
                status: "divination_complete".to_string(),
                tokens_used: completion.usage.map(|u| u.total_tokens).unwrap_or(0),
                mystical_confidence: 0.95,
                model_used: completion.model.unwrap_or_else(|| self.model.clone()),
                rate_limit_remaining: None,
            },
        })
    }
}
