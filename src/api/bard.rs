use crate::api::{client_key, AppState};
use crate::error::{AppError, Result};
use crate::models::{BardRequest, BardResponse};
use crate::services::rate_limit::RATE_LIMIT_WINDOW;
use chrono::{SecondsFormat, Utc};
use axum::{
    extract::State,
    http::HeaderMap,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use tracing::{info, warn};
use validator::{Validate, ValidationErrors};

/// POST /neural-bard
pub async fn divine(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<BardRequest>,
) -> Result<impl IntoResponse> {
    let client = client_key(&headers);

    let decision = state.rate_limiter.check(&client);
    if !decision.allowed {
        warn!(client = %client, "rate limit exceeded");
        return Err(AppError::RateLimited);
    }

    req.validate()
        .map_err(|e| AppError::Validation(first_message(&e)))?;

    let bard = state
        .bard
        .as_ref()
        .ok_or_else(|| AppError::Config("LLM API key not configured".to_string()))?;

    let mut response: BardResponse = bard.divine(&req.prompt, req.number_of_songs).await?;
    response.bard_data.rate_limit_remaining = Some(decision.remaining);

    info!(
        client = %client,
        prompt_len = req.prompt.len(),
        response_len = response.response.len(),
        "neural bard request served"
    );

    let reset = (Utc::now() + chrono::Duration::seconds(RATE_LIMIT_WINDOW.as_secs() as i64))
        .to_rfc3339_opts(SecondsFormat::Millis, true);
    Ok((
        [
            ("x-ratelimit-remaining", decision.remaining.to_string()),
            ("x-ratelimit-reset", reset),
        ],
        Json(response),
    ))
}

/// Flattens validator's per-field error map into the single user-facing
/// message the API contract promises.
fn first_message(errors: &ValidationErrors) -> String {
    errors
        .field_errors()
        .values()
        .flat_map(|field| field.iter())
        .find_map(|error| error.message.as_ref().map(|m| m.to_string()))
        .unwrap_or_else(|| errors.to_string())
}
