use axum::{
    body::Body,
    http::{header, Method, Request, Response, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use neural_bard::config::Config;
use serde_json::{json, Value};
use tower::ServiceExt;

fn test_config() -> Config {
    Config {
        llm_api_key: None,
        llm_api_url: "http://127.0.0.1:1/chat".to_string(),
        llm_model: "llama3-8b-8192".to_string(),
        llm_temperature: 0.7,
        spotify_client_id: None,
        spotify_client_secret: None,
        spotify_api_url: "http://127.0.0.1:1/v1".to_string(),
        spotify_accounts_url: "http://127.0.0.1:1".to_string(),
        spotify_redirect_uri: "http://localhost/callback".to_string(),
        server_host: "127.0.0.1".to_string(),
        server_port: 0,
    }
}

fn app() -> Router {
    neural_bard::app(test_config())
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn neural_bard_rejects_out_of_range_song_count() {
    let response = app()
        .oneshot(post_json(
            "/neural-bard",
            json!({"prompt": "rock classics", "numberOfSongs": 100}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Number of songs must be between 5 and 50");
}

#[tokio::test]
async fn neural_bard_rejects_missing_prompt_with_json_error() {
    let response = app()
        .oneshot(post_json("/neural-bard", json!({"numberOfSongs": 25})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Prompt must be a non-empty string");
}

#[tokio::test]
async fn neural_bard_rejects_short_prompts() {
    let response = app()
        .oneshot(post_json("/neural-bard", json!({"prompt": "hi"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Prompt too short (min 3 characters)");
}

#[tokio::test]
async fn neural_bard_rejects_scripty_prompts() {
    let response = app()
        .oneshot(post_json(
            "/neural-bard",
            json!({"prompt": "<script>alert('playlist')</script>"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Invalid content detected");
}

#[tokio::test]
async fn neural_bard_reports_missing_api_key() {
    let response = app()
        .oneshot(post_json(
            "/neural-bard",
            json!({"prompt": "sad songs for a rainy day"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert_eq!(body["error"], "LLM API key not configured");
}

/// Serves one canned chat-completion reply on an ephemeral port.
async fn spawn_chat_stand_in() -> String {
    use axum::routing::post;

    let app = Router::new().route(
        "/chat",
        post(|| async {
            axum::Json(json!({
                "choices": [{
                    "message": {
                        "content": "1. The Beatles - Hey Jude\n2. Queen - Bohemian Rhapsody"
                    }
                }],
                "usage": { "total_tokens": 42 },
                "model": "llama3-8b-8192",
            }))
        }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}/chat")
}

#[tokio::test]
async fn neural_bard_success_returns_songs_and_rate_headers() {
    let mut config = test_config();
    config.llm_api_key = Some("test-key".to_string());
    config.llm_api_url = spawn_chat_stand_in().await;
    let app = neural_bard::app(config);

    let response = app
        .oneshot(post_json(
            "/neural-bard",
            json!({"prompt": "sad songs for a rainy day"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("x-ratelimit-remaining").unwrap(),
        "9"
    );
    let reset = response
        .headers()
        .get("x-ratelimit-reset")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(
        chrono::DateTime::parse_from_rfc3339(&reset).is_ok(),
        "reset header should be an ISO timestamp: {reset}"
    );

    let body = body_json(response).await;
    assert_eq!(body["prompt"], "sad songs for a rainy day");
    assert_eq!(
        body["songs"],
        json!(["The Beatles - Hey Jude", "Queen - Bohemian Rhapsody"])
    );
    assert_eq!(body["bardData"]["status"], "divination_complete");
    assert_eq!(body["bardData"]["tokens_used"], 42);
    assert_eq!(body["bardData"]["rateLimitRemaining"], 9);
}

#[tokio::test]
async fn neural_bard_rate_limits_per_client() {
    let app = app();

    for i in 0..10 {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/neural-bard")
            .header(header::CONTENT_TYPE, "application/json")
            .header("x-forwarded-for", "203.0.113.9")
            .body(Body::from(json!({"prompt": "more synthwave"}).to_string()))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        // Admitted by the limiter; fails later on the unset API key.
        assert_eq!(
            response.status(),
            StatusCode::INTERNAL_SERVER_ERROR,
            "request {} should pass the limiter",
            i + 1
        );
    }

    let request = Request::builder()
        .method(Method::POST)
        .uri("/neural-bard")
        .header(header::CONTENT_TYPE, "application/json")
        .header("x-forwarded-for", "203.0.113.9")
        .body(Body::from(json!({"prompt": "more synthwave"}).to_string()))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(response.headers().get(header::RETRY_AFTER).unwrap(), "60");
    let body = body_json(response).await;
    assert_eq!(body["retryAfter"], 60);

    // A different client is unaffected.
    let request = Request::builder()
        .method(Method::POST)
        .uri("/neural-bard")
        .header(header::CONTENT_TYPE, "application/json")
        .header("x-forwarded-for", "203.0.113.10")
        .body(Body::from(json!({"prompt": "more synthwave"}).to_string()))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn playlist_requires_access_token() {
    let response = app()
        .oneshot(post_json(
            "/spotify-playlist",
            json!({"prompt": "road trip", "songs": ["Queen - Bohemian Rhapsody"]}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Access token required");
}

#[tokio::test]
async fn playlist_requires_songs_array() {
    let response = app()
        .oneshot(post_json(
            "/spotify-playlist",
            json!({"prompt": "road trip", "accessToken": "token-123"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Songs array is required");
}

#[tokio::test]
async fn token_exchange_requires_code() {
    let response = app()
        .oneshot(post_json("/spotify-token-exchange", json!({})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Authorization code is required");
}

#[tokio::test]
async fn token_exchange_reports_unconfigured_credentials() {
    let response = app()
        .oneshot(post_json(
            "/spotify-token-exchange",
            json!({"code": "abc123"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Server configuration error");
}

#[tokio::test]
async fn wrong_verb_is_method_not_allowed() {
    let request = Request::builder()
        .method(Method::GET)
        .uri("/neural-bard")
        .body(Body::empty())
        .unwrap();
    let response = app().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Method not allowed");
}

#[tokio::test]
async fn preflight_allows_any_origin() {
    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/neural-bard")
        .header(header::ORIGIN, "https://example.com")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .unwrap();
    let response = app().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .unwrap(),
        "*"
    );
    let allow_methods = response
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_METHODS)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(allow_methods.contains("POST"));
}

#[tokio::test]
async fn error_responses_carry_cors_headers() {
    let mut request = post_json("/neural-bard", json!({"prompt": "hi"}));
    request
        .headers_mut()
        .insert(header::ORIGIN, "https://example.com".parse().unwrap());
    let response = app().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .unwrap(),
        "*"
    );
}
