use std::env;

pub const DEFAULT_LLM_API_URL: &str = "https://api.groq.com/openai/v1/chat/completions";
pub const DEFAULT_LLM_MODEL: &str = "llama3-8b-8192";

#[derive(Debug, Clone)]
pub struct Config {
    /// API key for the chat-completions service. Optional: the /neural-bard
    /// endpoint reports a configuration error when it is unset.
    pub llm_api_key: Option<String>,
    pub llm_api_url: String,
    pub llm_model: String,
    /// Sampling temperature for divinations.
    pub llm_temperature: f32,
    pub spotify_client_id: Option<String>,
    pub spotify_client_secret: Option<String>,
    pub spotify_api_url: String,
    pub spotify_accounts_url: String,
    /// Fallback redirect URI when the token-exchange request omits one.
    pub spotify_redirect_uri: String,
    pub server_host: String,
    pub server_port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let llm_temperature = env::var("LLM_TEMPERATURE")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(0.7);

        Ok(Config {
            llm_api_key: env::var("LLM_API_KEY").ok(),
            llm_api_url: env::var("LLM_API_URL")
                .unwrap_or_else(|_| DEFAULT_LLM_API_URL.to_string()),
            llm_model: env::var("LLM_MODEL").unwrap_or_else(|_| DEFAULT_LLM_MODEL.to_string()),
            llm_temperature,
            spotify_client_id: env::var("SPOTIFY_CLIENT_ID").ok(),
            spotify_client_secret: env::var("SPOTIFY_CLIENT_SECRET").ok(),
            spotify_api_url: env::var("SPOTIFY_API_URL")
                .unwrap_or_else(|_| "https://api.spotify.com/v1".to_string()),
            spotify_accounts_url: env::var("SPOTIFY_ACCOUNTS_URL")
                .unwrap_or_else(|_| "https://accounts.spotify.com".to_string()),
            spotify_redirect_uri: env::var("SPOTIFY_REDIRECT_URI").unwrap_or_else(|_| {
                "https://spotify-llm-driven-playlist.netlify.app/auth/callback/".to_string()
            }),
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "8000".to_string())
                .parse()
                .unwrap_or(8000),
        })
    }
}
