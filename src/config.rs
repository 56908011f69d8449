/// Application-level constants
pub const APP_NAME: &str = "Recepta";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default Gemini generateContent endpoint.
pub const DEFAULT_GENERATION_ENDPOINT: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent";

/// Environment variable carrying the generation endpoint credential.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Default per-request timeout for the generation endpoint. The model
/// endpoint is the only uncontrolled third party in the engine, so the
/// bound stays in single-digit seconds.
pub const DEFAULT_GENERATION_TIMEOUT_SECS: u64 = 8;

/// Default tracing filter when RUST_LOG is unset.
pub fn default_log_filter() -> String {
    format!("info,{}=debug", env!("CARGO_PKG_NAME"))
}

/// Connection settings for the external generation endpoint. The API
/// key is an opaque credential supplied by the deployment environment.
#[derive(Debug, Clone)]
pub struct EndpointConfig {
    pub url: String,
    pub api_key: String,
    pub timeout_secs: u64,
}

impl EndpointConfig {
    pub fn new(url: &str, api_key: &str, timeout_secs: u64) -> Self {
        Self {
            url: url.to_string(),
            api_key: api_key.to_string(),
            timeout_secs,
        }
    }

    /// Default endpoint with the credential read from the environment.
    /// Returns None when the key is not configured.
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var(API_KEY_ENV).ok()?;
        Some(Self::new(
            DEFAULT_GENERATION_ENDPOINT,
            &api_key,
            DEFAULT_GENERATION_TIMEOUT_SECS,
        ))
    }
}
