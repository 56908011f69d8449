use serde::{Deserialize, Serialize};

use super::EngineError;
use crate::config::EndpointConfig;

/// Bounded sampling parameters for a single generation call. Serialized
/// camelCase to match the generateContent wire format.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f32,
    pub top_k: u32,
    pub top_p: f32,
    pub max_output_tokens: u32,
}

impl GenerationConfig {
    /// Settings for the personalized suggestion path.
    pub fn personalized() -> Self {
        Self {
            temperature: 0.3,
            top_k: 1,
            top_p: 1.0,
            max_output_tokens: 1024,
        }
    }

    /// Tighter settings for the symptom-only diagnosis path.
    pub fn diagnosis() -> Self {
        Self {
            temperature: 0.1,
            top_k: 1,
            top_p: 1.0,
            max_output_tokens: 1024,
        }
    }

    /// Temperature clamped to the supported [0, 1] range.
    pub fn clamped(mut self) -> Self {
        self.temperature = self.temperature.clamp(0.0, 1.0);
        self
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self::personalized()
    }
}

/// Generation endpoint abstraction (allows mocking).
pub trait GenerationClient {
    fn generate(&self, prompt: &str, config: &GenerationConfig) -> Result<String, EngineError>;
}

/// HTTP client for the Gemini generateContent endpoint.
///
/// One synchronous request/response exchange per call: no retries, no
/// streaming. The timeout is fixed at construction.
pub struct GeminiClient {
    endpoint: String,
    api_key: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl GeminiClient {
    pub fn new(config: &EndpointConfig) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            endpoint: config.url.clone(),
            api_key: config.api_key.clone(),
            client,
            timeout_secs: config.timeout_secs,
        }
    }

    /// Default endpoint with the credential from the environment.
    pub fn from_env() -> Option<Self> {
        EndpointConfig::from_env().map(|config| Self::new(&config))
    }
}

/// Request body for generateContent
#[derive(Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(rename = "generationConfig")]
    generation_config: &'a GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

/// Response envelope from generateContent. Every level is optional so
/// a missing text field surfaces as GenerationMalformed rather than a
/// deserialization error.
#[derive(Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<ResponseCandidate>>,
}

#[derive(Deserialize)]
struct ResponseCandidate {
    content: Option<ResponseContent>,
}

#[derive(Deserialize)]
struct ResponseContent {
    parts: Option<Vec<ResponsePart>>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

/// Pull candidates[0].content.parts[0].text out of the envelope.
fn extract_candidate_text(envelope: GenerateContentResponse) -> Result<String, EngineError> {
    envelope
        .candidates
        .into_iter()
        .flatten()
        .next()
        .and_then(|c| c.content)
        .and_then(|c| c.parts)
        .into_iter()
        .flatten()
        .next()
        .and_then(|p| p.text)
        .ok_or_else(|| {
            EngineError::GenerationMalformed("response envelope has no candidate text".into())
        })
}

impl GenerationClient for GeminiClient {
    fn generate(&self, prompt: &str, config: &GenerationConfig) -> Result<String, EngineError> {
        let config = config.clone().clamped();
        let body = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
            generation_config: &config,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .map_err(|e| {
                // without_url: reqwest error text can embed the full URL,
                // which carries the credential as a query parameter.
                if e.is_timeout() {
                    EngineError::GenerationUnavailable(format!(
                        "request timed out after {}s",
                        self.timeout_secs
                    ))
                } else {
                    EngineError::GenerationUnavailable(e.without_url().to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().unwrap_or_default();
            return Err(EngineError::GenerationUnavailable(format!(
                "status {status}: {detail}"
            )));
        }

        let envelope: GenerateContentResponse = response
            .json()
            .map_err(|e| EngineError::GenerationMalformed(e.without_url().to_string()))?;

        extract_candidate_text(envelope)
    }
}

/// Mock generation client for testing. Returns a configured response
/// and records every prompt it was asked to generate from.
pub struct MockGenerationClient {
    response: Result<String, String>,
    prompts: std::sync::Arc<std::sync::Mutex<Vec<String>>>,
}

impl MockGenerationClient {
    pub fn new(response: &str) -> Self {
        Self {
            response: Ok(response.to_string()),
            prompts: Default::default(),
        }
    }

    /// A mock whose calls fail as transport errors.
    pub fn unavailable(detail: &str) -> Self {
        Self {
            response: Err(detail.to_string()),
            prompts: Default::default(),
        }
    }

    /// Shared handle to the recorded prompts.
    pub fn prompt_log(&self) -> std::sync::Arc<std::sync::Mutex<Vec<String>>> {
        self.prompts.clone()
    }
}

impl GenerationClient for MockGenerationClient {
    fn generate(&self, prompt: &str, _config: &GenerationConfig) -> Result<String, EngineError> {
        if let Ok(mut log) = self.prompts.lock() {
            log.push(prompt.to_string());
        }
        match &self.response {
            Ok(text) => Ok(text.clone()),
            Err(detail) => Err(EngineError::GenerationUnavailable(detail.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_GENERATION_ENDPOINT;

    #[test]
    fn config_serializes_camel_case() {
        let json = serde_json::to_string(&GenerationConfig::personalized()).unwrap();
        assert!(json.contains("\"topK\":1"));
        assert!(json.contains("\"topP\":1.0"));
        assert!(json.contains("\"maxOutputTokens\":1024"));
    }

    #[test]
    fn path_presets_differ_only_in_temperature() {
        let personalized = GenerationConfig::personalized();
        let diagnosis = GenerationConfig::diagnosis();
        assert!((personalized.temperature - 0.3).abs() < f32::EPSILON);
        assert!((diagnosis.temperature - 0.1).abs() < f32::EPSILON);
        assert_eq!(personalized.max_output_tokens, diagnosis.max_output_tokens);
    }

    #[test]
    fn temperature_is_clamped_to_unit_range() {
        let mut config = GenerationConfig::default();
        config.temperature = 3.5;
        assert!((config.clamped().temperature - 1.0).abs() < f32::EPSILON);

        let mut config = GenerationConfig::default();
        config.temperature = -0.5;
        assert!(config.clamped().temperature.abs() < f32::EPSILON);
    }

    #[test]
    fn client_constructor_keeps_endpoint() {
        let client = GeminiClient::new(&EndpointConfig::new(
            DEFAULT_GENERATION_ENDPOINT,
            "test-key",
            5,
        ));
        assert_eq!(client.endpoint, DEFAULT_GENERATION_ENDPOINT);
        assert_eq!(client.timeout_secs, 5);
    }

    #[test]
    fn missing_candidate_text_is_malformed() {
        let envelope: GenerateContentResponse = serde_json::from_str(r#"{"candidates":[]}"#).unwrap();
        assert!(matches!(
            extract_candidate_text(envelope),
            Err(EngineError::GenerationMalformed(_))
        ));

        let envelope: GenerateContentResponse =
            serde_json::from_str(r#"{"candidates":[{"content":{"parts":[{}]}}]}"#).unwrap();
        assert!(extract_candidate_text(envelope).is_err());
    }

    #[test]
    fn nested_text_is_extracted() {
        let envelope: GenerateContentResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"[]"}]}}]}"#,
        )
        .unwrap();
        assert_eq!(extract_candidate_text(envelope).unwrap(), "[]");
    }

    #[test]
    fn mock_returns_configured_response_and_records_prompt() {
        let mock = MockGenerationClient::new("response text");
        let log = mock.prompt_log();
        let out = mock.generate("a prompt", &GenerationConfig::default()).unwrap();
        assert_eq!(out, "response text");
        assert_eq!(log.lock().unwrap().as_slice(), ["a prompt"]);
    }

    #[test]
    fn mock_unavailable_fails_as_transport_error() {
        let mock = MockGenerationClient::unavailable("connection refused");
        let err = mock.generate("p", &GenerationConfig::default()).unwrap_err();
        assert!(matches!(err, EngineError::GenerationUnavailable(_)));
    }
}
