//! OpenAI chat-completions oracle.
//!
//! Blocking reqwest client (no Tokio runtime required). One request per
//! classification; the caller owns rate limiting and retry policy.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use prodmatch_config::ai::ResolvedOracleConfig;
use prodmatch_matcher::{Oracle, OracleError, OracleRequest};

/// Error constructing the client.
#[derive(Debug)]
pub enum ClientError {
    /// No API key resolved; carries the human-readable reason.
    MissingKey(String),
    /// The HTTP client could not be built (TLS backend, etc.).
    Build(String),
}

impl std::fmt::Display for ClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClientError::MissingKey(msg) => write!(f, "{}", msg),
            ClientError::Build(msg) => write!(f, "cannot build HTTP client: {}", msg),
        }
    }
}

impl std::error::Error for ClientError {}

// ============================================================================
// OpenAI API types
// ============================================================================

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}

// ============================================================================
// Client
// ============================================================================

/// Oracle backed by an OpenAI-compatible `/v1/chat/completions` endpoint.
pub struct OpenAiOracle {
    http: reqwest::blocking::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl OpenAiOracle {
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self, ClientError> {
        let http = reqwest::blocking::Client::builder()
            .user_agent(format!("prodmatch/{}", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Build(e.to_string()))?;

        Ok(Self {
            http,
            endpoint: format!("{}/v1/chat/completions", base_url.trim_end_matches('/')),
            api_key: api_key.into(),
            model: model.into(),
        })
    }

    /// Build from resolved settings; fails if no API key was found.
    pub fn from_config(config: &ResolvedOracleConfig) -> Result<Self, ClientError> {
        let api_key = config.api_key.clone().ok_or_else(|| {
            ClientError::MissingKey(
                config
                    .blocking_reason
                    .clone()
                    .unwrap_or_else(|| "API key not configured".to_string()),
            )
        })?;
        Self::new(
            api_key,
            config.model.clone(),
            &config.base_url,
            Duration::from_secs(config.timeout_secs),
        )
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn complete(&self, prompt: &str) -> Result<String, OracleError> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage { role: "user", content: prompt }],
            temperature: 0.0,
        };

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .map_err(|e| OracleError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|e| OracleError::Network(e.to_string()))?;

        if !status.is_success() {
            let message = serde_json::from_str::<ApiErrorBody>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(OracleError::Http {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: ChatResponse = serde_json::from_str(&body)
            .map_err(|e| OracleError::InvalidResponse(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|c| c.trim().to_string())
            .ok_or_else(|| OracleError::InvalidResponse("no choices in response".to_string()))
    }
}

impl Oracle for OpenAiOracle {
    fn classify(&self, request: &OracleRequest) -> Result<String, OracleError> {
        log::debug!(
            "classifying '{}' ({}) against {} candidates",
            request.raw_product,
            request.brand,
            request.candidates.len()
        );
        self.complete(&request.prompt())
    }
}
