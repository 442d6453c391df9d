//! Anthropic Messages API client.

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use crate::http::{build_client, send_json};
use crate::service::{AiError, CompletionRequest, GenerativeService};

const ANTHROPIC_API_BASE: &str = "https://api.anthropic.com";
const ANTHROPIC_VERSION: &str = "2023-06-01";

// ============================================================================
// Anthropic API types
// ============================================================================

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: &'a str,
    messages: [Message<'a>; 1],
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    #[serde(default)]
    text: Option<String>,
}

// ============================================================================
// Client
// ============================================================================

pub struct AnthropicClient {
    http: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl AnthropicClient {
    pub fn new(api_key: String, model: String, timeout_secs: u64) -> Result<Self, AiError> {
        Self::with_base_url(api_key, model, ANTHROPIC_API_BASE.to_string(), timeout_secs)
    }

    pub fn with_base_url(
        api_key: String,
        model: String,
        base_url: String,
        timeout_secs: u64,
    ) -> Result<Self, AiError> {
        Ok(Self {
            http: build_client(timeout_secs)?,
            api_key,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

impl GenerativeService for AnthropicClient {
    fn complete(&self, request: &CompletionRequest) -> Result<String, AiError> {
        log::debug!(
            "anthropic: model={} max_tokens={} temperature={}",
            self.model,
            request.max_tokens,
            request.temperature
        );

        let body = MessagesRequest {
            model: &self.model,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            system: &request.system,
            messages: [Message { role: "user", content: &request.user }],
        };

        let response: MessagesResponse = send_json(
            self.http
                .post(format!("{}/v1/messages", self.base_url))
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .json(&body),
        )?;

        response
            .content
            .into_iter()
            .find(|block| block.block_type == "text")
            .and_then(|block| block.text)
            .ok_or(AiError::EmptyResponse)
    }
}
