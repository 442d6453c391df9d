//! Shared request plumbing for the provider clients.

use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder};
use serde::de::DeserializeOwned;

use crate::service::AiError;

pub(crate) fn build_client(timeout_secs: u64) -> Result<Client, AiError> {
    Client::builder()
        .user_agent(format!("studybuddy/{}", env!("CARGO_PKG_VERSION")))
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| AiError::Network(e.to_string()))
}

/// Send a request and decode a JSON success body.
///
/// Non-2xx responses become `AiError::Api`, carrying the provider's own
/// message when the body has one.
pub(crate) fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, AiError> {
    let response = request
        .send()
        .map_err(|e| AiError::Network(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        let error_text = response.text().unwrap_or_default();
        return Err(AiError::Api {
            status: status.as_u16(),
            message: extract_error_message(&error_text),
        });
    }

    response.json::<T>().map_err(|e| AiError::Parse(e.to_string()))
}

/// Pull `error.message` (OpenAI, Anthropic) or a bare `error` string (Ollama)
/// out of an error body, falling back to the raw text.
fn extract_error_message(body: &str) -> String {
    let Ok(json) = serde_json::from_str::<serde_json::Value>(body) else {
        return body.to_string();
    };
    json["error"]["message"]
        .as_str()
        .or_else(|| json["error"].as_str())
        .map(String::from)
        .unwrap_or_else(|| body.to_string())
}
