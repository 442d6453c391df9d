//! Local model client for an Ollama chat endpoint.

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use crate::http::{build_client, send_json};
use crate::service::{AiError, CompletionRequest, GenerativeService};

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    stream: bool,
    options: ChatOptions,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatOptions {
    temperature: f32,
    /// Ollama's name for the output token bound
    num_predict: u32,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: Option<ChatResponseMessage>,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}

pub struct OllamaClient {
    http: Client,
    model: String,
    base_url: String,
}

impl OllamaClient {
    pub fn with_base_url(base_url: String, model: String, timeout_secs: u64) -> Result<Self, AiError> {
        Ok(Self {
            http: build_client(timeout_secs)?,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

impl GenerativeService for OllamaClient {
    fn complete(&self, request: &CompletionRequest) -> Result<String, AiError> {
        log::debug!("ollama: endpoint={} model={}", self.base_url, self.model);

        let body = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage { role: "system", content: &request.system },
                ChatMessage { role: "user", content: &request.user },
            ],
            stream: false,
            options: ChatOptions {
                temperature: request.temperature,
                num_predict: request.max_tokens,
            },
        };

        let response: ChatResponse =
            send_json(self.http.post(format!("{}/api/chat", self.base_url)).json(&body))?;

        response
            .message
            .map(|m| m.content)
            .filter(|c| !c.is_empty())
            .ok_or(AiError::EmptyResponse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    #[test]
    fn test_non_streaming_chat() {
        let server = MockServer::start();

        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/api/chat")
                .json_body(serde_json::json!({
                    "model": "llama3:8b",
                    "messages": [
                        { "role": "system", "content": "sys" },
                        { "role": "user", "content": "hello" }
                    ],
                    "stream": false,
                    "options": { "temperature": 0.5, "num_predict": 200 }
                }));
            then.status(200)
                .header("content-type", "application/json")
                .json_body(serde_json::json!({
                    "model": "llama3:8b",
                    "message": { "role": "assistant", "content": "hey" },
                    "done": true
                }));
        });

        let client = OllamaClient::with_base_url(server.base_url(), "llama3:8b".into(), 5).unwrap();
        let req = CompletionRequest::new("sys", "hello").max_tokens(200).temperature(0.5);
        let text = client.complete(&req).unwrap();

        mock.assert();
        assert_eq!(text, "hey");
    }

    #[test]
    fn test_missing_model_error() {
        let server = MockServer::start();

        server.mock(|when, then| {
            when.method(POST).path("/api/chat");
            then.status(404)
                .json_body(serde_json::json!({ "error": "model \"nope\" not found" }));
        });

        let client = OllamaClient::with_base_url(server.base_url(), "nope".into(), 5).unwrap();
        let err = client.complete(&CompletionRequest::new("s", "u")).unwrap_err();
        assert_eq!(err, AiError::Api { status: 404, message: "model \"nope\" not found".into() });
    }
}
