//! Text generation over the Ollama HTTP API.

use crate::error::AgentError;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

/// Produces raw model text for a prompt. One call is one attempt.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, AgentError>;

    fn model_name(&self) -> &str;

    /// Names of the models the backend can serve.
    async fn list_models(&self) -> Result<Vec<String>, AgentError> {
        Err(AgentError::NotConfigured(format!(
            "{} cannot list models",
            self.model_name()
        )))
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelTag>,
}

#[derive(Deserialize)]
struct ModelTag {
    name: String,
}

/// Map transport failures onto attempt errors.
pub(crate) fn map_http_error(error: reqwest::Error, request_timeout: Duration) -> AgentError {
    if error.is_timeout() {
        AgentError::Timeout(request_timeout)
    } else if error.is_connect() {
        AgentError::RequestFailed(format!("Connection error: {error}"))
    } else if error.is_decode() {
        AgentError::MalformedResponse(error.to_string())
    } else {
        AgentError::RequestFailed(format!("HTTP error: {error}"))
    }
}

/// Map a non-success status onto an attempt error.
pub(crate) fn status_error(status: StatusCode, body: &str) -> AgentError {
    match status.as_u16() {
        429 => AgentError::RateLimited(format!("status {status}: {body}")),
        _ => AgentError::RequestFailed(format!("Request failed with status {status}: {body}")),
    }
}

pub(crate) fn build_http_client(
    connect_timeout: Duration,
    request_timeout: Duration,
) -> Result<Client, AgentError> {
    Client::builder()
        .connect_timeout(connect_timeout)
        .timeout(request_timeout)
        .build()
        .map_err(|e| AgentError::NotConfigured(format!("Failed to create HTTP client: {e}")))
}

pub struct OllamaClient {
    client: Client,
    model: String,
    base_url: String,
    request_timeout: Duration,
}

impl OllamaClient {
    pub fn new(
        model: impl Into<String>,
        base_url: Option<String>,
        connect_timeout: Duration,
        request_timeout: Duration,
    ) -> Result<Self, AgentError> {
        let model = model.into();
        if model.trim().is_empty() {
            return Err(AgentError::NotConfigured("model name is empty".to_string()));
        }
        let base_url = base_url
            .filter(|u| !u.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string());
        Ok(Self {
            client: build_http_client(connect_timeout, request_timeout)?,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
            request_timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl TextGenerator for OllamaClient {
    async fn generate(&self, prompt: &str) -> Result<String, AgentError> {
        let url = format!("{}/api/generate", self.base_url);
        let request = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
        };
        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| map_http_error(e, self.request_timeout))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(status_error(status, &body));
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| AgentError::MalformedResponse(format!("Failed to parse response: {e}")))?;
        if body.response.trim().is_empty() {
            return Err(AgentError::MalformedResponse(
                "model returned an empty response".to_string(),
            ));
        }
        Ok(body.response)
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    async fn list_models(&self) -> Result<Vec<String>, AgentError> {
        let url = format!("{}/api/tags", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| map_http_error(e, self.request_timeout))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(status_error(status, &body));
        }

        let tags: TagsResponse = response
            .json()
            .await
            .map_err(|e| AgentError::MalformedResponse(format!("Failed to parse model list: {e}")))?;
        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_model_is_rejected() {
        let err = OllamaClient::new(" ", None, Duration::from_secs(1), Duration::from_secs(1))
            .err()
            .unwrap();
        assert!(matches!(err, AgentError::NotConfigured(_)));
    }

    #[test]
    fn base_url_defaults_and_is_trimmed() {
        let client = OllamaClient::new("mistral:7b-instruct", None, Duration::from_secs(1), Duration::from_secs(1)).unwrap();
        assert_eq!(client.base_url(), DEFAULT_OLLAMA_URL);
        let client = OllamaClient::new(
            "m",
            Some("http://gpu-box:11434/".to_string()),
            Duration::from_secs(1),
            Duration::from_secs(1),
        )
        .unwrap();
        assert_eq!(client.base_url(), "http://gpu-box:11434");
        assert_eq!(client.model_name(), "m");
    }

    #[test]
    fn rate_limit_status_is_distinguished() {
        assert!(matches!(
            status_error(StatusCode::TOO_MANY_REQUESTS, "slow down"),
            AgentError::RateLimited(_)
        ));
        let err = status_error(StatusCode::INTERNAL_SERVER_ERROR, "boom");
        assert!(err.to_string().contains("500"));
    }

    #[test]
    fn tags_response_yields_model_names() {
        let tags: TagsResponse = serde_json::from_str(
            r#"{"models": [
                {"name": "llama3.1:70b", "size": 39969745349, "digest": "a"},
                {"name": "mistral:7b-instruct", "modified_at": "2024-07-01T00:00:00Z"}
            ]}"#,
        )
        .unwrap();
        let names: Vec<String> = tags.models.into_iter().map(|m| m.name).collect();
        assert_eq!(names, vec!["llama3.1:70b", "mistral:7b-instruct"]);

        let empty: TagsResponse = serde_json::from_str("{}").unwrap();
        assert!(empty.models.is_empty());
    }

    #[test]
    fn request_body_shape() {
        let body = serde_json::to_value(GenerateRequest {
            model: "llama3.1:70b",
            prompt: "hi",
            stream: false,
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"model": "llama3.1:70b", "prompt": "hi", "stream": false}));
    }
}
