//! HTTP client for an OpenAI-compatible `/chat/completions` endpoint.

use async_trait::async_trait;
use reqwest::StatusCode;
use skald_core::error::DomainError;
use skald_core::service::{
    ProseGenerator, ProseRequest, ReasoningRequest, ReasoningResponse, ReasoningService,
    ServiceError,
};
use tracing::{debug, instrument, warn};

use crate::config::LlmConfig;
use crate::prompt::{prose_messages, reasoning_messages};
use crate::wire::{ChatCompletionRequest, ChatCompletionResponse, ChatMessage, parse_choice};

/// Chat-completion client serving as both reasoning service and prose
/// generator.
#[derive(Debug, Clone)]
pub struct ChatCompletionClient {
    http: reqwest::Client,
    config: LlmConfig,
}

impl ChatCompletionClient {
    /// Builds a client whose requests time out after
    /// `config.request_timeout`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the HTTP client cannot be
    /// built.
    pub fn new(config: LlmConfig) -> Result<Self, DomainError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| DomainError::Infrastructure(format!("building HTTP client: {e}")))?;
        Ok(Self::with_http(config, http))
    }

    /// Uses a preconfigured HTTP client.
    #[must_use]
    pub fn with_http(config: LlmConfig, http: reqwest::Client) -> Self {
        Self { http, config }
    }

    /// The endpoint settings in use.
    #[must_use]
    pub fn config(&self) -> &LlmConfig {
        &self.config
    }

    #[instrument(skip_all, fields(model = %self.config.model))]
    async fn complete(&self, messages: Vec<ChatMessage>) -> Result<String, ServiceError> {
        let body = ChatCompletionRequest {
            model: self.config.model.clone(),
            messages,
            temperature: self.config.temperature,
        };
        let mut request = self.http.post(self.config.completions_url()).json(&body);
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();
        if let Some(error) = status_error(status) {
            warn!(%status, "chat completion refused");
            return Err(error);
        }

        let completion: ChatCompletionResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                ServiceError::Timeout
            } else {
                ServiceError::Malformed(e.to_string())
            }
        })?;
        let content = completion.into_content()?;
        debug!(chars = content.len(), "chat completion received");
        Ok(content)
    }
}

#[async_trait]
impl ReasoningService for ChatCompletionClient {
    async fn choose(&self, request: &ReasoningRequest) -> Result<ReasoningResponse, ServiceError> {
        let content = self.complete(reasoning_messages(request)).await?;
        parse_choice(&content)
    }
}

#[async_trait]
impl ProseGenerator for ChatCompletionClient {
    async fn generate(&self, request: &ProseRequest) -> Result<String, ServiceError> {
        let content = self.complete(prose_messages(request)).await?;
        Ok(content.trim().to_owned())
    }
}

fn transport_error(error: reqwest::Error) -> ServiceError {
    if error.is_timeout() {
        ServiceError::Timeout
    } else {
        ServiceError::Unavailable(error.to_string())
    }
}

fn status_error(status: StatusCode) -> Option<ServiceError> {
    if status == StatusCode::TOO_MANY_REQUESTS {
        Some(ServiceError::RateLimited)
    } else if status.is_success() {
        None
    } else {
        Some(ServiceError::Unavailable(format!("HTTP {status}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use skald_core::ids::{AgentId, TurnNumber};
    use skald_core::service::NarrativeStyle;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::task::JoinHandle;

    /// Answers one HTTP request with `status_line` and `body`, returning the
    /// raw request it received.
    async fn serve_once(status_line: &'static str, body: String) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let request = read_request(&mut socket).await;
            let response = format!(
                "HTTP/1.1 {status_line}\r\ncontent-type: application/json\r\n\
                 content-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
            request
        });
        (format!("http://{addr}/v1"), handle)
    }

    async fn read_request(socket: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0_u8; 4096];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            let text = String::from_utf8_lossy(&buf);
            if let Some(head_end) = text.find("\r\n\r\n") {
                let length = text[..head_end]
                    .lines()
                    .find_map(|line| {
                        let (name, value) = line.split_once(':')?;
                        name.eq_ignore_ascii_case("content-length")
                            .then(|| value.trim().parse::<usize>().ok())
                            .flatten()
                    })
                    .unwrap_or(0);
                if buf.len() >= head_end + 4 + length {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    }

    fn client(base_url: &str, api_key: Option<&str>) -> ChatCompletionClient {
        let mut config = LlmConfig::new(base_url);
        config.api_key = api_key.map(str::to_owned);
        let http = reqwest::Client::builder().no_proxy().build().unwrap();
        ChatCompletionClient::with_http(config, http)
    }

    fn completion(content: &str) -> String {
        json!({"choices": [{"message": {"role": "assistant", "content": content}}]}).to_string()
    }

    fn reasoning_request() -> ReasoningRequest {
        ReasoningRequest {
            agent_id: AgentId::new("aria"),
            turn: TurnNumber::FIRST,
            context: "You are Aria.".to_owned(),
            character_profile: json!({"name": "Aria"}),
            allowed_actions: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_choose_parses_completion_and_sends_bearer_token() {
        // Arrange
        let reply = completion(r#"{"chosen_action": "observe", "rationale": "Careful."}"#);
        let (base_url, server) = serve_once("200 OK", reply).await;

        // Act
        let response = client(&base_url, Some("sk-test"))
            .choose(&reasoning_request())
            .await
            .unwrap();

        // Assert
        assert_eq!(response.chosen_action, "observe");
        assert_eq!(response.rationale_text, "Careful.");
        let request = server.await.unwrap();
        assert!(request.starts_with("POST /v1/chat/completions "));
        assert!(request.to_ascii_lowercase().contains("authorization: bearer sk-test"));
        assert!(request.contains(r#""model":"gpt-4o-mini""#));
    }

    #[tokio::test]
    async fn test_generate_trims_prose() {
        let (base_url, server) = serve_once("200 OK", completion("  Aria waits.\n")).await;
        let request = ProseRequest {
            turn: TurnNumber::FIRST,
            style: NarrativeStyle::Terse,
            characters: vec!["Aria".to_owned()],
            beats: vec!["Aria waits.".to_owned()],
        };

        let text = client(&base_url, None).generate(&request).await.unwrap();

        assert_eq!(text, "Aria waits.");
        let raw = server.await.unwrap();
        assert!(!raw.to_ascii_lowercase().contains("authorization:"));
    }

    #[tokio::test]
    async fn test_too_many_requests_is_rate_limited() {
        let (base_url, _server) = serve_once("429 Too Many Requests", String::new()).await;

        let error = client(&base_url, None)
            .choose(&reasoning_request())
            .await
            .unwrap_err();

        assert_eq!(error, ServiceError::RateLimited);
    }

    #[tokio::test]
    async fn test_server_error_is_unavailable() {
        let (base_url, _server) = serve_once("503 Service Unavailable", String::new()).await;

        let error = client(&base_url, None)
            .choose(&reasoning_request())
            .await
            .unwrap_err();

        assert!(matches!(error, ServiceError::Unavailable(_)));
    }

    #[tokio::test]
    async fn test_non_json_body_is_malformed() {
        let (base_url, _server) = serve_once("200 OK", "<html>".to_owned()).await;

        let error = client(&base_url, None)
            .choose(&reasoning_request())
            .await
            .unwrap_err();

        assert!(matches!(error, ServiceError::Malformed(_)));
    }

    #[tokio::test]
    async fn test_prose_reply_without_choice_json_is_malformed_for_reasoning() {
        let (base_url, _server) = serve_once("200 OK", completion("I shall rest.")).await;

        let error = client(&base_url, None)
            .choose(&reasoning_request())
            .await
            .unwrap_err();

        assert!(matches!(error, ServiceError::Malformed(_)));
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_error(StatusCode::OK), None);
        assert_eq!(
            status_error(StatusCode::TOO_MANY_REQUESTS),
            Some(ServiceError::RateLimited)
        );
        assert!(matches!(
            status_error(StatusCode::BAD_GATEWAY),
            Some(ServiceError::Unavailable(_))
        ));
    }
}
