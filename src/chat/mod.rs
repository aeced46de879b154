//! 채팅 백엔드 모듈 - Ollama
//!
//! 사용자 메시지 하나를 보내고 생성된 텍스트를 받는 단순 요청/응답 호출입니다.
//! 스트리밍과 재시도는 하지 않습니다.
//!
//! ref: https://github.com/ollama/ollama/blob/main/docs/api.md#generate-a-chat-completion

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::AppConfig;

// ============================================================================
// ChatBackend Trait
// ============================================================================

/// 채팅 완성 백엔드
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// user 메시지 하나에 대한 응답 텍스트
    async fn complete(&self, prompt: &str) -> Result<String>;

    /// 에러 메시지에 쓰이는 백엔드 이름
    fn name(&self) -> &str;
}

// ============================================================================
// Ollama
// ============================================================================

/// Ollama `/api/chat` 클라이언트
#[derive(Debug, Clone)]
pub struct OllamaChat {
    base_url: Url,
    model: String,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct OllamaError {
    error: String,
}

impl OllamaChat {
    /// 새 클라이언트 생성
    ///
    /// `base_url`의 경로(`http://proxy/ollama` 등)는 유지되고 그 아래에 `api/chat`이 붙습니다.
    pub fn new(mut base_url: Url, model: impl Into<String>, timeout: Duration) -> Result<Self> {
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            base_url,
            model: model.into(),
            client,
        })
    }

    /// 설정에서 생성
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Self::new(
            config.ollama_url.clone(),
            config.chat_model.clone(),
            config.request_timeout,
        )
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl ChatBackend for OllamaChat {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let url = self
            .base_url
            .join("api/chat")
            .context("Failed to build chat URL")?;

        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            stream: false,
        };

        tracing::debug!("POST {} (model: {})", url, self.model);

        let response = self
            .client
            .post(url)
            .json(&request)
            .send()
            .await
            .context("Failed to send chat request")?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context("Failed to read response body")?;

        if !status.is_success() {
            if let Ok(error) = serde_json::from_str::<OllamaError>(&body) {
                anyhow::bail!("{} (status code: {})", error.error, status.as_u16());
            }
            anyhow::bail!("Ollama API error ({}): {}", status, body);
        }

        let parsed: ChatResponse =
            serde_json::from_str(&body).context("Failed to parse chat response")?;
        Ok(parsed.message.content)
    }

    fn name(&self) -> &str {
        "Ollama"
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> OllamaChat {
        OllamaChat::new(
            Url::parse(&server.uri()).unwrap(),
            "llama3.1",
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_base_url_path_prefix_is_kept() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/ollama/api/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "message": {"role": "assistant", "content": "proxied"}
            })))
            .expect(2)
            .mount(&server)
            .await;

        for base in [format!("{}/ollama", server.uri()), format!("{}/ollama/", server.uri())] {
            let chat = OllamaChat::new(
                Url::parse(&base).unwrap(),
                "llama3.1",
                Duration::from_secs(5),
            )
            .unwrap();
            assert_eq!(chat.complete("ping").await.unwrap(), "proxied");
        }
    }

    #[tokio::test]
    async fn test_complete_returns_message_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .and(body_partial_json(serde_json::json!({
                "model": "llama3.1",
                "stream": false,
                "messages": [{"role": "user", "content": "ping"}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "model": "llama3.1",
                "message": {"role": "assistant", "content": "pong"},
                "done": true
            })))
            .expect(1)
            .mount(&server)
            .await;

        let answer = client_for(&server).complete("ping").await.unwrap();
        assert_eq!(answer, "pong");
    }

    #[tokio::test]
    async fn test_unknown_model_error_surfaces() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "error": "model \"llama3.1\" not found, try pulling it first"
            })))
            .mount(&server)
            .await;

        let err = client_for(&server).complete("hi").await.unwrap_err();
        let message = err.to_string();
        assert!(message.contains("not found"));
        assert!(message.contains("404"));
    }

    #[tokio::test]
    async fn test_malformed_body_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = client_for(&server).complete("hi").await.unwrap_err();
        assert!(err.to_string().contains("Failed to parse chat response"));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_error() {
        let chat = OllamaChat::new(
            Url::parse("http://127.0.0.1:9").unwrap(),
            "llama3.1",
            Duration::from_secs(2),
        )
        .unwrap();

        let err = chat.complete("hi").await.unwrap_err();
        assert!(err.to_string().contains("Failed to send chat request"));
    }
}
