//! 텍스트 생성 모듈 - Anthropic API 클라이언트
//!
//! 렌더링된 프롬프트를 보내고 생성된 텍스트를 받는 클라이언트입니다.
//! 카탈로그 Q&A / 책 Q&A는 completions 엔드포인트를,
//! 챗봇은 messages 엔드포인트를 사용합니다.
//!
//! 재시도 로직은 없으며 실패는 그대로 전파됩니다.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::chat::ChatMessage;

// ============================================================================
// Constants
// ============================================================================

/// Anthropic completions 엔드포인트
/// source: https://docs.anthropic.com/en/api/complete
const ANTHROPIC_COMPLETE_URL: &str = "https://api.anthropic.com/v1/complete";

/// Anthropic messages 엔드포인트
/// source: https://docs.anthropic.com/en/api/messages
const ANTHROPIC_MESSAGES_URL: &str = "https://api.anthropic.com/v1/messages";

/// API 버전 헤더 값
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Q&A용 기본 모델
pub const CLAUDE_MODEL: &str = "claude-2";

/// 챗봇용 모델
pub const CHAT_MODEL: &str = "claude-3-haiku-20240307";

// ============================================================================
// Types
// ============================================================================

/// 생성 파라미터
#[derive(Debug, Clone)]
pub struct CompletionParams {
    /// 모델 식별자
    pub model: String,
    /// 최대 출력 토큰 수
    pub max_tokens: u32,
    /// 생성 중단 시퀀스
    pub stop_sequences: Vec<String>,
}

impl CompletionParams {
    /// 모델과 최대 토큰 수로 생성
    pub fn new(model: &str, max_tokens: u32) -> Self {
        Self {
            model: model.to_string(),
            max_tokens,
            stop_sequences: Vec::new(),
        }
    }

    /// 중단 시퀀스 추가
    pub fn with_stop(mut self, stop: &str) -> Self {
        self.stop_sequences.push(stop.to_string());
        self
    }
}

// ============================================================================
// CompletionProvider Trait
// ============================================================================

/// 텍스트 생성 프로바이더 트레이트
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// 프롬프트 기반 생성 (completions)
    async fn complete(&self, prompt: &str, params: &CompletionParams) -> Result<String>;

    /// 대화 기반 생성 (messages)
    ///
    /// `messages`는 user/assistant 역할이 번갈아 나오는 전체 대화입니다.
    async fn chat(&self, messages: &[ChatMessage], max_tokens: u32) -> Result<String>;
}

// ============================================================================
// AnthropicCompletion
// ============================================================================

/// Anthropic API 클라이언트
#[derive(Debug)]
pub struct AnthropicCompletion {
    api_key: String,
    client: reqwest::Client,
}

impl AnthropicCompletion {
    /// 새 클라이언트 생성
    ///
    /// # Arguments
    /// * `api_key` - Anthropic API 키
    pub fn new(api_key: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { api_key, client })
    }

    /// 환경변수에서 API 키를 읽어 생성
    ///
    /// 우선순위: ANTHROPIC_KEY > ANTHROPIC_API_KEY
    pub fn from_env() -> Result<Self> {
        Self::new(get_anthropic_key()?)
    }

    /// 에러 응답을 anyhow 에러로 변환
    fn api_error(status: reqwest::StatusCode, body: String) -> anyhow::Error {
        if let Ok(error) = serde_json::from_str::<ApiErrorResponse>(&body) {
            anyhow::anyhow!(
                "Anthropic API error ({}): {}",
                error.error.error_type,
                error.error.message
            )
        } else {
            anyhow::anyhow!("Anthropic API error ({}): {}", status, body)
        }
    }
}

#[async_trait]
impl CompletionProvider for AnthropicCompletion {
    async fn complete(&self, prompt: &str, params: &CompletionParams) -> Result<String> {
        let request = CompleteRequest {
            model: &params.model,
            prompt,
            max_tokens_to_sample: params.max_tokens,
            stop_sequences: &params.stop_sequences,
        };

        tracing::debug!(model = %params.model, "Calling completions endpoint");

        let response = self
            .client
            .post(ANTHROPIC_COMPLETE_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .await
            .context("Failed to send completion request")?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context("Failed to read completion response body")?;

        if !status.is_success() {
            return Err(Self::api_error(status, body));
        }

        let parsed: CompleteResponse =
            serde_json::from_str(&body).context("Failed to parse completion response")?;

        Ok(parsed.completion)
    }

    async fn chat(&self, messages: &[ChatMessage], max_tokens: u32) -> Result<String> {
        let request = MessagesRequest {
            model: CHAT_MODEL,
            max_tokens,
            messages,
        };

        tracing::debug!(model = CHAT_MODEL, turns = messages.len(), "Calling messages endpoint");

        let response = self
            .client
            .post(ANTHROPIC_MESSAGES_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .await
            .context("Failed to send messages request")?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context("Failed to read messages response body")?;

        if !status.is_success() {
            return Err(Self::api_error(status, body));
        }

        let parsed: MessagesResponse =
            serde_json::from_str(&body).context("Failed to parse messages response")?;

        if parsed.role != "assistant" {
            anyhow::bail!("Unexpected response role: {}", parsed.role);
        }

        parsed
            .content
            .into_iter()
            .find(|block| block.block_type == "text")
            .map(|block| block.text)
            .context("No text content in messages response")
    }
}

// ============================================================================
// Wire Types
// ============================================================================

/// completions 요청 본문
#[derive(Debug, Serialize)]
struct CompleteRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    max_tokens_to_sample: u32,
    stop_sequences: &'a [String],
}

/// completions 응답
#[derive(Debug, Deserialize)]
struct CompleteResponse {
    completion: String,
}

/// messages 요청 본문
#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: &'a [ChatMessage],
}

/// messages 응답
#[derive(Debug, Deserialize)]
struct MessagesResponse {
    role: String,
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    text: String,
}

/// API 에러 응답
#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    #[serde(rename = "type")]
    error_type: String,
    message: String,
}

// ============================================================================
// API Key Management
// ============================================================================

/// Anthropic API 키 로드 (환경변수에서)
///
/// 우선순위:
/// 1. `ANTHROPIC_KEY` 환경변수
/// 2. `ANTHROPIC_API_KEY` 환경변수
pub fn get_anthropic_key() -> Result<String> {
    if let Ok(key) = std::env::var("ANTHROPIC_KEY") {
        if !key.is_empty() {
            return Ok(key);
        }
    }

    if let Ok(key) = std::env::var("ANTHROPIC_API_KEY") {
        if !key.is_empty() {
            return Ok(key);
        }
    }

    anyhow::bail!(
        "Anthropic API key not found. Set ANTHROPIC_KEY or ANTHROPIC_API_KEY environment variable.\n\
         Get your API key at: https://console.anthropic.com/"
    )
}

/// Anthropic API 키 존재 여부 확인
pub fn has_anthropic_key() -> bool {
    for var in ["ANTHROPIC_KEY", "ANTHROPIC_API_KEY"] {
        if let Ok(key) = std::env::var(var) {
            if !key.is_empty() {
                return true;
            }
        }
    }

    false
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::Role;

    #[test]
    fn test_completion_params_builder() {
        let params = CompletionParams::new(CLAUDE_MODEL, 100).with_stop("\n\nHuman:");

        assert_eq!(params.model, "claude-2");
        assert_eq!(params.max_tokens, 100);
        assert_eq!(params.stop_sequences, vec!["\n\nHuman:".to_string()]);
    }

    #[test]
    fn test_complete_request_serialization() {
        let stops = vec!["\n\nHuman:".to_string()];
        let request = CompleteRequest {
            model: "claude-2",
            prompt: "\n\nHuman: hi\n\nAssistant:",
            max_tokens_to_sample: 100,
            stop_sequences: &stops,
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["model"], "claude-2");
        assert_eq!(value["max_tokens_to_sample"], 100);
        assert_eq!(value["stop_sequences"][0], "\n\nHuman:");
    }

    #[test]
    fn test_messages_request_serialization() {
        let messages = vec![ChatMessage {
            role: Role::User,
            content: "hello".to_string(),
        }];
        let request = MessagesRequest {
            model: CHAT_MODEL,
            max_tokens: 500,
            messages: &messages,
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["messages"][0]["role"], "user");
        assert_eq!(value["messages"][0]["content"], "hello");
    }

    #[test]
    fn test_messages_response_parsing() {
        let body = r#"{
            "role": "assistant",
            "content": [{"type": "text", "text": "Life. Don't talk to me about life."}]
        }"#;

        let parsed: MessagesResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.role, "assistant");
        assert_eq!(parsed.content[0].text, "Life. Don't talk to me about life.");
    }
}
