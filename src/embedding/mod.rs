//! 임베딩 모듈 - Voyage API를 통한 질문 벡터화
//!
//! 질문 텍스트를 임베딩 벡터로 변환하는 Voyage 프로바이더입니다.
//! 책 Q&A의 유사도 검색에 사용됩니다.
//!
//! ## 사용법
//! ```rust,ignore
//! let embedder = VoyageEmbedding::from_env()?;
//! let embedding = embedder.embed("How does Captain Hook die?").await?;
//! ```

use std::future::Future;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// EmbeddingProvider Trait
// ============================================================================

/// 임베딩 프로바이더 트레이트
///
/// 텍스트를 벡터로 변환하는 인터페이스입니다.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// 단일 텍스트 임베딩
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// 모델 이름
    fn model(&self) -> &str;
}

// ============================================================================
// Voyage Embedding
// ============================================================================

/// Voyage 임베딩 API 엔드포인트
/// source: https://docs.voyageai.com/reference/embeddings-api
const VOYAGE_EMBED_URL: &str = "https://api.voyageai.com/v1/embeddings";

/// 기본 임베딩 모델
pub const VOYAGE_MODEL: &str = "voyage-2";

/// 429 응답 시 대기 시간 (고정 1분, 재시도 횟수 제한 없음)
pub const RATE_LIMIT_WAIT: Duration = Duration::from_secs(60);

/// 임베딩 호출 에러
///
/// 429(rate limit)는 재시도 대상이므로 별도 배리언트로 구분합니다.
#[derive(Debug, Error)]
pub enum EmbedError {
    /// API 호출 한도 초과 (재시도 대상)
    #[error("rate limit exceeded (429)")]
    RateLimited,

    /// Voyage API 에러 응답
    #[error("Voyage API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// 네트워크/전송 실패
    #[error("embedding request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// 응답 파싱 실패
    #[error("failed to parse embedding response: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Voyage 임베딩 구현체
#[derive(Debug)]
pub struct VoyageEmbedding {
    api_key: String,
    client: reqwest::Client,
    rate_limit_wait: Duration,
}

impl VoyageEmbedding {
    /// 새 Voyage 임베딩 인스턴스 생성
    ///
    /// # Arguments
    /// * `api_key` - Voyage API 키
    pub fn new(api_key: String) -> Result<Self> {
        Self::with_rate_limit_wait(api_key, RATE_LIMIT_WAIT)
    }

    /// 429 대기 시간을 지정하여 생성
    pub fn with_rate_limit_wait(api_key: String, rate_limit_wait: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(EmbedError::Transport)?;

        Ok(Self {
            api_key,
            client,
            rate_limit_wait,
        })
    }

    /// 환경변수(`VOYAGE_API_KEY`)에서 API 키를 읽어 생성
    pub fn from_env() -> Result<Self> {
        Self::new(get_voyage_key()?)
    }

    /// 1회 임베딩 시도 (재시도 없음)
    async fn try_embed(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        let request = EmbedRequest {
            input: vec![text],
            model: VOYAGE_MODEL,
            input_type: "query",
        };

        let response = self
            .client
            .post(VOYAGE_EMBED_URL)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if status.as_u16() == 429 {
            return Err(EmbedError::RateLimited);
        }

        if !status.is_success() {
            let message = serde_json::from_str::<VoyageError>(&body)
                .map(|e| e.detail)
                .unwrap_or(body);
            return Err(EmbedError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: EmbedResponse = serde_json::from_str(&body)?;
        parsed
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| EmbedError::Api {
                status: status.as_u16(),
                message: "empty embedding data".to_string(),
            })
    }
}

#[async_trait]
impl EmbeddingProvider for VoyageEmbedding {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let embedding =
            retry_on_rate_limit(self.rate_limit_wait, || self.try_embed(text)).await?;
        Ok(embedding)
    }

    fn model(&self) -> &str {
        VOYAGE_MODEL
    }
}

/// Voyage API 요청 본문
/// source: https://docs.voyageai.com/reference/embeddings-api
#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    input: Vec<&'a str>,
    model: &'a str,
    input_type: &'a str,
}

/// Voyage API 응답
#[derive(Debug, Deserialize)]
struct EmbedResponse {
    data: Vec<EmbedData>,
}

#[derive(Debug, Deserialize)]
struct EmbedData {
    embedding: Vec<f32>,
}

/// Voyage API 에러 응답
#[derive(Debug, Deserialize)]
struct VoyageError {
    detail: String,
}

// ============================================================================
// Rate Limit Retry
// ============================================================================

/// 429 전용 재시도 루프
///
/// rate limit 에러일 때만 고정 시간 대기 후 다시 시도합니다.
/// 대기 횟수 제한은 없으며, 다른 에러는 즉시 전파됩니다.
pub(crate) async fn retry_on_rate_limit<T, F, Fut>(
    wait: Duration,
    mut op: F,
) -> Result<T, EmbedError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, EmbedError>>,
{
    loop {
        match op().await {
            Err(EmbedError::RateLimited) => {
                tracing::warn!("Rate limit hit (429), waiting {:?} before retry", wait);
                tokio::time::sleep(wait).await;
            }
            other => return other,
        }
    }
}

// ============================================================================
// API Key Management
// ============================================================================

/// Voyage API 키 로드 (`VOYAGE_API_KEY` 환경변수)
pub fn get_voyage_key() -> Result<String> {
    if let Ok(key) = std::env::var("VOYAGE_API_KEY") {
        if !key.is_empty() {
            return Ok(key);
        }
    }

    anyhow::bail!(
        "Voyage API key not found. Set VOYAGE_API_KEY environment variable.\n\
         Get your API key at: https://dash.voyageai.com/"
    )
}

/// Voyage API 키 존재 여부 확인
pub fn has_voyage_key() -> bool {
    std::env::var("VOYAGE_API_KEY")
        .map(|key| !key.is_empty())
        .unwrap_or(false)
}

// ============================================================================
// Tests
// ============================================================================
