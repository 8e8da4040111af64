//! 챕터 저장소 - 사전 계산된 청크/임베딩 로드
//!
//! 책 전체를 청크로 나누고 임베딩한 결과를 JSON 파일에서 읽습니다.
//! 프로세스 시작 시 한 번 로드되며 이후 읽기 전용입니다.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

// ============================================================================
// Types
// ============================================================================

/// 책의 한 챕터
///
/// `chunks`와 `embeddings`는 같은 길이의 병렬 시퀀스입니다
/// (i번째 청크의 임베딩이 i번째 벡터).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chapter {
    /// 챕터 식별자 (예: "I", "XII")
    pub id: String,
    /// 챕터 제목
    pub title: String,
    /// 청크 텍스트 (책 내 순서대로)
    pub chunks: Vec<String>,
    /// 청크별 임베딩 벡터
    pub embeddings: Vec<Vec<f32>>,
}

// ============================================================================
// Loading
// ============================================================================

/// 챕터 파일 로드
///
/// 챕터마다 청크/임베딩 시퀀스 길이가 일치하는지 검증합니다.
/// 불일치는 로드 에러로 처리합니다.
pub fn load_chapters(path: &Path) -> Result<Vec<Chapter>> {
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read chapters file: {}", path.display()))?;

    let chapters: Vec<Chapter> =
        serde_json::from_str(&data).context("Failed to parse chapters file")?;

    for chapter in &chapters {
        if chapter.chunks.len() != chapter.embeddings.len() {
            anyhow::bail!(
                "Chapter {} has {} chunks but {} embeddings",
                chapter.id,
                chapter.chunks.len(),
                chapter.embeddings.len()
            );
        }
    }

    tracing::debug!(
        chapters = chapters.len(),
        chunks = chapters.iter().map(|c| c.chunks.len()).sum::<usize>(),
        "Loaded chapters"
    );

    Ok(chapters)
}

// ============================================================================
// Tests
// ============================================================================
