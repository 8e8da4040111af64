//! 유사도 랭커 - dot product 기반 top-K 선택
//!
//! 전체 청크를 선형 스캔하며 스코어를 계산하고 (인덱스 구조 없음),
//! 크기 K의 최소 힙으로 상위 후보를 유지한 뒤 임계값으로 필터링합니다.
//! 수백 개 수준의 벡터에는 이 방식으로 충분합니다.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use super::chapters::Chapter;

// ============================================================================
// Constants
// ============================================================================

/// 선택할 최대 청크 수 (K)
pub const MAX_CHUNKS: usize = 5;

/// 유사도 임계값 (이 값 초과만 채택)
pub const SIMILARITY_THRESHOLD: f32 = 0.6;

// ============================================================================
// Types
// ============================================================================

/// 스코어가 매겨진 청크
///
/// 랭킹 과정에서 후보당 한 번 생성되며 이후 불변입니다.
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    /// 유사도 스코어 (dot product)
    pub score: f32,
    /// 청크 텍스트
    pub text: String,
    /// 챕터 인덱스 (책 순서, 0-based)
    pub chapter_index: usize,
    /// 챕터 식별자
    pub chapter_id: String,
    /// 챕터 제목
    pub chapter_title: String,
}

/// 힙 정렬용 래퍼 (f32 전순서 비교)
struct HeapEntry(ScoredChunk);

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.0.score.total_cmp(&other.0.score) == std::cmp::Ordering::Equal
    }
}

impl Eq for HeapEntry {}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.score.total_cmp(&other.0.score)
    }
}

// ============================================================================
// Scoring
// ============================================================================

/// dot product 유사도
///
/// 길이가 다르거나 비어 있으면 0.0을 반환합니다.
pub fn dot_product(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// top-K 청크 선택
///
/// 모든 챕터의 모든 청크에 대해 스코어를 계산하고,
/// 상위 `k`개 중 스코어가 `threshold`를 초과하는 것만 반환합니다.
/// 결과는 스코어 내림차순입니다. 동점 간 상대 순서는 정의되지 않습니다.
///
/// 빈 결과는 "충분한 컨텍스트 없음"을 의미하며,
/// 호출자는 이 경우 생성 호출로 진행해서는 안 됩니다.
pub fn top_chunks(
    query: &[f32],
    chapters: &[Chapter],
    k: usize,
    threshold: f32,
) -> Vec<ScoredChunk> {
    if k == 0 {
        return Vec::new();
    }

    // 크기 K의 최소 힙: 힙의 최솟값보다 낮은 스코어는 바로 버림
    let mut heap: BinaryHeap<Reverse<HeapEntry>> = BinaryHeap::with_capacity(k + 1);

    for (chapter_index, chapter) in chapters.iter().enumerate() {
        for (embedding, text) in chapter.embeddings.iter().zip(chapter.chunks.iter()) {
            let score = dot_product(query, embedding);

            if heap.len() == k {
                let worst = heap
                    .peek()
                    .map(|Reverse(entry)| entry.0.score)
                    .unwrap_or(f32::NEG_INFINITY);
                if score.total_cmp(&worst) != std::cmp::Ordering::Greater {
                    continue;
                }
            }

            heap.push(Reverse(HeapEntry(ScoredChunk {
                score,
                text: text.clone(),
                chapter_index,
                chapter_id: chapter.id.clone(),
                chapter_title: chapter.title.clone(),
            })));

            if heap.len() > k {
                heap.pop();
            }
        }
    }

    // 힙에서 꺼낸 뒤 임계값 필터 (엄격 초과)
    let mut selected: Vec<ScoredChunk> = heap
        .into_iter()
        .map(|Reverse(entry)| entry.0)
        .filter(|chunk| chunk.score > threshold)
        .collect();

    selected.sort_by(|a, b| b.score.total_cmp(&a.score));

    tracing::debug!(
        selected = selected.len(),
        k,
        threshold,
        "Ranked chunks"
    );

    selected
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn chapter(id: &str, title: &str, entries: &[(&str, Vec<f32>)]) -> Chapter {
        Chapter {
            id: id.to_string(),
            title: title.to_string(),
            chunks: entries.iter().map(|(t, _)| t.to_string()).collect(),
            embeddings: entries.iter().map(|(_, e)| e.clone()).collect(),
        }
    }

    #[test]
    fn test_dot_product() {
        assert_eq!(dot_product(&[1.0, 2.0], &[3.0, 4.0]), 11.0);
        assert_eq!(dot_product(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
    }

    #[test]
    fn test_dot_product_mismatched_or_empty() {
        assert_eq!(dot_product(&[1.0, 2.0], &[1.0]), 0.0);
        assert_eq!(dot_product(&[], &[]), 0.0);
    }

    #[test]
    fn test_never_returns_more_than_k() {
        let chapters = vec![chapter(
            "I",
            "One",
            &[
                ("a", vec![0.9]),
                ("b", vec![0.8]),
                ("c", vec![0.95]),
                ("d", vec![0.7]),
                ("e", vec![0.85]),
                ("f", vec![0.99]),
                ("g", vec![0.75]),
            ],
        )];

        let result = top_chunks(&[1.0], &chapters, 5, 0.6);
        assert_eq!(result.len(), 5);

        // 스코어 내림차순, 모두 임계값 초과
        for pair in result.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
        for chunk in &result {
            assert!(chunk.score > 0.6);
        }
        // 최고 스코어가 맨 앞
        assert_eq!(result[0].text, "f");
    }

    #[test]
    fn test_threshold_is_strict() {
        // 정확히 0.6인 후보는 제외되어야 함
        let chapters = vec![chapter(
            "I",
            "One",
            &[("at", vec![0.6]), ("above", vec![0.61]), ("below", vec![0.5])],
        )];

        let result = top_chunks(&[1.0], &chapters, 5, 0.6);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].text, "above");
    }

    #[test]
    fn test_fewer_than_k_survivors() {
        let chapters = vec![chapter(
            "I",
            "One",
            &[("a", vec![0.9]), ("b", vec![0.2]), ("c", vec![0.7])],
        )];

        let result = top_chunks(&[1.0], &chapters, 5, 0.6);
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn test_empty_candidates() {
        let result = top_chunks(&[1.0], &[], 5, 0.6);
        assert!(result.is_empty());

        let empty_chapter = vec![chapter("I", "One", &[])];
        let result = top_chunks(&[1.0], &empty_chapter, 5, 0.6);
        assert!(result.is_empty());
    }

    #[test]
    fn test_k_zero() {
        let chapters = vec![chapter("I", "One", &[("a", vec![0.9])])];
        assert!(top_chunks(&[1.0], &chapters, 0, 0.6).is_empty());
    }

    #[test]
    fn test_chunks_carry_chapter_metadata() {
        let chapters = vec![
            chapter("I", "Peter Breaks Through", &[("low", vec![0.1])]),
            chapter("II", "The Shadow", &[("high", vec![0.9])]),
        ];

        let result = top_chunks(&[1.0], &chapters, 5, 0.6);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].chapter_index, 1);
        assert_eq!(result[0].chapter_id, "II");
        assert_eq!(result[0].chapter_title, "The Shadow");
    }
}
