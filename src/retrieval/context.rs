//! 컨텍스트 조립 - 선택된 청크를 챕터별로 묶어 렌더링
//!
//! 선택된 청크를 챕터 순서(오름차순)로 그룹화하고,
//! 챕터마다 헤더 + 청크 텍스트 블록을 만듭니다.
//! 챕터 내 청크 순서는 선택 순서를 그대로 유지합니다.

use super::ranker::ScoredChunk;

/// 같은 챕터 내 청크 구분자
pub const CHUNK_SEP: &str = "...";

/// 챕터 블록 구분자
pub const CHAPTER_SEP: &str = "\n\n";

/// 선택된 청크로 컨텍스트 블록 생성
///
/// 출력은 챕터 인덱스 오름차순이며, 챕터마다
/// `CHAPTER {id}: {title}` 헤더 아래 청크 텍스트가
/// `CHUNK_SEP`로 연결됩니다.
pub fn assemble_context(chunks: &[ScoredChunk]) -> String {
    if chunks.is_empty() {
        return String::new();
    }

    // stable sort: 같은 챕터 안에서는 선택 순서 유지
    let mut by_chapter: Vec<&ScoredChunk> = chunks.iter().collect();
    by_chapter.sort_by_key(|chunk| chunk.chapter_index);

    let mut blocks: Vec<String> = Vec::new();
    let mut i = 0;

    while i < by_chapter.len() {
        let chapter_index = by_chapter[i].chapter_index;
        let mut texts: Vec<&str> = Vec::new();

        while i < by_chapter.len() && by_chapter[i].chapter_index == chapter_index {
            texts.push(&by_chapter[i].text);
            i += 1;
        }

        let first = by_chapter[i - texts.len()];
        blocks.push(format!(
            "CHAPTER {}: {}\n{}",
            first.chapter_id,
            first.chapter_title,
            texts.join(CHUNK_SEP)
        ));
    }

    blocks.join(CHAPTER_SEP)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn scored(text: &str, chapter_index: usize, id: &str, title: &str) -> ScoredChunk {
        ScoredChunk {
            score: 0.9,
            text: text.to_string(),
            chapter_index,
            chapter_id: id.to_string(),
            chapter_title: title.to_string(),
        }
    }

    #[test]
    fn test_groups_in_chapter_order() {
        // 선택 순서는 스코어순이라 챕터 순서와 다름
        let chunks = vec![
            scored("from chapter three", 2, "III", "The Island"),
            scored("from chapter one", 0, "I", "Peter Breaks Through"),
            scored("also from chapter three", 2, "III", "The Island"),
        ];

        let context = assemble_context(&chunks);

        let pos_one = context.find("CHAPTER I:").unwrap();
        let pos_three = context.find("CHAPTER III:").unwrap();
        assert!(pos_one < pos_three);

        // 같은 챕터 청크는 한 블록에 CHUNK_SEP로 연결
        assert!(context.contains("from chapter three...also from chapter three"));
    }

    #[test]
    fn test_no_chunk_lost_or_duplicated() {
        let chunks = vec![
            scored("alpha", 1, "II", "The Shadow"),
            scored("beta", 0, "I", "Peter Breaks Through"),
            scored("gamma", 1, "II", "The Shadow"),
            scored("delta", 3, "IV", "The Flight"),
        ];

        let context = assemble_context(&chunks);

        for chunk in &chunks {
            assert_eq!(context.matches(chunk.text.as_str()).count(), 1);
        }
    }

    #[test]
    fn test_chapter_header_format() {
        let chunks = vec![scored("text here", 0, "XII", "The Children Are Carried Off")];

        let context = assemble_context(&chunks);
        assert_eq!(
            context,
            "CHAPTER XII: The Children Are Carried Off\ntext here"
        );
    }

    #[test]
    fn test_chapters_separated_by_blank_line() {
        let chunks = vec![
            scored("first", 0, "I", "One"),
            scored("second", 1, "II", "Two"),
        ];

        let context = assemble_context(&chunks);
        assert_eq!(
            context,
            "CHAPTER I: One\nfirst\n\nCHAPTER II: Two\nsecond"
        );
    }

    #[test]
    fn test_empty_selection() {
        assert_eq!(assemble_context(&[]), "");
    }

    #[test]
    fn test_selection_order_preserved_within_chapter() {
        // 선택 순서(스코어순)가 챕터 내 텍스트 순서로 유지됨
        let chunks = vec![
            scored("picked first", 0, "I", "One"),
            scored("picked second", 0, "I", "One"),
        ];

        let context = assemble_context(&chunks);
        assert!(context.contains("picked first...picked second"));
    }
}
