//! Retrieval 모듈 - 책 Q&A 검색 파이프라인
//!
//! - chapters: 사전 계산된 챕터/청크/임베딩 로드
//! - ranker: dot product 기반 top-K 선택
//! - context: 챕터별 컨텍스트 블록 조립

mod chapters;
mod context;
mod ranker;

// Re-exports
pub use chapters::{load_chapters, Chapter};
pub use context::{assemble_context, CHAPTER_SEP, CHUNK_SEP};
pub use ranker::{
    dot_product, top_chunks, ScoredChunk, MAX_CHUNKS, SIMILARITY_THRESHOLD,
};
