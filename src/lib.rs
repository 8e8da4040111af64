//! bookworm - Claude 기반 Q&A 데모
//!
//! Netflix 카탈로그 SQL Q&A, 책(Peter Pan) RAG Q&A,
//! Marvin 페르소나 챗봇을 제공하는 데모 CLI입니다.

pub mod cache;
pub mod catalog;
pub mod chat;
pub mod cli;
pub mod completion;
pub mod embedding;
pub mod prompt;
pub mod retrieval;

// Re-exports
pub use cache::ResponseCache;
pub use catalog::{CatalogStats, CatalogStore, QueryTable};
pub use chat::{ChatMessage, ChatSession, Role};
pub use completion::{
    get_anthropic_key, has_anthropic_key, AnthropicCompletion, CompletionParams,
    CompletionProvider, CHAT_MODEL, CLAUDE_MODEL,
};
pub use embedding::{
    get_voyage_key, has_voyage_key, EmbedError, EmbeddingProvider, VoyageEmbedding, VOYAGE_MODEL,
};
pub use prompt::{book_prompt, catalog_prompt, extract_sql, AI_PROMPT, HUMAN_PROMPT};
pub use retrieval::{
    assemble_context, dot_product, load_chapters, top_chunks, Chapter, ScoredChunk, MAX_CHUNKS,
    SIMILARITY_THRESHOLD,
};
