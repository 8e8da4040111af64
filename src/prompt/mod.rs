//! 프롬프트 모듈 - 템플릿 렌더링 및 SQL 추출
//!
//! 고정 지시문 템플릿에 컨텍스트와 질문을 끼워 넣고,
//! 모델 응답에서 `<sql>` 태그로 감싼 쿼리를 추출합니다.

use regex::Regex;

// ============================================================================
// Turn Markers
// ============================================================================

/// Human 턴 마커 (completions 프롬프트 형식)
pub const HUMAN_PROMPT: &str = "\n\nHuman:";

/// Assistant 턴 마커
pub const AI_PROMPT: &str = "\n\nAssistant:";

// ============================================================================
// Catalog Prompt
// ============================================================================

/// Netflix 카탈로그 스키마 설명 (하드코딩)
///
/// 모델이 이 스키마 기준으로 SQL을 생성하도록 유도합니다.
const CATALOG_SCHEMA: &str = "\
Assume a database about TV shows and movies on Netflix with the following tables and columns exists:

titles
* show_id (string): Unique ID for every Movie / TV Show (example: \"s8804\")
* type (string): Identifier - A Movie or TV Show (examples: \"Movie\", \"TV Show\")
* title (string): Title of the Movie / TV Show (example: \"Jailbirds New Orleans\")
* director (string): Director of the Movie (example: \"Rajiv Chilaka\")
* starring (string): Actors involved in the movie / show (example: \"David Attenborough\")
* country (string): Country where the movie / show was produced (example: \"United States\")
* date_added (date): Date it was added on Netflix (example: \"2021-09-24\")
* release_year (int): Actual Release year of the move / show (example: 2022)
* rating (string): TV Rating of the movie / show (example: \"TV-MA\")
* duration (string): Total Duration - in minutes or number of seasons (examples: \"2 Seasons\")
* listed_in (string): Categories in which the show is listed (example: \"Docuseries, Reality TV\")
* description (string): Description of the Movie / TV show (example: \"Dragged from civilian life, a former superhero...\")

Generate a SQL command between <sql> and </sql> that answers user's question.";

/// 카탈로그 Q&A 프롬프트 생성
///
/// 스키마 설명을 컨텍스트로, 사용자 질문을 question 블록으로 렌더링합니다.
pub fn catalog_prompt(question: &str) -> String {
    format!(
        "{HUMAN_PROMPT} In case you don't have the information in the context provided, \
         please respond with 'I don't know'.\n\
         <context>\n{CATALOG_SCHEMA}\n</context>\n\
         <question>\n{question}\n</question>\n{AI_PROMPT}"
    )
}

// ============================================================================
// Book Prompt
// ============================================================================

/// 책 Q&A 지시문
const BOOK_INSTRUCTIONS: &str = "\
You are an assistant that answers user questions about the book Peter Pan by James Matthew Barrie.

Answer the question below briefly and based solely on the snippets provided, using citations as appropriate.
Note that the snippets are provided in the order in which they appear in the book.";

/// 책 Q&A 프롬프트 생성
///
/// # Arguments
/// * `context` - 챕터별로 조립된 스니펫 블록
/// * `question` - 사용자 질문
pub fn book_prompt(context: &str, question: &str) -> String {
    format!(
        "{HUMAN_PROMPT}\n{BOOK_INSTRUCTIONS}\n\n\
         Snippets from the book:\n\n{context}\n\n\
         Question:\n\n{question}\n{AI_PROMPT}"
    )
}

// ============================================================================
// SQL Extraction
// ============================================================================

/// 응답 텍스트에서 SQL 추출
///
/// 첫 번째 `<sql>...</sql>` 쌍 안의 문자열을 반환합니다 (first match wins).
/// 태그가 없으면 `None` - 에러가 아닌 "쿼리 없음" 신호입니다.
pub fn extract_sql(text: &str) -> Option<String> {
    let pattern = Regex::new(r"(?s)<sql>(.*?)</sql>").unwrap();

    pattern
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

// ============================================================================
// Tests
// ============================================================================
