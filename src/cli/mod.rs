//! CLI 모듈
//!
//! bookworm CLI 명령어 정의 및 구현.
//!
//! 원래의 대시보드식 "입력마다 페이지 전체 재실행" 모델 대신
//! 명령어 + 명시적 입력 루프로 상호작용을 표현합니다.
//! 질문을 인자로 주면 1회 실행, 생략하면 대화형 루프로 동작합니다.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::cache::ResponseCache;
use crate::catalog::{CatalogStore, QueryTable};
use crate::chat::ChatSession;
use crate::completion::{
    has_anthropic_key, AnthropicCompletion, CompletionParams, CompletionProvider, CLAUDE_MODEL,
};
use crate::embedding::{has_voyage_key, EmbeddingProvider, VoyageEmbedding, VOYAGE_MODEL};
use crate::prompt::{book_prompt, catalog_prompt, extract_sql, HUMAN_PROMPT};
use crate::retrieval::{
    assemble_context, load_chapters, top_chunks, Chapter, MAX_CHUNKS, SIMILARITY_THRESHOLD,
};

// ============================================================================
// CLI Definition
// ============================================================================

#[derive(Parser)]
#[command(name = "bookworm")]
#[command(version, about = "Claude 기반 카탈로그/책 Q&A 데모", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Netflix 카탈로그에 질문 (SQL 생성 + 실행)
    Ask {
        /// 질문 (생략하면 대화형 루프)
        question: Option<String>,

        /// 카탈로그 DB 경로
        #[arg(long, default_value = "data/netflix_titles.db")]
        db: PathBuf,
    },

    /// 책 내용에 질문 (임베딩 검색 + 생성)
    Book {
        /// 질문 (생략하면 대화형 루프)
        question: Option<String>,

        /// 챕터/임베딩 파일 경로
        #[arg(long, default_value = "data/chapters.json")]
        chapters: PathBuf,
    },

    /// Marvin 챗봇과 대화 (대화형)
    Chat,

    /// 상태 확인
    Status {
        /// 카탈로그 DB 경로
        #[arg(long, default_value = "data/netflix_titles.db")]
        db: PathBuf,

        /// 챕터/임베딩 파일 경로
        #[arg(long, default_value = "data/chapters.json")]
        chapters: PathBuf,
    },
}

/// API 키 미설정 안내 문구
const MISSING_ANTHROPIC_KEY: &str =
    "[!] Anthropic API 키가 설정되지 않았습니다. (export ANTHROPIC_KEY=your-key)";
const MISSING_VOYAGE_KEY: &str =
    "[!] Voyage API 키가 설정되지 않았습니다. (export VOYAGE_API_KEY=your-key)";

// ============================================================================
// CLI Runner
// ============================================================================

/// CLI 명령어 실행
pub async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Ask { question, db } => cmd_ask(question, db).await,
        Commands::Book { question, chapters } => cmd_book(question, chapters).await,
        Commands::Chat => cmd_chat().await,
        Commands::Status { db, chapters } => cmd_status(db, chapters).await,
    }
}

// ============================================================================
// Catalog Q&A
// ============================================================================

/// 카탈로그 질문 1회의 결과
#[derive(Debug)]
pub struct CatalogAnswer {
    /// 모델 응답 전문
    pub response: String,
    /// 추출된 SQL (태그가 없으면 None)
    pub sql: Option<String>,
    /// 쿼리 실행 결과 (SQL이 있을 때만)
    pub table: Option<QueryTable>,
}

/// 카탈로그 질문 파이프라인
///
/// 프롬프트 생성 → 모델 호출 (캐시) → SQL 추출 → 쿼리 실행.
/// SQL 태그가 없으면 쿼리를 실행하지 않습니다.
pub async fn run_catalog_question(
    client: &impl CompletionProvider,
    store: &CatalogStore,
    cache: &mut ResponseCache,
    question: &str,
) -> Result<CatalogAnswer> {
    let prompt = catalog_prompt(question);
    let params = CompletionParams::new(CLAUDE_MODEL, 100).with_stop(HUMAN_PROMPT);

    let key = ResponseCache::key(&["complete", &params.model, &prompt]);
    let response = match cache.get(&key) {
        Some(hit) => {
            tracing::debug!("Completion cache hit");
            hit.to_string()
        }
        None => {
            println!(
                "[*] Claude 호출 중 ({})",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
            );
            let response = client
                .complete(&prompt, &params)
                .await
                .context("Claude 호출 실패")?;
            cache.insert(key, response.clone());
            response
        }
    };

    let sql = extract_sql(&response);
    let table = match &sql {
        Some(sql) => Some(store.query(sql).context("쿼리 실행 실패")?),
        None => None,
    };

    Ok(CatalogAnswer {
        response,
        sql,
        table,
    })
}

async fn cmd_ask(question: Option<String>, db: PathBuf) -> Result<()> {
    // 키가 없으면 에러 없이 안내만 하고 중단
    if !has_anthropic_key() {
        println!("{}", MISSING_ANTHROPIC_KEY);
        return Ok(());
    }

    let client = AnthropicCompletion::from_env().context("Anthropic 클라이언트 생성 실패")?;
    let store = CatalogStore::open(&db).context("카탈로그 DB 열기 실패")?;
    let mut cache = ResponseCache::new();

    match question {
        Some(question) => {
            let answer = run_catalog_question(&client, &store, &mut cache, &question).await?;
            print_catalog_answer(&answer);
            Ok(())
        }
        None => {
            println!("[*] 카탈로그 Q&A (종료: Ctrl-D)");
            loop {
                let Some(question) = read_line("질문> ")? else {
                    break;
                };
                if question.is_empty() {
                    continue;
                }

                match run_catalog_question(&client, &store, &mut cache, &question).await {
                    Ok(answer) => print_catalog_answer(&answer),
                    Err(e) => println!("[!] 실패: {:#}", e),
                }
            }
            Ok(())
        }
    }
}

fn print_catalog_answer(answer: &CatalogAnswer) {
    println!("\n=== 응답 ===\n{}", answer.response.trim());

    match (&answer.sql, &answer.table) {
        (Some(sql), Some(table)) => {
            println!("\n=== 쿼리 ===\n{}", sql.trim());
            println!("\n=== 결과 ===\n{}", table.render());
        }
        _ => println!("\n[!] 쿼리를 찾을 수 없습니다"),
    }
    println!();
}

// ============================================================================
// Book Q&A
// ============================================================================

/// 책 질문 1회의 결과
#[derive(Debug)]
pub enum BookAnswer {
    /// 임계값을 넘는 청크가 없음 - 생성 호출 안 함
    NoContext,
    /// 생성 완료
    Answered {
        response: String,
        chunk_count: usize,
    },
}

/// 책 질문 파이프라인
///
/// 질문 임베딩 (캐시) → top-K 선택 → 컨텍스트 조립 →
/// 프롬프트 생성 → 모델 호출 (캐시).
/// 선택된 청크가 없으면 생성 호출 없이 `NoContext`를 반환합니다.
pub async fn run_book_question(
    completion: &impl CompletionProvider,
    embedder: &impl EmbeddingProvider,
    chapters: &[Chapter],
    cache: &mut ResponseCache,
    question: &str,
) -> Result<BookAnswer> {
    // 1. 질문 임베딩
    let embed_key = ResponseCache::key(&["embed", VOYAGE_MODEL, question]);
    let query_embedding: Vec<f32> = match cache.get(&embed_key) {
        Some(hit) => serde_json::from_str(hit).context("캐시된 임베딩 파싱 실패")?,
        None => {
            let embedding = embedder
                .embed(question)
                .await
                .context("질문 임베딩 실패")?;
            cache.insert(
                embed_key,
                serde_json::to_string(&embedding).context("임베딩 직렬화 실패")?,
            );
            embedding
        }
    };

    // 2. 관련 청크 선택
    let chunks = top_chunks(&query_embedding, chapters, MAX_CHUNKS, SIMILARITY_THRESHOLD);
    if chunks.is_empty() {
        return Ok(BookAnswer::NoContext);
    }

    // 3. 컨텍스트 조립 및 생성
    let context = assemble_context(&chunks);
    let prompt = book_prompt(&context, question);
    let params = CompletionParams::new(CLAUDE_MODEL, 300).with_stop(HUMAN_PROMPT);

    let key = ResponseCache::key(&["complete", &params.model, &prompt]);
    let response = match cache.get(&key) {
        Some(hit) => hit.to_string(),
        None => {
            let response = completion
                .complete(&prompt, &params)
                .await
                .context("Claude 호출 실패")?;
            cache.insert(key, response.clone());
            response
        }
    };

    Ok(BookAnswer::Answered {
        response,
        chunk_count: chunks.len(),
    })
}

async fn cmd_book(question: Option<String>, chapters_path: PathBuf) -> Result<()> {
    if !has_anthropic_key() {
        println!("{}", MISSING_ANTHROPIC_KEY);
        return Ok(());
    }
    if !has_voyage_key() {
        println!("{}", MISSING_VOYAGE_KEY);
        return Ok(());
    }

    let chapters = load_chapters(&chapters_path).context("챕터 파일 로드 실패")?;
    println!(
        "[*] 챕터 {} 개, 청크 {} 개 로드됨",
        chapters.len(),
        chapters.iter().map(|c| c.chunks.len()).sum::<usize>()
    );

    let completion = AnthropicCompletion::from_env().context("Anthropic 클라이언트 생성 실패")?;
    let embedder = VoyageEmbedding::from_env().context("Voyage 클라이언트 생성 실패")?;
    let mut cache = ResponseCache::new();

    match question {
        Some(question) => {
            let answer =
                run_book_question(&completion, &embedder, &chapters, &mut cache, &question)
                    .await?;
            print_book_answer(&answer);
            Ok(())
        }
        None => {
            println!("[*] 책 Q&A (종료: Ctrl-D)");
            loop {
                let Some(question) = read_line("질문> ")? else {
                    break;
                };
                if question.is_empty() {
                    continue;
                }

                match run_book_question(&completion, &embedder, &chapters, &mut cache, &question)
                    .await
                {
                    Ok(answer) => print_book_answer(&answer),
                    Err(e) => println!("[!] 실패: {:#}", e),
                }
            }
            Ok(())
        }
    }
}

fn print_book_answer(answer: &BookAnswer) {
    match answer {
        BookAnswer::NoContext => {
            println!("[!] 충분한 컨텍스트를 찾을 수 없습니다");
        }
        BookAnswer::Answered {
            response,
            chunk_count,
        } => {
            println!("\n=== 응답 (청크 {} 개 사용) ===\n{}\n", chunk_count, response.trim());
        }
    }
}

// ============================================================================
// Chat
// ============================================================================

/// 대화 1턴 수행
///
/// 사용자 입력을 세션에 추가하고, 페르소나 + 전체 대화를 보내
/// 응답을 받아 세션에 추가한 뒤 반환합니다.
pub async fn chat_turn(
    client: &impl CompletionProvider,
    session: &mut ChatSession,
    input: &str,
) -> Result<String> {
    session.push_user(input);

    let messages = session.with_intro();
    let reply = client
        .chat(&messages, 500)
        .await
        .context("Claude 호출 실패")?;

    session.push_assistant(reply.clone());
    Ok(reply)
}

async fn cmd_chat() -> Result<()> {
    if !has_anthropic_key() {
        println!("{}", MISSING_ANTHROPIC_KEY);
        return Ok(());
    }

    let client = AnthropicCompletion::from_env().context("Anthropic 클라이언트 생성 실패")?;
    let mut session = ChatSession::new();

    println!("[*] Marvin 챗봇 (종료: Ctrl-D)\n");
    println!("Marvin: {}", crate::chat::GREETING);

    loop {
        let Some(input) = read_line("you> ")? else {
            break;
        };
        if input.is_empty() {
            continue;
        }

        match chat_turn(&client, &mut session, &input).await {
            Ok(reply) => println!("Marvin: {}", reply.trim()),
            Err(e) => println!("[!] 실패: {:#}", e),
        }
    }

    Ok(())
}

// ============================================================================
// Status
// ============================================================================

async fn cmd_status(db: PathBuf, chapters_path: PathBuf) -> Result<()> {
    println!("bookworm v{}", env!("CARGO_PKG_VERSION"));
    println!();

    // API 키 상태
    if has_anthropic_key() {
        println!("[OK] Anthropic API 키: 설정됨");
    } else {
        println!("[!] Anthropic API 키: 미설정 (export ANTHROPIC_KEY=your-key)");
    }

    if has_voyage_key() {
        println!("[OK] Voyage API 키: 설정됨");
    } else {
        println!("[!] Voyage API 키: 미설정 (export VOYAGE_API_KEY=your-key)");
    }

    // 카탈로그 DB
    match CatalogStore::open(&db) {
        Ok(store) => match store.stats() {
            Ok(stats) => {
                println!("[OK] 카탈로그: {} 타이틀 ({})", stats.title_count, db.display());
            }
            Err(e) => println!("[!] 카탈로그 통계 조회 실패: {}", e),
        },
        Err(e) => {
            println!("[!] 카탈로그 DB 열기 실패: {}", e);
        }
    }

    // 챕터 파일
    match load_chapters(&chapters_path) {
        Ok(chapters) => {
            println!(
                "[OK] 챕터: {} 개, 청크 {} 개 ({})",
                chapters.len(),
                chapters.iter().map(|c| c.chunks.len()).sum::<usize>(),
                chapters_path.display()
            );
        }
        Err(e) => {
            println!("[!] 챕터 파일 로드 실패: {}", e);
        }
    }

    Ok(())
}

// ============================================================================
// Helper Functions
// ============================================================================

/// 프롬프트를 출력하고 한 줄 읽기
///
/// EOF(Ctrl-D)면 `None`, 아니면 트리밍된 입력을 반환합니다.
fn read_line(prompt: &str) -> Result<Option<String>> {
    print!("{}", prompt);
    std::io::stdout().flush().context("stdout flush 실패")?;

    let mut line = String::new();
    let bytes = std::io::stdin()
        .read_line(&mut line)
        .context("stdin 읽기 실패")?;

    if bytes == 0 {
        println!();
        return Ok(None);
    }

    Ok(Some(line.trim().to_string()))
}

// ============================================================================
// Tests
// ============================================================================
