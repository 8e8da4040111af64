//! 카탈로그 모듈 - rusqlite 기반 쿼리 실행기
//!
//! 모델이 생성한 SQL 문자열을 카탈로그 DB에 그대로 실행하고
//! 결과를 테이블로 반환합니다. 문장 검증/필터링은 하지 않으며
//! (데모 전제), 대신 연결 자체를 읽기 전용으로 엽니다.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags};

// ============================================================================
// Types
// ============================================================================

/// 쿼리 결과 테이블
#[derive(Debug, Clone, PartialEq)]
pub struct QueryTable {
    /// 컬럼 이름
    pub columns: Vec<String>,
    /// 행 (셀은 문자열화됨)
    pub rows: Vec<Vec<String>>,
}

/// 셀 표시 최대 길이 (렌더링 시)
const MAX_CELL_CHARS: usize = 40;

impl QueryTable {
    /// 터미널 표시용 정렬 렌더링
    pub fn render(&self) -> String {
        if self.columns.is_empty() {
            return "(no columns)".to_string();
        }

        let display_rows: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|row| row.iter().map(|cell| truncate_cell(cell)).collect())
            .collect();

        // 컬럼별 최대 폭 계산
        let mut widths: Vec<usize> = self.columns.iter().map(|c| c.chars().count()).collect();
        for row in &display_rows {
            for (i, cell) in row.iter().enumerate() {
                if i < widths.len() {
                    widths[i] = widths[i].max(cell.chars().count());
                }
            }
        }

        let mut out = String::new();
        out.push_str(&render_row(&self.columns, &widths));
        out.push('\n');
        out.push_str(
            &widths
                .iter()
                .map(|w| "-".repeat(*w))
                .collect::<Vec<_>>()
                .join("-+-"),
        );

        for row in &display_rows {
            out.push('\n');
            out.push_str(&render_row(row, &widths));
        }

        if self.rows.is_empty() {
            out.push_str("\n(0 rows)");
        }

        out
    }
}

fn render_row<S: AsRef<str>>(cells: &[S], widths: &[usize]) -> String {
    cells
        .iter()
        .zip(widths.iter())
        .map(|(cell, width)| {
            let cell = cell.as_ref();
            let pad = width.saturating_sub(cell.chars().count());
            format!("{}{}", cell, " ".repeat(pad))
        })
        .collect::<Vec<_>>()
        .join(" | ")
}

/// 셀 텍스트 자르기 (UTF-8 안전)
fn truncate_cell(cell: &str) -> String {
    let cleaned = cell.replace('\n', " ");
    if cleaned.chars().count() <= MAX_CELL_CHARS {
        cleaned
    } else {
        let truncated: String = cleaned.chars().take(MAX_CELL_CHARS).collect();
        format!("{}...", truncated)
    }
}

/// 카탈로그 통계
#[derive(Debug, Clone)]
pub struct CatalogStats {
    pub title_count: usize,
    pub db_path: PathBuf,
}

// ============================================================================
// CatalogStore
// ============================================================================

/// 카탈로그 저장소
///
/// Netflix titles 테이블이 들어 있는 SQLite 파일을 읽기 전용으로 엽니다.
pub struct CatalogStore {
    conn: Arc<Mutex<Connection>>,
    db_path: PathBuf,
}

impl CatalogStore {
    /// 카탈로그 DB 열기 (읽기 전용, 파일이 없으면 에러)
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .with_context(|| format!("Failed to open catalog database: {}", path.display()))?;

        tracing::debug!("Opened catalog database at {:?}", path);

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            db_path: path.to_path_buf(),
        })
    }

    /// DB 경로 반환
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// SQL 문자열을 그대로 실행하고 결과 테이블 반환
    ///
    /// 추출된 모델 생성 쿼리를 검증 없이 실행합니다.
    /// SQL 에러는 그대로 전파됩니다.
    pub fn query(&self, sql: &str) -> Result<QueryTable> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| anyhow::anyhow!("Lock error: {}", e))?;

        let mut stmt = conn
            .prepare(sql)
            .with_context(|| format!("Failed to prepare query: {}", sql.trim()))?;

        let columns: Vec<String> = stmt
            .column_names()
            .iter()
            .map(|name| name.to_string())
            .collect();
        let column_count = columns.len();

        let mut table_rows: Vec<Vec<String>> = Vec::new();
        let mut rows = stmt.query([]).context("Failed to execute query")?;

        while let Some(row) = rows.next().context("Failed to read query row")? {
            let mut cells = Vec::with_capacity(column_count);
            for i in 0..column_count {
                cells.push(format_value(row.get_ref(i)?));
            }
            table_rows.push(cells);
        }

        tracing::debug!(rows = table_rows.len(), "Query executed");

        Ok(QueryTable {
            columns,
            rows: table_rows,
        })
    }

    /// 카탈로그 통계 (titles 행 수)
    pub fn stats(&self) -> Result<CatalogStats> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| anyhow::anyhow!("Lock error: {}", e))?;

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM titles", [], |row| row.get(0))
            .context("Failed to count titles")?;

        Ok(CatalogStats {
            title_count: count as usize,
            db_path: self.db_path.clone(),
        })
    }
}

/// SQLite 값을 표시용 문자열로 변환
fn format_value(value: ValueRef<'_>) -> String {
    match value {
        ValueRef::Null => String::new(),
        ValueRef::Integer(n) => n.to_string(),
        ValueRef::Real(f) => f.to_string(),
        ValueRef::Text(bytes) => String::from_utf8_lossy(bytes).to_string(),
        ValueRef::Blob(bytes) => format!("<blob {} bytes>", bytes.len()),
    }
}

// ============================================================================
// Tests
// ============================================================================
