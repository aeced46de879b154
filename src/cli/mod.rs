//! CLI 모듈
//!
//! universal-qa CLI 명령어 정의 및 구현
//!
//! - `doc`: 문서 업로드 → 인덱싱 → 질문마다 RAG 답변
//! - `db`: CSV/SQLite 업로드 → 질문마다 SQL 생성 및 실행
//! - `schema`, `translate`: 데이터베이스 파이프라인 점검용

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use crate::chat::OllamaChat;
use crate::config::{AppConfig, DEFAULT_CHAT_MODEL, DEFAULT_TIMEOUT_SECS};
use crate::database::{execute_sql, translate, DataSource, QueryOutcome, SourceKind};
use crate::embedding::{shared_embedder, EmbeddingProvider};
use crate::extractor::{load_document, DocumentKind};
use crate::knowledge::{Answerer, Indexer};
use crate::staging::{ScratchDir, UPLOADED_DB_NAME};

// ============================================================================
// CLI Definition
// ============================================================================

#[derive(Parser)]
#[command(name = "universal-qa")]
#[command(version, about = "문서 RAG 질의응답 + 자연어 SQL 질의", long_about = None)]
pub struct Cli {
    /// 업로드 스테이징 디렉토리 (시작 시 비워짐)
    #[arg(long, global = true)]
    pub scratch_dir: Option<PathBuf>,

    /// 채팅 요청 타임아웃 (초)
    #[arg(long, global = true, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout_secs: u64,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 문서(PDF/DOCX/TXT)에 대해 질문
    Doc {
        /// 문서 파일 경로
        file: PathBuf,

        /// 질문 (여러 번 지정 가능, 없으면 표준 입력에서 한 줄씩)
        #[arg(short = 'q', long = "question")]
        questions: Vec<String>,

        /// Ollama 채팅 모델
        #[arg(long, default_value = DEFAULT_CHAT_MODEL)]
        model: String,

        /// Ollama 주소 (OLLAMA_HOST보다 우선)
        #[arg(long)]
        ollama_host: Option<String>,
    },

    /// CSV 또는 SQLite 파일에 자연어로 질의
    Db {
        /// .csv / .db / .sqlite / .sqlite3 파일 경로
        file: PathBuf,

        /// 질의 대상 테이블 (기본: 첫 번째 테이블)
        #[arg(short, long)]
        table: Option<String>,

        /// 질문 (여러 번 지정 가능, 없으면 표준 입력에서 한 줄씩)
        #[arg(short = 'q', long = "question")]
        questions: Vec<String>,

        /// 결과를 JSON으로 출력
        #[arg(long)]
        json: bool,
    },

    /// 테이블/컬럼 목록 출력
    Schema {
        /// .csv / .db / .sqlite / .sqlite3 파일 경로
        file: PathBuf,
    },

    /// 실행하지 않고 생성될 SQL만 출력
    Translate {
        /// .csv / .db / .sqlite / .sqlite3 파일 경로
        file: PathBuf,

        /// 번역 대상 테이블 (기본: 첫 번째 테이블)
        #[arg(short, long)]
        table: Option<String>,

        /// 자연어 질문
        question: String,
    },
}

// ============================================================================
// CLI Runner
// ============================================================================

/// CLI 명령어 실행
pub async fn run(cli: Cli) -> Result<()> {
    let mut config =
        AppConfig::from_env()?.with_timeout(Duration::from_secs(cli.timeout_secs));
    if let Some(dir) = cli.scratch_dir {
        config = config.with_scratch_dir(dir);
    }

    let scratch = ScratchDir::reset(&config.scratch_dir)?;

    match cli.command {
        Commands::Doc {
            file,
            questions,
            model,
            ollama_host,
        } => {
            let mut config = config.with_chat_model(model);
            if let Some(host) = ollama_host {
                config = config.with_ollama_host(&host)?;
            }
            cmd_doc(&config, &scratch, &file, questions).await
        }
        Commands::Db {
            file,
            table,
            questions,
            json,
        } => cmd_db(&scratch, &file, table.as_deref(), questions, json).await,
        Commands::Schema { file } => cmd_schema(&scratch, &file),
        Commands::Translate {
            file,
            table,
            question,
        } => cmd_translate(&scratch, &file, table.as_deref(), &question),
    }
}

// ============================================================================
// Command Implementations
// ============================================================================

/// 문서 질의응답 명령어 (doc)
///
/// 문서를 한 번 인덱싱한 뒤 모든 질문에 같은 인덱스를 사용합니다.
async fn cmd_doc(
    config: &AppConfig,
    scratch: &ScratchDir,
    file: &Path,
    questions: Vec<String>,
) -> Result<()> {
    DocumentKind::from_path(file)?;
    let staged = scratch.stage(file)?;

    println!("[*] 문서 로드 중: {}", file.display());
    let records = load_document(&staged).await?;

    println!("[*] 임베딩 모델 준비 중...");
    let embedder: Arc<dyn EmbeddingProvider> = shared_embedder().await?;

    let index = Indexer::new(Arc::clone(&embedder)).build(&records).await?;
    println!(
        "[OK] 인덱싱 완료: {} 레코드, {} 청크",
        records.len(),
        index.len()
    );

    let backend = OllamaChat::from_config(config).context("Ollama 클라이언트 생성 실패")?;
    println!(
        "[*] 채팅 모델: {} ({})",
        backend.model(),
        config.ollama_url
    );
    let answerer = Answerer::new(embedder, Arc::new(backend));

    let mut questions = QuestionSource::new(questions);
    while let Some(question) = questions.next_question().await? {
        println!("\n[*] 질문: {}", truncate_text(&question, 80));
        let answer = answerer.answer(&index, &question).await;
        println!("{}", answer);
    }

    Ok(())
}

/// 데이터베이스 질의 명령어 (db)
async fn cmd_db(
    scratch: &ScratchDir,
    file: &Path,
    table: Option<&str>,
    questions: Vec<String>,
    json: bool,
) -> Result<()> {
    let source = open_source(scratch, file, table)?;
    print_source_summary(&source);

    let mut questions = QuestionSource::new(questions);
    while let Some(question) = questions.next_question().await? {
        println!("\n[*] 질문: {}", truncate_text(&question, 80));

        let sql = translate(&question, source.schema());
        tracing::debug!("Generated SQL: {}", sql);
        println!("[*] Generated SQL: {}", sql);

        match execute_sql(source.sql_source(), &sql) {
            Ok(outcome) => print_outcome(&outcome, json)?,
            Err(e) => println!("[!] {}", e),
        }
    }

    Ok(())
}

/// 스키마 출력 명령어 (schema)
fn cmd_schema(scratch: &ScratchDir, file: &Path) -> Result<()> {
    let source = open_source(scratch, file, None)?;
    let schema = source.schema();

    if schema.is_empty() {
        println!("[!] 테이블이 없습니다.");
        return Ok(());
    }

    println!("[OK] 테이블 ({} 개):\n", schema.tables().len());
    for table in schema.tables() {
        println!("  {}", table.name);
        println!("      {}", table.columns.join(", "));
    }

    Ok(())
}

/// SQL 번역 명령어 (translate)
fn cmd_translate(
    scratch: &ScratchDir,
    file: &Path,
    table: Option<&str>,
    question: &str,
) -> Result<()> {
    let source = open_source(scratch, file, table)?;
    println!("{}", translate(question, source.schema()));
    Ok(())
}

// ============================================================================
// Helper Functions
// ============================================================================

/// 업로드를 열고 필요하면 테이블을 선택
///
/// SQLite 파일은 스크래치 디렉토리에 `uploaded.db`로 복사한 뒤 엽니다.
fn open_source(scratch: &ScratchDir, file: &Path, table: Option<&str>) -> Result<DataSource> {
    let mut source = match SourceKind::from_path(file)? {
        SourceKind::Tabular => DataSource::open(file)?,
        SourceKind::Relational => {
            let staged = scratch.stage_as(file, UPLOADED_DB_NAME)?;
            DataSource::open(&staged)?
        }
    };

    if let Some(name) = table {
        source.select_table(name)?;
    }
    Ok(source)
}

fn print_source_summary(source: &DataSource) {
    match source.preview() {
        Some(preview) => {
            println!("[OK] CSV 로드 완료. 미리보기:\n");
            println!("{}", preview.render());
        }
        None => {
            println!("[OK] Tables found: {:?}", source.schema().table_names());
        }
    }
}

fn print_outcome(outcome: &QueryOutcome, json: bool) -> Result<()> {
    if let Some(ref message) = outcome.message {
        println!("[OK] {}", message);
        return Ok(());
    }

    if outcome.table.is_empty() {
        println!("No results found.");
        return Ok(());
    }

    if json {
        let rendered =
            serde_json::to_string_pretty(&outcome.table).context("결과 직렬화 실패")?;
        println!("{}", rendered);
    } else {
        println!("{}", outcome.table.render());
        println!("({} rows)", outcome.table.row_count());
    }
    Ok(())
}

/// 질문 목록 또는 표준 입력
enum QuestionSource {
    Listed(std::vec::IntoIter<String>),
    Stdin(Lines<BufReader<Stdin>>),
}

impl QuestionSource {
    fn new(questions: Vec<String>) -> Self {
        if questions.is_empty() {
            println!("[*] 질문을 한 줄에 하나씩 입력하세요 (Ctrl-D로 종료)");
            QuestionSource::Stdin(BufReader::new(tokio::io::stdin()).lines())
        } else {
            QuestionSource::Listed(questions.into_iter())
        }
    }

    /// 다음 질문 (빈 줄은 건너뜀)
    async fn next_question(&mut self) -> Result<Option<String>> {
        loop {
            let line = match self {
                QuestionSource::Listed(iter) => iter.next(),
                QuestionSource::Stdin(lines) => {
                    lines.next_line().await.context("표준 입력 읽기 실패")?
                }
            };

            match line {
                Some(q) if q.trim().is_empty() => continue,
                Some(q) => return Ok(Some(q.trim().to_string())),
                None => return Ok(None),
            }
        }
    }
}

/// 텍스트 자르기 (UTF-8 안전)
fn truncate_text(text: &str, max_chars: usize) -> String {
    let cleaned = text.replace('\n', " ").replace('\r', "");
    let cleaned = cleaned.trim();

    if cleaned.chars().count() <= max_chars {
        cleaned.to_string()
    } else {
        let truncated: String = cleaned.chars().take(max_chars).collect();
        format!("{}...", truncated)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;
    use tempfile::TempDir;

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("hello", 10), "hello");
        assert_eq!(truncate_text("hello world", 5), "hello...");
        assert_eq!(truncate_text("hello\nworld", 20), "hello world");
    }

    #[test]
    fn test_truncate_unicode() {
        assert_eq!(truncate_text("환불 정책이 뭔가요", 5), "환불 정책...");
    }

    #[test]
    fn test_parse_doc_command() {
        let cli = Cli::try_parse_from([
            "universal-qa",
            "doc",
            "faq.pdf",
            "-q",
            "What is the refund window?",
            "-q",
            "Who ships?",
            "--timeout-secs",
            "30",
        ])
        .unwrap();

        assert_eq!(cli.timeout_secs, 30);
        match cli.command {
            Commands::Doc {
                file,
                questions,
                model,
                ollama_host,
            } => {
                assert_eq!(file, PathBuf::from("faq.pdf"));
                assert_eq!(questions.len(), 2);
                assert_eq!(model, DEFAULT_CHAT_MODEL);
                assert!(ollama_host.is_none());
            }
            _ => panic!("expected doc command"),
        }
    }

    #[test]
    fn test_parse_translate_command() {
        let cli = Cli::try_parse_from([
            "universal-qa",
            "translate",
            "shop.db",
            "--table",
            "orders",
            "how many orders",
        ])
        .unwrap();

        match cli.command {
            Commands::Translate {
                table, question, ..
            } => {
                assert_eq!(table.as_deref(), Some("orders"));
                assert_eq!(question, "how many orders");
            }
            _ => panic!("expected translate command"),
        }
    }

    #[tokio::test]
    async fn test_listed_questions_skip_blanks() {
        let mut source = QuestionSource::new(vec![
            " first ".to_string(),
            "   ".to_string(),
            "second".to_string(),
        ]);
        assert_eq!(source.next_question().await.unwrap().as_deref(), Some("first"));
        assert_eq!(source.next_question().await.unwrap().as_deref(), Some("second"));
        assert_eq!(source.next_question().await.unwrap(), None);
    }

    #[test]
    fn test_open_source_stages_sqlite_upload() {
        let dir = TempDir::new().unwrap();
        let upload = dir.path().join("shop.sqlite3");
        Connection::open(&upload)
            .unwrap()
            .execute_batch("CREATE TABLE users (id INTEGER); CREATE TABLE orders (total REAL);")
            .unwrap();

        let scratch = ScratchDir::reset(&dir.path().join("temp_files")).unwrap();
        let source = open_source(&scratch, &upload, Some("orders")).unwrap();

        assert!(scratch.path().join(UPLOADED_DB_NAME).exists());
        assert_eq!(source.schema().table_names(), vec!["orders"]);
        assert_eq!(
            translate("how many", source.schema()),
            "SELECT COUNT(*) FROM orders;"
        );
    }

    #[test]
    fn test_open_source_rejects_unknown_extension() {
        let dir = TempDir::new().unwrap();
        let scratch = ScratchDir::reset(&dir.path().join("temp_files")).unwrap();
        let err = open_source(&scratch, Path::new("report.xlsx"), None).unwrap_err();
        assert_eq!(err.to_string(), "Unsupported file type: .xlsx");
    }
}
