//! universal-qa - 문서 RAG 질의응답 + 자연어 SQL 질의
//!
//! 두 개의 독립적인 파이프라인을 제공합니다.
//!
//! - 문서: PDF/DOCX/TXT → 청크 → 로컬 임베딩 → top-3 검색 → Ollama 답변
//! - 데이터베이스: CSV/SQLite → 스키마 → 휴리스틱 SQL 번역 → 실행

pub mod chat;
pub mod cli;
pub mod config;
pub mod database;
pub mod embedding;
pub mod error;
pub mod extractor;
pub mod knowledge;
pub mod staging;

// Re-exports
pub use chat::{ChatBackend, OllamaChat};
pub use config::AppConfig;
pub use database::{
    execute_sql, translate, CellValue, DataSource, QueryOutcome, ResultTable, SchemaMap,
    SourceKind, SqlSource, TableSchema,
};
pub use embedding::{shared_embedder, EmbeddingProvider, FastEmbedProvider};
pub use error::{QaError, QaResult};
pub use extractor::{load_document, DocumentKind, DocumentRecord, RecordMetadata};
pub use knowledge::{Answerer, Chunk, ChunkConfig, Chunker, Indexer, SearchResult, VectorIndex};
pub use staging::ScratchDir;
