//! Indexer - 문서 레코드를 청킹하고 벡터 인덱스를 빌드
//!
//! 업로드된 문서 하나당 한 번 실행됩니다. 모든 레코드(PDF 페이지 등)의
//! 청크가 하나의 인덱스에 들어갑니다.

use std::sync::Arc;

use crate::embedding::EmbeddingProvider;
use crate::error::{QaError, QaResult};
use crate::extractor::DocumentRecord;

use super::chunker::{default_chunker, Chunker};
use super::vector::{Chunk, VectorEntry, VectorIndex};

/// 인덱서
///
/// 임베딩 프로바이더는 외부에서 주입합니다 (보통 [`crate::embedding::shared_embedder`]).
pub struct Indexer {
    embedder: Arc<dyn EmbeddingProvider>,
    chunker: Box<dyn Chunker>,
}

impl Indexer {
    /// 기본 청커(800 / 150)로 생성
    pub fn new(embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self::with_chunker(embedder, default_chunker())
    }

    pub fn with_chunker(embedder: Arc<dyn EmbeddingProvider>, chunker: Box<dyn Chunker>) -> Self {
        Self { embedder, chunker }
    }

    /// 레코드를 청크로 분할 (임베딩 없이)
    pub fn split(&self, records: &[DocumentRecord]) -> Vec<Chunk> {
        let mut chunks = Vec::new();

        for record in records {
            // 공백뿐인 레코드(빈 페이지 등)는 건너뜀
            if record.text.trim().is_empty() {
                continue;
            }

            for text in self.chunker.chunk(&record.text) {
                chunks.push(Chunk {
                    text,
                    source: record.metadata.source.clone(),
                    page_number: record.metadata.page_number,
                    chunk_index: chunks.len(),
                });
            }
        }

        chunks
    }

    /// 인덱스 빌드
    ///
    /// 추출된 텍스트가 없으면 `EmptyDocument`, 임베딩 실패는
    /// `EmbeddingUnavailable`로 반환합니다.
    pub async fn build(&self, records: &[DocumentRecord]) -> QaResult<VectorIndex> {
        let chunks = self.split(records);
        if chunks.is_empty() {
            tracing::warn!("No chunks generated from {} record(s)", records.len());
            return Err(QaError::EmptyDocument);
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let embeddings = self
            .embedder
            .embed_batch(&texts)
            .await
            .map_err(|e| QaError::EmbeddingUnavailable(QaError::chain(&e)))?;

        if embeddings.len() != chunks.len() {
            return Err(QaError::EmbeddingUnavailable(format!(
                "expected {} embeddings, got {}",
                chunks.len(),
                embeddings.len()
            )));
        }

        let entries = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| VectorEntry { chunk, embedding })
            .collect();

        let index = VectorIndex::from_entries(entries)
            .map_err(|e| QaError::EmbeddingUnavailable(QaError::chain(&e)))?;

        tracing::info!(
            "Built vector index: {} chunks (chunker: {}, embedder: {})",
            index.len(),
            self.chunker.name(),
            self.embedder.name()
        );

        Ok(index)
    }
}

// ============================================================================
// Tests
// ============================================================================
