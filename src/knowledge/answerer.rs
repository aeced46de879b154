//! Retrieval-Augmented Answerer
//!
//! 질문과 가장 유사한 청크 3개를 컨텍스트로 묶어 채팅 백엔드에 전달합니다.
//! 어떤 실패도 에러로 올리지 않고 사람이 읽을 수 있는 문자열로 돌려줍니다.

use std::sync::Arc;

use crate::chat::ChatBackend;
use crate::embedding::EmbeddingProvider;

use super::vector::{SearchResult, VectorIndex};

/// 검색할 청크 수
pub const TOP_K: usize = 3;

/// 컨텍스트가 부족할 때 모델에게 요구하는 응답
pub const NOT_FOUND_REPLY: &str = "Information not found in document.";

/// RAG 답변기
pub struct Answerer {
    embedder: Arc<dyn EmbeddingProvider>,
    backend: Arc<dyn ChatBackend>,
}

impl Answerer {
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, backend: Arc<dyn ChatBackend>) -> Self {
        Self { embedder, backend }
    }

    /// 질문에 답변
    ///
    /// 반환값은 백엔드 응답 그대로이거나 `Error ...` 문자열입니다.
    /// 모델이 지시를 따랐는지는 검증하지 않습니다.
    pub async fn answer(&self, index: &VectorIndex, question: &str) -> String {
        let query_embedding = match self.embedder.embed(question).await {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!("Question embedding failed: {:#}", e);
                return format!("Error embedding question: {:#}", e);
            }
        };

        let hits = index.search(&query_embedding, TOP_K);
        tracing::debug!("Retrieved {} chunk(s) for question", hits.len());

        let prompt = build_prompt(&build_context(&hits), question);

        match self.backend.complete(&prompt).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!("{} request failed: {:#}", self.backend.name(), e);
                format!("Error querying {}: {:#}", self.backend.name(), e)
            }
        }
    }
}

/// 검색 결과를 빈 줄로 이어 붙임 (유사도 순, 중복 제거 없음)
pub fn build_context(hits: &[SearchResult]) -> String {
    hits.iter()
        .map(|hit| hit.chunk.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// 고정 프롬프트 템플릿
pub fn build_prompt(context: &str, question: &str) -> String {
    format!(
        "You are an AI assistant. Answer ONLY using the context provided below.\n\
         \n\
         Context:\n\
         {context}\n\
         \n\
         Question: {question}\n\
         \n\
         If the answer is not found in the context, reply \"{NOT_FOUND_REPLY}\"\n"
    )
}

// ============================================================================
// Tests
// ============================================================================
