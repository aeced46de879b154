//! Vector Index - 메모리 내 벡터 인덱스
//!
//! 문서 하나로 한 번 빌드되고 세션 동안 읽기 전용으로 유지됩니다.
//! 청크 수가 작으므로 전수 코사인 유사도로 검색합니다.

use std::path::PathBuf;

// ============================================================================
// Types
// ============================================================================

/// 인덱스에 저장되는 텍스트 조각
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    /// 청크 텍스트
    pub text: String,
    /// 원본 파일
    pub source: PathBuf,
    /// 원본 페이지 번호 (PDF)
    pub page_number: Option<usize>,
    /// 전체 문서 내 청크 순번 (0-based)
    pub chunk_index: usize,
}

/// 벡터 엔트리
#[derive(Debug, Clone)]
pub struct VectorEntry {
    pub chunk: Chunk,
    /// 임베딩 벡터
    pub embedding: Vec<f32>,
}

/// 검색 결과
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub chunk: Chunk,
    /// 코사인 유사도 (-1.0 ~ 1.0)
    pub similarity: f32,
}

// ============================================================================
// VectorIndex
// ============================================================================

/// 유사도 검색 인덱스
///
/// 생성 후 엔트리를 추가하거나 다른 인덱스와 병합하는 API는 없습니다.
#[derive(Debug, Clone)]
pub struct VectorIndex {
    entries: Vec<VectorEntry>,
    dimension: usize,
}

impl VectorIndex {
    /// 엔트리로 인덱스 생성
    ///
    /// 모든 임베딩은 같은 차원이어야 합니다.
    pub fn from_entries(entries: Vec<VectorEntry>) -> anyhow::Result<Self> {
        let dimension = entries.first().map(|e| e.embedding.len()).unwrap_or(0);

        if let Some(bad) = entries.iter().find(|e| e.embedding.len() != dimension) {
            anyhow::bail!(
                "Embedding dimension mismatch: chunk {} has {}, expected {}",
                bad.chunk.chunk_index,
                bad.embedding.len(),
                dimension
            );
        }

        Ok(Self { entries, dimension })
    }

    /// 상위 `limit`개 검색 (유사도 내림차순, 동점이면 문서 순서)
    pub fn search(&self, query_embedding: &[f32], limit: usize) -> Vec<SearchResult> {
        let mut scored: Vec<SearchResult> = self
            .entries
            .iter()
            .map(|entry| SearchResult {
                chunk: entry.chunk.clone(),
                similarity: cosine_similarity(query_embedding, &entry.embedding),
            })
            .collect();

        // sort_by는 안정 정렬이므로 동점은 삽입 순서 유지
        scored.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        scored.truncate(limit);
        scored
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn entries(&self) -> &[VectorEntry] {
        &self.entries
    }
}

// ============================================================================
// Utility Functions
// ============================================================================

/// 코사인 유사도 계산
///
/// 길이가 다르거나 영벡터가 있거나 결과가 유한하지 않으면(NaN 등) 0.0을 반환합니다.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    let similarity = dot_product / (norm_a * norm_b);
    if similarity.is_finite() {
        similarity
    } else {
        0.0
    }
}

// ============================================================================
// Tests
// ============================================================================
