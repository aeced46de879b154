//! Knowledge 모듈 - 문서 RAG 파이프라인
//!
//! - Chunker: 800자 / 150자 오버랩 슬라이딩 윈도우
//! - Vector: 메모리 내 코사인 유사도 인덱스
//! - Indexer: 레코드 → 청크 → 임베딩 → 인덱스
//! - Answerer: top-3 검색 → 프롬프트 → 채팅 백엔드

mod answerer;
mod chunker;
mod indexer;
mod vector;

// Re-exports
pub use answerer::{build_context, build_prompt, Answerer, NOT_FOUND_REPLY, TOP_K};
pub use chunker::{
    default_chunker, expected_chunk_count, ChunkConfig, Chunker, SlidingWindowChunker,
    CHUNK_OVERLAP, CHUNK_SIZE,
};
pub use indexer::Indexer;
pub use vector::{cosine_similarity, Chunk, SearchResult, VectorEntry, VectorIndex};
