//! Text Chunking Module
//!
//! 문자 단위 슬라이딩 윈도우로 텍스트를 분할합니다.
//! 각 청크는 최대 `chunk_size` 문자이며, 두 번째 청크부터는
//! 앞 청크의 마지막 `chunk_overlap` 문자로 시작합니다.

// ============================================================================
// Chunk Configuration
// ============================================================================

/// 문서 파이프라인 청크 크기 (문자 수)
pub const CHUNK_SIZE: usize = 800;

/// 인접 청크 간 오버랩 (문자 수)
pub const CHUNK_OVERLAP: usize = 150;

/// 청킹 설정
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkConfig {
    /// 최대 청크 크기 (문자 수)
    pub chunk_size: usize,
    /// 오버랩 크기 (문자 수), `chunk_size`보다 작아야 함
    pub chunk_overlap: usize,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            chunk_size: CHUNK_SIZE,
            chunk_overlap: CHUNK_OVERLAP,
        }
    }
}

impl ChunkConfig {
    /// 윈도우 이동 폭
    pub fn stride(&self) -> usize {
        self.chunk_size.saturating_sub(self.chunk_overlap).max(1)
    }
}

// ============================================================================
// Chunker Trait
// ============================================================================

/// 텍스트 청킹 전략 트레이트
pub trait Chunker: Send + Sync {
    /// 텍스트를 청크로 분할
    fn chunk(&self, text: &str) -> Vec<String>;

    /// 청커 이름
    fn name(&self) -> &'static str;
}

// ============================================================================
// SlidingWindowChunker
// ============================================================================

/// 고정 크기 + 고정 오버랩 청커
#[derive(Debug, Clone, Default)]
pub struct SlidingWindowChunker {
    config: ChunkConfig,
}

impl SlidingWindowChunker {
    pub fn new(config: ChunkConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> ChunkConfig {
        self.config
    }
}

impl Chunker for SlidingWindowChunker {
    fn chunk(&self, text: &str) -> Vec<String> {
        // 바이트가 아닌 문자 경계 기준 오프셋
        let bounds: Vec<usize> = text
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(text.len()))
            .collect();
        let char_count = bounds.len() - 1;

        if char_count == 0 {
            return vec![];
        }

        let size = self.config.chunk_size.max(1);
        let stride = self.config.stride();

        let mut chunks = Vec::new();
        let mut start = 0;

        loop {
            let end = (start + size).min(char_count);
            chunks.push(text[bounds[start]..bounds[end]].to_string());

            if end >= char_count {
                break;
            }
            start += stride;
        }

        chunks
    }

    fn name(&self) -> &'static str {
        "SlidingWindowChunker"
    }
}

/// 기본 청커 (800 / 150)
pub fn default_chunker() -> Box<dyn Chunker> {
    Box::new(SlidingWindowChunker::default())
}

/// 예상 청크 수: `max(1, ceil((L - overlap) / stride))`
pub fn expected_chunk_count(char_count: usize, config: ChunkConfig) -> usize {
    if char_count == 0 {
        return 0;
    }
    if char_count <= config.chunk_size {
        return 1;
    }
    (char_count - config.chunk_overlap).div_ceil(config.stride())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered_text(len: usize) -> String {
        (0..len)
            .map(|i| char::from(b'a' + (i % 26) as u8))
            .collect()
    }

    #[test]
    fn test_chunker_empty() {
        assert!(SlidingWindowChunker::default().chunk("").is_empty());
    }

    #[test]
    fn test_short_text_single_chunk() {
        let text = numbered_text(CHUNK_SIZE);
        let chunks = SlidingWindowChunker::default().chunk(&text);
        assert_eq!(chunks, vec![text]);
    }

    #[test]
    fn test_chunk_counts_at_boundaries() {
        let chunker = SlidingWindowChunker::default();
        let config = chunker.config();

        for len in [1, 799, 800, 801, 1450, 1451, 2100, 2101, 5000] {
            let chunks = chunker.chunk(&numbered_text(len));
            assert_eq!(
                chunks.len(),
                expected_chunk_count(len, config),
                "length {}",
                len
            );
        }

        assert_eq!(expected_chunk_count(801, config), 2);
        assert_eq!(expected_chunk_count(1450, config), 2);
        assert_eq!(expected_chunk_count(1451, config), 3);
    }

    #[test]
    fn test_chunks_bounded_and_overlapping() {
        let text = numbered_text(3333);
        let chunks = SlidingWindowChunker::default().chunk(&text);

        for chunk in &chunks {
            assert!(chunk.chars().count() <= CHUNK_SIZE);
        }

        for pair in chunks.windows(2) {
            let prev: Vec<char> = pair[0].chars().collect();
            let next: Vec<char> = pair[1].chars().collect();
            assert_eq!(
                &prev[prev.len() - CHUNK_OVERLAP..],
                &next[..CHUNK_OVERLAP]
            );
        }

        // 마지막 청크는 원문 끝에서 끝남
        assert!(text.ends_with(chunks.last().unwrap().as_str()));
    }

    #[test]
    fn test_multibyte_text_counts_chars() {
        let text: String = "안녕하세요".repeat(200); // 1000 chars, 3000 bytes
        let chunks = SlidingWindowChunker::default().chunk(&text);

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].chars().count(), 800);
        assert_eq!(chunks[1].chars().count(), 1000 - 650);
    }

    #[test]
    fn test_custom_config() {
        let chunker = SlidingWindowChunker::new(ChunkConfig {
            chunk_size: 4,
            chunk_overlap: 1,
        });
        assert_eq!(chunker.chunk("abcdefghij"), vec!["abcd", "defg", "ghij"]);
    }
}
