//! 임베딩 모듈 - 로컬 sentence embedding
//!
//! fastembed(ONNX Runtime)로 `all-MiniLM-L6-v2` 모델을 로드해
//! 텍스트를 384차원 벡터로 변환합니다.
//!
//! 모델 로드는 문서 파이프라인에서 가장 비싼 작업이므로 프로세스당 한 번만
//! 수행하고 이후에는 재사용합니다 ([`shared_embedder`]).
//!
//! ## 사용법
//! ```rust,ignore
//! let embedder = shared_embedder().await?;
//! let embedding = embedder.embed("Hello, world!").await?;
//! ```

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use tokio::sync::OnceCell;

use crate::error::{QaError, QaResult};

// ============================================================================
// EmbeddingProvider Trait
// ============================================================================

/// 임베딩 프로바이더 트레이트
///
/// 텍스트를 벡터로 변환하는 인터페이스입니다.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// 단일 텍스트 임베딩
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// 배치 임베딩 (기본 구현: 순차 호출)
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text).await?);
        }
        Ok(results)
    }

    /// 임베딩 차원 수
    fn dimension(&self) -> usize;

    /// 프로바이더 이름
    fn name(&self) -> &str;
}

// ============================================================================
// FastEmbed (all-MiniLM-L6-v2)
// ============================================================================

/// 모델 표시 이름
pub const EMBEDDING_MODEL_NAME: &str = "sentence-transformers/all-MiniLM-L6-v2";

/// all-MiniLM-L6-v2 출력 차원
pub const EMBEDDING_DIMENSION: usize = 384;

/// 배치 임베딩 크기
const BATCH_SIZE: usize = 32;

/// fastembed 기반 임베딩 구현체
///
/// 출력 벡터는 L2 정규화되어 있습니다.
#[derive(Clone)]
pub struct FastEmbedProvider {
    model: Arc<TextEmbedding>,
    dimension: usize,
}

impl std::fmt::Debug for FastEmbedProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FastEmbedProvider")
            .field("model", &EMBEDDING_MODEL_NAME)
            .field("dimension", &self.dimension)
            .finish()
    }
}

impl FastEmbedProvider {
    /// 모델 로드 (블로킹: 최초 실행 시 모델 다운로드 포함)
    ///
    /// 실행 장치는 ONNX Runtime이 사용 가능한 execution provider 중에서
    /// 선택하며 호출자가 지정할 수 없습니다.
    pub fn load() -> Result<Self> {
        tracing::info!("Loading embedding model: {}", EMBEDDING_MODEL_NAME);

        let options =
            InitOptions::new(EmbeddingModel::AllMiniLML6V2).with_show_download_progress(true);
        let model = TextEmbedding::try_new(options).context("Failed to initialize fastembed")?;

        let sample = model
            .embed(vec!["dimension check"], None)
            .context("Embedding model self-check failed")?;
        let dimension = sample
            .first()
            .map(|v| v.len())
            .unwrap_or(EMBEDDING_DIMENSION);

        tracing::info!(
            "Embedding model ready: {} (dimension: {})",
            EMBEDDING_MODEL_NAME,
            dimension
        );

        Ok(Self {
            model: Arc::new(model),
            dimension,
        })
    }
}

#[async_trait]
impl EmbeddingProvider for FastEmbedProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut batch = self.embed_batch(&[text.to_string()]).await?;
        batch
            .pop()
            .ok_or_else(|| anyhow::anyhow!("Embedding model returned no vector"))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        // ONNX 추론은 CPU 바운드이므로 spawn_blocking 사용
        let model = Arc::clone(&self.model);
        let owned = texts.to_vec();
        let vectors = tokio::task::spawn_blocking(move || model.embed(owned, Some(BATCH_SIZE)))
            .await
            .context("Embedding task failed")?
            .context("Failed to embed texts")?;

        Ok(vectors.into_iter().map(l2_normalize).collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn name(&self) -> &str {
        EMBEDDING_MODEL_NAME
    }
}

// ============================================================================
// Process-wide Model Cache
// ============================================================================

static SHARED_EMBEDDER: OnceCell<Arc<FastEmbedProvider>> = OnceCell::const_new();

/// 프로세스 공용 임베딩 모델
///
/// 최초 호출 시 한 번만 로드하고 이후에는 같은 인스턴스를 반환합니다.
pub async fn shared_embedder() -> QaResult<Arc<FastEmbedProvider>> {
    init_shared(&SHARED_EMBEDDER, FastEmbedProvider::load).await
}

/// 한 번만 초기화되는 공용 인스턴스
///
/// 동시에 처음 호출되더라도 `load`는 한 번만 실행됩니다.
/// 로드 실패는 셀에 남지 않으므로 다음 호출에서 다시 시도됩니다.
/// `load`는 블로킹 스레드에서 실행됩니다.
pub async fn init_shared<T, F>(cell: &OnceCell<Arc<T>>, load: F) -> QaResult<Arc<T>>
where
    T: Send + Sync + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    cell.get_or_try_init(|| async {
        tokio::task::spawn_blocking(load)
            .await
            .context("Embedding model initialization task panicked")?
            .map(Arc::new)
    })
    .await
    .cloned()
    .map_err(|e: anyhow::Error| QaError::EmbeddingUnavailable(QaError::chain(&e)))
}

// ============================================================================
// Helper Functions
// ============================================================================

/// L2 정규화 (영벡터는 그대로)
pub fn l2_normalize(mut v: Vec<f32>) -> Vec<f32> {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        v.iter_mut().for_each(|x| *x /= norm);
    }
    v
}

// ============================================================================
// Test Doubles
// ============================================================================


// ============================================================================
// Tests
// ============================================================================
