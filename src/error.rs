//! 에러 타입
//!
//! 컴포넌트 경계에서 사용자에게 그대로 보여줄 수 있는 에러를 정의합니다.
//! 내부 구현은 `anyhow::Result`를 사용하고, 경계에서 `QaError`로 정규화합니다.

use thiserror::Error;

/// Q&A 파이프라인 에러
#[derive(Debug, Error)]
pub enum QaError {
    /// 지원하지 않는 확장자
    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    /// 문서 파싱/읽기 실패 (손상된 파일, 인코딩 오류, I/O 실패)
    #[error("{0}")]
    DocumentLoad(String),

    /// 인덱싱할 텍스트가 없음
    #[error("No text could be extracted from the document")]
    EmptyDocument,

    /// 임베딩 모델 초기화/실행 실패
    #[error("Embedding model unavailable: {0}")]
    EmbeddingUnavailable(String),

    /// 스키마 추출 실패 또는 알 수 없는 테이블
    #[error("Schema error: {0}")]
    Schema(String),

    /// SQL 실행 실패
    #[error("SQL Error: {0}")]
    Sql(String),

    /// 스크래치 디렉토리 작업 실패
    #[error("Staging error: {0}")]
    Staging(String),
}

impl QaError {
    /// anyhow 에러 체인을 한 줄 메시지로 변환
    pub(crate) fn chain(err: &anyhow::Error) -> String {
        format!("{:#}", err)
    }
}

pub type QaResult<T> = std::result::Result<T, QaError>;
