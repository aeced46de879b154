//! 문서 로더 모듈
//!
//! 업로드된 파일의 확장자로 파서를 선택해 텍스트 레코드를 추출합니다.
//! - TXT: UTF-8로 직접 읽기
//! - PDF: pdf-extract로 페이지별 추출
//! - DOCX: ZIP 안의 word/document.xml에서 본문 추출
//!
//! 실패는 파일 단위로 전부 아니면 전무입니다. 부분 복구는 하지 않습니다.

pub mod docx;
pub mod pdf;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::error::{QaError, QaResult};

// ============================================================================
// Document Kind
// ============================================================================

/// 지원하는 문서 형식
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Docx,
    Text,
}

impl DocumentKind {
    /// 확장자로 형식 결정 (대소문자 무시)
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "pdf" => Some(DocumentKind::Pdf),
            "docx" => Some(DocumentKind::Docx),
            "txt" => Some(DocumentKind::Text),
            _ => None,
        }
    }

    /// 파일 경로에서 형식 결정
    ///
    /// 지원하지 않으면 `Unsupported file type: .ext` 에러를 반환합니다.
    pub fn from_path(path: &Path) -> QaResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();

        Self::from_extension(ext).ok_or_else(|| {
            let shown = if ext.is_empty() {
                String::new()
            } else {
                format!(".{}", ext.to_lowercase())
            };
            QaError::UnsupportedFileType(shown)
        })
    }
}

// ============================================================================
// Document Record
// ============================================================================

/// 추출된 텍스트 단위 (PDF는 페이지당 하나)
#[derive(Debug, Clone)]
pub struct DocumentRecord {
    /// 추출된 텍스트
    pub text: String,
    /// 출처 메타데이터
    pub metadata: RecordMetadata,
}

/// 레코드 메타데이터
#[derive(Debug, Clone, Default)]
pub struct RecordMetadata {
    /// 원본 파일 경로
    pub source: PathBuf,
    /// 페이지/세그먼트 번호 (1부터 시작)
    pub page_number: Option<usize>,
    /// 총 페이지 수 (PDF)
    pub total_pages: Option<usize>,
}

// ============================================================================
// Loader
// ============================================================================

/// 파일에서 문서 레코드 로드
///
/// 성공하면 최소 하나의 레코드를, 실패하면 설명 문자열을 담은 에러를 반환합니다.
pub async fn load_document(path: &Path) -> QaResult<Vec<DocumentRecord>> {
    let kind = DocumentKind::from_path(path)?;

    let records = match kind {
        DocumentKind::Text => load_text(path).await,
        DocumentKind::Pdf => load_pdf(path).await,
        DocumentKind::Docx => load_docx(path).await,
    }
    .map_err(|e| QaError::DocumentLoad(QaError::chain(&e)))?;

    tracing::info!("Loaded {:?} ({} record(s))", path, records.len());
    Ok(records)
}

/// 텍스트 파일 로드
async fn load_text(path: &Path) -> Result<Vec<DocumentRecord>> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read text file: {:?}", path))?;

    let text = String::from_utf8(bytes)
        .with_context(|| format!("Error loading {:?}: file is not valid UTF-8", path))?;

    Ok(vec![DocumentRecord {
        text,
        metadata: RecordMetadata {
            source: path.to_path_buf(),
            ..Default::default()
        },
    }])
}

/// PDF 로드 (페이지별 레코드)
async fn load_pdf(path: &Path) -> Result<Vec<DocumentRecord>> {
    // PDF 추출은 CPU 바운드이므로 spawn_blocking 사용
    let owned = path.to_path_buf();
    let pages = tokio::task::spawn_blocking(move || pdf::extract_text_from_pdf(&owned))
        .await
        .context("PDF extraction task failed")??;

    let total_pages = pages.len();

    Ok(pages
        .into_iter()
        .map(|(page_num, text)| DocumentRecord {
            text,
            metadata: RecordMetadata {
                source: path.to_path_buf(),
                page_number: Some(page_num),
                total_pages: Some(total_pages),
            },
        })
        .collect())
}

/// DOCX 로드 (문서 전체가 하나의 레코드)
async fn load_docx(path: &Path) -> Result<Vec<DocumentRecord>> {
    let owned = path.to_path_buf();
    let text = tokio::task::spawn_blocking(move || docx::extract_text_from_docx(&owned))
        .await
        .context("DOCX extraction task failed")??;

    Ok(vec![DocumentRecord {
        text,
        metadata: RecordMetadata {
            source: path.to_path_buf(),
            ..Default::default()
        },
    }])
}

// ============================================================================
// Tests
// ============================================================================
