//! 업로드 스테이징
//!
//! 업로드된 파일을 임시 디렉토리에 복사해 둡니다.
//! 디렉토리는 프로세스 시작 시 비워지며, 장기 보존은 하지 않습니다.

use std::path::{Path, PathBuf};

use crate::error::{QaError, QaResult};

/// 관계형 업로드가 복사되는 고정 파일 이름
pub const UPLOADED_DB_NAME: &str = "uploaded.db";

/// 스크래치 디렉토리
#[derive(Debug, Clone)]
pub struct ScratchDir {
    root: PathBuf,
}

impl ScratchDir {
    /// 디렉토리를 지우고 새로 생성
    pub fn reset(root: &Path) -> QaResult<Self> {
        if root.exists() {
            std::fs::remove_dir_all(root).map_err(|e| {
                QaError::Staging(format!("Failed to clear {}: {}", root.display(), e))
            })?;
        }
        std::fs::create_dir_all(root).map_err(|e| {
            QaError::Staging(format!("Failed to create {}: {}", root.display(), e))
        })?;

        tracing::debug!("Scratch directory ready at {:?}", root);
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// 원본 파일 이름 그대로 복사
    pub fn stage(&self, source: &Path) -> QaResult<PathBuf> {
        let name = source
            .file_name()
            .ok_or_else(|| QaError::Staging(format!("Not a file: {}", source.display())))?;
        self.stage_as(source, &name.to_string_lossy())
    }

    /// 지정한 이름으로 복사 (같은 이름이 있으면 덮어씀)
    pub fn stage_as(&self, source: &Path, name: &str) -> QaResult<PathBuf> {
        let target = self.root.join(name);
        std::fs::copy(source, &target).map_err(|e| {
            QaError::Staging(format!("Failed to stage {}: {}", source.display(), e))
        })?;

        tracing::debug!("Staged {:?} -> {:?}", source, target);
        Ok(target)
    }
}

// ============================================================================
// Tests
// ============================================================================
