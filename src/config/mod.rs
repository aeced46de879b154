//! 설정 모듈
//!
//! 환경변수에서 기본값을 읽고, CLI 플래그로 덮어씁니다.
//!
//! | 설정 | 환경변수 | 기본값 |
//! |---|---|---|
//! | Ollama 주소 | `OLLAMA_HOST` | `http://localhost:11434` |
//! | 스크래치 디렉토리 | `UNIVERSAL_QA_SCRATCH_DIR` | `<data_local_dir>/universal-qa/temp_files` |
//! | 로그 필터 | `RUST_LOG` | `info` |

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;
use url::Url;

// ============================================================================
// Constants
// ============================================================================

/// 기본 Ollama 주소
pub const DEFAULT_OLLAMA_HOST: &str = "http://localhost:11434";

/// 기본 채팅 모델
pub const DEFAULT_CHAT_MODEL: &str = "llama3.1";

/// 채팅 요청 기본 타임아웃 (로컬 LLM은 느릴 수 있음)
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// `RUST_LOG`가 없을 때의 로그 필터
pub const DEFAULT_LOG_FILTER: &str = "info";

const OLLAMA_HOST_ENV: &str = "OLLAMA_HOST";
const SCRATCH_DIR_ENV: &str = "UNIVERSAL_QA_SCRATCH_DIR";

// ============================================================================
// AppConfig
// ============================================================================

/// 런타임 설정
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// 채팅 백엔드 (Ollama) 기본 URL
    pub ollama_url: Url,
    /// 채팅 모델 이름
    pub chat_model: String,
    /// 채팅 요청 타임아웃
    pub request_timeout: Duration,
    /// 업로드 파일 스테이징 디렉토리
    pub scratch_dir: PathBuf,
}

impl AppConfig {
    /// 환경변수에서 설정 로드
    pub fn from_env() -> Result<Self> {
        let host = non_empty_env(OLLAMA_HOST_ENV).unwrap_or_else(|| DEFAULT_OLLAMA_HOST.to_string());
        let ollama_url = parse_ollama_host(&host)?;

        let scratch_dir = non_empty_env(SCRATCH_DIR_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(default_scratch_dir);

        Ok(Self {
            ollama_url,
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            scratch_dir,
        })
    }

    /// Ollama 주소 덮어쓰기
    pub fn with_ollama_host(mut self, host: &str) -> Result<Self> {
        self.ollama_url = parse_ollama_host(host)?;
        Ok(self)
    }

    pub fn with_chat_model(mut self, model: impl Into<String>) -> Self {
        self.chat_model = model.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_scratch_dir(mut self, dir: PathBuf) -> Self {
        self.scratch_dir = dir;
        self
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// 기본 스크래치 디렉토리 (~/.local/share/universal-qa/temp_files 등)
pub fn default_scratch_dir() -> PathBuf {
    dirs::data_local_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join("universal-qa")
        .join("temp_files")
}

/// Ollama 주소 파싱
///
/// `OLLAMA_HOST`는 스킴 없이 `127.0.0.1:11434` 형태로도 설정되므로
/// 스킴이 없으면 `http://`를 붙입니다.
pub fn parse_ollama_host(host: &str) -> Result<Url> {
    let host = host.trim();
    let with_scheme = if host.contains("://") {
        host.to_string()
    } else {
        format!("http://{}", host)
    };

    Url::parse(&with_scheme).with_context(|| format!("Invalid Ollama host: {}", host))
}

/// 로그 필터 구성
///
/// `RUST_LOG` 값이 있으면 그대로 쓰고, 비어 있거나 해석할 수 없으면 `info`.
pub fn log_filter(rust_log: Option<&str>) -> EnvFilter {
    rust_log
        .filter(|v| !v.trim().is_empty())
        .and_then(|v| EnvFilter::try_new(v).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER))
}

/// 현재 환경의 `RUST_LOG`로 로그 필터 구성
pub fn log_filter_from_env() -> EnvFilter {
    log_filter(std::env::var("RUST_LOG").ok().as_deref())
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

// ============================================================================
// Tests
// ============================================================================
