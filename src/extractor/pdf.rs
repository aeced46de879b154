//! PDF 텍스트 추출
//!
//! pdf-extract 크레이트로 텍스트를 뽑은 뒤 페이지 단위로 나눕니다.

use std::path::Path;
use std::sync::OnceLock;

use anyhow::{Context, Result};
use regex::Regex;

/// "--- Page 3 ---" 형태의 페이지 구분 줄
fn page_marker() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?m)^[\s]*[-=]+[\s]*(?:Page[\s]*)?(\d+)[\s]*[-=]+[\s]*$")
            .expect("page marker regex")
    })
}

/// PDF에서 (페이지 번호, 텍스트) 목록 추출
///
/// 페이지 번호는 1부터 시작합니다. 텍스트가 없는 PDF(스캔본 등)는
/// 빈 1페이지로 반환합니다.
pub fn extract_text_from_pdf(path: &Path) -> Result<Vec<(usize, String)>> {
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read PDF: {:?}", path))?;

    let text = pdf_extract::extract_text_from_mem(&bytes)
        .with_context(|| format!("Failed to extract text from PDF: {:?}", path))?;

    if text.trim().is_empty() {
        tracing::warn!(
            "No text extracted from PDF: {:?}. It might be a scanned document.",
            path
        );
        return Ok(vec![(1, String::new())]);
    }

    Ok(split_pdf_pages(&text)
        .into_iter()
        .enumerate()
        .map(|(i, page)| (i + 1, page))
        .collect())
}

/// 폼피드(\x0c) 또는 페이지 구분 줄로 분리
///
/// 분리할 수 없으면 전체를 한 페이지로 취급합니다.
fn split_pdf_pages(text: &str) -> Vec<String> {
    let by_formfeed: Vec<String> = text
        .split('\x0c')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    if by_formfeed.len() > 1 {
        return by_formfeed;
    }

    let marker = page_marker();
    if marker.is_match(text) {
        let by_marker: Vec<String> = marker
            .split(text)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        if by_marker.len() > 1 {
            return by_marker;
        }
    }

    vec![text.to_string()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_by_formfeed() {
        let pages = split_pdf_pages("Intro\x0cPricing\x0c\x0cAppendix");
        assert_eq!(pages, vec!["Intro", "Pricing", "Appendix"]);
    }

    #[test]
    fn test_split_by_page_marker() {
        let text = "First page body\n--- Page 2 ---\nSecond page body";
        let pages = split_pdf_pages(text);
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[1], "Second page body");
    }

    #[test]
    fn test_single_page_kept_verbatim() {
        let text = "  one page only  ";
        assert_eq!(split_pdf_pages(text), vec![text.to_string()]);
    }
}
