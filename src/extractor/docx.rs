//! DOCX 텍스트 추출
//!
//! DOCX는 ZIP 아카이브이며 본문은 `word/document.xml`에 있습니다.
//! `<w:t>` 런의 텍스트만 모으고, 문단(`<w:p>`)과 줄바꿈(`<w:br/>`)은 개행으로,
//! 탭(`<w:tab/>`)은 `\t`로 옮깁니다.

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};

const DOCUMENT_XML: &str = "word/document.xml";

/// DOCX 파일에서 본문 텍스트 추출
pub fn extract_text_from_docx(path: &Path) -> Result<String> {
    let file = std::fs::File::open(path).with_context(|| format!("Failed to open DOCX: {:?}", path))?;
    let mut archive = zip::ZipArchive::new(file).context("Invalid DOCX archive")?;

    let mut entry = archive
        .by_name(DOCUMENT_XML)
        .context("No word/document.xml found in DOCX")?;

    let mut xml = String::new();
    entry
        .read_to_string(&mut xml)
        .context("Failed to read word/document.xml")?;

    Ok(docx_xml_to_text(&xml))
}

/// document.xml 본문을 평문으로 변환
pub fn docx_xml_to_text(xml: &str) -> String {
    let mut out = String::new();
    let mut in_text = false;
    let mut rest = xml;

    while let Some(open) = rest.find('<') {
        if in_text {
            out.push_str(&decode_entities(&rest[..open]));
        }

        let Some(close) = rest[open..].find('>') else {
            break;
        };
        let tag = &rest[open + 1..open + close];
        rest = &rest[open + close + 1..];

        let self_closing = tag.ends_with('/');
        let name = tag
            .trim_end_matches('/')
            .split_whitespace()
            .next()
            .unwrap_or_default();

        match name {
            "w:t" if !self_closing => in_text = true,
            "/w:t" => in_text = false,
            "w:p" if !self_closing => {
                if !out.is_empty() && !out.ends_with('\n') {
                    out.push('\n');
                }
            }
            "w:br" | "w:cr" => out.push('\n'),
            "w:tab" => out.push('\t'),
            _ => {}
        }
    }

    out
}

/// XML 기본 엔티티 디코딩
fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    const SAMPLE: &str = r#"<?xml version="1.0"?><w:document><w:body><w:p><w:r><w:t>Refund policy</w:t></w:r></w:p><w:p><w:r><w:t xml:space="preserve">Returns within </w:t></w:r><w:r><w:t>30 days &amp; with receipt.</w:t></w:r></w:p><w:p><w:r><w:t>Name</w:t><w:tab/><w:t>Value</w:t><w:br/><w:t>next</w:t></w:r></w:p></w:body></w:document>"#;

    #[test]
    fn test_paragraphs_and_entities() {
        let text = docx_xml_to_text(SAMPLE);
        assert_eq!(
            text,
            "Refund policy\nReturns within 30 days & with receipt.\nName\tValue\nnext"
        );
    }

    #[test]
    fn test_ignores_text_outside_runs() {
        let text = docx_xml_to_text("<w:p><w:pPr>style</w:pPr><w:t>kept</w:t></w:p>");
        assert_eq!(text, "kept");
    }

    #[test]
    fn test_extract_from_archive() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("policy.docx");

        let file = std::fs::File::create(&path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        zip.start_file(DOCUMENT_XML, zip::write::FileOptions::default())
            .unwrap();
        zip.write_all(SAMPLE.as_bytes()).unwrap();
        zip.finish().unwrap();

        let text = extract_text_from_docx(&path).unwrap();
        assert!(text.starts_with("Refund policy\n"));
    }

    #[test]
    fn test_archive_without_document_xml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.docx");

        let file = std::fs::File::create(&path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        zip.start_file("other.xml", zip::write::FileOptions::default())
            .unwrap();
        zip.write_all(b"<x/>").unwrap();
        zip.finish().unwrap();

        let err = extract_text_from_docx(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("No word/document.xml"));
    }
}
