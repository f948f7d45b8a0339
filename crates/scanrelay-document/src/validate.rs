// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Input validation shared by the pipeline entry point and the extraction
// dispatcher. Rejects HTML error pages saved under a document name, truncated
// files, oversized payloads, and anything that is not PDF/PNG/JPEG/TIFF.

use scanrelay_core::error::{Result, ScanrelayError};
use scanrelay_core::types::FileKind;
use tracing::{debug, warn};

/// Bytes inspected when looking for HTML markup.
const HTML_SNIFF_WINDOW: usize = 1024;

/// Validate a document buffer and return its sniffed type.
///
/// Checks run in a fixed order: HTML markup, minimum size, maximum size,
/// magic bytes. The HTML check comes first so that a short error page is
/// reported as HTML rather than as a truncated file.
pub fn validate_document(bytes: &[u8], min_bytes: usize, max_bytes: usize) -> Result<FileKind> {
    if looks_like_html(bytes) {
        warn!(len = bytes.len(), "rejecting HTML content posing as a document");
        return Err(ScanrelayError::HtmlFileDetected);
    }

    if bytes.len() < min_bytes {
        return Err(ScanrelayError::DocumentTooSmall {
            size: bytes.len(),
            min: min_bytes,
        });
    }

    if bytes.len() > max_bytes {
        return Err(ScanrelayError::DocumentTooLarge {
            size: bytes.len(),
            max: max_bytes,
        });
    }

    let kind = FileKind::from_magic(bytes).ok_or_else(|| {
        let head: Vec<String> = bytes.iter().take(8).map(|b| format!("{b:02x}")).collect();
        ScanrelayError::UnsupportedFileType(format!("unrecognised header {}", head.join(" ")))
    })?;

    debug!(kind = kind.mime_type(), len = bytes.len(), "document validated");
    Ok(kind)
}

/// True when the head of the buffer is HTML markup.
pub fn looks_like_html(bytes: &[u8]) -> bool {
    let window = &bytes[..bytes.len().min(HTML_SNIFF_WINDOW)];
    let head = String::from_utf8_lossy(window).to_ascii_lowercase();
    let trimmed = head.trim_start_matches('\u{feff}').trim_start();
    if trimmed.starts_with("<!doctype html") || trimmed.starts_with("<html") {
        return true;
    }
    // Recognised binaries may carry the string in metadata.
    FileKind::from_magic(bytes).is_none() && head.contains("<html")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pdf_of_len(len: usize) -> Vec<u8> {
        let mut bytes = b"%PDF-1.4\n".to_vec();
        bytes.resize(len, b' ');
        bytes
    }

    #[test]
    fn accepts_pdf_within_bounds() {
        assert_eq!(validate_document(&pdf_of_len(500), 100, 1000).unwrap(), FileKind::Pdf);
    }

    #[test]
    fn html_is_reported_before_size() {
        let html = b"<!DOCTYPE html><html><body>Access denied</body></html>";
        assert!(matches!(
            validate_document(html, 100, 1000),
            Err(ScanrelayError::HtmlFileDetected)
        ));
    }

    #[test]
    fn html_with_leading_whitespace_and_bom() {
        let mut page = "\u{feff}\n   <HTML><head></head>".as_bytes().to_vec();
        page.resize(400, b' ');
        assert!(looks_like_html(&page));
    }

    #[test]
    fn markup_after_leading_text_is_html() {
        let page = b"\n<!-- proxy error -->\n<html><body>Gateway timeout</body></html>";
        assert!(looks_like_html(page));
    }

    #[test]
    fn html_string_inside_pdf_metadata_is_not_html() {
        let mut pdf = b"%PDF-1.7\n1 0 obj << /Title (<html> export) >> endobj\n".to_vec();
        pdf.resize(500, b' ');
        assert!(!looks_like_html(&pdf));
        assert_eq!(validate_document(&pdf, 100, 1000).unwrap(), FileKind::Pdf);
    }

    #[test]
    fn html_string_inside_png_text_chunk_is_not_html() {
        let mut png = b"\x89PNG\r\n\x1a\n\0\0\0\x10tEXtComment\0<html>".to_vec();
        png.resize(300, 0);
        assert_eq!(validate_document(&png, 100, 1000).unwrap(), FileKind::Png);
    }

    #[test]
    fn size_boundaries() {
        assert!(matches!(
            validate_document(&pdf_of_len(99), 100, 1000),
            Err(ScanrelayError::DocumentTooSmall { size: 99, min: 100 })
        ));
        assert!(validate_document(&pdf_of_len(100), 100, 1000).is_ok());
        assert!(validate_document(&pdf_of_len(1000), 100, 1000).is_ok());
        assert!(matches!(
            validate_document(&pdf_of_len(1001), 100, 1000),
            Err(ScanrelayError::DocumentTooLarge { size: 1001, max: 1000 })
        ));
    }

    #[test]
    fn unknown_magic_is_unsupported() {
        let mut gif = b"GIF89a".to_vec();
        gif.resize(200, 0);
        assert!(matches!(
            validate_document(&gif, 100, 1000),
            Err(ScanrelayError::UnsupportedFileType(_))
        ));
    }
}
