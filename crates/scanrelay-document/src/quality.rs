// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF quality heuristic — a cheap byte-level scan of the document head that
// estimates whether the PDF already carries a usable text layer or is a
// stack of scanned page images.

use scanrelay_core::types::QualityScore;
use tracing::debug;

/// Only the head of the buffer is inspected.
pub const ASSESS_WINDOW: usize = 10_000;

const NATIVE_TEXT_BONUS: i32 = 30;
const IMAGE_OBJECT_PENALTY: i32 = 20;
const COMPRESSION_BONUS: i32 = 10;
const MULTI_IMAGE_PENALTY: i32 = 15;
/// More image objects than this suggests a scanned multi-image page.
const MULTI_IMAGE_COUNT: usize = 2;

const FONT_MARKERS: &[&str] = &["/Font", "/Glyph"];
const IMAGE_MARKER: &str = "/Image";
const COMPRESSION_MARKERS: &[&str] = &["/FlateDecode", "/DCTDecode", "/LZWDecode"];

/// Scores PDF buffers for OCR suitability.
#[derive(Debug, Clone, Copy, Default)]
pub struct QualityAssessor;

impl QualityAssessor {
    pub fn new() -> Self {
        Self
    }

    /// Score a buffer. Deterministic in the first [`ASSESS_WINDOW`] bytes and
    /// infallible: undecodable bytes are replaced, never rejected.
    pub fn assess(&self, buffer: &[u8]) -> QualityScore {
        let window = &buffer[..buffer.len().min(ASSESS_WINDOW)];
        let text = String::from_utf8_lossy(window);

        let has_native_text = FONT_MARKERS.iter().any(|m| text.contains(m));
        let image_object_count = text.matches(IMAGE_MARKER).count();
        let has_image_objects = image_object_count > 0;
        let has_compression = COMPRESSION_MARKERS.iter().any(|m| text.contains(m));

        let mut score = 0;
        if has_native_text {
            score += NATIVE_TEXT_BONUS;
        }
        if has_image_objects {
            score -= IMAGE_OBJECT_PENALTY;
        }
        if has_compression {
            score += COMPRESSION_BONUS;
        }
        if image_object_count > MULTI_IMAGE_COUNT {
            score -= MULTI_IMAGE_PENALTY;
        }

        debug!(
            score,
            has_native_text,
            image_object_count,
            has_compression,
            "PDF quality assessed"
        );

        QualityScore {
            score,
            has_native_text,
            has_image_objects,
            image_object_count,
        }
    }
}
