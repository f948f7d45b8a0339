// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Scanrelay extraction pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

/// Unique identifier for one pipeline invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(pub Uuid);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// First eight hex digits, used to namespace work directories.
    pub fn short(&self) -> String {
        self.0.simple().to_string()[..8].to_string()
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// File types accepted for OCR submission, identified by magic bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileKind {
    Pdf,
    Png,
    Jpeg,
    Tiff,
}

impl FileKind {
    /// MIME type string sent alongside the payload.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Tiff => "image/tiff",
        }
    }

    /// Sniff the file type from the leading bytes of a buffer.
    pub fn from_magic(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(b"%PDF") {
            Some(Self::Pdf)
        } else if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
            Some(Self::Png)
        } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(Self::Jpeg)
        } else if bytes.starts_with(b"II*\0") || bytes.starts_with(b"MM\0*") {
            Some(Self::Tiff)
        } else {
            None
        }
    }
}

/// A structural-extraction capability requested from the OCR backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FeatureTag {
    Forms,
    Tables,
    Signatures,
    Layout,
}

impl FeatureTag {
    /// Wire name understood by the backend (`FeatureTypes` entries).
    pub fn as_wire_name(&self) -> &'static str {
        match self {
            Self::Forms => "FORMS",
            Self::Tables => "TABLES",
            Self::Signatures => "SIGNATURES",
            Self::Layout => "LAYOUT",
        }
    }
}

/// Heuristic OCR-suitability score derived from the head of a PDF buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QualityScore {
    pub score: i32,
    pub has_native_text: bool,
    pub has_image_objects: bool,
    pub image_object_count: usize,
}

impl QualityScore {
    /// Informational only; the conversion decision uses its own threshold.
    pub fn is_high_quality(&self) -> bool {
        self.score >= 20
    }
}

/// Record of one conversion strategy invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionAttempt {
    pub strategy_name: &'static str,
    pub output_paths: Vec<PathBuf>,
    pub succeeded: bool,
}

/// A single line of recognised text as reported by the OCR backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrLine {
    pub text: String,
    /// Backend confidence in 0..=100, when reported.
    pub confidence: Option<f32>,
}

impl OcrLine {
    pub fn new(text: impl Into<String>, confidence: Option<f32>) -> Self {
        Self {
            text: text.into(),
            confidence,
        }
    }
}

/// Terminal output of the pipeline for one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub text: String,
    pub avg_confidence: f32,
    pub used_analyze: bool,
}

/// Classification of errors for retry logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorClass {
    /// Timeout, throttling, server hiccup — safe to retry automatically.
    Transient,
    /// Bad request, rejected document, auth failure — retrying cannot help.
    Permanent,
}
