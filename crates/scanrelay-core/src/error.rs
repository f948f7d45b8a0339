// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Scanrelay.

use thiserror::Error;

/// Top-level error type for all Scanrelay operations.
#[derive(Debug, Error)]
pub enum ScanrelayError {
    // -- Validation errors (fatal for the current document) --
    #[error("file is an HTML page, not a document")]
    HtmlFileDetected,

    #[error("document too small: {size} bytes (minimum {min})")]
    DocumentTooSmall { size: usize, min: usize },

    #[error("document too large: {size} bytes (maximum {max})")]
    DocumentTooLarge { size: usize, max: usize },

    #[error("unsupported file type: {0}")]
    UnsupportedFileType(String),

    // -- Recoverable processing errors --
    #[error("conversion failed: {0}")]
    Conversion(String),

    #[error("image optimisation failed: {0}")]
    Optimization(String),

    // -- Extraction errors --
    #[error("no text extracted from document")]
    NoTextExtracted,

    #[error("OCR backend error: {0}")]
    Backend(String),

    // -- Configuration --
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ScanrelayError {
    /// True for the header/size/type checks that reject a document outright.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::HtmlFileDetected
                | Self::DocumentTooSmall { .. }
                | Self::DocumentTooLarge { .. }
                | Self::UnsupportedFileType(_)
        )
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ScanrelayError>;
