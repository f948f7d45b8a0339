// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// scanrelay-document — Document preparation for the Scanrelay OCR pipeline.
//
// Provides input validation, the PDF quality heuristic and conversion decision,
// the ordered PDF-to-image conversion chain, best-image selection and
// optimisation, and per-request tracking of generated artifacts.

pub mod artifacts;
pub mod convert;
pub mod decision;
pub mod image;
pub mod quality;
pub mod validate;

// Re-export the primary structs so callers can use `scanrelay_document::ConversionChain` etc.
pub use artifacts::ArtifactTracker;
pub use convert::{CapabilityRegistry, ConversionChain, ConversionStrategy, ConvertOptions};
pub use decision::ConversionDecisionEngine;
pub use image::optimizer::ImageOptimizer;
pub use image::selector::ImageSelector;
pub use quality::QualityAssessor;
pub use validate::validate_document;
