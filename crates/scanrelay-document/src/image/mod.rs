// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image module — candidate selection, bounded resize and recompression for OCR.

pub mod optimizer;
pub mod processor;
pub mod selector;

pub use optimizer::ImageOptimizer;
pub use processor::ImageProcessor;
pub use selector::ImageSelector;
