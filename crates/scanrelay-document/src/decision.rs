// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Conversion decision — rasterisation is expensive and only helps scanned or
// low-quality PDFs, so it is attempted only when every gate passes.

use std::path::Path;
use std::sync::Arc;

use scanrelay_core::PipelineConfig;
use tracing::{debug, info};

use crate::quality::QualityAssessor;

/// Decides whether a document should go through the conversion chain.
pub struct ConversionDecisionEngine {
    config: Arc<PipelineConfig>,
    assessor: QualityAssessor,
}

impl ConversionDecisionEngine {
    pub fn new(config: Arc<PipelineConfig>) -> Self {
        Self {
            config,
            assessor: QualityAssessor::new(),
        }
    }

    /// True only when the buffer is a PDF of a convertible type, inside the
    /// conversion size window, and scores below the quality threshold.
    /// Pure: no side effects beyond logging.
    pub fn should_convert(&self, file_path: &Path, doc_type: Option<&str>, buffer: &[u8]) -> bool {
        let path = file_path.display();

        if !buffer.starts_with(b"%PDF") {
            debug!(%path, "not a PDF — skipping conversion");
            return false;
        }

        let Some(doc_type) = doc_type.filter(|t| self.config.is_convertible(t)) else {
            debug!(%path, ?doc_type, "document type not in conversion allow-list");
            return false;
        };

        let limits = &self.config.limits;
        let len = buffer.len();
        if len < limits.min_bytes_for_conversion || len > limits.max_bytes_for_conversion {
            debug!(
                %path,
                len,
                min = limits.min_bytes_for_conversion,
                max = limits.max_bytes_for_conversion,
                "size outside conversion window"
            );
            return false;
        }

        let quality = self.assessor.assess(buffer);
        let convert = quality.score < self.config.quality_threshold;
        info!(
            %path,
            doc_type,
            score = quality.score,
            threshold = self.config.quality_threshold,
            convert,
            "conversion decision"
        );
        convert
    }
}
