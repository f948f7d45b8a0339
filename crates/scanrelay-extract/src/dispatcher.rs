// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Extraction dispatch — chooses the OCR call shape for a prepared file,
// invokes the backend, and folds the returned lines into one result.
//
// Structured document types and large payloads go to the analyze call;
// everything else uses plain detection. Analyze payloads above the sync
// ceiling use the long-running client. A failed analyze call falls back to
// detection once before giving up.

use std::path::Path;
use std::sync::Arc;

use scanrelay_core::PipelineConfig;
use scanrelay_core::error::{Result, ScanrelayError};
use scanrelay_core::types::{ExtractionResult, FeatureTag, OcrLine};
use scanrelay_document::validate_document;
use tracing::{info, instrument, warn};

use crate::backend::OcrClients;

/// Which analyze client to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalyzeMode {
    /// Within the sync ceiling: standard client.
    Sync,
    /// Above the sync ceiling: extended timeout and retry budget.
    LongRunning,
}

/// The OCR request to issue for one payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallShape {
    Detect,
    Analyze {
        mode: AnalyzeMode,
        features: Vec<FeatureTag>,
    },
}

/// Choose the call shape for a payload of `len` bytes.
pub fn plan_call(config: &PipelineConfig, len: usize, doc_type: Option<&str>) -> CallShape {
    let structured = doc_type.is_some_and(|t| config.is_structured(t));
    if !structured && len < config.analyze_byte_threshold {
        return CallShape::Detect;
    }

    let mode = if len <= config.limits.sync_byte_ceiling {
        AnalyzeMode::Sync
    } else {
        AnalyzeMode::LongRunning
    };
    CallShape::Analyze {
        mode,
        features: config.feature_tags_for(doc_type),
    }
}

/// Join line texts with single spaces and average the reported confidences.
///
/// Lines without a confidence are left out of the mean; with none at all the
/// mean is 0.
pub fn aggregate(lines: &[OcrLine]) -> (String, f32) {
    let text = lines
        .iter()
        .map(|l| l.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string();

    let confidences: Vec<f32> = lines.iter().filter_map(|l| l.confidence).collect();
    let avg = if confidences.is_empty() {
        0.0
    } else {
        confidences.iter().sum::<f32>() / confidences.len() as f32
    };

    (text, avg)
}

/// Sends prepared files to the OCR backend.
pub struct ExtractionDispatcher {
    config: Arc<PipelineConfig>,
    clients: OcrClients,
}

impl ExtractionDispatcher {
    pub fn new(config: Arc<PipelineConfig>, clients: OcrClients) -> Self {
        Self { config, clients }
    }

    /// Validate, dispatch, and aggregate. Fails on validation errors, on a
    /// detect failure, or when the aggregated text is empty.
    #[instrument(skip_all, fields(file = %file_path.display(), doc_type = ?doc_type))]
    pub async fn extract(&self, file_path: &Path, doc_type: Option<&str>) -> Result<ExtractionResult> {
        let bytes = tokio::fs::read(file_path).await?;
        let kind = validate_document(
            &bytes,
            self.config.min_document_bytes,
            self.config.limits.async_byte_ceiling,
        )?;

        let shape = plan_call(&self.config, bytes.len(), doc_type);
        info!(kind = kind.mime_type(), len = bytes.len(), ?shape, "dispatching to OCR backend");

        let (lines, used_analyze) = match shape {
            CallShape::Detect => (self.clients.standard.detect_text(&bytes).await?, false),
            CallShape::Analyze { mode, features } => {
                let client = match mode {
                    AnalyzeMode::Sync => &self.clients.standard,
                    AnalyzeMode::LongRunning => &self.clients.long_running,
                };
                match client.analyze_document(&bytes, &features).await {
                    Ok(lines) => (lines, true),
                    Err(err) => {
                        warn!(error = %err, "analyze failed — falling back to detect");
                        (self.clients.standard.detect_text(&bytes).await?, false)
                    }
                }
            }
        };

        let (text, avg_confidence) = aggregate(&lines);
        if text.is_empty() {
            return Err(ScanrelayError::NoTextExtracted);
        }

        info!(
            lines = lines.len(),
            chars = text.len(),
            avg_confidence,
            used_analyze,
            "text extracted"
        );
        Ok(ExtractionResult {
            text,
            avg_confidence,
            used_analyze,
        })
    }
}
