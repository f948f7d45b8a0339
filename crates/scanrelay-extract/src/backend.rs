// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// OCR backend abstraction. The recognition service is external; the pipeline
// only needs its two operations.

use std::sync::Arc;

use async_trait::async_trait;
use scanrelay_core::PipelineConfig;
use scanrelay_core::error::{Result, ScanrelayError};
use scanrelay_core::types::{FeatureTag, OcrLine};

use crate::http_backend::HttpOcrBackend;

/// A remote text-recognition service.
///
/// Implementations own their timeout and retry budget; a returned error means
/// that budget is already spent.
#[async_trait]
pub trait OcrBackend: Send + Sync {
    /// Plain line detection.
    async fn detect_text(&self, document: &[u8]) -> Result<Vec<OcrLine>>;

    /// Structured analysis with the requested feature tags.
    async fn analyze_document(&self, document: &[u8], features: &[FeatureTag])
    -> Result<Vec<OcrLine>>;
}

/// The two client configurations the dispatcher chooses between.
#[derive(Clone)]
pub struct OcrClients {
    /// 60 s / 3 retries: detect calls and analyze calls within the sync ceiling.
    pub standard: Arc<dyn OcrBackend>,
    /// 120 s / 5 retries: analyze calls above the sync ceiling.
    pub long_running: Arc<dyn OcrBackend>,
}

impl OcrClients {
    pub fn new(standard: Arc<dyn OcrBackend>, long_running: Arc<dyn OcrBackend>) -> Self {
        Self {
            standard,
            long_running,
        }
    }

    /// HTTP clients for the configured endpoint.
    pub fn http(config: &PipelineConfig) -> Result<Self> {
        let endpoint = config.ocr_endpoint.as_deref().ok_or_else(|| {
            ScanrelayError::InvalidConfig("OCR endpoint not configured".into())
        })?;
        let api_key = config.ocr_api_key.as_deref();

        Ok(Self {
            standard: Arc::new(HttpOcrBackend::new(endpoint, api_key, config.sync_client)?),
            long_running: Arc::new(HttpOcrBackend::new(
                endpoint,
                api_key,
                config.long_running_client,
            )?),
        })
    }
}
