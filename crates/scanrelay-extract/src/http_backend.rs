// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// HTTP OCR backend. Talks to a recognition gateway that accepts a base64
// document and answers with Textract-shaped blocks; only LINE blocks are kept.

use std::time::Duration;

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, instrument, warn};

use scanrelay_core::OcrClientConfig;
use scanrelay_core::error::{Result, ScanrelayError};
use scanrelay_core::types::{FeatureTag, OcrLine};

use crate::backend::OcrBackend;
use crate::retry::{RetryConfig, RetryDecision, should_retry};

const DETECT_OPERATION: &str = "detect-text";
const ANALYZE_OPERATION: &str = "analyze-document";

/// OCR client bound to one timeout/retry profile.
pub struct HttpOcrBackend {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    timeout: Duration,
    retry: RetryConfig,
}

impl HttpOcrBackend {
    pub fn new(endpoint: &str, api_key: Option<&str>, config: OcrClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| ScanrelayError::Backend(format!("HTTP client build failed: {e}")))?;
        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key: api_key.map(str::to_string),
            timeout: config.timeout(),
            retry: config.into(),
        })
    }

    /// Call `operation`, retrying transient failures within the budget.
    async fn call(&self, operation: &str, body: &Value) -> Result<Vec<OcrLine>> {
        let mut attempt = 0;
        loop {
            match self.call_once(operation, body).await {
                Ok(lines) => return Ok(lines),
                Err(err) => match should_retry(&err, attempt, &self.retry) {
                    RetryDecision::RetryAfter(delay) => {
                        warn!(operation, attempt, error = %err, "OCR call failed — retrying");
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                    }
                    RetryDecision::GiveUp | RetryDecision::Exhausted => return Err(err),
                },
            }
        }
    }

    async fn call_once(&self, operation: &str, body: &Value) -> Result<Vec<OcrLine>> {
        let url = format!("{}/{}", self.endpoint, operation);
        let mut request = self.client.post(&url).json(body);
        if let Some(key) = &self.api_key {
            request = request.header("x-api-key", key);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                ScanrelayError::Backend(format!(
                    "{operation} timed out after {}s",
                    self.timeout.as_secs()
                ))
            } else {
                ScanrelayError::Backend(format!("{operation} request failed: {e}"))
            }
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(ScanrelayError::Backend(format!(
                "{operation} returned {status}: {text}"
            )));
        }

        let parsed: OcrResponse = response.json().await.map_err(|e| {
            ScanrelayError::Backend(format!("{operation} response parse failed: {e}"))
        })?;
        let lines = parsed.into_lines();
        debug!(operation, lines = lines.len(), "OCR call complete");
        Ok(lines)
    }
}

#[async_trait]
impl OcrBackend for HttpOcrBackend {
    #[instrument(skip_all, fields(bytes = document.len()))]
    async fn detect_text(&self, document: &[u8]) -> Result<Vec<OcrLine>> {
        let body = json!({
            "Document": { "Bytes": general_purpose::STANDARD.encode(document) },
        });
        self.call(DETECT_OPERATION, &body).await
    }

    #[instrument(skip_all, fields(bytes = document.len(), ?features))]
    async fn analyze_document(
        &self,
        document: &[u8],
        features: &[FeatureTag],
    ) -> Result<Vec<OcrLine>> {
        let feature_types: Vec<&str> = features.iter().map(FeatureTag::as_wire_name).collect();
        let body = json!({
            "Document": { "Bytes": general_purpose::STANDARD.encode(document) },
            "FeatureTypes": feature_types,
        });
        self.call(ANALYZE_OPERATION, &body).await
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct OcrResponse {
    #[serde(default)]
    pub blocks: Vec<Block>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Block {
    pub block_type: String,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub confidence: Option<f32>,
}

impl OcrResponse {
    /// Keep LINE blocks that carry text, in response order.
    pub fn into_lines(self) -> Vec<OcrLine> {
        self.blocks
            .into_iter()
            .filter(|b| b.block_type == "LINE")
            .filter_map(|b| b.text.map(|text| OcrLine::new(text, b.confidence)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_line_blocks_are_kept() {
        let raw = r#"{
            "Blocks": [
                { "BlockType": "PAGE" },
                { "BlockType": "LINE", "Text": "ACME BANK", "Confidence": 99.1 },
                { "BlockType": "WORD", "Text": "ACME", "Confidence": 99.5 },
                { "BlockType": "LINE", "Text": "Statement period" },
                { "BlockType": "LINE", "Confidence": 40.0 }
            ]
        }"#;
        let lines = serde_json::from_str::<OcrResponse>(raw).unwrap().into_lines();
        assert_eq!(
            lines,
            vec![
                OcrLine::new("ACME BANK", Some(99.1)),
                OcrLine::new("Statement period", None),
            ]
        );
    }

    #[test]
    fn missing_blocks_is_empty() {
        let lines = serde_json::from_str::<OcrResponse>("{}").unwrap().into_lines();
        assert!(lines.is_empty());
    }

    #[test]
    fn endpoint_trailing_slash_is_trimmed() {
        let backend =
            HttpOcrBackend::new("https://ocr.internal/", None, OcrClientConfig::standard()).unwrap();
        assert_eq!(backend.endpoint, "https://ocr.internal");
        assert_eq!(backend.retry.max_retries, 3);
        assert_eq!(backend.timeout, Duration::from_secs(60));
    }

    #[tokio::test]
    async fn unreachable_endpoint_surfaces_backend_error() {
        let config = OcrClientConfig {
            timeout_secs: 1,
            max_retries: 0,
        };
        // Port 9 (discard) is closed on test hosts; the connection is refused.
        let backend = HttpOcrBackend::new("http://127.0.0.1:9", None, config).unwrap();
        let result = backend.detect_text(b"%PDF-1.4").await;
        assert!(matches!(result, Err(ScanrelayError::Backend(_))));
    }
}
