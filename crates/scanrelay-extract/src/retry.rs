// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Retry engine with exponential backoff + jitter for OCR backend calls.
//
// Classifies errors into Transient (auto-retry) and Permanent (give up).
// Only transient errors consume the client's retry budget.

use std::time::Duration;

use scanrelay_core::OcrClientConfig;
use scanrelay_core::error::ScanrelayError;
use scanrelay_core::types::ErrorClass;
use tracing::{debug, info, warn};

/// Retry configuration.
#[derive(Debug, Clone, Copy)]
pub struct RetryConfig {
    /// Maximum number of retry attempts after the first call.
    pub max_retries: u32,
    /// Base delay between retries (exponential backoff).
    pub base_delay: Duration,
    /// Maximum delay between retries.
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl From<OcrClientConfig> for RetryConfig {
    fn from(config: OcrClientConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            ..Default::default()
        }
    }
}

/// Result of evaluating whether to retry.
#[derive(Debug)]
pub enum RetryDecision {
    /// Retry after this delay.
    RetryAfter(Duration),
    /// Do not retry — the error is permanent.
    GiveUp,
    /// Maximum retries exhausted.
    Exhausted,
}

/// Classify a `ScanrelayError` for retry decisions.
pub fn classify_error(err: &ScanrelayError) -> ErrorClass {
    match err {
        ScanrelayError::Backend(detail) => classify_backend_detail(detail),

        ScanrelayError::Io(io_err) => match io_err.kind() {
            std::io::ErrorKind::TimedOut
            | std::io::ErrorKind::ConnectionRefused
            | std::io::ErrorKind::ConnectionReset
            | std::io::ErrorKind::ConnectionAborted
            | std::io::ErrorKind::Interrupted => ErrorClass::Transient,
            _ => ErrorClass::Permanent,
        },

        // Bad input, bad config, or a local processing failure
        ScanrelayError::HtmlFileDetected
        | ScanrelayError::DocumentTooSmall { .. }
        | ScanrelayError::DocumentTooLarge { .. }
        | ScanrelayError::UnsupportedFileType(_)
        | ScanrelayError::Conversion(_)
        | ScanrelayError::Optimization(_)
        | ScanrelayError::NoTextExtracted
        | ScanrelayError::InvalidConfig(_)
        | ScanrelayError::Serialization(_) => ErrorClass::Permanent,
    }
}

/// Classify a backend error detail string.
fn classify_backend_detail(detail: &str) -> ErrorClass {
    let lower = detail.to_ascii_lowercase();

    // Timeouts, throttling, connection trouble, server errors
    if lower.contains("timed out")
        || lower.contains("throttl")
        || lower.contains("returned 429")
        || lower.contains("returned 5")
        || lower.contains("request failed")
        || lower.contains("connection")
    {
        return ErrorClass::Transient;
    }

    // Rejected request, bad credentials, unreadable response
    ErrorClass::Permanent
}

/// Decide whether to retry based on the error class and attempt count.
pub fn should_retry(err: &ScanrelayError, attempt: u32, config: &RetryConfig) -> RetryDecision {
    match classify_error(err) {
        ErrorClass::Permanent => {
            info!("permanent error — not retrying");
            RetryDecision::GiveUp
        }
        ErrorClass::Transient => {
            if attempt >= config.max_retries {
                warn!(attempt, max = config.max_retries, "retry limit exhausted");
                RetryDecision::Exhausted
            } else {
                let delay = compute_delay(attempt, config);
                debug!(attempt, delay_ms = delay.as_millis(), "scheduling retry");
                RetryDecision::RetryAfter(delay)
            }
        }
    }
}

/// Compute exponential backoff delay with jitter.
///
/// delay = min(base * 2^attempt + jitter, max_delay)
/// jitter lies in [0, base) so that concurrent requests spread out.
pub fn compute_delay(attempt: u32, config: &RetryConfig) -> Duration {
    let base_ms = config.base_delay.as_millis() as u64;
    let exp_ms = base_ms.saturating_mul(1u64 << attempt.min(10));

    let jitter_ms = jitter(base_ms, attempt);
    let total_ms = exp_ms.saturating_add(jitter_ms);
    let capped_ms = total_ms.min(config.max_delay.as_millis() as u64);

    Duration::from_millis(capped_ms)
}

/// Deterministic spread derived from the attempt number.
fn jitter(base_ms: u64, attempt: u32) -> u64 {
    let hash = (attempt as u64).wrapping_mul(6364136223846793005);
    hash % base_ms.max(1)
}
