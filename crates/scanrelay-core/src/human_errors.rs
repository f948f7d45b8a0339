// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages for operators submitting documents.
//
// Every technical error is mapped to plain English with a clear suggestion.
// Severity decides whether the caller should resubmit, fix the input, or give up.

use crate::error::ScanrelayError;

/// Severity of an error from the submitter's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Network blip, throttling — resubmitting later may work.
    Transient,
    /// The submitter must supply a different file or fix the setup.
    ActionRequired,
    /// The document cannot be processed as-is.
    Permanent,
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary.
    pub message: String,
    /// What the submitter should try.
    pub suggestion: String,
    /// Whether resubmitting the same file could succeed.
    pub retriable: bool,
    pub severity: Severity,
}

/// Convert a `ScanrelayError` into a `HumanError`.
pub fn humanize_error(err: &ScanrelayError) -> HumanError {
    match err {
        // -- Validation --
        ScanrelayError::HtmlFileDetected => HumanError {
            message: "This file is a web page, not a scanned document.".into(),
            suggestion: "The download probably returned an error or login page. Fetch the original PDF or image again.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        ScanrelayError::DocumentTooSmall { size, .. } => HumanError {
            message: "This file is too small to contain a document.".into(),
            suggestion: format!("The file is only {size} bytes. It may be empty or truncated; upload it again."),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        ScanrelayError::DocumentTooLarge { size, max } => HumanError {
            message: "This file is too large to process.".into(),
            suggestion: format!("The file is {size} bytes; the limit is {max}. Split it into smaller parts or scan at a lower resolution."),
            retriable: false,
            severity: Severity::Permanent,
        },

        ScanrelayError::UnsupportedFileType(detail) => HumanError {
            message: "This type of file isn't supported.".into(),
            suggestion: format!("Send a PDF, PNG, JPEG, or TIFF instead. ({detail})"),
            retriable: false,
            severity: Severity::Permanent,
        },

        // -- Processing --
        ScanrelayError::Conversion(_) | ScanrelayError::Optimization(_) => HumanError {
            message: "The document couldn't be prepared for text recognition.".into(),
            suggestion: "The original file was used instead. If results look poor, try a cleaner scan.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        ScanrelayError::NoTextExtracted => HumanError {
            message: "No text could be read from this document.".into(),
            suggestion: "The scan may be blank, upside down, or too blurry. Try scanning it again in good light.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        ScanrelayError::Backend(detail) => humanize_backend_error(detail),

        // -- Setup --
        ScanrelayError::InvalidConfig(detail) => HumanError {
            message: "The service is misconfigured.".into(),
            suggestion: format!("Fix the configuration file and restart. ({detail})"),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        ScanrelayError::Io(io_err) => {
            if io_err.kind() == std::io::ErrorKind::NotFound {
                HumanError {
                    message: "The file couldn't be found.".into(),
                    suggestion: "It may have been moved or deleted before processing started.".into(),
                    retriable: false,
                    severity: Severity::ActionRequired,
                }
            } else if io_err.kind() == std::io::ErrorKind::PermissionDenied {
                HumanError {
                    message: "The service doesn't have permission to read that file.".into(),
                    suggestion: "Check the file permissions on the input and work directories.".into(),
                    retriable: false,
                    severity: Severity::ActionRequired,
                }
            } else {
                HumanError {
                    message: "There was a problem reading or writing a file.".into(),
                    suggestion: "Try again. If this keeps happening, the disk may be full.".into(),
                    retriable: true,
                    severity: Severity::Transient,
                }
            }
        }

        ScanrelayError::Serialization(_) => HumanError {
            message: "The service had an internal data problem.".into(),
            suggestion: "Try again. If this keeps happening, please report it.".into(),
            retriable: true,
            severity: Severity::Transient,
        },
    }
}

/// Parse OCR backend failure details into human-readable messages.
fn humanize_backend_error(detail: &str) -> HumanError {
    let lower = detail.to_ascii_lowercase();

    if lower.contains("timed out") || lower.contains("timeout") {
        HumanError {
            message: "The text recognition service didn't respond in time.".into(),
            suggestion: "Large documents take longer. Try again in a few minutes.".into(),
            retriable: true,
            severity: Severity::Transient,
        }
    } else if lower.contains("429") || lower.contains("throttl") {
        HumanError {
            message: "The text recognition service is busy.".into(),
            suggestion: "Too many documents were sent at once. Wait a minute and try again.".into(),
            retriable: true,
            severity: Severity::Transient,
        }
    } else if lower.contains("401") || lower.contains("403") {
        HumanError {
            message: "The text recognition service rejected our credentials.".into(),
            suggestion: "Check SCANRELAY_OCR_API_KEY and the endpoint address.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        }
    } else if lower.contains("not configured") {
        HumanError {
            message: "No text recognition service is configured.".into(),
            suggestion: "Set SCANRELAY_OCR_ENDPOINT or add ocr_endpoint to the config file.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        }
    } else {
        HumanError {
            message: "The text recognition service had a problem.".into(),
            suggestion: format!("Try again. If this keeps happening, check the service status. (Detail: {detail})"),
            retriable: true,
            severity: Severity::Transient,
        }
    }
}
