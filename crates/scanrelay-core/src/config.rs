// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pipeline configuration. Loaded once at startup and shared read-only.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScanrelayError};
use crate::types::FeatureTag;

const KIB: usize = 1024;
const MIB: usize = 1024 * KIB;

/// Byte ceilings that steer validation, conversion, and dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SizeLimits {
    /// Largest payload sent through the synchronous analyze call.
    pub sync_byte_ceiling: usize,
    /// Largest payload accepted at all.
    pub async_byte_ceiling: usize,
    /// Smallest PDF worth rasterising.
    pub min_bytes_for_conversion: usize,
    /// Largest PDF worth rasterising.
    pub max_bytes_for_conversion: usize,
}

impl Default for SizeLimits {
    fn default() -> Self {
        Self {
            sync_byte_ceiling: 5 * MIB,
            async_byte_ceiling: 500 * MIB,
            min_bytes_for_conversion: 50 * KIB,
            max_bytes_for_conversion: 20 * MIB,
        }
    }
}

/// Per-document-type settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentProfile {
    pub doc_type: String,
    /// Feature tags requested from the analyze call. An empty set marks the
    /// type as unstructured (plain detect).
    #[serde(default)]
    pub ocr_features: BTreeSet<FeatureTag>,
    /// Whether scanned copies of this type benefit from rasterisation.
    #[serde(default)]
    pub convertible_to_image: bool,
}

impl DocumentProfile {
    pub fn new(
        doc_type: &str,
        ocr_features: impl IntoIterator<Item = FeatureTag>,
        convertible_to_image: bool,
    ) -> Self {
        Self {
            doc_type: doc_type.to_string(),
            ocr_features: ocr_features.into_iter().collect(),
            convertible_to_image,
        }
    }
}

/// Timeout and retry budget for one OCR client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OcrClientConfig {
    pub timeout_secs: u64,
    pub max_retries: u32,
}

impl OcrClientConfig {
    /// Client used for detect calls and small analyze calls.
    pub fn standard() -> Self {
        Self {
            timeout_secs: 60,
            max_retries: 3,
        }
    }

    /// Client used for analyze calls above the sync ceiling.
    pub fn long_running() -> Self {
        Self {
            timeout_secs: 120,
            max_retries: 5,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Complete pipeline settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub limits: SizeLimits,
    /// Conversion is attempted only when the quality score is below this.
    pub quality_threshold: i32,
    /// Payloads at or above this size always use the analyze call.
    pub analyze_byte_threshold: usize,
    /// Anything smaller is rejected as truncated or empty.
    pub min_document_bytes: usize,
    pub profiles: Vec<DocumentProfile>,
    /// Requested when the document type has no feature tags of its own.
    pub default_feature: FeatureTag,
    /// Rasterisation resolution in dots per inch.
    pub raster_dpi: u32,
    /// Upper bound on pages rendered per document.
    pub max_raster_pages: usize,
    /// Page rasteriser executable (poppler's `pdftoppm`).
    pub rasterizer_bin: String,
    pub optimize_images: bool,
    /// Bounding box (both axes) for optimised images, in pixels.
    pub optimize_max_dimension: u32,
    pub jpeg_quality: u8,
    /// Parent of the per-document work directories.
    pub work_root: PathBuf,
    pub ocr_endpoint: Option<String>,
    #[serde(skip_serializing)]
    pub ocr_api_key: Option<String>,
    pub sync_client: OcrClientConfig,
    pub long_running_client: OcrClientConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        use FeatureTag::{Forms, Tables};

        Self {
            limits: SizeLimits::default(),
            quality_threshold: 15,
            analyze_byte_threshold: MIB,
            min_document_bytes: 100,
            profiles: vec![
                DocumentProfile::new("bank_statement", [Tables, Forms], true),
                DocumentProfile::new("payslip", [Forms, Tables], true),
                DocumentProfile::new("utility_bill", [Forms], true),
                DocumentProfile::new("identity_card", [], true),
                DocumentProfile::new("passport", [], true),
                DocumentProfile::new("invoice", [Forms, Tables], false),
                DocumentProfile::new("tax_return", [Forms], false),
                DocumentProfile::new("contract", [], false),
            ],
            default_feature: Forms,
            raster_dpi: 300,
            max_raster_pages: 20,
            rasterizer_bin: "pdftoppm".into(),
            optimize_images: true,
            optimize_max_dimension: 4096,
            jpeg_quality: 90,
            work_root: std::env::temp_dir().join("scanrelay"),
            ocr_endpoint: None,
            ocr_api_key: None,
            sync_client: OcrClientConfig::standard(),
            long_running_client: OcrClientConfig::long_running(),
        }
    }
}

const ENV_OCR_ENDPOINT: &str = "SCANRELAY_OCR_ENDPOINT";
const ENV_OCR_API_KEY: &str = "SCANRELAY_OCR_API_KEY";

impl PipelineConfig {
    /// Read a JSON config file; missing fields take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Overlay `SCANRELAY_OCR_ENDPOINT` and `SCANRELAY_OCR_API_KEY` from the
    /// process environment. The API key is only ever taken from here or the
    /// config file; it is never serialised back out.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(endpoint) = lookup(ENV_OCR_ENDPOINT).filter(|v| !v.is_empty()) {
            self.ocr_endpoint = Some(endpoint);
        }
        if let Some(key) = lookup(ENV_OCR_API_KEY).filter(|v| !v.is_empty()) {
            self.ocr_api_key = Some(key);
        }
    }

    /// Check the ordering invariants between the size limits and basic ranges.
    pub fn validate(&self) -> Result<()> {
        let limits = &self.limits;
        if limits.sync_byte_ceiling >= limits.async_byte_ceiling {
            return Err(ScanrelayError::InvalidConfig(format!(
                "sync ceiling ({}) must be below async ceiling ({})",
                limits.sync_byte_ceiling, limits.async_byte_ceiling
            )));
        }
        if limits.min_bytes_for_conversion >= limits.max_bytes_for_conversion {
            return Err(ScanrelayError::InvalidConfig(format!(
                "conversion minimum ({}) must be below maximum ({})",
                limits.min_bytes_for_conversion, limits.max_bytes_for_conversion
            )));
        }
        if self.min_document_bytes >= limits.async_byte_ceiling {
            return Err(ScanrelayError::InvalidConfig(
                "minimum document size exceeds the async ceiling".into(),
            ));
        }
        if self.raster_dpi == 0 {
            return Err(ScanrelayError::InvalidConfig("raster DPI must be positive".into()));
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(ScanrelayError::InvalidConfig(format!(
                "JPEG quality must be 1-100, got {}",
                self.jpeg_quality
            )));
        }
        Ok(())
    }

    pub fn profile(&self, doc_type: &str) -> Option<&DocumentProfile> {
        self.profiles.iter().find(|p| p.doc_type == doc_type)
    }

    /// Membership in the conversion allow-list.
    pub fn is_convertible(&self, doc_type: &str) -> bool {
        self.profile(doc_type)
            .is_some_and(|p| p.convertible_to_image)
    }

    /// Membership in the structured set (always dispatched to analyze).
    pub fn is_structured(&self, doc_type: &str) -> bool {
        self.profile(doc_type)
            .is_some_and(|p| !p.ocr_features.is_empty())
    }

    /// Feature tags for the analyze call, falling back to the default tag.
    pub fn feature_tags_for(&self, doc_type: Option<&str>) -> Vec<FeatureTag> {
        match doc_type.and_then(|t| self.profile(t)) {
            Some(profile) if !profile.ocr_features.is_empty() => {
                profile.ocr_features.iter().copied().collect()
            }
            _ => vec![self.default_feature],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_satisfy_invariants() {
        let config = PipelineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.limits.sync_byte_ceiling, 5 * 1024 * 1024);
        assert_eq!(config.quality_threshold, 15);
    }

    #[test]
    fn inverted_ceilings_are_rejected() {
        let mut config = PipelineConfig::default();
        config.limits.sync_byte_ceiling = config.limits.async_byte_ceiling;
        assert!(matches!(
            config.validate(),
            Err(ScanrelayError::InvalidConfig(_))
        ));
    }

    #[test]
    fn inverted_conversion_window_is_rejected() {
        let mut config = PipelineConfig::default();
        config.limits.min_bytes_for_conversion = config.limits.max_bytes_for_conversion + 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn profile_membership() {
        let config = PipelineConfig::default();
        assert!(config.is_convertible("bank_statement"));
        assert!(config.is_structured("bank_statement"));
        assert!(config.is_convertible("passport"));
        assert!(!config.is_structured("passport"));
        assert!(!config.is_convertible("invoice"));
        assert!(!config.is_convertible("unknown"));
        assert!(!config.is_structured("unknown"));
    }

    #[test]
    fn unknown_type_gets_default_feature() {
        let config = PipelineConfig::default();
        assert_eq!(config.feature_tags_for(None), vec![FeatureTag::Forms]);
        assert_eq!(config.feature_tags_for(Some("mystery")), vec![FeatureTag::Forms]);
        assert_eq!(config.feature_tags_for(Some("passport")), vec![FeatureTag::Forms]);
        assert_eq!(
            config.feature_tags_for(Some("bank_statement")),
            vec![FeatureTag::Forms, FeatureTag::Tables]
        );
    }

    #[test]
    fn load_merges_partial_json_with_defaults() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(
            file,
            r#"{{ "quality_threshold": 10, "raster_dpi": 200,
                 "profiles": [{{ "doc_type": "receipt", "convertible_to_image": true }}] }}"#
        )
        .expect("write config");

        let config = PipelineConfig::load(file.path()).expect("load");
        assert_eq!(config.quality_threshold, 10);
        assert_eq!(config.raster_dpi, 200);
        assert_eq!(config.limits, SizeLimits::default());
        assert!(config.is_convertible("receipt"));
        assert!(!config.is_structured("receipt"));
    }

    #[test]
    fn load_rejects_invalid_limits() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(
            file,
            r#"{{ "limits": {{ "sync_byte_ceiling": 10, "async_byte_ceiling": 5,
                 "min_bytes_for_conversion": 1, "max_bytes_for_conversion": 2 }} }}"#
        )
        .expect("write config");

        assert!(matches!(
            PipelineConfig::load(file.path()),
            Err(ScanrelayError::InvalidConfig(_))
        ));
    }

    #[test]
    fn env_overrides_fill_endpoint_and_key() {
        let mut config = PipelineConfig::default();
        config.apply_overrides(|key| match key {
            "SCANRELAY_OCR_ENDPOINT" => Some("https://ocr.example".into()),
            "SCANRELAY_OCR_API_KEY" => Some(String::new()),
            _ => None,
        });
        assert_eq!(config.ocr_endpoint.as_deref(), Some("https://ocr.example"));
        assert_eq!(config.ocr_api_key, None);
    }

    #[test]
    fn api_key_is_not_serialised() {
        let config = PipelineConfig {
            ocr_api_key: Some("secret".into()),
            ..Default::default()
        };
        let json = serde_json::to_string(&config).expect("serialise");
        assert!(!json.contains("secret"));
    }

    #[test]
    fn partial_limits_keep_remaining_defaults() {
        let config: PipelineConfig =
            serde_json::from_str(r#"{ "limits": { "sync_byte_ceiling": 1 } }"#).expect("parse");
        assert_eq!(config.limits.sync_byte_ceiling, 1);
        assert_eq!(config.limits.async_byte_ceiling, SizeLimits::default().async_byte_ceiling);
        assert_eq!(
            config.limits.max_bytes_for_conversion,
            SizeLimits::default().max_bytes_for_conversion
        );
        assert!(config.validate().is_ok());
    }
}
