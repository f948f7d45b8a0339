// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Capability probe — optional tooling is detected once at startup, and the
// conversion chain and optimiser are built from what is actually present.

use std::process::Stdio;

use scanrelay_core::PipelineConfig;
use tokio::process::Command;
use tracing::{info, warn};

use super::{ConversionChain, ConversionStrategy, DegradedStrategy, RasterStrategy};
use crate::image::optimizer::ImageOptimizer;

/// Converters and optimisers available in this environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilityRegistry {
    /// Page rasteriser executable, if it could be launched.
    pub rasterizer: Option<String>,
    /// Whether image optimisation is enabled.
    pub optimizer: bool,
}

impl CapabilityRegistry {
    /// Probe the environment according to `config`.
    pub async fn probe(config: &PipelineConfig) -> Self {
        let rasterizer = if binary_runs(&config.rasterizer_bin).await {
            info!(binary = %config.rasterizer_bin, "page rasteriser available");
            Some(config.rasterizer_bin.clone())
        } else {
            warn!(
                binary = %config.rasterizer_bin,
                "page rasteriser not found — PDFs will fall back to degraded conversion"
            );
            None
        };

        Self {
            rasterizer,
            optimizer: config.optimize_images,
        }
    }

    /// Build the ordered conversion chain: raster (if available), then degraded.
    pub fn conversion_chain(&self) -> ConversionChain {
        let mut strategies: Vec<Box<dyn ConversionStrategy>> = Vec::new();
        if let Some(binary) = &self.rasterizer {
            strategies.push(Box::new(RasterStrategy::new(binary.clone())));
        }
        strategies.push(Box::new(DegradedStrategy));
        ConversionChain::new(strategies)
    }

    pub fn image_optimizer(&self, config: &PipelineConfig) -> ImageOptimizer {
        if self.optimizer {
            ImageOptimizer::new(config.optimize_max_dimension, config.jpeg_quality)
        } else {
            ImageOptimizer::copy_only()
        }
    }
}

/// True if the binary can be spawned. `pdftoppm -v` exits non-zero on some
/// poppler versions, so only the spawn result counts.
async fn binary_runs(binary: &str) -> bool {
    Command::new(binary)
        .arg("-v")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .is_ok()
}
