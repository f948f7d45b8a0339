// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF-to-image conversion chain.
//
// Strategies are tried strictly in order: page rasterisation first, then the
// degraded image-library path, then passthrough of the original PDF. A
// strategy failure is logged and absorbed; the chain itself never fails and
// never returns an empty list.

pub mod degraded;
pub mod raster;
pub mod registry;

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use scanrelay_core::error::Result;
use scanrelay_core::types::ConversionAttempt;
use tracing::{debug, info, instrument, warn};

use crate::artifacts::ArtifactTracker;

pub use degraded::DegradedStrategy;
pub use raster::RasterStrategy;
pub use registry::CapabilityRegistry;

/// Per-call conversion settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConvertOptions {
    /// Rasterisation resolution in dots per inch.
    pub dpi: u32,
    /// Pages beyond this are not rendered.
    pub max_pages: usize,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            dpi: 300,
            max_pages: 20,
        }
    }
}

/// One way of turning a PDF into page images.
///
/// Returns the generated paths, or an error when this strategy cannot
/// convert the document. An `Ok` with no paths counts as a failure too.
#[async_trait]
pub trait ConversionStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    async fn convert(
        &self,
        pdf_path: &Path,
        output_dir: &Path,
        options: &ConvertOptions,
    ) -> Result<Vec<PathBuf>>;
}

/// Ordered list of strategies with a passthrough fallback.
pub struct ConversionChain {
    strategies: Vec<Box<dyn ConversionStrategy>>,
}

impl ConversionChain {
    pub fn new(strategies: Vec<Box<dyn ConversionStrategy>>) -> Self {
        Self { strategies }
    }

    /// Names of the configured strategies, in order.
    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Run the chain. The result is never empty: when no strategy produces
    /// output, it is `[pdf_path]` unchanged.
    ///
    /// Generated files are recorded in `tracker` as soon as each strategy
    /// returns; the source PDF is never recorded.
    #[instrument(skip_all, fields(pdf = %pdf_path.display()))]
    pub async fn convert(
        &self,
        pdf_path: &Path,
        output_dir: &Path,
        options: &ConvertOptions,
        tracker: &mut ArtifactTracker,
    ) -> Vec<PathBuf> {
        if let Err(err) = tokio::fs::create_dir_all(output_dir).await {
            warn!(
                dir = %output_dir.display(),
                error = %err,
                "cannot create output directory — passing original through"
            );
            return vec![pdf_path.to_path_buf()];
        }

        let mut attempts: Vec<ConversionAttempt> = Vec::with_capacity(self.strategies.len());

        for strategy in &self.strategies {
            let name = strategy.name();
            debug!(strategy = name, "trying conversion strategy");

            let attempt = match strategy.convert(pdf_path, output_dir, options).await {
                Ok(paths) => {
                    let generated: Vec<PathBuf> =
                        paths.into_iter().filter(|p| p != pdf_path).collect();
                    for path in &generated {
                        tracker.record(path);
                    }
                    ConversionAttempt {
                        strategy_name: name,
                        succeeded: !generated.is_empty(),
                        output_paths: generated,
                    }
                }
                Err(err) => {
                    warn!(strategy = name, error = %err, "conversion strategy failed");
                    ConversionAttempt {
                        strategy_name: name,
                        output_paths: Vec::new(),
                        succeeded: false,
                    }
                }
            };

            if attempt.succeeded {
                info!(
                    strategy = name,
                    outputs = attempt.output_paths.len(),
                    failed_before = attempts.len(),
                    "conversion succeeded"
                );
                return attempt.output_paths;
            }

            debug!(strategy = name, "strategy produced no output");
            attempts.push(attempt);
        }

        let tried: Vec<&str> = attempts.iter().map(|a| a.strategy_name).collect();
        info!(
            ?tried,
            "no conversion strategy succeeded — passing original through"
        );
        vec![pdf_path.to_path_buf()]
    }
}
