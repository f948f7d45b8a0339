// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// End-to-end extraction pipeline.
//
// validate → decide → convert → select → optimise → dispatch, with every
// generated file tracked in a per-request context and removed afterwards.
// Only validation and empty OCR output end a request with an error; every
// conversion or optimisation failure degrades to the previous artifact.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use scanrelay_core::PipelineConfig;
use scanrelay_core::error::Result;
use scanrelay_core::types::{ExtractionResult, RequestId};
use scanrelay_document::{
    ArtifactTracker, CapabilityRegistry, ConversionChain, ConversionDecisionEngine,
    ConvertOptions, ImageOptimizer, ImageSelector, validate_document,
};
use tracing::{debug, info, instrument};

use crate::backend::OcrClients;
use crate::dispatcher::ExtractionDispatcher;

/// State owned by one extraction request.
///
/// Each request gets its own artifact set and work directory, so concurrent
/// requests never touch each other's files.
#[derive(Debug)]
pub struct RequestContext {
    id: RequestId,
    work_dir: PathBuf,
    artifacts: ArtifactTracker,
}

impl RequestContext {
    /// Work directory is `<work_root>/<source stem>_<short id>`.
    pub fn new(work_root: &Path, source: &Path) -> Self {
        let id = RequestId::new();
        let stem = source
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("document");
        let work_dir = work_root.join(format!("{stem}_{}", id.short()));
        Self {
            id,
            work_dir,
            artifacts: ArtifactTracker::new(),
        }
    }

    pub fn id(&self) -> &RequestId {
        &self.id
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    pub fn artifacts(&self) -> &ArtifactTracker {
        &self.artifacts
    }

    pub fn artifacts_mut(&mut self) -> &mut ArtifactTracker {
        &mut self.artifacts
    }

    /// Delete tracked artifacts, then the work directory if it is empty.
    pub async fn cleanup(&mut self) -> usize {
        let removed = self.artifacts.cleanup().await;
        // Fails harmlessly when the directory was never created or still
        // holds something we did not generate.
        if tokio::fs::remove_dir(&self.work_dir).await.is_ok() {
            debug!(dir = %self.work_dir.display(), "work directory removed");
        }
        removed
    }
}

/// The assembled pipeline. Read-only after construction, so one instance can
/// serve any number of concurrent requests.
pub struct Pipeline {
    config: Arc<PipelineConfig>,
    decision: ConversionDecisionEngine,
    chain: ConversionChain,
    selector: ImageSelector,
    optimizer: ImageOptimizer,
    dispatcher: ExtractionDispatcher,
}

impl Pipeline {
    pub fn new(
        config: Arc<PipelineConfig>,
        chain: ConversionChain,
        optimizer: ImageOptimizer,
        clients: OcrClients,
    ) -> Self {
        Self {
            decision: ConversionDecisionEngine::new(config.clone()),
            chain,
            selector: ImageSelector::new(),
            optimizer,
            dispatcher: ExtractionDispatcher::new(config.clone(), clients),
            config,
        }
    }

    /// Build from probed capabilities.
    pub fn from_registry(
        config: Arc<PipelineConfig>,
        registry: &CapabilityRegistry,
        clients: OcrClients,
    ) -> Self {
        let chain = registry.conversion_chain();
        let optimizer = registry.image_optimizer(&config);
        Self::new(config, chain, optimizer, clients)
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Extract text from `file_path`, cleaning up generated files whether or
    /// not extraction succeeds.
    pub async fn extract_text(&self, file_path: &Path, doc_type: Option<&str>) -> Result<ExtractionResult> {
        let mut ctx = RequestContext::new(&self.config.work_root, file_path);
        let result = self.run(&mut ctx, file_path, doc_type).await;
        ctx.cleanup().await;
        result
    }

    /// Run the pipeline inside a caller-owned context. Artifacts stay on
    /// disk until the caller invokes [`RequestContext::cleanup`].
    #[instrument(skip_all, fields(request = %ctx.id().short(), file = %file_path.display(), doc_type = ?doc_type))]
    pub async fn run(
        &self,
        ctx: &mut RequestContext,
        file_path: &Path,
        doc_type: Option<&str>,
    ) -> Result<ExtractionResult> {
        let bytes = tokio::fs::read(file_path).await?;
        validate_document(
            &bytes,
            self.config.min_document_bytes,
            self.config.limits.async_byte_ceiling,
        )?;

        let mut target = file_path.to_path_buf();

        if self.decision.should_convert(file_path, doc_type, &bytes) {
            // The buffer is re-read by the dispatcher from whichever file wins.
            drop(bytes);
            let options = ConvertOptions {
                dpi: self.config.raster_dpi,
                max_pages: self.config.max_raster_pages,
            };
            let work_dir = ctx.work_dir.clone();
            let candidates = self
                .chain
                .convert(file_path, &work_dir, &options, ctx.artifacts_mut())
                .await;

            let best = self.selector.select_best(&candidates, file_path).await;
            if best != file_path {
                target = self.optimizer.optimize(&best, ctx.artifacts_mut()).await;
            }
            info!(
                target = %target.display(),
                artifacts = ctx.artifacts().len(),
                "document prepared for extraction"
            );
        }

        self.dispatcher.extract(&target, doc_type).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_work_dir_is_namespaced_by_stem_and_id() {
        let ctx = RequestContext::new(Path::new("/tmp/scanrelay"), Path::new("/in/statement.pdf"));
        let name = ctx.work_dir().file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("statement_"));
        assert_eq!(name.len(), "statement_".len() + 8);
        assert!(ctx.artifacts().is_empty());
    }

    #[test]
    fn contexts_never_share_a_work_dir() {
        let a = RequestContext::new(Path::new("/w"), Path::new("a.pdf"));
        let b = RequestContext::new(Path::new("/w"), Path::new("a.pdf"));
        assert_ne!(a.work_dir(), b.work_dir());
    }

    #[tokio::test]
    async fn cleanup_removes_artifacts_and_empty_work_dir() {
        let root = tempfile::tempdir().expect("temp dir");
        let mut ctx = RequestContext::new(root.path(), Path::new("scan.pdf"));
        tokio::fs::create_dir_all(ctx.work_dir()).await.unwrap();
        let page = ctx.work_dir().join("scan_page-1.png");
        tokio::fs::write(&page, b"png").await.unwrap();
        ctx.artifacts_mut().record(&page);

        assert_eq!(ctx.cleanup().await, 1);
        assert!(!page.exists());
        assert!(!ctx.work_dir().exists());
    }

    #[tokio::test]
    async fn cleanup_without_work_dir_is_quiet() {
        let root = tempfile::tempdir().expect("temp dir");
        let mut ctx = RequestContext::new(root.path(), Path::new("scan.pdf"));
        assert_eq!(ctx.cleanup().await, 0);
    }
}
