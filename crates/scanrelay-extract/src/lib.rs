// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// scanrelay-extract — OCR dispatch and the document extraction pipeline.

pub mod backend;
pub mod dispatcher;
pub mod http_backend;
pub mod pipeline;
pub mod retry;

pub use backend::{OcrBackend, OcrClients};
pub use dispatcher::{AnalyzeMode, CallShape, ExtractionDispatcher};
pub use http_backend::HttpOcrBackend;
pub use pipeline::{Pipeline, RequestContext};
