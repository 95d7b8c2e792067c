// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// codepress-engine: runs generation and export off the control surface.
//
// Synchronous runners do the work; `worker` moves them onto Tokio's blocking
// pool and hands back an event channel plus a cancel flag.

pub mod cancel;
pub mod codes;
pub mod events;
pub mod export;
pub mod preview;
pub mod runner;
pub mod temp;
pub mod worker;

pub use cancel::CancelFlag;
pub use codes::{CodeFactory, RenderedItem};
pub use events::{BatchEvent, ExportEvent};
pub use export::{
    ExportCoordinator, ExportFailure, ExportJob, ExportStatus, ExportSummary, FailureReport,
};
pub use preview::render_preview;
pub use runner::{BatchRunner, BatchSummary, sized_for_layout};
pub use temp::TempPageStore;
pub use worker::{WorkerHandle, spawn_export, spawn_generation};
