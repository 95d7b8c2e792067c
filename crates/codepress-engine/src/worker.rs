// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Background workers: one blocking task per operation, talking to the
// control surface only through an event channel and the cancel flag.

use codepress_bridge::Codecs;
use codepress_core::error::{CodepressError, Result};
use codepress_core::{EngineConfig, RenderOptions};
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::cancel::CancelFlag;
use crate::events::{BatchEvent, ExportEvent};
use crate::export::{ExportCoordinator, ExportJob};
use crate::runner::BatchRunner;

/// Control-surface end of a running worker.
pub struct WorkerHandle<E> {
    pub events: UnboundedReceiver<E>,
    pub cancel: CancelFlag,
    join: JoinHandle<()>,
}

impl<E> WorkerHandle<E> {
    /// Next event, or `None` once the worker has finished and the channel
    /// is drained.
    pub async fn next_event(&mut self) -> Option<E> {
        self.events.recv().await
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Wait for the worker thread to exit.
    pub async fn join(self) -> Result<()> {
        self.join
            .await
            .map_err(|e| CodepressError::Worker(format!("worker did not finish cleanly: {e}")))
    }
}

/// Render `items` on a blocking worker. Must be called inside a Tokio runtime.
pub fn spawn_generation(
    codecs: Codecs,
    engine: EngineConfig,
    items: Vec<String>,
    options: RenderOptions,
    cancel: CancelFlag,
) -> WorkerHandle<BatchEvent> {
    let (tx, rx) = mpsc::unbounded_channel();
    let runner = BatchRunner::with_codecs(codecs, engine, cancel.clone());

    let join = tokio::task::spawn_blocking(move || {
        info!(items = items.len(), "generation worker started");
        // A closed receiver only means nobody is listening any more.
        let mut emit = |event: BatchEvent| {
            let _ = tx.send(event);
        };
        if let Err(e) = runner.run(&items, &options, &mut emit) {
            error!(error = %e, "generation failed");
            let _ = tx.send(BatchEvent::Failed(e));
        }
    });

    WorkerHandle {
        events: rx,
        cancel,
        join,
    }
}

/// Run `job` on a blocking worker. Must be called inside a Tokio runtime.
pub fn spawn_export(
    codecs: Codecs,
    engine: EngineConfig,
    job: ExportJob,
    cancel: CancelFlag,
) -> WorkerHandle<ExportEvent> {
    let (tx, rx) = mpsc::unbounded_channel();
    let runner = BatchRunner::with_codecs(codecs, engine, cancel.clone());

    let join = tokio::task::spawn_blocking(move || {
        info!(job_id = %job.id, "export worker started");
        let mut coordinator = ExportCoordinator::new(runner);
        let status = coordinator.export(&job, &mut |event: ExportEvent| {
            let _ = tx.send(event);
        });
        info!(job_id = %job.id, status = status.label(), "export worker finished");
    });

    WorkerHandle {
        events: rx,
        cancel,
        join,
    }
}
