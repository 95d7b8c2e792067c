// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Codepress: batch QR code and barcode raster synthesis with page composition.
//
// Entry point. Initialises logging, loads configuration, and drives the
// engine's workers from the command line. Ctrl-C cancels the running batch.

mod cli;

use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use codepress_bridge::codec_bridge;
use codepress_core::error::{CodepressError, Result};
use codepress_core::human_errors::humanize_error;
use codepress_core::{AppConfig, ExportFormat};
use codepress_document::ImageProcessor;
use codepress_engine::export::item_file_name;
use codepress_engine::{
    BatchEvent, BatchRunner, CancelFlag, ExportEvent, ExportJob, ExportStatus, WorkerHandle,
    render_preview, spawn_export, spawn_generation,
};
use tracing::{error, info, warn};

use cli::{Cli, Command};

const EXIT_CANCELLED: u8 = 130;

/// How a command ended, mapped onto the process exit code.
enum Outcome {
    Done,
    Cancelled,
    /// Already reported to the user.
    Failed,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    info!("Codepress starting");

    match run(cli).await {
        Ok(Outcome::Done) => ExitCode::SUCCESS,
        Ok(Outcome::Cancelled) => ExitCode::from(EXIT_CANCELLED),
        Ok(Outcome::Failed) => ExitCode::FAILURE,
        Err(e) => {
            report(&e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<Outcome> {
    let mut config = AppConfig::load(&cli.config)?;
    let cancel = CancelFlag::new();
    watch_ctrl_c(cancel.clone());

    match cli.command {
        Command::Generate {
            input,
            render,
            save_dir,
        } => {
            render.apply(&mut config)?;
            let items = input.read_items()?;
            generate(config, items, save_dir.as_deref(), cancel).await
        }
        Command::Export {
            input,
            render,
            layout,
            format,
            output,
            split,
        } => {
            render.apply(&mut config)?;
            layout.apply(&mut config);
            let job = ExportJob::new(
                input.read_items()?,
                config.render.clone(),
                config.layout.clone(),
                format.into(),
                output,
                split,
            )?;
            export(config, job, cancel).await
        }
        Command::Preview {
            input,
            render,
            layout,
            output,
            width,
            height,
        } => {
            render.apply(&mut config)?;
            layout.apply(&mut config);
            let items = input.read_items()?;
            preview(config, items, &output, (width, height), cancel).await
        }
    }
}

/// First Ctrl-C raises the cancel flag; the worker stops at its next check.
fn watch_ctrl_c(cancel: CancelFlag) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, cancelling");
            cancel.cancel();
        }
    });
}

// -- Commands -------------------------------------------------------------------

async fn generate(
    config: AppConfig,
    items: Vec<String>,
    save_dir: Option<&Path>,
    cancel: CancelFlag,
) -> Result<Outcome> {
    if let Some(dir) = save_dir {
        std::fs::create_dir_all(dir)
            .map_err(|e| CodepressError::file_io("create output directory", dir, e))?;
    }

    let mut handle: WorkerHandle<BatchEvent> = spawn_generation(
        codec_bridge(&config.font),
        config.engine,
        items,
        config.render,
        cancel,
    );

    let outcome = drain_generation(&mut handle, save_dir).await;
    handle.join().await?;
    outcome
}

/// Consume generation events, saving displayed codes into `save_dir`.
///
/// A failed save cancels the worker before the error is returned.
async fn drain_generation(
    handle: &mut WorkerHandle<BatchEvent>,
    save_dir: Option<&Path>,
) -> Result<Outcome> {
    let mut outcome = Ok(Outcome::Done);
    while let Some(event) = handle.next_event().await {
        match event {
            BatchEvent::ItemCompleted {
                index,
                label,
                placeholder,
                image,
            } => {
                if placeholder {
                    warn!(index, %label, "item rendered as placeholder");
                }
                if let (Some(dir), Some(image)) = (save_dir, image) {
                    let path = dir.join(item_file_name(index, &label, "png"));
                    let saved = ImageProcessor::from_rgba(image.image).save(&path, ExportFormat::Png);
                    if let Err(e) = saved {
                        handle.cancel();
                        return Err(e);
                    }
                }
            }
            BatchEvent::Progress { done, total } => info!(done, total, "progress"),
            BatchEvent::Finished {
                completed,
                cancelled,
            } => {
                info!(completed, cancelled, "generation finished");
                if cancelled {
                    outcome = Ok(Outcome::Cancelled);
                }
            }
            BatchEvent::Failed(e) => outcome = Err(e),
        }
    }
    outcome
}

async fn export(config: AppConfig, job: ExportJob, cancel: CancelFlag) -> Result<Outcome> {
    let mut handle: WorkerHandle<ExportEvent> =
        spawn_export(codec_bridge(&config.font), config.engine, job, cancel);

    let mut status = ExportStatus::Idle;
    while let Some(event) = handle.next_event().await {
        match event {
            ExportEvent::Status(text) => info!("{text}"),
            ExportEvent::Progress { done, total } => info!(done, total, "progress"),
            ExportEvent::Message(text) => info!("{text}"),
            ExportEvent::Warning(text) => warn!("{text}"),
            ExportEvent::Finished(finished) => status = finished,
        }
    }
    handle.join().await?;

    match status {
        ExportStatus::Completed(summary) => {
            for artifact in &summary.artifacts {
                println!("{}", artifact.display());
            }
            info!(
                items = summary.items_exported,
                pages = summary.pages_written,
                dropped = summary.dropped_items,
                placeholders = summary.placeholders,
                elapsed_ms = (summary.finished_at - summary.started_at).num_milliseconds(),
                "export complete"
            );
            Ok(Outcome::Done)
        }
        ExportStatus::Cancelled => Ok(Outcome::Cancelled),
        ExportStatus::Failed(failure) => {
            let report = failure.report();
            error!(detail = %report.detail, "export failed");
            eprintln!("{}", report.human.message);
            eprintln!("  {}", report.human.suggestion);
            Ok(Outcome::Failed)
        }
        ExportStatus::Idle | ExportStatus::Running => Err(CodepressError::Worker(
            "export worker stopped without a result".into(),
        )),
    }
}

async fn preview(
    config: AppConfig,
    items: Vec<String>,
    output: &Path,
    viewport: (u32, u32),
    cancel: CancelFlag,
) -> Result<Outcome> {
    let output = output.to_path_buf();
    let task = tokio::task::spawn_blocking(move || -> Result<Outcome> {
        let runner = BatchRunner::with_codecs(codec_bridge(&config.font), config.engine, cancel);
        let page = render_preview(&runner, &items, &config.render, &config.layout, viewport)?;
        match page {
            Some(page) => {
                ImageProcessor::from_rgb(page).save(&output, ExportFormat::Png)?;
                println!("{}", output.display());
                Ok(Outcome::Done)
            }
            None if runner.cancel_flag().is_cancelled() => Ok(Outcome::Cancelled),
            None => {
                warn!("nothing to preview");
                Ok(Outcome::Done)
            }
        }
    });
    task.await
        .map_err(|e| CodepressError::Worker(format!("preview did not finish cleanly: {e}")))?
}

/// Print an error the way a person would want to read it.
fn report(err: &CodepressError) {
    error!(error = %err, "command failed");
    let human = humanize_error(err);
    eprintln!("{}", human.message);
    eprintln!("  {}", human.suggestion);
}

#[cfg(test)]
mod tests {
    use super::*;
    use codepress_core::{EngineConfig, FontConfig, RenderOptions};

    #[tokio::test]
    async fn failed_save_cancels_generation() {
        // A regular file cannot hold the saved codes.
        let blocker = tempfile::NamedTempFile::new().unwrap();
        let cancel = CancelFlag::new();
        let items = (0..200).map(|i| format!("item{i}")).collect();
        let mut handle = spawn_generation(
            codec_bridge(&FontConfig::default()),
            EngineConfig::default(),
            items,
            RenderOptions::default(),
            cancel.clone(),
        );

        let outcome = drain_generation(&mut handle, Some(blocker.path())).await;
        assert!(outcome.is_err());
        assert!(cancel.is_cancelled());
        handle.join().await.unwrap();
    }

    #[tokio::test]
    async fn generation_without_save_dir_completes() {
        let mut handle = spawn_generation(
            codec_bridge(&FontConfig::default()),
            EngineConfig::default(),
            vec!["a".into(), "b".into()],
            RenderOptions::default(),
            CancelFlag::new(),
        );
        let outcome = drain_generation(&mut handle, None).await;
        assert!(matches!(outcome, Ok(Outcome::Done)));
        handle.join().await.unwrap();
    }
}
