// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Export coordinator: drive a batch through page composition into segmented
// PDFs, a single page image, or one file per item.
//
// Memory stays bounded by re-rendering items on the export pass instead of
// keeping them, spilling each finished page to a temp PNG, and decoding pages
// back only for the segment being assembled.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use codepress_core::error::{CodepressError, Result};
use codepress_core::human_errors::{HumanError, humanize_error};
use codepress_core::{EngineConfig, ExportFormat, JobId, LayoutConfig, RenderOptions};
use codepress_document::{ImageProcessor, PageCompositor, PdfWriter, Placement};
use image::RgbImage;
use tracing::{error, info, instrument, warn};

use crate::events::ExportEvent;
use crate::runner::{BatchRunner, BatchSummary, sized_for_layout};
use crate::temp::TempPageStore;

/// Stem of the single composed page in raster export.
pub const BATCH_PAGE_STEM: &str = "batch_codes";

/// Label characters kept in per-item file names.
const MAX_NAME_CHARS: usize = 50;

// ---------------------------------------------------------------------------
// Job
// ---------------------------------------------------------------------------

/// Everything one export needs, validated once up front.
#[derive(Debug, Clone)]
pub struct ExportJob {
    pub id: JobId,
    pub items: Vec<String>,
    pub options: RenderOptions,
    pub layout: LayoutConfig,
    pub format: ExportFormat,
    /// PDF: the requested document path; segments are written beside it.
    /// PNG/JPG: the output directory.
    pub output_path: PathBuf,
    /// PNG/JPG only: when the items overflow one page, write one file per
    /// item instead of a single page with the overflow dropped.
    pub split_oversize: bool,
}

impl ExportJob {
    pub fn new(
        items: Vec<String>,
        options: RenderOptions,
        layout: LayoutConfig,
        format: ExportFormat,
        output_path: impl Into<PathBuf>,
        split_oversize: bool,
    ) -> Result<Self> {
        if items.is_empty() {
            return Err(CodepressError::InvalidOptions("nothing to export".into()));
        }
        options.validate()?;
        layout.validate()?;
        Ok(Self {
            id: JobId::new(),
            items,
            options,
            layout,
            format,
            output_path: output_path.into(),
            split_oversize,
        })
    }
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// What a finished export produced.
#[derive(Debug, Clone)]
pub struct ExportSummary {
    pub artifacts: Vec<PathBuf>,
    pub items_exported: usize,
    pub pages_written: usize,
    /// Items left off a single raster page.
    pub dropped_items: usize,
    pub placeholders: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Technical detail plus its plain-language rendering.
#[derive(Debug, Clone)]
pub struct FailureReport {
    pub detail: String,
    pub human: HumanError,
}

impl FailureReport {
    pub fn from_error(err: &CodepressError) -> Self {
        Self {
            detail: err.to_string(),
            human: humanize_error(err),
        }
    }
}

#[derive(Debug, Clone)]
pub enum ExportFailure {
    /// A canvas allocation was refused or exceeded the configured budget.
    OutOfMemory(FailureReport),
    Other(FailureReport),
}

impl ExportFailure {
    pub fn from_error(err: &CodepressError) -> Self {
        let report = FailureReport::from_error(err);
        if err.is_resource_exhausted() {
            Self::OutOfMemory(report)
        } else {
            Self::Other(report)
        }
    }

    pub fn report(&self) -> &FailureReport {
        match self {
            Self::OutOfMemory(r) | Self::Other(r) => r,
        }
    }
}

/// `Idle -> Running -> {Completed, Cancelled, Failed}`.
#[derive(Debug, Clone)]
pub enum ExportStatus {
    Idle,
    Running,
    Completed(ExportSummary),
    Cancelled,
    Failed(ExportFailure),
}

impl ExportStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Completed(_) => "completed",
            Self::Cancelled => "cancelled",
            Self::Failed(ExportFailure::OutOfMemory(_)) => "failed (out of memory)",
            Self::Failed(ExportFailure::Other(_)) => "failed",
        }
    }
}

// ---------------------------------------------------------------------------
// Coordinator
// ---------------------------------------------------------------------------

/// Runs export jobs one at a time.
pub struct ExportCoordinator {
    runner: BatchRunner,
    status: ExportStatus,
}

impl ExportCoordinator {
    pub fn new(runner: BatchRunner) -> Self {
        Self {
            runner,
            status: ExportStatus::Idle,
        }
    }

    pub fn status(&self) -> &ExportStatus {
        &self.status
    }

    pub fn runner(&self) -> &BatchRunner {
        &self.runner
    }

    /// Run `job` to a terminal status, emitting `Finished` last.
    ///
    /// Temp pages are gone when this returns, whatever the outcome.
    #[instrument(skip_all, fields(job_id = %job.id, items = job.items.len(), format = ?job.format))]
    pub fn export(&mut self, job: &ExportJob, emit: &mut dyn FnMut(ExportEvent)) -> ExportStatus {
        self.status = ExportStatus::Running;
        info!(status = self.status.label(), "export started");
        emit(ExportEvent::Status(format!(
            "Exporting {} items as {}",
            job.items.len(),
            job.format.extension().to_uppercase()
        )));

        let started_at = Utc::now();
        let status = match self.run_job(job, started_at, emit) {
            Ok(Some(summary)) => {
                info!(
                    artifacts = summary.artifacts.len(),
                    pages = summary.pages_written,
                    items = summary.items_exported,
                    "export completed"
                );
                ExportStatus::Completed(summary)
            }
            Ok(None) => {
                info!("export cancelled");
                ExportStatus::Cancelled
            }
            Err(e) => {
                error!(error = %e, "export failed");
                ExportStatus::Failed(ExportFailure::from_error(&e))
            }
        };

        self.status = status.clone();
        emit(ExportEvent::Finished(status.clone()));
        status
    }

    /// `Ok(None)` means the run was cancelled.
    fn run_job(
        &self,
        job: &ExportJob,
        started_at: DateTime<Utc>,
        emit: &mut dyn FnMut(ExportEvent),
    ) -> Result<Option<ExportSummary>> {
        let engine = self.runner.engine();
        engine.validate()?;

        let total = job.items.len();
        if total > engine.large_batch_warning {
            let mb = total as f64 * EngineConfig::ESTIMATED_MB_PER_ITEM;
            warn!(items = total, estimated_mb = mb, "large batch");
            emit(ExportEvent::Warning(format!(
                "{total} items is a large batch (roughly {mb:.0} MB of intermediate images); export will take a while"
            )));
        }

        let options = sized_for_layout(&job.options, &job.layout);

        emit(ExportEvent::Status("Measuring code size".into()));
        let Some(cell) = self.runner.measure_cell(&job.items, &options)? else {
            return Ok(None);
        };

        let compositor = PageCompositor::new(
            &job.layout,
            cell,
            self.runner.factory().text().clone(),
            engine.limits.clone(),
        );

        match job.format {
            ExportFormat::Pdf => self.export_pdf(job, &options, compositor, started_at, emit),
            ExportFormat::Png | ExportFormat::Jpg => {
                self.export_raster(job, &options, compositor, started_at, emit)
            }
        }
    }

    /// Place every item, handing each filled page to `on_page`. The last,
    /// partly filled page is handed over too unless the run was cancelled.
    fn compose_all(
        &self,
        items: &[String],
        options: &RenderOptions,
        compositor: &mut PageCompositor,
        mut on_page: impl FnMut(RgbImage, &mut dyn FnMut(ExportEvent)) -> Result<()>,
        emit: &mut dyn FnMut(ExportEvent),
    ) -> Result<BatchSummary> {
        let total = items.len();
        let summary = self.runner.for_each_item(items, options, |index, item| {
            let code = item.image;
            if compositor.place(&code.image, &code.label)? == Placement::PageFull {
                if let Some(page) = compositor.flush_page() {
                    on_page(page, &mut *emit)?;
                }
                compositor.place(&code.image, &code.label)?;
            }
            emit(ExportEvent::Progress {
                done: index + 1,
                total,
            });
            Ok(())
        })?;

        if !summary.cancelled {
            if let Some(page) = compositor.flush_page() {
                on_page(page, emit)?;
            }
        }
        Ok(summary)
    }

    fn export_pdf(
        &self,
        job: &ExportJob,
        options: &RenderOptions,
        mut compositor: PageCompositor,
        started_at: DateTime<Utc>,
        emit: &mut dyn FnMut(ExportEvent),
    ) -> Result<Option<ExportSummary>> {
        let (dir, stem) = pdf_target(&job.output_path);
        std::fs::create_dir_all(&dir)
            .map_err(|e| CodepressError::file_io("create output directory", &dir, e))?;

        let writer = PdfWriter::new(job.layout.page_size).with_title(stem.clone());
        let mut segments = PdfSegments::new(writer, dir, stem, self.runner.engine().segment_pages);

        let summary = self.compose_all(
            &job.items,
            options,
            &mut compositor,
            |page, emit| segments.push_page(page, emit),
            emit,
        )?;
        if summary.cancelled {
            return Ok(None);
        }
        segments.flush_segment(emit)?;

        let pages_written = segments.pages;
        let artifacts = std::mem::take(&mut segments.artifacts);
        emit(ExportEvent::Message(format!(
            "Exported {} codes on {pages_written} pages into {} PDF file(s)",
            summary.completed,
            artifacts.len()
        )));
        Ok(Some(ExportSummary {
            artifacts,
            items_exported: summary.completed,
            pages_written,
            dropped_items: 0,
            placeholders: summary.placeholders,
            started_at,
            finished_at: Utc::now(),
        }))
    }

    fn export_raster(
        &self,
        job: &ExportJob,
        options: &RenderOptions,
        mut compositor: PageCompositor,
        started_at: DateTime<Utc>,
        emit: &mut dyn FnMut(ExportEvent),
    ) -> Result<Option<ExportSummary>> {
        let dir = job.output_path.as_path();
        std::fs::create_dir_all(dir)
            .map_err(|e| CodepressError::file_io("create output directory", dir, e))?;

        let total = job.items.len();
        let capacity = compositor.capacity();
        let ext = job.format.extension();

        if total > capacity && job.split_oversize {
            emit(ExportEvent::Status(format!(
                "{total} codes exceed one page ({capacity}); saving separate files"
            )));
            let mut artifacts = Vec::with_capacity(total);
            let summary = self.runner.for_each_item(&job.items, options, |index, item| {
                let path = dir.join(item_file_name(index, &item.image.label, ext));
                ImageProcessor::from_rgba(item.image.image).save(&path, job.format)?;
                artifacts.push(path);
                emit(ExportEvent::Progress {
                    done: index + 1,
                    total,
                });
                Ok(())
            })?;
            if summary.cancelled {
                return Ok(None);
            }
            emit(ExportEvent::Message(format!(
                "Exported {} codes to {}",
                summary.completed,
                dir.display()
            )));
            return Ok(Some(ExportSummary {
                artifacts,
                items_exported: summary.completed,
                pages_written: 0,
                dropped_items: 0,
                placeholders: summary.placeholders,
                started_at,
                finished_at: Utc::now(),
            }));
        }

        let kept = total.min(capacity);
        let dropped = total - kept;
        if dropped > 0 {
            warn!(capacity, dropped, "items do not fit on one page");
            emit(ExportEvent::Warning(format!(
                "Only {kept} of {total} codes fit on one page; {dropped} were left out"
            )));
        }

        let mut first_page: Option<RgbImage> = None;
        let summary = self.compose_all(
            &job.items[..kept],
            options,
            &mut compositor,
            |page, _| {
                if first_page.is_none() {
                    first_page = Some(page);
                }
                Ok(())
            },
            emit,
        )?;
        if summary.cancelled {
            return Ok(None);
        }
        let Some(page) = first_page else {
            return Err(CodepressError::Image("no page was composed".into()));
        };

        let path = dir.join(format!("{BATCH_PAGE_STEM}.{ext}"));
        ImageProcessor::from_rgb(page).save(&path, job.format)?;
        emit(ExportEvent::Message(format!(
            "Exported {} codes to {}",
            summary.completed,
            path.display()
        )));
        Ok(Some(ExportSummary {
            artifacts: vec![path],
            items_exported: summary.completed,
            pages_written: 1,
            dropped_items: dropped,
            placeholders: summary.placeholders,
            started_at,
            finished_at: Utc::now(),
        }))
    }
}

// ---------------------------------------------------------------------------
// PDF segments
// ---------------------------------------------------------------------------

/// Pages spilled to disk and grouped into `<stem>_<n>.pdf` documents.
struct PdfSegments {
    writer: PdfWriter,
    dir: PathBuf,
    stem: String,
    per_segment: usize,
    temp: TempPageStore,
    /// Temp pages not yet in a segment, in page order.
    pending: Vec<PathBuf>,
    pages: usize,
    artifacts: Vec<PathBuf>,
}

impl PdfSegments {
    fn new(writer: PdfWriter, dir: PathBuf, stem: String, per_segment: usize) -> Self {
        let temp = TempPageStore::new(dir.clone(), stem.clone());
        Self {
            writer,
            dir,
            stem,
            per_segment: per_segment.max(1),
            temp,
            pending: Vec::new(),
            pages: 0,
            artifacts: Vec::new(),
        }
    }

    fn push_page(&mut self, page: RgbImage, emit: &mut dyn FnMut(ExportEvent)) -> Result<()> {
        self.pages += 1;
        let path = self.temp.write_page(self.pages, page)?;
        self.pending.push(path);
        emit(ExportEvent::Status(format!("Page {} composed", self.pages)));
        if self.pending.len() >= self.per_segment {
            self.flush_segment(emit)?;
        }
        Ok(())
    }

    /// Assemble the pending pages into the next numbered document.
    fn flush_segment(&mut self, emit: &mut dyn FnMut(ExportEvent)) -> Result<()> {
        if self.pending.is_empty() {
            return Ok(());
        }
        let ordinal = self.artifacts.len() + 1;
        let path = self.dir.join(format!("{}_{ordinal}.pdf", self.stem));
        emit(ExportEvent::Status(format!("Writing {}", path.display())));

        let mut assembly = self.writer.begin();
        for page_path in &self.pending {
            assembly.add_page(ImageProcessor::open(page_path)?.into_rgb());
        }
        let count = assembly.finish_to_file(&path)?;

        for page_path in std::mem::take(&mut self.pending) {
            self.temp.remove(&page_path);
        }
        info!(segment = ordinal, pages = count, path = %path.display(), "PDF segment written");
        emit(ExportEvent::Message(format!("Wrote {} ({count} pages)", path.display())));
        self.artifacts.push(path);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Naming
// ---------------------------------------------------------------------------

/// Directory and stem for a requested PDF path.
fn pdf_target(path: &Path) -> (PathBuf, String) {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
        .to_path_buf();
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or(BATCH_PAGE_STEM)
        .to_string();
    (dir, stem)
}

/// `code_<n>_<label>.<ext>`, with the label cut to 50 characters and
/// anything outside `[A-Za-z0-9_-]` replaced by `_`.
pub fn item_file_name(index: usize, label: &str, ext: &str) -> String {
    let safe: String = label
        .chars()
        .take(MAX_NAME_CHARS)
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("code_{}_{safe}.{ext}", index + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use codepress_bridge::codec_bridge;
    use codepress_core::{
        Arrangement, FontConfig, PageSize, QrOptions, ResourceLimits,
    };
    use codepress_document::PdfReader;

    use crate::cancel::CancelFlag;

    fn coordinator(engine: EngineConfig) -> ExportCoordinator {
        ExportCoordinator::new(BatchRunner::with_codecs(
            codec_bridge(&FontConfig::default()),
            engine,
            CancelFlag::new(),
        ))
    }

    fn items(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("item-{i}")).collect()
    }

    /// A5 pages holding `per_page` codes each, stacked vertically.
    fn stacked(per_page: u32) -> LayoutConfig {
        LayoutConfig {
            page_size: PageSize::A5,
            arrangement: Arrangement::Vertical,
            vertical_per_page: per_page,
            ..LayoutConfig::default()
        }
    }

    fn qr() -> RenderOptions {
        RenderOptions::Qr(QrOptions::default())
    }

    fn dir_names(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn job_validation_happens_up_front() {
        assert!(ExportJob::new(vec![], qr(), LayoutConfig::default(), ExportFormat::Pdf, "x.pdf", false).is_err());
        let bad_layout = LayoutConfig {
            columns: 0,
            ..LayoutConfig::default()
        };
        assert!(ExportJob::new(items(1), qr(), bad_layout, ExportFormat::Pdf, "x.pdf", false).is_err());
    }

    #[test]
    fn small_batch_is_one_single_page_segment() {
        let dir = tempfile::tempdir().unwrap();
        let job = ExportJob::new(
            items(3),
            qr(),
            LayoutConfig::default(),
            ExportFormat::Pdf,
            dir.path().join("labels.pdf"),
            false,
        )
        .unwrap();
        let mut events = Vec::new();
        let status = coordinator(EngineConfig::default()).export(&job, &mut |e| events.push(e));

        let ExportStatus::Completed(summary) = status else {
            panic!("export did not complete");
        };
        assert_eq!(summary.pages_written, 1);
        assert_eq!(summary.items_exported, 3);
        assert_eq!(dir_names(dir.path()), vec!["labels_1.pdf".to_string()]);
        assert_eq!(PdfReader::open(&summary.artifacts[0]).unwrap().page_count(), 1);
        assert!(matches!(events.last(), Some(ExportEvent::Finished(ExportStatus::Completed(_)))));
    }

    #[test]
    fn pages_are_split_into_numbered_segments() {
        let dir = tempfile::tempdir().unwrap();
        let job = ExportJob::new(
            items(3),
            qr(),
            stacked(1),
            ExportFormat::Pdf,
            dir.path().join("out.pdf"),
            false,
        )
        .unwrap();
        let engine = EngineConfig {
            segment_pages: 2,
            ..EngineConfig::default()
        };
        let status = coordinator(engine).export(&job, &mut |_| {});
        let ExportStatus::Completed(summary) = status else {
            panic!("export did not complete");
        };
        assert_eq!(summary.pages_written, 3);
        assert_eq!(dir_names(dir.path()), vec!["out_1.pdf".to_string(), "out_2.pdf".to_string()]);
        assert_eq!(PdfReader::open(dir.path().join("out_1.pdf")).unwrap().page_count(), 2);
        assert_eq!(PdfReader::open(dir.path().join("out_2.pdf")).unwrap().page_count(), 1);
    }

    #[test]
    fn cancelled_export_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let job = ExportJob::new(
            items(6),
            qr(),
            stacked(1),
            ExportFormat::Pdf,
            dir.path().join("big.pdf"),
            false,
        )
        .unwrap();
        let mut coordinator = coordinator(EngineConfig::default());
        let flag = coordinator.runner().cancel_flag().clone();
        let mut saw_temp = false;
        let status = coordinator.export(&job, &mut |e| {
            if let ExportEvent::Progress { done: 3, .. } = e {
                saw_temp = dir_names(dir.path()).iter().any(|n| n.contains(".temp_"));
                flag.cancel();
            }
        });
        assert!(saw_temp, "pages should have been spilled before cancelling");
        assert!(matches!(status, ExportStatus::Cancelled));
        assert!(matches!(coordinator.status(), ExportStatus::Cancelled));
        assert!(dir_names(dir.path()).is_empty());
    }

    #[test]
    fn oversize_raster_batch_writes_one_file_per_item() {
        let dir = tempfile::tempdir().unwrap();
        let list = vec!["a/b c".to_string(), "plain".to_string(), "x".to_string()];
        let job = ExportJob::new(list, qr(), stacked(2), ExportFormat::Png, dir.path(), true).unwrap();
        let status = coordinator(EngineConfig::default()).export(&job, &mut |_| {});
        assert!(matches!(status, ExportStatus::Completed(_)));
        assert_eq!(
            dir_names(dir.path()),
            vec!["code_1_a_b_c.png", "code_2_plain.png", "code_3_x.png"]
        );
    }

    #[test]
    fn oversize_raster_batch_can_drop_to_one_page() {
        let dir = tempfile::tempdir().unwrap();
        let job = ExportJob::new(items(5), qr(), stacked(2), ExportFormat::Jpg, dir.path(), false).unwrap();
        let mut warned = false;
        let status = coordinator(EngineConfig::default()).export(&job, &mut |e| {
            if matches!(e, ExportEvent::Warning(_)) {
                warned = true;
            }
        });
        let ExportStatus::Completed(summary) = status else {
            panic!("export did not complete");
        };
        assert!(warned);
        assert_eq!(summary.items_exported, 2);
        assert_eq!(summary.dropped_items, 3);
        assert_eq!(dir_names(dir.path()), vec!["batch_codes.jpg"]);
        let page = ImageProcessor::open(&dir.path().join("batch_codes.jpg")).unwrap();
        assert_eq!((page.width(), page.height()), PageSize::A5.pixels());
    }

    #[test]
    fn exhausted_budget_is_reported_as_out_of_memory() {
        let dir = tempfile::tempdir().unwrap();
        let job = ExportJob::new(
            items(2),
            qr(),
            LayoutConfig::default(),
            ExportFormat::Pdf,
            dir.path().join("oom.pdf"),
            false,
        )
        .unwrap();
        let engine = EngineConfig {
            limits: ResourceLimits {
                max_canvas_bytes: 1024,
            },
            ..EngineConfig::default()
        };
        let status = coordinator(engine).export(&job, &mut |_| {});
        assert!(matches!(status, ExportStatus::Failed(ExportFailure::OutOfMemory(_))));
        assert!(dir_names(dir.path()).is_empty());
    }

    #[test]
    fn file_names_are_sanitised_and_truncated() {
        assert_eq!(item_file_name(0, "ab:cd?", "png"), "code_1_ab_cd_.png");
        let long = "z".repeat(80);
        assert_eq!(item_file_name(9, &long, "jpg"), format!("code_10_{}.jpg", "z".repeat(50)));
        assert_eq!(pdf_target(Path::new("out.pdf")), (PathBuf::from("."), "out".to_string()));
    }
}
