// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scoped store for composed pages spilled to disk during PDF export.

use std::path::{Path, PathBuf};

use codepress_core::ExportFormat;
use codepress_core::error::Result;
use codepress_document::ImageProcessor;
use image::RgbImage;
use tracing::{debug, warn};

/// Temp page files for one export run.
///
/// Every file written through the store is removed when the store is
/// dropped, whichever way the run ends.
pub struct TempPageStore {
    dir: PathBuf,
    stem: String,
    files: Vec<PathBuf>,
}

impl TempPageStore {
    pub fn new(dir: impl Into<PathBuf>, stem: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            stem: stem.into(),
            files: Vec::new(),
        }
    }

    /// Hidden file name for page `page`: `.<stem>.temp_<page>.png`.
    pub fn path_for(&self, page: usize) -> PathBuf {
        self.dir.join(format!(".{}.temp_{page}.png", self.stem))
    }

    /// Files currently on disk.
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// Serialise `raster` as page `page` and release its pixels.
    pub fn write_page(&mut self, page: usize, raster: RgbImage) -> Result<PathBuf> {
        let path = self.path_for(page);
        // Track before writing so a half-written file is still cleaned up.
        self.files.push(path.clone());
        ImageProcessor::from_rgb(raster).save(&path, ExportFormat::Png)?;
        debug!(page, path = %path.display(), "page spilled to disk");
        Ok(path)
    }

    /// Delete one tracked file.
    pub fn remove(&mut self, path: &Path) {
        self.files.retain(|p| p != path);
        delete_quietly(path);
    }

    /// Delete every tracked file.
    pub fn remove_all(&mut self) {
        for path in self.files.drain(..) {
            delete_quietly(&path);
        }
    }
}

impl Drop for TempPageStore {
    fn drop(&mut self) {
        if !self.files.is_empty() {
            debug!(count = self.files.len(), "removing temp pages");
        }
        self.remove_all();
    }
}

fn delete_quietly(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), error = %e, "could not remove temp file"),
    }
}
