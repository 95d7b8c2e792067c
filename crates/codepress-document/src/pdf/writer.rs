// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF writer: assemble composed page rasters into multi-page documents with
// `printpdf` 0.8.
//
// Pages are added one at a time to a `PdfAssembly`, so a caller streaming
// pages from disk holds at most one decoded raster outside the document.

use std::path::Path;

use codepress_core::PageSize;
use codepress_core::error::{CodepressError, Result};
use image::RgbImage;
use printpdf::{
    Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, Pt, RawImage, RawImageData,
    RawImageFormat, XObjectTransform,
};
use tracing::{debug, instrument, warn};

/// Creates PDF documents whose pages are full-page raster images.
pub struct PdfWriter {
    page_size: PageSize,
    title: Option<String>,
}

impl PdfWriter {
    pub fn new(page_size: PageSize) -> Self {
        Self {
            page_size,
            title: None,
        }
    }

    /// Set a title for the PDF metadata.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Start an empty document.
    pub fn begin(&self) -> PdfAssembly {
        let title = self.title.as_deref().unwrap_or("Codepress Export");
        let (w_mm, h_mm) = self.page_size.dimensions_mm();
        PdfAssembly {
            doc: PdfDocument::new(title),
            pages: Vec::new(),
            page_w: Mm(w_mm),
            page_h: Mm(h_mm),
        }
    }
}

/// A document under construction.
pub struct PdfAssembly {
    doc: PdfDocument,
    pages: Vec<PdfPage>,
    page_w: Mm,
    page_h: Mm,
}

impl PdfAssembly {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Append `raster` as a new page at 300 DPI, shrunk to fit and centred.
    pub fn add_page(&mut self, raster: RgbImage) {
        let (width, height) = raster.dimensions();
        let raw = RawImage {
            pixels: RawImageData::U8(raster.into_raw()),
            width: width as usize,
            height: height as usize,
            data_format: RawImageFormat::RGB8,
            tag: Vec::new(),
        };
        let xobject_id = self.doc.add_image(&raw);

        let page_w_pt = self.page_w.into_pt().0;
        let page_h_pt = self.page_h.into_pt().0;
        let dpi = PageSize::DPI;
        let img_w_pt = width as f32 / dpi * 72.0;
        let img_h_pt = height as f32 / dpi * 72.0;

        let scale = (page_w_pt / img_w_pt).min(page_h_pt / img_h_pt).min(1.0);
        let x_offset = (page_w_pt - img_w_pt * scale) / 2.0;
        let y_offset = (page_h_pt - img_h_pt * scale) / 2.0;

        let ops = vec![Op::UseXobject {
            id: xobject_id,
            transform: XObjectTransform {
                translate_x: Some(Pt(x_offset)),
                translate_y: Some(Pt(y_offset)),
                scale_x: Some(scale),
                scale_y: Some(scale),
                dpi: Some(dpi),
                rotate: None,
            },
        }];
        self.pages.push(PdfPage::new(self.page_w, self.page_h, ops));
        debug!(page = self.pages.len(), width, height, scale, "page added");
    }

    /// Serialise the document.
    pub fn finish(mut self) -> Result<Vec<u8>> {
        if self.pages.is_empty() {
            return Err(CodepressError::Pdf("document has no pages".into()));
        }
        let count = self.pages.len();
        self.doc.with_pages(self.pages);

        let mut warnings: Vec<PdfWarnMsg> = Vec::new();
        let output = self.doc.save(&PdfSaveOptions::default(), &mut warnings);
        if !warnings.is_empty() {
            warn!(count = warnings.len(), "PDF serialisation reported warnings");
        }
        debug!(pages = count, bytes = output.len(), "PDF serialised");
        Ok(output)
    }

    /// Serialise the document into `path`, returning its page count.
    #[instrument(skip_all, fields(path = %path.display(), pages = self.pages.len()))]
    pub fn finish_to_file(self, path: &Path) -> Result<usize> {
        let count = self.page_count();
        let bytes = self.finish()?;
        std::fs::write(path, &bytes).map_err(|e| CodepressError::file_io("write PDF", path, e))?;
        debug!(pages = count, "PDF written");
        Ok(count)
    }
}
