// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// codepress-document: pixel work for the Codepress batch engine.
//
// Turns encoder output into sized, coloured code bitmaps (render), lays
// them out on fixed-size pages (compose), and writes raster files and
// multi-page PDFs (image, pdf).

pub mod compose;
pub mod image;
pub mod pdf;
pub mod render;

pub use compose::{PageCompositor, PageGeometry, Placement};
pub use crate::image::processor::ImageProcessor;
pub use pdf::reader::PdfReader;
pub use pdf::writer::{PdfAssembly, PdfWriter};
pub use render::barcode::BarcodeNormalizer;
pub use render::matrix::MatrixRenderer;
pub use render::placeholder::error_placeholder;
pub use render::RenderedImage;
