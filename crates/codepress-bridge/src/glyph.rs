// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// TrueType/OpenType text rasterisation: faces loaded with ab_glyph, laid
// out and drawn by imageproc.
//
// Bold and italic faces are looked up next to the regular file using the
// common Windows naming (`arial.ttf` -> `arialbd.ttf`, `ariali.ttf`,
// `arialbi.ttf`). A missing variant is synthesised from the regular face.

use std::path::{Path, PathBuf};

use ab_glyph::{FontVec, PxScale};
use codepress_core::error::{CodepressError, Result};
use image::{GrayImage, Luma, Rgba, RgbaImage};
use imageproc::drawing::{draw_text_mut, text_size};
use tracing::{debug, info};

use crate::mask;
use crate::traits::{GlyphStyle, TextRasterizer};

/// A font family loaded from disk.
pub struct TrueTypeRasterizer {
    name: String,
    regular: FontVec,
    bold: Option<FontVec>,
    italic: Option<FontVec>,
    bold_italic: Option<FontVec>,
}

impl std::fmt::Debug for TrueTypeRasterizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrueTypeRasterizer")
            .field("name", &self.name)
            .field("bold", &self.bold.is_some())
            .field("italic", &self.italic.is_some())
            .field("bold_italic", &self.bold_italic.is_some())
            .finish()
    }
}

/// Path of a style variant: `dir/stem{suffix}.ext`.
pub fn variant_path(regular: &Path, suffix: &str) -> PathBuf {
    let stem = regular
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let file = match regular.extension() {
        Some(ext) => format!("{stem}{suffix}.{}", ext.to_string_lossy()),
        None => format!("{stem}{suffix}"),
    };
    regular.with_file_name(file)
}

fn read_face(path: &Path) -> Result<FontVec> {
    let bytes = std::fs::read(path).map_err(|e| CodepressError::file_io("read font", path, e))?;
    FontVec::try_from_vec(bytes)
        .map_err(|e| CodepressError::Font(format!("{}: {e}", path.display())))
}

fn read_optional_face(path: &Path) -> Option<FontVec> {
    if !path.exists() {
        return None;
    }
    match read_face(path) {
        Ok(face) => Some(face),
        Err(e) => {
            debug!(path = %path.display(), error = %e, "font variant unusable, will synthesise");
            None
        }
    }
}

impl TrueTypeRasterizer {
    /// Load the regular face plus whichever variants exist beside it.
    pub fn load(path: &Path) -> Result<Self> {
        let regular = read_face(path)?;
        let rasterizer = Self {
            name: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            regular,
            bold: read_optional_face(&variant_path(path, "bd")),
            italic: read_optional_face(&variant_path(path, "i")),
            bold_italic: read_optional_face(&variant_path(path, "bi")),
        };
        info!(font = ?rasterizer, "loaded TrueType font");
        Ok(rasterizer)
    }

    /// Pick a face for `style`, plus the effects that must still be synthesised.
    fn select(&self, style: &GlyphStyle) -> (&FontVec, bool, bool) {
        match (style.bold, style.italic) {
            (true, true) => match (&self.bold_italic, &self.bold, &self.italic) {
                (Some(f), _, _) => (f, false, false),
                (None, Some(f), _) => (f, false, true),
                (None, None, Some(f)) => (f, true, false),
                (None, None, None) => (&self.regular, true, true),
            },
            (true, false) => match &self.bold {
                Some(f) => (f, false, false),
                None => (&self.regular, true, false),
            },
            (false, true) => match &self.italic {
                Some(f) => (f, false, false),
                None => (&self.regular, false, true),
            },
            (false, false) => (&self.regular, false, false),
        }
    }

    /// Upright coverage of `text` in `face`; height is the face's line height.
    fn coverage(face: &FontVec, text: &str, size: u32) -> GrayImage {
        let scale = PxScale::from(size as f32);
        let (w, h) = text_size(scale, face, text);
        let mut mask = GrayImage::new(w.max(1), h.max(1));
        draw_text_mut(&mut mask, Luma([255]), 0, 0, scale, face, text);
        mask
    }

    fn styled(&self, text: &str, style: &GlyphStyle) -> GrayImage {
        let (face, synth_bold, synth_italic) = self.select(style);
        let bold = synth_bold.then(|| mask::bold_offset(style.size));
        mask::stylize(Self::coverage(face, text, style.size), bold, synth_italic)
    }
}

impl TextRasterizer for TrueTypeRasterizer {
    fn measure(&self, text: &str, style: &GlyphStyle) -> (u32, u32) {
        self.styled(text, style).dimensions()
    }

    fn draw(
        &self,
        canvas: &mut RgbaImage,
        x: i32,
        y: i32,
        text: &str,
        style: &GlyphStyle,
        color: Rgba<u8>,
    ) {
        mask::blit(canvas, &self.styled(text, style), x, y, color);
    }

    fn face_name(&self) -> &str {
        &self.name
    }
}
