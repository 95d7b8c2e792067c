// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Codepress rendering engine.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CodepressError, Result};

/// Unique identifier for an export job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(pub Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which renderer handles the items of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodeMode {
    Qr,
    Barcode,
}

/// QR error-correction level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EcLevel {
    /// ~7% recovery.
    L,
    /// ~15% recovery.
    #[default]
    M,
    /// ~25% recovery.
    Q,
    /// ~30% recovery.
    H,
}

/// Supported 1-D symbologies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Symbology {
    #[default]
    Code128,
    Code39,
    Code93,
    Ean13,
    Ean8,
    UpcA,
    UpcE,
    Itf,
    Codabar,
}

impl Symbology {
    /// Generic symbology used when the requested one rejects a payload.
    pub const FALLBACK: Self = Self::Code128;

    pub fn name(&self) -> &'static str {
        match self {
            Self::Code128 => "code128",
            Self::Code39 => "code39",
            Self::Code93 => "code93",
            Self::Ean13 => "ean13",
            Self::Ean8 => "ean8",
            Self::UpcA => "upca",
            Self::UpcE => "upce",
            Self::Itf => "itf",
            Self::Codabar => "codabar",
        }
    }

    /// Case-insensitive lookup by name (`"ean13"`, `"EAN-13"`, `"upc_a"`).
    pub fn from_name(name: &str) -> Option<Self> {
        let key: String = name
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match key.as_str() {
            "code128" => Some(Self::Code128),
            "code39" => Some(Self::Code39),
            "code93" => Some(Self::Code93),
            "ean13" => Some(Self::Ean13),
            "ean8" => Some(Self::Ean8),
            "upca" | "upc" => Some(Self::UpcA),
            "upce" => Some(Self::UpcE),
            "itf" | "itf14" => Some(Self::Itf),
            "codabar" => Some(Self::Codabar),
            _ => None,
        }
    }
}

/// Where the human-readable label sits relative to the code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextPosition {
    Top,
    #[default]
    Bottom,
}

/// Horizontal alignment of the label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    Left,
    #[default]
    Center,
    Right,
}

/// Page presets, fixed pixel pairs at 300 DPI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PageSize {
    A3,
    #[default]
    A4,
    A5,
}

impl PageSize {
    /// Reference resolution of the pixel table.
    pub const DPI: f32 = 300.0;

    /// Canvas size in pixels (width, height).
    pub fn pixels(&self) -> (u32, u32) {
        match self {
            Self::A3 => (3508, 4961),
            Self::A4 => (2480, 3508),
            Self::A5 => (1748, 2480),
        }
    }

    /// Dimensions in millimetres (width, height).
    pub fn dimensions_mm(&self) -> (f32, f32) {
        match self {
            Self::A3 => (297.0, 420.0),
            Self::A4 => (210.0, 297.0),
            Self::A5 => (148.0, 210.0),
        }
    }
}

/// How codes are packed onto a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Arrangement {
    /// Row-major grid.
    #[default]
    Horizontal,
    /// Single column, one item per row.
    Vertical,
}

/// Export target format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Pdf,
    Png,
    Jpg,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Png => "png",
            Self::Jpg => "jpg",
        }
    }

    /// Infer the format from a file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpg),
            _ => None,
        }
    }
}

/// Square boolean grid returned by a QR encoder. `true` is a dark module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleMatrix {
    side: usize,
    modules: Vec<bool>,
}

impl ModuleMatrix {
    /// Build from row-major modules. Fails unless the grid is square with side >= 1.
    pub fn new(side: usize, modules: Vec<bool>) -> Result<Self> {
        if side == 0 {
            return Err(CodepressError::Encoding("module matrix is empty".into()));
        }
        if side.checked_mul(side) != Some(modules.len()) {
            return Err(CodepressError::Encoding(format!(
                "module matrix is not square: side {side}, {} modules",
                modules.len()
            )));
        }
        Ok(Self { side, modules })
    }

    /// Build from a closure evaluated at every `(x, y)`.
    pub fn from_fn(side: usize, mut f: impl FnMut(usize, usize) -> bool) -> Result<Self> {
        let mut modules = Vec::with_capacity(side.saturating_mul(side));
        for y in 0..side {
            for x in 0..side {
                modules.push(f(x, y));
            }
        }
        Self::new(side, modules)
    }

    pub fn side(&self) -> usize {
        self.side
    }

    /// Module at column `x`, row `y`. Out-of-range reads are light.
    pub fn get(&self, x: usize, y: usize) -> bool {
        if x >= self.side || y >= self.side {
            return false;
        }
        self.modules[y * self.side + x]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matrix_must_be_square_and_non_empty() {
        assert!(ModuleMatrix::new(0, vec![]).is_err());
        assert!(ModuleMatrix::new(2, vec![true; 3]).is_err());
        let m = ModuleMatrix::new(2, vec![true, false, false, true]).unwrap();
        assert_eq!(m.side(), 2);
        assert!(m.get(0, 0));
        assert!(!m.get(1, 0));
        assert!(m.get(1, 1));
        assert!(!m.get(5, 5));
    }

    #[test]
    fn matrix_from_fn_is_row_major() {
        let m = ModuleMatrix::from_fn(3, |x, y| x == 2 && y == 0).unwrap();
        assert!(m.get(2, 0));
        assert!(!m.get(0, 2));
    }

    #[test]
    fn page_presets_are_portrait_at_300_dpi() {
        assert_eq!(PageSize::A4.pixels(), (2480, 3508));
        assert_eq!(PageSize::A3.pixels(), (3508, 4961));
        assert_eq!(PageSize::A5.pixels(), (1748, 2480));
        for size in [PageSize::A3, PageSize::A4, PageSize::A5] {
            let (w, h) = size.pixels();
            assert!(h > w);
        }
    }

    #[test]
    fn symbology_names_are_lenient() {
        assert_eq!(Symbology::from_name("EAN-13"), Some(Symbology::Ean13));
        assert_eq!(Symbology::from_name("upc_a"), Some(Symbology::UpcA));
        assert_eq!(Symbology::from_name("Code128"), Some(Symbology::Code128));
        assert_eq!(Symbology::from_name("pdf417"), None);
        for s in [Symbology::Code39, Symbology::Itf, Symbology::Codabar] {
            assert_eq!(Symbology::from_name(s.name()), Some(s));
        }
    }

    #[test]
    fn export_format_extensions() {
        assert_eq!(ExportFormat::from_extension("JPEG"), Some(ExportFormat::Jpg));
        assert_eq!(ExportFormat::Pdf.extension(), "pdf");
        assert_eq!(ExportFormat::from_extension("tiff"), None);
    }
}
