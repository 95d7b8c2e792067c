// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Render options, layout and engine configuration.
//
// Every struct is constructed once per request and read-only while a run is in
// flight. `validate()` is called at job construction; nothing re-checks later.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::color::ColorSpec;
use crate::error::{CodepressError, Result};
use crate::types::{Arrangement, CodeMode, EcLevel, PageSize, Symbology, TextAlign, TextPosition};

/// Smallest text size a glyph rasteriser is asked for.
pub const MIN_TEXT_SIZE: u32 = 6;

/// Largest accepted target width for a single code.
pub const MAX_OUT_PX: u32 = 20_000;

// ---------------------------------------------------------------------------
// Text annotation
// ---------------------------------------------------------------------------

/// Human-readable label settings shared by both renderers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextStyle {
    /// Draw the label at all.
    pub show: bool,
    pub position: TextPosition,
    pub align: TextAlign,
    /// Gap around the label, in pixels.
    pub margin_px: u32,
    /// Nominal glyph height in pixels (clamped to at least 6).
    pub size_px: u32,
    pub bold: bool,
    pub italic: bool,
}

impl TextStyle {
    /// Size actually handed to the rasteriser.
    pub fn effective_size(&self) -> u32 {
        self.size_px.max(MIN_TEXT_SIZE)
    }
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            show: false,
            position: TextPosition::Bottom,
            align: TextAlign::Center,
            margin_px: 5,
            size_px: 12,
            bold: false,
            italic: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Renderer options
// ---------------------------------------------------------------------------

/// Options for the QR matrix renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QrOptions {
    /// Target output width in pixels.
    pub out_px: u32,
    /// Horizontal padding added on each side.
    pub padding_lr: u32,
    /// Vertical padding added above and below.
    pub padding_tb: u32,
    pub module_color: ColorSpec,
    pub back_color: ColorSpec,
    /// Fill for the 7x7 finder ring; `None` keeps the module colour.
    pub outer_eye_color: Option<ColorSpec>,
    /// Fill for the 3x3 finder core; `None` keeps the module colour.
    pub inner_eye_color: Option<ColorSpec>,
    /// Forced symbol version (1..=40). `None` picks the smallest that fits.
    pub version: Option<u8>,
    pub error_correction: EcLevel,
    pub text: TextStyle,
}

impl Default for QrOptions {
    fn default() -> Self {
        Self {
            out_px: 300,
            padding_lr: 10,
            padding_tb: 10,
            module_color: ColorSpec::BLACK,
            back_color: ColorSpec::WHITE,
            outer_eye_color: None,
            inner_eye_color: None,
            version: None,
            error_correction: EcLevel::M,
            text: TextStyle::default(),
        }
    }
}

/// Options for the barcode normaliser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BarcodeOptions {
    pub symbology: Symbology,
    /// Requested width of the narrowest bar, in pixels.
    pub narrow_bar_px: u32,
    /// Requested height of the bar region, in pixels.
    pub bar_height_px: u32,
    /// Quiet zone added on every side.
    pub margin_px: u32,
    pub bar_color: ColorSpec,
    pub bg_color: ColorSpec,
    pub bg_transparent: bool,
    /// Fraction of the encoder's bitmap height taken up by its label, used
    /// only when the encoder does not report its label band.
    ///
    /// Only an estimate of where the encoder places the text; it drifts if the
    /// encoder's label font or size changes.
    pub text_region_ratio: f32,
    pub text: TextStyle,
}

impl BarcodeOptions {
    /// Background fill honouring `bg_transparent`.
    pub fn background(&self) -> ColorSpec {
        if self.bg_transparent {
            ColorSpec::TRANSPARENT
        } else {
            self.bg_color
        }
    }
}

impl Default for BarcodeOptions {
    fn default() -> Self {
        Self {
            symbology: Symbology::Code128,
            narrow_bar_px: 2,
            bar_height_px: 100,
            margin_px: 6,
            bar_color: ColorSpec::BLACK,
            bg_color: ColorSpec::WHITE,
            bg_transparent: false,
            text_region_ratio: 0.18,
            text: TextStyle::default(),
        }
    }
}

/// Options for one generation or export request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum RenderOptions {
    Qr(QrOptions),
    Barcode(BarcodeOptions),
}

impl RenderOptions {
    pub fn mode(&self) -> CodeMode {
        match self {
            Self::Qr(_) => CodeMode::Qr,
            Self::Barcode(_) => CodeMode::Barcode,
        }
    }

    pub fn text(&self) -> &TextStyle {
        match self {
            Self::Qr(o) => &o.text,
            Self::Barcode(o) => &o.text,
        }
    }

    /// Check every field once, before any rendering starts.
    pub fn validate(&self) -> Result<()> {
        let text = self.text();
        if text.show && text.size_px == 0 {
            return Err(CodepressError::InvalidOptions(
                "text size must be positive".into(),
            ));
        }
        if text.margin_px > MAX_OUT_PX || text.size_px > MAX_OUT_PX {
            return Err(CodepressError::InvalidOptions(format!(
                "text margin and size must not exceed {MAX_OUT_PX} px"
            )));
        }

        match self {
            Self::Qr(o) => {
                if o.out_px == 0 || o.out_px > MAX_OUT_PX {
                    return Err(CodepressError::InvalidOptions(format!(
                        "out_px must be within 1..={MAX_OUT_PX}, got {}",
                        o.out_px
                    )));
                }
                if o.padding_lr > MAX_OUT_PX || o.padding_tb > MAX_OUT_PX {
                    return Err(CodepressError::InvalidOptions(format!(
                        "padding must not exceed {MAX_OUT_PX} px"
                    )));
                }
                if let Some(v) = o.version.filter(|v| !(1..=40).contains(v)) {
                    return Err(CodepressError::InvalidOptions(format!(
                        "QR version must be within 1..=40, got {v}"
                    )));
                }
            }
            Self::Barcode(o) => {
                if o.narrow_bar_px == 0 {
                    return Err(CodepressError::InvalidOptions(
                        "narrow bar width must be at least 1 px".into(),
                    ));
                }
                if o.bar_height_px == 0 {
                    return Err(CodepressError::InvalidOptions(
                        "bar height must be at least 1 px".into(),
                    ));
                }
                if !(o.text_region_ratio > 0.0 && o.text_region_ratio < 1.0) {
                    return Err(CodepressError::InvalidOptions(format!(
                        "text region ratio must be strictly between 0 and 1, got {}",
                        o.text_region_ratio
                    )));
                }
            }
        }
        Ok(())
    }

    /// Feed an auto-sized cell width back into the renderer target.
    ///
    /// QR: `out_px = max(100, cell)`. Barcode: `narrow_bar_px = max(1, cell / 50)`.
    pub fn with_auto_size(&self, cell_width: u32) -> Self {
        match self {
            Self::Qr(o) => Self::Qr(QrOptions {
                out_px: cell_width.max(100),
                ..o.clone()
            }),
            Self::Barcode(o) => Self::Barcode(BarcodeOptions {
                narrow_bar_px: (cell_width / 50).max(1),
                ..o.clone()
            }),
        }
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self::Qr(QrOptions::default())
    }
}

// ---------------------------------------------------------------------------
// Page layout
// ---------------------------------------------------------------------------

/// Page composition settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub page_size: PageSize,
    pub arrangement: Arrangement,
    /// Codes per row in horizontal arrangement.
    pub columns: u32,
    /// Derive the renderer target from the column count (horizontal only).
    pub auto_size: bool,
    /// Blank border around the page content.
    pub margin_px: u32,
    /// Gap between neighbouring cells.
    pub spacing_px: u32,
    /// Distance from the bottom of a cell to its caption.
    pub caption_gap_px: u32,
    pub caption_max_chars: usize,
    pub caption_size_px: u32,
    /// Items per page in vertical arrangement.
    pub vertical_per_page: u32,
}

impl LayoutConfig {
    /// Per-cell width that makes exactly `columns` cells fit a row, if auto-sizing applies.
    pub fn auto_cell_width(&self) -> Option<u32> {
        if !self.auto_size || self.arrangement != Arrangement::Horizontal {
            return None;
        }
        let (page_w, _) = self.page_size.pixels();
        let cols = self.columns.max(1);
        let used = self
            .margin_px
            .saturating_mul(2)
            .saturating_add((cols - 1).saturating_mul(self.spacing_px));
        Some(page_w.saturating_sub(used) / cols)
    }

    /// Vertical space a caption adds below each cell.
    pub fn caption_band(&self) -> u32 {
        self.caption_gap_px.saturating_add(self.caption_size_px)
    }

    pub fn validate(&self) -> Result<()> {
        if self.columns == 0 {
            return Err(CodepressError::InvalidOptions(
                "columns per row must be at least 1".into(),
            ));
        }
        if self.arrangement == Arrangement::Vertical && self.vertical_per_page == 0 {
            return Err(CodepressError::InvalidOptions(
                "vertical arrangement needs at least 1 item per page".into(),
            ));
        }
        let (w, h) = self.page_size.pixels();
        if self.margin_px.saturating_mul(2) >= w.min(h) {
            return Err(CodepressError::InvalidOptions(format!(
                "page margin {} leaves no printable area on {:?}",
                self.margin_px, self.page_size
            )));
        }
        if self.spacing_px >= w.max(h) || self.caption_band() >= h {
            return Err(CodepressError::InvalidOptions(format!(
                "spacing {} or caption band {} does not fit on {:?}",
                self.spacing_px,
                self.caption_band(),
                self.page_size
            )));
        }
        if self.auto_cell_width() == Some(0) {
            return Err(CodepressError::InvalidOptions(format!(
                "{} columns do not fit on {:?}",
                self.columns, self.page_size
            )));
        }
        Ok(())
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            page_size: PageSize::A4,
            arrangement: Arrangement::Horizontal,
            columns: 7,
            auto_size: true,
            margin_px: 10,
            spacing_px: 10,
            caption_gap_px: 10,
            caption_max_chars: 20,
            caption_size_px: 16,
            vertical_per_page: 3,
        }
    }
}

// ---------------------------------------------------------------------------
// Engine / resources
// ---------------------------------------------------------------------------

/// Memory ceilings enforced before large allocations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceLimits {
    /// Largest single canvas, in bytes of pixel data.
    pub max_canvas_bytes: u64,
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self {
            max_canvas_bytes: 512 * 1024 * 1024,
        }
    }
}

/// Batch and export tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Items rendered between cancellation and cleanup checkpoints.
    pub sub_batch_size: usize,
    /// Rendered images retained for interactive display.
    pub max_display: usize,
    /// Pages per PDF document before a new segment starts.
    pub segment_pages: usize,
    /// Leading items rendered to size the page cells.
    pub sample_size: usize,
    /// Item count above which a memory warning is emitted.
    pub large_batch_warning: usize,
    pub limits: ResourceLimits,
}

impl EngineConfig {
    /// Rough per-item footprint used in the large-batch warning.
    pub const ESTIMATED_MB_PER_ITEM: f64 = 0.36;

    pub fn validate(&self) -> Result<()> {
        if self.sub_batch_size == 0 || self.segment_pages == 0 || self.sample_size == 0 {
            return Err(CodepressError::InvalidOptions(
                "sub-batch size, segment pages and sample size must all be positive".into(),
            ));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sub_batch_size: 1000,
            max_display: 50,
            segment_pages: 100,
            sample_size: 10,
            large_batch_warning: 10_000,
            limits: ResourceLimits::default(),
        }
    }
}

/// Font used for labels and captions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FontConfig {
    /// Regular TrueType/OpenType face. `None` selects the built-in bitmap face.
    pub path: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// Root configuration
// ---------------------------------------------------------------------------

/// Everything a front end needs to start a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub render: RenderOptions,
    pub layout: LayoutConfig,
    pub engine: EngineConfig,
    pub font: FontConfig,
}

impl AppConfig {
    /// Read a JSON configuration file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no config file, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(CodepressError::file_io("read config", path, e)),
        };
        let config: Self = serde_json::from_str(&raw)?;
        info!(path = %path.display(), mode = ?config.render.mode(), "configuration loaded");
        Ok(config)
    }
}
