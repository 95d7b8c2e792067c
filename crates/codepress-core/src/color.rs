// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Colour model: hex string parsing and foreground/background classification.

use serde::{Deserialize, Serialize};

/// Luminance threshold below which every RGB channel must fall for a pixel to
/// count as foreground.
pub const DEFAULT_THRESHOLD: u8 = 100;

/// An RGBA colour value.
///
/// Serialised as a hex string (`"#RRGGBB"`) so option files stay readable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct ColorSpec {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl ColorSpec {
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    pub const WHITE: Self = Self::rgb(255, 255, 255);
    /// Fully transparent black; the canonical transparent background.
    pub const TRANSPARENT: Self = Self::BLACK.with_alpha(0);

    /// Opaque colour from three channels.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Same colour with a different alpha.
    pub const fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }

    /// Channels in `[r, g, b, a]` order, ready for `image::Rgba`.
    pub const fn to_rgba(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Channels in `[r, g, b]` order, alpha discarded.
    pub const fn to_rgb(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }

    /// `#RRGGBB` representation (alpha is not encoded).
    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl Default for ColorSpec {
    fn default() -> Self {
        Self::BLACK
    }
}

impl From<String> for ColorSpec {
    fn from(value: String) -> Self {
        parse_hex(&value)
    }
}

impl From<ColorSpec> for String {
    fn from(value: ColorSpec) -> Self {
        value.to_hex()
    }
}

/// Parse `"#RGB"`, `"RGB"`, `"#RRGGBB"` or `"RRGGBB"` into an opaque colour.
///
/// Never fails: empty or malformed input yields opaque black.
pub fn parse_hex(s: &str) -> ColorSpec {
    let trimmed = s.trim();
    let digits = trimmed.strip_prefix('#').unwrap_or(trimmed);

    let expanded: String = match digits.len() {
        3 => digits.chars().flat_map(|c| [c, c]).collect(),
        6 => digits.to_string(),
        _ => {
            if !digits.is_empty() {
                tracing::debug!(input = s, "unrecognised hex colour, using black");
            }
            return ColorSpec::BLACK;
        }
    };

    let channel = |i: usize| {
        expanded
            .get(i..i + 2)
            .and_then(|pair| u8::from_str_radix(pair, 16).ok())
    };

    match (channel(0), channel(2), channel(4)) {
        (Some(r), Some(g), Some(b)) => ColorSpec::rgb(r, g, b),
        _ => {
            tracing::debug!(input = s, "invalid hex digits in colour, using black");
            ColorSpec::BLACK
        }
    }
}

/// Binary pixel class used to recolour externally rendered imagery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelClass {
    Foreground,
    Background,
}

/// Foreground iff every one of R, G and B is below `threshold`.
pub fn classify(rgb: [u8; 3], threshold: u8) -> PixelClass {
    if rgb.iter().all(|&c| c < threshold) {
        PixelClass::Foreground
    } else {
        PixelClass::Background
    }
}
