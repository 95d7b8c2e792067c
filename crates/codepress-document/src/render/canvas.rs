// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Budget-checked canvas allocation and the geometric primitives built on it.
//
// Every large buffer goes through `check_budget` first so an oversized request
// surfaces as `ResourceExhausted` instead of aborting the process.

use codepress_core::ResourceLimits;
use codepress_core::error::{CodepressError, Result};
use image::imageops::{self, FilterType};
use image::{ImageBuffer, Pixel, Rgb, RgbImage, Rgba, RgbaImage};

/// Byte length of a `width` x `height` buffer with `channels` bytes per pixel,
/// refused if it overflows or exceeds the configured ceiling.
pub fn check_budget(
    width: u32,
    height: u32,
    channels: u8,
    limits: &ResourceLimits,
) -> Result<usize> {
    let bytes = u64::from(width)
        .checked_mul(u64::from(height))
        .and_then(|px| px.checked_mul(u64::from(channels)))
        .ok_or_else(|| {
            CodepressError::ResourceExhausted(format!("{width}x{height} canvas overflows"))
        })?;
    if bytes > limits.max_canvas_bytes {
        return Err(CodepressError::ResourceExhausted(format!(
            "{width}x{height} canvas needs {bytes} bytes, limit is {}",
            limits.max_canvas_bytes
        )));
    }
    usize::try_from(bytes).map_err(|_| {
        CodepressError::ResourceExhausted(format!("{width}x{height} canvas exceeds address space"))
    })
}

fn filled<P>(width: u32, height: u32, fill: P, limits: &ResourceLimits) -> Result<ImageBuffer<P, Vec<u8>>>
where
    P: Pixel<Subpixel = u8>,
{
    let len = check_budget(width, height, P::CHANNEL_COUNT, limits)?;
    let mut raw: Vec<u8> = Vec::new();
    raw.try_reserve_exact(len).map_err(|e| {
        CodepressError::ResourceExhausted(format!("{width}x{height} canvas: {e}"))
    })?;
    let pixel = fill.channels();
    for _ in 0..(len / pixel.len().max(1)) {
        raw.extend_from_slice(pixel);
    }
    ImageBuffer::from_raw(width, height, raw)
        .ok_or_else(|| CodepressError::Image(format!("{width}x{height} canvas buffer mismatch")))
}

/// RGBA canvas of one colour.
pub fn filled_rgba(width: u32, height: u32, fill: Rgba<u8>, limits: &ResourceLimits) -> Result<RgbaImage> {
    filled(width, height, fill, limits)
}

/// RGB canvas of one colour.
pub fn filled_rgb(width: u32, height: u32, fill: Rgb<u8>, limits: &ResourceLimits) -> Result<RgbImage> {
    filled(width, height, fill, limits)
}

/// Border of `(left, top, right, bottom)` pixels around `img`.
pub fn expand(
    img: &RgbaImage,
    border: (u32, u32, u32, u32),
    fill: Rgba<u8>,
    limits: &ResourceLimits,
) -> Result<RgbaImage> {
    let (left, top, right, bottom) = border;
    let width = img.width().saturating_add(left).saturating_add(right);
    let height = img.height().saturating_add(top).saturating_add(bottom);
    let mut out = filled_rgba(width, height, fill, limits)?;
    imageops::replace(&mut out, img, i64::from(left), i64::from(top));
    Ok(out)
}

/// Nearest-neighbour resize; keeps hard module and bar edges.
pub fn resize_nearest(
    img: &RgbaImage,
    width: u32,
    height: u32,
    limits: &ResourceLimits,
) -> Result<RgbaImage> {
    check_budget(width, height, 4, limits)?;
    if img.dimensions() == (width, height) {
        return Ok(img.clone());
    }
    Ok(imageops::resize(img, width, height, FilterType::Nearest))
}
