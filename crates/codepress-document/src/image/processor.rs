// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image processor: flattening, cell fitting, preview downscaling and
// PNG/JPEG encoding for rendered codes and composed pages.

use std::path::Path;

use codepress_core::ExportFormat;
use codepress_core::error::{CodepressError, Result};
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage, RgbaImage};
use tracing::{debug, instrument};

/// JPEG quality used for every JPEG artifact.
pub const JPEG_QUALITY: u8 = 95;

/// Image pipeline over a single in-memory image.
///
/// Each transformation consumes `self` and returns a new processor, so calls
/// chain:
///
/// ```ignore
/// let bytes = ImageProcessor::from_rgba(code)
///     .fit_exact(400, 460)
///     .flatten(Rgb([255, 255, 255]))
///     .encode(ExportFormat::Jpg)?;
/// ```
pub struct ImageProcessor {
    image: DynamicImage,
}

impl ImageProcessor {
    // -- Construction ---------------------------------------------------------

    pub fn from_rgba(image: RgbaImage) -> Self {
        Self {
            image: DynamicImage::ImageRgba8(image),
        }
    }

    pub fn from_rgb(image: RgbImage) -> Self {
        Self {
            image: DynamicImage::ImageRgb8(image),
        }
    }

    /// Decode an image file from disk.
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn open(path: &Path) -> Result<Self> {
        let image = image::open(path).map_err(|err| {
            CodepressError::Image(format!("failed to open {}: {err}", path.display()))
        })?;
        debug!(width = image.width(), height = image.height(), "image loaded");
        Ok(Self { image })
    }

    // -- Accessors ------------------------------------------------------------

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn into_dynamic(self) -> DynamicImage {
        self.image
    }

    /// Opaque RGB pixels, compositing any transparency onto white.
    pub fn into_rgb(self) -> RgbImage {
        match self.image {
            DynamicImage::ImageRgb8(rgb) => rgb,
            other => Self { image: other }
                .flatten(Rgb([255, 255, 255]))
                .image
                .to_rgb8(),
        }
    }

    // -- Transformations ------------------------------------------------------

    /// Composite onto an opaque `background`, dropping the alpha channel.
    pub fn flatten(self, background: Rgb<u8>) -> Self {
        if !self.image.color().has_alpha() {
            return self;
        }
        let rgba = self.image.to_rgba8();
        let flat = RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
            let p = rgba.get_pixel(x, y);
            let a = u32::from(p[3]);
            let mix = |c: u8, bg: u8| ((u32::from(c) * a + u32::from(bg) * (255 - a)) / 255) as u8;
            Rgb([
                mix(p[0], background[0]),
                mix(p[1], background[1]),
                mix(p[2], background[2]),
            ])
        });
        Self {
            image: DynamicImage::ImageRgb8(flat),
        }
    }

    /// Resize to exactly `width` x `height` with Lanczos3, ignoring aspect ratio.
    pub fn fit_exact(self, width: u32, height: u32) -> Self {
        if self.image.width() == width && self.image.height() == height {
            return self;
        }
        let resized = self
            .image
            .resize_exact(width, height, FilterType::Lanczos3);
        Self { image: resized }
    }

    /// Shrink to fit within `max_width` x `max_height`, preserving aspect
    /// ratio. Images already inside the box are returned unchanged.
    #[instrument(skip(self), fields(max_width, max_height))]
    pub fn shrink_to_fit(self, max_width: u32, max_height: u32) -> Self {
        if self.image.width() <= max_width && self.image.height() <= max_height {
            return self;
        }
        let resized = self
            .image
            .resize(max_width, max_height, FilterType::Lanczos3);
        debug!(
            new_w = resized.width(),
            new_h = resized.height(),
            "downscaled"
        );
        Self { image: resized }
    }

    // -- Output ---------------------------------------------------------------

    pub fn to_png_bytes(&self) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        let mut cursor = std::io::Cursor::new(&mut buffer);
        self.image
            .write_to(&mut cursor, ImageFormat::Png)
            .map_err(|err| CodepressError::Image(format!("PNG encoding failed: {err}")))?;
        Ok(buffer)
    }

    /// JPEG bytes at `quality` (1-100). Transparency is flattened onto white.
    pub fn to_jpeg_bytes(&self, quality: u8) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        let rgb = Self {
            image: self.image.clone(),
        }
        .into_rgb();
        let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, quality);
        rgb.write_with_encoder(encoder)
            .map_err(|err| CodepressError::Image(format!("JPEG encoding failed: {err}")))?;
        Ok(buffer)
    }

    /// Encode for a raster export format.
    pub fn encode(&self, format: ExportFormat) -> Result<Vec<u8>> {
        match format {
            ExportFormat::Png => self.to_png_bytes(),
            ExportFormat::Jpg => self.to_jpeg_bytes(JPEG_QUALITY),
            ExportFormat::Pdf => Err(CodepressError::InvalidOptions(
                "PDF is not a raster image format".into(),
            )),
        }
    }

    /// Encode and write to `path`.
    pub fn save(&self, path: &Path, format: ExportFormat) -> Result<()> {
        let bytes = self.encode(format)?;
        std::fs::write(path, &bytes).map_err(|e| CodepressError::file_io("write image", path, e))?;
        debug!(path = %path.display(), bytes = bytes.len(), "image written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn flatten_composites_onto_background() {
        let mut img = RgbaImage::from_pixel(2, 1, Rgba([0, 0, 0, 255]));
        img.put_pixel(1, 0, Rgba([0, 0, 0, 0]));
        let rgb = ImageProcessor::from_rgba(img).into_rgb();
        assert_eq!(*rgb.get_pixel(0, 0), Rgb([0, 0, 0]));
        assert_eq!(*rgb.get_pixel(1, 0), Rgb([255, 255, 255]));
    }

    #[test]
    fn shrink_never_upscales() {
        let small = ImageProcessor::from_rgb(RgbImage::new(50, 40)).shrink_to_fit(500, 500);
        assert_eq!((small.width(), small.height()), (50, 40));

        let big = ImageProcessor::from_rgb(RgbImage::new(1000, 500)).shrink_to_fit(100, 100);
        assert_eq!((big.width(), big.height()), (100, 50));
    }

    #[test]
    fn encodes_png_and_jpeg_signatures() {
        let p = ImageProcessor::from_rgba(RgbaImage::from_pixel(8, 8, Rgba([10, 20, 30, 128])));
        let png = p.encode(ExportFormat::Png).unwrap();
        assert_eq!(&png[..4], b"\x89PNG");
        let jpg = p.encode(ExportFormat::Jpg).unwrap();
        assert_eq!(&jpg[..2], &[0xFF, 0xD8]);
        assert!(p.encode(ExportFormat::Pdf).is_err());
    }

    #[test]
    fn save_reports_path_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("no/such/dir/out.png");
        let err = ImageProcessor::from_rgb(RgbImage::new(2, 2))
            .save(&missing, ExportFormat::Png)
            .unwrap_err();
        assert!(err.to_string().contains("out.png"));
    }
}
