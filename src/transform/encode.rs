//! Output formats, interlace modes and the final encode.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilterType, PngEncoder};
use image::codecs::webp::WebPEncoder;
use image::{DynamicImage, ImageFormat, Rgba};
use serde::{Deserialize, Serialize};

use crate::log;

use super::error::TransformError;
use super::frame::Frame;

/// Background used when alpha has to be flattened for an alpha-less target.
const FLATTEN_BACKGROUND: Rgba<u8> = Rgba([255, 255, 255, 255]);

// ============================================================================
// Output Format
// ============================================================================

/// Encodable output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Png,
    #[serde(alias = "jpg")]
    Jpeg,
    Webp,
}

impl OutputFormat {
    /// Canonical file extension.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::Webp => "webp",
        }
    }

    /// Short name used in logs and error messages.
    pub fn name(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpeg",
            Self::Webp => "webp",
        }
    }

    /// Whether the format can represent an alpha channel.
    pub fn supports_alpha(self) -> bool {
        !matches!(self, Self::Jpeg)
    }

    /// Map a sniffed `image` crate format to an encodable one.
    pub fn from_image_format(format: ImageFormat) -> Option<Self> {
        match format {
            ImageFormat::Png => Some(Self::Png),
            ImageFormat::Jpeg => Some(Self::Jpeg),
            ImageFormat::WebP => Some(Self::Webp),
            _ => None,
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Interlace Mode
// ============================================================================

/// Pixel storage order for progressive rendering.
///
/// The mode only changes how pixels are ordered in the encoded stream,
/// never their visible values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterlaceMode {
    /// Normal scanline order.
    #[default]
    None,
    /// Line interlacing (progressive scanlines).
    Line,
    /// Plane interlacing (PNG Adam7-style passes).
    Plane,
}

impl InterlaceMode {
    pub fn name(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Line => "line",
            Self::Plane => "plane",
        }
    }
}

// ============================================================================
// Encode
// ============================================================================

/// Encode a frame at the given default quality.
///
/// The frame's pending settings win where present: a `convert` step's
/// quality overrides `default_quality`, the pending format decides the
/// encoder. Lossy-but-accepted conditions (alpha flatten for JPEG, interlace
/// modes the encoder cannot express, the WebP quality hint) are logged as
/// warnings and applied, never rejected.
pub fn encode(frame: &Frame, default_quality: u8) -> Result<Vec<u8>, TransformError> {
    let format = frame.encoding.format;
    let quality = frame.encoding.quality.unwrap_or(default_quality).min(100);

    if frame.encoding.interlace != InterlaceMode::None {
        // The png/jpeg/webp encoders in this stack only write normal order.
        log!(
            "warning";
            "{} encoder cannot write `{}` interlacing, encoding in normal order",
            format,
            frame.encoding.interlace.name()
        );
    }

    let image = if !format.supports_alpha() && frame.image.color().has_alpha() {
        log!(
            "warning";
            "{} cannot represent transparency, flattening over solid background",
            format
        );
        flatten_alpha(&frame.image, FLATTEN_BACKGROUND)
    } else {
        frame.image.clone()
    };

    let mut buf = Cursor::new(Vec::new());
    match format {
        OutputFormat::Png => {
            // PNG is lossless, quality does not apply.
            let encoder = PngEncoder::new_with_quality(
                &mut buf,
                CompressionType::Default,
                PngFilterType::Adaptive,
            );
            image.write_with_encoder(encoder)
        }
        OutputFormat::Jpeg => {
            let encoder = JpegEncoder::new_with_quality(&mut buf, quality);
            image.write_with_encoder(encoder)
        }
        OutputFormat::Webp => {
            if frame.encoding.quality.is_some() {
                log!(
                    "warning";
                    "webp output is lossless, ignoring quality {}",
                    quality
                );
            }
            let encoder = WebPEncoder::new_lossless(&mut buf);
            image.write_with_encoder(encoder)
        }
    }
    .map_err(|source| TransformError::Encode {
        format: format.name(),
        source,
    })?;

    Ok(buf.into_inner())
}

/// Composite an image over an opaque background, dropping alpha.
fn flatten_alpha(image: &DynamicImage, background: Rgba<u8>) -> DynamicImage {
    let rgba = image.to_rgba8();
    let mut out = image::RgbImage::new(rgba.width(), rgba.height());

    for (x, y, pixel) in rgba.enumerate_pixels() {
        let alpha = f32::from(pixel[3]) / 255.0;
        let mut blended = [0u8; 3];
        for (i, channel) in blended.iter_mut().enumerate() {
            let fg = f32::from(pixel[i]);
            let bg = f32::from(background[i]);
            *channel = (fg * alpha + bg * (1.0 - alpha)).round() as u8;
        }
        out.put_pixel(x, y, image::Rgb(blended));
    }

    DynamicImage::ImageRgb8(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;

    fn solid_frame(w: u32, h: u32, pixel: Rgba<u8>, format: OutputFormat) -> Frame {
        let img = RgbaImage::from_pixel(w, h, pixel);
        Frame::from_image(DynamicImage::ImageRgba8(img), format)
    }

    #[test]
    fn png_output_has_magic_header() {
        let frame = solid_frame(4, 4, Rgba([10, 20, 30, 255]), OutputFormat::Png);
        let bytes = encode(&frame, 90).unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn webp_output_has_magic_header() {
        let frame = solid_frame(4, 4, Rgba([10, 20, 30, 255]), OutputFormat::Webp);
        let bytes = encode(&frame, 80).unwrap();
        assert_eq!(&bytes[..4], b"RIFF");
        assert_eq!(&bytes[8..12], b"WEBP");
    }

    #[test]
    fn jpeg_flattens_transparency_instead_of_failing() {
        // Half-transparent red over the white flatten background.
        let frame = solid_frame(2, 2, Rgba([255, 0, 0, 128]), OutputFormat::Jpeg);
        let bytes = encode(&frame, 85).unwrap();
        assert_eq!(&bytes[..2], b"\xff\xd8");

        let decoded = image::load_from_memory(&bytes).unwrap();
        assert!(!decoded.color().has_alpha());
    }

    #[test]
    fn jpeg_quality_changes_output_size() {
        let mut img = RgbaImage::new(64, 64);
        for (x, y, p) in img.enumerate_pixels_mut() {
            *p = Rgba([(x * 4) as u8, (y * 4) as u8, ((x + y) * 2) as u8, 255]);
        }
        let frame = Frame::from_image(DynamicImage::ImageRgba8(img), OutputFormat::Jpeg);

        let high = encode(&frame, 95).unwrap();
        let low = encode(&frame, 10).unwrap();
        assert!(low.len() < high.len());
    }

    #[test]
    fn convert_quality_overrides_default() {
        let mut img = RgbaImage::new(64, 64);
        for (x, y, p) in img.enumerate_pixels_mut() {
            *p = Rgba([(x * 4) as u8, (y * 4) as u8, ((x + y) * 2) as u8, 255]);
        }
        let mut frame = Frame::from_image(DynamicImage::ImageRgba8(img), OutputFormat::Jpeg);
        frame.encoding.quality = Some(10);

        let overridden = encode(&frame, 95).unwrap();
        frame.encoding.quality = None;
        let default = encode(&frame, 95).unwrap();
        assert!(overridden.len() < default.len());
    }

    #[test]
    fn flatten_alpha_blends_toward_background() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(1, 1, Rgba([0, 0, 0, 0])));
        let flat = flatten_alpha(&img, Rgba([255, 255, 255, 255])).to_rgb8();
        assert_eq!(flat.get_pixel(0, 0).0, [255, 255, 255]);
    }

    #[test]
    fn output_format_serde_names() {
        assert_eq!(
            toml::from_str::<std::collections::BTreeMap<String, OutputFormat>>(
                "f = \"jpg\"\n"
            )
            .unwrap()["f"],
            OutputFormat::Jpeg
        );
        assert_eq!(OutputFormat::Webp.extension(), "webp");
    }
}
