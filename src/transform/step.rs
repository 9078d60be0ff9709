//! Declarative transform steps.
//!
//! A step is the configuration unit of a filter set: a tagged variant
//! (`op = "scale"`, `op = "crop"`, ...) plus its parameters, applied
//! left-to-right over a [`Frame`].

use image::Rgba;
use serde::{Deserialize, Serialize};

use super::encode::{InterlaceMode, OutputFormat};
use super::error::TransformError;
use super::frame::Frame;
use super::geometry;

/// Default rotate background: transparent where the output supports it.
const ROTATE_BACKGROUND: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// A single transform step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "kebab-case")]
pub enum Step {
    /// Fit within `dim = [w, h]`, preserving aspect ratio.
    Scale { dim: [u32; 2] },

    /// Extract the rectangle at `start = [x, y]` with `size = [w, h]`.
    Crop { start: [u32; 2], size: [u32; 2] },

    /// Rotate clockwise by `angle` degrees; `background` fills exposed
    /// canvas (`transparent`, `#rgb`, `#rrggbb` or `#rrggbbaa`).
    Rotate {
        angle: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        background: Option<String>,
    },

    /// Remove all embedded metadata (Exif, ICC) without touching pixels.
    StripMetadata,

    /// Request a pixel storage order for progressive rendering.
    Interlace { mode: InterlaceMode },

    /// Multiply both dimensions by `scale` (> 0), rounded, floor 1px.
    RelativeResize { scale: f64 },

    /// Switch the output encoding; `quality` overrides the set default.
    Convert {
        format: OutputFormat,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        quality: Option<u8>,
    },
}

impl Step {
    /// The `op` name as written in configuration.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Scale { .. } => "scale",
            Self::Crop { .. } => "crop",
            Self::Rotate { .. } => "rotate",
            Self::StripMetadata => "strip-metadata",
            Self::Interlace { .. } => "interlace",
            Self::RelativeResize { .. } => "relative-resize",
            Self::Convert { .. } => "convert",
        }
    }

    /// Apply this step; the returned frame feeds the next step.
    pub fn apply(&self, mut frame: Frame) -> Result<Frame, TransformError> {
        match self {
            Self::Scale { dim } => {
                frame.image = geometry::scale(&frame.image, *dim)?;
            }
            Self::Crop { start, size } => {
                frame.image = geometry::crop(&frame.image, *start, *size)?;
            }
            Self::Rotate { angle, background } => {
                let fill = match background {
                    Some(raw) => geometry::parse_color(raw)
                        .map_err(|reason| TransformError::invalid("rotate", reason))?,
                    None => ROTATE_BACKGROUND,
                };
                frame.image = geometry::rotate(&frame.image, *angle, fill)?;
            }
            Self::StripMetadata => frame.strip_metadata(),
            Self::Interlace { mode } => frame.encoding.interlace = *mode,
            Self::RelativeResize { scale } => {
                frame.image = geometry::relative_resize(&frame.image, *scale)?;
            }
            Self::Convert { format, quality } => {
                if let Some(q) = quality
                    && *q > 100
                {
                    return Err(TransformError::invalid(
                        "convert",
                        format!("quality must be 0-100, got {q}"),
                    ));
                }
                frame.encoding.format = *format;
                if quality.is_some() {
                    frame.encoding.quality = *quality;
                }
            }
        }
        Ok(frame)
    }

    /// Check parameters without an image, for configuration-time
    /// diagnostics. Runtime `apply` keeps its own guards.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            Self::Scale { dim } => {
                if dim[0] == 0 || dim[1] == 0 {
                    return Err("scale dimensions must be >= 1".into());
                }
            }
            Self::Crop { size, .. } => {
                if size[0] == 0 || size[1] == 0 {
                    return Err("crop size must be >= 1".into());
                }
            }
            Self::Rotate { angle, background } => {
                if !angle.is_finite() {
                    return Err(format!("rotate angle must be finite, got {angle}"));
                }
                if let Some(raw) = background {
                    geometry::parse_color(raw)?;
                }
            }
            Self::RelativeResize { scale } => {
                if !scale.is_finite() || *scale <= 0.0 {
                    return Err(format!(
                        "relative-resize scale must be a positive number, got {scale}"
                    ));
                }
            }
            Self::Convert { quality, .. } => {
                if let Some(q) = quality
                    && *q > 100
                {
                    return Err(format!("convert quality must be 0-100, got {q}"));
                }
            }
            Self::StripMetadata | Self::Interlace { .. } => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, RgbaImage};

    fn frame(w: u32, h: u32) -> Frame {
        let img = RgbaImage::from_pixel(w, h, Rgba([40, 80, 120, 255]));
        Frame::from_image(DynamicImage::ImageRgba8(img), OutputFormat::Png)
    }

    #[test]
    fn steps_deserialize_from_kebab_case_tables() {
        let toml = r##"
steps = [
    { op = "scale", dim = [300, 200] },
    { op = "crop", start = [0, 0], size = [100, 100] },
    { op = "rotate", angle = 45.0, background = "#fff" },
    { op = "strip-metadata" },
    { op = "interlace", mode = "plane" },
    { op = "relative-resize", scale = 0.5 },
    { op = "convert", format = "webp", quality = 80 },
]
"##;
        #[derive(Deserialize)]
        struct Doc {
            steps: Vec<Step>,
        }
        let doc: Doc = toml::from_str(toml).unwrap();
        assert_eq!(doc.steps.len(), 7);
        assert_eq!(doc.steps[0], Step::Scale { dim: [300, 200] });
        assert_eq!(
            doc.steps[6],
            Step::Convert {
                format: OutputFormat::Webp,
                quality: Some(80),
            }
        );
    }

    #[test]
    fn step_order_is_significant() {
        // crop-then-scale and scale-then-crop give different extents.
        let crop = Step::Crop {
            start: [0, 0],
            size: [100, 100],
        };
        let scale = Step::Scale { dim: [50, 50] };

        let a = scale
            .apply(crop.apply(frame(200, 200)).unwrap())
            .unwrap();
        assert_eq!(a.dimensions(), (50, 50));

        // After scaling to 50x50, a 100x100 crop is out of bounds.
        let b = crop.apply(scale.apply(frame(200, 200)).unwrap());
        assert!(matches!(b, Err(TransformError::OutOfBounds { .. })));
    }

    #[test]
    fn convert_updates_pending_encoding() {
        let step = Step::Convert {
            format: OutputFormat::Jpeg,
            quality: Some(70),
        };
        let out = step.apply(frame(10, 10)).unwrap();
        assert_eq!(out.encoding.format, OutputFormat::Jpeg);
        assert_eq!(out.encoding.quality, Some(70));
    }

    #[test]
    fn convert_without_quality_keeps_earlier_override() {
        let first = Step::Convert {
            format: OutputFormat::Jpeg,
            quality: Some(70),
        };
        let second = Step::Convert {
            format: OutputFormat::Png,
            quality: None,
        };
        let out = second.apply(first.apply(frame(10, 10)).unwrap()).unwrap();
        assert_eq!(out.encoding.format, OutputFormat::Png);
        assert_eq!(out.encoding.quality, Some(70));
    }

    #[test]
    fn interlace_only_touches_encoding() {
        let step = Step::Interlace {
            mode: InterlaceMode::Line,
        };
        let before = frame(8, 8);
        let before_pixels = before.image.to_rgba8();
        let out = step.apply(before).unwrap();
        assert_eq!(out.encoding.interlace, InterlaceMode::Line);
        assert_eq!(out.image.to_rgba8(), before_pixels);
    }

    #[test]
    fn rotate_rejects_bad_background() {
        let step = Step::Rotate {
            angle: 45.0,
            background: Some("magenta".into()),
        };
        assert!(matches!(
            step.apply(frame(10, 10)),
            Err(TransformError::InvalidParams { .. })
        ));
    }

    #[test]
    fn validate_flags_bad_params() {
        assert!(Step::Scale { dim: [0, 10] }.validate().is_err());
        assert!(
            Step::Crop {
                start: [0, 0],
                size: [0, 1]
            }
            .validate()
            .is_err()
        );
        assert!(
            Step::RelativeResize { scale: -0.5 }.validate().is_err()
        );
        assert!(
            Step::Convert {
                format: OutputFormat::Jpeg,
                quality: Some(101)
            }
            .validate()
            .is_err()
        );
        assert!(Step::StripMetadata.validate().is_ok());
    }
}
