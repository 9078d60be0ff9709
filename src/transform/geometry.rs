//! Geometric primitives: scale, crop, rotate, relative-resize.

use image::imageops::FilterType;
use image::{DynamicImage, Rgba, RgbaImage};

use super::error::TransformError;

/// Resize so the image fits entirely within `w x h`, preserving aspect
/// ratio. The constrained dimension is chosen so neither output dimension
/// exceeds the target; no cropping, no padding.
pub fn scale(image: &DynamicImage, dim: [u32; 2]) -> Result<DynamicImage, TransformError> {
    let [w, h] = dim;
    if w == 0 || h == 0 {
        return Err(TransformError::invalid("scale", "dimensions must be >= 1"));
    }
    Ok(image.resize(w, h, FilterType::Lanczos3))
}

/// Extract the rectangle `[x, y, x+w, y+h]`.
pub fn crop(
    image: &DynamicImage,
    start: [u32; 2],
    size: [u32; 2],
) -> Result<DynamicImage, TransformError> {
    let [x, y] = start;
    let [w, h] = size;
    if w == 0 || h == 0 {
        return Err(TransformError::invalid("crop", "size must be >= 1"));
    }

    let (width, height) = (image.width(), image.height());
    let fits = x
        .checked_add(w)
        .is_some_and(|right| right <= width)
        && y.checked_add(h).is_some_and(|bottom| bottom <= height);
    if !fits {
        return Err(TransformError::OutOfBounds {
            x,
            y,
            w,
            h,
            width,
            height,
        });
    }

    Ok(image.crop_imm(x, y, w, h))
}

/// Multiply both dimensions by `scale`, rounding to the nearest integer
/// with a floor of 1px.
pub fn relative_resize(
    image: &DynamicImage,
    scale: f64,
) -> Result<DynamicImage, TransformError> {
    if !scale.is_finite() || scale <= 0.0 {
        return Err(TransformError::invalid(
            "relative-resize",
            format!("scale must be a positive number, got {scale}"),
        ));
    }

    let w = ((f64::from(image.width()) * scale).round() as u32).max(1);
    let h = ((f64::from(image.height()) * scale).round() as u32).max(1);
    Ok(image.resize_exact(w, h, FilterType::Lanczos3))
}

/// Rotate clockwise about the image center.
///
/// Multiples of 90 degrees map onto the exact rotations. Other angles expand
/// the canvas to bound the rotated content and inverse-map with bilinear
/// sampling; newly exposed area is filled with `background`.
pub fn rotate(
    image: &DynamicImage,
    angle_degrees: f64,
    background: Rgba<u8>,
) -> Result<DynamicImage, TransformError> {
    if !angle_degrees.is_finite() {
        return Err(TransformError::invalid(
            "rotate",
            format!("angle must be finite, got {angle_degrees}"),
        ));
    }

    let angle = angle_degrees.rem_euclid(360.0);
    if angle == 0.0 {
        return Ok(image.clone());
    }
    if angle == 90.0 {
        return Ok(image.rotate90());
    }
    if angle == 180.0 {
        return Ok(image.rotate180());
    }
    if angle == 270.0 {
        return Ok(image.rotate270());
    }

    Ok(rotate_arbitrary(image, angle, background))
}

/// Expanded-canvas rotation with bilinear resampling.
fn rotate_arbitrary(image: &DynamicImage, angle: f64, background: Rgba<u8>) -> DynamicImage {
    let src = image.to_rgba8();
    let (w, h) = (f64::from(src.width()), f64::from(src.height()));

    let rad = angle.to_radians();
    let (sin, cos) = rad.sin_cos();

    // Canvas that bounds the rotated content.
    let out_w = (w * cos.abs() + h * sin.abs()).ceil().max(1.0) as u32;
    let out_h = (w * sin.abs() + h * cos.abs()).ceil().max(1.0) as u32;

    let (cx, cy) = (f64::from(out_w) / 2.0, f64::from(out_h) / 2.0);
    let mut out = RgbaImage::from_pixel(out_w, out_h, background);

    for oy in 0..out_h {
        for ox in 0..out_w {
            // Inverse-map the destination pixel center into source space.
            let dx = f64::from(ox) + 0.5 - cx;
            let dy = f64::from(oy) + 0.5 - cy;
            let sx = dx * cos + dy * sin + w / 2.0 - 0.5;
            let sy = -dx * sin + dy * cos + h / 2.0 - 0.5;

            if sx < -1.0 || sy < -1.0 || sx > w || sy > h {
                continue;
            }
            out.put_pixel(ox, oy, sample_bilinear(&src, sx, sy, background));
        }
    }

    DynamicImage::ImageRgba8(out)
}

/// Bilinear sample at continuous coordinates; out-of-range neighbors read
/// as `background` so edges blend instead of hard-clipping.
fn sample_bilinear(src: &RgbaImage, sx: f64, sy: f64, background: Rgba<u8>) -> Rgba<u8> {
    let x0 = sx.floor();
    let y0 = sy.floor();
    let fx = sx - x0;
    let fy = sy - y0;

    let fetch = |x: i64, y: i64| -> Rgba<u8> {
        if x < 0 || y < 0 || x >= i64::from(src.width()) || y >= i64::from(src.height()) {
            background
        } else {
            *src.get_pixel(x as u32, y as u32)
        }
    };

    let p00 = fetch(x0 as i64, y0 as i64);
    let p10 = fetch(x0 as i64 + 1, y0 as i64);
    let p01 = fetch(x0 as i64, y0 as i64 + 1);
    let p11 = fetch(x0 as i64 + 1, y0 as i64 + 1);

    let mut blended = [0u8; 4];
    for (i, channel) in blended.iter_mut().enumerate() {
        let top = f64::from(p00[i]) * (1.0 - fx) + f64::from(p10[i]) * fx;
        let bottom = f64::from(p01[i]) * (1.0 - fx) + f64::from(p11[i]) * fx;
        *channel = (top * (1.0 - fy) + bottom * fy).round().clamp(0.0, 255.0) as u8;
    }
    Rgba(blended)
}

/// Parse a rotate background color: `transparent`, `#rgb`, `#rrggbb` or
/// `#rrggbbaa`.
pub fn parse_color(value: &str) -> Result<Rgba<u8>, String> {
    if value.eq_ignore_ascii_case("transparent") {
        return Ok(Rgba([0, 0, 0, 0]));
    }

    let hex = value
        .strip_prefix('#')
        .ok_or_else(|| format!("expected `transparent` or a `#RRGGBB` color, got `{value}`"))?;

    let expand = |c: u8| -> u8 { c << 4 | c };
    let digit = |c: char| -> Result<u8, String> {
        c.to_digit(16)
            .map(|d| d as u8)
            .ok_or_else(|| format!("invalid hex digit `{c}` in `{value}`"))
    };

    let chars: Vec<char> = hex.chars().collect();
    match chars.len() {
        3 => Ok(Rgba([
            expand(digit(chars[0])?),
            expand(digit(chars[1])?),
            expand(digit(chars[2])?),
            255,
        ])),
        6 | 8 => {
            let mut bytes = [0u8; 4];
            bytes[3] = 255;
            for (i, pair) in chars.chunks(2).enumerate() {
                bytes[i] = digit(pair[0])? << 4 | digit(pair[1])?;
            }
            Ok(Rgba(bytes))
        }
        _ => Err(format!("expected 3, 6 or 8 hex digits, got `{value}`")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;

    fn solid(w: u32, h: u32) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(w, h, Rgba([50, 100, 150, 255])))
    }

    #[test]
    fn scale_fits_within_bounds() {
        let out = scale(&solid(600, 400), [300, 200]).unwrap();
        assert_eq!((out.width(), out.height()), (300, 200));
    }

    #[test]
    fn scale_square_is_height_constrained() {
        let out = scale(&solid(600, 600), [300, 200]).unwrap();
        assert_eq!((out.width(), out.height()), (200, 200));
    }

    #[test]
    fn scale_rejects_zero_dimension() {
        assert!(matches!(
            scale(&solid(10, 10), [0, 5]),
            Err(TransformError::InvalidParams { .. })
        ));
    }

    #[test]
    fn crop_extracts_rectangle() {
        let out = crop(&solid(500, 500), [0, 0], [100, 100]).unwrap();
        assert_eq!((out.width(), out.height()), (100, 100));
    }

    #[test]
    fn crop_out_of_bounds_fails() {
        assert!(matches!(
            crop(&solid(500, 500), [450, 0], [100, 100]),
            Err(TransformError::OutOfBounds { .. })
        ));
        // Overflowing start offsets must not wrap around.
        assert!(matches!(
            crop(&solid(500, 500), [u32::MAX, 0], [2, 2]),
            Err(TransformError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn relative_resize_halves_exactly() {
        let out = relative_resize(&solid(1000, 800), 0.5).unwrap();
        assert_eq!((out.width(), out.height()), (500, 400));
    }

    #[test]
    fn relative_resize_floors_at_one_pixel() {
        let out = relative_resize(&solid(4, 4), 0.01).unwrap();
        assert_eq!((out.width(), out.height()), (1, 1));
    }

    #[test]
    fn relative_resize_rejects_non_positive_scale() {
        for bad in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert!(relative_resize(&solid(10, 10), bad).is_err());
        }
    }

    #[test]
    fn rotate_quarter_turn_swaps_dimensions() {
        let out = rotate(&solid(30, 20), 90.0, Rgba([0, 0, 0, 0])).unwrap();
        assert_eq!((out.width(), out.height()), (20, 30));
    }

    #[test]
    fn rotate_normalizes_negative_angles() {
        let out = rotate(&solid(30, 20), -270.0, Rgba([0, 0, 0, 0])).unwrap();
        assert_eq!((out.width(), out.height()), (20, 30));
    }

    #[test]
    fn rotate_expands_canvas_for_odd_angles() {
        let out = rotate(&solid(100, 100), 45.0, Rgba([0, 0, 0, 0])).unwrap();
        // 100 * (cos45 + sin45) ~ 141.4, ceiled.
        assert_eq!((out.width(), out.height()), (142, 142));

        // Exposed corners are filled with the transparent background.
        let rgba = out.to_rgba8();
        assert_eq!(rgba.get_pixel(0, 0)[3], 0);
        // The center still holds rotated content.
        assert_eq!(rgba.get_pixel(71, 71)[3], 255);
    }

    #[test]
    fn rotate_fills_with_configured_background() {
        let out = rotate(&solid(40, 40), 30.0, Rgba([255, 0, 0, 255])).unwrap();
        let rgba = out.to_rgba8();
        assert_eq!(*rgba.get_pixel(0, 0), Rgba([255, 0, 0, 255]));
    }

    #[test]
    fn parse_color_variants() {
        assert_eq!(parse_color("transparent").unwrap(), Rgba([0, 0, 0, 0]));
        assert_eq!(parse_color("#fff").unwrap(), Rgba([255, 255, 255, 255]));
        assert_eq!(parse_color("#102030").unwrap(), Rgba([16, 32, 48, 255]));
        assert_eq!(parse_color("#10203040").unwrap(), Rgba([16, 32, 48, 64]));
        assert!(parse_color("red").is_err());
        assert!(parse_color("#12345").is_err());
        assert!(parse_color("#gg0000").is_err());
    }
}
