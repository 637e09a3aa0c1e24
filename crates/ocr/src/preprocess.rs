//! Line image normalization
//!
//! Converts an arbitrary image into the `(1, 1, H, W)` grayscale tensor the
//! encoder was trained on. The exact steps matter for model compatibility:
//!
//! 1. Resize to height `H` keeping the aspect ratio (bicubic).
//! 2. Blend onto a white `W x H` canvas, left offset `floor((W - w) / 2)`.
//!    Lines wider than `W` are squeezed to `W` by a second resize.
//!    Transparent areas end up white.
//! 3. Luma `0.299 R + 0.587 G + 0.114 B`, scaled to `[0, 1]`.
//! 4. `(gray - 0.5) / 0.5`, so white is `+1.0` and black is `-1.0`.

use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgb, RgbImage, Rgba, RgbaImage};
use ndarray::Array4;

/// Default model input height
pub const DEFAULT_HEIGHT: u32 = 32;
/// Default model input width
pub const DEFAULT_WIDTH: u32 = 640;

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
const OPAQUE_WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
const RESIZE_FILTER: FilterType = FilterType::CatmullRom;

/// Width of a `src_width x src_height` image scaled to `height`, at least 1
#[must_use]
pub fn scaled_width(src_width: u32, src_height: u32, height: u32) -> u32 {
    let scale = f64::from(height) / f64::from(src_height.max(1));
    let width = (f64::from(src_width) * scale).round();
    (width as u32).max(1)
}

/// Compose the white `width x height` canvas holding the resized line
///
/// Transparent pixels are blended onto the white background. Exposed
/// separately from [`normalize_image`] for debugging output.
#[must_use]
pub fn letterbox(image: &DynamicImage, height: u32, width: u32) -> RgbImage {
    let (src_width, src_height) = (image.width(), image.height());
    if src_width == 0 || src_height == 0 {
        // Nothing to draw
        return RgbImage::from_pixel(width, height, WHITE);
    }

    let mut canvas = RgbaImage::from_pixel(width, height, OPAQUE_WHITE);
    let rgba = image.to_rgba8();
    let new_width = scaled_width(src_width, src_height, height);
    let resized = imageops::resize(&rgba, new_width, height, RESIZE_FILTER);

    if new_width == width {
        imageops::overlay(&mut canvas, &resized, 0, 0);
    } else if new_width < width {
        let left = (width - new_width) / 2;
        imageops::overlay(&mut canvas, &resized, i64::from(left), 0);
    } else {
        let squeezed = imageops::resize(&resized, width, height, RESIZE_FILTER);
        imageops::overlay(&mut canvas, &squeezed, 0, 0);
    }

    // Every canvas pixel is opaque after blending
    DynamicImage::ImageRgba8(canvas).to_rgb8()
}

/// Normalize a line image into a `(1, 1, height, width)` tensor
///
/// The backing storage is row-major, so `as_slice()` yields the `height * width`
/// intensities in model order.
#[must_use]
pub fn normalize_image(image: &DynamicImage, height: u32, width: u32) -> Array4<f32> {
    let canvas = letterbox(image, height, width);
    let mut tensor = Array4::<f32>::zeros((1, 1, height as usize, width as usize));

    for (x, y, pixel) in canvas.enumerate_pixels() {
        tensor[[0, 0, y as usize, x as usize]] = normalize_pixel(pixel);
    }

    tensor
}

#[inline]
fn normalize_pixel(pixel: &Rgb<u8>) -> f32 {
    let [r, g, b] = pixel.0;
    let gray = (0.299 * f32::from(r) + 0.587 * f32::from(g) + 0.114 * f32::from(b)) / 255.0;
    (gray - 0.5) / 0.5
}

/// Map a normalized tensor back to an 8-bit grayscale image
#[must_use]
pub fn tensor_to_luma(tensor: &Array4<f32>) -> image::GrayImage {
    let (_, _, height, width) = tensor.dim();
    image::GrayImage::from_fn(width as u32, height as u32, |x, y| {
        let value = tensor[[0, 0, y as usize, x as usize]];
        let gray = ((value * 0.5 + 0.5) * 255.0).round().clamp(0.0, 255.0);
        image::Luma([gray as u8])
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    fn solid(width: u32, height: u32, value: u8) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([value; 3])))
    }

    fn column(tensor: &Array4<f32>, x: usize) -> Vec<f32> {
        (0..tensor.dim().2).map(|y| tensor[[0, 0, y, x]]).collect()
    }

    fn is_white_column(tensor: &Array4<f32>, x: usize) -> bool {
        column(tensor, x).iter().all(|v| (v - 1.0).abs() < EPS)
    }

    fn is_black_column(tensor: &Array4<f32>, x: usize) -> bool {
        column(tensor, x).iter().all(|v| (v + 1.0).abs() < EPS)
    }

    #[test]
    fn test_scaled_width() {
        assert_eq!(scaled_width(200, 64, 32), 100);
        assert_eq!(scaled_width(3, 2, 32), 48);
        assert_eq!(scaled_width(1, 1000, 32), 1);
        assert_eq!(scaled_width(0, 10, 32), 1);
        // zero height is treated as height 1
        assert_eq!(scaled_width(5, 0, 32), 160);
    }

    #[test]
    fn test_output_shape_and_length() {
        let tensor = normalize_image(&solid(50, 20, 0), DEFAULT_HEIGHT, DEFAULT_WIDTH);
        assert_eq!(tensor.dim(), (1, 1, 32, 640));
        assert_eq!(tensor.as_slice().unwrap().len(), 32 * 640);
    }

    #[test]
    fn test_pixel_normalization_constants() {
        assert!((normalize_pixel(&Rgb([255, 255, 255])) - 1.0).abs() < EPS);
        assert!((normalize_pixel(&Rgb([0, 0, 0])) + 1.0).abs() < EPS);
        let red = (0.299 - 0.5) / 0.5;
        assert!((normalize_pixel(&Rgb([255, 0, 0])) - red).abs() < EPS);
    }

    #[test]
    fn test_even_padding_is_centered() {
        // 20x32 black -> stays 20 wide, 20 white columns on each side of a 60-wide canvas
        let tensor = normalize_image(&solid(20, 32, 0), 32, 60);
        for x in 0..20 {
            assert!(is_white_column(&tensor, x), "column {x} should be padding");
        }
        for x in 20..40 {
            assert!(is_black_column(&tensor, x), "column {x} should be content");
        }
        for x in 40..60 {
            assert!(is_white_column(&tensor, x), "column {x} should be padding");
        }
    }

    #[test]
    fn test_odd_padding_remainder_goes_right() {
        // d = 61 - 20 = 41 -> 20 on the left, 21 on the right
        let tensor = normalize_image(&solid(20, 32, 0), 32, 61);
        for x in 0..20 {
            assert!(is_white_column(&tensor, x));
        }
        assert!(is_black_column(&tensor, 20));
        assert!(is_black_column(&tensor, 39));
        for x in 40..61 {
            assert!(is_white_column(&tensor, x));
        }
    }

    #[test]
    fn test_exact_width_has_no_padding() {
        let tensor = normalize_image(&solid(128, 64, 0), 32, 64);
        for x in 0..64 {
            assert!(is_black_column(&tensor, x));
        }
    }

    #[test]
    fn test_wide_line_is_squeezed_to_fill_canvas() {
        // 400x16 -> 800x32 after height scaling, then forced to 640x32
        let tensor = normalize_image(&solid(400, 16, 0), DEFAULT_HEIGHT, DEFAULT_WIDTH);
        assert_eq!(tensor.dim(), (1, 1, 32, 640));
        assert!(tensor.iter().all(|v| (v + 1.0).abs() < EPS));
    }

    #[test]
    fn test_wide_line_keeps_left_to_right_order() {
        // left half black, right half white, twice as wide as the canvas
        let img = RgbImage::from_fn(256, 32, |x, _| {
            if x < 128 {
                Rgb([0, 0, 0])
            } else {
                Rgb([255, 255, 255])
            }
        });
        let tensor = normalize_image(&DynamicImage::ImageRgb8(img), 32, 128);
        assert!(is_black_column(&tensor, 10));
        assert!(is_white_column(&tensor, 117));
    }

    #[test]
    fn test_degenerate_geometry_yields_white_tensor() {
        let empty = DynamicImage::ImageRgb8(RgbImage::new(0, 0));
        let tensor = normalize_image(&empty, 32, 64);
        assert_eq!(tensor.dim(), (1, 1, 32, 64));
        assert!(tensor.iter().all(|v| (v - 1.0).abs() < EPS));

        let flat = DynamicImage::ImageRgb8(RgbImage::new(10, 0));
        assert!(normalize_image(&flat, 32, 64)
            .iter()
            .all(|v| (v - 1.0).abs() < EPS));
    }

    #[test]
    fn test_transparent_background_blends_to_white() {
        // Black stroke on a fully transparent background
        let img = RgbaImage::from_fn(64, 32, |x, _| {
            if (28..36).contains(&x) {
                Rgba([0, 0, 0, 255])
            } else {
                Rgba([0, 0, 0, 0])
            }
        });
        let tensor = normalize_image(&DynamicImage::ImageRgba8(img), 32, 64);

        assert!(is_white_column(&tensor, 0));
        assert!(is_white_column(&tensor, 10));
        assert!(is_white_column(&tensor, 63));
        assert!(is_black_column(&tensor, 32));
    }

    #[test]
    fn test_half_transparent_black_is_mid_gray() {
        let img = RgbaImage::from_pixel(32, 32, Rgba([0, 0, 0, 128]));
        let tensor = normalize_image(&DynamicImage::ImageRgba8(img), 32, 32);
        // 255 * (1 - 128/255) = 127 -> (127/255 - 0.5) / 0.5
        let expected = (127.0 / 255.0 - 0.5) / 0.5;
        assert!(tensor.iter().all(|v| (v - expected).abs() < 0.02));
    }

    #[test]
    fn test_tensor_to_luma_round_trips_extremes() {
        let tensor = normalize_image(&solid(10, 32, 0), 32, 30);
        let luma = tensor_to_luma(&tensor);
        assert_eq!(luma.dimensions(), (30, 32));
        assert_eq!(luma.get_pixel(0, 0).0, [255]);
        assert_eq!(luma.get_pixel(15, 16).0, [0]);
    }
}
