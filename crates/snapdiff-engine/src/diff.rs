//! The pixel diff algorithm and diff visualization

use image::{Rgba, RgbaImage};
use snapdiff_types::DiffMetrics;

/// Color used for differing pixels in rendered diffs. Pixels outside the
/// common region count as differing too.
const DIFF_HIGHLIGHT: Rgba<u8> = Rgba([228, 26, 28, 255]);

/// Compute difference metrics for two decoded images.
///
/// Comparison covers the top-left `min(width) x min(height)` region;
/// pixels outside it are not counted as differing (the dimension mismatch
/// is reported separately through `dim_differ`).
pub fn diff_metrics(left: &RgbaImage, right: &RgbaImage) -> DiffMetrics {
    let dim_differ = left.dimensions() != right.dimensions();
    let width = left.width().min(right.width());
    let height = left.height().min(right.height());

    let mut num_diff_pixels = 0u64;
    let mut max_rgba_diffs = [0u8; 4];
    for y in 0..height {
        for x in 0..width {
            let p = left.get_pixel(x, y).0;
            let q = right.get_pixel(x, y).0;
            if p != q {
                num_diff_pixels += 1;
                for channel in 0..4 {
                    max_rgba_diffs[channel] =
                        max_rgba_diffs[channel].max(p[channel].abs_diff(q[channel]));
                }
            }
        }
    }

    let region = u64::from(width) * u64::from(height);
    let pixel_diff_percent = if region > 0 {
        100.0 * num_diff_pixels as f32 / region as f32
    } else {
        0.0
    };

    DiffMetrics {
        num_diff_pixels,
        pixel_diff_percent,
        max_rgba_diffs,
        dim_differ,
        combined_metric: combined_metric(pixel_diff_percent, max_rgba_diffs, dim_differ),
    }
}

/// Combined difference score in `[0, 1]`.
///
/// All-zero channel deltas with mismatched dimensions means the common
/// region is identical but the images are not the same image; that scores
/// a full 1.0. Otherwise the score is the geometric mean of the
/// diff-pixel fraction and the normalized RMS of the channel maxima.
pub fn combined_metric(pixel_diff_percent: f32, max_rgba_diffs: [u8; 4], dim_differ: bool) -> f32 {
    if max_rgba_diffs == [0; 4] {
        return if dim_differ { 1.0 } else { 0.0 };
    }
    let sum_sq: f32 = max_rgba_diffs
        .iter()
        .map(|&c| f32::from(c) * f32::from(c))
        .sum();
    let rms = (sum_sq / 4.0).sqrt() / 255.0;
    ((pixel_diff_percent / 100.0) * rms).sqrt().clamp(0.0, 1.0)
}

/// Render a visualization of the differences between two images.
///
/// The output covers `max(width) x max(height)`. Identical pixels show a
/// desaturated copy of the left image; differing pixels, and pixels
/// outside the common region, show the highlight color.
pub fn render_diff(left: &RgbaImage, right: &RgbaImage) -> RgbaImage {
    let width = left.width().max(right.width());
    let height = left.height().max(right.height());
    let common_width = left.width().min(right.width());
    let common_height = left.height().min(right.height());

    RgbaImage::from_fn(width, height, |x, y| {
        if x < common_width && y < common_height {
            let p = *left.get_pixel(x, y);
            if p == *right.get_pixel(x, y) {
                return desaturate(p);
            }
        }
        DIFF_HIGHLIGHT
    })
}

fn desaturate(pixel: Rgba<u8>) -> Rgba<u8> {
    // Integer Rec. 601 luma.
    let [r, g, b, a] = pixel.0;
    let luma = ((299 * u32::from(r) + 587 * u32::from(g) + 114 * u32::from(b)) / 1000) as u8;
    Rgba([luma, luma, luma, a])
}
