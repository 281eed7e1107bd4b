//! Computed difference metrics for a digest pair

use serde::{Deserialize, Serialize};

/// Pixel-level difference metrics between two decoded images.
///
/// Produced once per diff id and then cached and persisted; the record is
/// immutable after computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiffMetrics {
    /// Pixels that differ in any channel inside the compared region.
    pub num_diff_pixels: u64,

    /// `100 * num_diff_pixels / pixels-in-compared-region`, in `[0, 100]`.
    pub pixel_diff_percent: f32,

    /// Per-channel maximum absolute delta (R, G, B, A), each in `[0, 255]`.
    pub max_rgba_diffs: [u8; 4],

    /// Whether the two images have different dimensions.
    pub dim_differ: bool,

    /// Combined difference score in `[0, 1]`; see the diff algorithm.
    pub combined_metric: f32,
}

impl DiffMetrics {
    /// Metrics for two images that are identical in size and content.
    pub fn identical() -> Self {
        Self {
            num_diff_pixels: 0,
            pixel_diff_percent: 0.0,
            max_rgba_diffs: [0; 4],
            dim_differ: false,
            combined_metric: 0.0,
        }
    }
}
