//! PNG decoding and encoding helpers
//!
//! Both directions run on blocking threads; pixel work must not stall the
//! request executor.

use crate::error::{Error, Result};
use bytes::Bytes;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{ImageEncoder, ImageFormat, RgbaImage};
use snapdiff_types::Digest;
use std::sync::Arc;

/// Decode PNG bytes into a non-premultiplied RGBA buffer.
pub async fn decode_png(digest: &Digest, data: Bytes) -> Result<Arc<RgbaImage>> {
    let digest = digest.clone();
    tokio::task::spawn_blocking(move || {
        image::load_from_memory_with_format(&data, ImageFormat::Png)
            .map(|decoded| Arc::new(decoded.into_rgba8()))
            .map_err(|e| Error::decode(digest.as_str(), e.to_string()))
    })
    .await
    .map_err(|e| Error::task(e.to_string()))?
}

/// Encode an RGBA buffer as PNG at the fastest compression level.
///
/// Used for rendered diff images, which are regenerated per request, so
/// encode speed wins over output size.
pub fn encode_png_fast(image: &RgbaImage) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    let encoder = PngEncoder::new_with_quality(&mut out, CompressionType::Fast, FilterType::Adaptive);
    encoder.write_image(
        image.as_raw(),
        image.width(),
        image.height(),
        image::ExtendedColorType::Rgba8,
    )?;
    Ok(out)
}
