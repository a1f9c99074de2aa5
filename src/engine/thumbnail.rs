//! JPEG previews for image files.

use image::DynamicImage;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use std::path::Path;

use super::tools::is_image_path;
use crate::error::{CatalogError, Result};
use crate::utils::config::ThumbnailConsts;

/// Decode `path`, fit it within 256x256 (aspect kept, Lanczos3, no upscaling) and re-encode as JPEG.
/// Returns an empty blob for paths that are not jpg/jpeg/png.
pub fn try_generate_thumbnail(path: &Path) -> Result<Vec<u8>> {
    if !is_image_path(path) {
        return Ok(Vec::new());
    }
    let decode_err = |source| CatalogError::Decode {
        path: path.to_path_buf(),
        source,
    };
    let img = image::open(path).map_err(decode_err)?;
    let max = ThumbnailConsts::MAX_DIM;
    let fitted = if img.width() > max || img.height() > max {
        img.resize(max, max, FilterType::Lanczos3)
    } else {
        img
    };
    // JPEG has no alpha channel.
    let rgb = DynamicImage::ImageRgb8(fitted.to_rgb8());
    let mut blob = Vec::new();
    rgb.write_with_encoder(JpegEncoder::new_with_quality(
        &mut blob,
        ThumbnailConsts::JPEG_QUALITY,
    ))
    .map_err(decode_err)?;
    Ok(blob)
}

/// Same as [`try_generate_thumbnail`], but a decode/encode failure degrades to an empty blob.
pub fn generate_thumbnail(path: &Path) -> Vec<u8> {
    match try_generate_thumbnail(path) {
        Ok(blob) => blob,
        Err(e) => {
            log::debug!("{}", e);
            Vec::new()
        }
    }
}
