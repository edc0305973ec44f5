//! Extracted-figure lookup and raster normalisation.
//!
//! The external renderer drops numbered figures into a job-local
//! `images/` directory, but the extension depends on how each raster was
//! embedded in the source. [`find_numbered`] resolves a figure number to
//! whichever candidate extension exists. [`composite_to_jpeg`] normalises
//! rasters that carry an alpha channel: transparent pixels are composited
//! onto a white background and the result is saved as a JPEG sibling, so
//! the output writer never embeds transparency.

use crate::error::JobError;
use image::{Rgb, RgbImage};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Candidate extensions, tried in order.
pub const FALLBACK_EXTENSIONS: [&str; 2] = ["png", "jpg"];

/// Resolve figure number `n` inside `dir` to an existing file, trying
/// each candidate extension in order.
pub fn find_numbered(dir: &Path, n: usize) -> Option<PathBuf> {
    for ext in FALLBACK_EXTENSIONS {
        let candidate = dir.join(format!("{n}.{ext}"));
        if candidate.is_file() {
            return Some(candidate);
        }
    }
    None
}

/// Flatten transparency: if the raster at `path` carries an alpha
/// channel, composite it onto white, write a `.jpg` sibling, and return
/// the sibling's path. Rasters without alpha are returned unchanged.
pub fn composite_to_jpeg(path: &Path) -> Result<PathBuf, JobError> {
    let img = image::open(path).map_err(|e| JobError::ImageProcessing {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })?;

    if img.color().has_alpha() {
        let rgba = img.to_rgba8();
        let mut flat = RgbImage::new(rgba.width(), rgba.height());
        for (x, y, px) in rgba.enumerate_pixels() {
            let a = px[3] as u32;
            let blend = |c: u8| -> u8 { ((c as u32 * a + 255 * (255 - a)) / 255) as u8 };
            flat.put_pixel(x, y, Rgb([blend(px[0]), blend(px[1]), blend(px[2])]));
        }
        let flattened = path.with_extension("jpg");
        flat.save(&flattened).map_err(|e| JobError::ImageProcessing {
            path: flattened.clone(),
            detail: e.to_string(),
        })?;
        debug!(src = %path.display(), dst = %flattened.display(), "flattened alpha raster");
        Ok(flattened)
    } else {
        Ok(path.to_path_buf())
    }
}
