//! Pixel-sampling color detection over a low-resolution raster.
//!
//! Used by the full analysis path while the file is small enough that
//! rasterizing each page is affordable. The page is rendered at a small
//! scale by the injected [`PageRasterizer`] and pixels are sampled at a
//! stride sized for roughly 4,000 samples regardless of page resolution.
//! Near-white, near-black and near-transparent samples are skipped:
//! anti-aliasing and scan noise on a technically grayscale page would
//! otherwise register spurious channel divergence.

use super::{ColorDetector, PageHandle, PageRasterizer, Pixmap};
use crate::error::AnalysisError;

/// Render scale used for sampling rasters
pub const RENDER_SCALE: f32 = 0.3;

const TARGET_SAMPLES: usize = 4000;
const MIN_STRIDE: usize = 50;
/// All channels strictly above this is near-white
const NEAR_WHITE: u8 = 245;
/// All channels strictly below this is near-black
const NEAR_BLACK: u8 = 10;
/// Alpha below this is near-transparent
const MIN_ALPHA: u8 = 128;
/// Channel spread must strictly exceed this to count as chromatic
const DIVERGENCE_THRESHOLD: u8 = 15;
/// More than this many chromatic samples classifies the page as color
const CHROMATIC_SAMPLE_LIMIT: usize = 3;

/// Raster-sampling color detector
pub struct PixelSamplingDetector<'a> {
    rasterizer: &'a dyn PageRasterizer,
}

impl<'a> PixelSamplingDetector<'a> {
    pub fn new(rasterizer: &'a dyn PageRasterizer) -> Self {
        Self { rasterizer }
    }
}

impl ColorDetector for PixelSamplingDetector<'_> {
    fn classify(&self, page: &PageHandle<'_>) -> Result<bool, AnalysisError> {
        let pixmap = self.rasterizer.rasterize(page.number, RENDER_SCALE)?;
        let is_color = sample_pixmap(&pixmap);
        // pixmap drops here, before the caller moves to the next page
        Ok(is_color)
    }
}

fn sample_pixmap(pixmap: &Pixmap) -> bool {
    let pixel_count = pixmap.pixel_count();
    if pixel_count == 0 || pixmap.pixels.len() < pixel_count * 4 {
        return false;
    }
    let stride = (pixel_count / TARGET_SAMPLES).max(MIN_STRIDE);
    let mut chromatic_samples = 0usize;
    let mut index = 0usize;
    while index < pixel_count {
        let offset = index * 4;
        let red = pixmap.pixels[offset];
        let green = pixmap.pixels[offset + 1];
        let blue = pixmap.pixels[offset + 2];
        let alpha = pixmap.pixels[offset + 3];
        if sample_is_usable(red, green, blue, alpha) {
            let max = red.max(green).max(blue);
            let min = red.min(green).min(blue);
            if max - min > DIVERGENCE_THRESHOLD {
                chromatic_samples += 1;
                if chromatic_samples > CHROMATIC_SAMPLE_LIMIT {
                    // Early exit: no point sampling the rest of the page
                    return true;
                }
            }
        }
        index += stride;
    }
    false
}

fn sample_is_usable(red: u8, green: u8, blue: u8, alpha: u8) -> bool {
    if alpha < MIN_ALPHA {
        return false;
    }
    if red > NEAR_WHITE && green > NEAR_WHITE && blue > NEAR_WHITE {
        return false;
    }
    if red < NEAR_BLACK && green < NEAR_BLACK && blue < NEAR_BLACK {
        return false;
    }
    true
}
