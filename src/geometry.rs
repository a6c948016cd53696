//! Page geometry classification: standard, fold-out, or oversized.

use serde::{Deserialize, Serialize};

/// Long edge of a US Letter page in points (1 pt = 1/72 in)
pub const LETTER_HEIGHT_PT: f64 = 792.0;

/// Slack applied to every geometry threshold; a page exactly at
/// threshold + tolerance is NOT flagged, only strictly greater is.
pub const SIZE_TOLERANCE_PT: f64 = 10.0;

/// Oversize cutoff used by the quick (server-side) analysis path: anything
/// past tabloid height. Deliberately stricter than [`MAX_PRESS_WIDTH_PT`];
/// the two paths apply distinct limits and must stay distinct.
pub const TABLOID_HEIGHT_PT: f64 = 1224.0;

/// Oversize cutoff used by the full analysis path: the large-format press
/// handles up to 36 in before a page becomes unprintable.
pub const MAX_PRESS_WIDTH_PT: f64 = 2592.0;

/// Geometry verdict for one page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageGeometry {
    pub is_foldout: bool,
    pub is_oversized: bool,
}

/// Classifies a page by its dimensions in points.
///
/// `oversize_limit_pt` is supplied by the caller because the quick and full
/// analysis paths use different cutoffs (tabloid height vs. press width).
pub fn classify(width_pt: f64, height_pt: f64, oversize_limit_pt: f64) -> PageGeometry {
    let long_edge = width_pt.max(height_pt);
    PageGeometry {
        is_foldout: long_edge > LETTER_HEIGHT_PT + SIZE_TOLERANCE_PT,
        is_oversized: long_edge > oversize_limit_pt + SIZE_TOLERANCE_PT,
    }
}
