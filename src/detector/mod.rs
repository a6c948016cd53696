//! Color detection for PDF pages.
//!
//! Three interchangeable strategies decide whether a page prints in color:
//! structural resource-dictionary inspection (no rendering), pixel sampling
//! over a low-resolution raster, and operator-stream scanning (no
//! execution). The analyzer picks one per document via
//! [`DetectionStrategy::select`]; all three sit behind the same
//! [`ColorDetector`] trait.

use lopdf::{Document, Object, ObjectId};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::AnalyzerConfig;
use crate::error::AnalysisError;
use crate::geometry;

pub mod operators;
pub mod pixels;
pub mod structural;

pub use self::operators::OperatorScanDetector;
pub use self::pixels::PixelSamplingDetector;
pub use self::structural::StructuralDetector;

/// Borrowed view of one page inside an open document
pub struct PageHandle<'a> {
    pub doc: &'a Document,
    pub id: ObjectId,
    pub number: u32,
}

/// Capability interface for color classification of a single page
pub trait ColorDetector {
    fn classify(&self, page: &PageHandle<'_>) -> Result<bool, AnalysisError>;
}

/// Applies a detector with the conservative-default policy: any failure is
/// logged and classified as not-color, so uncertainty never overcharges the
/// customer. Every call site goes through here so the assume-B&W rule lives
/// in one place.
pub fn classify_or_default(detector: &dyn ColorDetector, page: &PageHandle<'_>) -> bool {
    match detector.classify(page) {
        Ok(is_color) => is_color,
        Err(err) => {
            warn!(page = page.number, %err, "page color inspection failed, assuming B&W");
            false
        }
    }
}

/// How a document is being analyzed.
///
/// `Quick` is the trusted backend path: full object access, no rasterizer,
/// and a stricter oversize cutoff (tabloid height). `Full` is the
/// rendering-capable path and permits pages up to the press width. The two
/// cutoffs are intentionally different; see `geometry`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisMode {
    Quick,
    Full,
}

impl AnalysisMode {
    pub fn oversize_limit_pt(self) -> f64 {
        match self {
            AnalysisMode::Quick => geometry::TABLOID_HEIGHT_PT,
            AnalysisMode::Full => geometry::MAX_PRESS_WIDTH_PT,
        }
    }
}

/// The color-detection strategy chosen for a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionStrategy {
    Structural,
    PixelSampling,
    OperatorScan,
}

impl DetectionStrategy {
    /// Strategy-selection policy: quick analysis always inspects structure
    /// (it never rasterizes); full analysis samples pixels while the file is
    /// small enough to render affordably and falls back to operator
    /// scanning above the ceiling or when no rasterizer was injected.
    pub fn select(
        mode: AnalysisMode,
        file_size: u64,
        config: &AnalyzerConfig,
        rasterizer_available: bool,
    ) -> Self {
        match mode {
            AnalysisMode::Quick => DetectionStrategy::Structural,
            AnalysisMode::Full => {
                if file_size < config.pixel_sampling_ceiling_bytes && rasterizer_available {
                    DetectionStrategy::PixelSampling
                } else {
                    DetectionStrategy::OperatorScan
                }
            }
        }
    }
}

/// Low-resolution RGBA8 raster of one page, row-major, 4 bytes per pixel.
/// Produced per page and dropped before the next page is rendered to keep
/// peak memory bounded.
pub struct Pixmap {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl Pixmap {
    pub fn pixel_count(&self) -> usize {
        (self.width as usize) * (self.height as usize)
    }
}

/// Rendering capability supplied by a collaborator. The quoting core never
/// rasterizes on its own; the pixel-sampling detector consumes whatever
/// renderer the embedding context injects.
pub trait PageRasterizer: Send + Sync {
    fn rasterize(&self, page_number: u32, scale: f32) -> Result<Pixmap, AnalysisError>;
}

/// Follows reference chains to the underlying object, depth-limited so a
/// cyclic document cannot hang analysis.
pub(crate) fn resolve<'a>(doc: &'a Document, mut object: &'a Object) -> &'a Object {
    for _ in 0..16 {
        match object {
            Object::Reference(id) => match doc.get_object(*id) {
                Ok(inner) => object = inner,
                Err(_) => return object,
            },
            _ => return object,
        }
    }
    object
}

/// Looks up a page attribute that may be inherited from an ancestor Pages
/// node (MediaBox, Resources). Walks the Parent chain with a depth limit.
pub(crate) fn inherited_page_attribute<'a>(
    doc: &'a Document,
    page_id: ObjectId,
    key: &[u8],
) -> Option<&'a Object> {
    let mut dict = doc.get_object(page_id).ok()?.as_dict().ok()?;
    for _ in 0..32 {
        if let Ok(value) = dict.get(key) {
            return Some(resolve(doc, value));
        }
        let parent = dict.get(b"Parent").ok()?;
        dict = resolve(doc, parent).as_dict().ok()?;
    }
    None
}

/// Numeric operand helper: lopdf integers and reals both read as f64
pub(crate) fn as_number(object: &Object) -> Option<f64> {
    match object {
        Object::Integer(value) => Some(*value as f64),
        Object::Real(value) => Some(*value as f64),
        _ => None,
    }
}
