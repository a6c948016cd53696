//! Document analyzer: orchestrates per-page geometry and color
//! classification and aggregates the result for pricing.
//!
//! One document is analyzed strictly page by page, releasing each page's
//! raster or content stream before the next page starts so peak memory
//! stays bounded on multi-hundred-page uploads. Independent documents
//! share no state and run concurrently up to the configured admission
//! limit.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use lopdf::{Document, ObjectId};
use tokio::sync::Semaphore;
use tracing::{debug, info, instrument, warn};

use crate::config::AnalyzerConfig;
use crate::detector::{
    as_number, classify_or_default, inherited_page_attribute, resolve, AnalysisMode,
    DetectionStrategy, OperatorScanDetector, PageHandle, PageRasterizer, PixelSamplingDetector,
    StructuralDetector,
};
use crate::error::{AnalysisError, Result};
use crate::geometry;
use crate::types::{AnalysisResult, LargeFormatPage, PageRecord};

/// Letter dimensions assumed when a page has no usable MediaBox
const FALLBACK_WIDTH_PT: f64 = 612.0;
const FALLBACK_HEIGHT_PT: f64 = 792.0;

/// Analysis capability as seen by upload-handling collaborators, kept as a
/// trait so callers can substitute a stub in their own tests
#[async_trait]
pub trait Analyze: Send + Sync {
    async fn analyze(&self, data: &[u8], mode: AnalysisMode) -> Result<AnalysisResult>;
}

/// Analyzes uploaded documents into [`AnalysisResult`]s
pub struct DocumentAnalyzer {
    config: AnalyzerConfig,
    semaphore: Arc<Semaphore>,
    rasterizer: Option<Arc<dyn PageRasterizer>>,
}

impl DocumentAnalyzer {
    pub fn new(config: AnalyzerConfig) -> Self {
        let semaphore = Arc::new(Semaphore::new(config.max_concurrent_analyses));
        Self {
            config,
            semaphore,
            rasterizer: None,
        }
    }

    /// Injects the rendering capability the pixel-sampling strategy needs.
    /// Without one, full analysis falls back to operator scanning.
    pub fn with_rasterizer(mut self, rasterizer: Arc<dyn PageRasterizer>) -> Self {
        self.rasterizer = Some(rasterizer);
        self
    }

    /// Analyzes raw file bytes.
    ///
    /// Fails only at the document level (size reject, unparsable file);
    /// callers are expected to fall back to [`AnalysisResult::unknown`]
    /// rather than block the order. Individual page failures degrade that
    /// page to the conservative default and analysis continues.
    #[instrument(skip(self, data), fields(size = data.len()))]
    pub async fn analyze(&self, data: &[u8], mode: AnalysisMode) -> Result<AnalysisResult> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|err| AnalysisError::QueueClosed(err.to_string()))?;
        let start = Instant::now();

        let size = data.len() as u64;
        if size > self.config.max_file_bytes {
            return Err(AnalysisError::FileTooLarge {
                size,
                limit: self.config.max_file_bytes,
            }
            .into());
        }

        let strategy =
            DetectionStrategy::select(mode, size, &self.config, self.rasterizer.is_some());
        debug!(?mode, ?strategy, "strategy selected");

        let doc = Document::load_mem(data)
            .map_err(|err| AnalysisError::UnparsableDocument(err.to_string()))?;
        let result = self.analyze_document(&doc, mode, strategy);

        info!(
            pages = result.total_pages,
            color_pages = result.color_pages,
            foldout_pages = result.foldout_pages,
            oversized = result.has_oversized_pages,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "document analyzed"
        );
        Ok(result)
    }

    fn analyze_document(
        &self,
        doc: &Document,
        mode: AnalysisMode,
        strategy: DetectionStrategy,
    ) -> AnalysisResult {
        let oversize_limit_pt = mode.oversize_limit_pt();
        let mut pages = Vec::new();
        let mut oversized_page_numbers = BTreeSet::new();
        let mut large_format_pages = Vec::new();

        for (&number, &page_id) in doc.get_pages().iter() {
            let (width_pt, height_pt) = match page_dimensions(doc, page_id) {
                Some(dimensions) => dimensions,
                None => {
                    // Degraded page: assume letter, so it prices as standard
                    warn!(page = number, "no usable MediaBox, assuming letter size");
                    (FALLBACK_WIDTH_PT, FALLBACK_HEIGHT_PT)
                }
            };
            let page_geometry = geometry::classify(width_pt, height_pt, oversize_limit_pt);

            let handle = PageHandle {
                doc,
                id: page_id,
                number,
            };
            let is_color = self.classify_page(strategy, &handle);

            if page_geometry.is_oversized {
                oversized_page_numbers.insert(number);
            }
            if page_geometry.is_foldout {
                large_format_pages.push(LargeFormatPage {
                    number,
                    width_in: width_pt / 72.0,
                    height_in: height_pt / 72.0,
                    is_color,
                });
            }
            pages.push(PageRecord {
                number,
                width_pt,
                height_pt,
                is_color,
                is_foldout: page_geometry.is_foldout,
            });
        }

        AnalysisResult::from_pages(pages, oversized_page_numbers, large_format_pages, strategy)
    }

    /// Runs the selected detector through the conservative-default wrapper.
    /// Per-page rendering resources live only for the duration of this call.
    fn classify_page(&self, strategy: DetectionStrategy, handle: &PageHandle<'_>) -> bool {
        match strategy {
            DetectionStrategy::Structural => classify_or_default(&StructuralDetector, handle),
            DetectionStrategy::OperatorScan => classify_or_default(&OperatorScanDetector, handle),
            DetectionStrategy::PixelSampling => match self.rasterizer.as_deref() {
                Some(rasterizer) => {
                    let detector = PixelSamplingDetector::new(rasterizer);
                    classify_or_default(&detector, handle)
                }
                // Selection never picks pixel sampling without a
                // rasterizer, but a detector must still answer
                None => classify_or_default(&OperatorScanDetector, handle),
            },
        }
    }
}

#[async_trait]
impl Analyze for DocumentAnalyzer {
    async fn analyze(&self, data: &[u8], mode: AnalysisMode) -> Result<AnalysisResult> {
        DocumentAnalyzer::analyze(self, data, mode).await
    }
}

/// Page dimensions from the (possibly inherited) MediaBox
fn page_dimensions(doc: &Document, page_id: ObjectId) -> Option<(f64, f64)> {
    let media_box = inherited_page_attribute(doc, page_id, b"MediaBox")?
        .as_array()
        .ok()?;
    if media_box.len() < 4 {
        return None;
    }
    let mut corners = [0.0f64; 4];
    for (slot, object) in corners.iter_mut().zip(media_box.iter()) {
        *slot = as_number(resolve(doc, object))?;
    }
    let width = (corners[2] - corners[0]).abs();
    let height = (corners[3] - corners[1]).abs();
    if width <= 0.0 || height <= 0.0 {
        return None;
    }
    Some((width, height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{dictionary, Object};

    fn name(value: &[u8]) -> Object {
        Object::Name(value.to_vec())
    }

    /// Builds a document whose pages have the given (width, height,
    /// chromatic) triples; chromatic pages declare DeviceRGB in their
    /// resources so the structural detector sees them.
    fn build_pdf(pages: &[(f64, f64, bool)]) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let mut kids = Vec::new();
        for &(width, height, chromatic) in pages {
            let space = if chromatic {
                name(b"DeviceRGB")
            } else {
                name(b"DeviceGray")
            };
            let page_id = doc.add_object(dictionary! {
                "Type" => name(b"Page"),
                "Parent" => Object::Reference(pages_id),
                "MediaBox" => vec![0.into(), 0.into(),
                    Object::Real(width as _), Object::Real(height as _)],
                "Resources" => Object::Dictionary(dictionary! {
                    "ColorSpace" => Object::Dictionary(dictionary! {
                        "CS0" => space,
                    }),
                }),
            });
            kids.push(Object::Reference(page_id));
        }
        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => name(b"Pages"),
                "Kids" => kids,
                "Count" => count,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => name(b"Catalog"),
            "Pages" => Object::Reference(pages_id),
        });
        doc.trailer.set("Root", Object::Reference(catalog_id));
        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    #[tokio::test]
    async fn mixed_document_counts_add_up() {
        let bytes = build_pdf(&[
            (612.0, 792.0, false),
            (612.0, 792.0, true),
            (1000.0, 850.0, true),
        ]);
        let analyzer = DocumentAnalyzer::new(AnalyzerConfig::default());
        let result = analyzer.analyze(&bytes, AnalysisMode::Quick).await.unwrap();

        assert_eq!(result.total_pages, 3);
        assert_eq!(result.bw_pages + result.color_pages, result.total_pages);
        assert_eq!(
            result.standard_pages + result.foldout_pages,
            result.total_pages
        );
        assert_eq!(result.color_pages, 2);
        assert_eq!(result.foldout_pages, 1);
        assert_eq!(result.large_format_pages.len(), 1);
        assert!(!result.has_oversized_pages);
    }

    #[tokio::test]
    async fn quick_mode_uses_the_stricter_oversize_cutoff() {
        let bytes = build_pdf(&[(1300.0, 850.0, false)]);
        let analyzer = DocumentAnalyzer::new(AnalyzerConfig::default());

        let full = analyzer.analyze(&bytes, AnalysisMode::Full).await.unwrap();
        assert!(!full.has_oversized_pages);

        let quick = analyzer.analyze(&bytes, AnalysisMode::Quick).await.unwrap();
        assert!(quick.has_oversized_pages);
        assert!(quick.oversized_page_numbers.contains(&1));
    }

    #[tokio::test]
    async fn press_width_cutoff_applies_in_full_mode() {
        let bytes = build_pdf(&[(2700.0, 850.0, false)]);
        let analyzer = DocumentAnalyzer::new(AnalyzerConfig::default());
        let result = analyzer.analyze(&bytes, AnalysisMode::Full).await.unwrap();
        assert!(result.has_oversized_pages);
    }

    #[tokio::test]
    async fn unparsable_document_is_a_total_failure() {
        let analyzer = DocumentAnalyzer::new(AnalyzerConfig::default());
        let result = analyzer.analyze(b"not a pdf", AnalysisMode::Quick).await;
        assert!(matches!(
            result,
            Err(crate::error::Error::Analysis(
                AnalysisError::UnparsableDocument(_)
            ))
        ));
    }

    #[tokio::test]
    async fn oversized_file_is_rejected_before_parsing() {
        let config = AnalyzerConfig {
            max_file_bytes: 16,
            ..AnalyzerConfig::default()
        };
        let analyzer = DocumentAnalyzer::new(config);
        let bytes = build_pdf(&[(612.0, 792.0, false)]);
        let result = analyzer.analyze(&bytes, AnalysisMode::Quick).await;
        assert!(matches!(
            result,
            Err(crate::error::Error::Analysis(AnalysisError::FileTooLarge { .. }))
        ));
    }

    #[tokio::test]
    async fn analysis_is_idempotent() {
        let bytes = build_pdf(&[(612.0, 792.0, true), (612.0, 792.0, false)]);
        let analyzer = DocumentAnalyzer::new(AnalyzerConfig::default());
        let first = analyzer.analyze(&bytes, AnalysisMode::Quick).await.unwrap();
        let second = analyzer.analyze(&bytes, AnalysisMode::Quick).await.unwrap();
        assert_eq!(first.pages, second.pages);
        assert_eq!(first.color_pages, second.color_pages);
        assert_eq!(first.oversized_page_numbers, second.oversized_page_numbers);
    }
}
