//! Print-order quoting core.
//!
//! Analyzes an uploaded PDF page by page (color vs. B&W, standard vs.
//! fold-out vs. oversized geometry) and turns the result plus the
//! customer's selected options into an itemized price and shipping weight.
//! Page rendering, storage and checkout are collaborators outside this
//! crate; rasterization is injected through the [`PageRasterizer`] trait.

// Configuration and shared model
pub mod config;
pub mod error;
pub mod types;

// Stage 1: document analysis
pub mod analyzer;
pub mod detector;
pub mod geometry;

// Stage 2: pricing and weight
pub mod pricing;
pub mod weight;

// Re-exports for crate consumers
pub use analyzer::{Analyze, DocumentAnalyzer};
pub use config::{AnalyzerConfig, PricingConfig, PricingTier, WeightConfig};
pub use detector::{
    AnalysisMode, ColorDetector, DetectionStrategy, PageRasterizer, Pixmap,
};
pub use error::{AnalysisError, ConfigError, Error, Result};
pub use pricing::PricingEngine;
pub use types::{
    AnalysisResult, Binding, Cover, LargeFormatPage, OrderConfig, PageRecord, PricingBreakdown,
};
pub use weight::WeightBreakdown;
