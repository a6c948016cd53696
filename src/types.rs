//! Core data model shared by the analyzer, pricing engine and weight
//! estimator.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::detector::DetectionStrategy;
use crate::error::ConfigError;

/// Classification record for a single page, 1-based page number.
///
/// Records are produced once during analysis and never mutated; the owning
/// [`AnalysisResult`] is the only holder. Oversize status is derived during
/// aggregation rather than stored per page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageRecord {
    pub number: u32,
    pub width_pt: f64,
    pub height_pt: f64,
    pub is_color: bool,
    pub is_foldout: bool,
}

/// Exact dimensions of a fold-out page, kept for area-based pricing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LargeFormatPage {
    pub number: u32,
    pub width_in: f64,
    pub height_in: f64,
    pub is_color: bool,
}

/// Aggregated analysis of one document.
///
/// Invariants maintained by [`AnalysisResult::from_pages`]:
/// `bw_pages + color_pages == total_pages` and
/// `standard_pages + foldout_pages == total_pages`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub total_pages: u32,
    pub pages: Vec<PageRecord>,
    pub bw_pages: u32,
    pub color_pages: u32,
    pub standard_pages: u32,
    pub foldout_pages: u32,
    pub has_oversized_pages: bool,
    pub oversized_page_numbers: BTreeSet<u32>,
    pub large_format_pages: Vec<LargeFormatPage>,
    /// Color-detection strategy used, `None` for the zero-knowledge fallback.
    pub strategy: Option<DetectionStrategy>,
    pub analyzed_at: DateTime<Utc>,
}

impl AnalysisResult {
    /// Builds a result from per-page records, deriving every aggregate count
    /// in one place so the count invariants cannot drift.
    pub fn from_pages(
        pages: Vec<PageRecord>,
        oversized_page_numbers: BTreeSet<u32>,
        large_format_pages: Vec<LargeFormatPage>,
        strategy: DetectionStrategy,
    ) -> Self {
        let total_pages = pages.len() as u32;
        let color_pages = pages.iter().filter(|p| p.is_color).count() as u32;
        let foldout_pages = pages.iter().filter(|p| p.is_foldout).count() as u32;
        Self {
            total_pages,
            bw_pages: total_pages - color_pages,
            color_pages,
            standard_pages: total_pages - foldout_pages,
            foldout_pages,
            has_oversized_pages: !oversized_page_numbers.is_empty(),
            oversized_page_numbers,
            large_format_pages,
            strategy: Some(strategy),
            analyzed_at: Utc::now(),
            pages,
        }
    }

    /// Zero-knowledge default used when a document cannot be analyzed at
    /// all: every page is assumed standard B&W. An unanalyzable file must
    /// not block the order.
    pub fn unknown(total_pages: u32) -> Self {
        Self {
            total_pages,
            pages: Vec::new(),
            bw_pages: total_pages,
            color_pages: 0,
            standard_pages: total_pages,
            foldout_pages: 0,
            has_oversized_pages: false,
            oversized_page_numbers: BTreeSet::new(),
            large_format_pages: Vec::new(),
            strategy: None,
            analyzed_at: Utc::now(),
        }
    }

    /// B&W pages that are priced per-page by tier (everything not fold-out).
    pub fn standard_bw_pages(&self) -> u32 {
        if self.pages.is_empty() {
            return self.bw_pages;
        }
        self.pages
            .iter()
            .filter(|p| !p.is_foldout && !p.is_color)
            .count() as u32
    }

    /// Color pages that are priced per-page by tier.
    pub fn standard_color_pages(&self) -> u32 {
        if self.pages.is_empty() {
            return self.color_pages;
        }
        self.pages
            .iter()
            .filter(|p| !p.is_foldout && p.is_color)
            .count() as u32
    }
}

/// Binding options offered at checkout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Binding {
    None,
    Staple,
    SaddleStitch,
    Coil,
    Comb,
    ThreeRingBinder,
}

/// Cover options offered at checkout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cover {
    None,
    ClearFront,
    Cardstock,
    Laminated,
}

/// Customer-selected order options supplied by the UI collaborator.
///
/// `duplex` and `booklet` are presentation-only: they never move the price
/// or the weight, they only constrain which bindings are legal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderConfig {
    pub copies: u32,
    pub binding: Binding,
    pub cover: Cover,
    pub has_tabs: bool,
    pub duplex: bool,
    pub booklet: bool,
}

impl Default for OrderConfig {
    fn default() -> Self {
        Self {
            copies: 1,
            binding: Binding::None,
            cover: Cover::None,
            has_tabs: false,
            duplex: false,
            booklet: false,
        }
    }
}

impl OrderConfig {
    /// Validates preconditions the pricing engine assumes
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.copies == 0 {
            return Err(ConfigError::InvalidOrder(
                "copy count must be at least 1".into(),
            ));
        }
        if self.booklet && self.binding != Binding::SaddleStitch {
            return Err(ConfigError::InvalidOrder(
                "booklet orders require saddle-stitch binding".into(),
            ));
        }
        Ok(())
    }
}

/// Itemized quote produced by the pricing engine.
///
/// A breakdown is always recomputed from scratch from an
/// [`AnalysisResult`] and an [`OrderConfig`]; it is never patched in place
/// when the configuration changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingBreakdown {
    pub bw_pages_cost: f64,
    pub color_pages_cost: f64,
    pub large_format_cost: f64,
    pub binding_cost: f64,
    pub cover_cost: f64,
    pub tabs_cost: f64,
    pub total_pages_cost: f64,
    pub subtotal: f64,
    pub total_price: f64,
    pub tier_applied: String,
    pub bw_rate: f64,
    pub color_rate: f64,
    pub total_weight_grams: f64,
    pub total_weight_lbs: f64,
    pub shipping_weight_lbs: f64,
    pub requires_manual_quote: bool,
    pub quote_reason: Option<String>,
}
