//! Configuration types for analysis, pricing and weight estimation.
//!
//! Everything here is injected into the engines rather than read from
//! module-level globals, so tests and deployments can substitute alternate
//! tier tables and constants without touching engine logic.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::types::{Binding, Cover};

/// One row of the volume-tier table: an inclusive page-count range mapped to
/// a per-page rate pair. Exactly one tier applies to a given order, selected
/// by its total standard-page count, and that tier's rates apply to every
/// standard page in the order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingTier {
    pub min_pages: u32,
    pub max_pages: u32,
    pub bw_rate: f64,
    pub color_rate: f64,
}

impl PricingTier {
    pub fn contains(&self, total_pages: u32) -> bool {
        total_pages >= self.min_pages && total_pages <= self.max_pages
    }

    /// Human-readable range label carried into the quote ("51-1000", "1001+")
    pub fn label(&self) -> String {
        if self.max_pages == u32::MAX {
            format!("{}+", self.min_pages)
        } else {
            format!("{}-{}", self.min_pages, self.max_pages)
        }
    }
}

/// Area-based rates for fold-out pages, priced per square foot with a
/// per-page minimum charge. Bypasses the volume tiers entirely.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LargeFormatRates {
    pub bw_per_sqft: f64,
    pub color_per_sqft: f64,
    pub bw_minimum: f64,
    pub color_minimum: f64,
}

/// Flat per-copy binding prices
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BindingPrices {
    pub none: f64,
    pub staple: f64,
    pub saddle_stitch: f64,
    pub coil: f64,
    pub comb: f64,
    pub three_ring_binder: f64,
}

impl BindingPrices {
    pub fn for_binding(&self, binding: Binding) -> f64 {
        match binding {
            Binding::None => self.none,
            Binding::Staple => self.staple,
            Binding::SaddleStitch => self.saddle_stitch,
            Binding::Coil => self.coil,
            Binding::Comb => self.comb,
            Binding::ThreeRingBinder => self.three_ring_binder,
        }
    }
}

/// Flat per-copy cover prices
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoverPrices {
    pub none: f64,
    pub clear_front: f64,
    pub cardstock: f64,
    pub laminated: f64,
}

impl CoverPrices {
    pub fn for_cover(&self, cover: Cover) -> f64 {
        match cover {
            Cover::None => self.none,
            Cover::ClearFront => self.clear_front,
            Cover::Cardstock => self.cardstock,
            Cover::Laminated => self.laminated,
        }
    }
}

/// Ceilings past which auto-pricing stops and the order escalates to a
/// manual quote
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EscalationLimits {
    pub max_auto_price: f64,
    pub max_shipping_lbs: f64,
    pub max_copies: u32,
}

/// Complete pricing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingConfig {
    pub tiers: Vec<PricingTier>,
    pub large_format: LargeFormatRates,
    pub binding: BindingPrices,
    pub cover: CoverPrices,
    pub tab_set_price: f64,
    pub limits: EscalationLimits,
}

impl PricingConfig {
    /// Validates that the tier table is contiguous and exhaustive over
    /// `[1, u32::MAX]` and that every rate and limit is sane.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tiers.is_empty() {
            return Err(ConfigError::InvalidTiers("tier table is empty".into()));
        }
        if self.tiers[0].min_pages != 1 {
            return Err(ConfigError::InvalidTiers(
                "first tier must start at 1 page".into(),
            ));
        }
        for window in self.tiers.windows(2) {
            if window[0].max_pages == u32::MAX
                || window[1].min_pages != window[0].max_pages + 1
            {
                return Err(ConfigError::InvalidTiers(format!(
                    "tiers {} and {} are not contiguous",
                    window[0].label(),
                    window[1].label()
                )));
            }
        }
        let last = self.tiers.last().expect("tiers checked non-empty");
        if last.max_pages != u32::MAX {
            return Err(ConfigError::InvalidTiers(
                "last tier must be open-ended".into(),
            ));
        }
        for tier in &self.tiers {
            if tier.bw_rate <= 0.0 || tier.color_rate <= 0.0 {
                return Err(ConfigError::InvalidRate(format!(
                    "tier {} has non-positive rates",
                    tier.label()
                )));
            }
        }
        if self.large_format.bw_per_sqft <= 0.0 || self.large_format.color_per_sqft <= 0.0 {
            return Err(ConfigError::InvalidRate(
                "large-format rates must be positive".into(),
            ));
        }
        if self.limits.max_copies == 0 {
            return Err(ConfigError::InvalidLimit(
                "copy ceiling must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Selects the single tier covering the given total standard-page
    /// count. Zero-page orders fall into the first tier.
    pub fn tier_for(&self, total_standard_pages: u32) -> &PricingTier {
        self.tiers
            .iter()
            .find(|t| t.contains(total_standard_pages))
            .unwrap_or(&self.tiers[0])
    }
}

/// Per-copy binding hardware mass in grams
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BindingGrams {
    pub none: f64,
    pub staple: f64,
    pub saddle_stitch: f64,
    pub coil: f64,
    pub comb: f64,
    pub three_ring_binder: f64,
}

impl BindingGrams {
    pub fn for_binding(&self, binding: Binding) -> f64 {
        match binding {
            Binding::None => self.none,
            Binding::Staple => self.staple,
            Binding::SaddleStitch => self.saddle_stitch,
            Binding::Coil => self.coil,
            Binding::Comb => self.comb,
            Binding::ThreeRingBinder => self.three_ring_binder,
        }
    }
}

/// Per-copy cover mass in grams
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoverGrams {
    pub none: f64,
    pub clear_front: f64,
    pub cardstock: f64,
    pub laminated: f64,
}

impl CoverGrams {
    pub fn for_cover(&self, cover: Cover) -> f64 {
        match cover {
            Cover::None => self.none,
            Cover::ClearFront => self.clear_front,
            Cover::Cardstock => self.cardstock,
            Cover::Laminated => self.laminated,
        }
    }
}

/// Mass constants for the weight estimator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightConfig {
    pub sheet_grams: f64,
    pub cover: CoverGrams,
    pub binding: BindingGrams,
    pub tab_set_grams: f64,
    pub grams_per_pound: f64,
}

/// Limits and thresholds for the document analyzer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// Hard reject before parsing begins
    pub max_file_bytes: u64,
    /// Below this size the full analyzer rasterizes and samples pixels; at
    /// or above it, it scans operator streams instead
    pub pixel_sampling_ceiling_bytes: u64,
    /// Concurrent document analyses admitted at once
    pub max_concurrent_analyses: usize,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            tiers: vec![
                PricingTier {
                    min_pages: 1,
                    max_pages: 50,
                    bw_rate: 0.32,
                    color_rate: 0.89,
                },
                PricingTier {
                    min_pages: 51,
                    max_pages: 1000,
                    bw_rate: 0.27,
                    color_rate: 0.79,
                },
                PricingTier {
                    min_pages: 1001,
                    max_pages: u32::MAX,
                    bw_rate: 0.22,
                    color_rate: 0.69,
                },
            ],
            large_format: LargeFormatRates {
                bw_per_sqft: 4.50,
                color_per_sqft: 7.50,
                bw_minimum: 7.00,
                color_minimum: 10.00,
            },
            binding: BindingPrices {
                none: 1.00,
                staple: 1.50,
                saddle_stitch: 3.00,
                coil: 4.50,
                comb: 4.00,
                three_ring_binder: 8.00,
            },
            cover: CoverPrices {
                none: 0.0,
                clear_front: 1.50,
                cardstock: 2.00,
                laminated: 4.00,
            },
            tab_set_price: 5.00,
            limits: EscalationLimits {
                max_auto_price: 2500.00,
                max_shipping_lbs: 70.0,
                max_copies: 500,
            },
        }
    }
}

impl Default for WeightConfig {
    fn default() -> Self {
        Self {
            // 20 lb bond letter sheet
            sheet_grams: 4.5,
            cover: CoverGrams {
                none: 0.0,
                clear_front: 8.0,
                cardstock: 15.0,
                laminated: 25.0,
            },
            binding: BindingGrams {
                none: 0.0,
                staple: 1.0,
                saddle_stitch: 4.0,
                coil: 28.0,
                comb: 38.0,
                three_ring_binder: 520.0,
            },
            tab_set_grams: 25.0,
            grams_per_pound: 453.592,
        }
    }
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            max_file_bytes: 500 * 1024 * 1024,
            pixel_sampling_ceiling_bytes: 25 * 1024 * 1024,
            max_concurrent_analyses: 4,
        }
    }
}
