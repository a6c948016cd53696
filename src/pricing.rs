//! Tiered pricing engine.
//!
//! A pure function of the analysis result, the order options and the
//! injected configuration. Every quote is recomputed from scratch; nothing
//! is patched incrementally when the customer changes an option, so stale
//! state cannot leak into a price. Monetary outputs are rounded to the
//! cent only at the edge; all totals derive from unrounded components.

use tracing::debug;

use crate::config::{PricingConfig, WeightConfig};
use crate::types::{AnalysisResult, OrderConfig, PricingBreakdown};
use crate::weight;

const SQUARE_INCHES_PER_SQFT: f64 = 144.0;

/// Prices orders against an injected tier table and constants
pub struct PricingEngine {
    pricing: PricingConfig,
    weight: WeightConfig,
}

impl PricingEngine {
    pub fn new(pricing: PricingConfig, weight: WeightConfig) -> Self {
        Self { pricing, weight }
    }

    pub fn with_defaults() -> Self {
        Self::new(PricingConfig::default(), WeightConfig::default())
    }

    /// Computes the full itemized quote for one analyzed document and one
    /// order configuration.
    ///
    /// The volume tier is global: the total standard-page count across all
    /// copies selects one tier, and that tier's rates apply to every
    /// standard page in the order. Fold-out pages bypass the tiers and are
    /// priced by area with a per-page minimum.
    pub fn quote(&self, analysis: &AnalysisResult, order: &OrderConfig) -> PricingBreakdown {
        let copies = order.copies as f64;

        let standard_bw = analysis.standard_bw_pages();
        let standard_color = analysis.standard_color_pages();
        let total_standard = (standard_bw + standard_color).saturating_mul(order.copies);
        let tier = self.pricing.tier_for(total_standard);
        debug!(total_standard, tier = %tier.label(), "tier selected");

        let bw_cost = standard_bw as f64 * copies * tier.bw_rate;
        let color_cost = standard_color as f64 * copies * tier.color_rate;
        let large_format_cost = self.large_format_cost(analysis) * copies;
        let binding_cost = self.pricing.binding.for_binding(order.binding) * copies;
        let cover_cost = self.pricing.cover.for_cover(order.cover) * copies;
        let tabs_cost = if order.has_tabs {
            self.pricing.tab_set_price * copies
        } else {
            0.0
        };

        let total_pages_cost = bw_cost + color_cost + large_format_cost;
        let subtotal = total_pages_cost + binding_cost + cover_cost + tabs_cost;
        let total_price = subtotal;

        let mass = weight::estimate(analysis.total_pages, order, &self.weight);
        let (requires_manual_quote, quote_reason) =
            self.escalation(analysis, order, total_price, mass.shipping_lbs);

        PricingBreakdown {
            bw_pages_cost: round_cents(bw_cost),
            color_pages_cost: round_cents(color_cost),
            large_format_cost: round_cents(large_format_cost),
            binding_cost: round_cents(binding_cost),
            cover_cost: round_cents(cover_cost),
            tabs_cost: round_cents(tabs_cost),
            total_pages_cost: round_cents(total_pages_cost),
            subtotal: round_cents(subtotal),
            total_price: round_cents(total_price),
            tier_applied: tier.label(),
            bw_rate: tier.bw_rate,
            color_rate: tier.color_rate,
            total_weight_grams: mass.total_grams,
            total_weight_lbs: mass.total_lbs,
            shipping_weight_lbs: mass.shipping_lbs,
            requires_manual_quote,
            quote_reason,
        }
    }

    /// Area pricing for one copy's fold-out pages
    fn large_format_cost(&self, analysis: &AnalysisResult) -> f64 {
        let rates = &self.pricing.large_format;
        analysis
            .large_format_pages
            .iter()
            .map(|page| {
                let area_sqft = page.width_in * page.height_in / SQUARE_INCHES_PER_SQFT;
                if page.is_color {
                    (area_sqft * rates.color_per_sqft).max(rates.color_minimum)
                } else {
                    (area_sqft * rates.bw_per_sqft).max(rates.bw_minimum)
                }
            })
            .sum()
    }

    /// Manual-quote escalation ladder. Every condition is evaluated; the
    /// first true one in the fixed order (oversized pages, price ceiling,
    /// weight ceiling, copy ceiling) supplies the surfaced reason.
    fn escalation(
        &self,
        analysis: &AnalysisResult,
        order: &OrderConfig,
        total_price: f64,
        shipping_lbs: f64,
    ) -> (bool, Option<String>) {
        let limits = &self.pricing.limits;
        let oversized = analysis.has_oversized_pages;
        let over_price = total_price > limits.max_auto_price;
        let over_weight = shipping_lbs > limits.max_shipping_lbs;
        let over_copies = order.copies > limits.max_copies;

        let reason = if oversized {
            Some(format!(
                "document contains {} page(s) wider than the maximum printable width",
                analysis.oversized_page_numbers.len()
            ))
        } else if over_price {
            Some(format!(
                "total price ${:.2} exceeds the ${:.2} automatic quoting ceiling",
                total_price, limits.max_auto_price
            ))
        } else if over_weight {
            Some(format!(
                "shipping weight {:.1} lb exceeds the {:.1} lb ceiling",
                shipping_lbs, limits.max_shipping_lbs
            ))
        } else if over_copies {
            Some(format!(
                "{} copies exceeds the {} copy maximum",
                order.copies, limits.max_copies
            ))
        } else {
            None
        };

        (
            oversized || over_price || over_weight || over_copies,
            reason,
        )
    }
}

/// Rounds a monetary amount to the nearest cent
fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}
