//! Shipping weight estimation.
//!
//! Pure arithmetic over the analysis and order: interior paper, cover
//! stock, binding hardware and tab mass, summed and converted to pounds.
//! The shipping weight always rounds up to the next 0.1 lb; carriers bill
//! on declared weight, so under-reporting is never acceptable.

use serde::{Deserialize, Serialize};

use crate::config::WeightConfig;
use crate::types::OrderConfig;

/// Estimated mass of a finished order
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightBreakdown {
    pub total_grams: f64,
    pub total_lbs: f64,
    pub shipping_lbs: f64,
}

/// Estimates the shipped mass of `total_pages` interior pages per copy plus
/// the selected add-ons
pub fn estimate(total_pages: u32, order: &OrderConfig, config: &WeightConfig) -> WeightBreakdown {
    let copies = order.copies as f64;
    let paper_grams = total_pages as f64 * config.sheet_grams * copies;
    let cover_grams = config.cover.for_cover(order.cover) * copies;
    let binding_grams = config.binding.for_binding(order.binding) * copies;
    let tab_grams = if order.has_tabs {
        config.tab_set_grams * copies
    } else {
        0.0
    };

    let total_grams = paper_grams + cover_grams + binding_grams + tab_grams;
    let total_lbs = total_grams / config.grams_per_pound;
    WeightBreakdown {
        total_grams,
        total_lbs,
        shipping_lbs: round_up_tenth(total_lbs),
    }
}

/// Rounds up to the next 0.1 lb, never down
pub fn round_up_tenth(lbs: f64) -> f64 {
    (lbs * 10.0).ceil() / 10.0
}
