//! Token estimate and cost calculator.
//!
//! Uses the usual rough rule of four characters per token. Good enough for
//! a ballpark, not for billing.

use serde::Serialize;

use crate::platform::Platform;

const CHARS_PER_TOKEN: usize = 4;
const DAYS_PER_MONTH: u32 = 30;

/// Estimated tokens for `text`, rounded up.
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(CHARS_PER_TOKEN)
}

/// Cost projection for sending one prompt repeatedly.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CostEstimate {
    pub platform: Platform,
    pub tokens: usize,
    pub requests_per_day: u32,
    pub cost_per_request_usd: f64,
    pub monthly_cost_usd: f64,
}

pub fn estimate_cost(text: &str, platform: Platform, requests_per_day: u32) -> CostEstimate {
    let tokens = estimate_tokens(text);
    let cost_per_request_usd = tokens as f64 * platform.input_price_per_million() / 1_000_000.0;
    let monthly_cost_usd = cost_per_request_usd * requests_per_day as f64 * DAYS_PER_MONTH as f64;

    CostEstimate {
        platform,
        tokens,
        requests_per_day,
        cost_per_request_usd,
        monthly_cost_usd,
    }
}

/// Format a USD amount, keeping small per-request costs readable.
pub fn format_usd(amount: f64) -> String {
    if amount > 0.0 && amount < 0.01 {
        format!("${:.5}", amount)
    } else {
        format!("${:.2}", amount)
    }
}
