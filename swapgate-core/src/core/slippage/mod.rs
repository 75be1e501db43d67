//! Slippage tolerance codec
//!
//! Users pick a percentage in `[0, 5]`; the aggregator takes basis points.
//! The forward direction clamps, the reverse direction does not: a bps value
//! outside `[0, 500]` handed to `bps_to_percent` comes back out of range, and
//! callers that accept bps from elsewhere must validate it themselves.

use crate::shared::constants::{BPS_PER_PERCENT, MAX_SLIPPAGE_PERCENT, MIN_SLIPPAGE_PERCENT};
use crate::shared::error::{SwapError, SwapResult};

/// Largest value `percent_to_bps` can return.
pub const MAX_SLIPPAGE_BPS: u32 = 500;

/// `floor(clamp(percent, 0, 5) * 100)`. NaN is treated as zero.
///
/// The product is nudged up by `1e-9` before flooring so that decimal
/// inputs such as `0.29` map to 29 bps. Inputs within `1e-11` percent below
/// a whole basis point therefore round up to it, where a bare floor would
/// give one bps less.
pub fn percent_to_bps(percent: f64) -> u32 {
    if percent.is_nan() {
        return 0;
    }
    let clamped = percent.clamp(MIN_SLIPPAGE_PERCENT, MAX_SLIPPAGE_PERCENT);
    // 1e-9 absorbs representation error such as 0.29 * 100 = 28.999999999999996
    ((clamped * BPS_PER_PERCENT + 1e-9).floor() as u32).min(MAX_SLIPPAGE_BPS)
}

/// `bps / 100`, not clamped.
pub fn bps_to_percent(bps: u32) -> f64 {
    bps as f64 / BPS_PER_PERCENT
}

/// Reject, rather than clamp, a user-supplied percentage.
pub fn validate_slippage_percent(percent: f64) -> SwapResult<f64> {
    if !percent.is_finite() || !(MIN_SLIPPAGE_PERCENT..=MAX_SLIPPAGE_PERCENT).contains(&percent) {
        return Err(SwapError::validation("Slippage must be between 0 and 5%"));
    }
    Ok(percent)
}
