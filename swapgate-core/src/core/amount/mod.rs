//! Amount conversion between human-readable decimals and integer base units
//!
//! Base-unit strings are what the aggregator and the chain speak; human
//! strings are what the user types and reads. All arithmetic on base units is
//! done in `U256` so 18-decimal amounts never lose precision. The display
//! helpers (`effective_rate`, `price_impact_percent`, `min_received`) work in
//! `f64` because they only feed the UI.
//!
//! Input policy: fractional digits beyond the token's `decimals` are
//! truncated, never rounded, on every path that produces base units.

use ethers::types::U256;

use crate::shared::constants::{
    BPS_DENOMINATOR, DEFAULT_DISPLAY_DECIMALS, MAX_TOKEN_DECIMALS, MIN_DISPLAY_DECIMALS,
    NATIVE_DECIMALS,
};
use crate::shared::error::{SwapError, SwapResult};

const MIN_RECEIVED_SCALE: f64 = 1e6;

fn pow10(exp: u32) -> SwapResult<U256> {
    if exp > MAX_TOKEN_DECIMALS {
        return Err(SwapError::invalid_amount(format!("Too many decimals: {exp}")));
    }
    Ok(U256::exp10(exp as usize))
}

/// "", "0", "0.", ".0", "000.000" all mean zero.
fn is_zero_or_empty(input: &str) -> bool {
    if input.is_empty() {
        return true;
    }
    input.matches('.').count() <= 1
        && input.contains('0')
        && input.chars().all(|c| c == '0' || c == '.')
}

/// Parse a non-negative integer base-unit string.
pub fn parse_base_units(base: &str) -> SwapResult<U256> {
    let trimmed = base.trim();
    if trimmed.is_empty() || !trimmed.chars().all(|c| c.is_ascii_digit()) {
        return Err(SwapError::invalid_amount(format!("Not a base-unit integer: '{base}'")));
    }
    U256::from_dec_str(trimmed)
        .map_err(|e| SwapError::invalid_amount(format!("Amount out of range '{base}': {e}")))
}

/// Convert a human decimal string to a base-unit integer string.
///
/// Empty and zero inputs return `"0"` without parsing. Anything other than
/// ASCII digits with at most one `.` is rejected with `InvalidAmount`.
pub fn to_base_units(human: &str, decimals: u8) -> SwapResult<String> {
    let trimmed = human.trim();
    if is_zero_or_empty(trimmed) {
        return Ok("0".to_string());
    }

    let (whole, frac) = match trimmed.split_once('.') {
        Some((whole, frac)) => (whole, frac),
        None => (trimmed, ""),
    };

    if whole.is_empty() && frac.is_empty() {
        return Err(SwapError::invalid_amount(format!("Malformed amount: '{human}'")));
    }
    if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit()) {
        return Err(SwapError::invalid_amount(format!("Malformed amount: '{human}'")));
    }

    let decimals = decimals as usize;
    let mut digits = String::with_capacity(whole.len() + decimals);
    digits.push_str(if whole.is_empty() { "0" } else { whole });
    if frac.len() > decimals {
        digits.push_str(&frac[..decimals]);
    } else {
        digits.push_str(frac);
        digits.extend(std::iter::repeat('0').take(decimals - frac.len()));
    }

    let value = U256::from_dec_str(&digits)
        .map_err(|e| SwapError::invalid_amount(format!("Amount out of range '{human}': {e}")))?;
    Ok(value.to_string())
}

/// Place the decimal point `places` digits from the right and trim trailing zeros.
fn insert_decimal_point(value: U256, places: u32) -> String {
    let digits = value.to_string();
    if places == 0 {
        return digits;
    }
    let places = places as usize;
    let padded = if digits.len() <= places {
        format!("{}{}", "0".repeat(places + 1 - digits.len()), digits)
    } else {
        digits
    };
    let (whole, frac) = padded.split_at(padded.len() - places);
    let frac = frac.trim_end_matches('0');
    if frac.is_empty() {
        whole.to_string()
    } else {
        format!("{whole}.{frac}")
    }
}

/// Exact, ungrouped rendering of a base-unit amount with trailing zeros trimmed.
pub fn format_base_units(base: &str, decimals: u8) -> SwapResult<String> {
    let value = parse_base_units(base)?;
    Ok(insert_decimal_point(value, decimals as u32))
}

/// en-US thousands grouping of the integer part.
fn group_thousands(plain: &str) -> String {
    let (whole, frac) = match plain.split_once('.') {
        Some((whole, frac)) => (whole, Some(frac)),
        None => (plain, None),
    };
    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, c) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    match frac {
        Some(frac) => format!("{grouped}.{frac}"),
        None => grouped,
    }
}

/// Rescale from `decimals` to `places` fractional digits, rounding half up.
fn rescale_half_up(value: U256, decimals: u32, places: u32) -> SwapResult<U256> {
    if places >= decimals {
        return value
            .checked_mul(pow10(places - decimals)?)
            .ok_or_else(|| SwapError::invalid_amount("Amount overflow while rescaling"));
    }
    let divisor = pow10(decimals - places)?;
    let quotient = value / divisor;
    let remainder = value % divisor;
    if remainder >= divisor - remainder {
        Ok(quotient + U256::one())
    } else {
        Ok(quotient)
    }
}

fn render_human(base: &str, decimals: u8, display_decimals: u32) -> SwapResult<String> {
    let value = parse_base_units(base)?;
    if value.is_zero() {
        return Ok("0".to_string());
    }
    let places = display_decimals.max(MIN_DISPLAY_DECIMALS);
    let scaled = rescale_half_up(value, decimals as u32, places)?;
    if scaled.is_zero() {
        return Ok(format!("< 0.{}1", "0".repeat(places as usize - 1)));
    }
    Ok(group_thousands(&insert_decimal_point(scaled, places)))
}

/// Render a base-unit amount for display.
///
/// Returns `"0"` for zero, `"< 0.000001"` (at the default precision) when a
/// non-zero amount rounds away, otherwise a grouped decimal with at most
/// `max(display_decimals, 2)` fractional digits. Never fails: malformed input
/// renders as `"0.0"`.
pub fn to_human_units(base: &str, decimals: u8, display_decimals: u32) -> String {
    match render_human(base, decimals, display_decimals) {
        Ok(rendered) => rendered,
        Err(e) => {
            log::debug!("Could not render amount '{}': {}", base, e);
            "0.0".to_string()
        }
    }
}

/// `to_human_units` at the default six display decimals.
pub fn to_human_units_default(base: &str, decimals: u8) -> String {
    to_human_units(base, decimals, DEFAULT_DISPLAY_DECIMALS)
}

/// Lenient parse of a human string for display math. Grouping commas are
/// ignored; anything unparseable is `0.0`.
pub fn parse_human_f64(human: &str) -> f64 {
    human
        .trim()
        .replace(',', "")
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

fn positive(v: f64) -> bool {
    v.is_finite() && v > 0.0
}

/// Units of buy token received per unit of sell token.
pub fn effective_rate(sell: f64, buy: f64) -> f64 {
    if !positive(sell) || !positive(buy) {
        return 0.0;
    }
    buy / sell
}

/// Deviation of the received amount from `sell * quoted_price`, in percent.
pub fn price_impact_percent(sell: f64, buy: f64, quoted_price: f64) -> f64 {
    if !positive(sell) || !positive(buy) || !positive(quoted_price) {
        return 0.0;
    }
    let expected = sell * quoted_price;
    ((expected - buy) / expected).abs() * 100.0
}

/// Worst-case amount received after slippage, floored to six decimals.
/// Never rounds up and never exceeds `buy`.
pub fn min_received(buy: f64, slippage_bps: u32) -> f64 {
    if !positive(buy) {
        return 0.0;
    }
    let bps = slippage_bps.min(BPS_DENOMINATOR) as f64;
    let factor = 1.0 - bps / BPS_DENOMINATOR as f64;
    let floored = (buy * factor * MIN_RECEIVED_SCALE).floor() / MIN_RECEIVED_SCALE;
    // float rounding on huge amounts can land one ulp above the input
    floored.min(buy)
}

/// Network fee in native units: `gas_limit * gas_price_wei` formatted from wei.
pub fn gas_cost_in_native(gas_limit: &str, gas_price_wei: &str) -> String {
    let (limit, price) = match (parse_base_units(gas_limit), parse_base_units(gas_price_wei)) {
        (Ok(limit), Ok(price)) => (limit, price),
        _ => return "0".to_string(),
    };
    if limit.is_zero() || price.is_zero() {
        return "0".to_string();
    }
    match limit.checked_mul(price) {
        Some(wei) => insert_decimal_point(wei, NATIVE_DECIMALS),
        None => "0".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_base_units() {
        assert_eq!(to_base_units("1", 18).unwrap(), "1000000000000000000");
        assert_eq!(to_base_units("1.5", 6).unwrap(), "1500000");
        assert_eq!(to_base_units(".25", 6).unwrap(), "250000");
        assert_eq!(to_base_units("12.", 2).unwrap(), "1200");
        assert_eq!(to_base_units("007", 0).unwrap(), "7");
    }

    #[test]
    fn test_to_base_units_zero_short_circuit() {
        assert_eq!(to_base_units("", 18).unwrap(), "0");
        assert_eq!(to_base_units("   ", 18).unwrap(), "0");
        assert_eq!(to_base_units("0", 18).unwrap(), "0");
        assert_eq!(to_base_units("0.000", 6).unwrap(), "0");
        assert_eq!(to_base_units("0.", 6).unwrap(), "0");
    }

    #[test]
    fn test_to_base_units_truncates_excess_fraction() {
        assert_eq!(to_base_units("1.1234567", 6).unwrap(), "1123456");
        assert_eq!(to_base_units("0.0000009", 6).unwrap(), "0");
        assert_eq!(to_base_units("2.99", 0).unwrap(), "2");
    }

    #[test]
    fn test_to_base_units_rejects_malformed() {
        for bad in [".", "abc", "1.2.3", "-1", "+1", "1e18", "1,000", "0x10", "1 000"] {
            let result = to_base_units(bad, 18);
            assert!(
                matches!(result, Err(SwapError::InvalidAmount(_))),
                "expected InvalidAmount for {bad:?}, got {result:?}"
            );
        }
    }

    #[test]
    fn test_to_base_units_overflow() {
        let huge = "9".repeat(80);
        assert!(to_base_units(&huge, 18).is_err());
    }

    #[test]
    fn test_format_base_units() {
        assert_eq!(format_base_units("1500000", 6).unwrap(), "1.5");
        assert_eq!(format_base_units("1000000000000000000", 18).unwrap(), "1");
        assert_eq!(format_base_units("1", 18).unwrap(), "0.000000000000000001");
        assert_eq!(format_base_units("0", 6).unwrap(), "0");
        assert_eq!(format_base_units("42", 0).unwrap(), "42");
        assert!(format_base_units("1.5", 6).is_err());
    }

    #[test]
    fn test_to_human_units_literal_cases() {
        assert_eq!(to_human_units("500", 6, 6), "0.0005");
        assert_eq!(to_human_units("5", 18, 6), "< 0.000001");
        assert_eq!(to_human_units("0", 18, 6), "0");
    }

    #[test]
    fn test_to_human_units_grouping_and_rounding() {
        assert_eq!(to_human_units("1234567890000", 6, 6), "1,234,567.89");
        assert_eq!(to_human_units("2500000000", 6, 6), "2,500");
        // 0.0000015 rounds half up at six places
        assert_eq!(to_human_units("1500000000000", 18, 6), "0.000002");
        // display precision never drops below two places
        assert_eq!(to_human_units("1234", 3, 0), "1.23");
        assert_eq!(to_human_units("4", 3, 0), "< 0.01");
    }

    #[test]
    fn test_to_human_units_never_fails() {
        assert_eq!(to_human_units("not-a-number", 18, 6), "0.0");
        assert_eq!(to_human_units("", 18, 6), "0.0");
        assert_eq!(to_human_units("1", 200, 6), "0.0");
    }

    #[test]
    fn test_effective_rate_and_price_impact() {
        assert_eq!(effective_rate(2.0, 5000.0), 2500.0);
        assert_eq!(effective_rate(0.0, 5000.0), 0.0);
        assert_eq!(effective_rate(1.0, -1.0), 0.0);
        assert_eq!(effective_rate(f64::NAN, 1.0), 0.0);

        let impact = price_impact_percent(1.0, 2475.0, 2500.0);
        assert!((impact - 1.0).abs() < 1e-9);
        assert_eq!(price_impact_percent(1.0, 2500.0, 0.0), 0.0);
    }

    #[test]
    fn test_min_received() {
        assert_eq!(min_received(100.0, 50), 99.5);
        assert_eq!(min_received(1.23456789, 0), 1.234567);
        assert_eq!(min_received(100.0, 10_000), 0.0);
        assert_eq!(min_received(100.0, 20_000), 0.0);
        assert_eq!(min_received(-5.0, 50), 0.0);
    }

    #[test]
    fn test_gas_cost_in_native() {
        // 150k gas at 20 gwei
        assert_eq!(gas_cost_in_native("150000", "20000000000"), "0.003");
        assert_eq!(gas_cost_in_native("0", "20000000000"), "0");
        assert_eq!(gas_cost_in_native("150000", ""), "0");
        assert_eq!(gas_cost_in_native("-1", "1"), "0");
    }

    #[test]
    fn test_parse_human_f64() {
        assert_eq!(parse_human_f64("1,234.5"), 1234.5);
        assert_eq!(parse_human_f64("< 0.000001"), 0.0);
        assert_eq!(parse_human_f64("inf"), 0.0);
    }

    // Property-based tests using proptest
    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        fn human_amount() -> impl Strategy<Value = (String, u8)> {
            (0u8..=18).prop_flat_map(|decimals| {
                let frac_len = 0..=decimals as usize;
                (
                    "[0-9]{1,12}",
                    frac_len.prop_flat_map(|len| proptest::collection::vec(0u8..10, len)),
                    Just(decimals),
                )
                    .prop_map(|(whole, frac, decimals)| {
                        let frac: String = frac.iter().map(|d| char::from(b'0' + d)).collect();
                        let human = if frac.is_empty() { whole } else { format!("{whole}.{frac}") };
                        (human, decimals)
                    })
            })
        }

        fn normalize(human: &str) -> String {
            let (whole, frac) = human.split_once('.').unwrap_or((human, ""));
            let whole = whole.trim_start_matches('0');
            let whole = if whole.is_empty() { "0" } else { whole };
            let frac = frac.trim_end_matches('0');
            if frac.is_empty() {
                whole.to_string()
            } else {
                format!("{whole}.{frac}")
            }
        }

        proptest! {
            #[test]
            fn prop_base_units_round_trip((human, decimals) in human_amount()) {
                let base = to_base_units(&human, decimals).unwrap();
                prop_assert_eq!(format_base_units(&base, decimals).unwrap(), normalize(&human));
            }
        }

        proptest! {
            #[test]
            fn prop_human_units_round_trip_at_full_precision((human, decimals) in human_amount()) {
                let base = to_base_units(&human, decimals).unwrap();
                let rendered = to_human_units(&base, decimals, decimals as u32).replace(',', "");
                prop_assert_eq!(rendered, normalize(&human));
            }
        }

        proptest! {
            #[test]
            fn prop_min_received_monotonic(buy in 0.0f64..1e12, a in 0u32..=10_000, b in 0u32..=10_000) {
                let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
                prop_assert!(min_received(buy, hi) <= min_received(buy, lo));
                prop_assert!(min_received(buy, 0) <= buy);
            }
        }
    }
}
