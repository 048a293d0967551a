//! Fixed-point price and size utilities.
//!
//! ## Overview
//!
//! Clients quote prices and sizes as floats. Inside the engine every price
//! and size is a u64 scaled by 10^8, so level volumes are exact sums and an
//! order is filled exactly when its remaining size reaches zero.
//!
//! Floats are converted once, at request validation, through
//! `rust_decimal::Decimal`, which keeps values such as `0.1` from picking up
//! binary rounding noise on the way in.
//!
//! ## Examples
//!
//! ```
//! use exchange_core::types::price::{from_f64, from_fixed, to_fixed};
//!
//! assert_eq!(to_fixed("100.5"), Some(10_050_000_000));
//! assert_eq!(from_f64(0.1), Some(10_000_000));
//! assert_eq!(from_fixed(10_050_000_000), "100.50000000");
//! ```

use rust_decimal::prelude::*;
use rust_decimal::Decimal;

/// Scaling factor for fixed-point arithmetic: 10^8
pub const SCALE: u64 = 100_000_000;

// ============================================================================
// Conversion Functions
// ============================================================================

/// Convert a decimal string to fixed-point u64
///
/// Returns `None` if parsing fails or the value is negative or out of range.
pub fn to_fixed(s: &str) -> Option<u64> {
    let decimal = Decimal::from_str(s).ok()?;
    decimal_to_fixed(decimal)
}

/// Convert a boundary float to fixed-point u64
///
/// Returns `None` for NaN, infinities, negatives and values out of range.
/// Digits beyond the 8th decimal place are rounded.
///
/// ```
/// use exchange_core::types::price::from_f64;
///
/// assert_eq!(from_f64(1.0), Some(100_000_000));
/// assert_eq!(from_f64(f64::NAN), None);
/// assert_eq!(from_f64(-2.0), None);
/// ```
pub fn from_f64(value: f64) -> Option<u64> {
    if !value.is_finite() {
        return None;
    }
    let decimal = Decimal::from_f64(value)?;
    decimal_to_fixed(decimal)
}

/// Convert a Decimal to fixed-point u64
///
/// Returns `None` if the value is negative or out of range.
pub fn decimal_to_fixed(d: Decimal) -> Option<u64> {
    if d.is_sign_negative() && !d.is_zero() {
        return None;
    }

    let scaled = d.checked_mul(Decimal::from(SCALE))?;
    let rounded = scaled.round_dp(0);
    rounded.to_u64()
}

/// Convert fixed-point u64 to a Decimal
pub fn fixed_to_decimal(value: u64) -> Decimal {
    Decimal::from(value) / Decimal::from(SCALE)
}

/// Convert fixed-point u64 back to a float for boundary views
pub fn to_f64(value: u64) -> f64 {
    fixed_to_decimal(value).to_f64().unwrap_or(value as f64 / SCALE as f64)
}

/// Convert fixed-point u64 to a string with 8 decimal places
///
/// ```
/// use exchange_core::types::price::from_fixed;
///
/// assert_eq!(from_fixed(100_000_000), "1.00000000");
/// assert_eq!(from_fixed(1), "0.00000001");
/// ```
pub fn from_fixed(value: u64) -> String {
    let decimal = fixed_to_decimal(value);
    format!("{:.8}", decimal)
}

/// Convert fixed-point u64 to a human-readable string (trailing zeros trimmed)
///
/// ```
/// use exchange_core::types::price::from_fixed_trimmed;
///
/// assert_eq!(from_fixed_trimmed(100_000_000), "1");
/// assert_eq!(from_fixed_trimmed(150_000_000), "1.5");
/// ```
pub fn from_fixed_trimmed(value: u64) -> String {
    let decimal = fixed_to_decimal(value);
    format!("{}", decimal.normalize())
}

/// Notional of `size` units at `price`, both fixed-point, in fixed-point
///
/// Returns `None` on overflow.
pub fn checked_notional(price: u64, size: u64) -> Option<u64> {
    let notional = fixed_to_decimal(price).checked_mul(fixed_to_decimal(size))?;
    decimal_to_fixed(notional)
}

// ============================================================================
// Unit Tests
// ============================================================================
