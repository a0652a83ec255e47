//! Exact rational arithmetic for score time
//!
//! LilyPond's event listener prints moments either as decimals (`0.333333`)
//! or as fractions (`1/3`). Both parse exactly into a [`Rational`]; rounding
//! only happens when a moment becomes a MIDI tick.

use crate::models::Rational;

/// Longest decimal fraction kept exactly; longer inputs are truncated so the
/// denominator stays inside `i64`.
const MAX_FRACTION_DIGITS: usize = 12;

/// Parse a moment written as `n/d`, a decimal, or (as a last resort) any
/// float literal Rust understands.
pub fn parse_rational(text: &str) -> Option<Rational> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Some((numer, denom)) = text.split_once('/') {
        let numer: i64 = numer.trim().parse().ok()?;
        let denom: i64 = denom.trim().parse().ok()?;
        if denom == 0 {
            return None;
        }
        return Some(Rational::new(numer, denom));
    }

    parse_decimal(text).or_else(|| {
        let value: f64 = text.parse().ok()?;
        if !value.is_finite() {
            return None;
        }
        Rational::approximate_float(value)
    })
}

fn parse_decimal(text: &str) -> Option<Rational> {
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    let (whole, fraction) = digits.split_once('.').unwrap_or((digits, ""));
    if whole.is_empty() && fraction.is_empty() {
        return None;
    }
    if !whole.bytes().all(|b| b.is_ascii_digit()) || !fraction.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let fraction = &fraction[..fraction.len().min(MAX_FRACTION_DIGITS)];
    let denom = 10i64.checked_pow(fraction.len() as u32)?;
    let whole_value: i64 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
    let fraction_value: i64 = if fraction.is_empty() { 0 } else { fraction.parse().ok()? };
    let numer = whole_value.checked_mul(denom)?.checked_add(fraction_value)?;

    Some(Rational::new(if negative { -numer } else { numer }, denom))
}

/// Lossy conversion used for volume arithmetic and display
pub fn rational_to_f64(value: Rational) -> f64 {
    *value.numer() as f64 / *value.denom() as f64
}

/// Convert a position in whole notes to MIDI ticks, rounding to the nearest tick
///
/// # Arguments
/// * `time` - Position in whole notes (a quarter note is `1/4`)
/// * `ticks_per_quarter` - MIDI resolution
pub fn whole_notes_to_ticks(time: Rational, ticks_per_quarter: u16) -> i64 {
    let ticks_per_whole = Rational::from_integer(4 * i64::from(ticks_per_quarter));
    (time * ticks_per_whole).round().to_integer()
}

/// Length of one tick in whole notes
pub fn tick_length(ticks_per_quarter: u16) -> Rational {
    Rational::new(1, 4 * i64::from(ticks_per_quarter.max(1)))
}
