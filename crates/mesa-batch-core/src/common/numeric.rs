//! Decimal rendering and parsing shared by run names, inlists and MESA tables.

/// Shortest decimal text that parses back to exactly `value` (`5.0` renders as `5`).
pub fn format_decimal(value: f64) -> String {
    // `+ 0.0` turns `-0.0` into `0.0`
    format!("{}", value + 0.0)
}

pub fn parse_decimal(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok()
}

/// Parses the plain `digits[.digits]` form that [`format_decimal`] emits for
/// non-negative values. Signs, exponents and `inf`/`NaN` are rejected.
pub fn parse_plain_decimal(text: &str) -> Option<f64> {
    let (integer, fraction) = match text.split_once('.') {
        Some((integer, fraction)) => (integer, Some(fraction)),
        None => (text, None),
    };
    let all_digits = |part: &str| !part.is_empty() && part.bytes().all(|byte| byte.is_ascii_digit());
    if !all_digits(integer) || !fraction.is_none_or(all_digits) {
        return None;
    }
    text.parse::<f64>().ok().filter(|value| value.is_finite())
}

/// Parses a Fortran real literal: `1d-3`, `0.02D0`, `1.0E+05`, and the
/// exponent-letter-less `0.1234-100` that Fortran writes for three-digit exponents.
pub fn parse_fortran_real(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    let normalized = trimmed.replace(['d', 'D'], "e");
    if let Ok(value) = normalized.parse::<f64>() {
        return Some(value);
    }

    let sign_position = normalized
        .char_indices()
        .skip(1)
        .filter(|(_, ch)| *ch == '+' || *ch == '-')
        .map(|(index, _)| index)
        .last()?;
    let (mantissa, exponent) = normalized.split_at(sign_position);
    if mantissa.ends_with(['e', 'E']) {
        return None;
    }
    format!("{}e{}", mantissa, exponent).parse::<f64>().ok()
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10_f64.powi(decimals);
    (value * scale).round() / scale
}
