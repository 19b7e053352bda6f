use serde_json::Value;

/// Placeholder rendered for missing values
pub const NO_DATA: &str = "—";

// Formatting thresholds
const SMALL_RATE_THRESHOLD: f64 = 1e-6;
const EXTENDED_PRECISION_THRESHOLD: f64 = 1e-3;
const EXTENDED_RATE_DECIMALS: usize = 8;
const EXPONENTIAL_PRECISION: usize = 2;

/// Safe conversion from string to a finite float
pub fn safe_parse_f64(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    match trimmed.parse::<f64>() {
        Ok(v) if v.is_finite() => Some(v),
        _ => None,
    }
}

/// Parse a numeric wire field that may be a string, a number, null or absent.
/// Anything that is not a finite number becomes `None`.
pub fn parse_rate(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::String(s) => safe_parse_f64(s),
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        _ => None,
    }
}

/// Convert a rate published for `window_hours` into a rate per hour.
///
/// An invalid window leaves the rate untouched rather than dividing by zero.
pub fn normalize_rate(rate: Option<f64>, window_hours: f64) -> Option<f64> {
    let rate = rate.filter(|r| r.is_finite())?;
    if !window_hours.is_finite() || window_hours <= 0.0 {
        return Some(rate);
    }
    Some(rate / window_hours).filter(|r| r.is_finite())
}

/// Scale a per-hour rate to a timeframe of `hours`
pub fn scale_rate(rate: Option<f64>, hours: f64) -> Option<f64> {
    rate.map(|r| r * hours)
}

/// Format a funding rate for display.
///
/// Tiny magnitudes switch to scientific notation and sub-0.1% magnitudes get
/// extra decimals so they do not collapse to zero.
pub fn format_rate(value: Option<f64>, fraction_digits: usize) -> String {
    let value = match value {
        Some(v) if !v.is_nan() => v,
        _ => return NO_DATA.to_string(),
    };

    let abs = value.abs();
    if abs != 0.0 && abs < SMALL_RATE_THRESHOLD {
        return format!("{:.*e}", EXPONENTIAL_PRECISION, value);
    }

    let digits = if abs < EXTENDED_PRECISION_THRESHOLD {
        fraction_digits.max(EXTENDED_RATE_DECIMALS)
    } else {
        fraction_digits
    };

    format!("{:.*}", digits, value)
}

/// Format a percentage, rendering missing values as an explicit marker
pub fn format_percentage(value: Option<f64>, fraction_digits: usize) -> String {
    match value {
        Some(v) if !v.is_nan() => format!("{:.*}%", fraction_digits, v),
        _ => NO_DATA.to_string(),
    }
}
