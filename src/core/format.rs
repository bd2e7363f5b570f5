//! Process-wide (well: per-[`crate::parser::ParserContext`]) number
//! formatting used when stringifying a tree back to source.

use std::fmt::Write as _;

/// How numbers are rendered when a tree is stringified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberFormat {
    /// Shortest representation that round-trips, switching to scientific
    /// notation only for very large or very small magnitudes.
    Auto,
    /// Fixed number of digits after the decimal point.
    Fixed,
    /// Always scientific notation.
    Scientific,
}

impl Default for NumberFormat {
    fn default() -> Self {
        Self::Auto
    }
}

/// Renders `value` according to `format` and `precision` (digits after the
/// decimal point for `Fixed`/`Scientific`; significant digits for `Auto`).
#[must_use]
pub fn format_number(value: f64, format: NumberFormat, precision: u8) -> String {
    match format {
        NumberFormat::Auto => format_auto(value, precision),
        NumberFormat::Fixed => {
            let mut out = String::new();
            let _ = write!(out, "{value:.precision$}", precision = usize::from(precision));
            out
        }
        NumberFormat::Scientific => {
            let mut out = String::new();
            let _ = write!(out, "{value:.precision$e}", precision = usize::from(precision));
            out
        }
    }
}

/// Shortest-round-trip-ish rendering that mirrors the original's default
/// stream formatting: `precision` significant digits, switching to
/// scientific notation once the exponent falls outside `[-4, precision)`,
/// with trailing zeros trimmed either way.
fn format_auto(value: f64, precision: u8) -> String {
    if !value.is_finite() || value == 0.0 {
        return format!("{value}");
    }

    let significant = i32::from(precision.max(1));
    let exponent = decimal_exponent(value);

    if exponent < -4 || exponent >= significant {
        let digits = usize::try_from(significant - 1).unwrap_or(0);
        trim_scientific(&format!("{value:.digits$e}"))
    } else {
        let decimals = usize::try_from((significant - 1 - exponent).max(0)).unwrap_or(0);
        trim_fixed(&format!("{value:.decimals$}"))
    }
}

/// The base-10 exponent of `value`'s leading digit, read back from Rust's
/// own scientific formatter rather than `log10` to avoid boundary errors at
/// exact powers of ten.
fn decimal_exponent(value: f64) -> i32 {
    let rendered = format!("{:e}", value.abs());
    rendered.rsplit('e').next().and_then(|exp| exp.parse().ok()).unwrap_or(0)
}

fn trim_fixed(text: &str) -> String {
    if !text.contains('.') {
        return text.to_owned();
    }
    text.trim_end_matches('0').trim_end_matches('.').to_owned()
}

fn trim_scientific(text: &str) -> String {
    let Some(split) = text.find('e') else {
        return text.to_owned();
    };
    let (mantissa, exponent) = text.split_at(split);
    let mantissa = if mantissa.contains('.') {
        mantissa.trim_end_matches('0').trim_end_matches('.')
    } else {
        mantissa
    };
    format!("{mantissa}{exponent}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auto_format_keeps_integers_plain() {
        assert_eq!(format_number(4.0, NumberFormat::Auto, 0), "4");
    }

    #[test]
    fn fixed_format_respects_precision() {
        assert_eq!(format_number(1.0 / 3.0, NumberFormat::Fixed, 2), "0.33");
    }

    #[test]
    fn auto_format_switches_to_scientific_for_large_magnitude() {
        assert_eq!(format_number(123_456_789.0, NumberFormat::Auto, 6), "1.23457e8");
    }

    #[test]
    fn auto_format_switches_to_scientific_for_small_magnitude() {
        assert_eq!(format_number(0.000_012_34, NumberFormat::Auto, 6), "1.234e-5");
    }

    #[test]
    fn auto_format_respects_precision_in_fixed_range() {
        assert_eq!(format_number(1.0 / 3.0, NumberFormat::Auto, 3), "0.333");
    }
}
