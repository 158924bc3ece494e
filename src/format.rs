//! Display helpers for wire-form numeric strings.

/// Parse a wire value as a finite number. `"NaN"` and partial garbage both
/// count as non-numeric so callers get a total, deterministic answer.
pub(crate) fn parse_numeric(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|value| !value.is_nan())
}

/// Render a USD price with adaptive precision.
///
/// Prices below 0.0001 get `floor(-log10(price)) - 1` leading zeros plus
/// five significant places so micro-cap quotes stay legible; zero renders
/// as a fixed four-decimal zero; everything else is fixed four decimals.
/// Non-numeric input renders as a placeholder dash.
pub fn format_price(raw: &str) -> String {
    let Some(price) = parse_numeric(raw) else {
        return "-".to_string();
    };

    if price > 0.0 && price < 0.0001 {
        let precision = (-price.log10()).floor() as usize - 1 + 5;
        return format!("{price:.precision$}");
    }

    if price == 0.0 {
        return "0.0000".to_string();
    }

    format!("{price:.4}")
}

/// Render a signed 24h change with two fixed decimals, dash when the wire
/// value is not numeric.
pub fn format_percent(raw: &str) -> String {
    match parse_numeric(raw) {
        Some(change) => format!("{change:.2}"),
        None => "-".to_string(),
    }
}

/// Whether the change should get the loss treatment. Purely cosmetic; the
/// presentation layer decides what that treatment is.
pub fn percent_is_loss(raw: &str) -> bool {
    matches!(parse_numeric(raw), Some(change) if change < 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::Regex;

    #[test]
    fn regular_prices_use_fixed_four_decimals() {
        assert_eq!(format_price("1.5"), "1.5000");
        assert_eq!(format_price("0.1234"), "0.1234");
        assert_eq!(format_price("12345.67891"), "12345.6789");
        assert_eq!(format_price("0.0001"), "0.0001");
    }

    #[test]
    fn zero_price_renders_as_four_decimal_zero() {
        assert_eq!(format_price("0"), "0.0000");
        assert_eq!(format_price("0.0"), "0.0000");
    }

    #[test]
    fn tiny_prices_expand_precision_instead_of_collapsing_to_zero() {
        // 1e-5 has four leading zeros: floor(5) - 1 = 4, so 9 decimals.
        assert_eq!(format_price("0.00001"), "0.000010000");
        assert_eq!(format_price("0.00000123"), "0.000001230");

        let rendered = format_price("0.000099");
        assert_ne!(rendered, "0.0000");
        assert!(rendered.starts_with("0.0000"));
    }

    #[test]
    fn tiny_price_rendering_keeps_significant_digits() {
        let pattern = Regex::new(r"^0\.0+[1-9]\d*$").unwrap();
        for raw in ["0.00001", "0.0000042", "0.000000009"] {
            let rendered = format_price(raw);
            assert!(pattern.is_match(&rendered), "{raw} rendered as {rendered}");
        }
    }

    #[test]
    fn non_numeric_price_renders_a_dash() {
        assert_eq!(format_price(""), "-");
        assert_eq!(format_price("n/a"), "-");
        assert_eq!(format_price("NaN"), "-");
    }

    #[test]
    fn percent_keeps_sign_and_two_decimals() {
        assert_eq!(format_percent("3.456"), "3.46");
        assert_eq!(format_percent("-0.1"), "-0.10");
        assert_eq!(format_percent("0"), "0.00");
        assert_eq!(format_percent("what"), "-");
    }

    #[test]
    fn loss_treatment_applies_to_strictly_negative_changes() {
        assert!(percent_is_loss("-0.01"));
        assert!(!percent_is_loss("0"));
        assert!(!percent_is_loss("2.5"));
        assert!(!percent_is_loss("garbage"));
    }
}
