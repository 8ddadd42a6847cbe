//! Rounding and display helpers for currency amounts.

use std::sync::OnceLock;

use numfmt::{Formatter, Precision};

/// Round `value` to `places` decimal places, rounding half away from zero.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    let rounded = (value * factor).round() / factor;

    // Avoid "-0.00" in reports.
    if rounded == 0.0 { 0.0 } else { rounded }
}

/// Format `number` as a dollar amount with thousands separators and two
/// decimal places, e.g. "$1,234.50" or "-$3.00".
pub fn format_currency(number: f64) -> String {
    static POSITIVE_FMT: OnceLock<Formatter> = OnceLock::new();

    let positive_fmt = POSITIVE_FMT.get_or_init(|| {
        Formatter::currency("$")
            .unwrap()
            .precision(Precision::Decimals(2))
    });

    static NEGATIVE_FMT: OnceLock<Formatter> = OnceLock::new();

    let negative_fmt = NEGATIVE_FMT.get_or_init(|| {
        Formatter::currency("-$")
            .unwrap()
            .precision(Precision::Decimals(2))
    });

    let mut formatted_string = if number < 0.0 {
        negative_fmt.fmt_string(number.abs())
    } else if number > 0.0 {
        positive_fmt.fmt_string(number)
    } else {
        // Zero is hardcoded as "0", so we must specify the formatted string for zero
        "$0.00".to_owned()
    };

    // numfmt omits trailing zeros, e.g. "12.30" is rendered as "12.3" and
    // "12.00" as "12".
    if let Some(dot) = formatted_string.rfind('.') {
        let decimals = formatted_string.len() - dot - 1;
        for _ in decimals..2 {
            formatted_string.push('0');
        }
    } else {
        formatted_string.push_str(".00");
    }

    formatted_string
}
