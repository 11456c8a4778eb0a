// src/parse/number.rs
use once_cell::sync::Lazy;
use regex::Regex;

use crate::table::Cell;

static NON_NUMERIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^0-9,.\-]").unwrap());
static NON_DIGIT_MINUS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^0-9\-]").unwrap());
static NON_DIGIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^0-9]").unwrap());

/// Locale-tolerant numeric parse. Accepts both `1.234,56` and `1,234.56`:
/// whichever separator occurs rightmost is the decimal point, every other
/// comma or period is a grouping mark. Unparseable input is `None`, never an
/// error, so a bad cell degrades to a missing value instead of dropping the
/// row.
pub fn parse_number(cell: &Cell) -> Option<f64> {
    match cell {
        Cell::Number(n) => Some(*n),
        Cell::Text(s) => parse_number_str(s),
        _ => None,
    }
}

/// Percentage-aware variant: a literal `%` in the text divides the magnitude
/// by 100; its absence leaves already-fractional values at their own scale.
pub fn parse_percent(cell: &Cell) -> Option<f64> {
    match cell {
        Cell::Number(n) => Some(*n),
        Cell::Text(s) => {
            let val = parse_number_str(s)?;
            if s.contains('%') {
                Some(val / 100.0)
            } else {
                Some(val)
            }
        }
        _ => None,
    }
}

pub fn parse_number_str(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let s = NON_NUMERIC.replace_all(trimmed, "");
    match s.as_ref() {
        "" | "-" | "," | "." => return None,
        _ => {}
    }

    let last_comma = s.rfind(',');
    let last_dot = s.rfind('.');
    if last_comma.is_none() && last_dot.is_none() {
        return s.parse::<f64>().ok();
    }

    // The rightmost separator is the decimal point; everything before it is
    // the integer part with grouping marks removed.
    let dec_pos = match (last_comma, last_dot) {
        (Some(c), Some(d)) => c.max(d),
        (Some(c), None) => c,
        (None, Some(d)) => d,
        (None, None) => unreachable!(),
    };
    let int_part = NON_DIGIT_MINUS.replace_all(&s[..dec_pos], "");
    let frac_part = NON_DIGIT.replace_all(&s[dec_pos + 1..], "");

    let num = if frac_part.is_empty() {
        int_part.to_string()
    } else {
        format!("{}.{}", int_part, frac_part)
    };
    num.parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Cell {
        Cell::Text(s.to_string())
    }

    #[test]
    fn parses_both_separator_conventions() {
        assert_eq!(parse_number_str("1.234,56"), Some(1234.56));
        assert_eq!(parse_number_str("1,234.56"), Some(1234.56));
        assert_eq!(parse_number_str("1.234.567,89"), Some(1234567.89));
        assert_eq!(parse_number_str("1234"), Some(1234.0));
        assert_eq!(parse_number_str("-2,5"), Some(-2.5));
    }

    #[test]
    fn strips_stray_symbols() {
        assert_eq!(parse_number_str("R$ 1.234,56"), Some(1234.56));
        assert_eq!(parse_number_str(" 12 % "), Some(12.0));
    }

    #[test]
    fn separator_only_input_is_missing() {
        assert_eq!(parse_number_str("-"), None);
        assert_eq!(parse_number_str(","), None);
        assert_eq!(parse_number_str("."), None);
        assert_eq!(parse_number_str(""), None);
        assert_eq!(parse_number_str("abc"), None);
    }

    #[test]
    fn numeric_cells_bypass_separator_logic() {
        assert_eq!(parse_number(&Cell::Number(3.5)), Some(3.5));
        assert_eq!(parse_number(&Cell::Blank), None);
    }

    #[test]
    fn percent_variant_scales_only_on_literal_percent() {
        assert_eq!(parse_percent(&text("12%")), Some(0.12));
        assert_eq!(parse_percent(&text("1,01%")), Some(0.0101));
        assert_eq!(parse_percent(&text("0,34")), Some(0.34));
        assert_eq!(parse_percent(&Cell::Number(0.34)), Some(0.34));
        assert_eq!(parse_percent(&text("-")), None);
    }
}
