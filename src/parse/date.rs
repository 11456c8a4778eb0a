// src/parse/date.rs
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::table::Cell;

static YEAR_MONTH: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d{4})-(\d{1,2})$").unwrap());

/// Day-first date parse for milestone cells. Accepts `dd/mm/yyyy` and ISO
/// `yyyy-mm-dd`; a trailing time component is ignored.
pub fn parse_date_str(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    let date_part = s.split_whitespace().next().unwrap_or(s);
    NaiveDate::parse_from_str(date_part, "%d/%m/%Y")
        .or_else(|_| NaiveDate::parse_from_str(date_part, "%Y-%m-%d"))
        .ok()
}

pub fn parse_date_cell(cell: &Cell) -> Option<NaiveDate> {
    match cell {
        Cell::Date(d) => Some(*d),
        Cell::Text(s) => parse_date_str(s),
        _ => None,
    }
}

/// Reference-month cleanup for the curve report: `"2026-5"` and `"2026-05"`
/// become `"01/05/2026"`; every other shape passes through untouched.
pub fn format_reference_month(raw: &str) -> String {
    let s = raw.trim();
    match YEAR_MONTH.captures(s) {
        Some(caps) => format!("01/{:0>2}/{}", &caps[2], &caps[1]),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_day_first_and_iso() {
        let d = NaiveDate::from_ymd_opt(2024, 7, 15).unwrap();
        assert_eq!(parse_date_str("15/07/2024"), Some(d));
        assert_eq!(parse_date_str("2024-07-15"), Some(d));
        assert_eq!(parse_date_str("15/07/2024 10:30:00"), Some(d));
        assert_eq!(parse_date_str("not a date"), None);
        assert_eq!(parse_date_str(""), None);
    }

    #[test]
    fn reference_month_is_expanded_to_first_of_month() {
        assert_eq!(format_reference_month("2026-05"), "01/05/2026");
        assert_eq!(format_reference_month("2026-5"), "01/05/2026");
        assert_eq!(format_reference_month(" 2026-12 "), "01/12/2026");
        assert_eq!(format_reference_month("01/05/2026"), "01/05/2026");
        assert_eq!(format_reference_month("abc"), "abc");
    }
}
