//! Common utilities for postcard generation.
//!
//! Shared helpers for unit conversion, Typst escaping, and date formatting.

use chrono::{DateTime, Datelike, Local, Timelike};

/// Millimetres per typographic point.
pub const MM_PER_PT: f64 = 25.4 / 72.0;

/// Convert points to millimetres.
pub fn pt_to_mm(pt: f64) -> f64 {
    pt * MM_PER_PT
}

/// Format a timestamp the way Japanese reports print it
/// (e.g., "2025年11月06日 14:05:09").
pub fn format_japanese_datetime(at: DateTime<Local>) -> String {
    format!(
        "{}年{:02}月{:02}日 {:02}:{:02}:{:02}",
        at.year(),
        at.month(),
        at.day(),
        at.hour(),
        at.minute(),
        at.second()
    )
}

/// Escape special characters for Typst strings.
pub fn escape_typst_string(value: &str) -> String {
    value
        .replace('\\', r"\\")
        .replace('"', r#"\""#)
        .replace('\n', r"\n")
}

/// Whether a cell value counts as absent.
pub fn is_blank(value: Option<&str>) -> bool {
    value.map_or(true, |v| v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_pt_to_mm() {
        assert!((pt_to_mm(72.0) - 25.4).abs() < 1e-9);
        assert!((pt_to_mm(12.0) - 4.2333).abs() < 1e-3);
    }

    #[test]
    fn test_escape_typst_string() {
        assert_eq!(escape_typst_string(r#"a"b\c"#), r#"a\"b\\c"#);
        assert_eq!(escape_typst_string("東京"), "東京");
    }

    #[test]
    fn test_format_japanese_datetime() {
        let at = Local.with_ymd_and_hms(2025, 11, 6, 9, 5, 3).unwrap();
        assert_eq!(format_japanese_datetime(at), "2025年11月06日 09:05:03");
    }

    #[test]
    fn test_is_blank() {
        assert!(is_blank(None));
        assert!(is_blank(Some("  ")));
        assert!(is_blank(Some("\u{3000}")));
        assert!(!is_blank(Some("x")));
    }
}
