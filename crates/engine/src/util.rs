//! Internal helpers for name normalization and date math.
//!
//! These utilities are **not** part of the public API. They centralize
//! validation and mapping logic so the engine enforces consistent invariants.

use chrono::NaiveDate;
use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};

/// Collapse internal whitespace and trim, preserving the user's casing.
///
/// Returns `None` when nothing printable remains.
pub(crate) fn normalize_display(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    let mut out = String::new();
    for token in trimmed.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(token);
    }
    if out.is_empty() { None } else { Some(out) }
}

/// Reduce a name to its canonical lookup key.
///
/// NFKD-decomposes, drops combining marks, lowercases alphanumerics and
/// collapses every other run of characters to a single space. Two names with
/// the same key are the same account or channel.
pub(crate) fn normalize_key(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }

    let mut out = String::new();
    let mut prev_space = false;
    for ch in trimmed.nfkd() {
        if is_combining_mark(ch) {
            continue;
        }
        if ch.is_alphanumeric() {
            for lower in ch.to_lowercase() {
                out.push(lower);
            }
            prev_space = false;
        } else if !out.is_empty() && !prev_space {
            out.push(' ');
            prev_space = true;
        }
    }
    let normalized = out.trim();
    if normalized.is_empty() {
        None
    } else {
        Some(normalized.to_string())
    }
}

/// First and last day of a calendar month.
pub(crate) fn month_bounds(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let start = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some((start, next.pred_opt()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_collapses_whitespace() {
        assert_eq!(
            normalize_display("  Kas   Utama  ").as_deref(),
            Some("Kas Utama")
        );
        assert_eq!(normalize_display("   ").as_deref(), None);
    }

    #[test]
    fn key_folds_case_and_accents() {
        assert_eq!(normalize_key("  Kas   UTAMA ").as_deref(), Some("kas utama"));
        assert_eq!(normalize_key("Café").as_deref(), Some("cafe"));
        assert_eq!(normalize_key("Beban - Sewa").as_deref(), Some("beban sewa"));
        assert_eq!(normalize_key("!!!").as_deref(), None);
    }

    #[test]
    fn month_bounds_handles_year_end() {
        assert_eq!(
            month_bounds(2026, 12),
            Some((
                NaiveDate::from_ymd_opt(2026, 12, 1).unwrap(),
                NaiveDate::from_ymd_opt(2026, 12, 31).unwrap()
            ))
        );
        assert_eq!(
            month_bounds(2026, 2),
            Some((
                NaiveDate::from_ymd_opt(2026, 2, 1).unwrap(),
                NaiveDate::from_ymd_opt(2026, 2, 28).unwrap()
            ))
        );
        assert_eq!(month_bounds(2026, 13), None);
    }
}
