//! Shared helper functions for CLI commands
//!
//! Formatting, date and selection parsing used across multiple command
//! modules.

use chrono::{Duration, Local, NaiveDate};

use crate::api::models::Money;

/// Truncate a string to max_len characters, adding "..." if truncated
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Keep the first `keep` characters, appending `...` when anything was cut
pub fn ellipsize(s: &str, keep: usize) -> String {
    if s.chars().count() > keep {
        format!("{}...", clip(s, keep))
    } else {
        s.to_string()
    }
}

/// Cut a string to at most max_len characters without a marker
pub fn clip(s: &str, max_len: usize) -> String {
    s.chars().take(max_len).collect()
}

/// Capitalize the first letter of every word, lowercasing the rest
///
/// A word starts after any non-alphabetic character, so `"kid's app"`
/// becomes `"Kid'S App"`.
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut at_word_start = true;
    for c in s.chars() {
        if c.is_alphabetic() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = true;
        }
    }
    out
}

/// Format an integer with thousands separators
pub fn format_number(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

pub fn format_count(n: Option<u64>) -> String {
    n.map(format_number).unwrap_or_else(|| "-".to_string())
}

/// Format a ratio (0.0123) as a percentage ("1.23%")
pub fn format_percent(ratio: Option<f64>) -> String {
    ratio
        .map(|r| format!("{:.2}%", r * 100.0))
        .unwrap_or_else(|| "-".to_string())
}

pub fn format_money(money: Option<&Money>) -> String {
    money.map(|m| m.to_string()).unwrap_or_else(|| "-".to_string())
}

/// Format a bid as "1.23 USD"
pub fn format_bid(amount: f64, currency: &str) -> String {
    format!("{:.2} {}", amount, currency)
}

/// Round to cents
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Parse a YYYY-MM-DD date
pub fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| format!("Invalid date format: '{}'. Use YYYY-MM-DD format.", s))
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Report window of `days` days ending yesterday (inclusive of both ends
/// when `inclusive` is set, otherwise the start is `days` before the end)
pub fn window_ending_yesterday(days: u32, inclusive: bool) -> (NaiveDate, NaiveDate) {
    let end = today() - Duration::days(1);
    let span = if inclusive {
        i64::from(days.saturating_sub(1))
    } else {
        i64::from(days)
    };
    (end - Duration::days(span), end)
}

/// Parse a selection like `1,2,5-7` or `all` into zero-based indices
///
/// Numbers are one-based; anything outside `1..=count` or unparseable is
/// ignored. The result is sorted and deduplicated.
pub fn parse_selection(input: &str, count: usize) -> Vec<usize> {
    let input = input.trim();
    if input.is_empty() || input.eq_ignore_ascii_case("all") {
        return (0..count).collect();
    }

    let mut picked: Vec<usize> = Vec::new();
    for part in input.split(',').map(str::trim) {
        let range = match part.split_once('-') {
            Some((a, b)) => match (a.trim().parse::<usize>(), b.trim().parse::<usize>()) {
                (Ok(a), Ok(b)) => a..=b,
                _ => continue,
            },
            None => match part.parse::<usize>() {
                Ok(n) => n..=n,
                Err(_) => continue,
            },
        };
        picked.extend(range.filter(|n| (1..=count).contains(n)).map(|n| n - 1));
    }
    picked.sort_unstable();
    picked.dedup();
    picked
}

/// Show the first `visible` characters of a secret followed by "..."
pub fn mask(s: &str, visible: usize) -> String {
    if s.chars().count() <= visible {
        s.to_string()
    } else {
        format!("{}...", clip(s, visible))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ellipsize() {
        assert_eq!(ellipsize("short", 5), "short");
        assert_eq!(ellipsize("shorter", 5), "short...");
        assert_eq!(ellipsize("Türkiye", 3), "Tür...");
    }

    #[test]
    fn test_truncate_str() {
        assert_eq!(truncate_str("hello", 10), "hello");
        assert_eq!(truncate_str("hello world", 8), "hello...");
        assert_eq!(truncate_str("hi", 2), "hi");
        assert_eq!(truncate_str("Türkiye Türkiye", 8), "Türki...");
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("chippy tools"), "Chippy Tools");
        assert_eq!(title_case("CALCULATOR pro"), "Calculator Pro");
        assert_eq!(title_case("kid's app"), "Kid'S App");
        assert_eq!(title_case("3d scanner"), "3D Scanner");
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1000), "1,000");
        assert_eq!(format_number(1234567), "1,234,567");
        assert_eq!(format_count(None), "-");
    }

    #[test]
    fn test_format_percent() {
        assert_eq!(format_percent(Some(0.0523)), "5.23%");
        assert_eq!(format_percent(None), "-");
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("2024-02-29").unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
        let err = parse_date("02/29/2024").unwrap_err();
        assert_eq!(err, "Invalid date format: '02/29/2024'. Use YYYY-MM-DD format.");
    }

    #[test]
    fn test_parse_selection() {
        assert_eq!(parse_selection("all", 3), vec![0, 1, 2]);
        assert_eq!(parse_selection("", 2), vec![0, 1]);
        assert_eq!(parse_selection("1, 3", 5), vec![0, 2]);
        assert_eq!(parse_selection("2-4,1", 5), vec![0, 1, 2, 3]);
        assert_eq!(parse_selection("0,9,x,2-z", 5), Vec::<usize>::new());
        assert_eq!(parse_selection("4-9", 5), vec![3, 4]);
    }

    #[test]
    fn test_window_ending_yesterday() {
        let (start, end) = window_ending_yesterday(7, true);
        assert_eq!(end - start, Duration::days(6));
        let (start, end) = window_ending_yesterday(30, false);
        assert_eq!(end - start, Duration::days(30));
        assert_eq!(end, today() - Duration::days(1));
    }

    #[test]
    fn test_mask_and_round() {
        assert_eq!(mask("SEARCHADS.1234567890abcdef", 20), "SEARCHADS.1234567890...");
        assert_eq!(mask("short", 20), "short");
        assert_eq!(round2(1.005_f64 + 0.0001), 1.01);
        assert_eq!(format_bid(1.5, "USD"), "1.50 USD");
    }
}
