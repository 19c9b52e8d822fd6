//! Utility functions and helpers

use std::str::FromStr;

use chrono::{DateTime, FixedOffset};
use regex::Regex;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::shared::errors::PriceError;

/// Format amount with two decimals and Indian digit grouping (`₹1,23,456.50`)
pub fn format_amount(amount: Decimal, currency_symbol: &str) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let text = format!("{:.2}", rounded.abs());
    let (integer, fraction) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() { "-" } else { "" };
    format!("{}{}{}.{}", sign, currency_symbol, group_indian(integer), fraction)
}

// 1234567 -> 12,34,567
fn group_indian(digits: &str) -> String {
    if digits.len() <= 3 {
        return digits.to_string();
    }

    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut groups: Vec<&str> = Vec::new();
    let mut end = head.len();
    while end > 0 {
        let start = end.saturating_sub(2);
        groups.push(&head[start..end]);
        end = start;
    }
    groups.reverse();

    format!("{},{}", groups.join(","), tail)
}

/// Calculate percentage change
pub fn calculate_percentage_change(old_value: Decimal, new_value: Decimal) -> Option<Decimal> {
    if old_value.is_zero() {
        return None;
    }
    Some(((new_value - old_value) / old_value * Decimal::ONE_HUNDRED).round_dp(2))
}

const PRICE_NUMBER: &str = r"-?\d[\d,]*(?:\.\d+)?";

/// Parse a scraped price text such as `"₹7,512.50"` or `"Rs. 7,512"`.
///
/// The first number in the text wins; grouping commas are dropped. Anything
/// after it (a unit, a daily change) is ignored.
pub fn parse_price_text(raw: &str) -> Result<Decimal, PriceError> {
    let pattern = Regex::new(PRICE_NUMBER)
        .map_err(|e| PriceError::fetch_failed(format!("price pattern: {}", e)))?;
    let number = pattern
        .find(raw)
        .ok_or_else(|| PriceError::fetch_failed(format!("no number in {:?}", raw)))?;
    let cleaned = number.as_str().replace(',', "");

    Decimal::from_str(&cleaned)
        .map_err(|e| PriceError::fetch_failed(format!("cannot parse {:?} as price: {}", raw, e)))
}

/// Human-readable local time, e.g. `14/10/2026, 3:04:05 pm`
pub fn format_local_time(at: &DateTime<FixedOffset>) -> String {
    at.format("%d/%m/%Y, %-I:%M:%S %P").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    #[test]
    fn test_format_amount_grouping() {
        assert_eq!(format_amount(dec!(7512.5), "₹"), "₹7,512.50");
        assert_eq!(format_amount(dec!(123456.789), "₹"), "₹1,23,456.79");
        assert_eq!(format_amount(dec!(12345678), "₹"), "₹1,23,45,678.00");
        assert_eq!(format_amount(dec!(999), ""), "999.00");
        assert_eq!(format_amount(dec!(0), "$"), "$0.00");
    }

    #[test]
    fn test_calculate_percentage_change() {
        assert_eq!(calculate_percentage_change(dec!(100), dec!(105)), Some(dec!(5)));
        assert_eq!(calculate_percentage_change(dec!(105), dec!(98)), Some(dec!(-6.67)));
        assert_eq!(calculate_percentage_change(dec!(0), dec!(98)), None);
    }

    #[test]
    fn test_parse_price_text() {
        assert_eq!(parse_price_text("₹7,512.50").unwrap(), dec!(7512.50));
        assert_eq!(parse_price_text(" 73,120 INR ").unwrap(), dec!(73120));
        assert!(parse_price_text("n/a").is_err());
        assert!(parse_price_text("-").is_err());
    }

    #[test]
    fn test_parse_price_text_ignores_surrounding_dots_and_numbers() {
        assert_eq!(parse_price_text("Rs. 7,512").unwrap(), dec!(7512));
        assert_eq!(parse_price_text("Rs.7,512.25/10g").unwrap(), dec!(7512.25));
        assert_eq!(parse_price_text("7,512 (-0.5%)").unwrap(), dec!(7512));
        assert_eq!(parse_price_text("-12.5").unwrap(), dec!(-12.5));
    }

    #[test]
    fn test_format_local_time() {
        let ist = FixedOffset::east_opt(19800).unwrap();
        let at = ist.with_ymd_and_hms(2026, 10, 14, 15, 4, 5).unwrap();
        assert_eq!(format_local_time(&at), "14/10/2026, 3:04:05 pm");
    }
}
