//! Formatting utilities for consistent display of money values
//!
//! KRW amounts are whole-won with comma separators ("1,234,567원");
//! USD amounts keep two decimal places ("$1,234.56").

use rust_decimal::Decimal;

fn group_thousands(digits: &str) -> String {
    digits
        .chars()
        .rev()
        .enumerate()
        .flat_map(|(i, c)| {
            if i > 0 && i % 3 == 0 {
                vec![',', c]
            } else {
                vec![c]
            }
        })
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect()
}

/// Format a KRW amount: rounded to whole won, comma separators, 원 suffix.
///
/// # Examples
/// ```
/// use baedang::utils::format_krw;
/// use rust_decimal::Decimal;
///
/// assert_eq!(format_krw(Decimal::from(1234567)), "1,234,567원");
/// assert_eq!(format_krw(Decimal::from(-500)), "-500원");
/// ```
pub fn format_krw(value: Decimal) -> String {
    let rounded = value.round();
    let is_negative = rounded < Decimal::ZERO;
    let digits = rounded.abs().to_string();
    let sign = if is_negative { "-" } else { "" };
    format!("{}{}원", sign, group_thousands(&digits))
}

/// Format a USD amount with two decimal places.
///
/// # Examples
/// ```
/// use baedang::utils::format_usd;
/// use rust_decimal::Decimal;
///
/// assert_eq!(format_usd(Decimal::new(123456, 2)), "$1,234.56");
/// ```
pub fn format_usd(value: Decimal) -> String {
    let is_negative = value < Decimal::ZERO;
    let formatted = format!("{:.2}", value.abs());
    let (integer_part, decimal_part) = formatted.split_once('.').unwrap_or((&formatted, "00"));
    let sign = if is_negative { "-" } else { "" };
    format!("{}${}.{}", sign, group_thousands(integer_part), decimal_part)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_format_krw_basic() {
        assert_eq!(format_krw(dec!(0)), "0원");
        assert_eq!(format_krw(dec!(999)), "999원");
        assert_eq!(format_krw(dec!(1000)), "1,000원");
        assert_eq!(format_krw(dec!(2500000)), "2,500,000원");
        assert_eq!(format_krw(dec!(1234567890)), "1,234,567,890원");
    }

    #[test]
    fn test_format_krw_rounds_to_whole_won() {
        assert_eq!(format_krw(dec!(749.98)), "750원");
        assert_eq!(format_krw(dec!(749.4)), "749원");
    }

    #[test]
    fn test_format_krw_negative() {
        assert_eq!(format_krw(dec!(-340000)), "-340,000원");
    }

    #[test]
    fn test_format_usd() {
        assert_eq!(format_usd(dec!(0)), "$0.00");
        assert_eq!(format_usd(dec!(15)), "$15.00");
        assert_eq!(format_usd(dec!(1234.5)), "$1,234.50");
        assert_eq!(format_usd(dec!(-20.25)), "-$20.25");
    }
}
