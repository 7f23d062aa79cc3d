use regex::Regex;
use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;
use std::sync::LazyLock;

use crate::models::DiscountBreakdown;

static DISCOUNT_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?i)desconto:\s*(\d+(?:[.,]\d+)?)\s*%").ok());

/// Extract `N` from a `Desconto: N%` marker. Values outside `[0, 100)` are
/// ignored, as is a missing or malformed marker.
pub fn parse_discount_percent(description: &str) -> Option<Decimal> {
    let captures = DISCOUNT_PATTERN.as_ref()?.captures(description)?;
    let raw = captures.get(1)?.as_str().replace(',', ".");
    let percent = Decimal::from_str(&raw).ok()?;
    if percent.is_sign_negative() || percent >= Decimal::ONE_HUNDRED {
        return None;
    }
    Some(percent)
}

fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

fn no_discount(amount: Decimal) -> DiscountBreakdown {
    DiscountBreakdown {
        amount,
        original_amount: amount,
        discount_percent: None,
        discount_value: Decimal::ZERO,
    }
}

/// Recover the pre-discount amount of an invoice from its description.
///
/// A percentage so close to 100 that the original amount does not fit in a
/// `Decimal` is treated as no discount.
pub fn discount_breakdown(amount: Decimal, description: Option<&str>) -> DiscountBreakdown {
    let percent = description
        .and_then(parse_discount_percent)
        .filter(|p| !p.is_zero());

    let Some(percent) = percent else {
        return no_discount(amount);
    };

    let factor = Decimal::ONE - percent / Decimal::ONE_HUNDRED;
    let Some(original_amount) = amount.checked_div(factor).map(round_money) else {
        return no_discount(amount);
    };
    let Some(discount_value) = original_amount.checked_sub(amount).map(round_money) else {
        return no_discount(amount);
    };

    DiscountBreakdown {
        amount,
        original_amount,
        discount_percent: Some(percent),
        discount_value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifteen_percent_of_one_hundred() {
        let result = discount_breakdown(Decimal::new(85, 0), Some("Mensalidade - Desconto: 15%"));
        assert_eq!(result.original_amount, Decimal::new(10000, 2));
        assert_eq!(result.discount_value, Decimal::new(1500, 2));
        assert_eq!(result.discount_percent, Some(Decimal::new(15, 0)));
    }

    #[test]
    fn test_case_insensitive_with_decimal_comma() {
        let percent = parse_discount_percent("plano anual DESCONTO: 12,5 %");
        assert_eq!(percent, Some(Decimal::new(125, 1)));
    }

    #[test]
    fn test_no_marker_means_no_discount() {
        let amount = Decimal::new(14990, 2);
        let result = discount_breakdown(amount, Some("Fatura avulsa"));
        assert_eq!(result.original_amount, amount);
        assert_eq!(result.discount_value, Decimal::ZERO);
        assert!(result.discount_percent.is_none());

        let result = discount_breakdown(amount, None);
        assert_eq!(result.original_amount, amount);
    }

    #[test]
    fn test_hundred_percent_is_ignored() {
        assert!(parse_discount_percent("Desconto: 100%").is_none());
        let result = discount_breakdown(Decimal::ZERO, Some("Desconto: 100%"));
        assert_eq!(result.original_amount, Decimal::ZERO);
    }

    #[test]
    fn test_rounds_to_cents() {
        // 100 / 0.7 = 142.857...
        let result = discount_breakdown(Decimal::new(100, 0), Some("Desconto: 30%"));
        assert_eq!(result.original_amount, Decimal::new(14286, 2));
        assert_eq!(result.discount_value, Decimal::new(4286, 2));
    }

    #[test]
    fn test_percent_near_hundred_does_not_overflow() {
        let description = "Desconto: 99.99999999999999999999999999%";
        for amount in [Decimal::new(10, 0), Decimal::new(1_000_000, 0), Decimal::MAX] {
            let result = discount_breakdown(amount, Some(description));
            assert_eq!(result.amount, amount);
            assert!(result.original_amount >= amount);
        }

        let result = discount_breakdown(Decimal::new(1_000_000, 0), Some(description));
        assert!(result.discount_percent.is_none());
        assert_eq!(result.discount_value, Decimal::ZERO);
    }
}
