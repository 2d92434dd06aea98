use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tracing::warn;

use crate::error::QualificationError;

/// Decides whether a list/sale price pair is a genuine, significant discount.
#[derive(Debug, Clone, Copy)]
pub struct DiscountRule {
    pub min_discount: u8,
    pub max_discount: u8,
}

impl Default for DiscountRule {
    fn default() -> Self {
        Self {
            min_discount: 20,
            max_discount: 90,
        }
    }
}

impl DiscountRule {
    pub fn new(min_discount: u8, max_discount: u8) -> Self {
        Self { min_discount, max_discount }
    }

    /// Integer percentage, truncated toward zero. `None` for price pairs that cannot carry a discount.
    pub fn percent(list_price: Decimal, sale_price: Decimal) -> Option<u8> {
        if list_price <= Decimal::ZERO || sale_price <= Decimal::ZERO || sale_price >= list_price {
            return None;
        }

        let diff = list_price.checked_sub(sale_price)?;
        // scale first for exactness; divide first when scaling would overflow
        let ratio = match diff.checked_mul(Decimal::ONE_HUNDRED) {
            Some(scaled) => scaled.checked_div(list_price)?,
            None => diff.checked_div(list_price)?.checked_mul(Decimal::ONE_HUNDRED)?,
        };
        ratio.floor().to_u8()
    }

    pub fn evaluate(&self, list_price: Decimal, sale_price: Decimal) -> Result<u8, QualificationError> {
        let discount = Self::percent(list_price, sale_price).ok_or(QualificationError::InvalidPrice)?;

        if discount > self.max_discount {
            warn!("Suspicious discount: {}% (list {}, sale {})", discount, list_price, sale_price);
            return Err(QualificationError::SuspiciousDiscount(discount));
        }

        if discount < self.min_discount {
            return Err(QualificationError::BelowThreshold(discount));
        }

        Ok(discount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn d(units: i64, scale: u32) -> Decimal {
        Decimal::new(units, scale)
    }

    #[test]
    fn test_discount_truncates() {
        let rule = DiscountRule::default();
        // 33.33..% -> 33
        assert_eq!(rule.evaluate(d(300, 0), d(200, 0)), Ok(33));
        // 29.99% -> 29, not 30
        assert_eq!(DiscountRule::percent(d(10000, 2), d(7001, 2)), Some(29));
        assert_eq!(rule.evaluate(d(2000, 0), d(1000, 0)), Ok(50));
    }

    #[test]
    fn test_huge_prices_do_not_overflow() {
        let rule = DiscountRule::default();
        let list = Decimal::from_str("79000000000000000000000000000").unwrap();
        let sale = Decimal::from_str("40000000000000000000000000000").unwrap();
        assert_eq!(rule.evaluate(list, sale), Ok(49));
        assert!(matches!(
            rule.evaluate(Decimal::MAX, Decimal::new(1, 0)),
            Err(QualificationError::SuspiciousDiscount(_))
        ));
    }

    #[test]
    fn test_invalid_price_pairs() {
        let rule = DiscountRule::default();
        assert_eq!(rule.evaluate(Decimal::ZERO, d(10, 0)), Err(QualificationError::InvalidPrice));
        assert_eq!(rule.evaluate(d(100, 0), Decimal::ZERO), Err(QualificationError::InvalidPrice));
        assert_eq!(rule.evaluate(d(100, 0), d(100, 0)), Err(QualificationError::InvalidPrice));
        assert_eq!(rule.evaluate(d(100, 0), d(150, 0)), Err(QualificationError::InvalidPrice));
        assert_eq!(rule.evaluate(d(-100, 0), d(-150, 0)), Err(QualificationError::InvalidPrice));
    }

    #[test]
    fn test_suspicious_and_threshold() {
        let rule = DiscountRule::default();
        assert_eq!(rule.evaluate(d(1000, 0), d(50, 0)), Err(QualificationError::SuspiciousDiscount(95)));
        // exactly 90 is still accepted
        assert_eq!(rule.evaluate(d(1000, 0), d(100, 0)), Ok(90));
        assert_eq!(rule.evaluate(d(100, 0), d(85, 0)), Err(QualificationError::BelowThreshold(15)));
        assert_eq!(rule.evaluate(d(100, 0), d(80, 0)), Ok(20));
    }

    #[test]
    fn test_accepts_floor_over_price_grid() {
        let rule = DiscountRule::new(0, 90);
        for list in (1..=10000i64).step_by(37) {
            for sale in (1..list).step_by(13) {
                let list_price = Decimal::from(list);
                let sale_price = Decimal::from(sale);
                if (list - sale) * 10 > list * 9 {
                    continue;
                }
                let expected = ((list - sale) * 100 / list) as u8;
                assert_eq!(rule.evaluate(list_price, sale_price), Ok(expected), "list {} sale {}", list, sale);
            }
        }
    }
}
