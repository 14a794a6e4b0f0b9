//! Discounts and coupons
//!
//! Three discounts stack on the list subtotal: a fixed amount, a percentage,
//! and a coupon. Every accepted coupon is worth a flat 10% of the subtotal,
//! whatever its code suggests (`DESCONTO20` included).

use rust_decimal::Decimal;
use tracing::debug;

use crate::domain::value_objects::{parse_decimal, Money};
use crate::ValidationError;

pub const VALID_COUPONS: [&str; 3] = ["PROMO10", "DESCONTO20", "BLACKFRIDAY"];

/// Share of the subtotal taken off by any valid coupon.
pub const COUPON_DISCOUNT_FRACTION: Decimal = Decimal::from_parts(10, 0, 0, false, 2);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Coupon {
    pub code: String,
    pub discount_fraction: Decimal,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CouponOutcome {
    Applied,
    /// A coupon was already active; nothing changed.
    AlreadyApplied,
}

/// Every intermediate amount of a discount calculation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DiscountBreakdown {
    pub subtotal: Money,
    pub fixed_discount: Money,
    pub percent_discount: Money,
    pub coupon_discount: Money,
    pub total_discount: Money,
    pub final_total: Money,
}

pub fn breakdown(subtotal: Money, fixed: Money, percent: Decimal, coupon_applied: bool) -> DiscountBreakdown {
    let percent_discount = subtotal.percent_of(percent);
    let coupon_discount = if coupon_applied {
        Money::new(subtotal.amount() * COUPON_DISCOUNT_FRACTION)
    } else {
        Money::ZERO
    };
    let total_discount = fixed + percent_discount + coupon_discount;
    DiscountBreakdown {
        subtotal,
        fixed_discount: fixed,
        percent_discount,
        coupon_discount,
        total_discount,
        final_total: subtotal.saturating_sub(total_discount),
    }
}

/// `max(0, subtotal - fixed - subtotal*percent/100 - coupon)`.
pub fn final_total(subtotal: Money, fixed: Money, percent: Decimal, coupon_applied: bool) -> Money {
    breakdown(subtotal, fixed, percent, coupon_applied).final_total
}

/// Discounts the user has entered for the current shopping list.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DiscountState {
    fixed_amount: Money,
    percent: Decimal,
    coupon: Option<Coupon>,
}

impl DiscountState {
    pub fn new() -> Self { Self::default() }

    pub fn fixed_amount(&self) -> Money { self.fixed_amount }
    pub fn percent(&self) -> Decimal { self.percent }
    pub fn coupon(&self) -> Option<&Coupon> { self.coupon.as_ref() }

    /// Accepts a fixed discount between zero and `subtotal`. Anything else
    /// resets the fixed discount to zero and is reported.
    pub fn set_fixed_amount(&mut self, input: &str, subtotal: Money) -> Result<Money, ValidationError> {
        match Money::parse(input).filter(|v| !v.is_negative() && *v <= subtotal) {
            Some(amount) => {
                self.fixed_amount = amount;
                Ok(amount)
            }
            None => {
                self.fixed_amount = Money::ZERO;
                Err(ValidationError::InvalidFixedDiscount(input.to_string()))
            }
        }
    }

    /// Accepts a percentage in `[0, 100]`; anything else resets it to zero.
    pub fn set_percent(&mut self, input: &str) -> Result<Decimal, ValidationError> {
        match parse_decimal(input).filter(|p| *p >= Decimal::ZERO && *p <= Decimal::ONE_HUNDRED) {
            Some(percent) => {
                self.percent = percent;
                Ok(percent)
            }
            None => {
                self.percent = Decimal::ZERO;
                Err(ValidationError::InvalidPercent(input.to_string()))
            }
        }
    }

    pub fn apply_coupon(&mut self, code: &str) -> Result<CouponOutcome, ValidationError> {
        let code = code.trim().to_uppercase();
        if code.is_empty() { return Err(ValidationError::MissingCouponCode); }
        if !VALID_COUPONS.contains(&code.as_str()) { return Err(ValidationError::UnknownCoupon(code)); }
        if self.coupon.is_some() { return Ok(CouponOutcome::AlreadyApplied); }
        debug!(%code, "coupon applied");
        self.coupon = Some(Coupon { code, discount_fraction: COUPON_DISCOUNT_FRACTION });
        Ok(CouponOutcome::Applied)
    }

    pub fn remove_coupon(&mut self) -> Option<Coupon> { self.coupon.take() }

    pub fn reset(&mut self) { *self = Self::default(); }

    pub fn breakdown(&self, subtotal: Money) -> DiscountBreakdown {
        breakdown(subtotal, self.fixed_amount, self.percent, self.coupon.is_some())
    }

    pub fn final_total(&self, subtotal: Money) -> Money { self.breakdown(subtotal).final_total }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cents(c: i64) -> Money { Money::from_cents(c) }

    #[test]
    fn test_worked_example() {
        // [{price 10, qty 2}, {price 5, qty 1}] with 5 off and 10%
        let mut state = DiscountState::new();
        state.set_fixed_amount("5", cents(2500)).unwrap();
        state.set_percent("10").unwrap();
        let b = state.breakdown(cents(2500));
        assert_eq!(b.total_discount, cents(750));
        assert_eq!(b.final_total, cents(1750));
    }

    #[test]
    fn test_final_total_formula() {
        let subtotals = [0, 1, 999, 2500, 12345];
        let percents = [Decimal::ZERO, Decimal::new(125, 1), Decimal::ONE_HUNDRED];
        for s in subtotals {
            let subtotal = cents(s);
            for fixed in [0, s / 3, s] {
                for percent in percents {
                    for coupon in [false, true] {
                        let coupon_part = if coupon { subtotal.amount() * Decimal::new(1, 1) } else { Decimal::ZERO };
                        let expected = (subtotal.amount()
                            - cents(fixed).amount()
                            - subtotal.amount() * percent / Decimal::ONE_HUNDRED
                            - coupon_part)
                            .max(Decimal::ZERO);
                        assert_eq!(final_total(subtotal, cents(fixed), percent, coupon).amount(), expected);
                    }
                }
            }
        }
    }

    #[test]
    fn test_final_total_never_negative() {
        assert_eq!(final_total(cents(1000), cents(1000), Decimal::ONE_HUNDRED, true), Money::ZERO);
    }

    #[test]
    fn test_fixed_amount_validation() {
        let mut state = DiscountState::new();
        state.set_fixed_amount("3", cents(1000)).unwrap();
        assert_eq!(
            state.set_fixed_amount("10.01", cents(1000)),
            Err(ValidationError::InvalidFixedDiscount("10.01".into()))
        );
        assert_eq!(state.fixed_amount(), Money::ZERO);
        assert!(state.set_fixed_amount("-1", cents(1000)).is_err());
        assert!(state.set_fixed_amount("dez", cents(1000)).is_err());
        assert_eq!(state.set_fixed_amount("10", cents(1000)), Ok(cents(1000)));
    }

    #[test]
    fn test_percent_validation() {
        let mut state = DiscountState::new();
        state.set_percent("15").unwrap();
        assert!(state.set_percent("100.5").is_err());
        assert_eq!(state.percent(), Decimal::ZERO);
        assert!(state.set_percent("-1").is_err());
        assert_eq!(state.set_percent("0"), Ok(Decimal::ZERO));
    }

    #[test]
    fn test_coupon_flow() {
        let mut state = DiscountState::new();
        assert_eq!(state.apply_coupon("  "), Err(ValidationError::MissingCouponCode));
        assert_eq!(state.apply_coupon("free"), Err(ValidationError::UnknownCoupon("FREE".into())));
        assert_eq!(state.apply_coupon("desconto20"), Ok(CouponOutcome::Applied));
        assert_eq!(state.apply_coupon("PROMO10"), Ok(CouponOutcome::AlreadyApplied));
        // flat 10% regardless of the code
        assert_eq!(state.breakdown(cents(2000)).coupon_discount, cents(200));
        assert_eq!(state.coupon().unwrap().code, "DESCONTO20");

        assert!(state.remove_coupon().is_some());
        assert_eq!(state.final_total(cents(2000)), cents(2000));
    }

    #[test]
    fn test_coupon_applied_twice_does_not_double() {
        let mut state = DiscountState::new();
        state.apply_coupon("BLACKFRIDAY").unwrap();
        let once = state.final_total(cents(5000));
        state.apply_coupon("BLACKFRIDAY").unwrap();
        assert_eq!(state.final_total(cents(5000)), once);
        assert_eq!(once, cents(4500));
    }
}
