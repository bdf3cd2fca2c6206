//! Money and stock arithmetic shared by carts and orders.

use rust_decimal::Decimal;

/// Price of `quantity` units at `unit_price`.
pub fn line_total(unit_price: Decimal, quantity: i32) -> Decimal {
    unit_price * Decimal::from(quantity)
}

/// Sums `unit_price × quantity` over every line.
pub fn total<I>(lines: I) -> Decimal
where
    I: IntoIterator<Item = (Decimal, i32)>,
{
    lines
        .into_iter()
        .map(|(unit_price, quantity)| line_total(unit_price, quantity))
        .sum()
}

/// Largest total an order row can store (`NUMERIC(22, 2)`).
pub fn max_order_total() -> Decimal {
    Decimal::from_i128_with_scale(10_i128.pow(22) - 1, 2)
}

/// Adds a line onto a running order total.
///
/// Returns `None` once the total no longer fits in [`max_order_total`].
pub fn add_line(total: Decimal, unit_price: Decimal, quantity: i32) -> Option<Decimal> {
    unit_price
        .checked_mul(Decimal::from(quantity))
        .and_then(|line| total.checked_add(line))
        .filter(|total| *total <= max_order_total())
}

/// Stock left after taking `quantity` units, clamped at zero.
///
/// Sufficiency is not checked: ordering more than is available empties the stock.
pub fn decrement_stock(stock: i32, quantity: i32) -> i32 {
    stock.saturating_sub(quantity).max(0)
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn line_total_multiplies() {
        assert_eq!(line_total(dec("10.00"), 4), dec("40.00"));
        assert_eq!(line_total(dec("0.10"), 3), dec("0.30"));
    }

    #[test]
    fn total_sums_lines() {
        let lines = vec![(dec("10.00"), 2), (dec("2.50"), 3), (dec("0.99"), 1)];
        assert_eq!(total(lines), dec("28.49"));
    }

    #[test]
    fn total_of_nothing_is_zero() {
        assert_eq!(total(Vec::new()), Decimal::ZERO);
    }

    #[test]
    fn total_has_no_float_drift() {
        let lines = std::iter::repeat_n((dec("0.10"), 1), 10);
        assert_eq!(total(lines), dec("1.00"));
    }

    #[test]
    fn add_line_accumulates() {
        let total = add_line(Decimal::ZERO, dec("10.00"), 4).unwrap();
        assert_eq!(add_line(total, dec("2.50"), 2), Some(dec("45.00")));
    }

    #[test]
    fn add_line_fits_large_quantities() {
        assert_eq!(
            add_line(Decimal::ZERO, dec("10.00"), 2_000_000_000),
            Some(dec("20000000000.00"))
        );
    }

    #[test]
    fn add_line_rejects_totals_past_the_column_limit() {
        let line = line_total(dec("99999999.99"), i32::MAX);
        let near_limit = max_order_total() - line + dec("0.01");
        assert_eq!(add_line(near_limit, dec("99999999.99"), i32::MAX), None);
        assert_eq!(
            add_line(near_limit - dec("0.01"), dec("99999999.99"), i32::MAX),
            Some(max_order_total())
        );
    }

    #[test]
    fn max_order_total_has_twenty_integer_digits() {
        assert_eq!(max_order_total(), dec("99999999999999999999.99"));
    }

    #[test]
    fn decrement_stock_subtracts() {
        assert_eq!(decrement_stock(5, 4), 1);
        assert_eq!(decrement_stock(5, 5), 0);
    }

    #[test]
    fn decrement_stock_clamps_at_zero() {
        assert_eq!(decrement_stock(1, 10), 0);
        assert_eq!(decrement_stock(0, 3), 0);
        assert_eq!(decrement_stock(i32::MIN + 1, i32::MAX), 0);
    }
}
