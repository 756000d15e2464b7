/// Currency helpers for escrow arithmetic.
///
/// The processor API and all share arithmetic work in integer minor units
/// (cents) to avoid floating-point precision issues; database rows store
/// NUMERIC amounts that convert through these helpers.
use bigdecimal::BigDecimal;
use num_traits::ToPrimitive;

/// Convert a major-unit amount to minor units (multiply by 100)
pub fn to_minor_units(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}

/// Convert minor units back to a major-unit amount
pub fn from_minor_units(minor: i64) -> f64 {
    minor as f64 / 100.0
}

/// Minor units of a NUMERIC database amount.
pub fn decimal_to_minor_units(amount: &BigDecimal) -> i64 {
    (amount * BigDecimal::from(100))
        .round(0)
        .to_i64()
        .unwrap_or(0)
}

/// Split an amount exactly in half. The professional's share takes the floor
/// so the two shares always sum back to the total.
pub fn split_even(total_minor: i64) -> (i64, i64) {
    let professional_share = total_minor / 2;
    let client_share = total_minor - professional_share;
    (professional_share, client_share)
}

/// Platform fee in minor units for a given percentage.
pub fn platform_fee(total_minor: i64, fee_percent: i64) -> i64 {
    total_minor * fee_percent / 100
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_to_minor_units() {
        assert_eq!(to_minor_units(100.0), 10000);
        assert_eq!(to_minor_units(0.50), 50);
        assert_eq!(to_minor_units(123.45), 12345);
    }

    #[test]
    fn test_from_minor_units() {
        assert_eq!(from_minor_units(10000), 100.0);
        assert_eq!(from_minor_units(50), 0.50);
    }

    #[test]
    fn test_decimal_to_minor_units() {
        let amount = BigDecimal::from_str("199.99").unwrap();
        assert_eq!(decimal_to_minor_units(&amount), 19999);

        let whole = BigDecimal::from(250);
        assert_eq!(decimal_to_minor_units(&whole), 25000);
    }

    #[test]
    fn test_split_even_is_exact() {
        let (pro, client) = split_even(10000);
        assert_eq!(pro, 5000);
        assert_eq!(client, 5000);
        assert_eq!(pro + client, 10000);

        // Odd totals still sum back exactly
        let (pro, client) = split_even(10001);
        assert_eq!(pro, 5000);
        assert_eq!(client, 5001);
        assert_eq!(pro + client, 10001);
    }

    #[test]
    fn test_platform_fee() {
        assert_eq!(platform_fee(10000, 5), 500);
        assert_eq!(platform_fee(19999, 5), 999);
    }
}
