use crate::error::{EngineError, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Decimal base the oracle rate is normalized to.
pub const BASE_DECIMALS: u64 = 18;

/// Margin applied to every estimate against rate drift before settlement.
pub const SAFETY_MARGIN: Decimal = dec!(1.02);

/// Settlement-token amount needed to fund `raw_amount` at `rate`.
///
/// Computes `rate * raw_amount * 10^(18 - decimals) / 10^18 * 1.02`. The
/// normalization terms collapse to an exact shift of `rate` by `decimals`
/// places, which keeps the intermediate product inside the 96-bit mantissa.
///
/// A result needing more than the 28 significant digits a [`Decimal`]
/// carries keeps its integer part and loses trailing fractional digits,
/// an error below one base unit. Only an integer part beyond the 96-bit
/// range is [`EngineError::AmountOverflow`].
///
/// # Examples
///
/// ```
/// use loan_query_engine::valuation::rate::required_amount;
/// use rust_decimal_macros::dec;
///
/// // 2.5 tokens per unit, quoted with 6 decimals
/// let required = required_amount(dec!(1000), dec!(2500000), 6).unwrap();
/// assert_eq!(required, dec!(2550));
/// ```
pub fn required_amount(raw_amount: Decimal, rate: Decimal, decimals: u64) -> Result<Decimal> {
    if decimals > BASE_DECIMALS {
        return Err(EngineError::UnsupportedOraclePrecision { decimals });
    }

    let mut unit_rate = rate;
    // exact division by 10^decimals
    unit_rate
        .set_scale(rate.scale() + decimals as u32)
        .map_err(|_| EngineError::overflow("normalizing the oracle rate"))?;

    unit_rate
        .checked_mul(raw_amount)
        .and_then(|converted| converted.checked_mul(SAFETY_MARGIN))
        .ok_or_else(|| EngineError::overflow("converting the loan amount"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eighteen_decimals() {
        // rate of 0.5 expressed with 18 decimals
        let rate = dec!(500_000_000_000_000_000);
        let required = required_amount(dec!(4000), rate, 18).unwrap();
        assert_eq!(required, dec!(2040));
    }

    #[test]
    fn test_zero_decimals() {
        let required = required_amount(dec!(10), dec!(3), 0).unwrap();
        assert_eq!(required, dec!(30.6));
    }

    #[test]
    fn test_zero_amount() {
        assert_eq!(required_amount(Decimal::ZERO, dec!(123), 2).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_precision_above_base_fails() {
        let result = required_amount(dec!(10), dec!(3), 19);
        assert!(matches!(
            result,
            Err(EngineError::UnsupportedOraclePrecision { decimals: 19 })
        ));
    }

    #[test]
    fn test_keeps_wei_precision() {
        // 1.000000000000000001 tokens per unit on 10^18 base units
        let rate = dec!(1_000_000_000_000_000_001);
        let amount = dec!(1_000_000_000_000_000_000);
        let required = required_amount(amount, rate, 18).unwrap();
        assert_eq!(required, dec!(1_020_000_000_000_000_001.02));
    }

    #[test]
    fn test_overflow_is_reported() {
        let result = required_amount(Decimal::MAX, dec!(2), 0);
        assert!(matches!(result, Err(EngineError::AmountOverflow { .. })));
    }
}
