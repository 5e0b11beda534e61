//! Currency amount conversion to processor minor units.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

/// Errors converting a decimal amount to minor units.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AmountError {
    /// Amount is negative or zero.
    #[error("amount must be positive")]
    NotPositive,
    /// Amount has sub-cent precision that would be lost.
    #[error("amount {0} is not representable in minor units")]
    SubMinorPrecision(Decimal),
    /// Amount overflows the processor's integer range.
    #[error("amount {0} is out of range")]
    OutOfRange(Decimal),
}

/// Convert a decimal currency amount to the processor's minor-unit
/// convention (e.g. 49.99 USD -> 4999 cents).
///
/// # Errors
///
/// Returns [`AmountError`] if the amount is not positive, carries
/// sub-cent precision, or does not fit in `i64`.
pub fn to_minor_units(amount: Decimal) -> Result<i64, AmountError> {
    if amount <= Decimal::ZERO {
        return Err(AmountError::NotPositive);
    }

    let minor = amount * Decimal::from(100);
    if minor.fract() != Decimal::ZERO {
        return Err(AmountError::SubMinorPrecision(amount));
    }

    minor.to_i64().ok_or(AmountError::OutOfRange(amount))
}
