//! Currency amount validation
//!
//! Amounts are positive decimals with at most two decimal places. Extra
//! precision is rejected rather than rounded, so the ledger never stores a
//! value the caller did not ask for.

use super::error::LedgerError;
use rust_decimal::Decimal;
use std::str::FromStr;

/// Decimal places of the ledger currency
pub const CURRENCY_SCALE: u32 = 2;

/// Validate an amount for a money movement
///
/// # Returns
///
/// * `Ok(Decimal)` - The amount rescaled to exactly two decimal places
/// * `Err(LedgerError::InvalidAmount)` - If the amount is zero, negative, or
///   has more than two significant decimal places
pub fn validate_amount(amount: Decimal) -> Result<Decimal, LedgerError> {
    if amount <= Decimal::ZERO {
        return Err(LedgerError::invalid_amount(
            amount,
            "must be greater than zero",
        ));
    }

    if amount.normalize().scale() > CURRENCY_SCALE {
        return Err(LedgerError::invalid_amount(
            amount,
            "at most two decimal places are allowed",
        ));
    }

    let mut amount = amount;
    amount.rescale(CURRENCY_SCALE);
    Ok(amount)
}

/// Parse and validate an amount given as text
pub fn parse_amount(input: &str) -> Result<Decimal, LedgerError> {
    let trimmed = input.trim();
    let amount = Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .map_err(|_| LedgerError::invalid_amount(input, "not a number"))?;
    validate_amount(amount)
}
