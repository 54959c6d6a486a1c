//! Amounts and fee arithmetic.
//!
//! Every on-ledger quantity is an unsigned integer count of base units.
//! Reserve units and backed-token base units are the same unit. Fees always
//! truncate toward zero, so the protocol keeps at most one unit of rounding
//! per operation.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use crate::constants::BPS_DENOMINATOR;
use crate::{AurumError, Result};

/// Quantity of base units (reserve, backed token, or stable asset).
pub type Amount = u128;

/// Gross amount split into protocol fee and the net delivered to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSplit {
    pub gross: Amount,
    pub fee: Amount,
    pub net: Amount,
}

/// `floor(amount * bps / 10_000)`.
pub fn bps_fee(amount: Amount, bps: u32) -> Result<Amount> {
    amount
        .checked_mul(Amount::from(bps))
        .map(|scaled| scaled / BPS_DENOMINATOR)
        .ok_or_else(|| AurumError::overflow("fee computation"))
}

/// Split `gross` into fee and net at `bps`.
pub fn split_fee(gross: Amount, bps: u32) -> Result<FeeSplit> {
    let fee = bps_fee(gross, bps)?;
    let net = gross
        .checked_sub(fee)
        .ok_or_else(|| AurumError::invalid_argument(format!("fee rate {bps} bps above 100%")))?;
    Ok(FeeSplit { gross, fee, net })
}

/// Redemption fee in stable units:
/// `floor(amount * gold_price * bps / (price_scale * 10_000))`.
pub fn redemption_fee(
    amount: Amount,
    gold_price: Amount,
    price_scale: Amount,
    bps: u32,
) -> Result<Amount> {
    if price_scale == 0 {
        return Err(AurumError::invalid_argument("price scale must be positive"));
    }
    let numerator = amount
        .checked_mul(gold_price)
        .and_then(|v| v.checked_mul(Amount::from(bps)))
        .ok_or_else(|| AurumError::overflow("redemption fee"))?;
    let denominator = price_scale
        .checked_mul(BPS_DENOMINATOR)
        .ok_or_else(|| AurumError::overflow("redemption fee"))?;
    Ok(numerator / denominator)
}

/// Convert a human-facing decimal quantity into base units.
///
/// # Errors
/// `InvalidArgument` for a negative quantity, a quantity with precision
/// finer than `decimals`, or one too large for the scale.
pub fn decimal_to_units(value: Decimal, decimals: u32) -> Result<Amount> {
    if value.is_sign_negative() {
        return Err(AurumError::invalid_argument(format!(
            "quantity {value} must not be negative"
        )));
    }
    let factor = 10u64
        .checked_pow(decimals)
        .map(Decimal::from)
        .ok_or_else(|| AurumError::overflow("decimal scaling"))?;
    let scaled = value
        .checked_mul(factor)
        .ok_or_else(|| AurumError::overflow("decimal scaling"))?;
    if !scaled.fract().is_zero() {
        return Err(AurumError::invalid_argument(format!(
            "quantity {value} is finer than {decimals} decimals"
        )));
    }
    scaled
        .to_u128()
        .ok_or_else(|| AurumError::overflow("decimal scaling"))
}
