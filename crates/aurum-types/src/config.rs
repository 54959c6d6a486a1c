//! Configuration for an Aurum deployment.
//!
//! Operators write human-facing quantities (grams, price per token unit) as
//! decimals; [`AurumConfig`] resolves them into the integer base units the
//! components work with. Values are read at initialization and afterwards
//! change only through the components' admin operations.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_AUDIT_CAPACITY, DEFAULT_MAX_FEE_BPS, DEFAULT_TOKEN_DECIMALS, PRICE_DECIMALS,
    PRICE_SCALE,
};
use crate::{AccountId, Amount, AurumError, Result, decimal_to_units};

fn default_max_fee_bps() -> u32 {
    DEFAULT_MAX_FEE_BPS
}

fn default_token_decimals() -> u32 {
    DEFAULT_TOKEN_DECIMALS
}

fn default_audit_capacity() -> usize {
    DEFAULT_AUDIT_CAPACITY
}

/// Top-level deployment configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AurumConfig {
    #[serde(default)]
    pub units: UnitsConfig,
    pub reserve: ReserveConfig,
    pub swap: SwapConfig,
    pub redemption: RedemptionConfig,
}

/// Unit conventions shared by all components.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitsConfig {
    /// Base units per gram, as a power of ten.
    #[serde(default = "default_token_decimals")]
    pub token_decimals: u32,
    /// Audit records retained in memory.
    #[serde(default = "default_audit_capacity")]
    pub audit_capacity: usize,
}

impl Default for UnitsConfig {
    fn default() -> Self {
        Self {
            token_decimals: DEFAULT_TOKEN_DECIMALS,
            audit_capacity: DEFAULT_AUDIT_CAPACITY,
        }
    }
}

/// Initial attested reserve.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReserveConfig {
    /// Attested physical reserve in grams.
    pub total_reserve_grams: Decimal,
}

/// Swap fee settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwapConfig {
    pub fee_bps: u32,
    #[serde(default = "default_max_fee_bps")]
    pub max_fee_bps: u32,
    pub fee_collector: AccountId,
}

/// Redemption workflow settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedemptionConfig {
    /// Smallest redeemable quantity in grams (e.g. 0.1).
    pub min_redeem_grams: Decimal,
    /// Reference price of one token base unit in stable base units.
    pub gold_price: Decimal,
    pub fee_bps: u32,
    #[serde(default = "default_max_fee_bps")]
    pub max_fee_bps: u32,
    pub fee_collector: AccountId,
}

/// Reserve section in base units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReserveParams {
    pub total_reserve: Amount,
}

/// Swap section after validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapParams {
    pub fee_bps: u32,
    pub max_fee_bps: u32,
    pub fee_collector: AccountId,
}

/// Redemption section in base units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RedemptionParams {
    pub min_redeem: Amount,
    /// Reference price scaled by `price_scale`.
    pub gold_price: Amount,
    pub price_scale: Amount,
    pub fee_bps: u32,
    pub max_fee_bps: u32,
    pub fee_collector: AccountId,
}

impl AurumConfig {
    /// Parse a JSON document and validate it.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints.
    pub fn validate(&self) -> Result<()> {
        check_fee("swap", self.swap.fee_bps, self.swap.max_fee_bps)?;
        check_fee(
            "redemption",
            self.redemption.fee_bps,
            self.redemption.max_fee_bps,
        )?;
        if self.swap.fee_collector.is_null() {
            return Err(AurumError::Configuration(
                "swap.fee_collector must not be null".into(),
            ));
        }
        if self.redemption.fee_collector.is_null() {
            return Err(AurumError::Configuration(
                "redemption.fee_collector must not be null".into(),
            ));
        }
        if self.redemption.gold_price <= Decimal::ZERO {
            return Err(AurumError::Configuration(
                "redemption.gold_price must be positive".into(),
            ));
        }
        if self.reserve.total_reserve_grams.is_sign_negative() {
            return Err(AurumError::Configuration(
                "reserve.total_reserve_grams must not be negative".into(),
            ));
        }
        if self.units.audit_capacity == 0 {
            return Err(AurumError::Configuration(
                "units.audit_capacity must be positive".into(),
            ));
        }
        // Resolving surfaces sub-unit residue and oversized decimals.
        self.reserve_params()?;
        self.redemption_params()?;
        Ok(())
    }

    pub fn reserve_params(&self) -> Result<ReserveParams> {
        Ok(ReserveParams {
            total_reserve: to_units(
                "reserve.total_reserve_grams",
                self.reserve.total_reserve_grams,
                self.units.token_decimals,
            )?,
        })
    }

    #[must_use]
    pub fn swap_params(&self) -> SwapParams {
        SwapParams {
            fee_bps: self.swap.fee_bps,
            max_fee_bps: self.swap.max_fee_bps,
            fee_collector: self.swap.fee_collector,
        }
    }

    pub fn redemption_params(&self) -> Result<RedemptionParams> {
        Ok(RedemptionParams {
            min_redeem: to_units(
                "redemption.min_redeem_grams",
                self.redemption.min_redeem_grams,
                self.units.token_decimals,
            )?,
            gold_price: to_units(
                "redemption.gold_price",
                self.redemption.gold_price,
                PRICE_DECIMALS,
            )?,
            price_scale: PRICE_SCALE,
            fee_bps: self.redemption.fee_bps,
            max_fee_bps: self.redemption.max_fee_bps,
            fee_collector: self.redemption.fee_collector,
        })
    }
}

fn check_fee(section: &str, fee_bps: u32, max_fee_bps: u32) -> Result<()> {
    if u128::from(max_fee_bps) > crate::constants::BPS_DENOMINATOR {
        return Err(AurumError::Configuration(format!(
            "{section}.max_fee_bps {max_fee_bps} exceeds 10000"
        )));
    }
    if fee_bps > max_fee_bps {
        return Err(AurumError::Configuration(format!(
            "{section}.fee_bps {fee_bps} exceeds ceiling {max_fee_bps}"
        )));
    }
    Ok(())
}

fn to_units(field: &str, value: Decimal, decimals: u32) -> Result<Amount> {
    decimal_to_units(value, decimals)
        .map_err(|err| AurumError::Configuration(format!("{field}: {err}")))
}

/// Sample configuration for tests. **Never use in production.**
#[cfg(any(test, feature = "test-helpers"))]
impl AurumConfig {
    /// Whole-unit config: 0 token decimals, price 1.0, 1000 g reserve.
    #[must_use]
    pub fn dummy(swap_collector: AccountId, redemption_collector: AccountId) -> Self {
        Self {
            units: UnitsConfig {
                token_decimals: 0,
                audit_capacity: 1024,
            },
            reserve: ReserveConfig {
                total_reserve_grams: Decimal::new(1000, 0),
            },
            swap: SwapConfig {
                fee_bps: 200,
                max_fee_bps: DEFAULT_MAX_FEE_BPS,
                fee_collector: swap_collector,
            },
            redemption: RedemptionConfig {
                min_redeem_grams: Decimal::ONE,
                gold_price: Decimal::ONE,
                fee_bps: 100,
                max_fee_bps: DEFAULT_MAX_FEE_BPS,
                fee_collector: redemption_collector,
            },
        }
    }
}
