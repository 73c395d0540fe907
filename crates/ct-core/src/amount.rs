//! Precision-safe stablecoin amounts.
//!
//! All settlement in the creator token flow is denominated in a single
//! stablecoin (USDC, 6 decimals). Amounts are carried as raw on-chain
//! base units (`U256`) and only converted to `Decimal` for display,
//! avoiding floating-point rounding in financial comparisons.

use alloy::primitives::U256;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CoreError;

/// USDC uses 6 decimal places on every chain we settle on.
pub const USDC_DECIMALS: u32 = 6;

const BASE_UNITS_PER_USDC: u64 = 1_000_000;

/// Basis points in one whole (100%).
pub const BPS_DENOMINATOR: u64 = 10_000;

/// Stablecoin amount in raw base units.
///
/// Wraps `U256` to prevent mixing amounts with token quantities and to
/// keep allowance/price comparisons exact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UsdcAmount(U256);

impl UsdcAmount {
    pub const ZERO: Self = Self(U256::ZERO);

    /// Create from raw on-chain base units (1 USDC = 10^6 units).
    #[inline]
    #[must_use]
    pub fn from_base_units(units: U256) -> Self {
        Self(units)
    }

    /// Create from a whole-USDC decimal value.
    ///
    /// Fractional dust below 10^-6 USDC is truncated.
    pub fn from_usdc(value: Decimal) -> Result<Self, CoreError> {
        if value.is_sign_negative() {
            return Err(CoreError::InvalidAmount(format!(
                "negative amount: {value}"
            )));
        }
        let scaled = value
            .checked_mul(Decimal::from(BASE_UNITS_PER_USDC))
            .ok_or_else(|| CoreError::InvalidAmount(format!("amount out of range: {value}")))?;
        let units = scaled
            .trunc()
            .to_u128()
            .ok_or_else(|| CoreError::InvalidAmount(format!("amount out of range: {value}")))?;
        Ok(Self(U256::from(units)))
    }

    /// Raw base units.
    #[inline]
    #[must_use]
    pub fn base_units(&self) -> U256 {
        self.0
    }

    #[inline]
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Whole-USDC decimal value for display.
    ///
    /// Saturates at `Decimal::MAX` for amounts beyond 128-bit range,
    /// which cannot occur for real USDC balances.
    #[must_use]
    pub fn to_decimal(&self) -> Decimal {
        match u128::try_from(self.0) {
            Ok(units) if units <= i128::MAX as u128 => {
                Decimal::from_i128_with_scale(units as i128, USDC_DECIMALS)
            }
            _ => Decimal::MAX,
        }
    }

    /// Checked addition.
    #[must_use]
    pub fn checked_add(&self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    /// Saturating subtraction.
    #[must_use]
    pub fn saturating_sub(&self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }

    /// Scale the amount up by a basis-point tolerance (buy-side bound).
    ///
    /// `amount * (10000 + bps) / 10000`, saturating at `U256::MAX`.
    #[must_use]
    pub fn with_slippage_up(&self, bps: u32) -> Self {
        let numerator = U256::from(BPS_DENOMINATOR + u64::from(bps));
        match self.0.checked_mul(numerator) {
            Some(scaled) => Self(scaled / U256::from(BPS_DENOMINATOR)),
            None => Self(U256::MAX),
        }
    }

    /// Scale the amount down by a basis-point tolerance (sell-side bound).
    ///
    /// `amount * (10000 - bps) / 10000`; a tolerance of 10000 bps or more
    /// yields zero.
    #[must_use]
    pub fn with_slippage_down(&self, bps: u32) -> Self {
        let bps = u64::from(bps).min(BPS_DENOMINATOR);
        let numerator = U256::from(BPS_DENOMINATOR - bps);
        // numerator <= 10000 so the multiply cannot overflow unless the
        // amount itself is near U256::MAX; saturate to zero in that case.
        match self.0.checked_mul(numerator) {
            Some(scaled) => Self(scaled / U256::from(BPS_DENOMINATOR)),
            None => Self(U256::ZERO),
        }
    }
}

impl fmt::Display for UsdcAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_decimal())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_from_usdc_scales_to_base_units() {
        let amount = UsdcAmount::from_usdc(dec!(5)).unwrap();
        assert_eq!(amount.base_units(), U256::from(5_000_000u64));

        let amount = UsdcAmount::from_usdc(dec!(0.25)).unwrap();
        assert_eq!(amount.base_units(), U256::from(250_000u64));
    }

    #[test]
    fn test_from_usdc_rejects_negative() {
        assert!(UsdcAmount::from_usdc(dec!(-1)).is_err());
    }

    #[test]
    fn test_display_round_trip() {
        let amount = UsdcAmount::from_usdc(dec!(12.5)).unwrap();
        assert_eq!(amount.to_decimal(), dec!(12.500000));
        assert_eq!(amount.to_string(), "12.500000");
    }

    #[test]
    fn test_slippage_up() {
        // $100 with 1% tolerance = $101
        let amount = UsdcAmount::from_usdc(dec!(100)).unwrap();
        let bounded = amount.with_slippage_up(100);
        assert_eq!(bounded.base_units(), U256::from(101_000_000u64));
    }

    #[test]
    fn test_slippage_down() {
        // $100 with 1% tolerance = $99
        let amount = UsdcAmount::from_usdc(dec!(100)).unwrap();
        let bounded = amount.with_slippage_down(100);
        assert_eq!(bounded.base_units(), U256::from(99_000_000u64));

        // Full tolerance floors at zero
        assert!(amount.with_slippage_down(10_000).is_zero());
    }

    #[test]
    fn test_serde_round_trip_is_transparent() {
        let amount = UsdcAmount::from_usdc(dec!(5)).unwrap();
        let json = serde_json::to_string(&amount).unwrap();
        let back: UsdcAmount = serde_json::from_str(&json).unwrap();
        assert_eq!(back, amount);
    }

    #[test]
    fn test_ordering_on_base_units() {
        let a = UsdcAmount::from_usdc(dec!(4.999999)).unwrap();
        let b = UsdcAmount::from_usdc(dec!(5)).unwrap();
        assert!(a < b);
        assert_eq!(b.saturating_sub(a).base_units(), U256::from(1u64));
    }
}
