use std::str::FromStr;

use alloy::primitives::{Address, U256};
use bigdecimal::{
    num_bigint::BigInt, rounding::RoundingMode, BigDecimal, Signed,
};
use chrono::{DateTime, Utc};

use crate::error::Error;

/// All marketplace amounts are 18-decimal fixed point on chain.
pub const TOKEN_DECIMALS: i64 = 18;

fn wei_unit() -> BigDecimal {
    BigDecimal::new(BigInt::from(1), TOKEN_DECIMALS)
}

/// Decode a raw fixed-point chain amount into a decimal token value.
pub fn wei_to_decimal(value: U256) -> Result<BigDecimal, Error> {
    Ok(BigDecimal::from_str(&value.to_string())? * wei_unit())
}

/// Encode a decimal token value back to its fixed-point chain
/// representation, truncating anything below one wei.
pub fn decimal_to_wei(value: &BigDecimal) -> Result<U256, Error> {
    if value.is_negative() {
        return Err(Error::Validation(String::from(
            "Amount must not be negative",
        )));
    }

    let scaled = (value / wei_unit()).with_scale_round(0, RoundingMode::Down);
    let (digits, _) = scaled.into_bigint_and_exponent();

    U256::from_str(&digits.to_string()).map_err(|_| {
        Error::Validation(format!("Amount {} exceeds the token range", value))
    })
}

/// Interest is stored in basis points; dashboards show percent.
pub fn bps_to_percent(bps: u32) -> f64 {
    f64::from(bps) / 100.0
}

pub fn parse_address(value: &str) -> Result<Address, Error> {
    Ok(Address::from_str(value.trim())?)
}

/// Canonical lowercased form used for comparisons and cache keys.
pub fn normalize_address(address: &Address) -> String {
    format!("{:#x}", address)
}

/// `0x1234...7890` display form used by the marketplace.
pub fn short_address(address: &str) -> String {
    if address.len() <= 10 {
        return address.to_owned();
    }
    format!("{}...{}", &address[..6], &address[address.len() - 4..])
}

pub fn epoch_to_datetime(seconds: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(seconds, 0).unwrap_or_default()
}
