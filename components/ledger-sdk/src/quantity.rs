//! Numeric quantities exchanged with the node. Heights and amounts travel as
//! strings, either base-10 digits or `0x`-prefixed base-16 digits.

use num_bigint::BigUint;
use num_traits::ToPrimitive;

fn split_radix(quantity: &str) -> Result<(&str, u32), String> {
    let (digits, radix) = match quantity
        .strip_prefix("0x")
        .or_else(|| quantity.strip_prefix("0X"))
    {
        Some(hex_digits) => (hex_digits, 16),
        None => (quantity, 10),
    };
    if digits.is_empty() {
        return Err(format!("empty quantity `{quantity}`"));
    }
    if !digits.chars().all(|c| c.is_digit(radix)) {
        return Err(format!("malformed base-{radix} quantity `{quantity}`"));
    }
    Ok((digits, radix))
}

/// Parses an arbitrarily large non-negative quantity.
pub fn parse_quantity_biguint(quantity: &str) -> Result<BigUint, String> {
    let (digits, radix) = split_radix(quantity)?;
    BigUint::parse_bytes(digits.as_bytes(), radix)
        .ok_or_else(|| format!("malformed base-{radix} quantity `{quantity}`"))
}

pub fn parse_quantity_u64(quantity: &str) -> Result<u64, String> {
    parse_quantity_biguint(quantity)?
        .to_u64()
        .ok_or_else(|| format!("quantity `{quantity}` does not fit in 64 bits"))
}

pub fn encode_quantity(value: u64) -> String {
    format!("0x{:x}", value)
}
