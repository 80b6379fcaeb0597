use num_bigint::{BigInt, BigUint};
use num_traits::{Signed, Zero};

/// 1 ether = 10^18 wei.
pub const ETHER_DECIMALS: u32 = 18;

/// Renders a wei amount as ether with `decimals` fractional digits, rounding
/// half away from zero. The conversion is exact: no floating point involved.
pub fn wei_to_ether(wei: &BigInt, decimals: u32) -> String {
    let decimals = decimals.min(ETHER_DECIMALS);
    let dropped = BigUint::from(10u32).pow(ETHER_DECIMALS - decimals);
    let magnitude = wei.magnitude();

    let mut scaled = magnitude / &dropped;
    let remainder = magnitude % &dropped;
    if remainder * 2u32 >= dropped {
        scaled += 1u32;
    }

    let unit = BigUint::from(10u32).pow(decimals);
    let integer = &scaled / &unit;
    let sign = if wei.is_negative() && !scaled.is_zero() {
        "-"
    } else {
        ""
    };
    if decimals == 0 {
        return format!("{sign}{integer}");
    }
    let fraction = (&scaled % &unit).to_string();
    format!(
        "{sign}{integer}.{}{fraction}",
        "0".repeat(decimals as usize - fraction.len())
    )
}
