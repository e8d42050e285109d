use alloy_primitives::U256;

pub const ETHER_DECIMALS: usize = 18;

/// Converts wei to ether as an exact decimal string.
///
/// Whole and fractional parts come from 256-bit division by 10^18, so
/// large totals keep every digit. Trailing fractional zeros are trimmed.
pub fn to_ether(wei: U256) -> String {
    let divisor = U256::from(10u64).pow(U256::from(ETHER_DECIMALS));
    let whole = wei / divisor;
    let fraction = wei % divisor;

    if fraction.is_zero() {
        return whole.to_string();
    }

    let digits = fraction.to_string();
    let padding = "0".repeat(ETHER_DECIMALS - digits.len());
    format!("{}.{}{}", whole, padding, digits.trim_end_matches('0'))
}
