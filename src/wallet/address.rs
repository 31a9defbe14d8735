//! Wallet address parsing and formatting

use alloy::primitives::Address;
use anyhow::{Context, Result};
use std::str::FromStr;

/// Check that a wallet address is a `0x`-prefixed 20-byte hex string
pub fn is_wallet_address(address: &str) -> bool {
    address.starts_with("0x") && address.len() == 42 && Address::from_str(address).is_ok()
}

/// Canonical EIP-55 checksum form, so lookups ignore letter case
pub fn normalize_address(address: &str) -> Result<String> {
    if !address.starts_with("0x") {
        anyhow::bail!("Wallet address must start with 0x");
    }
    let parsed = Address::from_str(address).context("Invalid wallet address")?;
    Ok(parsed.to_checksum(None))
}

/// Display form used on cards: `0x1234...abcd`
pub fn shorten_address(address: &str) -> String {
    if address.len() <= 10 || !address.is_ascii() {
        return address.to_string();
    }
    format!("{}...{}", &address[..6], &address[address.len() - 4..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wallet_address_format() {
        assert!(is_wallet_address("0x742d35Cc6634C0532925a3b844Bc454e4438f44e"));
        assert!(!is_wallet_address("742d35Cc6634C0532925a3b844Bc454e4438f44e"));
        assert!(!is_wallet_address("0x742d"));
        assert!(!is_wallet_address("0xzz2d35Cc6634C0532925a3b844Bc454e4438f44e"));
    }

    #[test]
    fn test_normalize_is_case_insensitive() {
        let lower = normalize_address("0x742d35cc6634c0532925a3b844bc454e4438f44e").unwrap();
        let upper = normalize_address("0x742D35CC6634C0532925A3B844BC454E4438F44E").unwrap();
        assert_eq!(lower, upper);
        assert!(normalize_address("not-an-address").is_err());
    }

    #[test]
    fn test_shorten_address() {
        assert_eq!(
            shorten_address("0x742d35Cc6634C0532925a3b844Bc454e4438f44e"),
            "0x742d...f44e"
        );
        assert_eq!(shorten_address("0x1234"), "0x1234");
    }
}
