//! Init code hash derivation

use std::fmt;
use std::str::FromStr;

use saltmine_crypto::{decode_hex, keccak256, parse_fixed_hex, to_prefixed_hex, EncodingError};

use crate::error::{DeployError, Result};

/// Keccak-256 digest of a contract's initialization bytecode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InitCodeHash([u8; 32]);

impl InitCodeHash {
    /// Hash raw init code bytes
    pub fn of(init_code: &[u8]) -> Self {
        Self(keccak256(init_code))
    }

    /// Wrap an already computed digest
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// `0x` followed by 64 lowercase hex digits
    pub fn to_hex(&self) -> String {
        to_prefixed_hex(&self.0)
    }
}

impl fmt::Display for InitCodeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for InitCodeHash {
    type Err = EncodingError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        parse_fixed_hex::<32>(s).map(Self)
    }
}

/// Derive the CREATE2 init code hash from an artifact's hex bytecode.
///
/// One `0x` prefix is stripped; odd lengths and non-hex characters fail with
/// [`DeployError::MalformedBytecode`].
pub fn derive_init_code_hash(init_code: &str) -> Result<InitCodeHash> {
    let bytes = decode_hex(init_code).map_err(|e| DeployError::MalformedBytecode(e.to_string()))?;
    Ok(InitCodeHash::of(&bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    const FOO_HASH: &str = "0xf8b07b083341d3a7667e38718918d301f47d62f82d8186f4ccd7ed7424a64ef3";

    #[test]
    fn test_reference_digest() {
        let hash = derive_init_code_hash("0x6001600155").unwrap();
        assert_eq!(hash.to_hex(), FOO_HASH);
        assert_eq!(hash, InitCodeHash::of(&[0x60, 0x01, 0x60, 0x01, 0x55]));
    }

    #[test]
    fn test_prefix_is_optional() {
        let with = derive_init_code_hash("0x6001600155").unwrap();
        let without = derive_init_code_hash("6001600155").unwrap();
        assert_eq!(with, without);
    }

    #[test]
    fn test_deterministic() {
        let first = derive_init_code_hash("0x6080604052348015600f57600080fd5b50").unwrap();
        for _ in 0..5 {
            assert_eq!(derive_init_code_hash("0x6080604052348015600f57600080fd5b50").unwrap(), first);
        }
    }

    #[test]
    fn test_uppercase_hex_accepted() {
        assert_eq!(derive_init_code_hash("0x6001600155").unwrap(), derive_init_code_hash("0X6001600155").unwrap());
        assert_eq!(derive_init_code_hash("60016001AB").unwrap(), derive_init_code_hash("60016001ab").unwrap());
    }

    #[test]
    fn test_malformed_bytecode() {
        for bad in ["0x600", "0x60zz", "hello", "0x0x6001", "0x60 01"] {
            assert!(
                matches!(derive_init_code_hash(bad), Err(DeployError::MalformedBytecode(_))),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_parse_and_display() {
        let hash: InitCodeHash = FOO_HASH.parse().unwrap();
        assert_eq!(hash.to_string(), FOO_HASH);
        assert!("0x1234".parse::<InitCodeHash>().is_err());
    }
}
