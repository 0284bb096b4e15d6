//! Hex encoding utilities: strict decoding, fixed-width parsing, EIP-55

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodingError {
    #[error("Odd number of hex digits ({0})")]
    OddLength(usize),
    #[error("Invalid hex character '{0}' at position {1}")]
    InvalidCharacter(char, usize),
    #[error("Invalid length: expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
}

/// Strip a single leading `0x`/`0X`
pub fn strip_hex_prefix(input: &str) -> &str {
    input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
        .unwrap_or(input)
}

/// Decode a hex string with an optional `0x` prefix.
///
/// Odd lengths and non-hex characters are rejected outright.
pub fn decode_hex(input: &str) -> Result<Vec<u8>, EncodingError> {
    let clean = strip_hex_prefix(input);
    hex::decode(clean).map_err(|e| match e {
        hex::FromHexError::OddLength => EncodingError::OddLength(clean.len()),
        hex::FromHexError::InvalidHexCharacter { c, index } => {
            EncodingError::InvalidCharacter(c, index)
        }
        _ => EncodingError::OddLength(clean.len()),
    })
}

/// Decode a hex string into exactly `N` bytes
pub fn parse_fixed_hex<const N: usize>(input: &str) -> Result<[u8; N], EncodingError> {
    let bytes = decode_hex(input)?;
    if bytes.len() != N {
        return Err(EncodingError::InvalidLength {
            expected: N,
            actual: bytes.len(),
        });
    }
    let mut out = [0u8; N];
    out.copy_from_slice(&bytes);
    Ok(out)
}

/// Lowercase `0x`-prefixed hex
pub fn to_prefixed_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// EIP-55 checksum encoding for Ethereum addresses
pub fn eip55_checksum(address: &[u8; 20]) -> String {
    use crate::hash::keccak256;

    let hex_addr = hex::encode(address);
    let hash = keccak256(hex_addr.as_bytes());

    let mut result = String::with_capacity(42);
    result.push_str("0x");

    for (i, c) in hex_addr.chars().enumerate() {
        let hash_nibble = if i % 2 == 0 {
            (hash[i / 2] >> 4) & 0x0F
        } else {
            hash[i / 2] & 0x0F
        };

        if hash_nibble >= 8 {
            result.push(c.to_ascii_uppercase());
        } else {
            result.push(c);
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_with_and_without_prefix() {
        assert_eq!(decode_hex("0x6001600155").unwrap(), vec![0x60, 0x01, 0x60, 0x01, 0x55]);
        assert_eq!(decode_hex("6001600155").unwrap(), vec![0x60, 0x01, 0x60, 0x01, 0x55]);
        assert_eq!(decode_hex("0X6001").unwrap(), vec![0x60, 0x01]);
        assert!(decode_hex("0x").unwrap().is_empty());
    }

    #[test]
    fn test_decode_rejects_odd_length() {
        assert_eq!(decode_hex("0x600"), Err(EncodingError::OddLength(3)));
    }

    #[test]
    fn test_decode_rejects_invalid_character() {
        assert!(matches!(
            decode_hex("0x60zz"),
            Err(EncodingError::InvalidCharacter('z', 2))
        ));
    }

    #[test]
    fn test_only_one_prefix_is_stripped() {
        assert!(decode_hex("0x0x6001").is_err());
    }

    #[test]
    fn test_parse_fixed_hex_length() {
        let addr: [u8; 20] = parse_fixed_hex("0xAA28020DDA6b954D16208eccF873D79AC6533833").unwrap();
        assert_eq!(addr[0], 0xaa);
        assert_eq!(addr[19], 0x33);

        let err = parse_fixed_hex::<32>("0xAA28020DDA6b954D16208eccF873D79AC6533833").unwrap_err();
        assert_eq!(
            err,
            EncodingError::InvalidLength {
                expected: 32,
                actual: 20
            }
        );
    }

    #[test]
    fn test_eip55_checksum() {
        let addr = hex::decode("5aaeb6053f3e94c9b9a09f33669435e7ef1beaed").unwrap();
        let mut addr_arr = [0u8; 20];
        addr_arr.copy_from_slice(&addr);

        let checksummed = eip55_checksum(&addr_arr);
        assert_eq!(checksummed, "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed");
    }

    #[test]
    fn test_eip55_factory() {
        let factory: [u8; 20] = parse_fixed_hex("0xaa28020dda6b954d16208eccf873d79ac6533833").unwrap();
        assert_eq!(
            eip55_checksum(&factory),
            "0xAA28020DDA6b954D16208eccF873D79AC6533833"
        );
    }
}
