//! Saltmine Crypto Primitives
//!
//! Keccak-256, CREATE2 address derivation and the hex encodings used when
//! addresses, salts and hashes cross process boundaries.

pub mod create2;
pub mod encoding;
pub mod hash;

pub use self::create2::{create2_address, Create2Input};
pub use self::encoding::{
    decode_hex, eip55_checksum, parse_fixed_hex, strip_hex_prefix, to_prefixed_hex, EncodingError,
};
pub use self::hash::keccak256;

// Re-export dependencies for use by other crates
pub use hex;
