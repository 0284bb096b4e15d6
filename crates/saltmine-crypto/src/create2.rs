//! CREATE2 address derivation (EIP-1014)
//!
//! `address = keccak256(0xff ++ factory ++ salt ++ init_code_hash)[12..]`

use crate::hash::keccak256;

/// Length of the CREATE2 preimage: marker byte, factory, salt, init code hash
const PREIMAGE_LEN: usize = 1 + 20 + 32 + 32;

/// Fixed inputs of a CREATE2 derivation; only the salt varies during a search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Create2Input {
    preimage: [u8; PREIMAGE_LEN],
}

impl Create2Input {
    /// Prepare the preimage for a factory and init code hash
    pub fn new(factory: &[u8; 20], init_code_hash: &[u8; 32]) -> Self {
        let mut preimage = [0u8; PREIMAGE_LEN];
        preimage[0] = 0xff;
        preimage[1..21].copy_from_slice(factory);
        preimage[53..85].copy_from_slice(init_code_hash);
        Self { preimage }
    }

    /// Derive the address for one salt
    pub fn address(&self, salt: &[u8; 32]) -> [u8; 20] {
        let mut preimage = self.preimage;
        preimage[21..53].copy_from_slice(salt);

        let hash = keccak256(&preimage);
        let mut address = [0u8; 20];
        address.copy_from_slice(&hash[12..32]);
        address
    }
}

/// Compute the address a CREATE2 deployment will land on
pub fn create2_address(factory: &[u8; 20], salt: &[u8; 32], init_code_hash: &[u8; 32]) -> [u8; 20] {
    Create2Input::new(factory, init_code_hash).address(salt)
}
