//! Default crypto hook over the sha2/sha3 crates.

use sha2::{Digest, Sha256};
use sha3::Keccak256;
use vm_common::{CryptoHook, Hash};

/// The in-process crypto hook.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultCryptoHook;

impl CryptoHook for DefaultCryptoHook {
    fn keccak256(&self, data: &[u8]) -> Hash {
        let mut hasher = Keccak256::new();
        hasher.update(data);
        Hash::new(hasher.finalize().into())
    }

    fn sha256(&self, data: &[u8]) -> Hash {
        let mut hasher = Sha256::new();
        hasher.update(data);
        Hash::new(hasher.finalize().into())
    }
}
