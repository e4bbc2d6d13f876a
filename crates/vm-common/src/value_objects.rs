//! # Value Objects
//!
//! Fixed-width primitives shared by the host and the node-facing data model.
//! Addresses and hashes are 32 bytes throughout the protocol.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Length in bytes of an account address.
pub const ADDRESS_LEN: usize = 32;

/// Length in bytes of a hash.
pub const HASH_LEN: usize = 32;

/// Length in bytes of a balance written into contract memory
/// (big-endian, left-padded).
pub const BALANCE_LEN: usize = 32;

// =============================================================================
// ADDRESS (32 bytes)
// =============================================================================

/// A 32-byte account address.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Address(pub [u8; ADDRESS_LEN]);

impl Address {
    /// The zero address.
    pub const ZERO: Self = Self([0u8; ADDRESS_LEN]);

    /// Creates an address from a 32-byte array.
    #[must_use]
    pub const fn new(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(bytes)
    }

    /// Creates an address from a slice. Returns None if wrong length.
    #[must_use]
    pub fn from_slice(slice: &[u8]) -> Option<Self> {
        if slice.len() == ADDRESS_LEN {
            let mut bytes = [0u8; ADDRESS_LEN];
            bytes.copy_from_slice(slice);
            Some(Self(bytes))
        } else {
            None
        }
    }

    /// Creates an address from a slice of at most 32 bytes, left-padding
    /// with zeros. Longer slices keep their trailing 32 bytes.
    #[must_use]
    pub fn left_padded(slice: &[u8]) -> Self {
        let mut bytes = [0u8; ADDRESS_LEN];
        if slice.len() >= ADDRESS_LEN {
            bytes.copy_from_slice(&slice[slice.len() - ADDRESS_LEN..]);
        } else {
            bytes[ADDRESS_LEN - slice.len()..].copy_from_slice(slice);
        }
        Self(bytes)
    }

    /// Returns the underlying bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }

    /// Returns the address as an owned byte vector.
    #[must_use]
    pub fn to_vec(&self) -> Vec<u8> {
        self.0.to_vec()
    }

    /// Returns true if this is the zero address.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; ADDRESS_LEN]
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "0x{}...{}",
            hex::encode(&self.0[..4]),
            hex::encode(&self.0[ADDRESS_LEN - 2..])
        )
    }
}

impl From<[u8; ADDRESS_LEN]> for Address {
    fn from(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(bytes)
    }
}

impl From<Address> for [u8; ADDRESS_LEN] {
    fn from(addr: Address) -> Self {
        addr.0
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

// =============================================================================
// HASH (32 bytes)
// =============================================================================

/// A 32-byte hash (Keccak-256 or SHA-256).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Hash(pub [u8; HASH_LEN]);

impl Hash {
    /// The zero hash.
    pub const ZERO: Self = Self([0u8; HASH_LEN]);

    /// Creates a hash from a 32-byte array.
    #[must_use]
    pub const fn new(bytes: [u8; HASH_LEN]) -> Self {
        Self(bytes)
    }

    /// Creates a hash from a slice. Returns None if wrong length.
    #[must_use]
    pub fn from_slice(slice: &[u8]) -> Option<Self> {
        if slice.len() == HASH_LEN {
            let mut bytes = [0u8; HASH_LEN];
            bytes.copy_from_slice(slice);
            Some(Self(bytes))
        } else {
            None
        }
    }

    /// Returns the underlying bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; HASH_LEN] {
        &self.0
    }

    /// Returns the hash as an owned byte vector.
    #[must_use]
    pub fn to_vec(&self) -> Vec<u8> {
        self.0.to_vec()
    }

    /// Returns true if this is the zero hash.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; HASH_LEN]
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl From<[u8; HASH_LEN]> for Hash {
    fn from(bytes: [u8; HASH_LEN]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for Hash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

// =============================================================================
// BYTE HELPERS
// =============================================================================

/// Left-pads `data` with zeros up to `size` bytes. Data already at least
/// `size` bytes long is returned unchanged.
#[must_use]
pub fn pad_bytes_left(data: &[u8], size: usize) -> Vec<u8> {
    if data.len() >= size {
        return data.to_vec();
    }
    let mut padded = vec![0u8; size - data.len()];
    padded.extend_from_slice(data);
    padded
}

// =============================================================================
// TESTS
// =============================================================================
