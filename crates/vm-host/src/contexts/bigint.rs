//! # Big-Int Context
//!
//! An arena of arbitrary-precision integers addressed by dense `i32`
//! handles. Handles are only valid within one top-level call; the arena is
//! cleared on `init_state` and snapshotted around nested destination calls
//! so inner handles never leak outward.

use num_bigint::{BigInt, Sign};
use num_traits::{Signed, Zero};

/// The handle-addressed big-integer arena with its snapshot stack.
#[derive(Debug, Default)]
pub struct BigIntContext {
    values: Vec<BigInt>,
    state_stack: Vec<Vec<BigInt>>,
}

impl BigIntContext {
    /// Creates an empty arena.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears the arena. Called before every top-level execution.
    pub fn init_state(&mut self) {
        self.values.clear();
    }

    // -------------------------------------------------------------------------
    // state stack
    // -------------------------------------------------------------------------

    /// Snapshots the whole arena.
    pub fn push_state(&mut self) {
        self.state_stack.push(self.values.clone());
    }

    /// Restores the most recent snapshot.
    pub fn pop_set_active_state(&mut self) {
        debug_assert!(!self.state_stack.is_empty(), "big-int state stack empty");
        if let Some(prev) = self.state_stack.pop() {
            self.values = prev;
        }
    }

    /// Drops the most recent snapshot.
    pub fn pop_discard(&mut self) {
        debug_assert!(!self.state_stack.is_empty(), "big-int state stack empty");
        self.state_stack.pop();
    }

    /// Empties the snapshot stack.
    pub fn clear_state_stack(&mut self) {
        self.state_stack.clear();
    }

    /// Number of stacked snapshots.
    #[must_use]
    pub fn state_stack_len(&self) -> usize {
        self.state_stack.len()
    }

    // -------------------------------------------------------------------------
    // arena access
    // -------------------------------------------------------------------------

    /// Allocates a new handle holding `value`. Allocation is monotonic
    /// within one top-level call.
    pub fn put(&mut self, value: BigInt) -> i32 {
        self.values.push(value);
        (self.values.len() - 1) as i32
    }

    /// The value behind `handle`. Unallocated handles read as zero, the
    /// arena growing densely to cover them.
    pub fn get(&mut self, handle: i32) -> BigInt {
        self.ensure(handle);
        self.values[handle as usize].clone()
    }

    /// Overwrites the value behind `handle`, allocating densely as needed.
    pub fn set(&mut self, handle: i32, value: BigInt) {
        self.ensure(handle);
        self.values[handle as usize] = value;
    }

    /// Number of live handles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the arena is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn ensure(&mut self, handle: i32) {
        let index = handle.max(0) as usize;
        if index >= self.values.len() {
            self.values.resize(index + 1, BigInt::zero());
        }
    }
}

// =============================================================================
// TWO'S-COMPLEMENT CODEC
// =============================================================================

/// Decodes two's-complement big-endian bytes into a signed integer.
/// An empty slice decodes to zero.
#[must_use]
pub fn big_int_from_signed_bytes(bytes: &[u8]) -> BigInt {
    if bytes.is_empty() {
        return BigInt::zero();
    }
    BigInt::from_signed_bytes_be(bytes)
}

/// Encodes a signed integer as minimal two's-complement big-endian bytes.
/// Zero encodes as the empty slice.
#[must_use]
pub fn big_int_to_signed_bytes(value: &BigInt) -> Vec<u8> {
    if value.is_zero() {
        return Vec::new();
    }
    value.to_signed_bytes_be()
}

/// Encodes a non-negative integer as minimal unsigned big-endian bytes.
/// Zero and negative values encode as the empty slice.
#[must_use]
pub fn big_int_to_unsigned_bytes(value: &BigInt) -> Vec<u8> {
    if value.is_negative() || value.is_zero() {
        return Vec::new();
    }
    let (_, bytes) = value.to_bytes_be();
    bytes
}

/// Decodes unsigned big-endian bytes into a non-negative integer.
#[must_use]
pub fn big_int_from_unsigned_bytes(bytes: &[u8]) -> BigInt {
    BigInt::from_bytes_be(Sign::Plus, bytes)
}

// =============================================================================
// TESTS
// =============================================================================
