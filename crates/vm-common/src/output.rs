//! # Execution Output
//!
//! The staged projection of state changes produced by one top-level call:
//! per-account deltas, storage updates, logs and return data. The node
//! applies a [`VMOutput`] only when the return code is
//! [`ReturnCode::Ok`].

use crate::return_code::ReturnCode;
use crate::value_objects::Address;
use num_bigint::BigInt;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =============================================================================
// STORAGE UPDATE
// =============================================================================

/// A staged write to one storage entry of one account.
///
/// An absent entry means the key was never read nor written during the
/// call.
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StorageUpdate {
    /// The storage key.
    pub offset: Vec<u8>,
    /// The staged value. Empty means deleted.
    pub data: Vec<u8>,
}

// =============================================================================
// OUTPUT ACCOUNT
// =============================================================================

/// Pending changes to one on-chain account, accumulated during execution.
///
/// `balance` is the snapshot read from the blockchain hook when the account
/// was first materialized; `balance_delta` accumulates transfers during the
/// call. The projected balance is their sum.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct OutputAccount {
    /// The account address.
    pub address: Address,
    /// Staged nonce.
    pub nonce: u64,
    /// Balance snapshot from the hook, set on first materialization.
    pub balance: Option<BigInt>,
    /// Signed balance change accumulated during execution.
    pub balance_delta: BigInt,
    /// Newly deployed code, if any.
    pub code: Option<Vec<u8>>,
    /// Code metadata accompanying a deploy.
    pub code_metadata: Vec<u8>,
    /// Staged storage writes, ordered by key.
    pub storage_updates: BTreeMap<Vec<u8>, StorageUpdate>,
    /// Call data attached to an outgoing transfer.
    pub data: Vec<u8>,
    /// Gas forwarded along with an outgoing transfer.
    pub gas_limit: u64,
}

impl OutputAccount {
    /// Creates an empty output account for `address`.
    #[must_use]
    pub fn new(address: Address) -> Self {
        Self {
            address,
            ..Self::default()
        }
    }

    /// The projected balance: snapshot plus accumulated delta.
    #[must_use]
    pub fn projected_balance(&self) -> BigInt {
        match &self.balance {
            Some(balance) => balance + &self.balance_delta,
            None => self.balance_delta.clone(),
        }
    }

    /// Folds the changes of `other` (an inner call frame) into this
    /// account. Storage updates from the inner frame override same-key
    /// entries; balance deltas add; the later nonce and code win.
    pub fn merge(&mut self, other: &OutputAccount) {
        self.address = other.address;
        self.nonce = other.nonce;
        if other.balance.is_some() {
            self.balance = other.balance.clone();
        }
        self.balance_delta += &other.balance_delta;
        if other.code.is_some() {
            self.code = other.code.clone();
            self.code_metadata = other.code_metadata.clone();
        }
        for (key, update) in &other.storage_updates {
            self.storage_updates.insert(key.clone(), update.clone());
        }
        if !other.data.is_empty() {
            self.data = other.data.clone();
        }
        if other.gas_limit > 0 {
            self.gas_limit = other.gas_limit;
        }
    }
}

// =============================================================================
// LOG ENTRY
// =============================================================================

/// An event emitted by a contract.
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LogEntry {
    /// Address of the emitting contract.
    pub address: Address,
    /// Indexed topics.
    pub topics: Vec<Vec<u8>>,
    /// Non-indexed payload.
    pub data: Vec<u8>,
}

// =============================================================================
// VM OUTPUT
// =============================================================================

/// The complete result of one top-level execution.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct VMOutput {
    /// Ordered return values produced via `finish`.
    pub return_data: Vec<Vec<u8>>,
    /// Terminal status.
    pub return_code: ReturnCode,
    /// Human-readable failure detail, empty on success.
    pub return_message: String,
    /// Gas left unconsumed.
    pub gas_remaining: u64,
    /// Gas refunded by storage releases.
    pub gas_refund: BigInt,
    /// Pending account changes, keyed by address.
    pub output_accounts: BTreeMap<Address, OutputAccount>,
    /// Accounts deleted during execution.
    pub deleted_accounts: Vec<Address>,
    /// Accounts touched without substantive change.
    pub touched_accounts: Vec<Address>,
    /// Ordered emitted logs.
    pub logs: Vec<LogEntry>,
}

impl VMOutput {
    /// Builds the minimal output describing a failed execution. No staged
    /// state changes are surfaced.
    #[must_use]
    pub fn from_error(return_code: ReturnCode, return_message: impl Into<String>) -> Self {
        Self {
            return_code,
            return_message: return_message.into(),
            gas_remaining: 0,
            ..Self::default()
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_projected_balance() {
        let mut account = OutputAccount::new(Address::left_padded(b"alice"));
        assert_eq!(account.projected_balance(), BigInt::from(0));

        account.balance = Some(BigInt::from(100));
        account.balance_delta = BigInt::from(-30);
        assert_eq!(account.projected_balance(), BigInt::from(70));
    }

    #[test]
    fn test_merge_overrides_storage_and_adds_deltas() {
        let addr = Address::left_padded(b"contract");
        let mut outer = OutputAccount::new(addr);
        outer.balance_delta = BigInt::from(10);
        outer.storage_updates.insert(
            b"k1".to_vec(),
            StorageUpdate {
                offset: b"k1".to_vec(),
                data: b"outer".to_vec(),
            },
        );

        let mut inner = OutputAccount::new(addr);
        inner.balance_delta = BigInt::from(5);
        inner.storage_updates.insert(
            b"k1".to_vec(),
            StorageUpdate {
                offset: b"k1".to_vec(),
                data: b"inner".to_vec(),
            },
        );
        inner.storage_updates.insert(
            b"k2".to_vec(),
            StorageUpdate {
                offset: b"k2".to_vec(),
                data: b"fresh".to_vec(),
            },
        );

        outer.merge(&inner);
        assert_eq!(outer.balance_delta, BigInt::from(15));
        assert_eq!(outer.storage_updates[b"k1".as_slice()].data, b"inner");
        assert_eq!(outer.storage_updates[b"k2".as_slice()].data, b"fresh");
    }

    #[test]
    fn test_vm_output_from_error_carries_no_state() {
        let output = VMOutput::from_error(ReturnCode::ExecutionFailed, "boom");
        assert_eq!(output.return_code, ReturnCode::ExecutionFailed);
        assert_eq!(output.return_message, "boom");
        assert!(output.output_accounts.is_empty());
        assert!(output.return_data.is_empty());
        assert_eq!(output.gas_remaining, 0);
    }
}
