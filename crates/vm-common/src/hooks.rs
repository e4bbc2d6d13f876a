//! # Node Hooks
//!
//! The interfaces through which the host reaches authoritative chain state
//! and cryptographic primitives. Adapters implement these traits: in-process
//! for tests, over a pipe when the VM runs out of process. The host only
//! ever reads through the blockchain hook; all writes are staged in the
//! execution output.

use crate::input::ContractCallInput;
use crate::output::VMOutput;
use crate::value_objects::{Address, Hash};
use num_bigint::BigInt;
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

// =============================================================================
// HOOK ERRORS
// =============================================================================

/// Errors from hook calls.
///
/// When the hook is backed by IPC these cover transport failures as well;
/// the host treats every successful response as authoritative.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HookError {
    /// The queried account does not exist.
    #[error("account not found")]
    AccountNotFound,
    /// The hook could not be reached.
    #[error("blockchain hook unavailable")]
    Unavailable,
    /// Any other hook-side failure.
    #[error("hook error: {0}")]
    Other(String),
}

// =============================================================================
// USER ACCOUNT
// =============================================================================

/// Authoritative account state as reported by the node.
#[derive(Clone, Debug, Default)]
pub struct UserAccount {
    /// Account nonce.
    pub nonce: u64,
    /// Account balance.
    pub balance: BigInt,
    /// Deployed contract code, empty for plain accounts.
    pub code: Vec<u8>,
    /// Hash of the deployed code.
    pub code_hash: Vec<u8>,
    /// Code metadata recorded at deploy time.
    pub code_metadata: Vec<u8>,
    /// Root hash of the account's storage trie.
    pub root_hash: Vec<u8>,
    /// Accumulated developer reward.
    pub developer_reward: BigInt,
    /// Address of the account's owner (deployer for contracts).
    pub owner_address: Address,
    /// Registered user name, if any.
    pub user_name: Vec<u8>,
}

// =============================================================================
// BLOCKCHAIN HOOK
// =============================================================================

/// Read access to authoritative chain state.
///
/// All operations are deterministic for the duration of one top-level call.
pub trait BlockchainHook {
    /// Derives the address of a contract deployed by `creator` at
    /// `creator_nonce`.
    fn new_address(
        &self,
        creator: &Address,
        creator_nonce: u64,
        vm_type: &[u8],
    ) -> Result<Address, HookError>;

    /// Reads one storage entry of `address`. Missing entries are empty.
    fn get_storage_data(&self, address: &Address, key: &[u8]) -> Result<Vec<u8>, HookError>;

    /// Hash of the block at `nonce`, if still available.
    fn get_blockhash(&self, nonce: u64) -> Result<Vec<u8>, HookError>;

    /// Nonce of the last committed block.
    fn last_nonce(&self) -> u64;
    /// Round of the last committed block.
    fn last_round(&self) -> u64;
    /// Timestamp of the last committed block.
    fn last_time_stamp(&self) -> u64;
    /// Random seed of the last committed block.
    fn last_random_seed(&self) -> Vec<u8>;
    /// Epoch of the last committed block.
    fn last_epoch(&self) -> u32;

    /// Nonce of the block under construction.
    fn current_nonce(&self) -> u64;
    /// Round of the block under construction.
    fn current_round(&self) -> u64;
    /// Timestamp of the block under construction.
    fn current_time_stamp(&self) -> u64;
    /// Random seed of the block under construction.
    fn current_random_seed(&self) -> Vec<u8>;
    /// Epoch of the block under construction.
    fn current_epoch(&self) -> u32;

    /// Root hash of the global state trie.
    fn get_state_root_hash(&self) -> Vec<u8>;

    /// Full account state, or `None` when the account does not exist.
    fn get_user_account(&self, address: &Address) -> Result<Option<UserAccount>, HookError>;

    /// The shard that owns `address`.
    fn get_shard_of_address(&self, address: &Address) -> u32;

    /// Whether `address` holds deployed contract code.
    fn is_smart_contract(&self, address: &Address) -> bool;

    /// Executes a protocol builtin function on behalf of the contract.
    fn process_builtin_function(
        &self,
        input: &ContractCallInput,
    ) -> Result<VMOutput, HookError>;

    /// Names of the protocol builtin functions. Contracts may not export
    /// functions with these names.
    fn get_builtin_function_names(&self) -> BTreeSet<String>;

    /// The complete storage map of `address`.
    fn get_all_state(&self, address: &Address) -> Result<BTreeMap<Vec<u8>, Vec<u8>>, HookError>;
}

// =============================================================================
// CRYPTO HOOK
// =============================================================================

/// Hash primitives the EI exposes to contracts.
pub trait CryptoHook {
    /// Keccak-256 digest of `data`.
    fn keccak256(&self, data: &[u8]) -> Hash;

    /// SHA-256 digest of `data`.
    fn sha256(&self, data: &[u8]) -> Hash;
}
