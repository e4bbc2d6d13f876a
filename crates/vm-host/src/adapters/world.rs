//! # In-Memory World
//!
//! A blockchain hook backed by plain maps, for tests and local debugging.
//! It can also apply a successful `VMOutput` back onto itself so scenario
//! tests can chain top-level calls the way a node would.

use sha2::{Digest, Sha256};
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use vm_common::{
    Address, BlockchainHook, ContractCallInput, HookError, UserAccount, VMOutput,
};
use num_bigint::BigInt;

// =============================================================================
// WORLD STATE
// =============================================================================

/// One account in the test world.
#[derive(Clone, Debug, Default)]
pub struct WorldAccount {
    /// Account address.
    pub address: Address,
    /// Account nonce.
    pub nonce: u64,
    /// Account balance.
    pub balance: BigInt,
    /// Deployed contract code.
    pub code: Vec<u8>,
    /// Code metadata recorded at deploy time.
    pub code_metadata: Vec<u8>,
    /// Owner address (the deployer for contracts).
    pub owner_address: Address,
    /// Account storage.
    pub storage: BTreeMap<Vec<u8>, Vec<u8>>,
}

/// Block information exposed through the hook.
#[derive(Clone, Debug, Default)]
pub struct BlockInfo {
    /// Block nonce.
    pub nonce: u64,
    /// Block round.
    pub round: u64,
    /// Block timestamp.
    pub timestamp: u64,
    /// Block epoch.
    pub epoch: u32,
    /// Block random seed.
    pub random_seed: Vec<u8>,
}

/// The in-memory blockchain hook.
#[derive(Default)]
pub struct InMemoryWorld {
    accounts: RefCell<BTreeMap<Address, WorldAccount>>,
    /// The block under construction.
    pub current_block: BlockInfo,
    /// The last committed block.
    pub last_block: BlockInfo,
    /// State root reported to contracts.
    pub state_root_hash: Vec<u8>,
    /// Block hashes by nonce.
    pub block_hashes: BTreeMap<u64, Vec<u8>>,
    /// Names the protocol reserves for builtin functions.
    pub builtin_functions: BTreeSet<String>,
}

impl InMemoryWorld {
    /// Creates an empty world.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces an account.
    pub fn add_account(&self, account: WorldAccount) {
        self.accounts.borrow_mut().insert(account.address, account);
    }

    /// A snapshot of the account at `address`.
    #[must_use]
    pub fn account(&self, address: &Address) -> Option<WorldAccount> {
        self.accounts.borrow().get(address).cloned()
    }

    /// The stored value under `key` for `address`.
    #[must_use]
    pub fn storage_of(&self, address: &Address, key: &[u8]) -> Vec<u8> {
        self.accounts
            .borrow()
            .get(address)
            .and_then(|account| account.storage.get(key).cloned())
            .unwrap_or_default()
    }

    /// Deterministic contract address derivation for the test world:
    /// SHA-256 over `(creator, nonce, vm_type)`.
    #[must_use]
    pub fn derive_address(creator: &Address, nonce: u64, vm_type: &[u8]) -> Address {
        let mut hasher = Sha256::new();
        hasher.update(creator.as_bytes());
        hasher.update(nonce.to_le_bytes());
        hasher.update(vm_type);
        Address::new(hasher.finalize().into())
    }

    /// Applies a successful execution output onto the world state, the way
    /// a node would: balance deltas, staged nonces, deployed code and
    /// storage updates (empty data deletes the key).
    pub fn apply_output(&self, output: &VMOutput) {
        let mut accounts = self.accounts.borrow_mut();
        for (address, output_account) in &output.output_accounts {
            let account = accounts.entry(*address).or_insert_with(|| WorldAccount {
                address: *address,
                ..WorldAccount::default()
            });

            account.balance += &output_account.balance_delta;
            if output_account.nonce > account.nonce {
                account.nonce = output_account.nonce;
            }
            if let Some(code) = &output_account.code {
                account.code.clone_from(code);
                account.code_metadata.clone_from(&output_account.code_metadata);
            }
            for (key, update) in &output_account.storage_updates {
                if update.data.is_empty() {
                    account.storage.remove(key);
                } else {
                    account.storage.insert(key.clone(), update.data.clone());
                }
            }
        }
        for deleted in &output.deleted_accounts {
            accounts.remove(deleted);
        }
    }
}

impl BlockchainHook for InMemoryWorld {
    fn new_address(
        &self,
        creator: &Address,
        creator_nonce: u64,
        vm_type: &[u8],
    ) -> Result<Address, HookError> {
        Ok(Self::derive_address(creator, creator_nonce, vm_type))
    }

    fn get_storage_data(&self, address: &Address, key: &[u8]) -> Result<Vec<u8>, HookError> {
        Ok(self.storage_of(address, key))
    }

    fn get_blockhash(&self, nonce: u64) -> Result<Vec<u8>, HookError> {
        Ok(self.block_hashes.get(&nonce).cloned().unwrap_or_default())
    }

    fn last_nonce(&self) -> u64 {
        self.last_block.nonce
    }

    fn last_round(&self) -> u64 {
        self.last_block.round
    }

    fn last_time_stamp(&self) -> u64 {
        self.last_block.timestamp
    }

    fn last_random_seed(&self) -> Vec<u8> {
        self.last_block.random_seed.clone()
    }

    fn last_epoch(&self) -> u32 {
        self.last_block.epoch
    }

    fn current_nonce(&self) -> u64 {
        self.current_block.nonce
    }

    fn current_round(&self) -> u64 {
        self.current_block.round
    }

    fn current_time_stamp(&self) -> u64 {
        self.current_block.timestamp
    }

    fn current_random_seed(&self) -> Vec<u8> {
        self.current_block.random_seed.clone()
    }

    fn current_epoch(&self) -> u32 {
        self.current_block.epoch
    }

    fn get_state_root_hash(&self) -> Vec<u8> {
        self.state_root_hash.clone()
    }

    fn get_user_account(&self, address: &Address) -> Result<Option<UserAccount>, HookError> {
        Ok(self.accounts.borrow().get(address).map(|account| UserAccount {
            nonce: account.nonce,
            balance: account.balance.clone(),
            code: account.code.clone(),
            code_hash: Vec::new(),
            code_metadata: account.code_metadata.clone(),
            root_hash: Vec::new(),
            developer_reward: BigInt::from(0),
            owner_address: account.owner_address,
            user_name: Vec::new(),
        }))
    }

    fn get_shard_of_address(&self, _address: &Address) -> u32 {
        // The test world is single-shard.
        0
    }

    fn is_smart_contract(&self, address: &Address) -> bool {
        self.accounts
            .borrow()
            .get(address)
            .is_some_and(|account| !account.code.is_empty())
    }

    fn process_builtin_function(
        &self,
        _input: &ContractCallInput,
    ) -> Result<VMOutput, HookError> {
        Ok(VMOutput::default())
    }

    fn get_builtin_function_names(&self) -> BTreeSet<String> {
        self.builtin_functions.clone()
    }

    fn get_all_state(&self, address: &Address) -> Result<BTreeMap<Vec<u8>, Vec<u8>>, HookError> {
        Ok(self
            .accounts
            .borrow()
            .get(address)
            .map(|account| account.storage.clone())
            .unwrap_or_default())
    }
}

// =============================================================================
// TESTS
// =============================================================================
