//! # Blockchain Context
//!
//! A read-through façade over the blockchain hook. Staged output accounts
//! supersede the hook: balances merge the snapshot with the accumulated
//! delta, nonces come from the staged account once materialized. The
//! context never writes through the hook.

use crate::contexts::output::OutputContext;
use crate::errors::ExecutionError;
use num_bigint::BigInt;
use num_traits::Zero;
use std::rc::Rc;
use vm_common::{Address, BlockchainHook, CryptoHook};

/// Read façade over hook state merged with pending output deltas.
pub struct BlockchainContext {
    hook: Rc<dyn BlockchainHook>,
    crypto: Rc<dyn CryptoHook>,
}

impl BlockchainContext {
    /// Creates the façade over the given hooks.
    #[must_use]
    pub fn new(hook: Rc<dyn BlockchainHook>, crypto: Rc<dyn CryptoHook>) -> Self {
        Self { hook, crypto }
    }

    /// Derives the address for a contract deployed by `creator`. The
    /// creator's nonce was already incremented for the deploy transaction
    /// upstream, so derivation uses the preceding nonce.
    pub fn new_address(
        &self,
        creator: &Address,
        vm_type: &[u8],
        output: &mut OutputContext,
    ) -> Result<Address, ExecutionError> {
        let mut nonce = self.get_nonce(creator, output)?;
        if nonce > 0 {
            nonce -= 1;
        }

        Ok(self.hook.new_address(creator, nonce, vm_type)?)
    }

    /// Whether the account exists on chain.
    #[must_use]
    pub fn account_exists(&self, address: &Address) -> bool {
        matches!(self.hook.get_user_account(address), Ok(Some(_)))
    }

    /// The account balance merged with any staged delta, as minimal
    /// big-endian bytes.
    pub fn get_balance(&self, address: &Address, output: &mut OutputContext) -> Vec<u8> {
        let balance = self.get_balance_big_int(address, output);
        let (_, bytes) = balance.to_bytes_be();
        bytes
    }

    /// The account balance merged with any staged delta.
    pub fn get_balance_big_int(&self, address: &Address, output: &mut OutputContext) -> BigInt {
        let (account, is_new) = output.get_output_account(address);
        if !is_new {
            if account.balance.is_none() {
                let balance = match self.hook.get_user_account(address) {
                    Ok(Some(user_account)) => user_account.balance,
                    _ => return BigInt::zero(),
                };
                account.balance = Some(balance);
            }
            return account.projected_balance();
        }

        let balance = match self.hook.get_user_account(address) {
            Ok(Some(user_account)) => user_account.balance,
            _ => return BigInt::zero(),
        };
        account.balance = Some(balance.clone());
        balance
    }

    /// The account nonce, staged once read.
    pub fn get_nonce(
        &self,
        address: &Address,
        output: &mut OutputContext,
    ) -> Result<u64, ExecutionError> {
        let (account, is_new) = output.get_output_account(address);
        if !is_new {
            return Ok(account.nonce);
        }

        let nonce = match self.hook.get_user_account(address)? {
            Some(user_account) => user_account.nonce,
            None => 0,
        };
        account.nonce = nonce;
        Ok(nonce)
    }

    /// Increments the staged nonce of `address`.
    pub fn increase_nonce(&self, address: &Address, output: &mut OutputContext) {
        let nonce = self.get_nonce(address, output).unwrap_or(0);
        let (account, _) = output.get_output_account(address);
        account.nonce = nonce + 1;
    }

    /// The deployed code of `address`.
    pub fn get_code(&self, address: &Address) -> Result<Vec<u8>, ExecutionError> {
        let account = self
            .hook
            .get_user_account(address)?
            .ok_or(ExecutionError::InvalidAccount)?;

        if account.code.is_empty() {
            return Err(ExecutionError::ContractNotFound);
        }

        Ok(account.code)
    }

    /// The size of the deployed code of `address`, zero when absent.
    pub fn get_code_size(&self, address: &Address) -> Result<i32, ExecutionError> {
        let code_len = match self.hook.get_user_account(address)? {
            Some(account) => account.code.len(),
            None => 0,
        };
        Ok(code_len as i32)
    }

    /// Keccak-256 hash of the deployed code of `address`.
    pub fn get_code_hash(&self, address: &Address) -> Result<Vec<u8>, ExecutionError> {
        let code = self.get_code(address)?;
        Ok(self.crypto.keccak256(&code).to_vec())
    }

    /// Hash of the block at `nonce`. Empty for negative nonces or
    /// unavailable blocks.
    #[must_use]
    pub fn block_hash(&self, nonce: i64) -> Vec<u8> {
        if nonce < 0 {
            return Vec::new();
        }

        self.hook.get_blockhash(nonce as u64).unwrap_or_default()
    }

    /// Owner of the contract at `sc_address`.
    pub fn get_owner_address(&self, sc_address: &Address) -> Result<Address, ExecutionError> {
        let account = self
            .hook
            .get_user_account(sc_address)?
            .ok_or(ExecutionError::InvalidAccount)?;
        Ok(account.owner_address)
    }

    /// The shard that owns `address`.
    #[must_use]
    pub fn shard_of_address(&self, address: &Address) -> u32 {
        self.hook.get_shard_of_address(address)
    }

    /// Whether `address` holds deployed contract code.
    #[must_use]
    pub fn is_smart_contract(&self, address: &Address) -> bool {
        self.hook.is_smart_contract(address)
    }

    // -------------------------------------------------------------------------
    // block context pass-through
    // -------------------------------------------------------------------------

    /// Epoch of the block under construction.
    #[must_use]
    pub fn current_epoch(&self) -> u32 {
        self.hook.current_epoch()
    }

    /// Nonce of the block under construction.
    #[must_use]
    pub fn current_nonce(&self) -> u64 {
        self.hook.current_nonce()
    }

    /// Round of the block under construction.
    #[must_use]
    pub fn current_round(&self) -> u64 {
        self.hook.current_round()
    }

    /// Timestamp of the block under construction.
    #[must_use]
    pub fn current_time_stamp(&self) -> u64 {
        self.hook.current_time_stamp()
    }

    /// Random seed of the block under construction.
    #[must_use]
    pub fn current_random_seed(&self) -> Vec<u8> {
        self.hook.current_random_seed()
    }

    /// Epoch of the last committed block.
    #[must_use]
    pub fn last_epoch(&self) -> u32 {
        self.hook.last_epoch()
    }

    /// Nonce of the last committed block.
    #[must_use]
    pub fn last_nonce(&self) -> u64 {
        self.hook.last_nonce()
    }

    /// Round of the last committed block.
    #[must_use]
    pub fn last_round(&self) -> u64 {
        self.hook.last_round()
    }

    /// Timestamp of the last committed block.
    #[must_use]
    pub fn last_time_stamp(&self) -> u64 {
        self.hook.last_time_stamp()
    }

    /// Random seed of the last committed block.
    #[must_use]
    pub fn last_random_seed(&self) -> Vec<u8> {
        self.hook.last_random_seed()
    }

    /// Root hash of the global state trie.
    #[must_use]
    pub fn get_state_root_hash(&self) -> Vec<u8> {
        self.hook.get_state_root_hash()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::crypto::DefaultCryptoHook;
    use crate::adapters::world::{InMemoryWorld, WorldAccount};

    fn addr(tag: &[u8]) -> Address {
        Address::left_padded(tag)
    }

    fn context_with_world(world: InMemoryWorld) -> BlockchainContext {
        BlockchainContext::new(Rc::new(world), Rc::new(DefaultCryptoHook))
    }

    #[test]
    fn test_balance_merges_staged_delta() {
        let world = InMemoryWorld::new();
        world.add_account(WorldAccount {
            address: addr(b"alice"),
            balance: BigInt::from(100),
            ..WorldAccount::default()
        });
        let blockchain = context_with_world(world);
        let mut output = OutputContext::new();

        // First read snapshots the hook balance.
        assert_eq!(
            blockchain.get_balance_big_int(&addr(b"alice"), &mut output),
            BigInt::from(100)
        );

        // A staged delta is merged on subsequent reads.
        output.add_tx_value_to_account(&addr(b"alice"), &BigInt::from(-30));
        assert_eq!(
            blockchain.get_balance_big_int(&addr(b"alice"), &mut output),
            BigInt::from(70)
        );
    }

    #[test]
    fn test_balance_of_unknown_account_is_zero() {
        let blockchain = context_with_world(InMemoryWorld::new());
        let mut output = OutputContext::new();
        assert_eq!(
            blockchain.get_balance_big_int(&addr(b"ghost"), &mut output),
            BigInt::zero()
        );
    }

    #[test]
    fn test_nonce_staging_and_increase() {
        let world = InMemoryWorld::new();
        world.add_account(WorldAccount {
            address: addr(b"alice"),
            nonce: 5,
            ..WorldAccount::default()
        });
        let blockchain = context_with_world(world);
        let mut output = OutputContext::new();

        assert_eq!(blockchain.get_nonce(&addr(b"alice"), &mut output).unwrap(), 5);

        blockchain.increase_nonce(&addr(b"alice"), &mut output);
        blockchain.increase_nonce(&addr(b"alice"), &mut output);
        assert_eq!(blockchain.get_nonce(&addr(b"alice"), &mut output).unwrap(), 7);
    }

    #[test]
    fn test_new_address_uses_preceding_nonce() {
        let world = InMemoryWorld::new();
        world.add_account(WorldAccount {
            address: addr(b"creator"),
            nonce: 3,
            ..WorldAccount::default()
        });
        let blockchain = context_with_world(world);
        let mut output = OutputContext::new();

        let derived = blockchain
            .new_address(&addr(b"creator"), b"type", &mut output)
            .unwrap();
        // The in-memory world derives from (creator, nonce - 1, vm_type).
        let expected = InMemoryWorld::derive_address(&addr(b"creator"), 2, b"type");
        assert_eq!(derived, expected);
    }

    #[test]
    fn test_new_address_identity_at_nonce_zero() {
        let blockchain = context_with_world(InMemoryWorld::new());
        let mut output = OutputContext::new();

        let derived = blockchain
            .new_address(&addr(b"fresh"), b"type", &mut output)
            .unwrap();
        let expected = InMemoryWorld::derive_address(&addr(b"fresh"), 0, b"type");
        assert_eq!(derived, expected);
    }

    #[test]
    fn test_get_code_errors() {
        let world = InMemoryWorld::new();
        world.add_account(WorldAccount {
            address: addr(b"plain"),
            ..WorldAccount::default()
        });
        let blockchain = context_with_world(world);

        assert_eq!(
            blockchain.get_code(&addr(b"ghost")).unwrap_err(),
            ExecutionError::InvalidAccount
        );
        assert_eq!(
            blockchain.get_code(&addr(b"plain")).unwrap_err(),
            ExecutionError::ContractNotFound
        );
    }

    #[test]
    fn test_block_hash_negative_nonce_is_empty() {
        let blockchain = context_with_world(InMemoryWorld::new());
        assert!(blockchain.block_hash(-1).is_empty());
    }
}
