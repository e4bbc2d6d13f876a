//! # Storage Context
//!
//! Staged per-key storage for the contract under execution. Reads cache
//! the authoritative value into the output account so later reads stay
//! consistent; writes compute the transition class against the previous
//! value and charge gas per the schedule. Keys under the protocol-reserved
//! prefix are never writable from contracts.

use crate::contexts::metering::MeteringContext;
use crate::contexts::output::OutputContext;
use crate::contexts::runtime::RuntimeContext;
use crate::errors::{ExecutionError, HostSetupError};
use std::rc::Rc;
use vm_common::{Address, BlockchainHook, StorageUpdate};

// =============================================================================
// STORAGE STATUS
// =============================================================================

/// The transition class of one storage write, returned to the contract.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(i32)]
pub enum StorageStatus {
    /// The stored value did not change.
    Unchanged = 0,
    /// An existing value was overwritten.
    Modified = 1,
    /// A fresh key was written.
    Added = 2,
    /// An existing value was removed.
    Deleted = 3,
}

// =============================================================================
// STORAGE CONTEXT
// =============================================================================

/// Staged storage access for the active contract address.
pub struct StorageContext {
    hook: Rc<dyn BlockchainHook>,
    address: Address,
    state_stack: Vec<Address>,
    reserved_key_prefix: Vec<u8>,
}

impl StorageContext {
    /// Creates a storage context guarding `reserved_key_prefix`. The
    /// prefix must be non-empty, otherwise no key would be protected.
    pub fn new(
        hook: Rc<dyn BlockchainHook>,
        reserved_key_prefix: Vec<u8>,
    ) -> Result<Self, HostSetupError> {
        if reserved_key_prefix.is_empty() {
            return Err(HostSetupError::EmptyReservedKeyPrefix);
        }

        Ok(Self {
            hook,
            address: Address::ZERO,
            state_stack: Vec::new(),
            reserved_key_prefix,
        })
    }

    /// The address whose storage is active.
    #[must_use]
    pub fn current_address(&self) -> &Address {
        &self.address
    }

    /// Switches the active storage address.
    pub fn set_address(&mut self, address: Address) {
        self.address = address;
    }

    // -------------------------------------------------------------------------
    // state stack (the active address only)
    // -------------------------------------------------------------------------

    /// Saves the active address.
    pub fn push_state(&mut self) {
        self.state_stack.push(self.address);
    }

    /// Restores the most recently saved address.
    pub fn pop_set_active_state(&mut self) {
        debug_assert!(!self.state_stack.is_empty(), "storage state stack empty");
        if let Some(prev) = self.state_stack.pop() {
            self.address = prev;
        }
    }

    /// Drops the most recently saved address.
    pub fn pop_discard(&mut self) {
        debug_assert!(!self.state_stack.is_empty(), "storage state stack empty");
        self.state_stack.pop();
    }

    /// Empties the address stack.
    pub fn clear_state_stack(&mut self) {
        self.state_stack.clear();
    }

    /// Number of stacked addresses.
    #[must_use]
    pub fn state_stack_len(&self) -> usize {
        self.state_stack.len()
    }

    // -------------------------------------------------------------------------
    // reads and writes
    // -------------------------------------------------------------------------

    /// Whether `key` is protocol-reserved.
    #[must_use]
    pub fn is_reserved_key(&self, key: &[u8]) -> bool {
        key.starts_with(&self.reserved_key_prefix)
    }

    /// Reads the value under `key` for the active address, staging the
    /// authoritative value on first read. Missing keys read as empty.
    pub fn get(&self, key: &[u8], output: &mut OutputContext) -> Vec<u8> {
        let address = self.address;
        let (account, _) = output.get_output_account(&address);

        if let Some(update) = account.storage_updates.get(key) {
            return update.data.clone();
        }

        let value = self
            .hook
            .get_storage_data(&address, key)
            .unwrap_or_default();
        if !value.is_empty() {
            account.storage_updates.insert(
                key.to_vec(),
                StorageUpdate {
                    offset: key.to_vec(),
                    data: value.clone(),
                },
            );
        }

        value
    }

    /// Writes `value` under `key` for the active address, staging the
    /// update and charging gas per the transition class.
    pub fn set(
        &self,
        key: &[u8],
        value: &[u8],
        runtime: &RuntimeContext,
        metering: &MeteringContext,
        output: &mut OutputContext,
    ) -> Result<StorageStatus, ExecutionError> {
        if self.is_reserved_key(key) {
            return Err(ExecutionError::StoreReservedKey);
        }

        if runtime.read_only() {
            return Ok(StorageStatus::Unchanged);
        }

        let address = self.address;
        let length = value.len() as u64;
        let schedule = metering.gas_schedule().base_operation_cost.clone();

        let old_value = {
            let staged = {
                let (account, _) = output.get_output_account(&address);
                account.storage_updates.get(key).map(|u| u.data.clone())
            };
            match staged {
                Some(old) => old,
                None => {
                    let old = self.get(key, output);
                    let (account, _) = output.get_output_account(&address);
                    account.storage_updates.insert(
                        key.to_vec(),
                        StorageUpdate {
                            offset: key.to_vec(),
                            data: old.clone(),
                        },
                    );
                    old
                }
            }
        };

        let old_length = old_value.len() as u64;
        if old_value == value {
            metering.use_gas(runtime, schedule.data_copy_per_byte * length);
            return Ok(StorageStatus::Unchanged);
        }

        {
            let (account, _) = output.get_output_account(&address);
            account.storage_updates.insert(
                key.to_vec(),
                StorageUpdate {
                    offset: key.to_vec(),
                    data: value.to_vec(),
                },
            );
        }

        if old_value.is_empty() {
            metering.use_gas(runtime, schedule.store_per_byte * length);
            return Ok(StorageStatus::Added);
        }
        if value.is_empty() {
            metering.free_gas(output, schedule.release_per_byte * old_length);
            return Ok(StorageStatus::Deleted);
        }

        if length > old_length {
            let grown = length - old_length;
            metering.use_gas(
                runtime,
                schedule.persist_per_byte * old_length + schedule.store_per_byte * grown,
            );
        } else {
            let shrunk = old_length - length;
            metering.use_gas(runtime, schedule.persist_per_byte * length);
            metering.free_gas(output, schedule.release_per_byte * shrunk);
        }

        Ok(StorageStatus::Modified)
    }
}

// =============================================================================
// TESTS
// =============================================================================
