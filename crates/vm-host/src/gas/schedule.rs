//! Gas schedule groups and load-time validation.
//!
//! The schedule arrives from the node as structured data; parsing the
//! on-disk format is the node's concern. The host only validates it:
//! every WASM opcode must carry a non-zero cost, otherwise a contract
//! could loop for free between metering ticks.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors from gas schedule validation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GasScheduleError {
    /// An opcode was assigned a zero cost.
    #[error("opcode {0} has zero cost")]
    ZeroOpcodeCost(String),
}

// =============================================================================
// BASE OPERATION COSTS (per byte)
// =============================================================================

/// Per-byte multipliers applied by storage and data-copy operations.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct BaseOperationCost {
    /// Cost per byte of newly stored data.
    pub store_per_byte: u64,
    /// Refund per byte of released storage.
    pub release_per_byte: u64,
    /// Cost per byte copied between memory and host state.
    pub data_copy_per_byte: u64,
    /// Cost per byte of persisted (overwritten) data.
    pub persist_per_byte: u64,
}

// =============================================================================
// MAIN EI COSTS (flat per call)
// =============================================================================

/// Flat costs for the main environment-interface functions.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct ApiCost {
    pub get_sc_address: u64,
    pub get_owner_address: u64,
    pub get_shard_of_address: u64,
    pub is_smart_contract: u64,
    pub get_external_balance: u64,
    pub get_block_hash: u64,
    pub transfer_value: u64,
    pub get_argument: u64,
    pub get_function: u64,
    pub get_num_arguments: u64,
    pub storage_store: u64,
    pub storage_load: u64,
    pub get_caller: u64,
    pub get_call_value: u64,
    pub log: u64,
    pub finish: u64,
    pub signal_error: u64,
    pub get_block_timestamp: u64,
    pub get_block_nonce: u64,
    pub get_block_round: u64,
    pub get_block_epoch: u64,
    pub get_block_random_seed: u64,
    pub get_state_root_hash: u64,
    pub get_gas_left: u64,
    pub execute_on_same_context: u64,
    pub execute_on_dest_context: u64,
    pub delegate_execution: u64,
    pub execute_read_only: u64,
    pub create_contract: u64,
    pub get_num_return_data: u64,
    pub get_return_data_size: u64,
    pub get_return_data: u64,
    pub int64_get_argument: u64,
    pub int64_storage_store: u64,
    pub int64_storage_load: u64,
    pub int64_finish: u64,
    /// Charged when an async call is registered, and twice reserved as the
    /// minimum budget for the deferred legs.
    pub async_call_step: u64,
    /// Gas locked up-front so the async callback can always run.
    pub async_callback_gas_lock: u64,
}

// =============================================================================
// BIG-INT EI COSTS (flat per call)
// =============================================================================

/// Flat costs for the big-int environment-interface functions.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct BigIntApiCost {
    pub big_int_new: u64,
    pub big_int_byte_length: u64,
    pub big_int_get_bytes: u64,
    pub big_int_set_bytes: u64,
    pub big_int_is_int64: u64,
    pub big_int_get_int64: u64,
    pub big_int_set_int64: u64,
    pub big_int_add: u64,
    pub big_int_sub: u64,
    pub big_int_mul: u64,
    pub big_int_cmp: u64,
    pub big_int_sign: u64,
    pub big_int_finish: u64,
    pub big_int_storage_store: u64,
    pub big_int_storage_load: u64,
    pub big_int_get_argument: u64,
    pub big_int_get_call_value: u64,
    pub big_int_get_external_balance: u64,
}

// =============================================================================
// CRYPTO EI COSTS (flat per call)
// =============================================================================

/// Flat costs for the crypto environment-interface functions.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct CryptoApiCost {
    pub sha256: u64,
    pub keccak256: u64,
}

// =============================================================================
// GAS SCHEDULE
// =============================================================================

/// The complete cost model for one host instance.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct GasSchedule {
    /// Per-byte base operation multipliers.
    pub base_operation_cost: BaseOperationCost,
    /// Flat main-EI costs.
    pub api_cost: ApiCost,
    /// Flat big-int EI costs.
    pub big_int_api_cost: BigIntApiCost,
    /// Flat crypto EI costs.
    pub crypto_api_cost: CryptoApiCost,
    /// WASM opcode costs, keyed by opcode name. Consumed by the engine.
    pub opcode_cost: BTreeMap<String, u64>,
}

impl GasSchedule {
    /// Validates the schedule. Every opcode entry must be non-zero.
    pub fn validate(&self) -> Result<(), GasScheduleError> {
        for (name, cost) in &self.opcode_cost {
            if *cost == 0 {
                return Err(GasScheduleError::ZeroOpcodeCost(name.clone()));
            }
        }
        Ok(())
    }

    /// A schedule with every cost set to 1, used by the test suites so gas
    /// assertions stay readable.
    #[must_use]
    pub fn test_schedule() -> Self {
        let mut schedule = Self {
            base_operation_cost: BaseOperationCost {
                store_per_byte: 1,
                release_per_byte: 1,
                data_copy_per_byte: 1,
                persist_per_byte: 1,
            },
            api_cost: ApiCost {
                get_sc_address: 1,
                get_owner_address: 1,
                get_shard_of_address: 1,
                is_smart_contract: 1,
                get_external_balance: 1,
                get_block_hash: 1,
                transfer_value: 1,
                get_argument: 1,
                get_function: 1,
                get_num_arguments: 1,
                storage_store: 1,
                storage_load: 1,
                get_caller: 1,
                get_call_value: 1,
                log: 1,
                finish: 1,
                signal_error: 1,
                get_block_timestamp: 1,
                get_block_nonce: 1,
                get_block_round: 1,
                get_block_epoch: 1,
                get_block_random_seed: 1,
                get_state_root_hash: 1,
                get_gas_left: 1,
                execute_on_same_context: 1,
                execute_on_dest_context: 1,
                delegate_execution: 1,
                execute_read_only: 1,
                create_contract: 1,
                get_num_return_data: 1,
                get_return_data_size: 1,
                get_return_data: 1,
                int64_get_argument: 1,
                int64_storage_store: 1,
                int64_storage_load: 1,
                int64_finish: 1,
                async_call_step: 1,
                async_callback_gas_lock: 1,
            },
            big_int_api_cost: BigIntApiCost {
                big_int_new: 1,
                big_int_byte_length: 1,
                big_int_get_bytes: 1,
                big_int_set_bytes: 1,
                big_int_is_int64: 1,
                big_int_get_int64: 1,
                big_int_set_int64: 1,
                big_int_add: 1,
                big_int_sub: 1,
                big_int_mul: 1,
                big_int_cmp: 1,
                big_int_sign: 1,
                big_int_finish: 1,
                big_int_storage_store: 1,
                big_int_storage_load: 1,
                big_int_get_argument: 1,
                big_int_get_call_value: 1,
                big_int_get_external_balance: 1,
            },
            crypto_api_cost: CryptoApiCost {
                sha256: 1,
                keccak256: 1,
            },
            opcode_cost: BTreeMap::new(),
        };

        for opcode in [
            "Unreachable", "Nop", "Block", "Loop", "If", "Else", "End", "Br", "BrIf", "BrTable",
            "Return", "Call", "CallIndirect", "Drop", "Select", "LocalGet", "LocalSet",
            "LocalTee", "GlobalGet", "GlobalSet", "I32Load", "I64Load", "I32Store", "I64Store",
            "MemorySize", "MemoryGrow", "I32Const", "I64Const", "I32Add", "I64Add", "I32Sub",
            "I64Sub", "I32Mul", "I64Mul", "I32DivS", "I64DivS", "I32RemS", "I64RemS", "I32And",
            "I64And", "I32Or", "I64Or", "I32Xor", "I64Xor", "I32Shl", "I64Shl", "I32Eq", "I64Eq",
            "I32LtS", "I64LtS", "I32GtS", "I64GtS",
        ] {
            schedule.opcode_cost.insert(opcode.to_string(), 1);
        }

        schedule
    }
}

// =============================================================================
// TESTS
// =============================================================================
