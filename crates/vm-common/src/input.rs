//! # Call Inputs
//!
//! Inputs the node hands to the VM entry points: the common `VMInput`
//! carried by every transaction, plus the call/create specializations.

use crate::value_objects::Address;
use num_bigint::BigInt;
use serde::{Deserialize, Serialize};

// =============================================================================
// CALL TYPE
// =============================================================================

/// How a contract call entered the VM.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CallType {
    /// A direct transaction-driven call.
    #[default]
    DirectCall,
    /// A call routed by the node on behalf of a deferred async call.
    AsynchronousCall,
    /// The callback leg of a completed async call.
    AsynchronousCallBack,
}

// =============================================================================
// VM INPUT
// =============================================================================

/// The transaction-level input common to deploys, calls and upgrades.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct VMInput {
    /// Address of the account that signed the transaction.
    pub caller_addr: Address,
    /// Value transferred along with the call.
    pub call_value: BigInt,
    /// Ordered call arguments, each an opaque byte string.
    pub arguments: Vec<Vec<u8>>,
    /// Gas price the caller pays per gas unit.
    pub gas_price: u64,
    /// Gas the caller provided for this execution.
    pub gas_provided: u64,
    /// How this call entered the VM.
    pub call_type: CallType,
    /// Hash of the transaction currently being processed.
    pub current_tx_hash: Vec<u8>,
    /// Hash of the originating transaction (differs from current for
    /// async callbacks).
    pub original_tx_hash: Vec<u8>,
}

// =============================================================================
// CONTRACT CALL / CREATE INPUTS
// =============================================================================

/// Input for calling a function on a deployed contract.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ContractCallInput {
    /// Transaction-level input.
    pub vm_input: VMInput,
    /// Address of the contract being called.
    pub recipient_addr: Address,
    /// Name of the exported function to invoke.
    pub function: String,
}

/// Input for deploying a new contract.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ContractCreateInput {
    /// Transaction-level input.
    pub vm_input: VMInput,
    /// The WASM bytecode to deploy.
    pub contract_code: Vec<u8>,
    /// Two metadata bytes describing upgradeability and payability.
    pub contract_code_metadata: Vec<u8>,
}

// =============================================================================
// TESTS
// =============================================================================
