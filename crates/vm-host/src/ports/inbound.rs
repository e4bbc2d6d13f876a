//! # Inbound Port
//!
//! The entry points the node drives. One executor services one call at a
//! time; concurrent calls must go to separate hosts.

use crate::errors::ExecutionError;
use vm_common::{ContractCallInput, ContractCreateInput, VMOutput};

/// The VM entry API consumed by the node.
pub trait VmExecutor {
    /// Deploys a new contract and runs its init function.
    fn run_smart_contract_create(
        &mut self,
        input: ContractCreateInput,
    ) -> Result<VMOutput, ExecutionError>;

    /// Calls a function on a deployed contract. Dispatches to the upgrade
    /// path when the called function is `upgrade`.
    fn run_smart_contract_call(
        &mut self,
        input: ContractCallInput,
    ) -> Result<VMOutput, ExecutionError>;
}
