//! # VM Host
//!
//! Wires the six execution contexts, receives deploy/call/upgrade inputs
//! from the node and drives nested execution. One host services one call
//! at a time; `init_state` clears every context before each top-level
//! entry.

mod execution;

pub use execution::parse_call_data;

use crate::api;
use crate::contexts::{
    BigIntContext, BlockchainContext, MeteringContext, OutputContext, RuntimeContext,
    StorageContext,
};
use crate::errors::{ExecutionError, HostSetupError};
use crate::gas::GasSchedule;
use crate::ports::engine::Engine;
use std::collections::BTreeSet;
use std::rc::Rc;
use vm_common::{BlockchainHook, CryptoHook};

/// Default cap on concurrently live instances (the active one plus the
/// suspended stack).
pub const DEFAULT_MAX_INSTANCE_COUNT: u64 = 10;

// =============================================================================
// HOST PARAMETERS
// =============================================================================

/// Construction parameters for a host.
pub struct VmHostParameters {
    /// Byte tag identifying this engine variant; used for address
    /// derivation.
    pub vm_type: Vec<u8>,
    /// Maximum gas one block may consume.
    pub block_gas_limit: u64,
    /// The cost model.
    pub gas_schedule: GasSchedule,
    /// Storage key prefix only the protocol may write. Must be non-empty.
    pub reserved_key_prefix: Vec<u8>,
    /// Cap on the instance stack depth.
    pub max_instance_count: u64,
}

impl VmHostParameters {
    /// Parameters suitable for the test suites: test schedule, one-byte VM
    /// type and the default instance cap.
    #[must_use]
    pub fn for_tests(reserved_key_prefix: &[u8]) -> Self {
        Self {
            vm_type: vec![5, 0],
            block_gas_limit: 10_000_000_000,
            gas_schedule: GasSchedule::test_schedule(),
            reserved_key_prefix: reserved_key_prefix.to_vec(),
            max_instance_count: DEFAULT_MAX_INSTANCE_COUNT,
        }
    }
}

// =============================================================================
// VM HOST
// =============================================================================

/// The execution host: six contexts plus the hooks they share.
pub struct VmHost {
    pub(crate) blockchain_hook: Rc<dyn BlockchainHook>,
    pub(crate) crypto_hook: Rc<dyn CryptoHook>,
    pub(crate) blockchain: BlockchainContext,
    pub(crate) runtime: RuntimeContext,
    pub(crate) metering: MeteringContext,
    pub(crate) output: OutputContext,
    pub(crate) storage: StorageContext,
    pub(crate) big_int: BigIntContext,
}

impl VmHost {
    /// Creates a host over the given engine and hooks. Validates the gas
    /// schedule and installs the opcode cost table process-wide.
    pub fn new(
        engine: Rc<dyn Engine>,
        blockchain_hook: Rc<dyn BlockchainHook>,
        crypto_hook: Rc<dyn CryptoHook>,
        parameters: VmHostParameters,
    ) -> Result<Self, HostSetupError> {
        parameters.gas_schedule.validate()?;
        engine.set_opcode_costs(&parameters.gas_schedule.opcode_cost);

        let sc_api_names = api::api_function_names();
        let protocol_builtin_functions: BTreeSet<String> =
            blockchain_hook.get_builtin_function_names();

        let mut runtime = RuntimeContext::new(
            Rc::clone(&engine),
            parameters.vm_type,
            sc_api_names,
            protocol_builtin_functions,
        );
        runtime.set_max_instance_count(parameters.max_instance_count);

        let gas_schedule = Rc::new(parameters.gas_schedule);

        let mut host = Self {
            blockchain: BlockchainContext::new(
                Rc::clone(&blockchain_hook),
                Rc::clone(&crypto_hook),
            ),
            storage: StorageContext::new(
                Rc::clone(&blockchain_hook),
                parameters.reserved_key_prefix,
            )?,
            metering: MeteringContext::new(gas_schedule, parameters.block_gas_limit),
            output: OutputContext::new(),
            big_int: BigIntContext::new(),
            runtime,
            blockchain_hook,
            crypto_hook,
        };
        host.init_state();
        Ok(host)
    }

    /// Clears the accumulated state of every context. Called before every
    /// top-level entry, and required after a caught panic before the host
    /// may be reused.
    pub fn init_state(&mut self) {
        self.clear_context_state_stacks();
        self.big_int.init_state();
        self.output.init_state();
        self.runtime.init_state();
    }

    /// Empties every context state stack.
    pub fn clear_context_state_stacks(&mut self) {
        self.big_int.clear_state_stack();
        self.output.clear_state_stack();
        self.runtime.clear_state_stack();
        self.storage.clear_state_stack();
    }

    /// Tears down the active instance and the suspended stack.
    pub fn clean(&mut self) {
        self.runtime.clear_instance_stack();
        self.runtime.clean_instance();
    }

    // -------------------------------------------------------------------------
    // context accessors
    // -------------------------------------------------------------------------

    /// The runtime context.
    #[must_use]
    pub fn runtime(&self) -> &RuntimeContext {
        &self.runtime
    }

    /// The output context.
    #[must_use]
    pub fn output(&self) -> &OutputContext {
        &self.output
    }

    /// The metering context.
    #[must_use]
    pub fn metering(&self) -> &MeteringContext {
        &self.metering
    }

    /// The blockchain context.
    #[must_use]
    pub fn blockchain(&self) -> &BlockchainContext {
        &self.blockchain
    }

    /// The storage context.
    #[must_use]
    pub fn storage(&self) -> &StorageContext {
        &self.storage
    }

    /// The big-int context.
    #[must_use]
    pub fn big_int(&self) -> &BigIntContext {
        &self.big_int
    }

    /// Number of snapshots on each context state stack, for the
    /// stack-balance law.
    #[must_use]
    pub fn state_stack_lengths(&self) -> [usize; 4] {
        [
            self.runtime.state_stack_len(),
            self.output.state_stack_len(),
            self.storage.state_stack_len(),
            self.big_int.state_stack_len(),
        ]
    }

    // -------------------------------------------------------------------------
    // fault routing
    // -------------------------------------------------------------------------

    /// Routes an EI-internal failure: drains the remaining gas and marks
    /// the execution failed so the engine stops at the next tick. The EI
    /// function then returns its sentinel value to the contract.
    pub(crate) fn fault(&mut self, err: &ExecutionError) {
        let gas_left = self.metering.gas_left(&self.runtime);
        self.metering.use_gas(&self.runtime, gas_left);
        self.runtime.fail_execution(Some(err), &mut self.output);
    }
}
