//! # Engine Port
//!
//! The interface the host expects from a WASM engine. The engine compiles
//! bytecode into metered instances; the host drives exported functions and
//! reaches back into instance memory from EI calls. Compilation, opcode
//! execution and metering ticks are entirely the engine's concern.

use crate::api::EnvironmentApi;
use crate::errors::EngineError;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

/// Size in bytes of one WASM linear-memory page.
pub const WASM_PAGE_SIZE: u32 = 65_536;

// =============================================================================
// BREAKPOINTS
// =============================================================================

/// A host-set interrupt consulted by the engine at metering ticks.
///
/// The raw `u64` representation is what crosses the engine boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[repr(u64)]
pub enum BreakpointValue {
    /// No interrupt requested.
    #[default]
    None = 0,
    /// Abort: an EI call failed irrecoverably.
    ExecutionFailed = 1,
    /// Yield: the contract registered an async call.
    AsyncCall = 2,
    /// Abort: the contract signalled a user error.
    SignalError = 3,
    /// Abort: the gas budget is exhausted.
    OutOfGas = 4,
}

impl From<u64> for BreakpointValue {
    fn from(value: u64) -> Self {
        match value {
            1 => Self::ExecutionFailed,
            2 => Self::AsyncCall,
            3 => Self::SignalError,
            4 => Self::OutOfGas,
            _ => Self::None,
        }
    }
}

// =============================================================================
// COMPILATION OPTIONS
// =============================================================================

/// Options passed to the engine when compiling a contract.
#[derive(Clone, Debug)]
pub struct CompilationOptions {
    /// Gas available to the new instance.
    pub gas_limit: u64,
    /// Whether the engine must inject metering instrumentation.
    pub metering: bool,
    /// Whether the engine must poll the runtime breakpoint slot.
    pub runtime_breakpoints: bool,
    /// Whether the engine should trace executed opcodes.
    pub opcode_trace: bool,
}

impl CompilationOptions {
    /// The options the host uses for every contract instance.
    #[must_use]
    pub fn metered(gas_limit: u64) -> Self {
        Self {
            gas_limit,
            metering: true,
            runtime_breakpoints: true,
            opcode_trace: false,
        }
    }
}

// =============================================================================
// INSTANCE
// =============================================================================

/// An exported contract function, invoked with the host's EI surface.
pub type ContractCallback = Rc<dyn Fn(&mut dyn EnvironmentApi) -> Result<(), EngineError>>;

/// A compiled, instantiated contract with its own linear memory, gas
/// counter and breakpoint slot.
pub trait Instance {
    /// Looks up an exported function by name.
    fn get_export(&self, name: &str) -> Option<ContractCallback>;

    /// Whether an export with this name exists.
    fn has_export(&self, name: &str) -> bool {
        self.get_export(name).is_some()
    }

    /// Names of all exported functions.
    fn exported_function_names(&self) -> Vec<String>;

    /// Whether the module declares a linear memory.
    fn has_memory(&self) -> bool;

    /// Current length of the linear memory in bytes.
    fn memory_len(&self) -> u32;

    /// A view over the linear memory.
    fn memory(&self) -> &[u8];

    /// A mutable view over the linear memory.
    fn memory_mut(&mut self) -> &mut [u8];

    /// Grows the linear memory by `pages` pages.
    fn memory_grow(&mut self, pages: u32) -> Result<(), EngineError>;

    /// Gas points consumed so far by this instance.
    fn get_points_used(&self) -> u64;

    /// Overwrites the consumed gas points.
    fn set_points_used(&mut self, points: u64);

    /// Reads the raw breakpoint slot.
    fn get_breakpoint_value(&self) -> u64;

    /// Writes the raw breakpoint slot.
    fn set_breakpoint_value(&mut self, value: u64);

    /// Deterministic teardown. Idempotent.
    fn clean(&mut self);
}

/// Shared handle to the active instance. EI functions reach the linear
/// memory through this handle while the host drives an exported function
/// of the same instance.
pub type InstanceHandle = Rc<RefCell<Box<dyn Instance>>>;

// =============================================================================
// ENGINE
// =============================================================================

/// The WASM engine the host drives.
pub trait Engine {
    /// Compiles and instantiates a contract module.
    fn compile(
        &self,
        code: &[u8],
        options: &CompilationOptions,
    ) -> Result<Box<dyn Instance>, EngineError>;

    /// Installs the process-wide opcode cost table. Read-only after host
    /// initialization.
    fn set_opcode_costs(&self, costs: &BTreeMap<String, u64>);
}

// =============================================================================
// TESTS
// =============================================================================
