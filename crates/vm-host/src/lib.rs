//! # VM Host: Metered WASM Smart-Contract Execution
//!
//! Runs user-supplied WebAssembly bytecode on behalf of a blockchain node.
//! The host receives deploy/call/upgrade inputs, instantiates a metered
//! WASM instance through the engine port, exposes the environment
//! interface (EI) of host functions the contract may import, and returns a
//! structured output describing gas consumption, storage mutations,
//! balance transfers, logs and return data.
//!
//! ## Architecture
//!
//! | Component | Location | Purpose |
//! |-----------|----------|---------|
//! | Contexts | `contexts/` | The six pieces of mutable execution state |
//! | EI surface | `api/` | Host functions bridging WASM memory to contexts |
//! | Dispatcher | `host/` | Entry points, nested execution, output assembly |
//! | Engine port | `ports/engine` | The WASM engine interface the host drives |
//! | Gas model | `gas/` | Cost tables and load-time validation |
//! | Adapters | `adapters/` | In-memory engine, world and crypto for tests |
//! | IPC framing | `ipc/` | Header codec for out-of-process hooks |
//!
//! ## Usage Example
//!
//! ```ignore
//! use vm_host::prelude::*;
//!
//! let mut host = VmHost::new(engine, world, crypto, parameters)?;
//! let output = host.run_smart_contract_call(call_input)?;
//! if output.return_code == ReturnCode::Ok {
//!     println!("gas remaining: {}", output.gas_remaining);
//! }
//! ```

// Crate-level lints
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::missing_errors_doc)]

// =============================================================================
// MODULES
// =============================================================================

pub mod adapters;
pub mod api;
pub mod contexts;
pub mod errors;
pub mod gas;
pub mod host;
pub mod ipc;
pub mod ports;

// =============================================================================
// PROTOCOL CONSTANTS
// =============================================================================

/// The function a contract exports as its deploy-time constructor.
pub const INIT_FUNCTION_NAME: &str = "init";

/// Fallback entry point, also the Ethereum-style constructor name.
pub const MAIN_FUNCTION_NAME: &str = "main";

/// The upgrade entry point. Calls to this name take the upgrade path, and
/// contracts may not export it.
pub const UPGRADE_FUNCTION_NAME: &str = "upgrade";

/// The export invoked when a completed async call resumes its caller.
pub const CALLBACK_FUNCTION_NAME: &str = "callBack";

/// Prefix deriving the storage key that holds a key's time lock.
pub const TIME_LOCK_KEY_PREFIX: &[u8] = b"TimeLock\x00";

// =============================================================================
// PRELUDE
// =============================================================================

/// Convenient re-exports for common usage.
pub mod prelude {
    pub use crate::adapters::{
        check_breakpoint, DefaultCryptoHook, InMemoryWorld, MockEngine, MockModule, WorldAccount,
    };
    pub use crate::api::{BaseOpsApi, BigIntApi, CryptoApi, EnvironmentApi};
    pub use crate::contexts::StorageStatus;
    pub use crate::errors::{EngineError, ExecutionError, HostSetupError};
    pub use crate::gas::GasSchedule;
    pub use crate::host::{VmHost, VmHostParameters, DEFAULT_MAX_INSTANCE_COUNT};
    pub use crate::ports::engine::{BreakpointValue, Engine, Instance, WASM_PAGE_SIZE};
    pub use crate::ports::inbound::VmExecutor;
    pub use vm_common::{
        Address, ContractCallInput, ContractCreateInput, ReturnCode, VMInput, VMOutput,
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_constants() {
        assert_eq!(UPGRADE_FUNCTION_NAME, "upgrade");
        assert_eq!(INIT_FUNCTION_NAME, "init");
        assert!(TIME_LOCK_KEY_PREFIX.ends_with(&[0]));
    }
}
