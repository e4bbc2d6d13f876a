//! # Error Types
//!
//! All error types for the execution host. EI functions never panic across
//! the engine boundary: every failure is converted into an
//! [`ExecutionError`] and routed through the host's fault handling, which
//! drains gas and raises the `ExecutionFailed` breakpoint when the failure
//! must abort the contract.

use thiserror::Error;
use vm_common::HookError;

// =============================================================================
// ENGINE ERRORS
// =============================================================================

/// Errors raised by the WASM engine or by instance lifecycle management.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// The module failed compilation or validation.
    #[error("invalid contract code")]
    InvalidBytecode,

    /// Compilation succeeded but instantiation failed.
    #[error("could not create instance")]
    FailedInstantiation,

    /// The engine could not cache the host import table.
    #[error("could not cache imports")]
    FailedCacheImports,

    /// The module declares no linear memory.
    #[error("contract has no memory declared")]
    MemoryDeclarationMissing,

    /// Linear memory could not grow by the requested pages.
    #[error("memory grow failed")]
    MemoryGrow,

    /// The contract trapped during execution.
    #[error("execution trap: {0}")]
    Trap(String),

    /// The engine stopped at a runtime breakpoint.
    #[error("execution interrupted by breakpoint")]
    Interrupted,
}

// =============================================================================
// HOST SETUP ERRORS
// =============================================================================

/// Errors raised while constructing a host.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HostSetupError {
    /// The reserved storage key prefix must be non-empty.
    #[error("reserved key prefix cannot be empty")]
    EmptyReservedKeyPrefix,

    /// The gas schedule failed validation.
    #[error(transparent)]
    GasSchedule(#[from] crate::gas::GasScheduleError),
}

// =============================================================================
// EXECUTION ERRORS
// =============================================================================

/// Errors that can occur while servicing a contract execution.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExecutionError {
    // --- input errors ---
    /// The queried account does not exist.
    #[error("account does not exist")]
    InvalidAccount,

    /// No code is deployed at the call recipient.
    #[error("contract not found")]
    ContractNotFound,

    /// An upgrade call carried fewer than two arguments.
    #[error("invalid arguments to upgrade")]
    InvalidUpgradeArguments,

    /// An argument index was outside the argument list.
    #[error("argument index out of range")]
    ArgIndexOutOfRange,

    /// An argument did not fit the requested integer width.
    #[error("argument out of range")]
    ArgOutOfRange,

    /// The requested function is not exported by the contract.
    #[error("function not found")]
    FuncNotFound,

    /// The function name collides with a reserved API name.
    #[error("function is reserved")]
    FunctionReserved,

    // --- memory errors ---
    /// A load was attempted outside the addressable memory.
    #[error("mem load: bad bounds")]
    BadBounds,

    /// A store was attempted at a negative offset.
    #[error("mem store: bad lower bounds")]
    BadLowerBounds,

    /// A store overshot memory by more than one page.
    #[error("mem store: bad upper bounds")]
    BadUpperBounds,

    /// A negative length was requested.
    #[error("negative length")]
    NegativeLength,

    // --- engine errors ---
    /// Instance creation would exceed the configured instance cap.
    #[error("max instances reached")]
    MaxInstancesReached,

    /// No instance is active on the runtime.
    #[error("no instance active")]
    NoInstanceActive,

    /// An engine-level failure.
    #[error(transparent)]
    Engine(#[from] EngineError),

    // --- policy errors ---
    /// A contract tried to write a protocol-reserved storage key.
    #[error("cannot write to storage under reserved key")]
    StoreReservedKey,

    /// The referenced async context was never registered.
    #[error("async context does not exist")]
    AsyncContextDoesNotExist,

    /// A transfer exceeded the sender's projected balance.
    #[error("insufficient funds for transfer")]
    TransferInsufficientFunds,

    /// A negative value transfer was requested.
    #[error("negative value transfer")]
    TransferValueNegative,

    /// A deploy targeted an address that already holds an account.
    #[error("account collision on deploy")]
    AccountCollision,

    // --- terminal breakpoint conditions ---
    /// The gas budget ran out.
    #[error("not enough gas")]
    NotEnoughGas,

    /// The contract signalled an error; the output context carries the
    /// authoritative return code and message.
    #[error("error signalled by smartcontract")]
    SignalError,

    /// An EI call failed irrecoverably; the output context carries the
    /// authoritative return message.
    #[error("execution failed")]
    ExecutionFailed,

    // --- hook / runtime ---
    /// A blockchain hook call failed.
    #[error(transparent)]
    Hook(#[from] HookError),

    /// A panic was caught at the top-level dispatcher.
    #[error("execution panicked: {0}")]
    ExecutionPanicked(String),

    /// Unstructured execution failure.
    #[error("{0}")]
    Other(String),
}

impl ExecutionError {
    /// Returns true for memory access failures, which always abort the
    /// contract when routed through fault handling.
    #[must_use]
    pub fn is_memory_error(&self) -> bool {
        matches!(
            self,
            Self::BadBounds | Self::BadLowerBounds | Self::BadUpperBounds | Self::NegativeLength
        )
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(ExecutionError::BadBounds.to_string(), "mem load: bad bounds");
        assert_eq!(
            ExecutionError::StoreReservedKey.to_string(),
            "cannot write to storage under reserved key"
        );
        assert_eq!(
            ExecutionError::Engine(EngineError::InvalidBytecode).to_string(),
            "invalid contract code"
        );
    }

    #[test]
    fn test_is_memory_error() {
        assert!(ExecutionError::BadBounds.is_memory_error());
        assert!(ExecutionError::NegativeLength.is_memory_error());
        assert!(!ExecutionError::FuncNotFound.is_memory_error());
    }

    #[test]
    fn test_engine_error_conversion() {
        let err: ExecutionError = EngineError::Trap("div by zero".to_string()).into();
        assert!(matches!(err, ExecutionError::Engine(EngineError::Trap(_))));
    }
}
