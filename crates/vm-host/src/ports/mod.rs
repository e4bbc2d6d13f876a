//! # Ports
//!
//! The interfaces through which the host talks to the outside world: the
//! WASM engine it drives (outbound) and the entry points the node calls
//! (inbound). The blockchain and crypto hooks live in `vm-common` because
//! their types are part of the shared data model.

pub mod engine;
pub mod inbound;

pub use engine::{
    BreakpointValue, CompilationOptions, ContractCallback, Engine, Instance, InstanceHandle,
    WASM_PAGE_SIZE,
};
pub use inbound::VmExecutor;
