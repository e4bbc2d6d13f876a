//! # VM Common: Shared Data Model
//!
//! Types shared between the WASM smart-contract host and the node that
//! embeds it: fixed-width value objects, call inputs, the staged execution
//! output, return codes, async-call bookkeeping and the hook interfaces
//! through which the host reads authoritative chain state.
//!
//! The host itself lives in the `vm-host` crate; this crate carries no
//! execution logic.

// Crate-level lints
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod async_call;
pub mod hooks;
pub mod input;
pub mod output;
pub mod return_code;
pub mod value_objects;

pub use async_call::{AsyncCallInfo, AsyncContext, AsyncContextInfo, AsyncGeneratedCall};
pub use hooks::{BlockchainHook, CryptoHook, HookError, UserAccount};
pub use input::{CallType, ContractCallInput, ContractCreateInput, VMInput};
pub use output::{LogEntry, OutputAccount, StorageUpdate, VMOutput};
pub use return_code::ReturnCode;
pub use value_objects::{
    pad_bytes_left, Address, Hash, ADDRESS_LEN, BALANCE_LEN, HASH_LEN,
};
