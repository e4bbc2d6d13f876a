//! # Return Codes
//!
//! The terminal status of a VM execution, surfaced to the node through
//! [`VMOutput`](crate::output::VMOutput).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of a top-level contract execution.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u32)]
pub enum ReturnCode {
    /// Execution completed successfully.
    #[default]
    Ok = 0,
    /// The requested function is not exported by the contract.
    FunctionNotFound = 1,
    /// The requested function has an unexpected signature.
    FunctionWrongSignature = 2,
    /// No contract code is deployed at the recipient address.
    ContractNotFound = 3,
    /// The contract signalled an error.
    UserError = 4,
    /// Gas was exhausted during execution.
    OutOfGas = 5,
    /// A deploy targeted an address that already holds an account.
    AccountCollision = 6,
    /// A transfer exceeded the sender's available balance.
    OutOfFunds = 7,
    /// Nested execution exceeded the allowed depth.
    CallStackOverFlow = 8,
    /// The deployed code failed validation.
    ContractInvalid = 9,
    /// Execution failed for an internal reason.
    ExecutionFailed = 10,
}

impl fmt::Display for ReturnCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            ReturnCode::Ok => "ok",
            ReturnCode::FunctionNotFound => "function not found",
            ReturnCode::FunctionWrongSignature => "wrong signature for function",
            ReturnCode::ContractNotFound => "contract not found",
            ReturnCode::UserError => "user error",
            ReturnCode::OutOfGas => "out of gas",
            ReturnCode::AccountCollision => "account collision",
            ReturnCode::OutOfFunds => "out of funds",
            ReturnCode::CallStackOverFlow => "call stack overflow",
            ReturnCode::ContractInvalid => "contract invalid",
            ReturnCode::ExecutionFailed => "execution failed",
        };
        write!(f, "{message}")
    }
}
