//! # Async Call Bookkeeping
//!
//! A contract may register outbound calls that the host defers past the end
//! of the current execution. The pending call captured by `async_call` and
//! the grouped calls registered under named async contexts both live here.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The single pending async call set by the `async_call` EI function and
/// consumed when the `AsyncCall` breakpoint fires.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AsyncCallInfo {
    /// Destination contract address (raw 32 bytes as loaded from memory).
    pub destination: Vec<u8>,
    /// Serialized call data (function plus arguments).
    pub data: Vec<u8>,
    /// Gas forwarded to the deferred call.
    pub gas_limit: u64,
    /// Transferred value, big-endian bytes.
    pub value_bytes: Vec<u8>,
}

/// One call registered inside a named async context via `create_async_call`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AsyncGeneratedCall {
    /// Destination contract address.
    pub destination: Vec<u8>,
    /// Serialized call data.
    pub data: Vec<u8>,
    /// Transferred value, big-endian bytes.
    pub value_bytes: Vec<u8>,
    /// Callback invoked when the call succeeds.
    pub success_callback: String,
    /// Callback invoked when the call fails.
    pub error_callback: String,
    /// Gas the contract dedicated to this call.
    pub provided_gas: u64,
}

/// A named group of generated calls sharing one completion callback.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AsyncContext {
    /// Callback invoked when the whole context completes.
    pub callback: String,
    /// Ordered calls registered under this context.
    pub async_calls: Vec<AsyncGeneratedCall>,
}

/// All async contexts registered during one execution.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AsyncContextInfo {
    /// The caller that opened this execution.
    pub caller_addr: Vec<u8>,
    /// Contexts keyed by their contract-chosen identifier.
    pub async_context_map: BTreeMap<Vec<u8>, AsyncContext>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_async_context_map_is_ordered() {
        let mut info = AsyncContextInfo::default();
        info.async_context_map
            .insert(b"b".to_vec(), AsyncContext::default());
        info.async_context_map
            .insert(b"a".to_vec(), AsyncContext::default());

        let keys: Vec<_> = info.async_context_map.keys().cloned().collect();
        assert_eq!(keys, vec![b"a".to_vec(), b"b".to_vec()]);
    }
}
