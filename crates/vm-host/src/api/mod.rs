//! # Environment Interface (EI)
//!
//! The host functions a contract may import, bridging WASM linear-memory
//! arguments to context operations. Every function follows the same
//! discipline: load memory arguments, charge the scheduled cost, perform
//! the semantic operation, write results back. Failures route through the
//! host's fault handling and surface as sentinel return values; nothing
//! here ever panics across the engine boundary.

mod baseops;
mod big_int;
mod crypto;

pub use baseops::BaseOpsApi;
pub use big_int::BigIntApi;
pub use crypto::CryptoApi;

use std::collections::BTreeSet;

/// The complete EI surface a contract executes against.
pub trait EnvironmentApi: BaseOpsApi + BigIntApi + CryptoApi {}

impl<T: BaseOpsApi + BigIntApi + CryptoApi> EnvironmentApi for T {}

/// The import names of every EI function, as contracts declare them.
/// Contract-code verification rejects exports colliding with these.
#[must_use]
pub fn api_function_names() -> BTreeSet<String> {
    const NAMES: &[&str] = &[
        // main
        "getSCAddress",
        "getOwnerAddress",
        "getShardOfAddress",
        "isSmartContract",
        "getExternalBalance",
        "getBlockHash",
        "transferValue",
        "asyncCall",
        "createAsyncCall",
        "setAsyncContextCallback",
        "getArgumentLength",
        "getArgument",
        "getFunction",
        "getNumArguments",
        "storageStore",
        "storageLoadLength",
        "storageLoad",
        "getStorageLock",
        "setStorageLock",
        "isStorageLocked",
        "clearStorageLock",
        "getCaller",
        "getCallValue",
        "writeLog",
        "finish",
        "signalError",
        "getBlockTimestamp",
        "getBlockNonce",
        "getBlockRound",
        "getBlockEpoch",
        "getBlockRandomSeed",
        "getStateRootHash",
        "getPrevBlockTimestamp",
        "getPrevBlockNonce",
        "getPrevBlockRound",
        "getPrevBlockEpoch",
        "getPrevBlockRandomSeed",
        "getOriginalTxHash",
        "getGasLeft",
        "executeOnDestContext",
        "executeOnSameContext",
        "delegateExecution",
        "executeReadOnly",
        "createContract",
        "getNumReturnData",
        "getReturnDataSize",
        "getReturnData",
        "int64getArgument",
        "int64storageStore",
        "int64storageLoad",
        "int64finish",
        // big-int
        "bigIntNew",
        "bigIntByteLength",
        "bigIntGetBytes",
        "bigIntSetBytes",
        "bigIntGetSignedBytes",
        "bigIntSetSignedBytes",
        "bigIntIsInt64",
        "bigIntGetInt64",
        "bigIntSetInt64",
        "bigIntAdd",
        "bigIntSub",
        "bigIntMul",
        "bigIntCmp",
        "bigIntSign",
        "bigIntFinish",
        "bigIntStorageStore",
        "bigIntStorageLoad",
        "bigIntGetArgument",
        "bigIntGetCallValue",
        "bigIntGetExternalBalance",
        // crypto
        "sha256",
        "keccak256",
    ];

    NAMES.iter().map(|name| (*name).to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_names_contain_each_family() {
        let names = api_function_names();
        assert!(names.contains("storageStore"));
        assert!(names.contains("bigIntAdd"));
        assert!(names.contains("keccak256"));
        assert!(names.contains("asyncCall"));
    }

    #[test]
    fn test_api_names_have_no_duplicates() {
        // A BTreeSet would silently drop duplicates; make sure the
        // catalogue stays duplicate-free.
        let names = api_function_names();
        assert_eq!(names.len(), 73);
    }
}
