//! # Execution Contexts
//!
//! The six pieces of mutable execution state: runtime, output, storage,
//! blockchain, metering and big-int. Each context owns only its own data;
//! operations that span contexts receive their collaborators explicitly,
//! so no context holds a back-reference to the host.

pub mod bigint;
pub mod blockchain;
pub mod metering;
pub mod output;
pub mod reserved;
pub mod runtime;
pub mod storage;

pub use bigint::BigIntContext;
pub use blockchain::BlockchainContext;
pub use metering::MeteringContext;
pub use output::{CodeDeployInput, OutputContext};
pub use reserved::ReservedFunctions;
pub use runtime::RuntimeContext;
pub use storage::{StorageContext, StorageStatus};
