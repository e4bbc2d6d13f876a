//! # Gas Model
//!
//! The structured cost tables that parameterize metering: per-byte base
//! operation costs, flat per-EI-function costs and the WASM opcode table
//! the engine consumes.

mod schedule;

pub use schedule::{
    ApiCost, BaseOperationCost, BigIntApiCost, CryptoApiCost, GasSchedule, GasScheduleError,
};
