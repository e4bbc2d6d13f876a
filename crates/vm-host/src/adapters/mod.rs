//! # Adapters
//!
//! In-memory implementations of the host's ports: the registry-backed mock
//! engine, the map-backed blockchain world and the default crypto hook.
//! Production deployments swap these for a real WASM engine and the node's
//! IPC-backed hooks.

pub mod crypto;
pub mod mock_engine;
pub mod world;

pub use crypto::DefaultCryptoHook;
pub use mock_engine::{check_breakpoint, MockEngine, MockInstance, MockModule};
pub use world::{BlockInfo, InMemoryWorld, WorldAccount};
