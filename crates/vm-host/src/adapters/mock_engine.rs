//! # Mock Engine
//!
//! An in-process engine for tests: contracts are registered as modules of
//! Rust callbacks keyed by their "bytecode", and instances carry a real
//! linear memory plus the points and breakpoint slots the host expects.
//! Opcode-level metering is the real engine's concern and is not emulated;
//! EI-level charging exercises the metering paths.

use crate::api::EnvironmentApi;
use crate::errors::EngineError;
use crate::ports::engine::{
    CompilationOptions, ContractCallback, Engine, Instance, WASM_PAGE_SIZE,
};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

// =============================================================================
// MOCK MODULE
// =============================================================================

/// A contract registered with the mock engine: named exports, the memory
/// declaration and the data segments copied into memory at instantiation.
#[derive(Clone, Default)]
pub struct MockModule {
    exports: BTreeMap<String, ContractCallback>,
    data_segments: Vec<(u32, Vec<u8>)>,
    initial_pages: u32,
    has_memory: bool,
}

impl MockModule {
    /// A module declaring `initial_pages` pages of linear memory.
    #[must_use]
    pub fn new(initial_pages: u32) -> Self {
        Self {
            exports: BTreeMap::new(),
            data_segments: Vec::new(),
            initial_pages,
            has_memory: true,
        }
    }

    /// A module without a memory declaration, for verification tests.
    #[must_use]
    pub fn without_memory() -> Self {
        Self {
            exports: BTreeMap::new(),
            data_segments: Vec::new(),
            initial_pages: 0,
            has_memory: false,
        }
    }

    /// Registers an exported function.
    pub fn export(
        &mut self,
        name: &str,
        function: impl Fn(&mut dyn EnvironmentApi) -> Result<(), EngineError> + 'static,
    ) {
        self.exports.insert(name.to_string(), Rc::new(function));
    }

    /// Declares a data segment placed at `offset` when the module is
    /// instantiated.
    pub fn data(&mut self, offset: u32, bytes: &[u8]) {
        self.data_segments.push((offset, bytes.to_vec()));
    }
}

/// Convenience for cooperative contracts: returns `Interrupted` when the
/// host has set a breakpoint, mirroring the metering-tick check a real
/// engine performs between opcodes.
pub fn check_breakpoint(host: &dyn EnvironmentApi) -> Result<(), EngineError> {
    if host.current_breakpoint() != 0 {
        return Err(EngineError::Interrupted);
    }
    Ok(())
}

// =============================================================================
// MOCK INSTANCE
// =============================================================================

/// One instantiation of a mock module.
pub struct MockInstance {
    module: MockModule,
    memory: Vec<u8>,
    points_used: u64,
    breakpoint: u64,
}

impl MockInstance {
    fn new(module: MockModule) -> Self {
        let mut memory = vec![0u8; (module.initial_pages * WASM_PAGE_SIZE) as usize];
        for (offset, bytes) in &module.data_segments {
            let start = *offset as usize;
            let end = start + bytes.len();
            if end <= memory.len() {
                memory[start..end].copy_from_slice(bytes);
            }
        }
        Self {
            module,
            memory,
            points_used: 0,
            breakpoint: 0,
        }
    }
}

impl Instance for MockInstance {
    fn get_export(&self, name: &str) -> Option<ContractCallback> {
        self.module.exports.get(name).map(Rc::clone)
    }

    fn exported_function_names(&self) -> Vec<String> {
        self.module.exports.keys().cloned().collect()
    }

    fn has_memory(&self) -> bool {
        self.module.has_memory
    }

    fn memory_len(&self) -> u32 {
        self.memory.len() as u32
    }

    fn memory(&self) -> &[u8] {
        &self.memory
    }

    fn memory_mut(&mut self) -> &mut [u8] {
        &mut self.memory
    }

    fn memory_grow(&mut self, pages: u32) -> Result<(), EngineError> {
        let grown = (pages * WASM_PAGE_SIZE) as usize;
        self.memory.resize(self.memory.len() + grown, 0);
        Ok(())
    }

    fn get_points_used(&self) -> u64 {
        self.points_used
    }

    fn set_points_used(&mut self, points: u64) {
        self.points_used = points;
    }

    fn get_breakpoint_value(&self) -> u64 {
        self.breakpoint
    }

    fn set_breakpoint_value(&mut self, value: u64) {
        self.breakpoint = value;
    }

    fn clean(&mut self) {
        self.memory.clear();
        self.module.exports.clear();
    }
}

// =============================================================================
// MOCK ENGINE
// =============================================================================

/// The registry-backed engine used by the test suites.
#[derive(Default)]
pub struct MockEngine {
    modules: RefCell<HashMap<Vec<u8>, MockModule>>,
    opcode_costs: RefCell<BTreeMap<String, u64>>,
}

impl MockEngine {
    /// Creates an engine with no registered contracts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `module` under the given bytecode.
    pub fn register_contract(&self, code: &[u8], module: MockModule) {
        self.modules.borrow_mut().insert(code.to_vec(), module);
    }

    /// The installed opcode cost table.
    #[must_use]
    pub fn opcode_costs(&self) -> BTreeMap<String, u64> {
        self.opcode_costs.borrow().clone()
    }
}

impl Engine for MockEngine {
    fn compile(
        &self,
        code: &[u8],
        _options: &CompilationOptions,
    ) -> Result<Box<dyn Instance>, EngineError> {
        let module = self
            .modules
            .borrow()
            .get(code)
            .cloned()
            .ok_or(EngineError::InvalidBytecode)?;
        Ok(Box::new(MockInstance::new(module)))
    }

    fn set_opcode_costs(&self, costs: &BTreeMap<String, u64>) {
        *self.opcode_costs.borrow_mut() = costs.clone();
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unregistered_code_is_invalid_bytecode() {
        let engine = MockEngine::new();
        match engine.compile(b"nope", &CompilationOptions::metered(100)) {
            Err(err) => assert_eq!(err, EngineError::InvalidBytecode),
            Ok(_) => panic!("expected compile to fail"),
        }
    }

    #[test]
    fn test_instance_memory_pages() {
        let engine = MockEngine::new();
        engine.register_contract(b"c", MockModule::new(2));

        let instance = engine
            .compile(b"c", &CompilationOptions::metered(100))
            .unwrap();
        assert_eq!(instance.memory_len(), 2 * WASM_PAGE_SIZE);
        assert!(instance.has_memory());
    }

    #[test]
    fn test_memory_grow() {
        let engine = MockEngine::new();
        engine.register_contract(b"c", MockModule::new(1));

        let mut instance = engine
            .compile(b"c", &CompilationOptions::metered(100))
            .unwrap();
        instance.memory_grow(1).unwrap();
        assert_eq!(instance.memory_len(), 2 * WASM_PAGE_SIZE);
    }

    #[test]
    fn test_points_and_breakpoint_slots() {
        let engine = MockEngine::new();
        engine.register_contract(b"c", MockModule::new(1));

        let mut instance = engine
            .compile(b"c", &CompilationOptions::metered(100))
            .unwrap();
        instance.set_points_used(42);
        assert_eq!(instance.get_points_used(), 42);
        instance.set_breakpoint_value(4);
        assert_eq!(instance.get_breakpoint_value(), 4);
    }

    #[test]
    fn test_clean_drops_exports_and_memory() {
        let engine = MockEngine::new();
        let mut module = MockModule::new(1);
        module.export("init", |_| Ok(()));
        engine.register_contract(b"c", module);

        let mut instance = engine
            .compile(b"c", &CompilationOptions::metered(100))
            .unwrap();
        assert!(instance.has_export("init"));
        instance.clean();
        assert!(!instance.has_export("init"));
        assert_eq!(instance.memory_len(), 0);
    }
}
