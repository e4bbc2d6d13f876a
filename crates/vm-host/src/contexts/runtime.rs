//! # Runtime Context
//!
//! Owns the active WASM instance and the call-scoped execution state: the
//! VM input, the contract address, the function under execution, the
//! read-only flag and the async bookkeeping. Nested calls push the state
//! onto a snapshot stack and the instance onto a separate instance stack;
//! the two are managed independently because a same-context call swaps the
//! instance without swapping the output.

use crate::contexts::output::OutputContext;
use crate::contexts::reserved::ReservedFunctions;
use crate::errors::{EngineError, ExecutionError};
use crate::ports::engine::{
    BreakpointValue, CompilationOptions, ContractCallback, Engine, InstanceHandle,
};
use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;
use vm_common::{
    Address, AsyncCallInfo, AsyncContext, AsyncContextInfo, AsyncGeneratedCall,
    ContractCallInput, ContractCreateInput, ReturnCode, VMInput,
};

/// The snapshottable part of the runtime state.
#[derive(Clone, Debug, Default)]
struct RuntimeState {
    vm_input: VMInput,
    sc_address: Address,
    call_function: String,
    read_only: bool,
    async_call_info: Option<AsyncCallInfo>,
    async_context_info: AsyncContextInfo,
}

/// The runtime context: active instance, call state and the two stacks.
pub struct RuntimeContext {
    engine: Rc<dyn Engine>,
    instance: Option<InstanceHandle>,
    vm_input: VMInput,
    sc_address: Address,
    call_function: String,
    vm_type: Vec<u8>,
    read_only: bool,
    async_call_info: Option<AsyncCallInfo>,
    async_context_info: AsyncContextInfo,
    state_stack: Vec<RuntimeState>,
    instance_stack: Vec<InstanceHandle>,
    max_instance_count: u64,
    reserved_functions: ReservedFunctions,
}

impl RuntimeContext {
    /// Creates a runtime context for `vm_type`, with the reserved export
    /// names derived from the EI namespace and the protocol builtins.
    #[must_use]
    pub fn new(
        engine: Rc<dyn Engine>,
        vm_type: Vec<u8>,
        sc_api_names: BTreeSet<String>,
        protocol_builtin_functions: BTreeSet<String>,
    ) -> Self {
        let mut context = Self {
            engine,
            instance: None,
            vm_input: VMInput::default(),
            sc_address: Address::ZERO,
            call_function: String::new(),
            vm_type,
            read_only: false,
            async_call_info: None,
            async_context_info: AsyncContextInfo::default(),
            state_stack: Vec::new(),
            instance_stack: Vec::new(),
            max_instance_count: 0,
            reserved_functions: ReservedFunctions::new(
                sc_api_names,
                protocol_builtin_functions,
            ),
        };
        context.init_state();
        context
    }

    /// Clears the call-scoped state. Called before every top-level
    /// execution.
    pub fn init_state(&mut self) {
        self.vm_input = VMInput::default();
        self.sc_address = Address::ZERO;
        self.call_function.clear();
        self.read_only = false;
        self.async_call_info = None;
        self.async_context_info = AsyncContextInfo::default();
    }

    /// Initializes the call state from a contract call input.
    pub fn init_state_from_call_input(&mut self, input: &ContractCallInput) {
        self.vm_input = input.vm_input.clone();
        self.sc_address = input.recipient_addr;
        self.call_function.clone_from(&input.function);
        // Reset the async map for the new call frame.
        self.async_context_info = AsyncContextInfo {
            caller_addr: input.vm_input.caller_addr.to_vec(),
            async_context_map: std::collections::BTreeMap::new(),
        };
    }

    /// Initializes the call state for a deploy targeting `address`.
    pub fn init_state_from_create_input(
        &mut self,
        input: &ContractCreateInput,
        address: Address,
    ) {
        self.vm_input = input.vm_input.clone();
        self.sc_address = address;
        self.call_function = crate::INIT_FUNCTION_NAME.to_string();
        self.async_context_info = AsyncContextInfo {
            caller_addr: input.vm_input.caller_addr.to_vec(),
            async_context_map: std::collections::BTreeMap::new(),
        };
    }

    // -------------------------------------------------------------------------
    // instance lifecycle
    // -------------------------------------------------------------------------

    /// Compiles `contract` and makes the fresh instance active. The
    /// breakpoint slot starts cleared.
    pub fn start_instance(&mut self, contract: &[u8], gas_limit: u64) -> Result<(), ExecutionError> {
        if self.instance_count() >= self.max_instance_count {
            self.instance = None;
            return Err(ExecutionError::MaxInstancesReached);
        }

        let options = CompilationOptions::metered(gas_limit);
        match self.engine.compile(contract, &options) {
            Ok(instance) => {
                self.instance = Some(Rc::new(RefCell::new(instance)));
                self.set_runtime_breakpoint(BreakpointValue::None);
                Ok(())
            }
            Err(err) => {
                self.instance = None;
                Err(ExecutionError::Engine(err))
            }
        }
    }

    /// Caps the instance stack depth.
    pub fn set_max_instance_count(&mut self, max_instances: u64) {
        self.max_instance_count = max_instances;
    }

    /// Pushes the active instance onto the instance stack. The active
    /// handle stays in place until the next `start_instance` replaces it.
    pub fn push_instance(&mut self) {
        if let Some(instance) = &self.instance {
            self.instance_stack.push(Rc::clone(instance));
        }
    }

    /// Cleans the active instance and reactivates the top of the instance
    /// stack.
    pub fn pop_instance(&mut self) {
        self.clean_instance();
        self.instance = self.instance_stack.pop();
    }

    /// Number of instances suspended on the stack.
    #[must_use]
    pub fn instance_count(&self) -> u64 {
        self.instance_stack.len() as u64
    }

    /// Cleans every suspended instance and empties the stack.
    pub fn clear_instance_stack(&mut self) {
        for instance in &self.instance_stack {
            instance.borrow_mut().clean();
        }
        self.instance_stack.clear();
    }

    /// Cleans and drops the active instance.
    pub fn clean_instance(&mut self) {
        if let Some(instance) = self.instance.take() {
            instance.borrow_mut().clean();
        }
    }

    /// Whether an instance is currently active.
    #[must_use]
    pub fn is_instance_active(&self) -> bool {
        self.instance.is_some()
    }

    fn active_instance(&self) -> Result<&InstanceHandle, ExecutionError> {
        self.instance.as_ref().ok_or(ExecutionError::NoInstanceActive)
    }

    // -------------------------------------------------------------------------
    // state stack
    // -------------------------------------------------------------------------

    /// Snapshots the call-scoped state (not the instance).
    pub fn push_state(&mut self) {
        self.state_stack.push(RuntimeState {
            vm_input: self.vm_input.clone(),
            sc_address: self.sc_address,
            call_function: self.call_function.clone(),
            read_only: self.read_only,
            async_call_info: self.async_call_info.clone(),
            async_context_info: self.async_context_info.clone(),
        });
    }

    /// Restores the most recent snapshot.
    pub fn pop_set_active_state(&mut self) {
        debug_assert!(!self.state_stack.is_empty(), "runtime state stack empty");
        if let Some(prev) = self.state_stack.pop() {
            self.vm_input = prev.vm_input;
            self.sc_address = prev.sc_address;
            self.call_function = prev.call_function;
            self.read_only = prev.read_only;
            self.async_call_info = prev.async_call_info;
            self.async_context_info = prev.async_context_info;
        }
    }

    /// Drops the most recent snapshot without restoring it.
    pub fn pop_discard(&mut self) {
        debug_assert!(!self.state_stack.is_empty(), "runtime state stack empty");
        self.state_stack.pop();
    }

    /// Empties the state stack.
    pub fn clear_state_stack(&mut self) {
        self.state_stack.clear();
    }

    /// Number of stacked state snapshots.
    #[must_use]
    pub fn state_stack_len(&self) -> usize {
        self.state_stack.len()
    }

    // -------------------------------------------------------------------------
    // call state accessors
    // -------------------------------------------------------------------------

    /// The VM type tag used for address derivation.
    #[must_use]
    pub fn vm_type(&self) -> &[u8] {
        &self.vm_type
    }

    /// The active VM input.
    #[must_use]
    pub fn vm_input(&self) -> &VMInput {
        &self.vm_input
    }

    /// Replaces the active VM input.
    pub fn set_vm_input(&mut self, vm_input: VMInput) {
        self.vm_input = vm_input;
    }

    /// The contract address under execution.
    #[must_use]
    pub fn sc_address(&self) -> &Address {
        &self.sc_address
    }

    /// Replaces the contract address under execution.
    pub fn set_sc_address(&mut self, sc_address: Address) {
        self.sc_address = sc_address;
    }

    /// Hash of the transaction being processed.
    #[must_use]
    pub fn current_tx_hash(&self) -> &[u8] {
        &self.vm_input.current_tx_hash
    }

    /// Hash of the originating transaction.
    #[must_use]
    pub fn original_tx_hash(&self) -> &[u8] {
        &self.vm_input.original_tx_hash
    }

    /// The name of the function under execution.
    #[must_use]
    pub fn function(&self) -> &str {
        &self.call_function
    }

    /// Overrides the function under execution.
    pub fn set_custom_call_function(&mut self, call_function: impl Into<String>) {
        self.call_function = call_function.into();
    }

    /// The call arguments.
    #[must_use]
    pub fn arguments(&self) -> &[Vec<u8>] {
        &self.vm_input.arguments
    }

    /// Whether state mutation is disabled.
    #[must_use]
    pub fn read_only(&self) -> bool {
        self.read_only
    }

    /// Toggles the read-only flag.
    pub fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
    }

    /// Consumes the first two arguments of an upgrade call as
    /// `(code, code_metadata)`, shifting the rest into place.
    pub fn extract_code_upgrade_from_args(&mut self) -> Result<(Vec<u8>, Vec<u8>), ExecutionError> {
        const MIN_UPGRADE_ARGUMENTS: usize = 2;

        if self.vm_input.arguments.len() < MIN_UPGRADE_ARGUMENTS {
            return Err(ExecutionError::InvalidUpgradeArguments);
        }

        let mut rest = self.vm_input.arguments.split_off(MIN_UPGRADE_ARGUMENTS);
        std::mem::swap(&mut self.vm_input.arguments, &mut rest);
        let code_metadata = rest.pop().unwrap_or_default();
        let code = rest.pop().unwrap_or_default();
        Ok((code, code_metadata))
    }

    // -------------------------------------------------------------------------
    // failure signalling
    // -------------------------------------------------------------------------

    /// Marks the execution failed: return code, message and the
    /// `ExecutionFailed` breakpoint.
    pub fn fail_execution(&self, err: Option<&ExecutionError>, output: &mut OutputContext) {
        output.set_return_code(ReturnCode::ExecutionFailed);
        let message = match err {
            Some(err) => err.to_string(),
            None => "execution failed".to_string(),
        };
        output.set_return_message(message);
        self.set_runtime_breakpoint(BreakpointValue::ExecutionFailed);
    }

    /// Records a contract-signalled error: return code, message and the
    /// `SignalError` breakpoint.
    pub fn signal_user_error(&self, message: &str, output: &mut OutputContext) {
        output.set_return_code(ReturnCode::UserError);
        output.set_return_message(message);
        self.set_runtime_breakpoint(BreakpointValue::SignalError);
    }

    /// Writes the breakpoint slot of the active instance.
    pub fn set_runtime_breakpoint(&self, value: BreakpointValue) {
        if let Some(instance) = &self.instance {
            instance.borrow_mut().set_breakpoint_value(value as u64);
        }
    }

    /// Reads the breakpoint slot of the active instance.
    #[must_use]
    pub fn get_runtime_breakpoint(&self) -> BreakpointValue {
        match &self.instance {
            Some(instance) => BreakpointValue::from(instance.borrow().get_breakpoint_value()),
            None => BreakpointValue::None,
        }
    }

    // -------------------------------------------------------------------------
    // gas points
    // -------------------------------------------------------------------------

    /// Gas points consumed by the active instance.
    #[must_use]
    pub fn get_points_used(&self) -> u64 {
        match &self.instance {
            Some(instance) => instance.borrow().get_points_used(),
            None => 0,
        }
    }

    /// Overwrites the consumed gas points of the active instance.
    pub fn set_points_used(&self, points: u64) {
        if let Some(instance) = &self.instance {
            instance.borrow_mut().set_points_used(points);
        }
    }

    // -------------------------------------------------------------------------
    // code verification and export lookup
    // -------------------------------------------------------------------------

    /// Validates the active module: it must declare a memory and must not
    /// export any reserved function name.
    pub fn verify_contract_code(&self) -> Result<(), ExecutionError> {
        let instance = self.active_instance()?;
        let instance = instance.borrow();

        if !instance.has_memory() {
            return Err(ExecutionError::Engine(EngineError::MemoryDeclarationMissing));
        }

        for name in instance.exported_function_names() {
            if self.reserved_functions.is_reserved(&name) {
                return Err(ExecutionError::FunctionReserved);
            }
        }

        Ok(())
    }

    /// Resolves the function to call: the requested export, else `main`.
    pub fn function_to_call(&self) -> Result<ContractCallback, ExecutionError> {
        let instance = self.active_instance()?;
        let instance = instance.borrow();

        if let Some(function) = instance.get_export(&self.call_function) {
            return Ok(function);
        }
        if let Some(function) = instance.get_export(crate::MAIN_FUNCTION_NAME) {
            return Ok(function);
        }

        Err(ExecutionError::FuncNotFound)
    }

    /// Looks up an arbitrary export on the active instance.
    #[must_use]
    pub fn export(&self, name: &str) -> Option<ContractCallback> {
        let instance = self.instance.as_ref()?;
        let callback = instance.borrow().get_export(name);
        callback
    }

    /// Resolves the init export, trying the native name then the
    /// Ethereum-style one. Contracts without an init are valid.
    #[must_use]
    pub fn init_function(&self) -> Option<ContractCallback> {
        let instance = self.instance.as_ref()?;
        let instance = instance.borrow();

        instance
            .get_export(crate::INIT_FUNCTION_NAME)
            .or_else(|| instance.get_export(crate::MAIN_FUNCTION_NAME))
    }

    // -------------------------------------------------------------------------
    // async bookkeeping
    // -------------------------------------------------------------------------

    /// Registers the pending async call.
    pub fn set_async_call_info(&mut self, info: AsyncCallInfo) {
        self.async_call_info = Some(info);
    }

    /// The pending async call, if any.
    #[must_use]
    pub fn async_call_info(&self) -> Option<&AsyncCallInfo> {
        self.async_call_info.as_ref()
    }

    /// Consumes the pending async call.
    pub fn take_async_call_info(&mut self) -> Option<AsyncCallInfo> {
        self.async_call_info.take()
    }

    /// Appends a generated call to the async context `identifier`,
    /// creating the context on first use.
    pub fn add_async_context_call(&mut self, identifier: &[u8], call: AsyncGeneratedCall) {
        self.async_context_info
            .async_context_map
            .entry(identifier.to_vec())
            .or_default()
            .async_calls
            .push(call);
    }

    /// The async context registered under `identifier`.
    pub fn get_async_context(&self, identifier: &[u8]) -> Result<&AsyncContext, ExecutionError> {
        self.async_context_info
            .async_context_map
            .get(identifier)
            .ok_or(ExecutionError::AsyncContextDoesNotExist)
    }

    /// Mutable access to the async context registered under `identifier`.
    pub fn get_async_context_mut(
        &mut self,
        identifier: &[u8],
    ) -> Result<&mut AsyncContext, ExecutionError> {
        self.async_context_info
            .async_context_map
            .get_mut(identifier)
            .ok_or(ExecutionError::AsyncContextDoesNotExist)
    }

    /// All async contexts registered during this call.
    #[must_use]
    pub fn async_context_info(&self) -> &AsyncContextInfo {
        &self.async_context_info
    }

    // -------------------------------------------------------------------------
    // memory access
    // -------------------------------------------------------------------------

    /// Reads `length` bytes of instance memory starting at `offset`.
    ///
    /// Reads that start inside memory but overshoot its end return the
    /// available bytes zero-padded to `length`; only the starting offset
    /// is strict.
    pub fn mem_load(&self, offset: i32, length: i32) -> Result<Vec<u8>, ExecutionError> {
        if length == 0 {
            return Ok(Vec::new());
        }

        let instance = self.active_instance()?;
        let instance = instance.borrow();
        let memory_length = instance.memory_len() as i64;

        if offset < 0 || i64::from(offset) > memory_length {
            return Err(ExecutionError::BadBounds);
        }
        if length < 0 {
            return Err(ExecutionError::NegativeLength);
        }

        let offset = offset as usize;
        let length = length as usize;
        let requested_end = offset + length;
        let memory = instance.memory();

        let mut result = vec![0u8; length];
        if requested_end > memory.len() {
            let available = &memory[offset..];
            result[..available.len()].copy_from_slice(available);
        } else {
            result.copy_from_slice(&memory[offset..requested_end]);
        }

        Ok(result)
    }

    /// Writes `data` into instance memory at `offset`, growing the memory
    /// by at most one page when the write overshoots the current end.
    pub fn mem_store(&self, offset: i32, data: &[u8]) -> Result<(), ExecutionError> {
        if data.is_empty() {
            return Ok(());
        }

        let instance = self.active_instance()?;
        let mut instance = instance.borrow_mut();

        if offset < 0 {
            return Err(ExecutionError::BadLowerBounds);
        }

        let offset = offset as usize;
        let requested_end = offset + data.len();
        if requested_end > instance.memory_len() as usize {
            instance.memory_grow(1)?;
        }
        if requested_end > instance.memory_len() as usize {
            return Err(ExecutionError::BadUpperBounds);
        }

        instance.memory_mut()[offset..requested_end].copy_from_slice(data);
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock_engine::{MockEngine, MockModule};
    use crate::ports::engine::WASM_PAGE_SIZE;

    fn new_runtime(engine: &Rc<MockEngine>) -> RuntimeContext {
        let engine: Rc<dyn Engine> = Rc::clone(engine) as Rc<dyn Engine>;
        let mut api_names = BTreeSet::new();
        api_names.insert("storageStore".to_string());
        let mut runtime = RuntimeContext::new(engine, b"type".to_vec(), api_names, BTreeSet::new());
        runtime.set_max_instance_count(1);
        runtime
    }

    fn register_counter(engine: &Rc<MockEngine>) -> Vec<u8> {
        let code = b"counter-code".to_vec();
        let mut module = MockModule::new(2);
        module.export("init", |_| Ok(()));
        module.export("increment", |_| Ok(()));
        engine.register_contract(&code, module);
        code
    }

    #[test]
    fn test_init_state_clears_call_state() {
        let engine = Rc::new(MockEngine::new());
        let mut runtime = new_runtime(&engine);

        runtime.set_sc_address(Address::left_padded(b"some address"));
        runtime.set_custom_call_function("a function");
        runtime.set_read_only(true);
        runtime.set_async_call_info(AsyncCallInfo::default());

        runtime.init_state();

        assert!(runtime.sc_address().is_zero());
        assert_eq!(runtime.function(), "");
        assert!(!runtime.read_only());
        assert!(runtime.async_call_info().is_none());
    }

    #[test]
    fn test_start_instance_rejects_unknown_code() {
        let engine = Rc::new(MockEngine::new());
        let mut runtime = new_runtime(&engine);

        let err = runtime.start_instance(b"unknown", 100_000_000).unwrap_err();
        assert_eq!(
            err,
            ExecutionError::Engine(EngineError::InvalidBytecode)
        );
        assert!(!runtime.is_instance_active());
    }

    #[test]
    fn test_start_instance_clears_breakpoint() {
        let engine = Rc::new(MockEngine::new());
        let code = register_counter(&engine);
        let mut runtime = new_runtime(&engine);

        runtime.start_instance(&code, 100_000_000).unwrap();
        assert_eq!(runtime.get_runtime_breakpoint(), BreakpointValue::None);
    }

    #[test]
    fn test_max_instances_reached() {
        let engine = Rc::new(MockEngine::new());
        let code = register_counter(&engine);
        let mut runtime = new_runtime(&engine);

        runtime.start_instance(&code, 1000).unwrap();
        runtime.push_instance();

        let err = runtime.start_instance(&code, 1000).unwrap_err();
        assert_eq!(err, ExecutionError::MaxInstancesReached);

        runtime.pop_instance();
        assert!(runtime.is_instance_active());
        assert_eq!(runtime.instance_count(), 0);
    }

    #[test]
    fn test_push_pop_state() {
        let engine = Rc::new(MockEngine::new());
        let mut runtime = new_runtime(&engine);

        let input = ContractCallInput {
            vm_input: VMInput {
                caller_addr: Address::left_padded(b"caller"),
                gas_provided: 1000,
                ..VMInput::default()
            },
            recipient_addr: Address::left_padded(b"smartcontract"),
            function: "test_func".to_string(),
        };
        runtime.init_state_from_call_input(&input);

        runtime.push_state();
        assert_eq!(runtime.state_stack_len(), 1);

        runtime.set_sc_address(Address::left_padded(b"dummy"));
        runtime.set_read_only(true);

        runtime.pop_set_active_state();
        assert_eq!(runtime.sc_address(), &Address::left_padded(b"smartcontract"));
        assert_eq!(runtime.function(), "test_func");
        assert!(!runtime.read_only());

        runtime.push_state();
        runtime.push_state();
        runtime.pop_discard();
        assert_eq!(runtime.state_stack_len(), 1);
        runtime.clear_state_stack();
        assert_eq!(runtime.state_stack_len(), 0);
    }

    #[test]
    fn test_function_lookup() {
        let engine = Rc::new(MockEngine::new());
        let code = register_counter(&engine);
        let mut runtime = new_runtime(&engine);

        runtime.start_instance(&code, 1000).unwrap();
        runtime.set_custom_call_function("increment");
        assert!(runtime.function_to_call().is_ok());

        runtime.set_custom_call_function("missing");
        match runtime.function_to_call() {
            Err(err) => assert_eq!(err, ExecutionError::FuncNotFound),
            Ok(_) => panic!("expected function_to_call to fail"),
        }

        assert!(runtime.init_function().is_some());
    }

    #[test]
    fn test_verify_contract_code_rejects_reserved_export() {
        let engine = Rc::new(MockEngine::new());
        let code = b"bad-contract".to_vec();
        let mut module = MockModule::new(2);
        module.export("storageStore", |_| Ok(()));
        engine.register_contract(&code, module);

        let mut runtime = new_runtime(&engine);
        runtime.start_instance(&code, 1000).unwrap();
        assert_eq!(
            runtime.verify_contract_code().unwrap_err(),
            ExecutionError::FunctionReserved
        );
    }

    #[test]
    fn test_extract_code_upgrade_from_args() {
        let engine = Rc::new(MockEngine::new());
        let mut runtime = new_runtime(&engine);

        runtime.set_vm_input(VMInput {
            arguments: vec![b"code".to_vec(), vec![1, 0], b"arg".to_vec()],
            ..VMInput::default()
        });

        let (code, metadata) = runtime.extract_code_upgrade_from_args().unwrap();
        assert_eq!(code, b"code");
        assert_eq!(metadata, vec![1, 0]);
        assert_eq!(runtime.arguments(), &[b"arg".to_vec()]);

        runtime.set_vm_input(VMInput {
            arguments: vec![b"only-one".to_vec()],
            ..VMInput::default()
        });
        assert_eq!(
            runtime.extract_code_upgrade_from_args().unwrap_err(),
            ExecutionError::InvalidUpgradeArguments
        );
    }

    #[test]
    fn test_mem_load_cases() {
        let engine = Rc::new(MockEngine::new());
        let code = register_counter(&engine);
        let mut runtime = new_runtime(&engine);
        runtime.start_instance(&code, 1000).unwrap();

        let memory_length = 2 * WASM_PAGE_SIZE as i32;

        // Offset too small.
        assert_eq!(
            runtime.mem_load(-3, 10).unwrap_err(),
            ExecutionError::BadBounds
        );
        // Offset too large.
        assert_eq!(
            runtime.mem_load(memory_length + 1, 10).unwrap_err(),
            ExecutionError::BadBounds
        );
        // Negative length.
        assert_eq!(
            runtime.mem_load(10, -2).unwrap_err(),
            ExecutionError::NegativeLength
        );
        // Zero length.
        assert_eq!(runtime.mem_load(10, 0).unwrap(), Vec::<u8>::new());

        // Reads past the end zero-pad.
        runtime.mem_store(memory_length - 9, b"test data").unwrap();
        assert_eq!(
            runtime.mem_load(memory_length - 9, 9).unwrap(),
            b"test data".to_vec()
        );
        assert_eq!(
            runtime.mem_load(memory_length - 8, 9).unwrap(),
            b"est data\0".to_vec()
        );
    }

    #[test]
    fn test_mem_store_cases() {
        let engine = Rc::new(MockEngine::new());
        let code = register_counter(&engine);
        let mut runtime = new_runtime(&engine);
        runtime.start_instance(&code, 1000).unwrap();

        let page = WASM_PAGE_SIZE as i32;

        // Bad lower bounds.
        assert_eq!(
            runtime.mem_store(-2, b"test data").unwrap_err(),
            ExecutionError::BadLowerBounds
        );

        // A store that overshoots grows the memory by one page.
        runtime.mem_store(2 * page - 4, b"test data").unwrap();
        {
            let loaded = runtime.mem_load(2 * page - 4, 9).unwrap();
            assert_eq!(loaded, b"test data".to_vec());
        }

        // Growing more than one page at a time is not allowed.
        let big = vec![7u8; WASM_PAGE_SIZE as usize + 100];
        assert_eq!(
            runtime.mem_store(3 * page - 50, &big).unwrap_err(),
            ExecutionError::BadUpperBounds
        );

        // Overwrite, then an empty store is a no-op.
        runtime.mem_store(100, b"this is a message").unwrap();
        runtime.mem_store(100, b"this is something").unwrap();
        runtime.mem_store(100, &[]).unwrap();
        assert_eq!(
            runtime.mem_load(100, 17).unwrap(),
            b"this is something".to_vec()
        );
    }

    #[test]
    fn test_async_context_bookkeeping() {
        let engine = Rc::new(MockEngine::new());
        let mut runtime = new_runtime(&engine);

        assert_eq!(
            runtime.get_async_context(b"missing").unwrap_err(),
            ExecutionError::AsyncContextDoesNotExist
        );

        runtime.add_async_context_call(
            b"ctx",
            AsyncGeneratedCall {
                destination: b"dest".to_vec(),
                ..AsyncGeneratedCall::default()
            },
        );
        let context = runtime.get_async_context(b"ctx").unwrap();
        assert_eq!(context.async_calls.len(), 1);
        assert_eq!(context.async_calls[0].destination, b"dest");
    }
}
