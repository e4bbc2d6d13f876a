//! Top-level dispatch and nested execution.
//!
//! The entry points wrap their bodies in a panic catch: any panic becomes
//! an error from the entry point, and the host must be re-initialized
//! before the next call. All expected failures travel as `Result`s and end
//! up as a return code in the assembled `VMOutput`.

use crate::contexts::bigint::big_int_from_unsigned_bytes;
use crate::contexts::output::CodeDeployInput;
use crate::contexts::OutputContext;
use crate::errors::{EngineError, ExecutionError};
use crate::host::VmHost;
use crate::ports::engine::{BreakpointValue, ContractCallback};
use crate::ports::inbound::VmExecutor;
use crate::{CALLBACK_FUNCTION_NAME, UPGRADE_FUNCTION_NAME};
use num_traits::Zero;
use std::panic::{self, AssertUnwindSafe};
use tracing::{error, trace};
use vm_common::{
    Address, CallType, ContractCallInput, ContractCreateInput, ReturnCode, VMInput, VMOutput,
};

// =============================================================================
// ENTRY POINTS
// =============================================================================

impl VmExecutor for VmHost {
    fn run_smart_contract_create(
        &mut self,
        input: ContractCreateInput,
    ) -> Result<VMOutput, ExecutionError> {
        trace!(
            code_len = input.contract_code.len(),
            metadata = ?input.contract_code_metadata,
            "run_smart_contract_create begin"
        );

        let result =
            panic::catch_unwind(AssertUnwindSafe(|| self.do_run_smart_contract_create(&input)));

        match result {
            Ok(vm_output) => {
                trace!(
                    return_code = %vm_output.return_code,
                    return_message = %vm_output.return_message,
                    "run_smart_contract_create end"
                );
                Ok(vm_output)
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                error!(%message, "run_smart_contract_create panicked");
                Err(ExecutionError::ExecutionPanicked(message))
            }
        }
    }

    fn run_smart_contract_call(
        &mut self,
        input: ContractCallInput,
    ) -> Result<VMOutput, ExecutionError> {
        trace!(function = %input.function, "run_smart_contract_call begin");

        let is_upgrade = input.function == UPGRADE_FUNCTION_NAME;
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            if is_upgrade {
                self.do_run_smart_contract_upgrade(&input)
            } else {
                self.do_run_smart_contract_call(&input)
            }
        }));

        match result {
            Ok(vm_output) => {
                trace!(
                    return_code = %vm_output.return_code,
                    return_message = %vm_output.return_message,
                    "run_smart_contract_call end"
                );
                Ok(vm_output)
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                error!(%message, "run_smart_contract_call panicked");
                Err(ExecutionError::ExecutionPanicked(message))
            }
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

// =============================================================================
// TOP-LEVEL FLOWS
// =============================================================================

impl VmHost {
    fn do_run_smart_contract_create(&mut self, input: &ContractCreateInput) -> VMOutput {
        self.init_state();

        let vm_type = self.runtime.vm_type().to_vec();
        let address = match self.blockchain.new_address(
            &input.vm_input.caller_addr,
            &vm_type,
            &mut self.output,
        ) {
            Ok(address) => address,
            Err(err) => return self.vm_output_for_error(&err),
        };

        self.runtime.init_state_from_create_input(input, address);
        self.storage.set_address(address);
        self.output.deploy_code(&CodeDeployInput {
            contract_code: input.contract_code.clone(),
            contract_code_metadata: input.contract_code_metadata.clone(),
            contract_address: address,
        });
        self.output
            .add_tx_value_to_account(&address, &input.vm_input.call_value);

        if let Err(err) = self
            .runtime
            .start_instance(&input.contract_code, input.vm_input.gas_provided)
        {
            return self.vm_output_for_error(&err);
        }

        let result = self
            .runtime
            .verify_contract_code()
            .and_then(|()| self.call_init_if_present());

        let vm_output = match result {
            Ok(()) => {
                let gas_left = self.metering.gas_left(&self.runtime);
                self.output.get_vm_output(gas_left)
            }
            Err(err) => self.vm_output_for_error(&err),
        };

        self.runtime.clean_instance();
        vm_output
    }

    fn do_run_smart_contract_call(&mut self, input: &ContractCallInput) -> VMOutput {
        self.init_state();
        self.runtime.init_state_from_call_input(input);
        self.storage.set_address(input.recipient_addr);

        let contract = match self.blockchain.get_code(&input.recipient_addr) {
            Ok(contract) => contract,
            Err(err) => return self.vm_output_for_error(&err),
        };

        self.output
            .add_tx_value_to_account(&input.recipient_addr, &input.vm_input.call_value);

        if let Err(err) = self
            .runtime
            .start_instance(&contract, input.vm_input.gas_provided)
        {
            return self.vm_output_for_error(&err);
        }

        let vm_output = match self.call_sc_method() {
            Ok(()) => {
                let gas_left = self.metering.gas_left(&self.runtime);
                self.output.get_vm_output(gas_left)
            }
            Err(err) => self.vm_output_for_error(&err),
        };

        self.runtime.clean_instance();
        vm_output
    }

    fn do_run_smart_contract_upgrade(&mut self, input: &ContractCallInput) -> VMOutput {
        self.init_state();
        self.runtime.init_state_from_call_input(input);
        self.storage.set_address(input.recipient_addr);

        let (code, code_metadata) = match self.runtime.extract_code_upgrade_from_args() {
            Ok(extracted) => extracted,
            Err(err) => return self.vm_output_for_error(&err),
        };

        self.output.deploy_code(&CodeDeployInput {
            contract_code: code.clone(),
            contract_code_metadata: code_metadata,
            contract_address: input.recipient_addr,
        });
        self.output
            .add_tx_value_to_account(&input.recipient_addr, &input.vm_input.call_value);

        if let Err(err) = self
            .runtime
            .start_instance(&code, input.vm_input.gas_provided)
        {
            return self.vm_output_for_error(&err);
        }

        let result = self
            .runtime
            .verify_contract_code()
            .and_then(|()| self.call_init_if_present());

        let vm_output = match result {
            Ok(()) => {
                let gas_left = self.metering.gas_left(&self.runtime);
                self.output.get_vm_output(gas_left)
            }
            Err(err) => self.vm_output_for_error(&err),
        };

        self.runtime.clean_instance();
        vm_output
    }

    // -------------------------------------------------------------------------
    // invocation and breakpoint handling
    // -------------------------------------------------------------------------

    fn call_sc_method(&mut self) -> Result<(), ExecutionError> {
        let function = self.runtime.function_to_call()?;
        let call_result = self.invoke(&function);
        self.handle_breakpoint(call_result)
    }

    fn call_init_if_present(&mut self) -> Result<(), ExecutionError> {
        let Some(init) = self.runtime.init_function() else {
            return Ok(());
        };
        let call_result = self.invoke(&init);
        self.handle_breakpoint(call_result)
    }

    fn invoke(&mut self, function: &ContractCallback) -> Result<(), EngineError> {
        function(self)
    }

    /// Inspects the terminal breakpoint after an invocation and converts
    /// it into the error that decides the return code. A pending async
    /// call is serviced here.
    fn handle_breakpoint(
        &mut self,
        call_result: Result<(), EngineError>,
    ) -> Result<(), ExecutionError> {
        match self.runtime.get_runtime_breakpoint() {
            BreakpointValue::None => call_result.map_err(ExecutionError::Engine),
            BreakpointValue::OutOfGas => Err(ExecutionError::NotEnoughGas),
            BreakpointValue::SignalError => Err(ExecutionError::SignalError),
            BreakpointValue::ExecutionFailed => Err(ExecutionError::ExecutionFailed),
            BreakpointValue::AsyncCall => self.handle_async_call_breakpoint(),
        }
    }

    /// Maps a terminal error to the return code and message of the final
    /// output. Contract-signalled conditions defer to what the output
    /// context already recorded.
    fn vm_output_for_error(&mut self, err: &ExecutionError) -> VMOutput {
        let (return_code, return_message) = match err {
            ExecutionError::SignalError | ExecutionError::ExecutionFailed
                if self.output.return_code() != ReturnCode::Ok =>
            {
                (
                    self.output.return_code(),
                    self.output.return_message().to_string(),
                )
            }
            ExecutionError::SignalError => (ReturnCode::UserError, err.to_string()),
            ExecutionError::NotEnoughGas => (ReturnCode::OutOfGas, err.to_string()),
            ExecutionError::FuncNotFound => (ReturnCode::FunctionNotFound, err.to_string()),
            ExecutionError::InvalidAccount | ExecutionError::ContractNotFound => {
                (ReturnCode::ContractNotFound, err.to_string())
            }
            ExecutionError::InvalidUpgradeArguments => (ReturnCode::UserError, err.to_string()),
            ExecutionError::AccountCollision => (ReturnCode::AccountCollision, err.to_string()),
            ExecutionError::Engine(EngineError::InvalidBytecode)
            | ExecutionError::Engine(EngineError::MemoryDeclarationMissing)
            | ExecutionError::FunctionReserved => (ReturnCode::ContractInvalid, err.to_string()),
            _ => (ReturnCode::ExecutionFailed, err.to_string()),
        };

        OutputContext::create_vm_output_in_case_of_error(return_code, return_message)
    }

    // -------------------------------------------------------------------------
    // nested execution
    // -------------------------------------------------------------------------

    /// Runs a nested call on the same output context: runtime state,
    /// storage address and instance swap, but all output accumulates in
    /// the single active bag.
    pub fn execute_on_same_context_internal(
        &mut self,
        input: ContractCallInput,
    ) -> Result<(), ExecutionError> {
        let contract = self.blockchain.get_code(&input.recipient_addr)?;

        self.runtime.push_state();
        self.storage.push_state();
        self.runtime.init_state_from_call_input(&input);
        self.storage.set_address(input.recipient_addr);
        self.runtime.push_instance();

        let result = self
            .runtime
            .start_instance(&contract, input.vm_input.gas_provided)
            .and_then(|()| self.call_sc_method());

        let gas_used_by_nested = self.runtime.get_points_used();
        self.runtime.pop_instance();
        self.runtime.pop_set_active_state();
        self.storage.pop_set_active_state();
        // The caller pays for the gas its nested call consumed.
        self.metering.use_gas(&self.runtime, gas_used_by_nested);

        result
    }

    /// Runs a nested call on the destination context: output and big-int
    /// state are pushed too, the call value moves to the destination, and
    /// the inner frame merges back only on success. Returns the inner
    /// frame's return data.
    pub fn execute_on_dest_context_internal(
        &mut self,
        input: ContractCallInput,
    ) -> Result<Vec<Vec<u8>>, ExecutionError> {
        let contract = self.blockchain.get_code(&input.recipient_addr)?;

        self.runtime.push_state();
        self.storage.push_state();
        self.big_int.push_state();
        self.output.push_state();
        self.output.censor_vm_output();

        self.runtime.init_state_from_call_input(&input);
        self.storage.set_address(input.recipient_addr);

        let transfer_result = if input.vm_input.call_value.is_zero() {
            Ok(())
        } else {
            self.output.transfer(
                &input.recipient_addr,
                &input.vm_input.caller_addr,
                0,
                &input.vm_input.call_value,
                &[],
            )
        };

        self.runtime.push_instance();
        let result = transfer_result.and_then(|()| {
            self.runtime
                .start_instance(&contract, input.vm_input.gas_provided)?;
            self.call_sc_method()
        });

        let gas_used_by_nested = self.runtime.get_points_used();
        self.runtime.pop_instance();

        let outcome = match result {
            Ok(()) => {
                let return_data = self.output.return_data().to_vec();
                self.output.pop_merge_active_state();
                Ok(return_data)
            }
            Err(err) => {
                self.output.pop_set_active_state();
                Err(err)
            }
        };

        self.big_int.pop_set_active_state();
        self.runtime.pop_set_active_state();
        self.storage.pop_set_active_state();
        self.metering.use_gas(&self.runtime, gas_used_by_nested);

        outcome
    }

    /// Deploys a contract on behalf of an executing contract and runs its
    /// init on the destination context. Returns the derived address.
    pub fn create_new_contract(
        &mut self,
        input: ContractCreateInput,
    ) -> Result<Address, ExecutionError> {
        let vm_type = self.runtime.vm_type().to_vec();
        let caller = input.vm_input.caller_addr;

        self.blockchain.increase_nonce(&caller, &mut self.output);
        let address = self
            .blockchain
            .new_address(&caller, &vm_type, &mut self.output)?;
        if self.blockchain.account_exists(&address) {
            return Err(ExecutionError::AccountCollision);
        }

        self.runtime.push_state();
        self.storage.push_state();
        self.big_int.push_state();
        self.output.push_state();
        self.output.censor_vm_output();

        self.runtime.init_state_from_create_input(&input, address);
        self.storage.set_address(address);
        self.output.deploy_code(&CodeDeployInput {
            contract_code: input.contract_code.clone(),
            contract_code_metadata: input.contract_code_metadata.clone(),
            contract_address: address,
        });

        let transfer_result = if input.vm_input.call_value.is_zero() {
            Ok(())
        } else {
            self.output
                .transfer(&address, &caller, 0, &input.vm_input.call_value, &[])
        };

        self.runtime.push_instance();
        let result = transfer_result.and_then(|()| {
            self.runtime
                .start_instance(&input.contract_code, input.vm_input.gas_provided)?;
            self.runtime.verify_contract_code()?;
            self.call_init_if_present()
        });

        let gas_used_by_nested = self.runtime.get_points_used();
        self.runtime.pop_instance();

        let outcome = match result {
            Ok(()) => {
                self.output.pop_merge_active_state();
                Ok(address)
            }
            Err(err) => {
                self.output.pop_set_active_state();
                Err(err)
            }
        };

        self.big_int.pop_set_active_state();
        self.runtime.pop_set_active_state();
        self.storage.pop_set_active_state();
        self.metering.use_gas(&self.runtime, gas_used_by_nested);

        outcome
    }

    // -------------------------------------------------------------------------
    // async calls
    // -------------------------------------------------------------------------

    /// Services the `AsyncCall` breakpoint. Same-shard contract
    /// destinations execute synchronously on the destination context,
    /// followed by the caller's callback; everything else is registered as
    /// a transfer carrying the call data for the node to route.
    fn handle_async_call_breakpoint(&mut self) -> Result<(), ExecutionError> {
        self.runtime.set_runtime_breakpoint(BreakpointValue::None);

        let info = self.runtime.take_async_call_info().ok_or_else(|| {
            ExecutionError::Other("no async call info registered".to_string())
        })?;

        let sender = *self.runtime.sc_address();
        let dest = Address::left_padded(&info.destination);
        let value = big_int_from_unsigned_bytes(&info.value_bytes);

        let same_shard =
            self.blockchain.shard_of_address(&sender) == self.blockchain.shard_of_address(&dest);
        if !same_shard || !self.blockchain.is_smart_contract(&dest) {
            let _ = self.blockchain.get_balance_big_int(&sender, &mut self.output);
            self.output
                .transfer(&dest, &sender, info.gas_limit, &value, &info.data)?;
            return Ok(());
        }

        let (function, arguments) = parse_call_data(&info.data)?;
        let gas_provided = self
            .metering
            .bound_gas_limit(&self.runtime, info.gas_limit as i64);
        let call_input = ContractCallInput {
            vm_input: VMInput {
                caller_addr: sender,
                call_value: value,
                arguments,
                gas_price: self.runtime.vm_input().gas_price,
                gas_provided,
                call_type: CallType::AsynchronousCall,
                current_tx_hash: self.runtime.current_tx_hash().to_vec(),
                original_tx_hash: self.runtime.original_tx_hash().to_vec(),
            },
            recipient_addr: dest,
            function,
        };

        match self.execute_on_dest_context_internal(call_input) {
            Ok(return_data) => self.execute_async_callback(true, &return_data),
            Err(err) => {
                let message = err.to_string();
                self.execute_async_callback(false, &[message.into_bytes()])
            }
        }
    }

    /// Invokes the caller's callback export, if present. The first
    /// argument encodes the outcome (empty = success), followed by the
    /// nested return data or the error message.
    fn execute_async_callback(
        &mut self,
        success: bool,
        callback_data: &[Vec<u8>],
    ) -> Result<(), ExecutionError> {
        let Some(callback) = self.runtime.export(CALLBACK_FUNCTION_NAME) else {
            return Ok(());
        };

        self.runtime.push_state();
        let mut vm_input = self.runtime.vm_input().clone();
        vm_input.call_type = CallType::AsynchronousCallBack;
        let mut arguments = vec![if success { Vec::new() } else { vec![1] }];
        arguments.extend(callback_data.iter().cloned());
        vm_input.arguments = arguments;
        self.runtime.set_vm_input(vm_input);
        self.runtime.set_custom_call_function(CALLBACK_FUNCTION_NAME);

        let call_result = self.invoke(&callback);
        let result = self.handle_breakpoint(call_result);
        self.runtime.pop_set_active_state();
        result
    }
}

// =============================================================================
// CALL DATA
// =============================================================================

/// Parses `function@hexarg@hexarg...` call data into a function name and
/// decoded arguments.
pub fn parse_call_data(data: &[u8]) -> Result<(String, Vec<Vec<u8>>), ExecutionError> {
    let mut parts = data.split(|byte| *byte == b'@');
    let function = parts
        .next()
        .filter(|function| !function.is_empty())
        .ok_or_else(|| ExecutionError::Other("empty function in call data".to_string()))?;

    let mut arguments = Vec::new();
    for part in parts {
        let decoded = hex::decode(part)
            .map_err(|_| ExecutionError::Other("invalid hex argument in call data".to_string()))?;
        arguments.push(decoded);
    }

    Ok((String::from_utf8_lossy(function).into_owned(), arguments))
}

// =============================================================================
// TESTS
// =============================================================================
