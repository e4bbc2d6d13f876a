//! The main EI family: identity and context reads, block info, storage,
//! output, transfers, nested execution and async registration.

use crate::contexts::bigint::{big_int_from_unsigned_bytes, big_int_to_signed_bytes};
use crate::errors::ExecutionError;
use crate::host::VmHost;
use crate::ports::engine::BreakpointValue;
use num_bigint::BigInt;
use num_traits::ToPrimitive;
use vm_common::{
    pad_bytes_left, Address, AsyncCallInfo, AsyncGeneratedCall, ContractCallInput,
    ContractCreateInput, VMInput, ADDRESS_LEN, BALANCE_LEN, HASH_LEN,
};

/// Identity, block, storage, output, transfer and nested-execution host
/// functions.
#[allow(missing_docs, clippy::too_many_arguments)]
pub trait BaseOpsApi {
    fn get_gas_left(&mut self) -> i64;
    fn get_sc_address(&mut self, result_offset: i32);
    fn get_owner_address(&mut self, result_offset: i32);
    fn get_shard_of_address(&mut self, address_offset: i32) -> i32;
    fn is_smart_contract(&mut self, address_offset: i32) -> i32;
    fn signal_error(&mut self, message_offset: i32, message_length: i32);
    fn get_external_balance(&mut self, address_offset: i32, result_offset: i32);
    fn get_block_hash(&mut self, nonce: i64, result_offset: i32) -> i32;
    fn transfer_value(
        &mut self,
        dest_offset: i32,
        value_offset: i32,
        data_offset: i32,
        length: i32,
    ) -> i32;
    fn async_call(&mut self, dest_offset: i32, value_offset: i32, data_offset: i32, length: i32);
    fn create_async_call(
        &mut self,
        identifier_offset: i32,
        identifier_length: i32,
        dest_offset: i32,
        value_offset: i32,
        data_offset: i32,
        length: i32,
        success_offset: i32,
        success_length: i32,
        error_offset: i32,
        error_length: i32,
        gas: i64,
    );
    fn set_async_context_callback(
        &mut self,
        identifier_offset: i32,
        identifier_length: i32,
        callback_offset: i32,
        callback_length: i32,
    ) -> i32;
    fn get_argument_length(&mut self, id: i32) -> i32;
    fn get_argument(&mut self, id: i32, arg_offset: i32) -> i32;
    fn get_function(&mut self, function_offset: i32) -> i32;
    fn get_num_arguments(&mut self) -> i32;
    fn storage_store(
        &mut self,
        key_offset: i32,
        key_length: i32,
        data_offset: i32,
        data_length: i32,
    ) -> i32;
    fn storage_load_length(&mut self, key_offset: i32, key_length: i32) -> i32;
    fn storage_load(&mut self, key_offset: i32, key_length: i32, data_offset: i32) -> i32;
    fn set_storage_lock(&mut self, key_offset: i32, key_length: i32, lock_timestamp: i64) -> i32;
    fn get_storage_lock(&mut self, key_offset: i32, key_length: i32) -> i64;
    fn is_storage_locked(&mut self, key_offset: i32, key_length: i32) -> i32;
    fn clear_storage_lock(&mut self, key_offset: i32, key_length: i32) -> i32;
    fn get_caller(&mut self, result_offset: i32);
    fn get_call_value(&mut self, result_offset: i32) -> i32;
    fn write_log(&mut self, data_pointer: i32, data_length: i32, topic_pointer: i32, num_topics: i32);
    fn finish(&mut self, data_offset: i32, length: i32);
    fn get_block_timestamp(&mut self) -> i64;
    fn get_block_nonce(&mut self) -> i64;
    fn get_block_round(&mut self) -> i64;
    fn get_block_epoch(&mut self) -> i64;
    fn get_block_random_seed(&mut self, result_offset: i32);
    fn get_state_root_hash(&mut self, result_offset: i32);
    fn get_prev_block_timestamp(&mut self) -> i64;
    fn get_prev_block_nonce(&mut self) -> i64;
    fn get_prev_block_round(&mut self) -> i64;
    fn get_prev_block_epoch(&mut self) -> i64;
    fn get_prev_block_random_seed(&mut self, result_offset: i32);
    fn get_original_tx_hash(&mut self, result_offset: i32);
    fn execute_on_dest_context(
        &mut self,
        gas_limit: i64,
        address_offset: i32,
        value_offset: i32,
        function_offset: i32,
        function_length: i32,
        num_arguments: i32,
        arguments_length_offset: i32,
        data_offset: i32,
    ) -> i32;
    fn execute_on_same_context(
        &mut self,
        gas_limit: i64,
        address_offset: i32,
        value_offset: i32,
        function_offset: i32,
        function_length: i32,
        num_arguments: i32,
        arguments_length_offset: i32,
        data_offset: i32,
    ) -> i32;
    fn delegate_execution(
        &mut self,
        gas_limit: i64,
        address_offset: i32,
        function_offset: i32,
        function_length: i32,
        num_arguments: i32,
        arguments_length_offset: i32,
        data_offset: i32,
    ) -> i32;
    fn execute_read_only(
        &mut self,
        gas_limit: i64,
        address_offset: i32,
        function_offset: i32,
        function_length: i32,
        num_arguments: i32,
        arguments_length_offset: i32,
        data_offset: i32,
    ) -> i32;
    fn create_contract(
        &mut self,
        value_offset: i32,
        code_offset: i32,
        length: i32,
        result_offset: i32,
        num_arguments: i32,
        arguments_length_offset: i32,
        data_offset: i32,
    ) -> i32;
    fn get_num_return_data(&mut self) -> i32;
    fn get_return_data_size(&mut self, result_id: i32) -> i32;
    fn get_return_data(&mut self, result_id: i32, data_offset: i32) -> i32;
    fn int64_get_argument(&mut self, id: i32) -> i64;
    fn int64_storage_store(&mut self, key_offset: i32, key_length: i32, value: i64) -> i32;
    fn int64_storage_load(&mut self, key_offset: i32, key_length: i32) -> i64;
    fn int64_finish(&mut self, value: i64);

    /// The raw breakpoint slot of the active instance. This is the check a
    /// real engine performs at every metering tick; it is not importable
    /// by contracts.
    fn current_breakpoint(&self) -> u64;
}

// =============================================================================
// SHARED HELPERS
// =============================================================================

impl VmHost {
    pub(crate) fn charge(&mut self, gas: u64) {
        self.metering.use_gas(&self.runtime, gas);
    }

    /// Unpacks the `(function, num_args × little-endian length, packed
    /// data)` convention used by the nested-call EI functions. Returns the
    /// function name, the arguments and the total packed byte count.
    pub(crate) fn get_arguments_from_memory(
        &mut self,
        function_offset: i32,
        function_length: i32,
        num_arguments: i32,
        arguments_length_offset: i32,
        data_offset: i32,
    ) -> Result<(String, Vec<Vec<u8>>, i32), ExecutionError> {
        if num_arguments < 0 {
            return Err(ExecutionError::NegativeLength);
        }

        let function = self.runtime.mem_load(function_offset, function_length)?;
        let lengths_data = self
            .runtime
            .mem_load(arguments_length_offset, num_arguments * 4)?;

        let mut arguments = Vec::with_capacity(num_arguments as usize);
        let mut current_offset = data_offset;
        for chunk in lengths_data.chunks_exact(4) {
            let argument_length = i32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
            arguments.push(self.runtime.mem_load(current_offset, argument_length)?);
            current_offset += argument_length;
        }

        Ok((
            String::from_utf8_lossy(&function).into_owned(),
            arguments,
            current_offset - data_offset,
        ))
    }

    fn time_lock_key(key: &[u8]) -> Vec<u8> {
        let mut derived = crate::TIME_LOCK_KEY_PREFIX.to_vec();
        derived.extend_from_slice(key);
        derived
    }

    fn int64_to_storage_bytes(value: i64) -> Vec<u8> {
        if value == 0 {
            return Vec::new();
        }
        let (_, bytes) = BigInt::from(value).to_bytes_be();
        bytes
    }
}

// =============================================================================
// IMPLEMENTATION
// =============================================================================

impl BaseOpsApi for VmHost {
    fn get_gas_left(&mut self) -> i64 {
        let gas = self.metering.gas_schedule().api_cost.get_gas_left;
        self.charge(gas);

        self.metering.gas_left(&self.runtime) as i64
    }

    fn get_sc_address(&mut self, result_offset: i32) {
        let address = self.runtime.sc_address().to_vec();
        if let Err(err) = self.runtime.mem_store(result_offset, &address) {
            self.fault(&err);
            return;
        }

        let gas = self.metering.gas_schedule().api_cost.get_sc_address;
        self.charge(gas);
    }

    fn get_owner_address(&mut self, result_offset: i32) {
        let owner = match self.blockchain.get_owner_address(self.runtime.sc_address()) {
            Ok(owner) => owner,
            Err(err) => {
                self.fault(&err);
                return;
            }
        };

        if let Err(err) = self.runtime.mem_store(result_offset, owner.as_bytes()) {
            self.fault(&err);
            return;
        }

        let gas = self.metering.gas_schedule().api_cost.get_owner_address;
        self.charge(gas);
    }

    fn get_shard_of_address(&mut self, address_offset: i32) -> i32 {
        let address = match self.runtime.mem_load(address_offset, ADDRESS_LEN as i32) {
            Ok(address) => address,
            Err(err) => {
                self.fault(&err);
                return 0;
            }
        };

        let gas = self.metering.gas_schedule().api_cost.get_shard_of_address;
        self.charge(gas);

        self.blockchain
            .shard_of_address(&Address::left_padded(&address)) as i32
    }

    fn is_smart_contract(&mut self, address_offset: i32) -> i32 {
        let address = match self.runtime.mem_load(address_offset, ADDRESS_LEN as i32) {
            Ok(address) => address,
            Err(err) => {
                self.fault(&err);
                return 0;
            }
        };

        let gas = self.metering.gas_schedule().api_cost.is_smart_contract;
        self.charge(gas);

        i32::from(
            self.blockchain
                .is_smart_contract(&Address::left_padded(&address)),
        )
    }

    fn signal_error(&mut self, message_offset: i32, message_length: i32) {
        let message = match self.runtime.mem_load(message_offset, message_length) {
            Ok(message) => message,
            Err(err) => {
                self.fault(&err);
                return;
            }
        };
        self.runtime
            .signal_user_error(&String::from_utf8_lossy(&message), &mut self.output);

        let gas = self.metering.gas_schedule().api_cost.signal_error;
        self.charge(gas);
    }

    fn get_external_balance(&mut self, address_offset: i32, result_offset: i32) {
        let address = match self.runtime.mem_load(address_offset, ADDRESS_LEN as i32) {
            Ok(address) => address,
            Err(err) => {
                self.fault(&err);
                return;
            }
        };

        let balance = self
            .blockchain
            .get_balance(&Address::left_padded(&address), &mut self.output);

        if let Err(err) = self.runtime.mem_store(result_offset, &balance) {
            self.fault(&err);
            return;
        }

        let gas = self.metering.gas_schedule().api_cost.get_external_balance;
        self.charge(gas);
    }

    fn get_block_hash(&mut self, nonce: i64, result_offset: i32) -> i32 {
        let gas = self.metering.gas_schedule().api_cost.get_block_hash;
        self.charge(gas);

        let hash = self.blockchain.block_hash(nonce);
        if let Err(err) = self.runtime.mem_store(result_offset, &hash) {
            self.fault(&err);
            return 1;
        }

        0
    }

    fn transfer_value(
        &mut self,
        dest_offset: i32,
        value_offset: i32,
        data_offset: i32,
        length: i32,
    ) -> i32 {
        let sender = *self.runtime.sc_address();
        let dest = match self.runtime.mem_load(dest_offset, ADDRESS_LEN as i32) {
            Ok(dest) => dest,
            Err(err) => {
                self.fault(&err);
                return 1;
            }
        };
        let value = match self.runtime.mem_load(value_offset, BALANCE_LEN as i32) {
            Ok(value) => value,
            Err(err) => {
                self.fault(&err);
                return 1;
            }
        };
        let data = match self.runtime.mem_load(data_offset, length) {
            Ok(data) => data,
            Err(err) => {
                self.fault(&err);
                return 1;
            }
        };

        let schedule = self.metering.gas_schedule();
        let gas = schedule.api_cost.transfer_value
            + schedule.base_operation_cost.persist_per_byte * length as u64;
        self.charge(gas);

        // Materialize the sender balance so the overdraft check is
        // performed against the projected balance.
        let _ = self.blockchain.get_balance_big_int(&sender, &mut self.output);

        let dest = Address::left_padded(&dest);
        let value = big_int_from_unsigned_bytes(&value);
        if self
            .output
            .transfer(&dest, &sender, 0, &value, &data)
            .is_err()
        {
            return 1;
        }

        0
    }

    fn async_call(&mut self, dest_offset: i32, value_offset: i32, data_offset: i32, length: i32) {
        let dest = match self.runtime.mem_load(dest_offset, ADDRESS_LEN as i32) {
            Ok(dest) => dest,
            Err(err) => {
                self.fault(&err);
                return;
            }
        };
        let value = match self.runtime.mem_load(value_offset, BALANCE_LEN as i32) {
            Ok(value) => value,
            Err(err) => {
                self.fault(&err);
                return;
            }
        };
        let data = match self.runtime.mem_load(data_offset, length) {
            Ok(data) => data,
            Err(err) => {
                self.fault(&err);
                return;
            }
        };

        let schedule = self.metering.gas_schedule();
        let gas = schedule.api_cost.async_call_step
            + schedule.base_operation_cost.data_copy_per_byte * length as u64;
        let min_async_call_cost =
            2 * schedule.api_cost.async_call_step + schedule.api_cost.async_callback_gas_lock;
        self.charge(gas);

        let gas_limit = self.metering.gas_left(&self.runtime);
        if gas_limit < min_async_call_cost {
            self.runtime
                .set_runtime_breakpoint(BreakpointValue::OutOfGas);
            return;
        }

        // Whether the destination lives in the caller's shard is resolved
        // later, by the handler for the AsyncCall breakpoint.
        self.runtime.set_async_call_info(AsyncCallInfo {
            destination: dest,
            data,
            gas_limit,
            value_bytes: value,
        });
        self.runtime
            .set_runtime_breakpoint(BreakpointValue::AsyncCall);
    }

    fn create_async_call(
        &mut self,
        identifier_offset: i32,
        identifier_length: i32,
        dest_offset: i32,
        value_offset: i32,
        data_offset: i32,
        length: i32,
        success_offset: i32,
        success_length: i32,
        error_offset: i32,
        error_length: i32,
        gas: i64,
    ) {
        let identifier = match self.runtime.mem_load(identifier_offset, identifier_length) {
            Ok(identifier) => identifier,
            Err(err) => {
                self.fault(&err);
                return;
            }
        };
        let dest = match self.runtime.mem_load(dest_offset, ADDRESS_LEN as i32) {
            Ok(dest) => dest,
            Err(err) => {
                self.fault(&err);
                return;
            }
        };
        let value = match self.runtime.mem_load(value_offset, BALANCE_LEN as i32) {
            Ok(value) => value,
            Err(err) => {
                self.fault(&err);
                return;
            }
        };
        let data = match self.runtime.mem_load(data_offset, length) {
            Ok(data) => data,
            Err(err) => {
                self.fault(&err);
                return;
            }
        };
        let success_callback = match self.runtime.mem_load(success_offset, success_length) {
            Ok(success_callback) => success_callback,
            Err(err) => {
                self.fault(&err);
                return;
            }
        };
        let error_callback = match self.runtime.mem_load(error_offset, error_length) {
            Ok(error_callback) => error_callback,
            Err(err) => {
                self.fault(&err);
                return;
            }
        };

        self.runtime.add_async_context_call(
            &identifier,
            AsyncGeneratedCall {
                destination: dest,
                data,
                value_bytes: value,
                success_callback: String::from_utf8_lossy(&success_callback).into_owned(),
                error_callback: String::from_utf8_lossy(&error_callback).into_owned(),
                provided_gas: gas.max(0) as u64,
            },
        );
    }

    fn set_async_context_callback(
        &mut self,
        identifier_offset: i32,
        identifier_length: i32,
        callback_offset: i32,
        callback_length: i32,
    ) -> i32 {
        let identifier = match self.runtime.mem_load(identifier_offset, identifier_length) {
            Ok(identifier) => identifier,
            Err(err) => {
                self.fault(&err);
                return -1;
            }
        };

        if let Err(err) = self.runtime.get_async_context(&identifier) {
            self.fault(&err);
            return -1;
        }

        let callback = match self.runtime.mem_load(callback_offset, callback_length) {
            Ok(callback) => callback,
            Err(err) => {
                self.fault(&err);
                return -1;
            }
        };

        match self.runtime.get_async_context_mut(&identifier) {
            Ok(context) => {
                context.callback = String::from_utf8_lossy(&callback).into_owned();
                0
            }
            Err(err) => {
                self.fault(&err);
                -1
            }
        }
    }

    fn get_argument_length(&mut self, id: i32) -> i32 {
        let gas = self.metering.gas_schedule().api_cost.get_argument;
        self.charge(gas);

        let arguments = self.runtime.arguments();
        if id < 0 || id as usize >= arguments.len() {
            return -1;
        }

        arguments[id as usize].len() as i32
    }

    fn get_argument(&mut self, id: i32, arg_offset: i32) -> i32 {
        let gas = self.metering.gas_schedule().api_cost.get_argument;
        self.charge(gas);

        let arguments = self.runtime.arguments();
        if id < 0 || id as usize >= arguments.len() {
            return -1;
        }

        let argument = arguments[id as usize].clone();
        if let Err(err) = self.runtime.mem_store(arg_offset, &argument) {
            self.fault(&err);
            return -1;
        }

        argument.len() as i32
    }

    fn get_function(&mut self, function_offset: i32) -> i32 {
        let gas = self.metering.gas_schedule().api_cost.get_function;
        self.charge(gas);

        let function = self.runtime.function().as_bytes().to_vec();
        if let Err(err) = self.runtime.mem_store(function_offset, &function) {
            self.fault(&err);
            return -1;
        }

        function.len() as i32
    }

    fn get_num_arguments(&mut self) -> i32 {
        let gas = self.metering.gas_schedule().api_cost.get_num_arguments;
        self.charge(gas);

        self.runtime.arguments().len() as i32
    }

    fn storage_store(
        &mut self,
        key_offset: i32,
        key_length: i32,
        data_offset: i32,
        data_length: i32,
    ) -> i32 {
        let key = match self.runtime.mem_load(key_offset, key_length) {
            Ok(key) => key,
            Err(err) => {
                self.fault(&err);
                return -1;
            }
        };
        let data = match self.runtime.mem_load(data_offset, data_length) {
            Ok(data) => data,
            Err(err) => {
                self.fault(&err);
                return -1;
            }
        };

        let gas = self.metering.gas_schedule().api_cost.storage_store;
        self.charge(gas);

        match self
            .storage
            .set(&key, &data, &self.runtime, &self.metering, &mut self.output)
        {
            Ok(status) => status as i32,
            Err(err) => {
                self.fault(&err);
                -1
            }
        }
    }

    fn storage_load_length(&mut self, key_offset: i32, key_length: i32) -> i32 {
        let key = match self.runtime.mem_load(key_offset, key_length) {
            Ok(key) => key,
            Err(err) => {
                self.fault(&err);
                return -1;
            }
        };

        let data = self.storage.get(&key, &mut self.output);

        let gas = self.metering.gas_schedule().api_cost.storage_load;
        self.charge(gas);

        data.len() as i32
    }

    fn storage_load(&mut self, key_offset: i32, key_length: i32, data_offset: i32) -> i32 {
        let key = match self.runtime.mem_load(key_offset, key_length) {
            Ok(key) => key,
            Err(err) => {
                self.fault(&err);
                return -1;
            }
        };

        let data = self.storage.get(&key, &mut self.output);

        let schedule = self.metering.gas_schedule();
        let gas = schedule.api_cost.storage_load
            + schedule.base_operation_cost.data_copy_per_byte * data.len() as u64;
        self.charge(gas);

        if let Err(err) = self.runtime.mem_store(data_offset, &data) {
            self.fault(&err);
            return -1;
        }

        data.len() as i32
    }

    fn set_storage_lock(&mut self, key_offset: i32, key_length: i32, lock_timestamp: i64) -> i32 {
        let key = match self.runtime.mem_load(key_offset, key_length) {
            Ok(key) => key,
            Err(err) => {
                self.fault(&err);
                return -1;
            }
        };

        let time_lock_key = Self::time_lock_key(&key);
        let gas = self.metering.gas_schedule().api_cost.int64_storage_store;
        self.charge(gas);

        let timestamp_bytes = Self::int64_to_storage_bytes(lock_timestamp);
        match self.storage.set(
            &time_lock_key,
            &timestamp_bytes,
            &self.runtime,
            &self.metering,
            &mut self.output,
        ) {
            Ok(status) => status as i32,
            Err(err) => {
                self.fault(&err);
                -1
            }
        }
    }

    fn get_storage_lock(&mut self, key_offset: i32, key_length: i32) -> i64 {
        let key = match self.runtime.mem_load(key_offset, key_length) {
            Ok(key) => key,
            Err(err) => {
                self.fault(&err);
                return -1;
            }
        };

        let time_lock_key = Self::time_lock_key(&key);
        let gas = self.metering.gas_schedule().api_cost.storage_load;
        self.charge(gas);

        let data = self.storage.get(&time_lock_key, &mut self.output);
        big_int_from_unsigned_bytes(&data).to_i64().unwrap_or(0)
    }

    fn is_storage_locked(&mut self, key_offset: i32, key_length: i32) -> i32 {
        let time_lock = self.get_storage_lock(key_offset, key_length);
        if time_lock < 0 {
            return -1;
        }

        let current_timestamp = self.get_block_timestamp();
        i32::from(time_lock > current_timestamp)
    }

    fn clear_storage_lock(&mut self, key_offset: i32, key_length: i32) -> i32 {
        self.set_storage_lock(key_offset, key_length, 0)
    }

    fn get_caller(&mut self, result_offset: i32) {
        let caller = self.runtime.vm_input().caller_addr.to_vec();

        if let Err(err) = self.runtime.mem_store(result_offset, &caller) {
            self.fault(&err);
            return;
        }

        let gas = self.metering.gas_schedule().api_cost.get_caller;
        self.charge(gas);
    }

    fn get_call_value(&mut self, result_offset: i32) -> i32 {
        let (_, value) = self.runtime.vm_input().call_value.to_bytes_be();
        let value = pad_bytes_left(&value, BALANCE_LEN);

        let gas = self.metering.gas_schedule().api_cost.get_call_value;
        self.charge(gas);

        if let Err(err) = self.runtime.mem_store(result_offset, &value) {
            self.fault(&err);
            return -1;
        }

        value.len() as i32
    }

    fn write_log(
        &mut self,
        data_pointer: i32,
        data_length: i32,
        topic_pointer: i32,
        num_topics: i32,
    ) {
        let data = match self.runtime.mem_load(data_pointer, data_length) {
            Ok(data) => data,
            Err(err) => {
                self.fault(&err);
                return;
            }
        };

        if num_topics < 0 {
            self.fault(&ExecutionError::NegativeLength);
            return;
        }

        let mut topics = Vec::with_capacity(num_topics as usize);
        for i in 0..num_topics {
            match self
                .runtime
                .mem_load(topic_pointer + i * HASH_LEN as i32, HASH_LEN as i32)
            {
                Ok(topic) => topics.push(topic),
                Err(err) => {
                    self.fault(&err);
                    return;
                }
            }
        }

        let address = *self.runtime.sc_address();
        self.output.write_log(&address, topics, data);

        let schedule = self.metering.gas_schedule();
        let gas = schedule.api_cost.log
            + schedule.base_operation_cost.persist_per_byte
                * (num_topics as u64 * HASH_LEN as u64 + data_length as u64);
        self.charge(gas);
    }

    fn finish(&mut self, data_offset: i32, length: i32) {
        let data = match self.runtime.mem_load(data_offset, length) {
            Ok(data) => data,
            Err(err) => {
                self.fault(&err);
                return;
            }
        };

        self.output.finish(data);

        let schedule = self.metering.gas_schedule();
        let gas = schedule.api_cost.finish
            + schedule.base_operation_cost.persist_per_byte * length as u64;
        self.charge(gas);
    }

    fn get_block_timestamp(&mut self) -> i64 {
        let gas = self.metering.gas_schedule().api_cost.get_block_timestamp;
        self.charge(gas);

        self.blockchain.current_time_stamp() as i64
    }

    fn get_block_nonce(&mut self) -> i64 {
        let gas = self.metering.gas_schedule().api_cost.get_block_nonce;
        self.charge(gas);

        self.blockchain.current_nonce() as i64
    }

    fn get_block_round(&mut self) -> i64 {
        let gas = self.metering.gas_schedule().api_cost.get_block_round;
        self.charge(gas);

        self.blockchain.current_round() as i64
    }

    fn get_block_epoch(&mut self) -> i64 {
        let gas = self.metering.gas_schedule().api_cost.get_block_epoch;
        self.charge(gas);

        i64::from(self.blockchain.current_epoch())
    }

    fn get_block_random_seed(&mut self, result_offset: i32) {
        let gas = self.metering.gas_schedule().api_cost.get_block_random_seed;
        self.charge(gas);

        let random_seed = self.blockchain.current_random_seed();
        if let Err(err) = self.runtime.mem_store(result_offset, &random_seed) {
            self.fault(&err);
        }
    }

    fn get_state_root_hash(&mut self, result_offset: i32) {
        let gas = self.metering.gas_schedule().api_cost.get_state_root_hash;
        self.charge(gas);

        let state_root = self.blockchain.get_state_root_hash();
        if let Err(err) = self.runtime.mem_store(result_offset, &state_root) {
            self.fault(&err);
        }
    }

    fn get_prev_block_timestamp(&mut self) -> i64 {
        let gas = self.metering.gas_schedule().api_cost.get_block_timestamp;
        self.charge(gas);

        self.blockchain.last_time_stamp() as i64
    }

    fn get_prev_block_nonce(&mut self) -> i64 {
        let gas = self.metering.gas_schedule().api_cost.get_block_nonce;
        self.charge(gas);

        self.blockchain.last_nonce() as i64
    }

    fn get_prev_block_round(&mut self) -> i64 {
        let gas = self.metering.gas_schedule().api_cost.get_block_round;
        self.charge(gas);

        self.blockchain.last_round() as i64
    }

    fn get_prev_block_epoch(&mut self) -> i64 {
        let gas = self.metering.gas_schedule().api_cost.get_block_epoch;
        self.charge(gas);

        i64::from(self.blockchain.last_epoch())
    }

    fn get_prev_block_random_seed(&mut self, result_offset: i32) {
        let gas = self.metering.gas_schedule().api_cost.get_block_random_seed;
        self.charge(gas);

        let random_seed = self.blockchain.last_random_seed();
        if let Err(err) = self.runtime.mem_store(result_offset, &random_seed) {
            self.fault(&err);
        }
    }

    fn get_original_tx_hash(&mut self, result_offset: i32) {
        let gas = self.metering.gas_schedule().api_cost.get_block_hash;
        self.charge(gas);

        let hash = self.runtime.original_tx_hash().to_vec();
        if let Err(err) = self.runtime.mem_store(result_offset, &hash) {
            self.fault(&err);
        }
    }

    fn execute_on_dest_context(
        &mut self,
        gas_limit: i64,
        address_offset: i32,
        value_offset: i32,
        function_offset: i32,
        function_length: i32,
        num_arguments: i32,
        arguments_length_offset: i32,
        data_offset: i32,
    ) -> i32 {
        let sender = *self.runtime.sc_address();
        let Ok(dest) = self.runtime.mem_load(address_offset, ADDRESS_LEN as i32) else {
            return 1;
        };
        let Ok(value) = self.runtime.mem_load(value_offset, BALANCE_LEN as i32) else {
            return 1;
        };
        let Ok((function, arguments, actual_length)) = self.get_arguments_from_memory(
            function_offset,
            function_length,
            num_arguments,
            arguments_length_offset,
            data_offset,
        ) else {
            return 1;
        };

        let schedule = self.metering.gas_schedule();
        let gas = schedule.api_cost.execute_on_dest_context
            + schedule.base_operation_cost.data_copy_per_byte * actual_length as u64;
        self.charge(gas);

        let call_input = ContractCallInput {
            vm_input: VMInput {
                caller_addr: sender,
                call_value: big_int_from_unsigned_bytes(&value),
                arguments,
                gas_price: 0,
                gas_provided: self.metering.bound_gas_limit(&self.runtime, gas_limit),
                ..VMInput::default()
            },
            recipient_addr: Address::left_padded(&dest),
            function,
        };

        match self.execute_on_dest_context_internal(call_input) {
            Ok(_) => 0,
            Err(_) => 1,
        }
    }

    fn execute_on_same_context(
        &mut self,
        gas_limit: i64,
        address_offset: i32,
        value_offset: i32,
        function_offset: i32,
        function_length: i32,
        num_arguments: i32,
        arguments_length_offset: i32,
        data_offset: i32,
    ) -> i32 {
        let sender = *self.runtime.sc_address();
        let Ok(dest) = self.runtime.mem_load(address_offset, ADDRESS_LEN as i32) else {
            return 1;
        };
        let Ok(value) = self.runtime.mem_load(value_offset, BALANCE_LEN as i32) else {
            return 1;
        };
        let Ok((function, arguments, actual_length)) = self.get_arguments_from_memory(
            function_offset,
            function_length,
            num_arguments,
            arguments_length_offset,
            data_offset,
        ) else {
            return 1;
        };

        let schedule = self.metering.gas_schedule();
        let gas = schedule.api_cost.execute_on_same_context
            + schedule.base_operation_cost.data_copy_per_byte * actual_length as u64;
        self.charge(gas);

        let call_input = ContractCallInput {
            vm_input: VMInput {
                caller_addr: sender,
                call_value: big_int_from_unsigned_bytes(&value),
                arguments,
                gas_price: 0,
                gas_provided: self.metering.bound_gas_limit(&self.runtime, gas_limit),
                ..VMInput::default()
            },
            recipient_addr: Address::left_padded(&dest),
            function,
        };

        match self.execute_on_same_context_internal(call_input) {
            Ok(()) => 0,
            Err(_) => 1,
        }
    }

    fn delegate_execution(
        &mut self,
        gas_limit: i64,
        address_offset: i32,
        function_offset: i32,
        function_length: i32,
        num_arguments: i32,
        arguments_length_offset: i32,
        data_offset: i32,
    ) -> i32 {
        let address = match self.runtime.mem_load(address_offset, ADDRESS_LEN as i32) {
            Ok(address) => address,
            Err(err) => {
                self.fault(&err);
                return 1;
            }
        };
        let (function, arguments, actual_length) = match self.get_arguments_from_memory(
            function_offset,
            function_length,
            num_arguments,
            arguments_length_offset,
            data_offset,
        ) {
            Ok(unpacked) => unpacked,
            Err(err) => {
                self.fault(&err);
                return 1;
            }
        };

        let value = self.runtime.vm_input().call_value.clone();
        let sender = self.runtime.vm_input().caller_addr;
        let address = Address::left_padded(&address);

        let schedule = self.metering.gas_schedule();
        let gas = schedule.api_cost.delegate_execution
            + schedule.base_operation_cost.data_copy_per_byte * actual_length as u64;
        self.charge(gas);

        if self
            .output
            .transfer(&address, &sender, 0, &value, &[])
            .is_err()
        {
            return 1;
        }

        let call_input = ContractCallInput {
            vm_input: VMInput {
                caller_addr: sender,
                call_value: value,
                arguments,
                gas_price: 0,
                gas_provided: self.metering.bound_gas_limit(&self.runtime, gas_limit),
                ..VMInput::default()
            },
            recipient_addr: address,
            function,
        };

        match self.execute_on_same_context_internal(call_input) {
            Ok(()) => 0,
            Err(_) => 1,
        }
    }

    fn execute_read_only(
        &mut self,
        gas_limit: i64,
        address_offset: i32,
        function_offset: i32,
        function_length: i32,
        num_arguments: i32,
        arguments_length_offset: i32,
        data_offset: i32,
    ) -> i32 {
        let address = match self.runtime.mem_load(address_offset, ADDRESS_LEN as i32) {
            Ok(address) => address,
            Err(err) => {
                self.fault(&err);
                return 1;
            }
        };
        let (function, arguments, actual_length) = match self.get_arguments_from_memory(
            function_offset,
            function_length,
            num_arguments,
            arguments_length_offset,
            data_offset,
        ) {
            Ok(unpacked) => unpacked,
            Err(err) => {
                self.fault(&err);
                return 1;
            }
        };

        let value = self.runtime.vm_input().call_value.clone();
        let sender = self.runtime.vm_input().caller_addr;
        let address = Address::left_padded(&address);

        let schedule = self.metering.gas_schedule();
        let gas = schedule.api_cost.execute_read_only
            + schedule.base_operation_cost.data_copy_per_byte * actual_length as u64;
        self.charge(gas);

        if self
            .output
            .transfer(&address, &sender, 0, &value, &[])
            .is_err()
        {
            return 1;
        }

        let call_input = ContractCallInput {
            vm_input: VMInput {
                caller_addr: sender,
                call_value: value,
                arguments,
                gas_price: 0,
                gas_provided: self.metering.bound_gas_limit(&self.runtime, gas_limit),
                ..VMInput::default()
            },
            recipient_addr: address,
            function,
        };

        self.runtime.set_read_only(true);
        let result = self.execute_on_same_context_internal(call_input);
        self.runtime.set_read_only(false);

        match result {
            Ok(()) => 0,
            Err(_) => 1,
        }
    }

    fn create_contract(
        &mut self,
        value_offset: i32,
        code_offset: i32,
        length: i32,
        result_offset: i32,
        num_arguments: i32,
        arguments_length_offset: i32,
        data_offset: i32,
    ) -> i32 {
        let sender = *self.runtime.sc_address();
        let value = match self.runtime.mem_load(value_offset, BALANCE_LEN as i32) {
            Ok(value) => value,
            Err(err) => {
                self.fault(&err);
                return 1;
            }
        };
        let code = match self.runtime.mem_load(code_offset, length) {
            Ok(code) => code,
            Err(err) => {
                self.fault(&err);
                return 1;
            }
        };
        let (_, arguments, actual_length) = match self.get_arguments_from_memory(
            0,
            0,
            num_arguments,
            arguments_length_offset,
            data_offset,
        ) {
            Ok(unpacked) => unpacked,
            Err(err) => {
                self.fault(&err);
                return 1;
            }
        };

        let schedule = self.metering.gas_schedule();
        let gas = schedule.api_cost.create_contract
            + schedule.base_operation_cost.data_copy_per_byte * actual_length as u64;
        self.charge(gas);
        let gas_limit = self.metering.gas_left(&self.runtime);

        let create_input = ContractCreateInput {
            vm_input: VMInput {
                caller_addr: sender,
                call_value: big_int_from_unsigned_bytes(&value),
                arguments,
                gas_price: 0,
                gas_provided: gas_limit,
                ..VMInput::default()
            },
            contract_code: code,
            contract_code_metadata: vec![1, 0],
        };

        let new_address = match self.create_new_contract(create_input) {
            Ok(new_address) => new_address,
            Err(_) => return 1,
        };

        if let Err(err) = self.runtime.mem_store(result_offset, new_address.as_bytes()) {
            self.fault(&err);
            return 1;
        }

        0
    }

    fn get_num_return_data(&mut self) -> i32 {
        let gas = self.metering.gas_schedule().api_cost.get_num_return_data;
        self.charge(gas);

        self.output.return_data().len() as i32
    }

    fn get_return_data_size(&mut self, result_id: i32) -> i32 {
        let gas = self.metering.gas_schedule().api_cost.get_return_data_size;
        self.charge(gas);

        let return_data = self.output.return_data();
        if result_id < 0 || result_id as usize >= return_data.len() {
            return 0;
        }

        return_data[result_id as usize].len() as i32
    }

    fn get_return_data(&mut self, result_id: i32, data_offset: i32) -> i32 {
        let gas = self.metering.gas_schedule().api_cost.get_return_data;
        self.charge(gas);

        let return_data = self.output.return_data();
        if result_id < 0 || result_id as usize >= return_data.len() {
            return 0;
        }

        let data = return_data[result_id as usize].clone();
        if let Err(err) = self.runtime.mem_store(data_offset, &data) {
            self.fault(&err);
            return 0;
        }

        data.len() as i32
    }

    fn int64_get_argument(&mut self, id: i32) -> i64 {
        let gas = self.metering.gas_schedule().api_cost.int64_get_argument;
        self.charge(gas);

        let arguments = self.runtime.arguments();
        if id < 0 || id as usize >= arguments.len() {
            self.fault(&ExecutionError::ArgIndexOutOfRange);
            return 0;
        }

        let argument = crate::contexts::bigint::big_int_from_signed_bytes(&arguments[id as usize]);
        match argument.to_i64() {
            Some(value) => value,
            None => {
                self.fault(&ExecutionError::ArgOutOfRange);
                0
            }
        }
    }

    fn int64_storage_store(&mut self, key_offset: i32, key_length: i32, value: i64) -> i32 {
        let key = match self.runtime.mem_load(key_offset, key_length) {
            Ok(key) => key,
            Err(err) => {
                self.fault(&err);
                return -1;
            }
        };

        let gas = self.metering.gas_schedule().api_cost.int64_storage_store;
        self.charge(gas);

        let data = Self::int64_to_storage_bytes(value);
        match self
            .storage
            .set(&key, &data, &self.runtime, &self.metering, &mut self.output)
        {
            Ok(status) => status as i32,
            Err(err) => {
                self.fault(&err);
                -1
            }
        }
    }

    fn int64_storage_load(&mut self, key_offset: i32, key_length: i32) -> i64 {
        let key = match self.runtime.mem_load(key_offset, key_length) {
            Ok(key) => key,
            Err(err) => {
                self.fault(&err);
                return 0;
            }
        };

        let data = self.storage.get(&key, &mut self.output);

        let gas = self.metering.gas_schedule().api_cost.int64_storage_load;
        self.charge(gas);

        big_int_from_unsigned_bytes(&data).to_i64().unwrap_or(0)
    }

    fn int64_finish(&mut self, value: i64) {
        let value_bytes = big_int_to_signed_bytes(&BigInt::from(value));
        self.output.finish(value_bytes);

        let gas = self.metering.gas_schedule().api_cost.int64_finish;
        self.charge(gas);
    }

    fn current_breakpoint(&self) -> u64 {
        self.runtime.get_runtime_breakpoint() as u64
    }
}
