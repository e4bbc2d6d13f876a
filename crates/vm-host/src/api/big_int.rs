//! The big-int EI family: handle-addressed arbitrary-precision arithmetic
//! for contracts, backed by the big-int context arena.

use crate::contexts::bigint::{
    big_int_from_signed_bytes, big_int_from_unsigned_bytes, big_int_to_signed_bytes,
    big_int_to_unsigned_bytes,
};
use crate::errors::ExecutionError;
use crate::host::VmHost;
use num_bigint::BigInt;
use num_traits::{Signed, ToPrimitive, Zero};
use vm_common::{Address, ADDRESS_LEN};

/// Arbitrary-precision integer host functions.
#[allow(missing_docs)]
pub trait BigIntApi {
    fn big_int_new(&mut self, initial: i64) -> i32;
    fn big_int_byte_length(&mut self, handle: i32) -> i32;
    fn big_int_get_bytes(&mut self, handle: i32, result_offset: i32) -> i32;
    fn big_int_set_bytes(&mut self, handle: i32, byte_offset: i32, byte_length: i32);
    fn big_int_get_signed_bytes(&mut self, handle: i32, result_offset: i32) -> i32;
    fn big_int_set_signed_bytes(&mut self, handle: i32, byte_offset: i32, byte_length: i32);
    fn big_int_is_int64(&mut self, handle: i32) -> i32;
    fn big_int_get_int64(&mut self, handle: i32) -> i64;
    fn big_int_set_int64(&mut self, handle: i32, value: i64);
    fn big_int_add(&mut self, destination: i32, op1: i32, op2: i32);
    fn big_int_sub(&mut self, destination: i32, op1: i32, op2: i32);
    fn big_int_mul(&mut self, destination: i32, op1: i32, op2: i32);
    fn big_int_cmp(&mut self, op1: i32, op2: i32) -> i32;
    fn big_int_sign(&mut self, op: i32) -> i32;
    fn big_int_finish(&mut self, handle: i32);
    fn big_int_storage_store(&mut self, key_offset: i32, key_length: i32, handle: i32) -> i32;
    fn big_int_storage_load(&mut self, key_offset: i32, key_length: i32, handle: i32) -> i32;
    fn big_int_get_argument(&mut self, id: i32, handle: i32);
    fn big_int_get_call_value(&mut self, handle: i32);
    fn big_int_get_external_balance(&mut self, address_offset: i32, handle: i32);
}

impl BigIntApi for VmHost {
    fn big_int_new(&mut self, initial: i64) -> i32 {
        let gas = self.metering.gas_schedule().big_int_api_cost.big_int_new;
        self.charge(gas);

        self.big_int.put(BigInt::from(initial))
    }

    fn big_int_byte_length(&mut self, handle: i32) -> i32 {
        let gas = self
            .metering
            .gas_schedule()
            .big_int_api_cost
            .big_int_byte_length;
        self.charge(gas);

        let value = self.big_int.get(handle);
        big_int_to_unsigned_bytes(&value).len() as i32
    }

    fn big_int_get_bytes(&mut self, handle: i32, result_offset: i32) -> i32 {
        let value = self.big_int.get(handle);
        let bytes = big_int_to_unsigned_bytes(&value);

        let schedule = self.metering.gas_schedule();
        let gas = schedule.big_int_api_cost.big_int_get_bytes
            + schedule.base_operation_cost.data_copy_per_byte * bytes.len() as u64;
        self.charge(gas);

        if let Err(err) = self.runtime.mem_store(result_offset, &bytes) {
            self.fault(&err);
            return 0;
        }

        bytes.len() as i32
    }

    fn big_int_set_bytes(&mut self, handle: i32, byte_offset: i32, byte_length: i32) {
        let bytes = match self.runtime.mem_load(byte_offset, byte_length) {
            Ok(bytes) => bytes,
            Err(err) => {
                self.fault(&err);
                return;
            }
        };

        let schedule = self.metering.gas_schedule();
        let gas = schedule.big_int_api_cost.big_int_set_bytes
            + schedule.base_operation_cost.data_copy_per_byte * bytes.len() as u64;
        self.charge(gas);

        self.big_int.set(handle, big_int_from_unsigned_bytes(&bytes));
    }

    fn big_int_get_signed_bytes(&mut self, handle: i32, result_offset: i32) -> i32 {
        let value = self.big_int.get(handle);
        let bytes = big_int_to_signed_bytes(&value);

        let schedule = self.metering.gas_schedule();
        let gas = schedule.big_int_api_cost.big_int_get_bytes
            + schedule.base_operation_cost.data_copy_per_byte * bytes.len() as u64;
        self.charge(gas);

        if let Err(err) = self.runtime.mem_store(result_offset, &bytes) {
            self.fault(&err);
            return 0;
        }

        bytes.len() as i32
    }

    fn big_int_set_signed_bytes(&mut self, handle: i32, byte_offset: i32, byte_length: i32) {
        let bytes = match self.runtime.mem_load(byte_offset, byte_length) {
            Ok(bytes) => bytes,
            Err(err) => {
                self.fault(&err);
                return;
            }
        };

        let schedule = self.metering.gas_schedule();
        let gas = schedule.big_int_api_cost.big_int_set_bytes
            + schedule.base_operation_cost.data_copy_per_byte * bytes.len() as u64;
        self.charge(gas);

        self.big_int.set(handle, big_int_from_signed_bytes(&bytes));
    }

    fn big_int_is_int64(&mut self, handle: i32) -> i32 {
        let gas = self
            .metering
            .gas_schedule()
            .big_int_api_cost
            .big_int_is_int64;
        self.charge(gas);

        i32::from(self.big_int.get(handle).to_i64().is_some())
    }

    fn big_int_get_int64(&mut self, handle: i32) -> i64 {
        let gas = self
            .metering
            .gas_schedule()
            .big_int_api_cost
            .big_int_get_int64;
        self.charge(gas);

        match self.big_int.get(handle).to_i64() {
            Some(value) => value,
            None => {
                self.fault(&ExecutionError::ArgOutOfRange);
                0
            }
        }
    }

    fn big_int_set_int64(&mut self, handle: i32, value: i64) {
        let gas = self
            .metering
            .gas_schedule()
            .big_int_api_cost
            .big_int_set_int64;
        self.charge(gas);

        self.big_int.set(handle, BigInt::from(value));
    }

    fn big_int_add(&mut self, destination: i32, op1: i32, op2: i32) {
        let gas = self.metering.gas_schedule().big_int_api_cost.big_int_add;
        self.charge(gas);

        let result = self.big_int.get(op1) + self.big_int.get(op2);
        self.big_int.set(destination, result);
    }

    fn big_int_sub(&mut self, destination: i32, op1: i32, op2: i32) {
        let gas = self.metering.gas_schedule().big_int_api_cost.big_int_sub;
        self.charge(gas);

        let result = self.big_int.get(op1) - self.big_int.get(op2);
        self.big_int.set(destination, result);
    }

    fn big_int_mul(&mut self, destination: i32, op1: i32, op2: i32) {
        let gas = self.metering.gas_schedule().big_int_api_cost.big_int_mul;
        self.charge(gas);

        let result = self.big_int.get(op1) * self.big_int.get(op2);
        self.big_int.set(destination, result);
    }

    fn big_int_cmp(&mut self, op1: i32, op2: i32) -> i32 {
        let gas = self.metering.gas_schedule().big_int_api_cost.big_int_cmp;
        self.charge(gas);

        match self.big_int.get(op1).cmp(&self.big_int.get(op2)) {
            std::cmp::Ordering::Less => -1,
            std::cmp::Ordering::Equal => 0,
            std::cmp::Ordering::Greater => 1,
        }
    }

    fn big_int_sign(&mut self, op: i32) -> i32 {
        let gas = self.metering.gas_schedule().big_int_api_cost.big_int_sign;
        self.charge(gas);

        let value = self.big_int.get(op);
        if value.is_zero() {
            0
        } else if value.is_negative() {
            -1
        } else {
            1
        }
    }

    fn big_int_finish(&mut self, handle: i32) {
        let value = self.big_int.get(handle);
        let bytes = big_int_to_signed_bytes(&value);

        let schedule = self.metering.gas_schedule();
        let gas = schedule.big_int_api_cost.big_int_finish
            + schedule.base_operation_cost.data_copy_per_byte * bytes.len() as u64;
        self.charge(gas);

        self.output.finish(bytes);
    }

    fn big_int_storage_store(&mut self, key_offset: i32, key_length: i32, handle: i32) -> i32 {
        let key = match self.runtime.mem_load(key_offset, key_length) {
            Ok(key) => key,
            Err(err) => {
                self.fault(&err);
                return -1;
            }
        };

        let gas = self
            .metering
            .gas_schedule()
            .big_int_api_cost
            .big_int_storage_store;
        self.charge(gas);

        let value = self.big_int.get(handle);
        let bytes = big_int_to_unsigned_bytes(&value);
        match self
            .storage
            .set(&key, &bytes, &self.runtime, &self.metering, &mut self.output)
        {
            Ok(status) => status as i32,
            Err(err) => {
                self.fault(&err);
                -1
            }
        }
    }

    fn big_int_storage_load(&mut self, key_offset: i32, key_length: i32, handle: i32) -> i32 {
        let key = match self.runtime.mem_load(key_offset, key_length) {
            Ok(key) => key,
            Err(err) => {
                self.fault(&err);
                return -1;
            }
        };

        let gas = self
            .metering
            .gas_schedule()
            .big_int_api_cost
            .big_int_storage_load;
        self.charge(gas);

        let data = self.storage.get(&key, &mut self.output);
        self.big_int.set(handle, big_int_from_unsigned_bytes(&data));
        data.len() as i32
    }

    fn big_int_get_argument(&mut self, id: i32, handle: i32) {
        let gas = self
            .metering
            .gas_schedule()
            .big_int_api_cost
            .big_int_get_argument;
        self.charge(gas);

        let arguments = self.runtime.arguments();
        if id < 0 || id as usize >= arguments.len() {
            self.fault(&ExecutionError::ArgIndexOutOfRange);
            return;
        }

        let value = big_int_from_unsigned_bytes(&arguments[id as usize]);
        self.big_int.set(handle, value);
    }

    fn big_int_get_call_value(&mut self, handle: i32) {
        let gas = self
            .metering
            .gas_schedule()
            .big_int_api_cost
            .big_int_get_call_value;
        self.charge(gas);

        let value = self.runtime.vm_input().call_value.clone();
        self.big_int.set(handle, value);
    }

    fn big_int_get_external_balance(&mut self, address_offset: i32, handle: i32) {
        let address = match self.runtime.mem_load(address_offset, ADDRESS_LEN as i32) {
            Ok(address) => address,
            Err(err) => {
                self.fault(&err);
                return;
            }
        };

        let gas = self
            .metering
            .gas_schedule()
            .big_int_api_cost
            .big_int_get_external_balance;
        self.charge(gas);

        let balance = self
            .blockchain
            .get_balance_big_int(&Address::left_padded(&address), &mut self.output);
        self.big_int.set(handle, balance);
    }
}
