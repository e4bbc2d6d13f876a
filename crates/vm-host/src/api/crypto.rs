//! The crypto EI family: hash primitives over contract-supplied data.

use crate::host::VmHost;

/// Hash host functions.
#[allow(missing_docs)]
pub trait CryptoApi {
    fn sha256(&mut self, data_offset: i32, length: i32, result_offset: i32) -> i32;
    fn keccak256(&mut self, data_offset: i32, length: i32, result_offset: i32) -> i32;
}

impl CryptoApi for VmHost {
    fn sha256(&mut self, data_offset: i32, length: i32, result_offset: i32) -> i32 {
        let data = match self.runtime.mem_load(data_offset, length) {
            Ok(data) => data,
            Err(err) => {
                self.fault(&err);
                return 1;
            }
        };

        let schedule = self.metering.gas_schedule();
        let gas = schedule.crypto_api_cost.sha256
            + schedule.base_operation_cost.data_copy_per_byte * length as u64;
        self.charge(gas);

        let hash = self.crypto_hook.sha256(&data);
        if let Err(err) = self.runtime.mem_store(result_offset, hash.as_bytes()) {
            self.fault(&err);
            return 1;
        }

        0
    }

    fn keccak256(&mut self, data_offset: i32, length: i32, result_offset: i32) -> i32 {
        let data = match self.runtime.mem_load(data_offset, length) {
            Ok(data) => data,
            Err(err) => {
                self.fault(&err);
                return 1;
            }
        };

        let schedule = self.metering.gas_schedule();
        let gas = schedule.crypto_api_cost.keccak256
            + schedule.base_operation_cost.data_copy_per_byte * length as u64;
        self.charge(gas);

        let hash = self.crypto_hook.keccak256(&data);
        if let Err(err) = self.runtime.mem_store(result_offset, hash.as_bytes()) {
            self.fault(&err);
            return 1;
        }

        0
    }
}
