//! Shared fixtures for the host test suite: an assembled world + host
//! pair, and the scenario contracts (counter, token, recursive forwarder,
//! storer) written as mock-engine modules against the EI.

use num_bigint::BigInt;
use std::rc::Rc;
use vm_common::{
    Address, BlockchainHook, ContractCallInput, ContractCreateInput, CryptoHook, ReturnCode,
    VMInput, VMOutput,
};
use vm_host::errors::EngineError;
use vm_host::gas::GasSchedule;
use vm_host::prelude::*;

/// Gas given to every top-level call in the scenarios.
pub const GAS_PROVIDED: u64 = 1_000_000;

/// The protocol-reserved storage key prefix used by the suite.
pub const RESERVED_PREFIX: &[u8] = b"PROTECTED";

// =============================================================================
// TEST HOST ASSEMBLY
// =============================================================================

/// A host wired to an in-memory world and a mock engine.
pub struct TestSetup {
    /// The engine contracts are registered on.
    pub engine: Rc<MockEngine>,
    /// The backing world state.
    pub world: Rc<InMemoryWorld>,
    /// The host under test.
    pub host: VmHost,
}

impl TestSetup {
    /// Builds a host over a fresh world with the test gas schedule.
    #[must_use]
    pub fn new() -> Self {
        Self::with_schedule(GasSchedule::test_schedule())
    }

    /// Builds a host over a fresh world with a custom gas schedule.
    #[must_use]
    pub fn with_schedule(gas_schedule: GasSchedule) -> Self {
        let engine = Rc::new(MockEngine::new());
        let world = Rc::new(InMemoryWorld::new());

        let parameters = VmHostParameters {
            gas_schedule,
            ..VmHostParameters::for_tests(RESERVED_PREFIX)
        };
        let host = VmHost::new(
            Rc::clone(&engine) as Rc<dyn Engine>,
            Rc::clone(&world) as Rc<dyn BlockchainHook>,
            Rc::new(DefaultCryptoHook) as Rc<dyn CryptoHook>,
            parameters,
        )
        .expect("host setup");

        Self {
            engine,
            world,
            host,
        }
    }

    /// Adds a plain account with the given balance.
    pub fn add_account(&self, address: Address, balance: i64) {
        self.world.add_account(WorldAccount {
            address,
            balance: BigInt::from(balance),
            ..WorldAccount::default()
        });
    }

    /// Deploys registered contract code from `caller` and applies the
    /// output to the world. The caller's nonce is bumped first, the way
    /// the node accounts for the deploy transaction. Returns the output
    /// and the deployed address.
    pub fn deploy(
        &mut self,
        caller: Address,
        code: &[u8],
        arguments: Vec<Vec<u8>>,
    ) -> (VMOutput, Address) {
        let mut creator = self.world.account(&caller).unwrap_or(WorldAccount {
            address: caller,
            ..WorldAccount::default()
        });
        creator.nonce += 1;
        let derivation_nonce = creator.nonce - 1;
        self.world.add_account(creator);

        let address = InMemoryWorld::derive_address(
            &caller,
            derivation_nonce,
            &VmHostParameters::for_tests(RESERVED_PREFIX).vm_type,
        );

        let input = ContractCreateInput {
            vm_input: VMInput {
                caller_addr: caller,
                arguments,
                gas_provided: GAS_PROVIDED,
                ..VMInput::default()
            },
            contract_code: code.to_vec(),
            contract_code_metadata: vec![1, 0],
        };

        let output = self.host.run_smart_contract_create(input).expect("deploy");
        if output.return_code == ReturnCode::Ok {
            self.world.apply_output(&output);
        }
        (output, address)
    }

    /// Calls `function` on a deployed contract and applies successful
    /// output to the world.
    pub fn call(
        &mut self,
        caller: Address,
        contract: Address,
        function: &str,
        arguments: Vec<Vec<u8>>,
    ) -> VMOutput {
        let input = ContractCallInput {
            vm_input: VMInput {
                caller_addr: caller,
                arguments,
                gas_provided: GAS_PROVIDED,
                ..VMInput::default()
            },
            recipient_addr: contract,
            function: function.to_string(),
        };

        let output = self.host.run_smart_contract_call(input).expect("call");
        if output.return_code == ReturnCode::Ok {
            self.world.apply_output(&output);
        }
        output
    }
}

impl Default for TestSetup {
    fn default() -> Self {
        Self::new()
    }
}

/// A 32-byte address from a short tag.
#[must_use]
pub fn addr(tag: &[u8]) -> Address {
    Address::left_padded(tag)
}

// =============================================================================
// COUNTER CONTRACT
// =============================================================================

/// The counter's storage key: `mycounter` zero-padded to 32 bytes, laid
/// out as a data segment at offset 0.
pub const COUNTER_KEY_LEN: i32 = 32;

/// A counter: `init` stores 1, `increment` adds 1 and returns the new
/// value, `get` returns the current value.
#[must_use]
pub fn counter_module() -> MockModule {
    let mut module = MockModule::new(1);
    module.data(0, b"mycounter");

    module.export("init", |host| {
        host.int64_storage_store(0, COUNTER_KEY_LEN, 1);
        check_breakpoint(host)
    });

    module.export("increment", |host| {
        let value = host.int64_storage_load(0, COUNTER_KEY_LEN);
        check_breakpoint(host)?;
        host.int64_storage_store(0, COUNTER_KEY_LEN, value + 1);
        check_breakpoint(host)?;
        host.int64_finish(value + 1);
        check_breakpoint(host)
    });

    module.export("get", |host| {
        let value = host.int64_storage_load(0, COUNTER_KEY_LEN);
        check_breakpoint(host)?;
        host.int64_finish(value);
        check_breakpoint(host)
    });

    module
}

// =============================================================================
// TOKEN CONTRACT
// =============================================================================

// Memory layout of the token contract:
//   0..7    b"balance"            (caller key prefix)
//   7..39   caller address        (written by getCaller)
//   57..64  b"balance"            (other-account key prefix)
//   64..96  argument 0 address    (written by getArgument)
const TOKEN_KEY_LEN: i32 = 39;
const CALLER_KEY: i32 = 0;
const OTHER_KEY: i32 = 57;
const OTHER_ADDRESS: i32 = 64;

/// A fungible token: `init` credits the deployer with the total supply
/// (argument 0), `transferToken(to, amount)` moves balances,
/// `balanceOf(who)` returns a balance.
#[must_use]
pub fn token_module() -> MockModule {
    let mut module = MockModule::new(1);
    module.data(CALLER_KEY as u32, b"balance");
    module.data(OTHER_KEY as u32, b"balance");
    module.data(128, b"insufficient funds");

    module.export("init", |host| {
        host.get_caller(CALLER_KEY + 7);
        check_breakpoint(host)?;
        let supply = host.int64_get_argument(0);
        check_breakpoint(host)?;
        host.int64_storage_store(CALLER_KEY, TOKEN_KEY_LEN, supply);
        check_breakpoint(host)
    });

    module.export("transferToken", |host| {
        host.get_caller(CALLER_KEY + 7);
        check_breakpoint(host)?;
        host.get_argument(0, OTHER_ADDRESS);
        check_breakpoint(host)?;
        let amount = host.int64_get_argument(1);
        check_breakpoint(host)?;

        let sender_balance = host.int64_storage_load(CALLER_KEY, TOKEN_KEY_LEN);
        check_breakpoint(host)?;
        if sender_balance < amount {
            host.signal_error(128, 18);
            return check_breakpoint(host);
        }

        host.int64_storage_store(CALLER_KEY, TOKEN_KEY_LEN, sender_balance - amount);
        check_breakpoint(host)?;
        let recipient_balance = host.int64_storage_load(OTHER_KEY, TOKEN_KEY_LEN);
        check_breakpoint(host)?;
        host.int64_storage_store(OTHER_KEY, TOKEN_KEY_LEN, recipient_balance + amount);
        check_breakpoint(host)
    });

    module.export("balanceOf", |host| {
        host.get_argument(0, OTHER_ADDRESS);
        check_breakpoint(host)?;
        let balance = host.int64_storage_load(OTHER_KEY, TOKEN_KEY_LEN);
        check_breakpoint(host)?;
        host.int64_finish(balance);
        check_breakpoint(host)
    });

    module
}

// =============================================================================
// RECURSIVE FORWARDER CONTRACT
// =============================================================================

/// A contract whose `recurse` export calls itself on the destination
/// context with all remaining gas, trapping when the nested call fails.
#[must_use]
pub fn forwarder_module() -> MockModule {
    let mut module = MockModule::new(1);
    // Function name at 0, own address written at 32, zero value at 64.
    module.data(0, b"recurse");

    module.export("recurse", |host| {
        host.get_sc_address(32);
        check_breakpoint(host)?;
        let gas = host.get_gas_left();
        check_breakpoint(host)?;

        let result = host.execute_on_dest_context(gas, 32, 64, 0, 7, 0, 0, 0);
        check_breakpoint(host)?;
        if result != 0 {
            return Err(EngineError::Trap("recursion failed".to_string()));
        }
        Ok(())
    });

    module
}

// =============================================================================
// STORER CONTRACT
// =============================================================================

/// A contract exercising the storage cost classes: `store10` writes ten
/// bytes under key `K`, `storeEmpty` deletes them, `storeReserved`
/// attempts a write under the protocol-reserved prefix and propagates the
/// rejection as a user error.
#[must_use]
pub fn storer_module() -> MockModule {
    let mut module = MockModule::new(1);
    module.data(0, b"K");
    module.data(32, &[7u8; 10]);
    module.data(64, b"PROTECTEDx");
    module.data(96, b"y");
    module.data(128, b"reserved key refused");

    module.export("store10", |host| {
        host.storage_store(0, 1, 32, 10);
        check_breakpoint(host)
    });

    module.export("storeEmpty", |host| {
        host.storage_store(0, 1, 32, 0);
        check_breakpoint(host)
    });

    module.export("storeReserved", |host| {
        let status = host.storage_store(64, 10, 96, 1);
        if status < 0 {
            host.signal_error(128, 20);
        }
        check_breakpoint(host)
    });

    module
}

// =============================================================================
// READ-ONLY PAIR
// =============================================================================

/// The written half of the read-only pair: `write` stores ten bytes under
/// key `K` and returns the storage status.
#[must_use]
pub fn writer_module() -> MockModule {
    let mut module = MockModule::new(1);
    module.data(0, b"K");
    module.data(32, &[9u8; 10]);

    module.export("write", |host| {
        let status = host.storage_store(0, 1, 32, 10);
        check_breakpoint(host)?;
        host.int64_finish(i64::from(status));
        check_breakpoint(host)
    });

    module
}

/// The reading half: `readOnlyWrite(target)` runs the writer's `write`
/// under the read-only flag.
#[must_use]
pub fn reader_module() -> MockModule {
    let mut module = MockModule::new(1);
    module.data(0, b"write");

    module.export("readOnlyWrite", |host| {
        host.get_argument(0, 32);
        check_breakpoint(host)?;
        let gas = host.get_gas_left();
        check_breakpoint(host)?;

        let result = host.execute_read_only(gas, 32, 0, 5, 0, 0, 0);
        check_breakpoint(host)?;
        if result != 0 {
            return Err(EngineError::Trap("read-only call failed".to_string()));
        }
        Ok(())
    });

    module
}

// =============================================================================
// ASYNC PAIR
// =============================================================================

/// The destination half of the async pair: `ping` returns 7.
#[must_use]
pub fn ponger_module() -> MockModule {
    let mut module = MockModule::new(1);
    module.export("ping", |host| {
        host.int64_finish(7);
        check_breakpoint(host)
    });
    module
}

/// The initiating half: `start(target)` registers an async call of the
/// target's `ping`; `callBack` records that it ran by returning 42.
#[must_use]
pub fn starter_module() -> MockModule {
    let mut module = MockModule::new(1);
    module.data(0, b"ping");

    module.export("start", |host| {
        host.get_argument(0, 32);
        check_breakpoint(host)?;
        // Zero call value at 64, call data "ping" at 0.
        host.async_call(32, 64, 0, 4);
        check_breakpoint(host)
    });

    module.export("callBack", |host| {
        host.int64_finish(42);
        check_breakpoint(host)
    });

    module
}

// =============================================================================
// PAYER CONTRACT
// =============================================================================

/// A contract moving its own funds: `pay(to)` transfers 10 units,
/// `overpay(to)` attempts 1000 and propagates the rejection.
#[must_use]
pub fn payer_module() -> MockModule {
    let mut module = MockModule::new(1);
    // 32-byte big-endian value 10 ending at offset 96, value 1000 ending
    // at offset 160.
    module.data(95, &[10]);
    module.data(158, &[0x03, 0xe8]);
    module.data(192, b"transfer refused");

    module.export("pay", |host| {
        host.get_argument(0, 32);
        check_breakpoint(host)?;
        let result = host.transfer_value(32, 64, 0, 0);
        check_breakpoint(host)?;
        if result != 0 {
            host.signal_error(192, 16);
        }
        check_breakpoint(host)
    });

    module.export("overpay", |host| {
        host.get_argument(0, 32);
        check_breakpoint(host)?;
        let result = host.transfer_value(32, 128, 0, 0);
        check_breakpoint(host)?;
        if result != 0 {
            host.signal_error(192, 16);
        }
        check_breakpoint(host)
    });

    module
}
