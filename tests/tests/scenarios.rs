//! End-to-end scenarios: deploy/call/upgrade flows chained through the
//! in-memory world the way a node would drive them.

use vm_common::ReturnCode;
use vm_host::gas::{BaseOperationCost, GasSchedule};
use vm_tests::*;

const COUNTER_CODE: &[u8] = b"counter-contract";
const TOKEN_CODE: &[u8] = b"token-contract";
const FORWARDER_CODE: &[u8] = b"forwarder-contract";
const STORER_CODE: &[u8] = b"storer-contract";

// =============================================================================
// COUNTER
// =============================================================================

#[test]
fn test_counter_deploy_increment_get() {
    let mut setup = TestSetup::new();
    setup.engine.register_contract(COUNTER_CODE, counter_module());

    let (output, counter) = setup.deploy(addr(b"alice"), COUNTER_CODE, vec![]);
    assert_eq!(output.return_code, ReturnCode::Ok, "{}", output.return_message);

    // init stored 1.
    let output = setup.call(addr(b"alice"), counter, "get", vec![]);
    assert_eq!(output.return_code, ReturnCode::Ok);
    assert_eq!(output.return_data, vec![vec![1]]);

    let output = setup.call(addr(b"alice"), counter, "increment", vec![]);
    assert_eq!(output.return_code, ReturnCode::Ok);
    assert_eq!(output.return_data, vec![vec![2]]);

    let output = setup.call(addr(b"alice"), counter, "get", vec![]);
    assert_eq!(output.return_data, vec![vec![2]]);
}

// =============================================================================
// TOKEN TRANSFERS
// =============================================================================

#[test]
fn test_token_transfers() {
    let mut setup = TestSetup::new();
    setup.engine.register_contract(TOKEN_CODE, token_module());

    // alice deploys with total supply 0x64 = 100.
    let (output, token) = setup.deploy(addr(b"alice"), TOKEN_CODE, vec![vec![0x64]]);
    assert_eq!(output.return_code, ReturnCode::Ok, "{}", output.return_message);

    let transfers = [
        (addr(b"alice"), addr(b"alice"), 10u8),
        (addr(b"alice"), addr(b"bob"), 10),
        (addr(b"alice"), addr(b"carol"), 10),
        (addr(b"bob"), addr(b"carol"), 5),
    ];
    for (from, to, amount) in transfers {
        let output = setup.call(
            from,
            token,
            "transferToken",
            vec![to.to_vec(), vec![amount]],
        );
        assert_eq!(output.return_code, ReturnCode::Ok, "{}", output.return_message);
    }

    let balances = [
        (addr(b"alice"), vec![80u8]),
        (addr(b"bob"), vec![5]),
        (addr(b"carol"), vec![15]),
    ];
    for (who, expected) in balances {
        let output = setup.call(addr(b"alice"), token, "balanceOf", vec![who.to_vec()]);
        assert_eq!(output.return_code, ReturnCode::Ok);
        assert_eq!(output.return_data, vec![expected], "balance of {who}");
    }
}

#[test]
fn test_token_rejects_overspend() {
    let mut setup = TestSetup::new();
    setup.engine.register_contract(TOKEN_CODE, token_module());
    let (_, token) = setup.deploy(addr(b"alice"), TOKEN_CODE, vec![vec![0x64]]);

    // bob holds nothing.
    let output = setup.call(
        addr(b"bob"),
        token,
        "transferToken",
        vec![addr(b"carol").to_vec(), vec![1]],
    );
    assert_eq!(output.return_code, ReturnCode::UserError);
    assert_eq!(output.return_message, "insufficient funds");
}

// =============================================================================
// UPGRADE
// =============================================================================

#[test]
fn test_upgrade_counter_to_token() {
    let mut setup = TestSetup::new();
    setup.engine.register_contract(COUNTER_CODE, counter_module());
    setup.engine.register_contract(TOKEN_CODE, token_module());

    let owner = addr(b"owner");
    let (output, contract) = setup.deploy(owner, COUNTER_CODE, vec![]);
    assert_eq!(output.return_code, ReturnCode::Ok);

    let output = setup.call(owner, contract, "increment", vec![]);
    assert_eq!(output.return_data, vec![vec![2]]);

    // Upgrade in place to the token with supply 100.
    let output = setup.call(
        owner,
        contract,
        "upgrade",
        vec![TOKEN_CODE.to_vec(), vec![1, 0], vec![0x64]],
    );
    assert_eq!(output.return_code, ReturnCode::Ok, "{}", output.return_message);

    let output = setup.call(
        owner,
        contract,
        "transferToken",
        vec![addr(b"bob").to_vec(), vec![10]],
    );
    assert_eq!(output.return_code, ReturnCode::Ok, "{}", output.return_message);

    let output = setup.call(owner, contract, "balanceOf", vec![owner.to_vec()]);
    assert_eq!(output.return_data, vec![vec![90]]);
    let output = setup.call(owner, contract, "balanceOf", vec![addr(b"bob").to_vec()]);
    assert_eq!(output.return_data, vec![vec![10]]);

    // The old entry points are gone after the upgrade.
    let output = setup.call(owner, contract, "increment", vec![]);
    assert_eq!(output.return_code, ReturnCode::FunctionNotFound);
}

#[test]
fn test_upgrade_with_too_few_arguments() {
    let mut setup = TestSetup::new();
    setup.engine.register_contract(COUNTER_CODE, counter_module());
    let (_, contract) = setup.deploy(addr(b"owner"), COUNTER_CODE, vec![]);

    let output = setup.call(
        addr(b"owner"),
        contract,
        "upgrade",
        vec![TOKEN_CODE.to_vec()],
    );
    assert_eq!(output.return_code, ReturnCode::UserError);
    assert_eq!(output.return_message, "invalid arguments to upgrade");
}

// =============================================================================
// RESERVED KEY
// =============================================================================

#[test]
fn test_reserved_key_write_is_refused() {
    let mut setup = TestSetup::new();
    setup.engine.register_contract(STORER_CODE, storer_module());
    let (_, storer) = setup.deploy(addr(b"alice"), STORER_CODE, vec![]);

    let output = setup.call(addr(b"alice"), storer, "storeReserved", vec![]);
    assert_eq!(output.return_code, ReturnCode::UserError);
    assert_eq!(output.return_message, "reserved key refused");
    // The fault drained the remaining gas.
    assert_eq!(output.gas_remaining, 0);
    // A failed call surfaces no staged state.
    assert!(output.output_accounts.is_empty());
    assert!(setup.world.storage_of(&storer, b"PROTECTEDx").is_empty());
}

// =============================================================================
// RECURSION DEPTH
// =============================================================================

#[test]
fn test_deep_recursion_hits_instance_cap() {
    let mut setup = TestSetup::new();
    setup
        .engine
        .register_contract(FORWARDER_CODE, forwarder_module());
    let (_, forwarder) = setup.deploy(addr(b"alice"), FORWARDER_CODE, vec![]);

    let output = setup.call(addr(b"alice"), forwarder, "recurse", vec![]);
    assert_eq!(output.return_code, ReturnCode::ExecutionFailed);

    // No instance leaked and every state stack drained.
    assert_eq!(setup.host.runtime().instance_count(), 0);
    assert_eq!(setup.host.state_stack_lengths(), [0, 0, 0, 0]);
}

// =============================================================================
// STORAGE GAS ACCOUNTING
// =============================================================================

#[test]
fn test_storage_gas_accounting() {
    let mut schedule = GasSchedule::test_schedule();
    schedule.base_operation_cost = BaseOperationCost {
        store_per_byte: 3,
        release_per_byte: 5,
        data_copy_per_byte: 2,
        persist_per_byte: 7,
    };
    let mut setup = TestSetup::with_schedule(schedule);
    setup.engine.register_contract(STORER_CODE, storer_module());
    let (_, storer) = setup.deploy(addr(b"alice"), STORER_CODE, vec![]);

    // Fresh key: flat storageStore + 10 bytes at StorePerByte.
    let output = setup.call(addr(b"alice"), storer, "store10", vec![]);
    assert_eq!(output.return_code, ReturnCode::Ok);
    assert_eq!(GAS_PROVIDED - output.gas_remaining, 1 + 10 * 3);
    assert_eq!(output.gas_refund, 0u32.into());

    // Same value again: flat + 10 bytes at DataCopyPerByte.
    let output = setup.call(addr(b"alice"), storer, "store10", vec![]);
    assert_eq!(GAS_PROVIDED - output.gas_remaining, 1 + 10 * 2);
    assert_eq!(output.gas_refund, 0u32.into());

    // Deleting refunds ReleasePerByte per old byte, charging only the
    // flat cost.
    let output = setup.call(addr(b"alice"), storer, "storeEmpty", vec![]);
    assert_eq!(GAS_PROVIDED - output.gas_remaining, 1);
    assert_eq!(output.gas_refund, (10u32 * 5).into());
    assert!(setup.world.storage_of(&storer, b"K").is_empty());
}
