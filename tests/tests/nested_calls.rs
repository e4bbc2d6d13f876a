//! Nested execution behavior: read-only propagation, value transfers and
//! async-call servicing.

use num_bigint::BigInt;
use vm_common::ReturnCode;
use vm_tests::*;

const READER_CODE: &[u8] = b"reader-contract";
const WRITER_CODE: &[u8] = b"writer-contract";
const STARTER_CODE: &[u8] = b"starter-contract";
const PONGER_CODE: &[u8] = b"ponger-contract";
const PAYER_CODE: &[u8] = b"payer-contract";

// =============================================================================
// READ-ONLY EXECUTION
// =============================================================================

#[test]
fn test_read_only_execution_blocks_writes() {
    let mut setup = TestSetup::new();
    setup.engine.register_contract(READER_CODE, reader_module());
    setup.engine.register_contract(WRITER_CODE, writer_module());

    let (_, reader) = setup.deploy(addr(b"alice"), READER_CODE, vec![]);
    let (_, writer) = setup.deploy(addr(b"alice"), WRITER_CODE, vec![]);

    let output = setup.call(
        addr(b"alice"),
        reader,
        "readOnlyWrite",
        vec![writer.to_vec()],
    );
    assert_eq!(output.return_code, ReturnCode::Ok, "{}", output.return_message);

    // The writer observed Unchanged (0, encoded as empty bytes) and its
    // storage stayed untouched.
    assert_eq!(output.return_data, vec![Vec::<u8>::new()]);
    assert!(setup.world.storage_of(&writer, b"K").is_empty());
}

#[test]
fn test_direct_write_works_outside_read_only() {
    let mut setup = TestSetup::new();
    setup.engine.register_contract(WRITER_CODE, writer_module());
    let (_, writer) = setup.deploy(addr(b"alice"), WRITER_CODE, vec![]);

    let output = setup.call(addr(b"alice"), writer, "write", vec![]);
    assert_eq!(output.return_code, ReturnCode::Ok);
    // StorageStatus::Added = 2.
    assert_eq!(output.return_data, vec![vec![2]]);
    assert_eq!(setup.world.storage_of(&writer, b"K"), vec![9u8; 10]);
}

// =============================================================================
// VALUE TRANSFERS
// =============================================================================

#[test]
fn test_transfer_value_moves_funds() {
    let mut setup = TestSetup::new();
    setup.engine.register_contract(PAYER_CODE, payer_module());
    let (_, payer) = setup.deploy(addr(b"alice"), PAYER_CODE, vec![]);

    // Fund the contract.
    let mut account = setup.world.account(&payer).expect("payer account");
    account.balance = BigInt::from(50);
    setup.world.add_account(account);

    let output = setup.call(addr(b"alice"), payer, "pay", vec![addr(b"bob").to_vec()]);
    assert_eq!(output.return_code, ReturnCode::Ok, "{}", output.return_message);

    assert_eq!(
        setup.world.account(&payer).unwrap().balance,
        BigInt::from(40)
    );
    assert_eq!(
        setup.world.account(&addr(b"bob")).unwrap().balance,
        BigInt::from(10)
    );
}

#[test]
fn test_transfer_value_rejects_overdraft() {
    let mut setup = TestSetup::new();
    setup.engine.register_contract(PAYER_CODE, payer_module());
    let (_, payer) = setup.deploy(addr(b"alice"), PAYER_CODE, vec![]);

    let mut account = setup.world.account(&payer).expect("payer account");
    account.balance = BigInt::from(50);
    setup.world.add_account(account);

    let output = setup.call(
        addr(b"alice"),
        payer,
        "overpay",
        vec![addr(b"bob").to_vec()],
    );
    assert_eq!(output.return_code, ReturnCode::UserError);
    assert_eq!(output.return_message, "transfer refused");

    // Nothing moved.
    assert_eq!(
        setup.world.account(&payer).unwrap().balance,
        BigInt::from(50)
    );
    assert!(setup.world.account(&addr(b"bob")).is_none());
}

// =============================================================================
// ASYNC CALLS
// =============================================================================

#[test]
fn test_async_call_executes_destination_and_callback() {
    let mut setup = TestSetup::new();
    setup
        .engine
        .register_contract(STARTER_CODE, starter_module());
    setup.engine.register_contract(PONGER_CODE, ponger_module());

    let (_, starter) = setup.deploy(addr(b"alice"), STARTER_CODE, vec![]);
    let (_, ponger) = setup.deploy(addr(b"alice"), PONGER_CODE, vec![]);

    let output = setup.call(addr(b"alice"), starter, "start", vec![ponger.to_vec()]);
    assert_eq!(output.return_code, ReturnCode::Ok, "{}", output.return_message);

    // The destination's return data merged back, then the callback ran.
    assert_eq!(output.return_data, vec![vec![7], vec![42]]);
    assert_eq!(setup.host.state_stack_lengths(), [0, 0, 0, 0]);
}

#[test]
fn test_async_call_to_plain_account_registers_transfer() {
    let mut setup = TestSetup::new();
    setup
        .engine
        .register_contract(STARTER_CODE, starter_module());
    let (_, starter) = setup.deploy(addr(b"alice"), STARTER_CODE, vec![]);

    // The destination holds no code, so the call is left for the node.
    let output = setup.call(
        addr(b"alice"),
        starter,
        "start",
        vec![addr(b"plain").to_vec()],
    );
    assert_eq!(output.return_code, ReturnCode::Ok, "{}", output.return_message);

    let dest_account = output
        .output_accounts
        .get(&addr(b"plain"))
        .expect("destination account staged");
    assert_eq!(dest_account.data, b"ping");
    assert!(dest_account.gas_limit > 0);
}
