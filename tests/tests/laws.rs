//! Cross-cutting laws: gas conservation, state-stack balance and the
//! panic discipline at the top-level entry points.

use vm_host::prelude::*;
use vm_tests::*;

const COUNTER_CODE: &[u8] = b"counter-contract";
const PANICKER_CODE: &[u8] = b"panicker-contract";

// =============================================================================
// GAS CONSERVATION
// =============================================================================

#[test]
fn test_gas_conservation_on_success() {
    let mut setup = TestSetup::new();
    setup.engine.register_contract(COUNTER_CODE, counter_module());

    // Deploy: one int64storageStore (flat 1) adding one byte (1).
    let (output, counter) = setup.deploy(addr(b"alice"), COUNTER_CODE, vec![]);
    assert_eq!(output.return_code, ReturnCode::Ok);
    assert_eq!(output.gas_remaining, GAS_PROVIDED - 2);
    assert_eq!(output.gas_refund, 0u32.into());

    // Increment: load (1), store (flat 1 + persist 1), finish (1).
    let output = setup.call(addr(b"alice"), counter, "increment", vec![]);
    assert_eq!(output.gas_remaining, GAS_PROVIDED - 4);
    assert_eq!(output.gas_refund, 0u32.into());
}

#[test]
fn test_failed_call_consumes_all_gas() {
    let mut setup = TestSetup::new();
    setup.engine.register_contract(COUNTER_CODE, counter_module());
    let (_, counter) = setup.deploy(addr(b"alice"), COUNTER_CODE, vec![]);

    let output = setup.call(addr(b"alice"), counter, "missingFunction", vec![]);
    assert_eq!(output.return_code, ReturnCode::FunctionNotFound);
    assert_eq!(output.gas_remaining, 0);
}

// =============================================================================
// STATE-STACK BALANCE
// =============================================================================

#[test]
fn test_state_stacks_empty_after_every_entry() {
    let mut setup = TestSetup::new();
    setup.engine.register_contract(COUNTER_CODE, counter_module());
    let (_, counter) = setup.deploy(addr(b"alice"), COUNTER_CODE, vec![]);
    assert_eq!(setup.host.state_stack_lengths(), [0, 0, 0, 0]);

    setup.call(addr(b"alice"), counter, "increment", vec![]);
    assert_eq!(setup.host.state_stack_lengths(), [0, 0, 0, 0]);

    setup.call(addr(b"alice"), counter, "missingFunction", vec![]);
    assert_eq!(setup.host.state_stack_lengths(), [0, 0, 0, 0]);
    assert_eq!(setup.host.runtime().instance_count(), 0);
}

// =============================================================================
// PANIC DISCIPLINE
// =============================================================================

fn panicker_module() -> MockModule {
    let mut module = MockModule::new(1);
    module.export("boom", |_| panic!("kaboom"));
    module
}

#[test]
fn test_panic_is_caught_and_host_is_reusable() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    let mut setup = TestSetup::new();
    setup.engine.register_contract(COUNTER_CODE, counter_module());
    setup
        .engine
        .register_contract(PANICKER_CODE, panicker_module());

    let (_, counter) = setup.deploy(addr(b"alice"), COUNTER_CODE, vec![]);
    let (_, panicker) = setup.deploy(addr(b"alice"), PANICKER_CODE, vec![]);

    let input = ContractCallInput {
        vm_input: VMInput {
            caller_addr: addr(b"alice"),
            gas_provided: GAS_PROVIDED,
            ..VMInput::default()
        },
        recipient_addr: panicker,
        function: "boom".to_string(),
    };
    let result = setup.host.run_smart_contract_call(input);
    match result {
        Err(ExecutionError::ExecutionPanicked(message)) => {
            assert!(message.contains("kaboom"));
        }
        other => panic!("expected caught panic, got {other:?}"),
    }

    // A full re-init makes the host serviceable again.
    setup.host.clean();
    setup.host.init_state();

    let output = setup.call(addr(b"alice"), counter, "increment", vec![]);
    assert_eq!(output.return_code, ReturnCode::Ok, "{}", output.return_message);
    assert_eq!(output.return_data, vec![vec![2]]);
}
