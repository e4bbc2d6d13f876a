//! # Metering Context
//!
//! Gas accounting for the active instance. Consumed gas lives in the
//! instance's points counter so that pushing and popping instances
//! naturally saves and restores it; this context only interprets the
//! counter against the call's gas budget.

use crate::contexts::output::OutputContext;
use crate::contexts::runtime::RuntimeContext;
use crate::gas::GasSchedule;
use crate::ports::engine::BreakpointValue;
use std::rc::Rc;

/// Interprets instance gas points against the gas schedule.
pub struct MeteringContext {
    gas_schedule: Rc<GasSchedule>,
    block_gas_limit: u64,
}

impl MeteringContext {
    /// Creates a metering context over a validated schedule.
    #[must_use]
    pub fn new(gas_schedule: Rc<GasSchedule>, block_gas_limit: u64) -> Self {
        Self {
            gas_schedule,
            block_gas_limit,
        }
    }

    /// The active gas schedule.
    #[must_use]
    pub fn gas_schedule(&self) -> &GasSchedule {
        &self.gas_schedule
    }

    /// The maximum gas one block may consume.
    #[must_use]
    pub fn block_gas_limit(&self) -> u64 {
        self.block_gas_limit
    }

    /// Deducts `gas` from the instance budget. When the budget is
    /// exhausted the points are pinned at the budget, remaining gas drops
    /// to zero and the `OutOfGas` breakpoint is raised; subsequent EI
    /// calls keep executing but can charge nothing further.
    pub fn use_gas(&self, runtime: &RuntimeContext, gas: u64) {
        let gas_provided = runtime.vm_input().gas_provided;
        let used = runtime.get_points_used();

        match used.checked_add(gas) {
            Some(total) if total <= gas_provided => runtime.set_points_used(total),
            _ => {
                runtime.set_points_used(gas_provided);
                // Never overwrite a breakpoint already pending.
                if runtime.get_runtime_breakpoint() == BreakpointValue::None {
                    runtime.set_runtime_breakpoint(BreakpointValue::OutOfGas);
                }
            }
        }
    }

    /// Credits `gas` to the refund counter.
    pub fn free_gas(&self, output: &mut OutputContext, gas: u64) {
        output.add_refund(gas);
    }

    /// Gas still available to the current call.
    #[must_use]
    pub fn gas_left(&self, runtime: &RuntimeContext) -> u64 {
        runtime
            .vm_input()
            .gas_provided
            .saturating_sub(runtime.get_points_used())
    }

    /// Clamps a contract-requested gas amount for a forwarded call into
    /// `[0, gas_left]`.
    #[must_use]
    pub fn bound_gas_limit(&self, runtime: &RuntimeContext, requested: i64) -> u64 {
        if requested < 0 {
            return 0;
        }
        (requested as u64).min(self.gas_left(runtime))
    }
}

// =============================================================================
// TESTS
// =============================================================================
