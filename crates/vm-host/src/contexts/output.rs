//! # Output Context
//!
//! Accumulates everything one execution produces: per-account balance
//! deltas and storage updates, deployed code, logs, return data and the
//! terminal return code. The context is stackable: nested destination
//! calls push a snapshot, keep accumulating into the active state and fold
//! back on completion.

use crate::errors::ExecutionError;
use num_bigint::BigInt;
use num_traits::Zero;
use vm_common::{Address, LogEntry, OutputAccount, ReturnCode, VMOutput};

// =============================================================================
// CODE DEPLOY INPUT
// =============================================================================

/// Everything needed to record a code deploy in the output.
#[derive(Clone, Debug, Default)]
pub struct CodeDeployInput {
    /// The deployed bytecode.
    pub contract_code: Vec<u8>,
    /// The two metadata bytes accompanying the code.
    pub contract_code_metadata: Vec<u8>,
    /// The address receiving the code.
    pub contract_address: Address,
}

// =============================================================================
// OUTPUT CONTEXT
// =============================================================================

/// The mutable output state plus its snapshot stack.
#[derive(Debug, Default)]
pub struct OutputContext {
    active: VMOutput,
    state_stack: Vec<VMOutput>,
}

impl OutputContext {
    /// Creates an empty output context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears the active state. Called before every top-level execution.
    pub fn init_state(&mut self) {
        self.active = VMOutput::default();
    }

    // -------------------------------------------------------------------------
    // state stack
    // -------------------------------------------------------------------------

    /// Pushes a deep copy of the active state onto the stack.
    pub fn push_state(&mut self) {
        self.state_stack.push(self.active.clone());
    }

    /// Clears the transient fields of the active state (return data, code,
    /// message, refund, logs) while keeping the accumulated output
    /// accounts visible to the nested call.
    pub fn censor_vm_output(&mut self) {
        self.active.return_data.clear();
        self.active.return_code = ReturnCode::Ok;
        self.active.return_message.clear();
        self.active.gas_remaining = 0;
        self.active.gas_refund = BigInt::zero();
        self.active.logs.clear();
    }

    /// Replaces the active state with the top of the stack, discarding all
    /// changes accumulated since the matching push.
    pub fn pop_set_active_state(&mut self) {
        debug_assert!(!self.state_stack.is_empty(), "output state stack empty");
        if let Some(prev) = self.state_stack.pop() {
            self.active = prev;
        }
    }

    /// Folds the active state into the top of the stack and makes the
    /// result active. Account entries of the active (inner) frame override
    /// the snapshot's; logs and return data concatenate in order.
    pub fn pop_merge_active_state(&mut self) {
        debug_assert!(!self.state_stack.is_empty(), "output state stack empty");
        if let Some(mut prev) = self.state_stack.pop() {
            merge_vm_outputs(&mut prev, &self.active);
            self.active = prev;
        }
    }

    /// Drops the top of the stack without touching the active state.
    pub fn pop_discard(&mut self) {
        debug_assert!(!self.state_stack.is_empty(), "output state stack empty");
        self.state_stack.pop();
    }

    /// Empties the snapshot stack.
    pub fn clear_state_stack(&mut self) {
        self.state_stack.clear();
    }

    /// Number of stacked snapshots.
    #[must_use]
    pub fn state_stack_len(&self) -> usize {
        self.state_stack.len()
    }

    // -------------------------------------------------------------------------
    // accounts
    // -------------------------------------------------------------------------

    /// Returns the output account for `address`, materializing it on first
    /// touch. The second value reports whether the account was just
    /// created.
    pub fn get_output_account(&mut self, address: &Address) -> (&mut OutputAccount, bool) {
        let is_new = !self.active.output_accounts.contains_key(address);
        let account = self
            .active
            .output_accounts
            .entry(*address)
            .or_insert_with(|| OutputAccount::new(*address));
        (account, is_new)
    }

    /// Moves `value` from `sender` to `destination`, attaching `data` and
    /// `gas_limit` to the destination side. Fails when the sender's
    /// projected balance is known and would go negative.
    pub fn transfer(
        &mut self,
        destination: &Address,
        sender: &Address,
        gas_limit: u64,
        value: &BigInt,
        data: &[u8],
    ) -> Result<(), ExecutionError> {
        if value.sign() == num_bigint::Sign::Minus {
            return Err(ExecutionError::TransferValueNegative);
        }

        let (sender_account, _) = self.get_output_account(sender);
        if sender_account.balance.is_some()
            && sender_account.projected_balance() - value < BigInt::zero()
        {
            return Err(ExecutionError::TransferInsufficientFunds);
        }
        sender_account.balance_delta -= value;

        let (dest_account, _) = self.get_output_account(destination);
        dest_account.balance_delta += value;
        dest_account.data = data.to_vec();
        dest_account.gas_limit = gas_limit;

        Ok(())
    }

    /// Credits the transaction value to `address` without debiting anyone;
    /// the node already debited the caller upstream.
    pub fn add_tx_value_to_account(&mut self, address: &Address, value: &BigInt) {
        let (account, _) = self.get_output_account(address);
        account.balance_delta += value;
    }

    /// Records a code deploy against the target account.
    pub fn deploy_code(&mut self, input: &CodeDeployInput) {
        let (account, _) = self.get_output_account(&input.contract_address);
        account.code = Some(input.contract_code.clone());
        account.code_metadata = input.contract_code_metadata.clone();
    }

    // -------------------------------------------------------------------------
    // return data / logs / refund
    // -------------------------------------------------------------------------

    /// Appends one entry to the return data.
    pub fn finish(&mut self, data: Vec<u8>) {
        self.active.return_data.push(data);
    }

    /// The accumulated return data.
    #[must_use]
    pub fn return_data(&self) -> &[Vec<u8>] {
        &self.active.return_data
    }

    /// Drops all accumulated return data.
    pub fn clear_return_data(&mut self) {
        self.active.return_data.clear();
    }

    /// Appends a log entry.
    pub fn write_log(&mut self, address: &Address, topics: Vec<Vec<u8>>, data: Vec<u8>) {
        self.active.logs.push(LogEntry {
            address: *address,
            topics,
            data,
        });
    }

    /// The current return code.
    #[must_use]
    pub fn return_code(&self) -> ReturnCode {
        self.active.return_code
    }

    /// Overwrites the return code.
    pub fn set_return_code(&mut self, return_code: ReturnCode) {
        self.active.return_code = return_code;
    }

    /// The current return message.
    #[must_use]
    pub fn return_message(&self) -> &str {
        &self.active.return_message
    }

    /// Overwrites the return message.
    pub fn set_return_message(&mut self, message: impl Into<String>) {
        self.active.return_message = message.into();
    }

    /// The accumulated gas refund.
    #[must_use]
    pub fn refund(&self) -> u64 {
        u64::try_from(&self.active.gas_refund).unwrap_or(u64::MAX)
    }

    /// Adds to the gas refund counter.
    pub fn add_refund(&mut self, gas: u64) {
        self.active.gas_refund += gas;
    }

    // -------------------------------------------------------------------------
    // final assembly
    // -------------------------------------------------------------------------

    /// Assembles the final output of a successful execution, transferring
    /// ownership of all staged changes.
    #[must_use]
    pub fn get_vm_output(&mut self, gas_remaining: u64) -> VMOutput {
        let mut output = std::mem::take(&mut self.active);
        output.gas_remaining = gas_remaining;
        output
    }

    /// Builds the minimal output of a failed execution. Staged changes are
    /// not surfaced.
    #[must_use]
    pub fn create_vm_output_in_case_of_error(
        return_code: ReturnCode,
        return_message: impl Into<String>,
    ) -> VMOutput {
        VMOutput::from_error(return_code, return_message)
    }
}

/// Folds `right` (the inner frame) into `left` (the outer snapshot).
fn merge_vm_outputs(left: &mut VMOutput, right: &VMOutput) {
    for (address, right_account) in &right.output_accounts {
        match left.output_accounts.get_mut(address) {
            Some(left_account) => {
                // The inner frame accumulated on top of the outer values,
                // so its entries win wholesale.
                left_account.nonce = right_account.nonce;
                left_account.balance = right_account.balance.clone();
                left_account.balance_delta = right_account.balance_delta.clone();
                if right_account.code.is_some() {
                    left_account.code = right_account.code.clone();
                    left_account.code_metadata = right_account.code_metadata.clone();
                }
                for (key, update) in &right_account.storage_updates {
                    left_account
                        .storage_updates
                        .insert(key.clone(), update.clone());
                }
                if !right_account.data.is_empty() {
                    left_account.data = right_account.data.clone();
                }
                if right_account.gas_limit > 0 {
                    left_account.gas_limit = right_account.gas_limit;
                }
            }
            None => {
                left.output_accounts.insert(*address, right_account.clone());
            }
        }
    }

    left.return_data.extend(right.return_data.iter().cloned());
    left.return_code = right.return_code;
    left.return_message.clone_from(&right.return_message);
    left.gas_refund += &right.gas_refund;
    left.logs.extend(right.logs.iter().cloned());
    left.deleted_accounts
        .extend(right.deleted_accounts.iter().copied());
    left.touched_accounts
        .extend(right.touched_accounts.iter().copied());
}

// =============================================================================
// TESTS
// =============================================================================
