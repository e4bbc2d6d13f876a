//! Reserved function names a contract may not export: the EI import
//! namespace, the protocol builtin functions and the upgrade entry point.

use crate::UPGRADE_FUNCTION_NAME;
use std::collections::BTreeSet;

/// The set of export names rejected by contract-code verification.
#[derive(Clone, Debug, Default)]
pub struct ReservedFunctions {
    function_names: BTreeSet<String>,
}

impl ReservedFunctions {
    /// Builds the reserved set from the EI method names and the protocol
    /// builtin names.
    #[must_use]
    pub fn new(sc_api_names: BTreeSet<String>, protocol_builtin_functions: BTreeSet<String>) -> Self {
        let mut function_names = protocol_builtin_functions;
        function_names.extend(sc_api_names);
        function_names.insert(UPGRADE_FUNCTION_NAME.to_string());
        Self { function_names }
    }

    /// Whether `function_name` is reserved.
    #[must_use]
    pub fn is_reserved(&self, function_name: &str) -> bool {
        self.function_names.contains(function_name)
    }

    /// The reserved names, ordered.
    #[must_use]
    pub fn get_reserved(&self) -> Vec<String> {
        self.function_names.iter().cloned().collect()
    }
}
