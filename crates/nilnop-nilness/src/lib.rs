//! nilnop nilness - nil argument detection over the dominator tree.
//!
//! Given resolved [`Target`]s, walks every function and reports calls that
//! pass a provably nil value to a target, plus nil comparisons whose
//! outcome is already decided.

pub mod analysis;
pub mod classify;
pub mod facts;
pub mod lattice;
pub mod rules;
pub mod validator;

#[cfg(test)]
pub(crate) mod test_util;

pub use analysis::NilnessAnalyzer;
pub use lattice::Nilness;
pub use validator::Target;

use nilnop_diagnostics::diagnostic::Diagnostic;
use nilnop_ir::ir::Function;

/// Analyze a single function against `targets`.
pub fn analyze_function(func: &Function, targets: &[Target]) -> Vec<Diagnostic> {
    NilnessAnalyzer::new(targets).analyze_function(func)
}
