//! Checks calls to target functions for provably nil arguments.

use nilnop_ir::ir::{CallInstruction, CallableId, Function, ValueId};

use crate::classify::classify;
use crate::facts::FactStack;
use crate::lattice::Nilness;

/// A resolved function or method whose argument must never be nil.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub callable: CallableId,
    /// 0-based position among the declared parameters, receiver excluded.
    pub arg_pos: usize,
    /// Methods take their receiver as the first call argument.
    pub has_receiver: bool,
    /// Name used in reports.
    pub name: String,
}

impl Target {
    /// Index of the checked argument in the call's argument list.
    pub fn arg_index(&self) -> usize {
        self.arg_pos + usize::from(self.has_receiver)
    }
}

/// A nil argument found at a target call.
#[derive(Debug, Clone, Copy)]
pub struct Violation<'a> {
    pub target: &'a Target,
    pub call: &'a CallInstruction,
    pub arg: ValueId,
}

/// Matches calls against the configured targets.
#[derive(Debug, Clone, Copy)]
pub struct TargetValidator<'t> {
    targets: &'t [Target],
}

impl<'t> TargetValidator<'t> {
    pub fn new(targets: &'t [Target]) -> Self {
        Self { targets }
    }

    /// Check one call. Only the first target with a matching callable is
    /// considered.
    pub fn validate<'a>(
        &self,
        func: &Function,
        stack: &FactStack,
        call: &'a CallInstruction,
    ) -> Option<Violation<'a>>
    where
        't: 'a,
    {
        let callee = call.callee?;
        let target = self.targets.iter().find(|t| t.callable == callee)?;

        let index = target.arg_index();
        let Some(&arg) = call.args.get(index) else {
            tracing::debug!(
                func = %func.name,
                callee = %target.name,
                index,
                args = call.args.len(),
                "argument index out of range, skipping target"
            );
            return None;
        };

        match classify(func, stack, arg) {
            Nilness::Nil => Some(Violation { target, call, arg }),
            _ => None,
        }
    }
}
