//! Dominator-tree nilness walk.
//!
//! Visits the reachable blocks of a function in dominator-tree preorder,
//! carrying the nilness facts established by the `== nil` / `!= nil`
//! comparisons that dominate each block. Every call in a visited block is
//! checked against the targets, and comparisons whose outcome is already
//! fixed by those facts are reported.

use nilnop_diagnostics::diagnostic::Diagnostic;
use nilnop_ir::cfg::{Cfg, EqualityBranch};
use nilnop_ir::ir::{BlockId, Function, Package};

use crate::classify::classify;
use crate::facts::{expand, negate_all, Fact, FactStack};
use crate::lattice::Nilness;
use crate::rules;
use crate::validator::{Target, TargetValidator};

/// Runs the walk over functions with a fixed set of targets.
#[derive(Debug, Clone, Copy)]
pub struct NilnessAnalyzer<'t> {
    validator: TargetValidator<'t>,
}

impl<'t> NilnessAnalyzer<'t> {
    pub fn new(targets: &'t [Target]) -> Self {
        Self {
            validator: TargetValidator::new(targets),
        }
    }

    /// Analyze every function with a body in a package, sequentially.
    pub fn analyze_package(&self, pkg: &Package) -> Vec<Diagnostic> {
        pkg.functions
            .iter()
            .flat_map(|func| self.analyze_function(func))
            .collect()
    }

    /// Analyze one function. Diagnostics come out in visit order.
    pub fn analyze_function(&self, func: &Function) -> Vec<Diagnostic> {
        if !func.has_body() {
            return Vec::new();
        }
        if let Err(err) = func.validate() {
            tracing::debug!(func = %func.name, error = %err, "skipping malformed function");
            return Vec::new();
        }
        let cfg = Cfg::from_function(func);
        let mut walk = Walk {
            cfg: &cfg,
            validator: self.validator,
            seen: vec![false; cfg.block_count()],
            diagnostics: Vec::new(),
        };
        walk.run();
        walk.diagnostics
    }
}

struct Walk<'c, 'a, 't> {
    cfg: &'c Cfg<'a>,
    validator: TargetValidator<'t>,
    seen: Vec<bool>,
    diagnostics: Vec<Diagnostic>,
}

impl Walk<'_, '_, '_> {
    fn run(&mut self) {
        let mut work = vec![(BlockId::ENTRY, FactStack::new())];
        while let Some((block, stack)) = work.pop() {
            match self.seen.get_mut(block.index()) {
                Some(seen) if !*seen => *seen = true,
                _ => continue,
            }
            self.check_calls(block, &stack);
            let next = self.dominees(block, &stack);
            // Reversed so the first dominee is popped first.
            work.extend(next.into_iter().rev());
        }
    }

    fn check_calls(&mut self, block: BlockId, stack: &FactStack) {
        let cfg = self.cfg;
        let func = cfg.function();
        let Some(bb) = cfg.block(block) else {
            return;
        };
        for call in bb.calls() {
            if let Some(violation) = self.validator.validate(func, stack, call) {
                self.diagnostics.push(rules::build_nnp001(func, &violation));
            }
        }
    }

    /// Dominees of `block` to visit next, each with the facts it inherits.
    fn dominees(&mut self, block: BlockId, stack: &FactStack) -> Vec<(BlockId, FactStack)> {
        let cfg = self.cfg;
        let func = cfg.function();
        let dominees = cfg.dominees(block);

        let Some(branch) = cfg.equality_branch(block) else {
            return unchanged(dominees, stack);
        };

        let xnil = classify(func, stack, branch.x);
        let ynil = classify(func, stack, branch.y);

        if xnil.is_known() && ynil.is_known() && (xnil == Nilness::Nil || ynil == Nilness::Nil) {
            return self.degenerate(block, &branch, xnil, ynil, stack);
        }

        let learned = match (xnil, ynil) {
            (Nilness::Nil, _) => Fact::new(branch.y, Nilness::Nil),
            (_, Nilness::Nil) => Fact::new(branch.x, Nilness::Nil),
            _ => return unchanged(dominees, stack),
        };
        let nil_facts = expand(func, learned);
        let non_nil_facts = negate_all(&nil_facts);

        dominees
            .iter()
            .map(|&d| {
                // Facts only flow along edges that are the sole way in.
                let facts = if !cfg.has_single_pred(d) {
                    None
                } else if d == branch.tsucc {
                    Some(&nil_facts)
                } else if d == branch.fsucc {
                    Some(&non_nil_facts)
                } else {
                    None
                };
                let inherited = match facts {
                    Some(facts) => stack.extend(facts.iter().copied()),
                    None => stack.clone(),
                };
                (d, inherited)
            })
            .collect()
    }

    /// Both operands are known and at least one is nil: report the
    /// comparison and skip the successor that can never be taken.
    fn degenerate(
        &mut self,
        block: BlockId,
        branch: &EqualityBranch<'_>,
        xnil: Nilness,
        ynil: Nilness,
        stack: &FactStack,
    ) -> Vec<(BlockId, FactStack)> {
        let cfg = self.cfg;
        let func = cfg.function();
        if let Some(span) = &branch.cond.span {
            self.diagnostics
                .push(rules::build_nnp002(func, span, xnil, branch.op, ynil));
        }

        let skip = if xnil == ynil {
            branch.fsucc
        } else {
            branch.tsucc
        };
        cfg.dominees(block)
            .iter()
            .filter(|&&d| {
                let unreachable = d == skip && cfg.has_single_pred(d);
                if unreachable {
                    tracing::debug!(
                        func = %func.name,
                        block = %d,
                        "pruning branch of degenerate comparison"
                    );
                }
                !unreachable
            })
            .map(|&d| (d, stack.clone()))
            .collect()
    }
}

fn unchanged(dominees: &[BlockId], stack: &FactStack) -> Vec<(BlockId, FactStack)> {
    dominees.iter().map(|&d| (d, stack.clone())).collect()
}
