//! Diagnostics for nil arguments (NNP001) and degenerate conditions (NNP002).

use std::fmt;

use nilnop_diagnostics::diagnostic::*;
use nilnop_diagnostics::rules::{DEGENERATE_CONDITION, NIL_ARGUMENT};
use nilnop_ir::ir::{BinOpKind, Function, Span};

use crate::lattice::Nilness;
use crate::validator::Violation;

/// Outcome of a nil comparison whose operands are both known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Degenerate {
    /// Always true.
    Tautological,
    /// Always false.
    Impossible,
}

impl Degenerate {
    pub fn of(xnil: Nilness, op: BinOpKind, ynil: Nilness) -> Self {
        if (xnil == ynil) == (op == BinOpKind::Eql) {
            Degenerate::Tautological
        } else {
            Degenerate::Impossible
        }
    }
}

impl fmt::Display for Degenerate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Degenerate::Tautological => write!(f, "tautological"),
            Degenerate::Impossible => write!(f, "impossible"),
        }
    }
}

/// NNP001: nil passed to a target.
pub fn build_nnp001(func: &Function, violation: &Violation<'_>) -> Diagnostic {
    let target = violation.target;
    let arg = func
        .value(violation.arg)
        .map(|v| v.name.as_str())
        .filter(|name| !name.is_empty())
        .unwrap_or("argument");
    let builder = DiagnosticBuilder::new(
        NIL_ARGUMENT,
        Severity::Error,
        format!("nil is passed to {}", target.name),
        "nil",
    )
    .explanation(format!(
        "In function `{}`, `{arg}` (parameter {} of `{}`) is nil on every path reaching this call",
        func.name, target.arg_pos, target.name
    ))
    .function(&func.name);

    // Calls without a position are attributed to the enclosing function.
    match violation.call.span.as_ref().or(func.span.as_ref()) {
        Some(span) => with_span(builder, span).build(),
        None => builder.build(),
    }
}

/// NNP002: both operands of `==`/`!=` have known nilness.
pub fn build_nnp002(
    func: &Function,
    span: &Span,
    xnil: Nilness,
    op: BinOpKind,
    ynil: Nilness,
) -> Diagnostic {
    let kind = Degenerate::of(xnil, op, ynil);
    let outcome = match kind {
        Degenerate::Tautological => "true",
        Degenerate::Impossible => "false",
    };
    let builder = DiagnosticBuilder::new(
        DEGENERATE_CONDITION,
        Severity::Warning,
        format!("{kind} condition: {xnil} {op} {ynil}"),
        "cond",
    )
    .explanation(format!(
        "In function `{}`, this comparison is always {outcome}",
        func.name
    ))
    .function(&func.name);
    with_span(builder, span).build()
}

fn with_span(builder: DiagnosticBuilder, span: &Span) -> DiagnosticBuilder {
    let builder = builder.location(&span.file, span.start_line, span.start_col);
    if span.end_line > 0 {
        builder.end_location(span.end_line, span.end_col)
    } else {
        builder
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_degenerate_kind() {
        use Nilness::*;
        assert_eq!(Degenerate::of(Nil, BinOpKind::Eql, Nil), Degenerate::Tautological);
        assert_eq!(Degenerate::of(Nil, BinOpKind::Neq, Nil), Degenerate::Impossible);
        assert_eq!(Degenerate::of(NonNil, BinOpKind::Eql, Nil), Degenerate::Impossible);
        assert_eq!(Degenerate::of(Nil, BinOpKind::Neq, NonNil), Degenerate::Tautological);
    }

    #[test]
    fn test_nnp002_message() {
        let func = crate::test_util::FuncBuilder::new("f").finish_empty();
        let span = Span::new("a.go", 12, 5);
        let diag = build_nnp002(&func, &span, Nilness::NonNil, BinOpKind::Eql, Nilness::Nil);
        assert_eq!(diag.rule, "NNP002");
        assert_eq!(diag.category, "cond");
        assert_eq!(diag.title, "impossible condition: non-nil == nil");
        assert_eq!(diag.location.to_string(), "a.go:12:5");
        assert_eq!(diag.severity, Severity::Warning);
    }
}
