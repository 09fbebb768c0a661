//! Rule catalog for nilnop.
//!
//! Single source of truth for rule metadata, used by the analysis pass
//! (codes, categories, default severities) and by `nilnop explain`.

use crate::diagnostic::Severity;
use serde::Serialize;

/// Nil argument passed to a configured target.
pub const NIL_ARGUMENT: &str = "NNP001";
/// Nil comparison whose outcome is fixed by dominating facts.
pub const DEGENERATE_CONDITION: &str = "NNP002";

/// Information about a single analysis rule.
#[derive(Debug, Clone, Serialize)]
pub struct RuleInfo {
    pub code: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub severity: Severity,
    pub category: &'static str,
    /// Example Go code that triggers this rule.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example_bad: Option<&'static str>,
    /// Example Go code that does not trigger this rule.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example_good: Option<&'static str>,
}

/// Look up a single rule by code (case-insensitive, e.g. "nnp001").
pub fn get_rule(code: &str) -> Option<RuleInfo> {
    get_all_rules()
        .into_iter()
        .find(|r| r.code.eq_ignore_ascii_case(code))
}

/// Return all available analysis rules.
pub fn get_all_rules() -> Vec<RuleInfo> {
    vec![
        RuleInfo {
            code: NIL_ARGUMENT,
            name: "Nil passed to target",
            description: "A value that is provably nil on every path reaching the call is \
                passed as the checked argument of a configured target function.",
            severity: Severity::Error,
            category: "nil",
            example_bad: Some(
                "func f() {\n\tvar err error\n\treportError(err) // err is always nil here\n}",
            ),
            example_good: Some(
                "func f() {\n\tif err := do(); err != nil {\n\t\treportError(err)\n\t}\n}",
            ),
        },
        RuleInfo {
            code: DEGENERATE_CONDITION,
            name: "Degenerate nil comparison",
            description: "Both operands of an `==` or `!=` comparison have known nilness, \
                so the branch always goes the same way. The unreachable side is not analysed.",
            severity: Severity::Warning,
            category: "cond",
            example_bad: Some(
                "if x == nil {\n\tif x == nil { // tautological condition: nil == nil\n\t}\n}",
            ),
            example_good: Some("if x == nil {\n\treturn\n}\nuse(x)"),
        },
    ]
}

/// Render a rule as plain text for the `explain` command.
pub fn explain(code: &str) -> Option<String> {
    let rule = get_rule(code)?;
    let mut out = format!(
        "{} - {}\n\ncategory: {}\nseverity: {}\n\n{}\n",
        rule.code, rule.name, rule.category, rule.severity, rule.description
    );
    if let Some(bad) = rule.example_bad {
        out.push_str("\nFlagged:\n\n");
        out.push_str(&indent(bad));
    }
    if let Some(good) = rule.example_good {
        out.push_str("\nNot flagged:\n\n");
        out.push_str(&indent(good));
    }
    Some(out)
}

fn indent(code: &str) -> String {
    code.lines().map(|l| format!("    {l}\n")).collect()
}
