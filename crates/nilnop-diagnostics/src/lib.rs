//! nilnop diagnostics - diagnostic types, rule catalog, and formatting.

pub mod diagnostic;
pub mod human;
pub mod rules;

pub use diagnostic::*;

/// Format diagnostics as pretty-printed JSON.
pub fn format_json(diags: &[Diagnostic]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(diags)
}
