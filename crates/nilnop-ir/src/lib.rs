//! nilnop IR - intermediate representation for Go nilness checking.
//!
//! The IR is built by a Go SSA front-end and deserialized here from JSON.
//! This crate provides:
//! - Owned IR types matching the front-end output
//! - Load-time structural validation
//! - CFG navigation helpers (predecessors, dominator tree, equality branches)

pub mod cfg; // CFG and dominator tree
pub mod ir; // Owned IR types

/// Errors produced while loading IR.
#[derive(Debug, thiserror::Error)]
pub enum IrError {
    #[error("read error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid IR JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("malformed function `{function}`: {reason}")]
    Malformed { function: String, reason: String },
}

/// Load a JSON IR file and validate every function in it.
pub fn load_json_file(path: &std::path::Path) -> Result<ir::Program, IrError> {
    let data = std::fs::read_to_string(path)?;
    let program = ir::Program::from_json(&data)?;
    tracing::debug!(
        path = %path.display(),
        packages = program.packages.len(),
        "loaded IR"
    );
    Ok(program)
}

/// Path of a fixture file under `tests/fixtures/`.
#[cfg(any(test, feature = "test-fixtures"))]
pub fn fixture_path(name: &str) -> std::path::PathBuf {
    let manifest_dir = std::path::Path::new(env!("CARGO_MANIFEST_DIR"));
    manifest_dir
        .join("../../tests/fixtures")
        .join(format!("{name}.json"))
}

/// Load a fixture file from `tests/fixtures/` by name.
///
/// This is available in test builds and when the `test-fixtures` feature is enabled.
#[cfg(any(test, feature = "test-fixtures"))]
pub fn load_fixture(name: &str) -> ir::Program {
    load_json_file(&fixture_path(name))
        .unwrap_or_else(|e| panic!("failed to load fixture {name}: {e}"))
}
