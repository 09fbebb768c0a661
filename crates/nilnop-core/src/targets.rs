//! Resolution of user-facing target specs against a loaded program.
//!
//! A [`TargetSpec`] names a package-level function (`FuncName`) or a method
//! (`Recv.Method`) and the argument that must never be nil. Specs that name
//! something the program does not contain are inert: the function need not
//! be called anywhere.

use std::fmt;
use std::str::FromStr;

use nilnop_ir::ir::{Package, Program};
use nilnop_nilness::Target;
use serde::{Deserialize, Serialize};

/// A function or method whose argument must not be nil.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetSpec {
    /// Package path of the function or method.
    pub pkg_path: String,
    /// `Func` or `Recv.Method`.
    pub func_name: String,
    /// 0-based position of the checked argument, receiver excluded.
    pub arg_pos: usize,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TargetError {
    #[error("invalid target `{0}`: expected <pkg_path>:<FuncName>:<arg_pos>")]
    Syntax(String),
    #[error("invalid FuncName {0}")]
    InvalidFuncName(String),
    #[error("{pkg_path}.{func_name} is not a function")]
    NotFunc { pkg_path: String, func_name: String },
}

impl TargetSpec {
    pub fn new(pkg_path: impl Into<String>, func_name: impl Into<String>, arg_pos: usize) -> Self {
        Self {
            pkg_path: pkg_path.into(),
            func_name: func_name.into(),
            arg_pos,
        }
    }
}

impl fmt::Display for TargetSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.pkg_path, self.func_name, self.arg_pos)
    }
}

/// Parses `pkg_path:FuncName:arg_pos`. The package path may itself contain
/// colons; the last two fields are split off from the right.
impl FromStr for TargetSpec {
    type Err = TargetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let syntax = || TargetError::Syntax(s.to_string());
        let mut parts = s.rsplitn(3, ':');
        let (Some(pos), Some(func_name), Some(pkg_path)) =
            (parts.next(), parts.next(), parts.next())
        else {
            return Err(syntax());
        };
        if pkg_path.is_empty() || func_name.is_empty() {
            return Err(syntax());
        }
        let arg_pos = pos.trim().parse::<usize>().map_err(|_| syntax())?;
        Ok(TargetSpec::new(pkg_path, func_name, arg_pos))
    }
}

/// Resolve one spec. `Ok(None)` means the spec names nothing in `program`.
pub fn resolve_target(program: &Program, spec: &TargetSpec) -> Result<Option<Target>, TargetError> {
    let parts: Vec<&str> = spec.func_name.split('.').collect();
    match parts.as_slice() {
        [func] => resolve_function(program, spec, func),
        [recv, method] => Ok(resolve_method(program, spec, recv, method)),
        _ => Err(TargetError::InvalidFuncName(spec.func_name.clone())),
    }
}

/// Resolve all specs in order, failing on the first malformed one.
pub fn resolve_targets(
    program: &Program,
    specs: &[TargetSpec],
) -> Result<Vec<Target>, TargetError> {
    let mut targets = Vec::with_capacity(specs.len());
    for spec in specs {
        match resolve_target(program, spec)? {
            Some(target) => targets.push(target),
            None => tracing::debug!(spec = %spec, "target not found in program, ignoring"),
        }
    }
    Ok(targets)
}

fn resolve_function(
    program: &Program,
    spec: &TargetSpec,
    name: &str,
) -> Result<Option<Target>, TargetError> {
    let Some(pkg) = program.package(&spec.pkg_path) else {
        return Ok(None);
    };
    if let Some(callable) = pkg
        .callables
        .iter()
        .find(|c| c.name == name && !c.has_receiver())
    {
        return Ok(Some(Target {
            callable: callable.id,
            arg_pos: spec.arg_pos,
            has_receiver: false,
            name: callable.name.clone(),
        }));
    }
    if declares_non_function(pkg, name) {
        return Err(TargetError::NotFunc {
            pkg_path: spec.pkg_path.clone(),
            func_name: spec.func_name.clone(),
        });
    }
    Ok(None)
}

fn resolve_method(
    program: &Program,
    spec: &TargetSpec,
    recv: &str,
    method: &str,
) -> Option<Target> {
    let pkg = program.package(&spec.pkg_path)?;
    if !pkg.types.iter().any(|t| t == recv) {
        return None;
    }
    // Value and pointer receivers both count.
    let callable = pkg
        .callables
        .iter()
        .find(|c| c.name == method && c.receiver_type() == Some(recv))?;
    Some(Target {
        callable: callable.id,
        arg_pos: spec.arg_pos,
        has_receiver: true,
        name: callable.name.clone(),
    })
}

fn declares_non_function(pkg: &Package, name: &str) -> bool {
    pkg.types.iter().chain(&pkg.globals).any(|n| n == name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nilnop_ir::ir::CallableId;

    fn wrap_program() -> Program {
        nilnop_ir::load_fixture("wrap")
    }

    #[test]
    fn test_parse_spec() {
        let spec: TargetSpec = "example.com/app:reportError:0".parse().unwrap();
        assert_eq!(spec, TargetSpec::new("example.com/app", "reportError", 0));
        assert_eq!(spec.to_string(), "example.com/app:reportError:0");

        let spec: TargetSpec = "a:S.Wrap:1".parse().unwrap();
        assert_eq!(spec.func_name, "S.Wrap");
        assert_eq!(spec.arg_pos, 1);
    }

    #[test]
    fn test_parse_spec_errors() {
        for bad in ["", "a", "a:Wrap", ":Wrap:0", "a::0", "a:Wrap:-1", "a:Wrap:x"] {
            assert_eq!(
                bad.parse::<TargetSpec>(),
                Err(TargetError::Syntax(bad.to_string())),
                "{bad:?}"
            );
        }
    }

    #[test]
    fn test_resolve_function() {
        let program = wrap_program();
        let target = resolve_target(&program, &TargetSpec::new("a", "Wrap", 0))
            .unwrap()
            .unwrap();
        assert_eq!(target.callable, CallableId(1));
        assert!(!target.has_receiver);
        assert_eq!(target.name, "Wrap");
    }

    #[test]
    fn test_resolve_method() {
        let program = wrap_program();
        let target = resolve_target(&program, &TargetSpec::new("a", "S.Wrap", 0))
            .unwrap()
            .unwrap();
        assert_eq!(target.callable, CallableId(2));
        assert!(target.has_receiver);
        assert_eq!(target.arg_index(), 1);
    }

    #[test]
    fn test_missing_names_are_inert() {
        let program = wrap_program();
        for spec in [
            TargetSpec::new("a", "Missing", 0),
            TargetSpec::new("nope", "Wrap", 0),
            TargetSpec::new("a", "T.Wrap", 0),
            TargetSpec::new("a", "S.Missing", 0),
            TargetSpec::new("nope", "S.Wrap", 0),
        ] {
            assert_eq!(resolve_target(&program, &spec), Ok(None), "{spec}");
        }
    }

    #[test]
    fn test_non_function_is_error() {
        let program = wrap_program();
        let err = resolve_target(&program, &TargetSpec::new("a", "S", 0)).unwrap_err();
        assert_eq!(
            err,
            TargetError::NotFunc {
                pkg_path: "a".into(),
                func_name: "S".into()
            }
        );
        assert_eq!(err.to_string(), "a.S is not a function");

        assert!(matches!(
            resolve_target(&program, &TargetSpec::new("a", "s", 0)),
            Err(TargetError::NotFunc { .. })
        ));
    }

    #[test]
    fn test_too_many_dots() {
        let program = wrap_program();
        // Rejected even when the package is absent.
        for pkg in ["a", "nope"] {
            assert_eq!(
                resolve_target(&program, &TargetSpec::new(pkg, "a.S.Wrap", 0)),
                Err(TargetError::InvalidFuncName("a.S.Wrap".into()))
            );
        }
    }

    #[test]
    fn test_resolve_targets_skips_inert() {
        let program = wrap_program();
        let specs = vec![
            TargetSpec::new("a", "Missing", 0),
            TargetSpec::new("a", "Wrap", 0),
            TargetSpec::new("a", "S.Wrap", 0),
        ];
        let targets = resolve_targets(&program, &specs).unwrap();
        assert_eq!(targets.len(), 2);

        let specs = vec![TargetSpec::new("a", "Wrap", 0), TargetSpec::new("a", "x.y.z", 0)];
        assert!(resolve_targets(&program, &specs).is_err());
    }
}
