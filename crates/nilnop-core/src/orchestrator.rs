//! Analysis orchestrator: resolves targets, runs the nilness pass over every
//! function in parallel and post-processes the results.

use crate::config::Config;
use crate::targets::{resolve_targets, TargetError, TargetSpec};
use nilnop_diagnostics::diagnostic::{Diagnostic, SeverityCounts};
use nilnop_diagnostics::rules::DEGENERATE_CONDITION;
use nilnop_ir::ir::{Function, Program};
use nilnop_nilness::{NilnessAnalyzer, Target};
use rayon::prelude::*;
use std::path::Path;

/// Complete output from an analysis run.
#[derive(Debug, Clone)]
pub struct AnalysisOutput {
    pub diagnostics: Vec<Diagnostic>,
    pub summary: AnalysisSummary,
}

/// Summary statistics for the analysis.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct AnalysisSummary {
    pub total: usize,
    pub critical: usize,
    pub error: usize,
    pub warning: usize,
    pub info: usize,
    pub packages_analyzed: usize,
    pub functions_analyzed: usize,
    /// Targets that resolved to a callable in the program.
    pub active_targets: usize,
    /// Diagnostics dropped by `max_diagnostics`.
    pub truncated: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    #[error("IR error: {0}")]
    Ir(#[from] nilnop_ir::IrError),
    #[error("target error: {0}")]
    Target(#[from] TargetError),
    #[error("cannot start worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Load an IR file and analyze it.
pub fn analyze_file(path: &Path, config: &Config) -> Result<AnalysisOutput, OrchestratorError> {
    let program = nilnop_ir::load_json_file(path)?;
    analyze_program(&program, config)
}

/// Run the nilness pass on already-loaded IR.
pub fn analyze_program(
    program: &Program,
    config: &Config,
) -> Result<AnalysisOutput, OrchestratorError> {
    analyze_program_with_targets(program, config, &[])
}

/// Like [`analyze_program`], with `extra` specs added after the configured ones.
pub fn analyze_program_with_targets(
    program: &Program,
    config: &Config,
    extra: &[TargetSpec],
) -> Result<AnalysisOutput, OrchestratorError> {
    let specs: Vec<TargetSpec> = config.targets.iter().chain(extra).cloned().collect();
    let targets = resolve_targets(program, &specs)?;
    tracing::debug!(
        configured = specs.len(),
        active = targets.len(),
        "resolved targets"
    );

    let functions: Vec<&Function> = program.functions().filter(|f| f.has_body()).collect();
    let diags = if config.nilnop.jobs > 0 {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.nilnop.jobs)
            .build()?;
        pool.install(|| run_parallel(&functions, &targets))
    } else {
        run_parallel(&functions, &targets)
    };

    let output = postprocess_diagnostics(diags, config, program, targets.len());
    tracing::info!(
        go_version = %program.go_version,
        functions = output.summary.functions_analyzed,
        diagnostics = output.summary.total,
        "analysis finished"
    );
    Ok(output)
}

/// One task per function; each returns its own diagnostics and the
/// results are concatenated in function order.
fn run_parallel(functions: &[&Function], targets: &[Target]) -> Vec<Diagnostic> {
    let analyzer = NilnessAnalyzer::new(targets);
    functions
        .par_iter()
        .map(|func| analyzer.analyze_function(func))
        .collect::<Vec<_>>()
        .into_iter()
        .flatten()
        .collect()
}

/// Condition filter, severity filter, sort, truncate, build summary.
fn postprocess_diagnostics(
    mut diags: Vec<Diagnostic>,
    config: &Config,
    program: &Program,
    active_targets: usize,
) -> AnalysisOutput {
    if !config.nilnop.report_conditions {
        diags.retain(|d| d.rule != DEGENERATE_CONDITION);
    }

    let threshold = config.nilnop.severity_threshold;
    diags.retain(|d| d.severity.is_at_least(threshold));

    diags.sort_by(|a, b| {
        a.location
            .file
            .cmp(&b.location.file)
            .then(a.location.line.cmp(&b.location.line))
            .then(a.location.column.cmp(&b.location.column))
            .then(a.rule.cmp(&b.rule))
    });

    let mut truncated = 0;
    let max = config.nilnop.max_diagnostics;
    if max > 0 && diags.len() > max {
        truncated = diags.len() - max;
        diags.truncate(max);
    }

    let counts = SeverityCounts::from_diagnostics(&diags);
    let summary = AnalysisSummary {
        total: diags.len(),
        critical: counts.critical,
        error: counts.error,
        warning: counts.warning,
        info: counts.info,
        packages_analyzed: program.packages.len(),
        functions_analyzed: program.functions().filter(|f| f.has_body()).count(),
        active_targets,
        truncated,
    };

    AnalysisOutput {
        diagnostics: diags,
        summary,
    }
}
