//! Orchestration for `decompose run`.

use anyhow::{Context, Result};
use thiserror::Error;
use tracing::{debug, info};

use crate::core::engine::{Decomposer, StuckPolicy};
use crate::core::expand::decompose_once;
use crate::core::tree::OpTree;
use crate::io::config::{Settings, StuckMode};
use crate::library::{Library, Op};

/// Stuck error raised under `on_stuck = "error"`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("operation {0} is not kept and cannot be decomposed")]
pub struct StuckOperation(pub String);

/// Structured outcome of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every operation was kept or could not be decomposed further.
    Complete(Vec<Op>),
    /// An operation got stuck; carries the error message.
    Stuck(String),
    /// `--once` was requested for an operation that cannot be expanded.
    NotExpandable(String),
}

/// Parse `ops` against `library` and decompose them under `settings`.
///
/// With `once`, each operation is expanded exactly one level instead.
/// Configuration errors are returned as `Err`; stuck operations are an outcome.
pub fn run_ops(
    library: &Library,
    settings: &Settings,
    ops: &[String],
    once: bool,
) -> Result<RunOutcome> {
    let parsed = ops
        .iter()
        .map(|text| {
            library
                .parse_op(text)
                .with_context(|| format!("parse operation '{text}'"))
        })
        .collect::<Result<Vec<Op>>>()?;
    debug!(ops = parsed.len(), once, "running");
    if let Some(keep) = &settings.keep {
        library.check_known(keep).context("settings.keep")?;
    }

    if once {
        return Ok(expand_each_once(&parsed));
    }

    let mut decomposer = Decomposer::new();
    if let Some(keep) = settings.keep.clone() {
        decomposer =
            decomposer.keep(move |op: &Op| keep.iter().any(|name| name == op.gate_name()));
    }
    if library.has_intercepts() {
        decomposer = decomposer.intercepting(library.intercepting());
    }
    if library.has_fallbacks() {
        decomposer = decomposer.fallback(library.fallback());
    }
    let decomposer = decomposer.on_stuck(stuck_policy(settings.on_stuck));

    match decomposer.decompose(OpTree::seq(parsed)) {
        Ok(output) => {
            info!(output = output.len(), "decomposition complete");
            Ok(RunOutcome::Complete(output))
        }
        Err(err) if err.is_stuck() => Ok(RunOutcome::Stuck(err.to_string())),
        Err(err) => Err(err.into()),
    }
}

fn stuck_policy<'a>(mode: Option<StuckMode>) -> StuckPolicy<'a, Op, StuckOperation> {
    match mode {
        None => StuckPolicy::Default,
        Some(StuckMode::Error) => {
            StuckPolicy::with(|op: &Op| Some(StuckOperation(op.to_string())))
        }
        Some(StuckMode::Keep) => StuckPolicy::Keep,
    }
}

fn expand_each_once(ops: &[Op]) -> RunOutcome {
    let mut output = Vec::new();
    for op in ops {
        match decompose_once(op) {
            Ok(items) => output.extend(items),
            Err(err) => return RunOutcome::NotExpandable(err.to_string()),
        }
    }
    RunOutcome::Complete(output)
}
