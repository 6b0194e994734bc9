//! `formsync replay`: drive a designer session from recorded edit batches.

#[cfg(test)]
#[path = "replay_test.rs"]
mod replay_test;

use convert::{Converter, TypesRegistry};
use designer::{DesignerSession, Outgoing};
use formcache::{FormCache, FormDefinition, ReconcileReport, Reconciler, ReconcilerOptions, SortMode};
use serde_json::Value;
use tracing::{debug, info};
use wire::DesignBatch;

use crate::error::CliError;

/// One batch file: its name (for messages) and JSONL text.
pub struct BatchFile<'a> {
    pub path: &'a str,
    pub text: &'a str,
}

#[derive(Debug, Default)]
pub struct ReplayOutcome {
    pub reports: Vec<ReconcileReport>,
    /// Everything the session queued, across all batches.
    pub outgoing: Vec<Outgoing>,
    pub orphans_dropped: usize,
    pub snapshot: Value,
}

/// Build a form cache from `form`, then apply every batch line of every
/// file in order. Blank lines are skipped.
///
/// # Errors
///
/// Returns [`CliError::Convert`] when `specs` is not a spec map and
/// [`CliError::Batch`] for the first line that is not a valid batch. Batches
/// before the bad line stay applied.
pub fn replay(specs: &Value, form: &FormDefinition, files: &[BatchFile<'_>], sort_mode: SortMode) -> Result<ReplayOutcome, CliError> {
    let mut registry = TypesRegistry::new();
    let registered = registry.add_component_client_side_specs(specs)?;
    debug!(specs = registered, "component specifications registered");

    let conv = Converter::new(&registry);
    let reconciler = Reconciler::new(ReconcilerOptions { sort_mode, ..ReconcilerOptions::default() });
    let mut session = DesignerSession::new(FormCache::from_definition(form), reconciler);
    let mut outcome = ReplayOutcome::default();

    for file in files {
        for (index, line) in file.text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let batch = DesignBatch::parse(line).map_err(|source| CliError::Batch {
                path: file.path.to_owned(),
                line: index + 1,
                source,
            })?;
            let report = session.apply_batch(&batch, &conv);
            let outgoing = session.drain();
            info!(
                file = file.path,
                line = index + 1,
                refresh = report.refresh,
                render_ghosts = report.render_ghosts,
                redraw_decorators = report.redraw_decorators,
                queued = outgoing.len(),
                "batch replayed"
            );
            outcome.reports.push(report);
            outcome.outgoing.extend(outgoing);
        }
    }

    outcome.orphans_dropped = session.reconciler().orphans_dropped();
    outcome.snapshot = session.cache().snapshot();
    Ok(outcome)
}
