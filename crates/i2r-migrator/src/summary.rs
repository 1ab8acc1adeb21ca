//! End-of-run summaries.
//!
//! Every summary is a set of `info` lines, one per kind, followed by the
//! names in each non-empty bucket. Failures are logged at `warn`.

use i2r_core::{KindOutcome, MigrationOutcome};

use crate::rewrite::RewriteReport;

/// Logs one summary block per processed kind.
pub fn log_outcome(outcome: &MigrationOutcome) {
    for kind in outcome.iter() {
        log_kind(kind);
    }
}

fn log_kind(outcome: &KindOutcome) {
    tracing::info!(
        kind = %outcome.kind,
        processed = outcome.processed,
        moved = outcome.moved.len(),
        already_remote = outcome.already_remote.len(),
        failed = outcome.failed.len(),
        "move summary"
    );
    log_names(outcome.kind.label(), "moved", &outcome.moved);
    log_names(outcome.kind.label(), "already remote", &outcome.already_remote);
    if !outcome.failed.is_empty() {
        tracing::warn!(
            kind = %outcome.kind,
            names = %outcome.failed.join(", "),
            "failed"
        );
    }
}

/// Logs the summary of a manifest rewrite pass.
pub fn log_rewrite(report: &RewriteReport) {
    tracing::info!(
        kind = report.label,
        processed = report.processed,
        updated = report.updated.len(),
        unchanged = report.unchanged.len(),
        failed = report.failed.len(),
        "rewrite summary"
    );
    log_names(report.label, "updated", &report.updated);
    if !report.failed.is_empty() {
        tracing::warn!(kind = report.label, names = %report.failed.join(", "), "failed");
    }
}

fn log_names(kind: &str, bucket: &str, names: &[String]) {
    if !names.is_empty() {
        tracing::info!(kind, names = %names.join(", "), "{bucket}");
    }
}
