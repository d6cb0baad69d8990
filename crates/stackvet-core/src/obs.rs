//! Structured observability hooks for validation run lifecycle events.
//!
//! This module provides:
//! - Run-scoped tracing spans via the `RunSpan` RAII guard
//! - Emission functions for key lifecycle events: run start, check
//!   completion, run finish, provisioning and teardown failures
//!
//! Events are emitted at `info!` level (filterable via `RUST_LOG`).

use tracing::info;

/// RAII guard that enters a run-scoped tracing span for the duration of a
/// validation run.
pub struct RunSpan {
    _span: tracing::span::EnteredSpan,
}

impl RunSpan {
    /// Create and enter a span tagged with the run_id.
    pub fn enter(run_id: &str) -> Self {
        let span = tracing::info_span!("stackvet.run", run_id = %run_id);
        Self {
            _span: span.entered(),
        }
    }
}

/// Emit event: run started with region and check count.
pub fn emit_run_started(run_id: &str, region: &str, checks: usize) {
    info!(event = "run.started", run_id = %run_id, region = %region, checks = checks);
}

/// Emit event: one check completed.
pub fn emit_check_completed(run_id: &str, check: &str, passed: bool, duration_ms: u64) {
    info!(
        event = "check.completed",
        run_id = %run_id,
        check = %check,
        passed = passed,
        duration_ms = duration_ms,
    );
}

/// Emit event: run finished with counts and overall status.
pub fn emit_run_finished(run_id: &str, duration_ms: u64, passed: usize, failed: usize, success: bool) {
    info!(
        event = "run.finished",
        run_id = %run_id,
        duration_ms = duration_ms,
        passed = passed,
        failed = failed,
        success = success,
    );
}

/// Emit event: the apply step failed before any check ran (error level).
pub fn emit_provision_failed(run_id: &str, error: &dyn std::fmt::Display) {
    tracing::error!(event = "run.provision_failed", run_id = %run_id, error = %error);
}

/// Emit event: best-effort teardown failed (warning level).
pub fn emit_teardown_failed(run_id: &str, error: &dyn std::fmt::Display) {
    tracing::warn!(event = "run.teardown_failed", run_id = %run_id, error = %error);
}
