//! Validation run orchestration.
//!
//! One run is: apply the stack, execute every check independently against
//! the resulting outputs, tear the stack down, report. Teardown executes on
//! every exit path — apply failure, check failures, cancellation, even a
//! panicking check — mirroring a deferred-cleanup guarantee.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use futures::FutureExt;
use tokio_util::sync::CancellationToken;
use tracing::info;
use uuid::Uuid;

use stackvet_core::obs::{
    emit_check_completed, emit_provision_failed, emit_run_finished, emit_run_started,
    emit_teardown_failed, RunSpan,
};
use stackvet_core::{CheckResult, Report};
use stackvet_infra::{Provisioner, ResourceQuery};

use crate::checks::{Assertions, CheckContext, NamedCheck};
use crate::config::SuiteConfig;
use crate::spec::SuiteSpec;

/// Sequences provision → checks → teardown for one suite.
pub struct ValidationHarness {
    provisioner: Arc<dyn Provisioner>,
    query: Arc<dyn ResourceQuery>,
}

impl ValidationHarness {
    pub fn new(provisioner: Arc<dyn Provisioner>, query: Arc<dyn ResourceQuery>) -> Self {
        Self { provisioner, query }
    }

    /// Execute one validation run.
    ///
    /// - Apply failure is fatal: no checks run, the report carries the
    ///   provisioning error.
    /// - An apply that yields no outputs is treated the same way; checks
    ///   must never resolve resource ids from an empty output set.
    /// - Each check runs to completion independently; failures and panics
    ///   are captured per check and never abort the run.
    /// - `cancel` aborts apply and skips remaining checks; in-flight polls
    ///   observe the same token.
    /// - `destroy` is invoked exactly once regardless of outcome.
    pub async fn run(
        &self,
        config: &SuiteConfig,
        checks: Vec<NamedCheck>,
        cancel: &CancellationToken,
    ) -> Report {
        let run_id = Uuid::new_v4().to_string();
        let started_at = Utc::now();

        let check_names: Vec<String> = checks.iter().map(|c| c.name.clone()).collect();
        let spec = SuiteSpec::new(
            config.stack.template_dir.clone(),
            &check_names,
            config.region.clone(),
            config.stack.backend.as_ref().map(|b| b.key.clone()),
        );

        let _span = RunSpan::enter(&run_id);
        emit_run_started(&run_id, &config.region, checks.len());

        let applied = tokio::select! {
            result = self.provisioner.apply(&config.stack) => Some(result),
            _ = cancel.cancelled() => None,
        };

        let mut provision_error = None;
        let mut cancelled = false;
        let mut results: Vec<CheckResult> = Vec::new();

        match applied {
            None => {
                cancelled = true;
                provision_error = Some("run cancelled during apply".to_string());
            }
            Some(Err(err)) => {
                emit_provision_failed(&run_id, &err);
                provision_error = Some(err.to_string());
            }
            Some(Ok(outputs)) if outputs.is_empty() => {
                provision_error = Some("apply succeeded but produced no outputs".to_string());
            }
            Some(Ok(outputs)) => {
                let cx = CheckContext {
                    outputs: &outputs,
                    region: &config.region,
                    query: self.query.as_ref(),
                    expect: &config.expect,
                    ssm_poll: config.ssm_poll,
                    stack: &config.stack,
                    cancel,
                };

                for check in &checks {
                    if cancel.is_cancelled() {
                        cancelled = true;
                        break;
                    }

                    info!(check = %check.name, "Running check");
                    let start = Instant::now();
                    let assertions =
                        match AssertUnwindSafe((check.run)(&cx)).catch_unwind().await {
                            Ok(assertions) => assertions,
                            Err(_) => {
                                let mut a = Assertions::new();
                                a.fail("check panicked during execution");
                                a
                            }
                        };
                    let duration_ms = start.elapsed().as_millis() as u64;

                    let result = assertions.into_result(&check.name, duration_ms);
                    emit_check_completed(&run_id, &check.name, result.passed(), duration_ms);
                    results.push(result);
                }
            }
        }

        // Teardown runs unconditionally, after cancellation included.
        let teardown_error = match self.provisioner.destroy(&config.stack).await {
            Ok(()) => None,
            Err(err) => {
                emit_teardown_failed(&run_id, &err);
                Some(err.to_string())
            }
        };

        let finished_at = Utc::now();
        let success =
            provision_error.is_none() && !cancelled && results.iter().all(|r| r.passed());

        let report = Report {
            run_id: run_id.clone(),
            suite_digest: spec.checks_digest,
            region: config.region.clone(),
            started_at,
            finished_at,
            provision_error,
            checks: results,
            teardown_error,
            cancelled,
            success,
        };

        emit_run_finished(
            &run_id,
            report.duration_ms(),
            report.passed_count(),
            report.failed_count(),
            report.success,
        );

        report
    }
}
