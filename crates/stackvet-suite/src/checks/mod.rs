//! Builtin validation checks.
//!
//! Each check is a read-only function over [`CheckContext`]: it extracts
//! required outputs, optionally queries live resources, and records every
//! comparison into an [`Assertions`] recorder. Checks never mutate the
//! provisioned stack, never abort the run, and report all failing
//! comparisons rather than the first.

mod backend;
mod compute;
mod management;
mod network;

use futures::future::BoxFuture;
use tokio_util::sync::CancellationToken;

use stackvet_core::{CheckResult, CheckStatus, OutputError, PollConfig, StackOutputs};
use stackvet_infra::{ResourceQuery, StackConfig};

use crate::config::Expectations;

/// Shared, read-only context handed to every check.
pub struct CheckContext<'a> {
    pub outputs: &'a StackOutputs,
    pub region: &'a str,
    pub query: &'a dyn ResourceQuery,
    pub expect: &'a Expectations,
    pub ssm_poll: PollConfig,
    pub stack: &'a StackConfig,
    pub cancel: &'a CancellationToken,
}

/// A check body: borrows the context, resolves to its observations.
pub type CheckFn = for<'a> fn(&'a CheckContext<'a>) -> BoxFuture<'a, Assertions>;

/// A named validation check.
pub struct NamedCheck {
    pub name: String,

    /// Slow checks (live endpoint listing, long polls) are skippable in
    /// short mode.
    pub slow: bool,

    pub run: CheckFn,
}

impl NamedCheck {
    pub fn new(name: &str, run: CheckFn) -> Self {
        Self {
            name: name.to_string(),
            slow: false,
            run,
        }
    }

    pub fn slow(name: &str, run: CheckFn) -> Self {
        Self {
            name: name.to_string(),
            slow: true,
            run,
        }
    }
}

/// The builtin check set, in execution order.
pub fn builtin_checks() -> Vec<NamedCheck> {
    vec![
        NamedCheck::new("remote_backend", backend::remote_backend),
        NamedCheck::new("vpc_config", network::vpc_config),
        NamedCheck::new("subnet_layout", network::subnet_layout),
        NamedCheck::slow("vpc_endpoints", network::vpc_endpoints),
        NamedCheck::new("ec2_instance", compute::ec2_instance),
        NamedCheck::new("private_ips", compute::private_ips),
        NamedCheck::new("security_groups", compute::security_groups),
        NamedCheck::slow("ssm_managed", management::ssm_managed),
        NamedCheck::new("outputs_present", management::outputs_present),
        NamedCheck::slow("scheduler", management::scheduler),
    ]
}

/// Observation recorder for one check.
///
/// Every comparison lands here, pass or fail, so the report shows the full
/// picture of a partial failure.
#[derive(Debug, Default)]
pub struct Assertions {
    evidence: Vec<String>,
    failures: Vec<String>,
}

impl Assertions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a comparison that held.
    pub fn pass(&mut self, note: impl Into<String>) {
        self.evidence.push(note.into());
    }

    /// Record a failing comparison.
    pub fn fail(&mut self, diagnostic: impl Into<String>) {
        self.failures.push(diagnostic.into());
    }

    /// Compare for equality, recording either side.
    pub fn eq<T>(&mut self, label: &str, expected: T, actual: T)
    where
        T: PartialEq + std::fmt::Display,
    {
        if expected == actual {
            self.pass(format!("{label} = {actual}"));
        } else {
            self.fail(format!("{label}: expected {expected}, got {actual}"));
        }
    }

    /// Record an adapter error against a label, preserving its message.
    pub fn error(&mut self, label: &str, err: impl std::fmt::Display) {
        self.fail(format!("{label}: {err}"));
    }

    /// Read a required single-value output; a missing or empty key is a
    /// recorded failure and yields `None`.
    pub fn require_output<'o>(&mut self, outputs: &'o StackOutputs, key: &str) -> Option<&'o str> {
        match outputs.get(key) {
            Ok(value) => {
                self.pass(format!("output {key} = {value}"));
                Some(value)
            }
            Err(err) => {
                self.record_output_error(err);
                None
            }
        }
    }

    /// Read a required list output; a missing or empty key is a recorded
    /// failure and yields `None`.
    pub fn require_output_list<'o>(
        &mut self,
        outputs: &'o StackOutputs,
        key: &str,
    ) -> Option<&'o [String]> {
        match outputs.get_list(key) {
            Ok(values) => {
                self.pass(format!("output {key} has {} entries", values.len()));
                Some(values)
            }
            Err(err) => {
                self.record_output_error(err);
                None
            }
        }
    }

    fn record_output_error(&mut self, err: OutputError) {
        self.fail(err.to_string());
    }

    /// Whether no comparison failed so far.
    pub fn passed(&self) -> bool {
        self.failures.is_empty()
    }

    /// Finalize into a [`CheckResult`].
    pub fn into_result(self, name: &str, duration_ms: u64) -> CheckResult {
        let status = if self.failures.is_empty() {
            CheckStatus::Pass
        } else {
            CheckStatus::Fail
        };
        CheckResult {
            name: name.to_string(),
            status,
            evidence: self.evidence,
            failures: self.failures,
            duration_ms,
        }
    }
}
