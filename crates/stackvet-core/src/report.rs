//! Aggregate result of one validation run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::check::CheckResult;

/// Everything one validation run produced.
///
/// `success` holds iff provisioning succeeded, every check passed, and the
/// run was not cancelled. A teardown error is recorded but never flips a
/// check outcome; teardown is best-effort and always attempted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    /// Unique id of this run.
    pub run_id: String,

    /// Digest of the ordered check names, for comparing runs of one suite.
    pub suite_digest: String,

    /// Region the stack was provisioned and queried in.
    pub region: String,

    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,

    /// Fatal apply-step failure. When set, no checks ran.
    pub provision_error: Option<String>,

    /// Per-check outcomes in execution order.
    pub checks: Vec<CheckResult>,

    /// Teardown failure, if any. Teardown errors never mask check results.
    pub teardown_error: Option<String>,

    /// Whether the run was aborted by the external deadline.
    pub cancelled: bool,

    pub success: bool,
}

impl Report {
    /// Number of checks that passed.
    pub fn passed_count(&self) -> usize {
        self.checks.iter().filter(|c| c.passed()).count()
    }

    /// Number of checks that failed.
    pub fn failed_count(&self) -> usize {
        self.checks.iter().filter(|c| !c.passed()).count()
    }

    /// Total run duration in milliseconds.
    pub fn duration_ms(&self) -> u64 {
        (self.finished_at - self.started_at)
            .num_milliseconds()
            .max(0) as u64
    }

    /// Render the human-readable text form: one diagnostic line per check,
    /// failures indented beneath it.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("Run ID: {}\n", self.run_id));
        out.push_str(&format!("Region: {}\n", self.region));
        out.push_str(&format!(
            "Status: {}\n",
            if self.success { "✓ PASSED" } else { "✗ FAILED" }
        ));
        out.push_str(&format!("Duration: {}ms\n", self.duration_ms()));

        if let Some(ref err) = self.provision_error {
            out.push_str(&format!("\nProvisioning failed: {}\n", err));
        }

        if !self.checks.is_empty() {
            out.push('\n');
            for check in &self.checks {
                let mark = if check.passed() { "✓" } else { "✗" };
                out.push_str(&format!(
                    "  {} {} ({}ms)\n",
                    mark, check.name, check.duration_ms
                ));
                for failure in &check.failures {
                    out.push_str(&format!("      - {}\n", failure));
                }
            }
            out.push_str(&format!(
                "\nSummary: {}/{} checks passed\n",
                self.passed_count(),
                self.checks.len()
            ));
        }

        if self.cancelled {
            out.push_str("\nRun cancelled before completion\n");
        }
        if let Some(ref err) = self.teardown_error {
            out.push_str(&format!("\nTeardown failed (best-effort): {}\n", err));
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::CheckStatus;

    fn check(name: &str, status: CheckStatus) -> CheckResult {
        CheckResult {
            name: name.to_string(),
            status,
            evidence: vec![],
            failures: if status == CheckStatus::Fail {
                vec!["mismatch".to_string()]
            } else {
                vec![]
            },
            duration_ms: 10,
        }
    }

    fn report(checks: Vec<CheckResult>, success: bool) -> Report {
        let now = Utc::now();
        Report {
            run_id: "run123".to_string(),
            suite_digest: "abc123".to_string(),
            region: "us-east-2".to_string(),
            started_at: now,
            finished_at: now,
            provision_error: None,
            checks,
            teardown_error: None,
            cancelled: false,
            success,
        }
    }

    #[test]
    fn test_report_counts() {
        let r = report(
            vec![
                check("vpc_config", CheckStatus::Pass),
                check("subnet_layout", CheckStatus::Pass),
            ],
            true,
        );
        assert_eq!(r.passed_count(), 2);
        assert_eq!(r.failed_count(), 0);
        assert!(r.success);
    }

    #[test]
    fn test_report_counts_with_failures() {
        let r = report(
            vec![
                check("vpc_config", CheckStatus::Pass),
                check("ssm_managed", CheckStatus::Fail),
            ],
            false,
        );
        assert_eq!(r.passed_count(), 1);
        assert_eq!(r.failed_count(), 1);
        assert!(!r.success);
    }

    #[test]
    fn test_render_text_lists_failures() {
        let r = report(
            vec![
                check("vpc_config", CheckStatus::Pass),
                check("ssm_managed", CheckStatus::Fail),
            ],
            false,
        );
        let text = r.render_text();
        assert!(text.contains("✓ vpc_config"));
        assert!(text.contains("✗ ssm_managed"));
        assert!(text.contains("- mismatch"));
        assert!(text.contains("1/2 checks passed"));
    }

    #[test]
    fn test_report_json_round_trip() {
        let r = report(vec![check("vpc_config", CheckStatus::Pass)], true);
        let json = serde_json::to_string(&r).expect("serialize failed");
        let back: Report = serde_json::from_str(&json).expect("deserialize failed");
        assert_eq!(back.run_id, r.run_id);
        assert_eq!(back.checks.len(), 1);
        assert!(back.success);
    }
}
