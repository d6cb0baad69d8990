//! Per-check outcome types.

use serde::{Deserialize, Serialize};

/// Status of a completed validation check.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    Pass,
    Fail,
}

/// Outcome of one named validation check.
///
/// A check records every failing comparison (not just the first) plus the
/// comparisons that held, so a report shows both sides of a partial failure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CheckResult {
    /// Check name.
    pub name: String,

    /// Pass iff no comparison failed.
    pub status: CheckStatus,

    /// Comparisons that held, one line each.
    pub evidence: Vec<String>,

    /// Failing comparisons, in observation order.
    pub failures: Vec<String>,

    /// Wall-clock duration in milliseconds.
    pub duration_ms: u64,
}

impl CheckResult {
    /// Whether this check passed.
    pub fn passed(&self) -> bool {
        self.status == CheckStatus::Pass
    }

    /// The outcome without its timing, for comparing two runs of the same
    /// check.
    pub fn outcome(&self) -> (&str, CheckStatus, &[String], &[String]) {
        (&self.name, self.status, &self.evidence, &self.failures)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_result_passed() {
        let result = CheckResult {
            name: "vpc_config".to_string(),
            status: CheckStatus::Pass,
            evidence: vec!["vpc_cidr = 10.42.0.0/16".to_string()],
            failures: vec![],
            duration_ms: 12,
        };
        assert!(result.passed());
    }

    #[test]
    fn test_check_result_failed() {
        let result = CheckResult {
            name: "vpc_config".to_string(),
            status: CheckStatus::Fail,
            evidence: vec![],
            failures: vec!["vpc_cidr: expected 10.42.0.0/16, got 10.0.0.0/16".to_string()],
            duration_ms: 12,
        };
        assert!(!result.passed());
    }

    #[test]
    fn test_outcome_ignores_duration() {
        let a = CheckResult {
            name: "subnet_layout".to_string(),
            status: CheckStatus::Pass,
            evidence: vec!["3 private subnets".to_string()],
            failures: vec![],
            duration_ms: 5,
        };
        let mut b = a.clone();
        b.duration_ms = 900;
        assert_eq!(a.outcome(), b.outcome());
    }
}
