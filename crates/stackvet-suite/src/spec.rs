//! Suite specification and identity.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Identity of one validation suite run.
///
/// The digest of the ordered check names makes reports of the same suite
/// comparable across runs, independent of run ids and timing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SuiteSpec {
    /// Directory holding the stack templates.
    pub template_dir: PathBuf,

    /// SHA-256 digest of ordered check names (deterministic).
    pub checks_digest: String,

    /// Region the suite runs against.
    pub region: String,

    /// Remote state key, when a backend is configured.
    pub backend_key: Option<String>,
}

impl SuiteSpec {
    /// Create a new suite specification.
    pub fn new(
        template_dir: PathBuf,
        check_names: &[String],
        region: String,
        backend_key: Option<String>,
    ) -> Self {
        let checks_digest = compute_checks_digest(check_names);
        Self {
            template_dir,
            checks_digest,
            region,
            backend_key,
        }
    }
}

/// Compute deterministic digest of ordered check names.
fn compute_checks_digest(names: &[String]) -> String {
    let mut hasher = Sha256::new();
    for name in names {
        hasher.update(name.as_bytes());
        hasher.update(b"\0");
    }
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suite_spec_new() {
        let names = vec!["vpc_config".to_string(), "subnet_layout".to_string()];
        let spec = SuiteSpec::new(
            PathBuf::from("../terraform"),
            &names,
            "us-east-2".to_string(),
            Some("tfstate/dev/test-infra.tfstate".to_string()),
        );

        assert_eq!(spec.template_dir, PathBuf::from("../terraform"));
        assert_eq!(spec.region, "us-east-2");
        assert!(!spec.checks_digest.is_empty());
    }

    #[test]
    fn test_checks_digest_deterministic() {
        let names1 = vec!["vpc_config".to_string(), "ec2_instance".to_string()];
        let names2 = vec!["vpc_config".to_string(), "ec2_instance".to_string()];

        assert_eq!(compute_checks_digest(&names1), compute_checks_digest(&names2));
    }

    #[test]
    fn test_checks_digest_order_sensitive() {
        let names1 = vec!["vpc_config".to_string(), "ec2_instance".to_string()];
        let names2 = vec!["ec2_instance".to_string(), "vpc_config".to_string()];

        assert_ne!(compute_checks_digest(&names1), compute_checks_digest(&names2));
    }
}
