//! Suite configuration and parameterized expectations.
//!
//! Every literal the checks compare against lives here, not in the check
//! code: CIDR blocks, endpoint service lists, the instance type, the private
//! IP layout, and the names of the outputs themselves. The defaults describe
//! the dev environment; `--expectations` swaps in another via JSON.

use serde::{Deserialize, Serialize};

use stackvet_core::PollConfig;
use stackvet_infra::StackConfig;

/// Names of the stack outputs the checks consume.
///
/// The source infrastructure has shipped under two naming schemes
/// (`instance_id` vs `ec2_instance_id`), so keys are configuration rather
/// than literals baked into the checks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct OutputKeys {
    pub vpc_id: String,
    pub vpc_cidr: String,
    pub instance_id: String,
    pub private_subnet_ids: String,
    pub public_subnet_ids: String,
    pub static_private_ips: String,
    pub primary_eni_id: String,
    pub ssm_connect_command: String,
    /// Per-service endpoint id outputs are named `<prefix><service>_id`.
    pub endpoint_id_prefix: String,
    pub scheduler_start_rule_arn: String,
    pub scheduler_stop_rule_arn: String,
    pub scheduler_lambda_arn: String,
}

impl OutputKeys {
    /// The output key carrying the endpoint id for a service.
    pub fn endpoint_id(&self, service: &str) -> String {
        format!("{}{}_id", self.endpoint_id_prefix, service)
    }
}

impl Default for OutputKeys {
    fn default() -> Self {
        Self {
            vpc_id: "vpc_id".to_string(),
            vpc_cidr: "vpc_cidr".to_string(),
            instance_id: "instance_id".to_string(),
            private_subnet_ids: "private_subnet_ids".to_string(),
            public_subnet_ids: "public_subnet_ids".to_string(),
            static_private_ips: "static_private_ips".to_string(),
            primary_eni_id: "primary_eni_id".to_string(),
            ssm_connect_command: "ssm_connect_command".to_string(),
            endpoint_id_prefix: "vpc_endpoint_".to_string(),
            scheduler_start_rule_arn: "scheduler_start_rule_arn".to_string(),
            scheduler_stop_rule_arn: "scheduler_stop_rule_arn".to_string(),
            scheduler_lambda_arn: "scheduler_lambda_arn".to_string(),
        }
    }
}

/// Expected address set of the instance's primary network interface.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PrimaryInterfaceIps {
    /// Total private addresses on the interface.
    pub total: usize,

    /// Addresses that must all be present.
    pub must_include: Vec<String>,
}

/// Expected shape of the additional static private IP output list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StaticIps {
    pub count: usize,

    /// Every address must start with this prefix (membership in the VPC
    /// block).
    pub cidr_prefix: String,
}

/// Everything the checks compare observed state against.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Expectations {
    pub vpc_cidr: String,

    /// Private subnet CIDRs, order-correlated with the id output list.
    pub private_subnet_cidrs: Vec<String>,

    /// Public subnet CIDRs, compared as a set.
    pub public_subnet_cidrs: Vec<String>,

    /// Services that must each have exactly one Interface endpoint.
    pub interface_endpoint_services: Vec<String>,

    /// Services that must each have exactly one Gateway endpoint.
    pub gateway_endpoint_services: Vec<String>,

    pub instance_type: String,
    pub http_tokens: String,
    pub http_endpoint: String,
    pub network_interface_count: usize,

    /// Primary-interface address expectation; `null` disables it.
    pub primary_interface_ips: Option<PrimaryInterfaceIps>,

    /// Static address-list expectation; `null` disables it.
    pub static_ips: Option<StaticIps>,

    pub output_keys: OutputKeys,
}

impl Default for Expectations {
    fn default() -> Self {
        Self {
            vpc_cidr: "10.42.0.0/16".to_string(),
            private_subnet_cidrs: vec![
                "10.42.0.0/20".to_string(),
                "10.42.16.0/20".to_string(),
                "10.42.32.0/20".to_string(),
            ],
            public_subnet_cidrs: vec![
                "10.42.240.0/24".to_string(),
                "10.42.241.0/24".to_string(),
            ],
            interface_endpoint_services: vec![
                "ssm".to_string(),
                "ssmmessages".to_string(),
                "ec2messages".to_string(),
                "logs".to_string(),
            ],
            gateway_endpoint_services: vec!["s3".to_string()],
            instance_type: "m6i.2xlarge".to_string(),
            http_tokens: "required".to_string(),
            http_endpoint: "enabled".to_string(),
            network_interface_count: 1,
            primary_interface_ips: Some(PrimaryInterfaceIps {
                total: 6,
                must_include: vec![
                    "10.42.0.60".to_string(),
                    "10.42.0.61".to_string(),
                    "10.42.0.62".to_string(),
                    "10.42.0.63".to_string(),
                    "10.42.0.64".to_string(),
                    "10.42.0.65".to_string(),
                ],
            }),
            static_ips: Some(StaticIps {
                count: 5,
                cidr_prefix: "10.42.".to_string(),
            }),
            output_keys: OutputKeys::default(),
        }
    }
}

impl Expectations {
    /// Parse expectation overrides from a JSON document. Absent fields keep
    /// their defaults.
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

/// Everything one validation run needs.
#[derive(Debug, Clone)]
pub struct SuiteConfig {
    /// Provisioning parameters.
    pub stack: StackConfig,

    /// Region resolved once before the run; checks never read the
    /// environment themselves.
    pub region: String,

    pub expect: Expectations,

    /// Retry budget for the SSM manageability poll.
    pub ssm_poll: PollConfig,
}

impl SuiteConfig {
    pub fn new(stack: StackConfig, region: impl Into<String>) -> Self {
        Self {
            stack,
            region: region.into(),
            expect: Expectations::default(),
            ssm_poll: PollConfig::default(),
        }
    }

    pub fn with_expectations(mut self, expect: Expectations) -> Self {
        self.expect = expect;
        self
    }

    pub fn with_ssm_poll(mut self, poll: PollConfig) -> Self {
        self.ssm_poll = poll;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_expectations_match_dev_environment() {
        let expect = Expectations::default();
        assert_eq!(expect.vpc_cidr, "10.42.0.0/16");
        assert_eq!(expect.private_subnet_cidrs.len(), 3);
        assert_eq!(expect.public_subnet_cidrs.len(), 2);
        assert_eq!(expect.instance_type, "m6i.2xlarge");
        assert_eq!(expect.interface_endpoint_services.len(), 4);
        assert_eq!(expect.gateway_endpoint_services, vec!["s3"]);

        let primary = expect.primary_interface_ips.expect("primary ips expected");
        assert_eq!(primary.total, 6);
        assert!(primary.must_include.contains(&"10.42.0.65".to_string()));

        let static_ips = expect.static_ips.expect("static ips expected");
        assert_eq!(static_ips.count, 5);
    }

    #[test]
    fn test_output_keys_default_to_instance_id_variant() {
        let keys = OutputKeys::default();
        assert_eq!(keys.instance_id, "instance_id");
        assert_eq!(keys.endpoint_id("ssm"), "vpc_endpoint_ssm_id");
    }

    #[test]
    fn test_expectations_partial_json_override() {
        let expect = Expectations::from_json(
            r#"{
                "instance_type": "m5.xlarge",
                "output_keys": {"instance_id": "ec2_instance_id"},
                "static_ips": null
            }"#,
        )
        .expect("parse failed");

        assert_eq!(expect.instance_type, "m5.xlarge");
        assert_eq!(expect.output_keys.instance_id, "ec2_instance_id");
        // Unmentioned fields keep their defaults
        assert_eq!(expect.vpc_cidr, "10.42.0.0/16");
        assert_eq!(expect.output_keys.vpc_id, "vpc_id");
        assert!(expect.static_ips.is_none());
        assert!(expect.primary_interface_ips.is_some());
    }
}
