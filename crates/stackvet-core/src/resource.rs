//! Read-only descriptions of live cloud resources.
//!
//! Descriptors are snapshots taken at query time. They are never cached;
//! a check that needs fresh state issues a new query.

use serde::{Deserialize, Serialize};

/// A VPC as observed through the query adapter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VpcDescriptor {
    pub id: String,
    pub cidr: String,
}

/// A subnet as observed through the query adapter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubnetDescriptor {
    pub id: String,
    pub vpc_id: String,
    pub cidr: String,
    pub availability_zone: Option<String>,
}

/// How a VPC endpoint attaches to the network.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EndpointType {
    Interface,
    Gateway,
    Other(String),
}

impl EndpointType {
    pub fn is_interface(&self) -> bool {
        matches!(self, EndpointType::Interface)
    }

    pub fn is_gateway(&self) -> bool {
        matches!(self, EndpointType::Gateway)
    }
}

/// A VPC endpoint as observed through the query adapter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EndpointDescriptor {
    pub id: String,
    /// Full service name, e.g. `com.amazonaws.us-east-2.ssm`.
    pub service_name: String,
    pub endpoint_type: EndpointType,
}

impl EndpointDescriptor {
    /// The trailing service label (`ssm` in `com.amazonaws.us-east-2.ssm`).
    pub fn service_label(&self) -> &str {
        self.service_name
            .rsplit('.')
            .next()
            .unwrap_or(&self.service_name)
    }
}

/// A network interface attached to an instance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NetworkInterfaceDescriptor {
    pub id: String,
    /// Every private address on the interface, primary first.
    pub private_ips: Vec<String>,
}

/// An EC2 instance as observed through the query adapter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InstanceDescriptor {
    pub id: String,
    pub instance_type: String,
    /// Lifecycle state name (`pending`, `running`, ...).
    pub state: String,
    pub public_ip: Option<String>,
    pub private_ip: Option<String>,
    /// Metadata service token mode (`required` or `optional`).
    pub http_tokens: String,
    /// Metadata service endpoint state (`enabled` or `disabled`).
    pub http_endpoint: String,
    pub iam_instance_profile: Option<String>,
    pub security_group_ids: Vec<String>,
    pub network_interfaces: Vec<NetworkInterfaceDescriptor>,
}

impl InstanceDescriptor {
    /// Whether the instance carries a routable public address.
    pub fn has_public_ip(&self) -> bool {
        self.public_ip.as_deref().is_some_and(|ip| !ip.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_service_label() {
        let endpoint = EndpointDescriptor {
            id: "vpce-1".to_string(),
            service_name: "com.amazonaws.us-east-2.ssmmessages".to_string(),
            endpoint_type: EndpointType::Interface,
        };
        assert_eq!(endpoint.service_label(), "ssmmessages");
    }

    #[test]
    fn test_has_public_ip() {
        let mut instance = InstanceDescriptor {
            id: "i-1".to_string(),
            instance_type: "m6i.2xlarge".to_string(),
            state: "running".to_string(),
            public_ip: None,
            private_ip: Some("10.42.0.60".to_string()),
            http_tokens: "required".to_string(),
            http_endpoint: "enabled".to_string(),
            iam_instance_profile: Some("arn:aws:iam::123:instance-profile/x".to_string()),
            security_group_ids: vec!["sg-1".to_string()],
            network_interfaces: vec![],
        };
        assert!(!instance.has_public_ip());
        instance.public_ip = Some(String::new());
        assert!(!instance.has_public_ip());
        instance.public_ip = Some("3.3.3.3".to_string());
        assert!(instance.has_public_ip());
    }
}
