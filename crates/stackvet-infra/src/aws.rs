//! AWS resource query adapter backed by the official SDK clients.
//!
//! The region is fixed at construction time; nothing in this module reads
//! the process environment after [`AwsResourceQuery::connect`] returns.

use async_trait::async_trait;

use aws_config::{BehaviorVersion, Region};
use aws_sdk_ec2::types::{Filter, VpcEndpointType};
use aws_sdk_ssm::types::{InstanceInformationStringFilter, PingStatus};

use stackvet_core::{
    EndpointDescriptor, EndpointType, InstanceDescriptor, NetworkInterfaceDescriptor,
    SubnetDescriptor, VpcDescriptor,
};

use crate::error::{InfraError, InfraResult};
use crate::traits::ResourceQuery;

/// SDK-backed [`ResourceQuery`] for one region.
pub struct AwsResourceQuery {
    ec2: aws_sdk_ec2::Client,
    ssm: aws_sdk_ssm::Client,
    s3: aws_sdk_s3::Client,
    region: String,
}

impl AwsResourceQuery {
    /// Build EC2, SSM and S3 clients for an explicitly chosen region.
    pub async fn connect(region: &str) -> Self {
        let config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .load()
            .await;

        Self {
            ec2: aws_sdk_ec2::Client::new(&config),
            ssm: aws_sdk_ssm::Client::new(&config),
            s3: aws_sdk_s3::Client::new(&config),
            region: region.to_string(),
        }
    }

    pub fn region(&self) -> &str {
        &self.region
    }
}

/// Wrap an SDK error with the operation that produced it, preserving the
/// full error chain in the message.
fn api_error<E>(operation: &'static str, err: E) -> InfraError
where
    E: std::error::Error + Send + Sync + 'static,
{
    InfraError::Api {
        operation,
        message: aws_sdk_ec2::error::DisplayErrorContext(err).to_string(),
    }
}

#[async_trait]
impl ResourceQuery for AwsResourceQuery {
    async fn vpc(&self, id: &str) -> InfraResult<VpcDescriptor> {
        let output = self
            .ec2
            .describe_vpcs()
            .vpc_ids(id)
            .send()
            .await
            .map_err(|e| api_error("ec2.describe_vpcs", e))?;

        let vpc = output.vpcs().first().ok_or_else(|| InfraError::NotFound {
            kind: "vpc",
            id: id.to_string(),
        })?;

        Ok(VpcDescriptor {
            id: vpc.vpc_id().unwrap_or(id).to_string(),
            cidr: vpc.cidr_block().unwrap_or_default().to_string(),
        })
    }

    async fn subnet(&self, id: &str) -> InfraResult<SubnetDescriptor> {
        let output = self
            .ec2
            .describe_subnets()
            .subnet_ids(id)
            .send()
            .await
            .map_err(|e| api_error("ec2.describe_subnets", e))?;

        let subnet = output
            .subnets()
            .first()
            .ok_or_else(|| InfraError::NotFound {
                kind: "subnet",
                id: id.to_string(),
            })?;

        Ok(SubnetDescriptor {
            id: subnet.subnet_id().unwrap_or(id).to_string(),
            vpc_id: subnet.vpc_id().unwrap_or_default().to_string(),
            cidr: subnet.cidr_block().unwrap_or_default().to_string(),
            availability_zone: subnet.availability_zone().map(str::to_string),
        })
    }

    async fn instance(&self, id: &str) -> InfraResult<InstanceDescriptor> {
        let output = self
            .ec2
            .describe_instances()
            .instance_ids(id)
            .send()
            .await
            .map_err(|e| api_error("ec2.describe_instances", e))?;

        let instance = output
            .reservations()
            .iter()
            .flat_map(|r| r.instances())
            .next()
            .ok_or_else(|| InfraError::NotFound {
                kind: "instance",
                id: id.to_string(),
            })?;

        let network_interfaces = instance
            .network_interfaces()
            .iter()
            .map(|eni| NetworkInterfaceDescriptor {
                id: eni.network_interface_id().unwrap_or_default().to_string(),
                private_ips: eni
                    .private_ip_addresses()
                    .iter()
                    .filter_map(|p| p.private_ip_address())
                    .map(str::to_string)
                    .collect(),
            })
            .collect();

        let metadata = instance.metadata_options();

        Ok(InstanceDescriptor {
            id: instance.instance_id().unwrap_or(id).to_string(),
            instance_type: instance
                .instance_type()
                .map(|t| t.as_str().to_string())
                .unwrap_or_default(),
            state: instance
                .state()
                .and_then(|s| s.name())
                .map(|n| n.as_str().to_string())
                .unwrap_or_default(),
            public_ip: instance.public_ip_address().map(str::to_string),
            private_ip: instance.private_ip_address().map(str::to_string),
            http_tokens: metadata
                .and_then(|m| m.http_tokens())
                .map(|t| t.as_str().to_string())
                .unwrap_or_default(),
            http_endpoint: metadata
                .and_then(|m| m.http_endpoint())
                .map(|e| e.as_str().to_string())
                .unwrap_or_default(),
            iam_instance_profile: instance
                .iam_instance_profile()
                .and_then(|p| p.arn())
                .map(str::to_string),
            security_group_ids: instance
                .security_groups()
                .iter()
                .filter_map(|g| g.group_id())
                .map(str::to_string)
                .collect(),
            network_interfaces,
        })
    }

    async fn vpc_endpoints(&self, vpc_id: &str) -> InfraResult<Vec<EndpointDescriptor>> {
        let output = self
            .ec2
            .describe_vpc_endpoints()
            .filters(Filter::builder().name("vpc-id").values(vpc_id).build())
            .send()
            .await
            .map_err(|e| api_error("ec2.describe_vpc_endpoints", e))?;

        Ok(output
            .vpc_endpoints()
            .iter()
            .map(|ep| EndpointDescriptor {
                id: ep.vpc_endpoint_id().unwrap_or_default().to_string(),
                service_name: ep.service_name().unwrap_or_default().to_string(),
                endpoint_type: match ep.vpc_endpoint_type() {
                    Some(VpcEndpointType::Interface) => EndpointType::Interface,
                    Some(VpcEndpointType::Gateway) => EndpointType::Gateway,
                    Some(other) => EndpointType::Other(other.as_str().to_string()),
                    None => EndpointType::Other("unknown".to_string()),
                },
            })
            .collect())
    }

    async fn is_managed_by_ssm(&self, instance_id: &str) -> InfraResult<bool> {
        let filter = InstanceInformationStringFilter::builder()
            .key("InstanceIds")
            .values(instance_id)
            .build()
            .map_err(|e| api_error("ssm.describe_instance_information", e))?;

        let output = self
            .ssm
            .describe_instance_information()
            .filters(filter)
            .send()
            .await
            .map_err(|e| api_error("ssm.describe_instance_information", e))?;

        Ok(output
            .instance_information_list()
            .iter()
            .any(|info| matches!(info.ping_status(), Some(PingStatus::Online))))
    }

    async fn bucket_exists(&self, bucket: &str) -> InfraResult<bool> {
        match self.s3.head_bucket().bucket(bucket).send().await {
            Ok(_) => Ok(true),
            Err(err)
                if err
                    .as_service_error()
                    .map(|e| e.is_not_found())
                    .unwrap_or(false) =>
            {
                Ok(false)
            }
            Err(err) => Err(api_error("s3.head_bucket", err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    /// End-to-end smoke test against a real account. Requires credentials
    /// and explicit opt-in via STACKVET_E2E=1.
    #[tokio::test]
    #[ignore]
    async fn test_connect_and_list_endpoints() {
        if env::var("STACKVET_E2E").is_err() {
            eprintln!("Skipping E2E test. Set STACKVET_E2E=1 to run");
            return;
        }

        let query = AwsResourceQuery::connect("us-east-2").await;
        assert_eq!(query.region(), "us-east-2");

        // A nonexistent bucket name in the account's namespace
        let exists = query
            .bucket_exists("stackvet-bucket-that-should-not-exist-7f3a")
            .await
            .expect("head_bucket failed");
        assert!(!exists);
    }
}
