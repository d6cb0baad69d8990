//! In-memory fakes for the adapter traits (testing only)
//!
//! Provides `FakeProvisioner` and `FakeResourceQuery` that satisfy the trait
//! contracts without touching terraform or the network. Both support
//! scripted failures so error paths are exercisable offline.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use stackvet_core::{
    EndpointDescriptor, InstanceDescriptor, StackOutputs, SubnetDescriptor, VpcDescriptor,
};

use crate::error::{InfraError, InfraResult};
use crate::traits::{Provisioner, ResourceQuery, StackConfig};

// ---------------------------------------------------------------------------
// FakeProvisioner
// ---------------------------------------------------------------------------

/// In-memory provisioner with scripted outputs and invocation counters.
#[derive(Debug, Default)]
pub struct FakeProvisioner {
    outputs: StackOutputs,
    apply_error: Option<String>,
    destroy_error: Option<String>,
    apply_calls: AtomicU32,
    destroy_calls: AtomicU32,
}

impl FakeProvisioner {
    /// A provisioner whose apply succeeds with the given outputs.
    pub fn new(outputs: StackOutputs) -> Self {
        Self {
            outputs,
            ..Default::default()
        }
    }

    /// A provisioner whose apply fails with the given message.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            apply_error: Some(message.into()),
            ..Default::default()
        }
    }

    /// Script a destroy failure on top of the current behavior.
    pub fn with_destroy_error(mut self, message: impl Into<String>) -> Self {
        self.destroy_error = Some(message.into());
        self
    }

    pub fn apply_count(&self) -> u32 {
        self.apply_calls.load(Ordering::SeqCst)
    }

    pub fn destroy_count(&self) -> u32 {
        self.destroy_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Provisioner for FakeProvisioner {
    async fn apply(&self, _config: &StackConfig) -> InfraResult<StackOutputs> {
        self.apply_calls.fetch_add(1, Ordering::SeqCst);
        match &self.apply_error {
            Some(message) => Err(InfraError::Terraform {
                command: "apply".to_string(),
                exit_code: 1,
                stderr: message.clone(),
            }),
            None => Ok(self.outputs.clone()),
        }
    }

    async fn destroy(&self, _config: &StackConfig) -> InfraResult<()> {
        self.destroy_calls.fetch_add(1, Ordering::SeqCst);
        match &self.destroy_error {
            Some(message) => Err(InfraError::Terraform {
                command: "destroy".to_string(),
                exit_code: 1,
                stderr: message.clone(),
            }),
            None => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// FakeResourceQuery
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct SsmScript {
    /// Number of unmanaged responses before the instance reports managed.
    managed_after: u32,
    calls: u32,
}

/// In-memory resource store backed by `Mutex<HashMap>`s.
///
/// Lookups of unknown ids return `InfraError::NotFound`, matching the real
/// adapter. SSM manageability is scripted per instance: the first
/// `managed_after` queries report unmanaged, everything after reports
/// managed — enough to drive the poll loop through both outcomes.
#[derive(Debug, Default)]
pub struct FakeResourceQuery {
    vpcs: Mutex<HashMap<String, VpcDescriptor>>,
    subnets: Mutex<HashMap<String, SubnetDescriptor>>,
    instances: Mutex<HashMap<String, InstanceDescriptor>>,
    endpoints: Mutex<HashMap<String, Vec<EndpointDescriptor>>>,
    buckets: Mutex<HashSet<String>>,
    ssm: Mutex<HashMap<String, SsmScript>>,
}

impl FakeResourceQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_vpc(self, vpc: VpcDescriptor) -> Self {
        self.vpcs.lock().unwrap().insert(vpc.id.clone(), vpc);
        self
    }

    pub fn with_subnet(self, subnet: SubnetDescriptor) -> Self {
        self.subnets
            .lock()
            .unwrap()
            .insert(subnet.id.clone(), subnet);
        self
    }

    pub fn with_instance(self, instance: InstanceDescriptor) -> Self {
        self.instances
            .lock()
            .unwrap()
            .insert(instance.id.clone(), instance);
        self
    }

    pub fn with_endpoints(self, vpc_id: impl Into<String>, eps: Vec<EndpointDescriptor>) -> Self {
        self.endpoints.lock().unwrap().insert(vpc_id.into(), eps);
        self
    }

    pub fn with_bucket(self, name: impl Into<String>) -> Self {
        self.buckets.lock().unwrap().insert(name.into());
        self
    }

    /// Report the instance as managed after `attempts` unmanaged responses
    /// (0 = managed immediately, `u32::MAX` = never).
    pub fn with_ssm_managed_after(self, instance_id: impl Into<String>, attempts: u32) -> Self {
        self.ssm.lock().unwrap().insert(
            instance_id.into(),
            SsmScript {
                managed_after: attempts,
                calls: 0,
            },
        );
        self
    }

    /// How many times SSM manageability was queried for the instance.
    pub fn ssm_calls(&self, instance_id: &str) -> u32 {
        self.ssm
            .lock()
            .unwrap()
            .get(instance_id)
            .map(|s| s.calls)
            .unwrap_or(0)
    }
}

#[async_trait]
impl ResourceQuery for FakeResourceQuery {
    async fn vpc(&self, id: &str) -> InfraResult<VpcDescriptor> {
        self.vpcs
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| InfraError::NotFound {
                kind: "vpc",
                id: id.to_string(),
            })
    }

    async fn subnet(&self, id: &str) -> InfraResult<SubnetDescriptor> {
        self.subnets
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| InfraError::NotFound {
                kind: "subnet",
                id: id.to_string(),
            })
    }

    async fn instance(&self, id: &str) -> InfraResult<InstanceDescriptor> {
        self.instances
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| InfraError::NotFound {
                kind: "instance",
                id: id.to_string(),
            })
    }

    async fn vpc_endpoints(&self, vpc_id: &str) -> InfraResult<Vec<EndpointDescriptor>> {
        Ok(self
            .endpoints
            .lock()
            .unwrap()
            .get(vpc_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn is_managed_by_ssm(&self, instance_id: &str) -> InfraResult<bool> {
        let mut ssm = self.ssm.lock().unwrap();
        match ssm.get_mut(instance_id) {
            Some(script) => {
                script.calls += 1;
                Ok(script.calls > script.managed_after)
            }
            None => Ok(false),
        }
    }

    async fn bucket_exists(&self, bucket: &str) -> InfraResult<bool> {
        Ok(self.buckets.lock().unwrap().contains(bucket))
    }
}
