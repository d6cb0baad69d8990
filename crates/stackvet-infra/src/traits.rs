//! Adapter trait definitions for stackvet.
//!
//! These traits define the two external seams of a validation run:
//! - `Provisioner`: apply/destroy a declarative stack, expose its outputs
//! - `ResourceQuery`: fetch live cloud-resource attributes by identifier
//!
//! Both are async and backend-agnostic. In-memory fakes are provided for
//! testing via the `fakes` module.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use stackvet_core::{
    EndpointDescriptor, InstanceDescriptor, StackOutputs, SubnetDescriptor, VpcDescriptor,
};

use crate::error::InfraResult;

/// Remote state backend settings.
///
/// Presence of a backend means state lives remotely and no local state file
/// is written to the template directory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BackendConfig {
    pub bucket: String,
    pub key: String,
    pub region: String,
}

/// Parameters for one provisioning run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StackConfig {
    /// Directory holding the stack templates.
    pub template_dir: PathBuf,

    /// Variable files passed to apply and destroy, in order.
    pub var_files: Vec<PathBuf>,

    /// Remote state backend, if any.
    pub backend: Option<BackendConfig>,

    /// Region the stack is provisioned in; exported to the child process.
    pub region: String,

    /// Extra environment for the child process.
    pub env: BTreeMap<String, String>,

    /// How many times a failed apply or destroy is retried.
    pub max_retries: u32,

    /// Fixed delay between retries.
    pub retry_delay: Duration,

    /// Per-command time budget.
    pub command_timeout: Duration,
}

impl StackConfig {
    /// A configuration with the default retry budget (3 retries, 5 seconds
    /// apart) and a one-hour per-command timeout.
    pub fn new(template_dir: impl Into<PathBuf>, region: impl Into<String>) -> Self {
        Self {
            template_dir: template_dir.into(),
            var_files: Vec::new(),
            backend: None,
            region: region.into(),
            env: BTreeMap::new(),
            max_retries: 3,
            retry_delay: Duration::from_secs(5),
            command_timeout: Duration::from_secs(3600),
        }
    }

    pub fn with_var_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.var_files.push(path.into());
        self
    }

    pub fn with_backend(mut self, backend: BackendConfig) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }
}

/// Applies and destroys a declarative stack.
#[async_trait]
pub trait Provisioner: Send + Sync {
    /// Apply the configuration synchronously and return its outputs.
    async fn apply(&self, config: &StackConfig) -> InfraResult<StackOutputs>;

    /// Tear the configuration down. Best-effort: callers must invoke it on
    /// every exit path, including after a failed apply.
    async fn destroy(&self, config: &StackConfig) -> InfraResult<()>;
}

/// Fetches live cloud-resource attributes by identifier.
///
/// All queries are read-only and safe to repeat; descriptors are snapshots,
/// never cached.
#[async_trait]
pub trait ResourceQuery: Send + Sync {
    async fn vpc(&self, id: &str) -> InfraResult<VpcDescriptor>;

    async fn subnet(&self, id: &str) -> InfraResult<SubnetDescriptor>;

    async fn instance(&self, id: &str) -> InfraResult<InstanceDescriptor>;

    /// Every endpoint attached to the given VPC.
    async fn vpc_endpoints(&self, vpc_id: &str) -> InfraResult<Vec<EndpointDescriptor>>;

    /// Whether the instance is currently registered with the SSM fleet
    /// manager. Eventually consistent after instance boot.
    async fn is_managed_by_ssm(&self, instance_id: &str) -> InfraResult<bool>;

    async fn bucket_exists(&self, bucket: &str) -> InfraResult<bool>;
}
