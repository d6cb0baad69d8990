//! stackvet-core — domain model for infrastructure validation runs.
//!
//! This crate holds the types every other stackvet crate speaks:
//! - [`StackOutputs`]: the named output values of one provisioning run
//! - resource descriptors: read-only snapshots of live cloud resources
//! - [`CheckResult`] / [`Report`]: per-check and aggregate run outcomes
//! - [`poll_until`]: bounded polling for eventually consistent conditions
//!
//! No adapter or orchestration logic lives here; see `stackvet-infra` for
//! the Terraform/AWS adapters and `stackvet-suite` for the harness.

pub mod check;
pub mod obs;
pub mod outputs;
pub mod poll;
pub mod report;
pub mod resource;
pub mod telemetry;

pub use check::{CheckResult, CheckStatus};
pub use outputs::{OutputError, OutputValue, StackOutputs};
pub use poll::{poll_until, PollConfig, PollOutcome};
pub use report::Report;
pub use resource::{
    EndpointDescriptor, EndpointType, InstanceDescriptor, NetworkInterfaceDescriptor,
    SubnetDescriptor, VpcDescriptor,
};
pub use telemetry::init_tracing;
