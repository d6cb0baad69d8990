//! stackvet-infra — adapters between the validation harness and the world.
//!
//! Two trait seams, each with a production implementation and an in-memory
//! fake:
//!
//! - [`Provisioner`]: applies and destroys a declarative stack and exposes
//!   its named outputs. Implemented by [`TerraformCli`] over the terraform
//!   (or tofu) binary.
//! - [`ResourceQuery`]: fetches live cloud-resource attributes by id.
//!   Implemented by [`AwsResourceQuery`] over the official SDK clients.
//!
//! The fakes in [`fakes`] satisfy both contracts without any external
//! dependencies, so the harness and every check are testable offline.

mod aws;
mod error;
pub mod fakes;
mod terraform;
pub mod traits;

pub use aws::AwsResourceQuery;
pub use error::{InfraError, InfraResult};
pub use terraform::TerraformCli;
pub use traits::{BackendConfig, Provisioner, ResourceQuery, StackConfig};
