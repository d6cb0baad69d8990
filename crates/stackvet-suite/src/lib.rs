//! stackvet-suite — validation harness and builtin checks.
//!
//! The harness sequences one validation run: apply the stack, execute the
//! checks independently against the resulting outputs, always tear the
//! stack down, and report per-check diagnostics plus an aggregate verdict.
//!
//! Checks are declarative assertions over a read-only [`CheckContext`];
//! the builtin set covers the network layout, the compute instance, remote
//! state, and SSM manageability (via the bounded poll in `stackvet-core`).

pub mod checks;
pub mod config;
pub mod harness;
pub mod spec;

pub use checks::{builtin_checks, Assertions, CheckContext, NamedCheck};
pub use config::{Expectations, OutputKeys, PrimaryInterfaceIps, StaticIps, SuiteConfig};
pub use harness::ValidationHarness;
pub use spec::SuiteSpec;
