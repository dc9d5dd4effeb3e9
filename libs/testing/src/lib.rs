//! # rigger-testing
//!
//! Harness pieces scenario tests are written against.
//!
//! - [`TestScope`]: a registry plus teardown policy for one test or class
//! - [`Suite`] and [`TestCase`]: class-level and per-test scopes, with
//!   cleanup warnings that never fail a test
//! - [`TestEnvironment`]: which cloud to target and which fixtures to use
//! - [`fake::FakeCloud`]: an in-memory control plane on a local endpoint
//! - [`names`]: unique names and random passwords

mod environment;
pub mod fake;
pub mod names;
mod scope;
mod suite;

pub use environment::{TestEnvironment, ENV_FILE_VAR};
pub use scope::TestScope;
pub use suite::{save_report, Cleanup, Suite, SuiteSummary, TestCase};

use tracing_subscriber::EnvFilter;

/// Install a test-friendly subscriber once; later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_test_writer()
        .try_init();
}
