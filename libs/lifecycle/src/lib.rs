//! Resource lifecycle primitives.
//!
//! Everything a test creates on the control plane is recorded as a
//! [`ResourceHandle`] in a [`Registry`]. At scope exit the
//! [`TeardownSequencer`] drains the registry newest-first and deletes every
//! handle, isolating failures so one stuck resource never prevents attempts
//! on the rest.
//!
//! # Invariants
//!
//! - A registry never holds two handles with the same remote ID
//! - Draining visits handles in exact reverse creation order, at most once
//! - Every drained handle gets exactly one report entry
//! - Failures are aggregated and surfaced after the sweep, never mid-sweep

mod error;
mod handle;
mod registry;
mod report;
mod teardown;
pub mod wait;

pub use error::{DeleteError, HandleError, RegistryError, ReportError, TeardownError};
pub use handle::{DeleteAction, Deleter, HandleState, ResourceHandle};
pub use registry::Registry;
pub use report::{Outcome, TeardownEntry, TeardownReport};
pub use teardown::{CascadePolicy, TeardownSequencer};
pub use wait::{wait_until, WaitConfig, WaitError};
