//! # rigger-id
//!
//! Resource kinds and remote identifier types for the rigger harness.
//!
//! ## Design Principles
//!
//! - Identifiers are assigned by the remote control plane and treated as opaque
//! - Typed wrappers keep an account ID from being passed where a network ID is expected
//! - Every identifier can be qualified with its kind (`kind:id`) for reports and the CLI
//!
//! ## Qualified Format
//!
//! Examples:
//! - `account:8d5f0f42-3c38-4a3e-9d53-4b4a2f8f9c11`
//! - `virtual_machine:1f7b0a2e-5e43-4c55-8f55-0d7b9a4c2e10`
//! - `ssh_key_pair:d-1/alice/rigger-kp-x81ak2` (key pairs are identified by
//!   owner and name)

mod error;
mod kind;
mod macros;
mod types;

pub use error::IdError;
pub use kind::ResourceKind;
pub use types::*;
