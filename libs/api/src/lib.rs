//! # rigger-api
//!
//! Client for a CloudStack-style management API.
//!
//! Every request is a signed `GET` on one endpoint. Commands that take a
//! while answer with a job ID; [`Client::execute`] follows the job to its
//! result so callers always see the finished resource.
//!
//! Creating a resource goes through a typed config implementing
//! [`CreateSpec`]. The result carries the decoded DTO and a
//! [`ResourceHandle`](rigger_lifecycle::ResourceHandle) that knows how to
//! delete it again. The client implements
//! [`Deleter`](rigger_lifecycle::Deleter) so teardown can replay those
//! deletes.

mod client;
mod config;
mod de;
mod error;
mod principal;
mod resource;
pub mod commands;
pub mod signing;

pub use client::Client;
pub use config::{ClientConfig, DEFAULT_ENDPOINT};
pub use error::{ApiError, PARAM_ERROR};
pub use principal::Principal;
pub use resource::{CreateSpec, Created, ListQuery, Params, RemoteResource};
