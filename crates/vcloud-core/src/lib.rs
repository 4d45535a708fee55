//! # vcloud-core
//!
//! Protocol core for the vCloud Director REST API.
//!
//! Clients authenticate once through a [`Connector`], fetch a root resource, and then
//! navigate the API by following the typed links embedded in every representation.
//! Long-running server operations come back as [`Task`] handles that can be awaited.
//!
//! ## Modules
//!
//! - [`error`] - Error taxonomy and the API error decoder
//! - [`config`] - Connector configuration and validation
//! - [`client`] - HTTP client settings and the task polling policy
//! - [`connector`] - The authenticated request layer
//! - [`envelope`] - Response envelope and XML decoding helpers
//! - [`link`] - Hypermedia links and the linked-resource capability
//! - [`entity`] - Connector-bound resources and generic navigation
//! - [`query`] - The generic `/api/query` search endpoint
//! - [`task`] - Asynchronous task handles and the completion state machine
//! - [`types`] - Media types and resource kinds
//! - [`urn`] - Strongly-typed entity URNs

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod config;
pub mod connector;
pub mod entity;
pub mod envelope;
pub mod error;
pub mod link;
pub mod query;
pub mod task;
pub mod types;
pub mod urn;

// Re-export commonly used types
pub use client::{ClientConfig, PollPolicy};
pub use config::ConnectorConfig;
pub use connector::{Connector, ConnectorBuilder};
pub use entity::{Entity, Submitted};
pub use envelope::ApiResponse;
pub use error::{ApiErrorRecord, Error, Result};
pub use link::{Link, Linked, Resource};
pub use query::{Query, QueryRecord, QueryResultRecords};
pub use task::{Task, TaskOutcome, TaskRecord, TaskStatus};
