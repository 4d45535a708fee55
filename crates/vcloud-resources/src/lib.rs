//! Typed resources for the vCloud Director API.
//!
//! This crate maps the organization, datacenter, network, edge gateway and vApp
//! representations and adds typed navigation on top of the generic link resolution in
//! [`vcloud_core`].

#![deny(missing_docs)]

pub mod edge_gateway;
pub mod models;
pub mod network;
pub mod org;
pub mod vapp;
pub mod vdc;

pub use edge_gateway::{find_edge_gateway, EdgeGateway, EdgeGatewayRecord};
pub use network::{Network, NetworkRecord};
pub use org::{get_org, list_orgs, Org, OrgList, OrgNavigation, OrgRecord};
pub use vapp::{VApp, VAppNavigation, VAppRecord, VAppStatus};
pub use vdc::{Datacenter, VdcNavigation, VdcRecord};

/// Convenient result alias that reuses the shared vCloud error type.
pub type Result<T> = vcloud_core::Result<T>;
