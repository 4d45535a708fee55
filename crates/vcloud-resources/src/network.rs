//! Organization VDC networks.
//!
//! Networks are read under `/api/network/...` but updated and deleted under
//! `/api/admin/network/...`; [`Entity::update`] and [`Entity::delete`] target the
//! admin href through [`Resource::edit_href`].

use serde::{Deserialize, Serialize};
use url::Url;
use vcloud_core::types::{EDGE_GATEWAY_MEDIA_TYPE, ORG_VDC_NETWORK_MEDIA_TYPE, VCLOUD_NAMESPACE};
use vcloud_core::urn::NetworkUrn;
use vcloud_core::{Entity, Link, Linked, Resource};

use crate::models::{IpRange, IpRanges, IpScope, NetworkConfiguration, TasksInProgress};

/// A network bound to its connector.
pub type Network<'c> = Entity<'c, NetworkRecord>;

const USER_NETWORK_PATH: &str = "/api/network/";
const ADMIN_NETWORK_PATH: &str = "/api/admin/network/";

fn default_namespace() -> String {
    VCLOUD_NAMESPACE.to_string()
}

/// Organization VDC network representation, also used as the creation payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename = "OrgVdcNetwork")]
pub struct NetworkRecord {
    /// Default namespace
    #[serde(rename = "@xmlns", default = "default_namespace")]
    pub xmlns: String,
    /// Network name
    #[serde(rename = "@name", default)]
    pub name: String,
    /// Href
    #[serde(rename = "@href", default, skip_serializing_if = "String::is_empty")]
    pub href: String,
    /// Entity id
    #[serde(rename = "@id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<NetworkUrn>,
    /// Creation status
    #[serde(rename = "@status", default, skip_serializing_if = "Option::is_none")]
    pub status: Option<i32>,
    /// Links
    #[serde(rename = "Link", default, skip_serializing)]
    pub links: Vec<Link>,
    /// Description
    #[serde(rename = "Description", default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Tasks running against the network
    #[serde(rename = "Tasks", default, skip_serializing)]
    pub tasks: Option<TasksInProgress>,
    /// Addressing and fencing
    #[serde(rename = "Configuration", default)]
    pub configuration: NetworkConfiguration,
    /// Edge gateway routing the network
    #[serde(rename = "EdgeGateway", default, skip_serializing_if = "Option::is_none")]
    pub edge_gateway: Option<Link>,
    /// Whether other datacenters of the organization can use the network
    #[serde(rename = "IsShared", default)]
    pub is_shared: bool,
}

impl Default for NetworkRecord {
    fn default() -> Self {
        Self {
            xmlns: default_namespace(),
            name: String::new(),
            href: String::new(),
            id: None,
            status: None,
            links: Vec::new(),
            description: None,
            tasks: None,
            configuration: NetworkConfiguration::default(),
            edge_gateway: None,
            is_shared: false,
        }
    }
}

impl NetworkRecord {
    /// Start a creation payload for a network called `name`.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Href under which the network is managed.
    ///
    /// Only the path is rewritten; hrefs already under `/api/admin/network/` are
    /// returned unchanged.
    #[must_use]
    pub fn admin_href(&self) -> String {
        match Url::parse(&self.href) {
            Ok(mut url) => {
                let path = admin_path(url.path());
                url.set_path(&path);
                url.into()
            }
            Err(_) => admin_path(&self.href),
        }
    }

    /// The first IP scope, if any.
    #[must_use]
    pub fn ip_scope(&self) -> Option<&IpScope> {
        self.configuration.ip_scopes.scopes.first()
    }

    /// Gateway address of the first IP scope.
    #[must_use]
    pub fn gateway(&self) -> Option<&str> {
        self.ip_scope()?.gateway.as_deref()
    }

    /// Netmask of the first IP scope.
    #[must_use]
    pub fn netmask(&self) -> Option<&str> {
        self.ip_scope()?.netmask.as_deref()
    }

    /// Set whether the first IP scope is inherited.
    pub fn set_is_inherited(&mut self, inherited: bool) {
        self.ip_scope_mut().is_inherited = inherited;
    }

    /// Set the gateway address of the first IP scope.
    pub fn set_gateway(&mut self, gateway: impl Into<String>) {
        self.ip_scope_mut().gateway = Some(gateway.into());
    }

    /// Set the netmask of the first IP scope.
    pub fn set_netmask(&mut self, netmask: impl Into<String>) {
        self.ip_scope_mut().netmask = Some(netmask.into());
    }

    /// Enable or disable the first IP scope.
    pub fn set_is_enabled(&mut self, enabled: bool) {
        self.ip_scope_mut().is_enabled = Some(enabled);
    }

    /// Set the primary DNS server.
    pub fn set_dns1(&mut self, server: impl Into<String>) {
        self.ip_scope_mut().dns1 = Some(server.into());
    }

    /// Set the secondary DNS server.
    pub fn set_dns2(&mut self, server: impl Into<String>) {
        self.ip_scope_mut().dns2 = Some(server.into());
    }

    /// Set the DNS suffix.
    pub fn set_dns_suffix(&mut self, suffix: impl Into<String>) {
        self.ip_scope_mut().dns_suffix = Some(suffix.into());
    }

    /// Set the first address of the first static range.
    pub fn set_start_address(&mut self, address: impl Into<String>) {
        self.ip_range_mut().start_address = address.into();
    }

    /// Set the last address of the first static range.
    pub fn set_end_address(&mut self, address: impl Into<String>) {
        self.ip_range_mut().end_address = address.into();
    }

    /// Set whether MAC and IP assignments survive redeployments.
    pub fn set_retain_net_info(&mut self, retained: bool) {
        self.configuration.retain_net_info = retained;
    }

    /// Set the fence mode (`bridged`, `isolated`, `natRouted`).
    pub fn set_fence_mode(&mut self, mode: impl Into<String>) {
        self.configuration.fence_mode = mode.into();
    }

    /// Set whether the network is shared across datacenters.
    pub fn set_is_shared(&mut self, shared: bool) {
        self.is_shared = shared;
    }

    /// Route the network through the edge gateway at `href`.
    pub fn set_edge_gateway(&mut self, href: impl Into<String>, name: impl Into<String>) {
        self.edge_gateway = Some(Link::reference(EDGE_GATEWAY_MEDIA_TYPE, name, href));
    }

    fn ip_scope_mut(&mut self) -> &mut IpScope {
        let scopes = &mut self.configuration.ip_scopes.scopes;
        if scopes.is_empty() {
            scopes.push(IpScope::default());
        }
        &mut scopes[0]
    }

    fn ip_range_mut(&mut self) -> &mut IpRange {
        let ranges = &mut self
            .ip_scope_mut()
            .ip_ranges
            .get_or_insert_with(IpRanges::default)
            .ranges;
        if ranges.is_empty() {
            ranges.push(IpRange::default());
        }
        &mut ranges[0]
    }
}

fn admin_path(path: &str) -> String {
    path.replacen(USER_NETWORK_PATH, ADMIN_NETWORK_PATH, 1)
}

impl Linked for NetworkRecord {
    fn links(&self) -> &[Link] {
        &self.links
    }
}

impl Resource for NetworkRecord {
    const MEDIA_TYPE: &'static str = ORG_VDC_NETWORK_MEDIA_TYPE;
    const ELEMENTS: &'static [&'static str] = &["OrgVdcNetwork", "OrgNetwork"];

    fn href(&self) -> &str {
        &self.href
    }

    fn name(&self) -> Option<&str> {
        Some(&self.name)
    }

    fn edit_href(&self) -> String {
        self.admin_href()
    }
}
