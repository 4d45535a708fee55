//! Virtual datacenters (VDCs).
//!
//! A datacenter lists its vApps under `ResourceEntities` and its networks under
//! `AvailableNetworks` rather than as plain links; navigation searches those lists
//! with the same media type and name rules as any other link set.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use vcloud_core::link::{find_link, find_links};
use vcloud_core::types::{
    INSTANTIATE_VAPP_MEDIA_TYPE, ORG_VDC_NETWORK_MEDIA_TYPE, REL_ADD, VAPP_MEDIA_TYPE,
    VDC_MEDIA_TYPE,
};
use vcloud_core::urn::VdcUrn;
use vcloud_core::{Entity, Error, Link, Linked, Resource, Submitted};

use crate::edge_gateway::{find_edge_gateway, EdgeGateway};
use crate::models::{
    AvailableNetworks, ComputeCapacity, InstantiateVAppTemplateParams, ResourceEntities,
};
use crate::network::{Network, NetworkRecord};
use crate::vapp::{VApp, VAppRecord};
use crate::Result;

/// A datacenter bound to its connector.
pub type Datacenter<'c> = Entity<'c, VdcRecord>;

/// Datacenter representation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename = "Vdc")]
pub struct VdcRecord {
    /// Entity id
    #[serde(rename = "@id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<VdcUrn>,
    /// Name
    #[serde(rename = "@name", default)]
    pub name: String,
    /// Href
    #[serde(rename = "@href", default)]
    pub href: String,
    /// Creation status
    #[serde(rename = "@status", default, skip_serializing_if = "Option::is_none")]
    pub status: Option<i32>,
    /// Links
    #[serde(rename = "Link", default)]
    pub links: Vec<Link>,
    /// Description
    #[serde(rename = "Description", default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Allocation model, e.g. `AllocationVApp`
    #[serde(rename = "AllocationModel", default)]
    pub allocation_model: String,
    /// CPU and memory capacity
    #[serde(rename = "ComputeCapacity", default)]
    pub compute_capacity: ComputeCapacity,
    /// vApps, templates and media held by the datacenter
    #[serde(rename = "ResourceEntities", default)]
    pub resource_entities: ResourceEntities,
    /// Networks vApps can attach to
    #[serde(rename = "AvailableNetworks", default)]
    pub available_networks: AvailableNetworks,
    /// Maximum number of NICs
    #[serde(rename = "NicQuota", default)]
    pub nic_quota: u32,
    /// Maximum number of networks
    #[serde(rename = "NetworkQuota", default)]
    pub network_quota: u32,
    /// Number of vApps and VMs
    #[serde(rename = "VmQuota", default)]
    pub vm_quota: u32,
    /// Whether the datacenter accepts new workloads
    #[serde(rename = "IsEnabled", default)]
    pub is_enabled: bool,
}

impl Linked for VdcRecord {
    fn links(&self) -> &[Link] {
        &self.links
    }
}

impl Resource for VdcRecord {
    const MEDIA_TYPE: &'static str = VDC_MEDIA_TYPE;
    const ELEMENTS: &'static [&'static str] = &["Vdc"];

    fn href(&self) -> &str {
        &self.href
    }

    fn name(&self) -> Option<&str> {
        Some(&self.name)
    }
}

/// Typed navigation from a datacenter.
#[async_trait]
pub trait VdcNavigation<'c> {
    /// References to the datacenter's vApps.
    fn vapps(&self) -> Vec<&Link>;

    /// Fetch the vApp called `name`.
    async fn vapp(&self, name: &str) -> Result<VApp<'c>>;

    /// References to the networks vApps in this datacenter can use.
    fn available_networks(&self) -> &[Link];

    /// Fetch the available network called `name`.
    async fn network(&self, name: &str) -> Result<Network<'c>>;

    /// Look up the edge gateway called `name` through the query service.
    async fn edge_gateway(&self, name: &str) -> Result<EdgeGateway<'c>>;

    /// Create an organization VDC network.
    async fn create_network(&self, network: &NetworkRecord) -> Result<Submitted<'c, NetworkRecord>>;

    /// Create a vApp from a template.
    async fn instantiate_vapp_template(
        &self,
        params: &InstantiateVAppTemplateParams,
    ) -> Result<Submitted<'c, VAppRecord>>;
}

#[async_trait]
impl<'c> VdcNavigation<'c> for Datacenter<'c> {
    fn vapps(&self) -> Vec<&Link> {
        find_links(&self.resource_entities.entities, VAPP_MEDIA_TYPE)
    }

    async fn vapp(&self, name: &str) -> Result<VApp<'c>> {
        let link = find_link(&self.resource_entities.entities, VAPP_MEDIA_TYPE, name)
            .ok_or_else(|| {
                Error::NotFound(format!("can't find vApp `{name}` in datacenter {}", self.name))
            })?;
        self.resolve_link::<VAppRecord>(link).await
    }

    fn available_networks(&self) -> &[Link] {
        &self.available_networks.networks
    }

    async fn network(&self, name: &str) -> Result<Network<'c>> {
        // Available networks carry the generic network media type, so only the name
        // disambiguates; a matching org VDC network link is accepted as well.
        let link = self
            .available_networks
            .networks
            .iter()
            .find(|link| link.name == name)
            .or_else(|| self.find_link(ORG_VDC_NETWORK_MEDIA_TYPE, name))
            .ok_or_else(|| {
                Error::NotFound(format!(
                    "can't find network `{name}` in datacenter {}",
                    self.name
                ))
            })?;
        self.resolve_link::<NetworkRecord>(link).await
    }

    async fn edge_gateway(&self, name: &str) -> Result<EdgeGateway<'c>> {
        find_edge_gateway(self.connector(), &self.href, name).await
    }

    async fn create_network(
        &self,
        network: &NetworkRecord,
    ) -> Result<Submitted<'c, NetworkRecord>> {
        self.create(REL_ADD, ORG_VDC_NETWORK_MEDIA_TYPE, network).await
    }

    async fn instantiate_vapp_template(
        &self,
        params: &InstantiateVAppTemplateParams,
    ) -> Result<Submitted<'c, VAppRecord>> {
        self.create(REL_ADD, INSTANTIATE_VAPP_MEDIA_TYPE, params).await
    }
}
