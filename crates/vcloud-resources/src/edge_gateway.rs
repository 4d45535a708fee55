//! Edge gateways.
//!
//! Datacenters do not link to their edge gateways, so they are located through the
//! query service by datacenter href and name.

use serde::{Deserialize, Serialize};
use tracing::debug;
use vcloud_core::types::{ResourceKind, EDGE_GATEWAY_MEDIA_TYPE};
use vcloud_core::urn::GatewayUrn;
use vcloud_core::{Connector, Entity, Link, Linked, Query, Resource};

use crate::models::{GatewayConfiguration, GatewayInterface};
use crate::Result;

/// An edge gateway bound to its connector.
pub type EdgeGateway<'c> = Entity<'c, EdgeGatewayRecord>;

/// Edge gateway representation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename = "EdgeGateway")]
pub struct EdgeGatewayRecord {
    /// Entity id
    #[serde(rename = "@id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<GatewayUrn>,
    /// Name
    #[serde(rename = "@name", default)]
    pub name: String,
    /// Href
    #[serde(rename = "@href", default)]
    pub href: String,
    /// Status code
    #[serde(rename = "@status", default, skip_serializing_if = "Option::is_none")]
    pub status: Option<i32>,
    /// Links
    #[serde(rename = "Link", default)]
    pub links: Vec<Link>,
    /// Description
    #[serde(rename = "Description", default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Interfaces and backing configuration
    #[serde(rename = "Configuration", default)]
    pub configuration: GatewayConfiguration,
}

impl EdgeGatewayRecord {
    /// All gateway interfaces, in server order.
    #[must_use]
    pub fn interfaces(&self) -> &[GatewayInterface] {
        &self.configuration.interfaces.interfaces
    }

    /// The interface called `name`.
    #[must_use]
    pub fn interface(&self, name: &str) -> Option<&GatewayInterface> {
        self.interfaces().iter().find(|iface| iface.name == name)
    }

    /// The interface attached to the network called `network`.
    #[must_use]
    pub fn interface_for_network(&self, network: &str) -> Option<&GatewayInterface> {
        self.interfaces()
            .iter()
            .find(|iface| iface.network.name == network)
    }
}

impl Linked for EdgeGatewayRecord {
    fn links(&self) -> &[Link] {
        &self.links
    }
}

impl Resource for EdgeGatewayRecord {
    const MEDIA_TYPE: &'static str = EDGE_GATEWAY_MEDIA_TYPE;
    const ELEMENTS: &'static [&'static str] = &["EdgeGateway"];

    fn href(&self) -> &str {
        &self.href
    }

    fn name(&self) -> Option<&str> {
        Some(&self.name)
    }
}

/// Find the edge gateway called `name` in the datacenter at `vdc_href`.
///
/// # Errors
///
/// Returns [`Error::NotFound`](vcloud_core::Error::NotFound) if the query matches no
/// gateway of that name, otherwise any error from the query or the fetch.
pub async fn find_edge_gateway<'c>(
    connector: &'c Connector,
    vdc_href: &str,
    name: &str,
) -> Result<EdgeGateway<'c>> {
    let records = Query::for_kind(ResourceKind::EdgeGateway)
        .with_filter("vdc", vdc_href)
        .records(connector)
        .await?;
    let record = records.find(name)?;
    debug!(name, href = %record.href, "Found edge gateway");
    EdgeGateway::fetch(connector, &record.href).await
}
