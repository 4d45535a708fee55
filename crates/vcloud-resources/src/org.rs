//! Organizations and the organization list.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;
use vcloud_core::types::{
    CATALOG_MEDIA_TYPE, ORG_LIST_MEDIA_TYPE, ORG_LIST_PATH, ORG_MEDIA_TYPE,
    ORG_NETWORK_MEDIA_TYPE,
};
use vcloud_core::urn::OrgUrn;
use vcloud_core::{Connector, Entity, Error, Link, Linked, Resource};

use crate::network::{Network, NetworkRecord};
use crate::vdc::{Datacenter, VdcRecord};
use crate::Result;

/// An organization bound to its connector.
pub type Org<'c> = Entity<'c, OrgRecord>;

/// Organizations visible to the session (`GET /api/org`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename = "OrgList")]
pub struct OrgList {
    /// Href of the list
    #[serde(rename = "@href", default)]
    pub href: String,
    /// One reference per organization
    #[serde(rename = "Org", default)]
    pub orgs: Vec<Link>,
}

impl Linked for OrgList {
    fn links(&self) -> &[Link] {
        &self.orgs
    }
}

impl Resource for OrgList {
    const MEDIA_TYPE: &'static str = ORG_LIST_MEDIA_TYPE;
    const ELEMENTS: &'static [&'static str] = &["OrgList"];

    fn href(&self) -> &str {
        &self.href
    }
}

/// Organization representation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename = "Org")]
pub struct OrgRecord {
    /// Entity id
    #[serde(rename = "@id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<OrgUrn>,
    /// Short name
    #[serde(rename = "@name", default)]
    pub name: String,
    /// Href
    #[serde(rename = "@href", default)]
    pub href: String,
    /// Links to datacenters, catalogs, networks and more
    #[serde(rename = "Link", default)]
    pub links: Vec<Link>,
    /// Description
    #[serde(rename = "Description", default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Display name
    #[serde(rename = "FullName", default)]
    pub full_name: String,
}

impl Linked for OrgRecord {
    fn links(&self) -> &[Link] {
        &self.links
    }
}

impl Resource for OrgRecord {
    const MEDIA_TYPE: &'static str = ORG_MEDIA_TYPE;
    const ELEMENTS: &'static [&'static str] = &["Org"];

    fn href(&self) -> &str {
        &self.href
    }

    fn name(&self) -> Option<&str> {
        Some(&self.name)
    }
}

/// List the organizations the session can see.
///
/// # Errors
///
/// Fails with whatever [`Connector::get`] raised, or [`Error::Decode`] if the body
/// is not an organization list.
pub async fn list_orgs(connector: &Connector) -> Result<Vec<Link>> {
    let list: OrgList = connector.get(ORG_LIST_PATH).await?.decode_resource()?;
    debug!(count = list.orgs.len(), "Listed organizations");
    Ok(list.orgs)
}

/// Fetch the organization called `name`.
///
/// # Errors
///
/// Returns [`Error::NotFound`] if the session cannot see such an organization.
pub async fn get_org<'c>(connector: &'c Connector, name: &str) -> Result<Org<'c>> {
    let orgs = list_orgs(connector).await?;
    let org = orgs
        .iter()
        .find(|org| org.name == name)
        .ok_or_else(|| Error::NotFound(format!("can't find organization `{name}`")))?;
    Org::fetch(connector, &org.href).await
}

/// Typed navigation from an organization.
#[async_trait]
pub trait OrgNavigation<'c> {
    /// Links to the organization's datacenters.
    fn datacenters(&self) -> Vec<&Link>;

    /// Fetch the datacenter called `name`.
    async fn datacenter(&self, name: &str) -> Result<Datacenter<'c>>;

    /// Links to the organization's networks.
    fn networks(&self) -> Vec<&Link>;

    /// Fetch the organization network called `name`.
    async fn network(&self, name: &str) -> Result<Network<'c>>;

    /// Links to the organization's catalogs.
    fn catalogs(&self) -> Vec<&Link>;
}

#[async_trait]
impl<'c> OrgNavigation<'c> for Org<'c> {
    fn datacenters(&self) -> Vec<&Link> {
        self.children::<VdcRecord>()
    }

    async fn datacenter(&self, name: &str) -> Result<Datacenter<'c>> {
        self.child::<VdcRecord>(name).await
    }

    fn networks(&self) -> Vec<&Link> {
        self.find_links(ORG_NETWORK_MEDIA_TYPE)
    }

    async fn network(&self, name: &str) -> Result<Network<'c>> {
        let link = self.find_link(ORG_NETWORK_MEDIA_TYPE, name).ok_or_else(|| {
            Error::NotFound(format!("can't find network `{name}` in organization {}", self.name))
        })?;
        self.resolve_link::<NetworkRecord>(link).await
    }

    fn catalogs(&self) -> Vec<&Link> {
        self.find_links(CATALOG_MEDIA_TYPE)
    }
}
