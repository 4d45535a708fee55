//! Media types and resource kinds.
//!
//! The API identifies every representation by a vendor media type; links carry that
//! media type so clients can pick the right target without parsing hrefs.

use serde::{Deserialize, Serialize};

/// Default API version requested in the `Accept` header
pub const DEFAULT_API_VERSION: &str = "5.5";
/// Header carrying the session token
pub const AUTH_HEADER: &str = "x-vcloud-authorization";
/// Session endpoint path
pub const SESSIONS_PATH: &str = "/api/sessions";
/// Organization list path
pub const ORG_LIST_PATH: &str = "/api/org";
/// Generic query endpoint path
pub const QUERY_PATH: &str = "/api/query";
/// XML namespace of the v1.5 schema family
pub const VCLOUD_NAMESPACE: &str = "http://www.vmware.com/vcloud/v1.5";

/// Organization media type
pub const ORG_MEDIA_TYPE: &str = "application/vnd.vmware.vcloud.org+xml";
/// Organization list media type
pub const ORG_LIST_MEDIA_TYPE: &str = "application/vnd.vmware.vcloud.orgList+xml";
/// Virtual datacenter media type
pub const VDC_MEDIA_TYPE: &str = "application/vnd.vmware.vcloud.vdc+xml";
/// Organization network media type
pub const ORG_NETWORK_MEDIA_TYPE: &str = "application/vnd.vmware.vcloud.orgNetwork+xml";
/// Organization VDC network media type
pub const ORG_VDC_NETWORK_MEDIA_TYPE: &str = "application/vnd.vmware.vcloud.orgVdcNetwork+xml";
/// Edge gateway media type
pub const EDGE_GATEWAY_MEDIA_TYPE: &str = "application/vnd.vmware.admin.edgeGateway+xml";
/// vApp media type
pub const VAPP_MEDIA_TYPE: &str = "application/vnd.vmware.vcloud.vApp+xml";
/// vApp template media type
pub const VAPP_TEMPLATE_MEDIA_TYPE: &str = "application/vnd.vmware.vcloud.vAppTemplate+xml";
/// vApp template instantiation request media type
pub const INSTANTIATE_VAPP_MEDIA_TYPE: &str =
    "application/vnd.vmware.vcloud.instantiateVAppTemplateParams+xml";
/// Catalog media type
pub const CATALOG_MEDIA_TYPE: &str = "application/vnd.vmware.vcloud.catalog+xml";
/// Task media type
pub const TASK_MEDIA_TYPE: &str = "application/vnd.vmware.vcloud.task+xml";
/// Query result records media type
pub const QUERY_RECORDS_MEDIA_TYPE: &str = "application/vnd.vmware.vcloud.query.records+xml";

/// Link relation used for creation links
pub const REL_ADD: &str = "add";

/// `Accept` header value for an API version.
#[must_use]
pub fn accept_header(api_version: &str) -> String {
    format!("application/*+xml;version={api_version}")
}

/// Resource kinds reachable through the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResourceKind {
    /// Organization
    Org,
    /// Virtual datacenter (resource pool)
    Vdc,
    /// Organization network
    OrgNetwork,
    /// Organization VDC network
    OrgVdcNetwork,
    /// Edge gateway
    EdgeGateway,
    /// vApp
    VApp,
    /// vApp template
    VAppTemplate,
    /// Catalog
    Catalog,
    /// Task
    Task,
}

impl ResourceKind {
    /// Returns the `type` value understood by the query endpoint.
    #[must_use]
    pub const fn query_type(&self) -> &'static str {
        match self {
            Self::Org => "organization",
            Self::Vdc => "orgVdc",
            Self::OrgNetwork => "orgNetwork",
            Self::OrgVdcNetwork => "orgVdcNetwork",
            Self::EdgeGateway => "edgeGateway",
            Self::VApp => "vApp",
            Self::VAppTemplate => "vAppTemplate",
            Self::Catalog => "catalog",
            Self::Task => "task",
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.query_type())
    }
}
