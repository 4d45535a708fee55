//! The generic `/api/query` search endpoint.
//!
//! Queries are built with [`Query`] and always request `format=records`. Filters use
//! the server's `field==value` syntax; multiple filters are joined with `;` (AND).

use serde::{Deserialize, Serialize};
use tracing::debug;
use url::form_urlencoded;

use crate::connector::Connector;
use crate::envelope::ApiResponse;
use crate::error::{Error, Result};
use crate::link::{Link, Linked, Resource};
use crate::types::{ResourceKind, QUERY_PATH, QUERY_RECORDS_MEDIA_TYPE};

/// Builder for a typed records query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    resource_type: String,
    filters: Vec<(String, String)>,
    page: Option<u32>,
    page_size: Option<u32>,
}

impl Query {
    /// Query records of the given server-side type, e.g. `edgeGateway`.
    #[must_use]
    pub fn new(resource_type: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            filters: Vec::new(),
            page: None,
            page_size: None,
        }
    }

    /// Query records of a known resource kind.
    #[must_use]
    pub fn for_kind(kind: ResourceKind) -> Self {
        Self::new(kind.query_type())
    }

    /// Add a `field==value` condition.
    #[must_use]
    pub fn with_filter(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.push((field.into(), value.into()));
        self
    }

    /// Request a specific result page (1-based).
    #[must_use]
    pub const fn with_page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    /// Set the number of records per page.
    #[must_use]
    pub const fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = Some(page_size);
        self
    }

    /// The server-side record type being queried.
    #[must_use]
    pub fn resource_type(&self) -> &str {
        &self.resource_type
    }

    /// Relative href of the query, with every parameter URL-encoded.
    #[must_use]
    pub fn href(&self) -> String {
        let mut params = form_urlencoded::Serializer::new(String::new());
        params.append_pair("type", &self.resource_type);
        params.append_pair("format", "records");
        if !self.filters.is_empty() {
            let filter = self
                .filters
                .iter()
                .map(|(field, value)| format!("{field}=={value}"))
                .collect::<Vec<_>>()
                .join(";");
            params.append_pair("filter", &filter);
        }
        if let Some(page) = self.page {
            params.append_pair("page", &page.to_string());
        }
        if let Some(page_size) = self.page_size {
            params.append_pair("pageSize", &page_size.to_string());
        }
        format!("{QUERY_PATH}?{}", params.finish())
    }

    /// Run the query and return the raw response.
    ///
    /// # Errors
    ///
    /// Fails with whatever [`Connector::get`] raised.
    pub async fn run(&self, connector: &Connector) -> Result<ApiResponse> {
        let href = self.href();
        debug!(query = %href, "Running query");
        connector.get(&href).await
    }

    /// Run the query and decode the result records.
    ///
    /// # Errors
    ///
    /// Fails with whatever [`Connector::get`] raised, or [`Error::Decode`] if the body is
    /// not a records result.
    pub async fn records(&self, connector: &Connector) -> Result<QueryResultRecords> {
        self.run(connector).await?.decode_resource()
    }
}

/// One row of a records query. Attributes a record type does not carry stay empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRecord {
    /// Record name
    #[serde(rename = "@name", default)]
    pub name: String,
    /// Href of the underlying resource
    #[serde(rename = "@href", default)]
    pub href: String,
    /// Href of the owning VDC
    #[serde(rename = "@vdc", default, skip_serializing_if = "Option::is_none")]
    pub vdc: Option<String>,
    /// Name of the owning VDC
    #[serde(rename = "@vdcName", default, skip_serializing_if = "Option::is_none")]
    pub vdc_name: Option<String>,
    /// Resource status as reported by the query service
    #[serde(rename = "@status", default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Whether the resource has a task in progress
    #[serde(rename = "@isBusy", default)]
    pub is_busy: bool,
    /// Gateway status (edge gateways)
    #[serde(rename = "@gatewayStatus", default, skip_serializing_if = "Option::is_none")]
    pub gateway_status: Option<String>,
    /// High availability status (edge gateways)
    #[serde(rename = "@haStatus", default, skip_serializing_if = "Option::is_none")]
    pub ha_status: Option<String>,
    /// Number of attached organization networks (edge gateways)
    #[serde(rename = "@numberOfOrgNetworks", default, skip_serializing_if = "Option::is_none")]
    pub number_of_org_networks: Option<u32>,
    /// Default gateway address (networks)
    #[serde(rename = "@defaultGateway", default, skip_serializing_if = "Option::is_none")]
    pub default_gateway: Option<String>,
    /// Netmask (networks)
    #[serde(rename = "@netmask", default, skip_serializing_if = "Option::is_none")]
    pub netmask: Option<String>,
    /// Name of the edge gateway or network this one connects to (networks)
    #[serde(rename = "@connectedTo", default, skip_serializing_if = "Option::is_none")]
    pub connected_to: Option<String>,
    /// Whether the resource is shared with other VDCs
    #[serde(rename = "@isShared", default)]
    pub is_shared: bool,
}

/// Result of a records query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename = "QueryResultRecords")]
pub struct QueryResultRecords {
    /// Href of this result page
    #[serde(rename = "@href", default)]
    pub href: String,
    /// Total number of matching records
    #[serde(rename = "@total", default)]
    pub total: u32,
    /// Page size used
    #[serde(rename = "@pageSize", default)]
    pub page_size: u32,
    /// Current page (1-based)
    #[serde(rename = "@page", default)]
    pub page: u32,
    /// Paging and alternate-format links
    #[serde(rename = "Link", default)]
    pub links: Vec<Link>,
    /// Organization records
    #[serde(rename = "OrgRecord", default)]
    pub orgs: Vec<QueryRecord>,
    /// VDC records
    #[serde(rename = "OrgVdcRecord", default)]
    pub vdcs: Vec<QueryRecord>,
    /// Organization network records
    #[serde(rename = "OrgNetworkRecord", default)]
    pub org_networks: Vec<QueryRecord>,
    /// Organization VDC network records
    #[serde(rename = "OrgVdcNetworkRecord", default)]
    pub org_vdc_networks: Vec<QueryRecord>,
    /// Edge gateway records
    #[serde(rename = "EdgeGatewayRecord", default)]
    pub edge_gateways: Vec<QueryRecord>,
    /// vApp records
    #[serde(rename = "VAppRecord", default)]
    pub vapps: Vec<QueryRecord>,
    /// vApp template records
    #[serde(rename = "VAppTemplateRecord", default)]
    pub vapp_templates: Vec<QueryRecord>,
    /// Catalog records
    #[serde(rename = "CatalogRecord", default)]
    pub catalogs: Vec<QueryRecord>,
}

impl QueryResultRecords {
    /// Every record in the result, whatever its type.
    pub fn records(&self) -> impl Iterator<Item = &QueryRecord> {
        self.orgs
            .iter()
            .chain(&self.vdcs)
            .chain(&self.org_networks)
            .chain(&self.org_vdc_networks)
            .chain(&self.edge_gateways)
            .chain(&self.vapps)
            .chain(&self.vapp_templates)
            .chain(&self.catalogs)
    }

    /// Returns true when the query matched nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records().next().is_none()
    }

    /// The first record with the given name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no record has that name.
    pub fn find(&self, name: &str) -> Result<&QueryRecord> {
        self.records()
            .find(|record| record.name == name)
            .ok_or_else(|| Error::NotFound(format!("can't find record named `{name}`")))
    }
}

impl Linked for QueryResultRecords {
    fn links(&self) -> &[Link] {
        &self.links
    }
}

impl Resource for QueryResultRecords {
    const MEDIA_TYPE: &'static str = QUERY_RECORDS_MEDIA_TYPE;
    const ELEMENTS: &'static [&'static str] = &["QueryResultRecords"];

    fn href(&self) -> &str {
        &self.href
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConnectorConfig;
    use crate::envelope::decode_xml;
    use url::Url;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const VDC_HREF: &str = "https://vcd.example.com/api/vdc/5d0f";

    const RECORDS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<QueryResultRecords xmlns="http://www.vmware.com/vcloud/v1.5" total="2" pageSize="25" page="1"
    type="application/vnd.vmware.vcloud.query.records+xml"
    href="https://vcd.example.com/api/query?type=edgeGateway&amp;page=1&amp;pageSize=25&amp;format=records">
    <Link rel="alternate" type="application/vnd.vmware.vcloud.query.references+xml"
        href="https://vcd.example.com/api/query?type=edgeGateway&amp;page=1&amp;pageSize=25&amp;format=references"/>
    <EdgeGatewayRecord vdc="https://vcd.example.com/api/vdc/5d0f" numberOfOrgNetworks="2" numberOfExtNetworks="1"
        name="edge-a" isBusy="false" haStatus="DISABLED" gatewayStatus="READY"
        href="https://vcd.example.com/api/admin/edgeGateway/aa01" isSyslogServerSettingInSync="true"/>
    <EdgeGatewayRecord vdc="https://vcd.example.com/api/vdc/5d0f" numberOfOrgNetworks="0"
        name="edge-b" isBusy="true" gatewayStatus="BUSY"
        href="https://vcd.example.com/api/admin/edgeGateway/bb02"/>
</QueryResultRecords>"#;

    fn pairs(href: &str) -> Vec<(String, String)> {
        let url = Url::parse("https://vcd.example.com").unwrap().join(href).unwrap();
        url.query_pairs().into_owned().collect()
    }

    #[test]
    fn href_encodes_filter() {
        let query = Query::for_kind(ResourceKind::EdgeGateway).with_filter("vdc", VDC_HREF);
        let href = query.href();

        assert!(href.starts_with("/api/query?type=edgeGateway&format=records&filter="));
        assert!(href.contains("vdc%3D%3Dhttps%3A%2F%2Fvcd.example.com%2Fapi%2Fvdc%2F5d0f"));
        assert_eq!(
            pairs(&href),
            vec![
                ("type".to_string(), "edgeGateway".to_string()),
                ("format".to_string(), "records".to_string()),
                ("filter".to_string(), format!("vdc=={VDC_HREF}")),
            ]
        );
    }

    #[test]
    fn href_without_filter_or_paging() {
        assert_eq!(
            Query::new("vApp").href(),
            "/api/query?type=vApp&format=records"
        );
    }

    #[test]
    fn href_joins_filters_and_pages() {
        let query = Query::new("orgVdcNetwork")
            .with_filter("name", "web net")
            .with_filter("vdc", "v1")
            .with_page(2)
            .with_page_size(50);
        let decoded = pairs(&query.href());
        assert_eq!(decoded[2].1, "name==web net;vdc==v1");
        assert_eq!(decoded[3], ("page".to_string(), "2".to_string()));
        assert_eq!(decoded[4], ("pageSize".to_string(), "50".to_string()));
    }

    #[test]
    fn decode_edge_gateway_records() {
        let result: QueryResultRecords = decode_xml(RECORDS.as_bytes()).unwrap();
        assert_eq!(result.total, 2);
        assert_eq!(result.edge_gateways.len(), 2);
        assert_eq!(result.links.len(), 1);

        let edge = result.find("edge-b").unwrap();
        assert!(edge.is_busy);
        assert_eq!(edge.gateway_status.as_deref(), Some("BUSY"));
        assert_eq!(edge.vdc.as_deref(), Some(VDC_HREF));
        assert!(matches!(result.find("edge-c"), Err(Error::NotFound(_))));
    }

    #[test]
    fn empty_result_has_no_records() {
        let result: QueryResultRecords =
            decode_xml(br#"<QueryResultRecords total="0" page="1" pageSize="25"/>"#).unwrap();
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn records_sends_decoded_parameters() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/query"))
            .and(query_param("type", "edgeGateway"))
            .and(query_param("format", "records"))
            .and(query_param("filter", format!("vdc=={VDC_HREF}")))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("Content-Type", QUERY_RECORDS_MEDIA_TYPE)
                    .set_body_string(RECORDS),
            )
            .expect(1)
            .mount(&server)
            .await;

        let config = ConnectorConfig::new(server.uri(), "test@test", "test").unwrap();
        let connector = Connector::new(config).unwrap();

        let result = Query::for_kind(ResourceKind::EdgeGateway)
            .with_filter("vdc", VDC_HREF)
            .records(&connector)
            .await
            .unwrap();
        assert_eq!(result.find("edge-a").unwrap().number_of_org_networks, Some(2));
    }

    #[tokio::test]
    async fn records_rejects_other_documents() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/query"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"<Vdc name="x"/>"#))
            .mount(&server)
            .await;

        let config = ConnectorConfig::new(server.uri(), "test@test", "test").unwrap();
        let connector = Connector::new(config).unwrap();

        let err = Query::new("vApp").records(&connector).await.unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }
}
