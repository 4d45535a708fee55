//! End-to-end navigation against a mock vCloud endpoint.
//!
//! Every fixture carries absolute `https://vcd.example.com` hrefs; the connector rebases
//! them onto the mock server, so these tests also cover href normalization.

use std::fs;
use std::path::PathBuf;
use vcloud_core::types::{
    AUTH_HEADER, INSTANTIATE_VAPP_MEDIA_TYPE, ORG_VDC_NETWORK_MEDIA_TYPE, TASK_MEDIA_TYPE,
    VAPP_TEMPLATE_MEDIA_TYPE,
};
use vcloud_core::{Connector, ConnectorConfig, Error, Link, PollPolicy, Submitted, TaskOutcome};
use vcloud_resources::models::{InstantiateVAppTemplateParams, FENCE_MODE_BRIDGED};
use vcloud_resources::{
    get_org, list_orgs, NetworkRecord, OrgNavigation, VAppNavigation, VdcNavigation,
};
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ORG_ID: &str = "9b1a4a3e-4a52-4d44-9a57-6d3a0fb3f0a1";
const VDC_ID: &str = "5d0f7a3c-8e1b-4c2d-9f3e-1a2b3c4d5e6f";
const WEB_NETWORK_ID: &str = "1f2e3d4c-5b6a-4978-8a9b-0c1d2e3f4a5b";
const EDGE_ID: &str = "aa01bb02-cc03-4d04-8e05-ff0611223344";
const VAPP_ID: &str = "vapp-7c8d9e0f-1a2b-4c3d-8e4f-5a6b7c8d9e0f";
const TOKEN: &str = "f2b8e1c4d5a6";

fn fixture(name: &str) -> String {
    let fixture_path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name);
    fs::read_to_string(&fixture_path).unwrap_or_else(|e| {
        panic!(
            "Failed to read fixture at {}: {}",
            fixture_path.display(),
            e
        )
    })
}

fn task_xml(id: &str, status: &str) -> String {
    format!(
        r#"<Task xmlns="http://www.vmware.com/vcloud/v1.5" status="{status}" operationName="op" name="task" href="https://vcd.example.com/api/task/{id}"/>"#
    )
}

/// Serve `file` for authenticated GETs of `route`.
async fn serve(server: &MockServer, route: &str, file: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .and(header(AUTH_HEADER, TOKEN))
        .respond_with(ResponseTemplate::new(200).set_body_string(fixture(file)))
        .mount(server)
        .await;
}

/// Serve a task that reports `running` once, then `success`.
async fn serve_task(server: &MockServer, id: &str) {
    let route = format!("/api/task/{id}");
    Mock::given(method("GET"))
        .and(path(route.as_str()))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Type", TASK_MEDIA_TYPE)
                .set_body_string(task_xml(id, "running")),
        )
        .up_to_n_times(1)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(route.as_str()))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Type", TASK_MEDIA_TYPE)
                .set_body_string(task_xml(id, "success")),
        )
        .mount(server)
        .await;
}

/// Start a mock endpoint with the org tree mounted and return an authenticated connector.
async fn setup() -> (MockServer, Connector) {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/sessions"))
        .respond_with(ResponseTemplate::new(200).insert_header(AUTH_HEADER, TOKEN))
        .mount(&server)
        .await;

    serve(&server, "/api/org", "org_list.xml").await;
    serve(&server, &format!("/api/org/{ORG_ID}"), "org.xml").await;
    serve(&server, &format!("/api/vdc/{VDC_ID}"), "vdc.xml").await;
    serve(&server, &format!("/api/network/{WEB_NETWORK_ID}"), "network.xml").await;
    serve(&server, &format!("/api/vApp/{VAPP_ID}"), "vapp.xml").await;

    let config = ConnectorConfig::new(server.uri(), "admin@acme", "secret").unwrap();
    let connector = Connector::builder(config)
        .with_poll_policy(PollPolicy::immediate().with_max_attempts(10))
        .build()
        .unwrap();
    connector.authenticate().await.unwrap();

    (server, connector)
}

#[tokio::test]
async fn test_list_and_get_org() {
    let (_server, connector) = setup().await;

    let orgs = list_orgs(&connector).await.unwrap();
    let names: Vec<&str> = orgs.iter().map(|org| org.name.as_str()).collect();
    assert_eq!(names, vec!["System", "acme"]);

    let org = get_org(&connector, "acme").await.unwrap();
    assert_eq!(org.full_name, "Acme Corporation");
    assert_eq!(org.datacenters().len(), 1);
    assert_eq!(org.networks().len(), 2);
    assert_eq!(org.catalogs()[0].name, "public");
    assert!(std::ptr::eq(org.connector(), &connector));
}

#[tokio::test]
async fn test_get_unknown_org_is_not_found() {
    let (_server, connector) = setup().await;

    let err = get_org(&connector, "globex").await.unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn test_org_to_datacenter_to_vapp() {
    let (_server, connector) = setup().await;

    let org = get_org(&connector, "acme").await.unwrap();
    let vdc = org.datacenter("acme-vdc").await.unwrap();
    assert_eq!(vdc.vapps().len(), 1);
    assert_eq!(vdc.available_networks().len(), 2);

    let vapp = vdc.vapp("web-app").await.unwrap();
    assert!(vapp.deployed);

    let tasks = vapp.tasks();
    assert_eq!(tasks.len(), 1);
    assert!(!tasks[0].is_finished());

    let err = vdc.vapp("ubuntu-22").await.unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn test_org_network_and_vdc_network_resolve_same_resource() {
    let (_server, connector) = setup().await;

    let org = get_org(&connector, "acme").await.unwrap();
    let from_org = org.network("web").await.unwrap();
    let vdc = org.datacenter("acme-vdc").await.unwrap();
    let from_vdc = vdc.network("web").await.unwrap();

    assert_eq!(from_org.href, from_vdc.href);
    assert_eq!(from_vdc.gateway(), Some("10.10.0.1"));
    assert!(matches!(
        org.network("dmz").await.unwrap_err(),
        Error::NotFound(_)
    ));
}

#[tokio::test]
async fn test_edge_gateway_lookup_uses_query() {
    let (server, connector) = setup().await;
    Mock::given(method("GET"))
        .and(path("/api/query"))
        .and(query_param("type", "edgeGateway"))
        .and(query_param("format", "records"))
        .and(query_param(
            "filter",
            format!("vdc==https://vcd.example.com/api/vdc/{VDC_ID}"),
        ))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(fixture("edge_gateway_records.xml")),
        )
        .expect(2)
        .mount(&server)
        .await;
    serve(&server, &format!("/api/admin/edgeGateway/{EDGE_ID}"), "edge_gateway.xml").await;

    let org = get_org(&connector, "acme").await.unwrap();
    let vdc = org.datacenter("acme-vdc").await.unwrap();

    let gateway = vdc.edge_gateway("edge-a").await.unwrap();
    assert_eq!(gateway.name, "edge-a");
    assert_eq!(gateway.interface("web").unwrap().interface_type, "internal");

    let err = vdc.edge_gateway("edge-z").await.unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn test_create_network_and_wait() {
    let (server, connector) = setup().await;
    Mock::given(method("POST"))
        .and(path(format!("/api/admin/vdc/{VDC_ID}/networks").as_str()))
        .and(header("content-type", ORG_VDC_NETWORK_MEDIA_TYPE))
        .and(body_string_contains("<Gateway>192.168.50.1</Gateway>"))
        .respond_with(
            ResponseTemplate::new(201)
                .insert_header("Content-Type", TASK_MEDIA_TYPE)
                .set_body_string(task_xml("c0ffee00-0000-4000-8000-000000000001", "queued")),
        )
        .expect(1)
        .mount(&server)
        .await;
    serve_task(&server, "c0ffee00-0000-4000-8000-000000000001").await;

    let org = get_org(&connector, "acme").await.unwrap();
    let vdc = org.datacenter("acme-vdc").await.unwrap();

    let mut network = NetworkRecord::new("app");
    network.set_gateway("192.168.50.1");
    network.set_netmask("255.255.255.0");
    network.set_start_address("192.168.50.10");
    network.set_end_address("192.168.50.100");
    network.set_fence_mode("natRouted");
    network.set_edge_gateway(
        format!("https://vcd.example.com/api/admin/edgeGateway/{EDGE_ID}"),
        "edge-a",
    );

    let submitted = vdc.create_network(&network).await.unwrap();
    assert!(submitted.is_pending());
    let mut task = submitted.into_task().unwrap();
    assert_eq!(task.wait().await.unwrap(), TaskOutcome::Succeeded);
}

#[tokio::test]
async fn test_network_update_and_delete_use_admin_href() {
    let (server, connector) = setup().await;
    let admin_route = format!("/api/admin/network/{WEB_NETWORK_ID}");
    Mock::given(method("PUT"))
        .and(path(admin_route.as_str()))
        .and(body_string_contains("<Dns1>1.1.1.1</Dns1>"))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_string(task_xml("c0ffee00-0000-4000-8000-000000000002", "running")),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(admin_route.as_str()))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(task_xml("c0ffee00-0000-4000-8000-000000000003", "queued")),
        )
        .expect(1)
        .mount(&server)
        .await;
    serve_task(&server, "c0ffee00-0000-4000-8000-000000000002").await;

    let org = get_org(&connector, "acme").await.unwrap();
    let mut network = org.network("web").await.unwrap();
    network.set_dns1("1.1.1.1");

    let mut update = network.update().await.unwrap().unwrap();
    assert_eq!(update.wait().await.unwrap(), TaskOutcome::Succeeded);

    let removal = network.delete().await.unwrap().unwrap();
    assert!(removal.href.ends_with("c0ffee00-0000-4000-8000-000000000003"));
}

#[tokio::test]
async fn test_instantiate_vapp_template_returns_vapp() {
    let (server, connector) = setup().await;
    Mock::given(method("POST"))
        .and(path(format!("/api/vdc/{VDC_ID}/action/instantiateVAppTemplate").as_str()))
        .and(header("content-type", INSTANTIATE_VAPP_MEDIA_TYPE))
        .and(body_string_contains(r#"networkName="web""#))
        .and(body_string_contains("<FenceMode>bridged</FenceMode>"))
        .respond_with(ResponseTemplate::new(201).set_body_string(fixture("vapp.xml")))
        .expect(1)
        .mount(&server)
        .await;

    let org = get_org(&connector, "acme").await.unwrap();
    let vdc = org.datacenter("acme-vdc").await.unwrap();
    let web = vdc.available_networks()[0].clone();
    let template = Link::reference(
        VAPP_TEMPLATE_MEDIA_TYPE,
        "ubuntu-22",
        "https://vcd.example.com/api/vAppTemplate/vappTemplate-0a1b2c3d-4e5f-4a6b-8c7d-8e9f0a1b2c3d",
    );

    let params = InstantiateVAppTemplateParams::new("web-app", template)
        .with_network("web", web, FENCE_MODE_BRIDGED)
        .with_power_on(true);

    match vdc.instantiate_vapp_template(&params).await.unwrap() {
        Submitted::Done(vapp) => {
            assert_eq!(vapp.name, "web-app");
            assert_eq!(vapp.tasks().len(), 1);
        }
        Submitted::Pending(_) => panic!("expected the created vApp"),
    }
}

#[tokio::test]
async fn test_unauthenticated_request_is_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/org"))
        .respond_with(ResponseTemplate::new(401).set_body_string(
            r#"<Error xmlns="http://www.vmware.com/vcloud/v1.5" majorErrorCode="401" minorErrorCode="UNAUTHORIZED" message="Not authenticated"/>"#,
        ))
        .mount(&server)
        .await;

    let config = ConnectorConfig::new(server.uri(), "admin@acme", "secret").unwrap();
    let connector = Connector::new(config).unwrap();

    let err = list_orgs(&connector).await.unwrap_err();
    assert_eq!(err.status(), Some(401));
    assert_eq!(err.to_string(), "Not authenticated");
}

#[tokio::test]
async fn test_vapp_delete_returns_task() {
    let (server, connector) = setup().await;
    Mock::given(method("DELETE"))
        .and(path(format!("/api/vApp/{VAPP_ID}").as_str()))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Type", TASK_MEDIA_TYPE)
                .set_body_string(task_xml("c0ffee00-0000-4000-8000-000000000004", "running")),
        )
        .expect(1)
        .mount(&server)
        .await;
    serve_task(&server, "c0ffee00-0000-4000-8000-000000000004").await;

    let org = get_org(&connector, "acme").await.unwrap();
    let vdc = org.datacenter("acme-vdc").await.unwrap();
    let vapp = vdc.vapp("web-app").await.unwrap();

    let mut removal = vapp.delete().await.unwrap().unwrap();
    assert_eq!(removal.wait().await.unwrap(), TaskOutcome::Succeeded);
    assert!(removal.is_finished());
}
