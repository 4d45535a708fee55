//! Schema fragments shared by several resource representations.

use serde::{Deserialize, Serialize};
use vcloud_core::types::VCLOUD_NAMESPACE;
use vcloud_core::{Link, TaskRecord};

/// OVF envelope namespace, needed by vApp instantiation payloads.
pub const OVF_NAMESPACE: &str = "http://schemas.dmtf.org/ovf/envelope/1";

/// Fence mode connecting a network directly to its parent
pub const FENCE_MODE_BRIDGED: &str = "bridged";
/// Fence mode for a network with no external connectivity
pub const FENCE_MODE_ISOLATED: &str = "isolated";
/// Fence mode routing a network through NAT
pub const FENCE_MODE_NAT_ROUTED: &str = "natRouted";

/// A range of addresses inside an IP scope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpRange {
    /// First address of the range
    #[serde(rename = "StartAddress", default)]
    pub start_address: String,
    /// Last address of the range
    #[serde(rename = "EndAddress", default)]
    pub end_address: String,
}

/// Address ranges of an IP scope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpRanges {
    /// Ranges in server order
    #[serde(rename = "IpRange", default)]
    pub ranges: Vec<IpRange>,
}

/// Addresses of a scope handed to one edge gateway.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubAllocation {
    /// Gateway receiving the addresses
    #[serde(rename = "EdgeGateway", default, skip_serializing_if = "Option::is_none")]
    pub edge_gateway: Option<Link>,
    /// Allocated ranges
    #[serde(rename = "IpRanges", default, skip_serializing_if = "Option::is_none")]
    pub ip_ranges: Option<IpRanges>,
}

/// Sub-allocations of an IP scope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubAllocations {
    /// Allocations in server order
    #[serde(rename = "SubAllocation", default)]
    pub allocations: Vec<SubAllocation>,
}

/// Addresses already in use inside an IP scope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocatedIpAddresses {
    /// Allocated addresses
    #[serde(rename = "IpAddress", default)]
    pub addresses: Vec<String>,
}

/// Addressing of a network.
///
/// Field order follows the schema sequence, which the server enforces on updates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpScope {
    /// Whether the scope is inherited from the parent network
    #[serde(rename = "IsInherited", default)]
    pub is_inherited: bool,
    /// Gateway address
    #[serde(rename = "Gateway", default, skip_serializing_if = "Option::is_none")]
    pub gateway: Option<String>,
    /// Netmask
    #[serde(rename = "Netmask", default, skip_serializing_if = "Option::is_none")]
    pub netmask: Option<String>,
    /// Primary DNS server
    #[serde(rename = "Dns1", default, skip_serializing_if = "Option::is_none")]
    pub dns1: Option<String>,
    /// Secondary DNS server
    #[serde(rename = "Dns2", default, skip_serializing_if = "Option::is_none")]
    pub dns2: Option<String>,
    /// DNS suffix
    #[serde(rename = "DnsSuffix", default, skip_serializing_if = "Option::is_none")]
    pub dns_suffix: Option<String>,
    /// Whether the scope is enabled
    #[serde(rename = "IsEnabled", default, skip_serializing_if = "Option::is_none")]
    pub is_enabled: Option<bool>,
    /// Static address ranges
    #[serde(rename = "IpRanges", default, skip_serializing_if = "Option::is_none")]
    pub ip_ranges: Option<IpRanges>,
    /// Addresses in use
    #[serde(rename = "AllocatedIpAddresses", default, skip_serializing_if = "Option::is_none")]
    pub allocated_ip_addresses: Option<AllocatedIpAddresses>,
    /// Addresses handed to edge gateways
    #[serde(rename = "SubAllocations", default, skip_serializing_if = "Option::is_none")]
    pub sub_allocations: Option<SubAllocations>,
}

/// The IP scopes of a network.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpScopes {
    /// Scopes in server order
    #[serde(rename = "IpScope", default)]
    pub scopes: Vec<IpScope>,
}

impl IpScopes {
    /// Returns true if no scope is defined.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }
}

/// Configuration block of an organization VDC network.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfiguration {
    /// Addressing
    #[serde(rename = "IpScopes", default, skip_serializing_if = "IpScopes::is_empty")]
    pub ip_scopes: IpScopes,
    /// Parent network for bridged or routed networks
    #[serde(rename = "ParentNetwork", default, skip_serializing_if = "Option::is_none")]
    pub parent_network: Option<Link>,
    /// Fence mode (`bridged`, `isolated`, `natRouted`)
    #[serde(rename = "FenceMode", default)]
    pub fence_mode: String,
    /// Whether MAC and IP assignments survive redeployments
    #[serde(rename = "RetainNetInfoAcrossDeployments", default)]
    pub retain_net_info: bool,
}

/// CPU or memory capacity of a datacenter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capacity {
    /// Unit of the values, e.g. `MHz` or `MB`
    #[serde(rename = "Units", default)]
    pub units: String,
    /// Allocated capacity
    #[serde(rename = "Allocated", default)]
    pub allocated: i64,
    /// Capacity limit
    #[serde(rename = "Limit", default)]
    pub limit: i64,
    /// Reserved capacity
    #[serde(rename = "Reserved", default)]
    pub reserved: i64,
    /// Capacity in use
    #[serde(rename = "Used", default)]
    pub used: i64,
    /// Overhead
    #[serde(rename = "Overhead", default)]
    pub overhead: i64,
}

/// Compute capacity of a datacenter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputeCapacity {
    /// CPU capacity
    #[serde(rename = "Cpu", default)]
    pub cpu: Capacity,
    /// Memory capacity
    #[serde(rename = "Memory", default)]
    pub memory: Capacity,
}

/// Resources (vApps, templates, media) held by a datacenter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceEntities {
    /// Entity references
    #[serde(rename = "ResourceEntity", default)]
    pub entities: Vec<Link>,
}

/// Networks a datacenter can attach vApps to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailableNetworks {
    /// Network references
    #[serde(rename = "Network", default)]
    pub networks: Vec<Link>,
}

/// Tasks running against a resource.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TasksInProgress {
    /// Tasks in server order
    #[serde(rename = "Task", default)]
    pub tasks: Vec<TaskRecord>,
}

/// Address of an edge gateway on one of its subnets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubnetParticipation {
    /// Subnet gateway
    #[serde(rename = "Gateway", default)]
    pub gateway: String,
    /// Subnet netmask
    #[serde(rename = "Netmask", default)]
    pub netmask: String,
    /// Address of the edge gateway on the subnet
    #[serde(rename = "IpAddress", default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
}

/// One interface of an edge gateway.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayInterface {
    /// Interface name
    #[serde(rename = "Name", default)]
    pub name: String,
    /// Display name
    #[serde(rename = "DisplayName", default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Attached network
    #[serde(rename = "Network", default)]
    pub network: Link,
    /// `uplink` or `internal`
    #[serde(rename = "InterfaceType", default)]
    pub interface_type: String,
    /// Subnets the interface takes part in
    #[serde(rename = "SubnetParticipation", default)]
    pub subnet_participation: Vec<SubnetParticipation>,
    /// Whether the interface carries the default route
    #[serde(rename = "UseForDefaultRoute", default)]
    pub use_for_default_route: bool,
}

/// Interfaces of an edge gateway.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayInterfaces {
    /// Interfaces in server order
    #[serde(rename = "GatewayInterface", default)]
    pub interfaces: Vec<GatewayInterface>,
}

/// Configuration block of an edge gateway.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayConfiguration {
    /// Backing size, e.g. `compact` or `full`
    #[serde(rename = "GatewayBackingConfig", default)]
    pub backing_config: String,
    /// Interfaces
    #[serde(rename = "GatewayInterfaces", default)]
    pub interfaces: GatewayInterfaces,
    /// Whether high availability is enabled
    #[serde(rename = "HaEnabled", default)]
    pub ha_enabled: bool,
    /// Whether DNS relay uses the default route
    #[serde(rename = "UseDefaultRouteForDnsRelay", default)]
    pub use_default_route_for_dns_relay: bool,
}

/// Network wiring of a vApp being instantiated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VAppNetworkConfiguration {
    /// Network the vApp network connects to
    #[serde(rename = "ParentNetwork")]
    pub parent_network: Link,
    /// Fence mode
    #[serde(rename = "FenceMode")]
    pub fence_mode: String,
}

/// One vApp network.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VAppNetworkConfig {
    /// Name of the vApp network
    #[serde(rename = "@networkName")]
    pub network_name: String,
    /// Wiring
    #[serde(rename = "Configuration")]
    pub configuration: VAppNetworkConfiguration,
}

/// Network section of an instantiation request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfigSection {
    /// Section description required by the OVF schema
    #[serde(rename = "ovf:Info", default)]
    pub info: String,
    /// vApp networks
    #[serde(rename = "NetworkConfig", default)]
    pub networks: Vec<VAppNetworkConfig>,
}

/// Instantiation parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstantiationParams {
    /// Network section
    #[serde(rename = "NetworkConfigSection")]
    pub network_config_section: NetworkConfigSection,
}

/// Request body creating a vApp from a template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename = "InstantiateVAppTemplateParams")]
pub struct InstantiateVAppTemplateParams {
    /// Default namespace
    #[serde(rename = "@xmlns")]
    pub xmlns: String,
    /// OVF namespace
    #[serde(rename = "@xmlns:ovf")]
    pub xmlns_ovf: String,
    /// Name of the new vApp
    #[serde(rename = "@name")]
    pub name: String,
    /// Deploy after instantiation
    #[serde(rename = "@deploy")]
    pub deploy: bool,
    /// Power on after instantiation
    #[serde(rename = "@powerOn")]
    pub power_on: bool,
    /// Description of the new vApp
    #[serde(rename = "Description", default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Network wiring
    #[serde(rename = "InstantiationParams")]
    pub instantiation_params: InstantiationParams,
    /// Template to instantiate
    #[serde(rename = "Source")]
    pub source: Link,
}

impl InstantiateVAppTemplateParams {
    /// Request a vApp called `name` from the template at `source`.
    #[must_use]
    pub fn new(name: impl Into<String>, source: Link) -> Self {
        Self {
            xmlns: VCLOUD_NAMESPACE.to_string(),
            xmlns_ovf: OVF_NAMESPACE.to_string(),
            name: name.into(),
            deploy: false,
            power_on: false,
            description: None,
            instantiation_params: InstantiationParams {
                network_config_section: NetworkConfigSection {
                    info: "Configuration parameters for logical networks".to_string(),
                    networks: Vec::new(),
                },
            },
            source,
        }
    }

    /// Attach a vApp network to `parent` with the given fence mode.
    #[must_use]
    pub fn with_network(
        mut self,
        network_name: impl Into<String>,
        parent: Link,
        fence_mode: impl Into<String>,
    ) -> Self {
        self.instantiation_params
            .network_config_section
            .networks
            .push(VAppNetworkConfig {
                network_name: network_name.into(),
                configuration: VAppNetworkConfiguration {
                    parent_network: parent,
                    fence_mode: fence_mode.into(),
                },
            });
        self
    }

    /// Deploy and power on the vApp once created.
    #[must_use]
    pub const fn with_power_on(mut self, power_on: bool) -> Self {
        self.deploy = power_on;
        self.power_on = power_on;
        self
    }

    /// Set the vApp description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}
