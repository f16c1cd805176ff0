//! Task requests: operator workloads resolved to command batches.

use serde::{Deserialize, Serialize};

use crate::error::{RequestError, Result};
use crate::platform::Dialect;
use crate::platform::vocabulary::{self, BgpNeighbor, BgpNetwork, Ospf, Show, StaticRoute, VlanInterface};
use crate::session::Batch;

/// A workload to run on one device.
///
/// Deserializes from `{"action": "create_vlan", "vlan": 10, ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum TaskRequest {
    CreateVlan {
        vlan: u16,
        #[serde(default)]
        name: Option<String>,
    },
    DeleteVlan {
        vlan: u16,
    },
    AccessPort {
        interface: String,
        vlan: u16,
    },
    TrunkPort {
        interface: String,
        /// Allowed VLAN list; `None` or `"all"` leaves it open.
        #[serde(default)]
        allowed: Option<String>,
    },
    InterfaceIp {
        interface: String,
        address: String,
        mask: String,
    },
    VlanInterface(VlanInterface),
    AddStaticRoute(StaticRoute),
    RemoveStaticRoute(StaticRoute),
    CreateVrf {
        name: String,
        #[serde(default)]
        rd: Option<String>,
        #[serde(default)]
        description: Option<String>,
    },
    DeleteVrf {
        name: String,
    },
    /// Bind an interface to a VRF, optionally readdressing it.
    AssignVrf {
        interface: String,
        vrf: String,
        #[serde(default)]
        address: Option<String>,
        #[serde(default)]
        mask: Option<String>,
    },
    ConfigureOspf(Ospf),
    BgpNeighbor(BgpNeighbor),
    BgpNetwork(BgpNetwork),
    /// Reach the device and read its version.
    TestConnectivity,
    /// Literal configuration lines.
    Configure {
        commands: Vec<String>,
    },
    /// One read-only command family.
    Show {
        what: Show,
    },
    /// Literal read-only commands.
    Inspect {
        commands: Vec<String>,
    },
}

impl TaskRequest {
    /// Short description stored on the task.
    pub fn label(&self) -> String {
        match self {
            TaskRequest::CreateVlan { vlan, .. } => format!("create_vlan {}", vlan),
            TaskRequest::DeleteVlan { vlan } => format!("delete_vlan {}", vlan),
            TaskRequest::AccessPort { interface, vlan } => {
                format!("access_port {} vlan {}", interface, vlan)
            }
            TaskRequest::TrunkPort { interface, .. } => format!("trunk_port {}", interface),
            TaskRequest::InterfaceIp { interface, .. } => format!("interface_ip {}", interface),
            TaskRequest::VlanInterface(svi) => format!("vlan_interface {}", svi.vlan),
            TaskRequest::AddStaticRoute(route) => format!("add_static_route {}", route.network),
            TaskRequest::RemoveStaticRoute(route) => {
                format!("remove_static_route {}", route.network)
            }
            TaskRequest::CreateVrf { name, .. } => format!("create_vrf {}", name),
            TaskRequest::DeleteVrf { name } => format!("delete_vrf {}", name),
            TaskRequest::AssignVrf { interface, vrf, .. } => {
                format!("assign_vrf {} {}", vrf, interface)
            }
            TaskRequest::ConfigureOspf(ospf) => format!("configure_ospf {}", ospf.process_id),
            TaskRequest::BgpNeighbor(peer) => format!("bgp_neighbor {}", peer.neighbor),
            TaskRequest::BgpNetwork(advertised) => format!("bgp_network {}", advertised.network),
            TaskRequest::TestConnectivity => "test_connectivity".to_string(),
            TaskRequest::Configure { commands } => format!("configure ({} lines)", commands.len()),
            TaskRequest::Show { what } => format!("show {:?}", what).to_lowercase(),
            TaskRequest::Inspect { commands } => format!("inspect ({} commands)", commands.len()),
        }
    }

    /// Resolve to the batch for `dialect`, validating every input.
    pub fn to_batch(&self, dialect: &Dialect) -> Result<Batch> {
        let batch = match self {
            TaskRequest::CreateVlan { vlan, name } => {
                Batch::Configure(vocabulary::create_vlan(dialect, *vlan, name.as_deref())?)
            }
            TaskRequest::DeleteVlan { vlan } => {
                Batch::Configure(vocabulary::delete_vlan(dialect, *vlan)?)
            }
            TaskRequest::AccessPort { interface, vlan } => {
                Batch::Configure(vocabulary::access_port(dialect, interface, *vlan)?)
            }
            TaskRequest::TrunkPort { interface, allowed } => {
                Batch::Configure(vocabulary::trunk_port(dialect, interface, allowed.as_deref())?)
            }
            TaskRequest::InterfaceIp {
                interface,
                address,
                mask,
            } => Batch::Configure(vocabulary::interface_ip(dialect, interface, address, mask)?),
            TaskRequest::VlanInterface(svi) => {
                Batch::Configure(vocabulary::vlan_interface(dialect, svi)?)
            }
            TaskRequest::AddStaticRoute(route) => {
                Batch::Configure(vocabulary::add_static_route(dialect, route)?)
            }
            TaskRequest::RemoveStaticRoute(route) => {
                Batch::Configure(vocabulary::remove_static_route(dialect, route)?)
            }
            TaskRequest::CreateVrf {
                name,
                rd,
                description,
            } => Batch::Configure(vocabulary::create_vrf(
                dialect,
                name,
                rd.as_deref(),
                description.as_deref(),
            )?),
            TaskRequest::DeleteVrf { name } => Batch::Configure(vocabulary::delete_vrf(dialect, name)?),
            TaskRequest::AssignVrf {
                interface,
                vrf,
                address,
                mask,
            } => Batch::Configure(vocabulary::assign_vrf(
                dialect,
                interface,
                vrf,
                address.as_deref(),
                mask.as_deref(),
            )?),
            TaskRequest::ConfigureOspf(ospf) => {
                Batch::Configure(vocabulary::configure_ospf(dialect, ospf)?)
            }
            TaskRequest::BgpNeighbor(peer) => Batch::Configure(vocabulary::bgp_neighbor(dialect, peer)?),
            TaskRequest::BgpNetwork(advertised) => {
                Batch::Configure(vocabulary::bgp_network(dialect, advertised)?)
            }
            TaskRequest::TestConnectivity => {
                Batch::Inspect(vec![Show::Version.command(dialect).to_string()])
            }
            TaskRequest::Configure { commands } => Batch::Configure(literal(commands)?),
            TaskRequest::Show { what } => Batch::Inspect(vec![what.command(dialect).to_string()]),
            TaskRequest::Inspect { commands } => Batch::Inspect(literal(commands)?),
        };
        Ok(batch)
    }
}

/// Literal lines, trimmed; blank lines are rejected.
fn literal(commands: &[String]) -> Result<Vec<String>> {
    commands
        .iter()
        .map(|command| {
            let command = command.trim();
            if command.is_empty() {
                Err(RequestError::MissingField("commands").into())
            } else {
                Ok(command.to_string())
            }
        })
        .collect()
}
