//! Command text for common operator workloads.
//!
//! Every builder validates its inputs first and returns the configuration
//! lines in the order they must be sent. Huawei sub-views are closed with
//! `quit` so the next block starts from system view.
//!
//! ```rust
//! use netpush::platform::{DialectKind, DialectRegistry, vocabulary};
//!
//! let huawei = DialectRegistry::lookup(DialectKind::Huawei);
//! let commands = vocabulary::create_vlan(huawei, 100, Some("users")).unwrap();
//! assert_eq!(commands, ["vlan 100", "description users", "quit"]);
//! ```

use std::net::Ipv4Addr;

use serde::{Deserialize, Serialize};

use super::definition::Dialect;
use super::registry::Family;
use crate::error::{RequestError, Result};

/// Read-only command families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Show {
    Version,
    Interfaces,
    Vlans,
    Routes,
    Vrfs,
    RunningConfig,
}

impl Show {
    /// Command text for this family on `dialect`.
    pub fn command(self, dialect: &Dialect) -> &'static str {
        match (dialect.kind.family(), self) {
            (Family::Cisco, Show::Version) => "show version",
            (Family::Cisco, Show::Interfaces) => "show ip interface brief",
            (Family::Cisco, Show::Vlans) => "show vlan brief",
            (Family::Cisco, Show::Routes) => "show ip route",
            (Family::Cisco, Show::Vrfs) => "show ip vrf",
            (Family::Cisco, Show::RunningConfig) => "show running-config",
            (Family::Huawei, Show::Version) => "display version",
            (Family::Huawei, Show::Interfaces) => "display interface brief",
            (Family::Huawei, Show::Vlans) => "display vlan",
            (Family::Huawei, Show::Routes) => "display ip routing-table",
            (Family::Huawei, Show::Vrfs) => "display ip vpn-instance",
            (Family::Huawei, Show::RunningConfig) => "display current-configuration",
        }
    }
}

/// Layer-3 VLAN interface settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VlanInterface {
    pub vlan: u16,
    pub address: String,
    pub mask: String,
    #[serde(default)]
    pub vrf: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "enabled")]
    pub enabled: bool,
}

fn enabled() -> bool {
    true
}

/// One OSPF `network` statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OspfNetwork {
    pub network: String,
    /// Wildcard mask, e.g. `0.0.0.255`.
    pub wildcard: String,
    /// Area id, decimal or dotted.
    pub area: String,
}

/// OSPF process, optionally inside a VRF.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ospf {
    pub process_id: u16,
    pub router_id: String,
    #[serde(default)]
    pub networks: Vec<OspfNetwork>,
    #[serde(default)]
    pub vrf: Option<String>,
}

/// BGP peer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BgpNeighbor {
    /// Local AS.
    pub asn: u32,
    pub neighbor: String,
    pub remote_as: u32,
    #[serde(default)]
    pub vrf: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Network advertised into BGP.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BgpNetwork {
    /// Local AS.
    pub asn: u32,
    pub network: String,
    pub mask: String,
    #[serde(default)]
    pub vrf: Option<String>,
}

/// Static route, optionally inside a VRF.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticRoute {
    pub network: String,
    pub mask: String,
    pub next_hop: String,
    #[serde(default)]
    pub vrf: Option<String>,
}

/// Check a VLAN id is in 1..=4094.
pub fn check_vlan(id: u16) -> Result<u16> {
    if (1..=4094).contains(&id) {
        Ok(id)
    } else {
        Err(RequestError::VlanOutOfRange(id).into())
    }
}

/// Convert a dotted-quad mask to a prefix length.
///
/// Non-contiguous masks such as `255.0.255.0` are rejected.
pub fn mask_to_prefix(mask: &str) -> Result<u8> {
    let bits = u32::from(
        mask.trim()
            .parse::<Ipv4Addr>()
            .map_err(|_| RequestError::InvalidMask(mask.to_string()))?,
    );

    // Contiguous ones followed by zeros
    if bits.leading_ones() + bits.trailing_zeros() != 32 {
        return Err(RequestError::InvalidMask(mask.to_string()).into());
    }
    Ok(bits.leading_ones() as u8)
}

/// Check a wildcard mask is the inverse of a contiguous mask.
pub fn check_wildcard(wildcard: &str) -> Result<Ipv4Addr> {
    let parsed = wildcard
        .trim()
        .parse::<Ipv4Addr>()
        .map_err(|_| RequestError::InvalidMask(wildcard.to_string()))?;
    let bits = !u32::from(parsed);
    if bits.leading_ones() + bits.trailing_zeros() != 32 {
        return Err(RequestError::InvalidMask(wildcard.to_string()).into());
    }
    Ok(parsed)
}

fn check_nonzero(value: u32, field: &'static str) -> Result<u32> {
    if value == 0 {
        return Err(RequestError::OutOfRange { field, value }.into());
    }
    Ok(value)
}

fn check_address(address: &str) -> Result<Ipv4Addr> {
    address
        .trim()
        .parse::<Ipv4Addr>()
        .map_err(|_| RequestError::InvalidAddress(address.to_string()).into())
}

fn require(value: &str, field: &'static str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(RequestError::MissingField(field).into());
    }
    Ok(())
}

/// Address and mask as the dialect writes them.
fn address_with_mask(dialect: &Dialect, address: &str, mask: &str) -> Result<String> {
    let address = check_address(address)?;
    let prefix = mask_to_prefix(mask)?;
    Ok(match dialect.kind.family() {
        Family::Cisco => format!("{} {}", address, mask.trim()),
        Family::Huawei => format!("{} {}", address, prefix),
    })
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn negate(dialect: &Dialect) -> &'static str {
    match dialect.kind.family() {
        Family::Cisco => "no",
        Family::Huawei => "undo",
    }
}

fn no_shutdown(dialect: &Dialect) -> String {
    format!("{} shutdown", negate(dialect))
}

fn close_view(dialect: &Dialect, commands: &mut Vec<String>) {
    if dialect.kind.family() == Family::Huawei {
        commands.push("quit".to_string());
    }
}

/// Create a VLAN, optionally named.
pub fn create_vlan(dialect: &Dialect, vlan: u16, name: Option<&str>) -> Result<Vec<String>> {
    let vlan = check_vlan(vlan)?;
    let mut commands = vec![format!("vlan {}", vlan)];

    if let Some(name) = name.filter(|n| !n.trim().is_empty()) {
        match dialect.kind.family() {
            Family::Cisco => commands.push(format!("name {}", name)),
            Family::Huawei => commands.push(format!("description {}", name)),
        }
    }

    close_view(dialect, &mut commands);
    Ok(commands)
}

/// Delete a VLAN.
pub fn delete_vlan(dialect: &Dialect, vlan: u16) -> Result<Vec<String>> {
    let vlan = check_vlan(vlan)?;
    Ok(vec![format!("{} vlan {}", negate(dialect), vlan)])
}

/// Put an interface in access mode on one VLAN.
pub fn access_port(dialect: &Dialect, interface: &str, vlan: u16) -> Result<Vec<String>> {
    require(interface, "interface")?;
    let vlan = check_vlan(vlan)?;

    let mut commands = vec![format!("interface {}", interface)];
    match dialect.kind.family() {
        Family::Cisco => {
            commands.push("switchport mode access".to_string());
            commands.push(format!("switchport access vlan {}", vlan));
        }
        Family::Huawei => {
            commands.push("port link-type access".to_string());
            commands.push(format!("port default vlan {}", vlan));
        }
    }
    commands.push(no_shutdown(dialect));
    close_view(dialect, &mut commands);
    Ok(commands)
}

/// Put an interface in trunk mode.
///
/// `allowed` is passed through as written; `None` or `"all"` leaves the
/// device default.
pub fn trunk_port(dialect: &Dialect, interface: &str, allowed: Option<&str>) -> Result<Vec<String>> {
    require(interface, "interface")?;
    let allowed = allowed
        .map(str::trim)
        .filter(|a| !a.is_empty() && !a.eq_ignore_ascii_case("all"));

    let mut commands = vec![format!("interface {}", interface)];
    match dialect.kind.family() {
        Family::Cisco => {
            commands.push("switchport mode trunk".to_string());
            if let Some(vlans) = allowed {
                commands.push(format!("switchport trunk allowed vlan {}", vlans));
            }
        }
        Family::Huawei => {
            commands.push("port link-type trunk".to_string());
            if let Some(vlans) = allowed {
                commands.push(format!("port trunk allow-pass vlan {}", vlans));
            }
        }
    }
    commands.push(no_shutdown(dialect));
    close_view(dialect, &mut commands);
    Ok(commands)
}

/// Assign an IPv4 address to an interface.
pub fn interface_ip(
    dialect: &Dialect,
    interface: &str,
    address: &str,
    mask: &str,
) -> Result<Vec<String>> {
    require(interface, "interface")?;
    let address = address_with_mask(dialect, address, mask)?;

    let mut commands = vec![
        format!("interface {}", interface),
        format!("ip address {}", address),
        no_shutdown(dialect),
    ];
    close_view(dialect, &mut commands);
    Ok(commands)
}

/// Configure a layer-3 VLAN interface.
pub fn vlan_interface(dialect: &Dialect, svi: &VlanInterface) -> Result<Vec<String>> {
    let vlan = check_vlan(svi.vlan)?;
    let address = address_with_mask(dialect, &svi.address, &svi.mask)?;
    let family = dialect.kind.family();

    let mut commands = vec![match family {
        Family::Cisco => format!("interface vlan {}", vlan),
        Family::Huawei => format!("interface Vlanif{}", vlan),
    }];

    if let Some(description) = svi.description.as_deref().filter(|d| !d.trim().is_empty()) {
        commands.push(format!("description {}", description));
    }

    // VRF binding clears the address, so it goes first
    if let Some(vrf) = svi.vrf.as_deref().filter(|v| !v.trim().is_empty()) {
        commands.push(match family {
            Family::Cisco => format!("ip vrf forwarding {}", vrf),
            Family::Huawei => format!("ip binding vpn-instance {}", vrf),
        });
    }

    commands.push(format!("ip address {}", address));
    commands.push(if svi.enabled {
        no_shutdown(dialect)
    } else {
        "shutdown".to_string()
    });
    close_view(dialect, &mut commands);
    Ok(commands)
}

fn route_line(dialect: &Dialect, route: &StaticRoute) -> Result<String> {
    let network = check_address(&route.network)?;
    let next_hop = check_address(&route.next_hop)?;
    let prefix = mask_to_prefix(&route.mask)?;
    let vrf = route.vrf.as_deref().filter(|v| !v.trim().is_empty());

    Ok(match (dialect.kind.family(), vrf) {
        (Family::Cisco, Some(vrf)) => format!(
            "ip route vrf {} {} {} {}",
            vrf,
            network,
            route.mask.trim(),
            next_hop
        ),
        (Family::Cisco, None) => format!("ip route {} {} {}", network, route.mask.trim(), next_hop),
        (Family::Huawei, Some(vrf)) => format!(
            "ip route-static vpn-instance {} {} {} {}",
            vrf, network, prefix, next_hop
        ),
        (Family::Huawei, None) => format!("ip route-static {} {} {}", network, prefix, next_hop),
    })
}

/// Add a static route.
pub fn add_static_route(dialect: &Dialect, route: &StaticRoute) -> Result<Vec<String>> {
    Ok(vec![route_line(dialect, route)?])
}

/// Remove a static route.
pub fn remove_static_route(dialect: &Dialect, route: &StaticRoute) -> Result<Vec<String>> {
    let line = route_line(dialect, route)?;
    Ok(vec![format!("{} {}", negate(dialect), line)])
}

/// Create a VRF (Huawei: VPN instance).
pub fn create_vrf(
    dialect: &Dialect,
    name: &str,
    rd: Option<&str>,
    description: Option<&str>,
) -> Result<Vec<String>> {
    require(name, "vrf")?;
    let rd = rd.filter(|r| !r.trim().is_empty());
    let description = description.filter(|d| !d.trim().is_empty());

    let mut commands = Vec::with_capacity(4);
    match dialect.kind.family() {
        Family::Cisco => {
            commands.push(format!("ip vrf {}", name));
            if let Some(rd) = rd {
                commands.push(format!("rd {}", rd));
            }
        }
        Family::Huawei => {
            commands.push(format!("ip vpn-instance {}", name));
            if let Some(rd) = rd {
                commands.push(format!("route-distinguisher {}", rd));
            }
        }
    }
    if let Some(description) = description {
        commands.push(format!("description {}", description));
    }
    close_view(dialect, &mut commands);
    Ok(commands)
}

/// Delete a VRF (Huawei: VPN instance).
pub fn delete_vrf(dialect: &Dialect, name: &str) -> Result<Vec<String>> {
    require(name, "vrf")?;
    Ok(vec![match dialect.kind.family() {
        Family::Cisco => format!("no ip vrf {}", name.trim()),
        Family::Huawei => format!("undo ip vpn-instance {}", name.trim()),
    }])
}

/// Bind an interface to a VRF, optionally readdressing it.
///
/// Address and mask come together or not at all.
pub fn assign_vrf(
    dialect: &Dialect,
    interface: &str,
    vrf: &str,
    address: Option<&str>,
    mask: Option<&str>,
) -> Result<Vec<String>> {
    require(interface, "interface")?;
    require(vrf, "vrf")?;
    let address = match (non_empty(address), non_empty(mask)) {
        (Some(address), Some(mask)) => Some(address_with_mask(dialect, address, mask)?),
        (Some(_), None) => return Err(RequestError::MissingField("mask").into()),
        (None, Some(_)) => return Err(RequestError::MissingField("address").into()),
        (None, None) => None,
    };

    let mut commands = vec![
        format!("interface {}", interface),
        match dialect.kind.family() {
            Family::Cisco => format!("ip vrf forwarding {}", vrf.trim()),
            Family::Huawei => format!("ip binding vpn-instance {}", vrf.trim()),
        },
    ];
    // Binding clears the address, so it is set again afterwards
    if let Some(address) = address {
        commands.push(format!("ip address {}", address));
    }
    commands.push(no_shutdown(dialect));
    close_view(dialect, &mut commands);
    Ok(commands)
}

/// Configure an OSPF process and its networks.
pub fn configure_ospf(dialect: &Dialect, ospf: &Ospf) -> Result<Vec<String>> {
    let process = check_nonzero(u32::from(ospf.process_id), "process_id")?;
    let router_id = check_address(&ospf.router_id)?;
    let vrf = non_empty(ospf.vrf.as_deref());

    let mut networks = Vec::with_capacity(ospf.networks.len());
    for net in &ospf.networks {
        require(&net.area, "area")?;
        networks.push((check_address(&net.network)?, check_wildcard(&net.wildcard)?, net.area.trim()));
    }

    let mut commands = Vec::with_capacity(2 + 3 * networks.len());
    match dialect.kind.family() {
        Family::Cisco => {
            commands.push(match vrf {
                Some(vrf) => format!("router ospf {} vrf {}", process, vrf),
                None => format!("router ospf {}", process),
            });
            commands.push(format!("router-id {}", router_id));
            for (network, wildcard, area) in networks {
                commands.push(format!("network {} {} area {}", network, wildcard, area));
            }
        }
        Family::Huawei => {
            commands.push(match vrf {
                Some(vrf) => format!("ospf {} router-id {} vpn-instance {}", process, router_id, vrf),
                None => format!("ospf {} router-id {}", process, router_id),
            });
            for (network, wildcard, area) in networks {
                commands.push(format!("area {}", area));
                commands.push(format!("network {} {}", network, wildcard));
                commands.push("quit".to_string());
            }
            commands.push("quit".to_string());
        }
    }
    Ok(commands)
}

/// Opening lines of the BGP process, and of its VRF address family.
fn bgp_context(dialect: &Dialect, asn: u32, vrf: Option<&str>) -> Vec<String> {
    let mut commands = Vec::with_capacity(2);
    match dialect.kind.family() {
        Family::Cisco => {
            commands.push(format!("router bgp {}", asn));
            if let Some(vrf) = vrf {
                commands.push(format!("address-family ipv4 vrf {}", vrf));
            }
        }
        Family::Huawei => {
            commands.push(format!("bgp {}", asn));
            if let Some(vrf) = vrf {
                commands.push(format!("ipv4-family vpn-instance {}", vrf));
            }
        }
    }
    commands
}

/// Closing lines matching [`bgp_context`].
fn close_bgp(dialect: &Dialect, vrf: Option<&str>, commands: &mut Vec<String>) {
    match dialect.kind.family() {
        Family::Cisco => {
            if vrf.is_some() {
                commands.push("exit-address-family".to_string());
            }
        }
        Family::Huawei => {
            if vrf.is_some() {
                commands.push("quit".to_string());
            }
            commands.push("quit".to_string());
        }
    }
}

/// Configure a BGP peer.
pub fn bgp_neighbor(dialect: &Dialect, peer: &BgpNeighbor) -> Result<Vec<String>> {
    let asn = check_nonzero(peer.asn, "asn")?;
    let remote_as = check_nonzero(peer.remote_as, "remote_as")?;
    let neighbor = check_address(&peer.neighbor)?;
    let vrf = non_empty(peer.vrf.as_deref());
    let description = non_empty(peer.description.as_deref());

    let mut commands = bgp_context(dialect, asn, vrf);
    match dialect.kind.family() {
        Family::Cisco => {
            commands.push(format!("neighbor {} remote-as {}", neighbor, remote_as));
            if let Some(description) = description {
                commands.push(format!("neighbor {} description {}", neighbor, description));
            }
            // Inside a VRF address family the peer must be activated
            if vrf.is_some() {
                commands.push(format!("neighbor {} activate", neighbor));
            }
        }
        Family::Huawei => {
            commands.push(format!("peer {} as-number {}", neighbor, remote_as));
            if let Some(description) = description {
                commands.push(format!("peer {} description {}", neighbor, description));
            }
        }
    }
    close_bgp(dialect, vrf, &mut commands);
    Ok(commands)
}

/// Advertise a network into BGP.
pub fn bgp_network(dialect: &Dialect, advertised: &BgpNetwork) -> Result<Vec<String>> {
    let asn = check_nonzero(advertised.asn, "asn")?;
    let network = check_address(&advertised.network)?;
    let prefix = mask_to_prefix(&advertised.mask)?;
    let vrf = non_empty(advertised.vrf.as_deref());

    let mut commands = bgp_context(dialect, asn, vrf);
    commands.push(match dialect.kind.family() {
        Family::Cisco => format!("network {} mask {}", network, advertised.mask.trim()),
        Family::Huawei => format!("network {} {}", network, prefix),
    });
    close_bgp(dialect, vrf, &mut commands);
    Ok(commands)
}
