// ── Collaborator contracts ──
//
// The engine talks to the outside world through two traits: a
// `SwitchSource` (one FortiGate) and an `Inventory` (NetBox). Records
// crossing these seams are raw references; `extract` turns them into the
// typed model. The real clients from `vlansync-api` implement both traits
// below; tests substitute in-memory fakes.

// The engine drives these sequentially on one task, so the returned
// futures do not need to be `Send`.
#![allow(async_fn_in_trait)]

use tracing::warn;
use vlansync_api::fortigate::models::{ManagedSwitch, SwitchPortRecord};
use vlansync_api::netbox::models::{Interface, InterfaceVlanPatch, NestedVlan};
use vlansync_api::{FortiGateClient, NetBoxClient};

use crate::error::CoreError;
use crate::model::{PortMode, VlanId, VlanRef};

// ── Record shapes ───────────────────────────────────────────────────

/// A switch as reported by a source device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSwitch {
    pub name: String,
    pub ports: Vec<SourcePort>,
}

/// One switch port. `native` is the port's single native VLAN field;
/// any separately reported untagged list is not carried here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourcePort {
    pub name: Option<String>,
    pub native: Option<VlanRef>,
    pub allowed: Vec<VlanRef>,
    pub all_vlans: bool,
}

/// An inventory device resolved by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryDevice {
    pub id: u64,
    pub name: String,
}

/// One inventory interface.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InventoryInterface {
    pub id: u64,
    pub name: Option<String>,
    pub mode: Option<String>,
    pub native: Option<VlanRef>,
    pub tagged: Vec<VlanRef>,
}

/// Resolved write for one interface: NetBox object ids, not vids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceWrite {
    pub mode: PortMode,
    pub native: Option<u64>,
    pub tagged: Vec<u64>,
}

// ── Traits ──────────────────────────────────────────────────────────

/// A device that reports managed switches (a FortiGate).
pub trait SwitchSource {
    /// Label used in logs and reports.
    fn label(&self) -> &str;

    async fn fetch_switches(&self) -> Result<Vec<SourceSwitch>, CoreError>;
}

/// The system of record whose interfaces are corrected.
pub trait Inventory {
    async fn find_device(&self, name: &str) -> Result<Option<InventoryDevice>, CoreError>;

    async fn fetch_interfaces(&self, device_id: u64) -> Result<Vec<InventoryInterface>, CoreError>;

    /// NetBox VLAN object id for a vid, `None` if no such VLAN exists.
    async fn resolve_vlan(&self, vid: VlanId) -> Result<Option<u64>, CoreError>;

    async fn write_interface(&self, interface_id: u64, write: &InterfaceWrite)
    -> Result<(), CoreError>;

    /// Fresh read of one interface, bypassing any cache.
    async fn read_interface(&self, interface_id: u64) -> Result<InventoryInterface, CoreError>;

    /// Drop cached reads for a device after one of its interfaces changed.
    fn invalidate(&self, device_id: u64) -> Result<(), CoreError>;
}

// ── FortiGate ───────────────────────────────────────────────────────

/// A FortiGate client paired with its configured display name.
pub struct FortiGateSource {
    label: String,
    client: FortiGateClient,
}

impl FortiGateSource {
    pub fn new(label: impl Into<String>, client: FortiGateClient) -> Self {
        Self {
            label: label.into(),
            client,
        }
    }
}

impl SwitchSource for FortiGateSource {
    fn label(&self) -> &str {
        &self.label
    }

    async fn fetch_switches(&self) -> Result<Vec<SourceSwitch>, CoreError> {
        let switches = self
            .client
            .list_managed_switches()
            .await
            .map_err(|e| CoreError::SourceFetch {
                device: format!("{} ({})", self.label, self.client.host()),
                message: e.to_string(),
            })?;
        Ok(switches
            .into_iter()
            .filter_map(|sw| source_switch(&self.label, sw))
            .collect())
    }
}

fn source_switch(device: &str, switch: ManagedSwitch) -> Option<SourceSwitch> {
    let Some(name) = switch.display_name().map(str::to_owned) else {
        warn!(device, "managed switch without switch-id or name, skipping");
        return None;
    };
    Some(SourceSwitch {
        name,
        ports: switch.ports.into_iter().map(source_port).collect(),
    })
}

fn source_port(port: SwitchPortRecord) -> SourcePort {
    let all_vlans = port.allows_all_vlans();
    let name = port.display_name().map(str::to_owned);
    SourcePort {
        name,
        native: port.vlan.map(VlanRef::Name),
        allowed: port
            .allowed_vlans
            .into_iter()
            .filter_map(|m| m.vlan_name.map(VlanRef::Name))
            .collect(),
        all_vlans,
    }
}

// ── NetBox ──────────────────────────────────────────────────────────

impl Inventory for NetBoxClient {
    async fn find_device(&self, name: &str) -> Result<Option<InventoryDevice>, CoreError> {
        let device = self.find_device_by_name(name).await?;
        Ok(device.map(|d| InventoryDevice {
            id: d.id,
            name: d.name.unwrap_or_else(|| name.to_owned()),
        }))
    }

    async fn fetch_interfaces(&self, device_id: u64) -> Result<Vec<InventoryInterface>, CoreError> {
        let interfaces = self.list_interfaces(device_id).await?;
        Ok(interfaces.into_iter().map(inventory_interface).collect())
    }

    async fn resolve_vlan(&self, vid: VlanId) -> Result<Option<u64>, CoreError> {
        Ok(NetBoxClient::resolve_vlan(self, i64::from(vid.get())).await?)
    }

    async fn write_interface(
        &self,
        interface_id: u64,
        write: &InterfaceWrite,
    ) -> Result<(), CoreError> {
        let patch = InterfaceVlanPatch {
            mode: write.mode.to_string(),
            untagged_vlan: write.native,
            tagged_vlans: write.tagged.clone(),
        };
        self.update_interface_vlans(interface_id, &patch).await?;
        Ok(())
    }

    async fn read_interface(&self, interface_id: u64) -> Result<InventoryInterface, CoreError> {
        Ok(inventory_interface(self.get_interface(interface_id).await?))
    }

    fn invalidate(&self, device_id: u64) -> Result<(), CoreError> {
        Ok(self.invalidate_interfaces(device_id)?)
    }
}

fn inventory_interface(iface: Interface) -> InventoryInterface {
    InventoryInterface {
        id: iface.id,
        mode: iface.mode_value().map(str::to_owned),
        name: iface.name,
        native: iface.untagged_vlan.as_ref().and_then(nested_ref),
        tagged: iface.tagged_vlans.iter().filter_map(nested_ref).collect(),
    }
}

/// Prefer the vid; fall back to the VLAN's name or display string.
fn nested_ref(vlan: &NestedVlan) -> Option<VlanRef> {
    vlan.vid
        .map(VlanRef::Vid)
        .or_else(|| vlan.name.clone().map(VlanRef::Name))
        .or_else(|| vlan.display.clone().map(VlanRef::Name))
}
