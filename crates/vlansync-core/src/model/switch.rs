// ── Per-device port tables ──
//
// `SwitchState` is what a FortiGate reports for one managed switch;
// `InventoryState` is what NetBox holds for the matching device, with
// each port carrying the interface id needed to write it back. Both are
// built once per run and never mutated afterwards.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use serde::Serialize;
use tracing::warn;

use super::port::{PortKey, PortVlanState};

/// Switch-side port table, iterated in natural port order.
#[derive(Debug, Clone, Serialize)]
pub struct SwitchState {
    name: String,
    #[serde(serialize_with = "serialize_ports")]
    ports: BTreeMap<PortKey, PortVlanState>,
}

impl SwitchState {
    /// Build from extracted ports. Names colliding only by case keep the
    /// first one seen.
    pub fn new(name: impl Into<String>, ports: impl IntoIterator<Item = PortVlanState>) -> Self {
        let name = name.into();
        let mut table = BTreeMap::new();
        for state in ports {
            let Some(key) = PortKey::new(state.port_name()) else {
                continue;
            };
            insert_first(&mut table, &name, key, state, |s| s.port_name());
        }
        Self { name, ports: table }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get(&self, port: &str) -> Option<&PortVlanState> {
        PortKey::new(port).and_then(|key| self.ports.get(&key))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PortKey, &PortVlanState)> {
        self.ports.iter()
    }

    pub fn len(&self) -> usize {
        self.ports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ports.is_empty()
    }
}

/// One NetBox interface and its VLAN state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InventoryPort {
    pub interface_id: u64,
    pub state: PortVlanState,
}

/// Inventory-side port table for one device.
#[derive(Debug, Clone, Serialize)]
pub struct InventoryState {
    device_name: String,
    device_id: u64,
    #[serde(serialize_with = "serialize_ports")]
    ports: BTreeMap<PortKey, InventoryPort>,
}

impl InventoryState {
    pub fn new(
        device_name: impl Into<String>,
        device_id: u64,
        ports: impl IntoIterator<Item = InventoryPort>,
    ) -> Self {
        let device_name = device_name.into();
        let mut table = BTreeMap::new();
        for port in ports {
            let Some(key) = PortKey::new(port.state.port_name()) else {
                continue;
            };
            insert_first(&mut table, &device_name, key, port, |p| p.state.port_name());
        }
        Self {
            device_name,
            device_id,
            ports: table,
        }
    }

    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    pub fn device_id(&self) -> u64 {
        self.device_id
    }

    pub fn get(&self, key: &PortKey) -> Option<&InventoryPort> {
        self.ports.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PortKey, &InventoryPort)> {
        self.ports.iter()
    }

    pub fn len(&self) -> usize {
        self.ports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ports.is_empty()
    }
}

fn insert_first<T>(
    table: &mut BTreeMap<PortKey, T>,
    device: &str,
    key: PortKey,
    value: T,
    name_of: impl Fn(&T) -> &str,
) {
    match table.entry(key) {
        Entry::Vacant(slot) => {
            slot.insert(value);
        }
        Entry::Occupied(existing) => {
            warn!(
                device,
                kept = name_of(existing.get()),
                dropped = name_of(&value),
                "port names collide by case, keeping the first"
            );
        }
    }
}

fn serialize_ports<S, T>(ports: &BTreeMap<PortKey, T>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
    T: Serialize,
{
    serializer.collect_seq(ports.values())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::port::PortMode;

    fn access(name: &str) -> PortVlanState {
        PortVlanState::new(name, PortMode::Access, None, [])
    }

    #[test]
    fn iterates_in_natural_order() {
        let state = SwitchState::new("SW1", ["port10", "port2", "port1"].map(access));
        let names: Vec<&str> = state.iter().map(|(_, s)| s.port_name()).collect();
        assert_eq!(names, vec!["port1", "port2", "port10"]);
    }

    #[test]
    fn case_collision_keeps_first() {
        let state = SwitchState::new("SW1", ["Port1", "port1"].map(access));
        assert_eq!(state.len(), 1);
        assert_eq!(state.get("PORT1").unwrap().port_name(), "Port1");
    }

    #[test]
    fn inventory_lookup_by_key() {
        let inv = InventoryState::new(
            "SW1",
            7,
            [InventoryPort {
                interface_id: 11,
                state: access("Port1"),
            }],
        );
        let key = PortKey::new("port1").unwrap();
        assert_eq!(inv.get(&key).unwrap().interface_id, 11);
        assert_eq!(inv.device_id(), 7);
    }
}
