// ── Port-state extraction ──
//
// Two independent paths into `PortVlanState`:
//
// Switch side: native comes from the port's `vlan` field only; the
// allowed list gives tagged VLANs minus the native; "all VLANs" forces
// tagged-all. Mode is derived (tagged if anything remains, else access).
//
// Inventory side: mode is the declared NetBox mode, which is authoritative
// (access drops tagged entries, tagged-all ignores them).
//
// Records without a usable port name are skipped.

use tracing::debug;

use crate::model::{
    InventoryPort, InventoryState, PortMode, PortVlanState, SwitchState, VlanIdentity,
    VlanTranslations,
};
use crate::source::{InventoryDevice, InventoryInterface, SourcePort, SourceSwitch};

/// Normalize one switch's ports.
pub fn switch_state(switch: &SourceSwitch, translations: &VlanTranslations) -> SwitchState {
    let ports = switch
        .ports
        .iter()
        .filter_map(|port| switch_port(&switch.name, port, translations));
    SwitchState::new(switch.name.clone(), ports)
}

fn switch_port(
    switch: &str,
    port: &SourcePort,
    translations: &VlanTranslations,
) -> Option<PortVlanState> {
    let Some(name) = usable_name(port.name.as_deref()) else {
        debug!(switch, "switch port without a name, skipping");
        return None;
    };

    let native = port
        .native
        .as_ref()
        .and_then(|raw| translations.normalize(raw));

    if port.all_vlans {
        return Some(PortVlanState::new(name, PortMode::TaggedAll, native, []));
    }

    let tagged: Vec<VlanIdentity> = port
        .allowed
        .iter()
        .filter_map(|raw| translations.normalize(raw))
        .filter(|vlan| Some(vlan) != native.as_ref())
        .collect();

    let mode = if tagged.is_empty() {
        PortMode::Access
    } else {
        PortMode::Tagged
    };
    Some(PortVlanState::new(name, mode, native, tagged))
}

/// Normalize one NetBox interface into a port state.
pub fn interface_state(
    iface: &InventoryInterface,
    translations: &VlanTranslations,
) -> Option<PortVlanState> {
    let name = usable_name(iface.name.as_deref())?;
    let mode = PortMode::from_inventory(iface.mode.as_deref());
    let native = iface
        .native
        .as_ref()
        .and_then(|raw| translations.normalize(raw));
    let tagged = iface
        .tagged
        .iter()
        .filter_map(|raw| translations.normalize(raw));
    Some(PortVlanState::new(name, mode, native, tagged))
}

/// Normalize a device's interfaces.
pub fn inventory_state(
    device: &InventoryDevice,
    interfaces: &[InventoryInterface],
    translations: &VlanTranslations,
) -> InventoryState {
    let ports = interfaces.iter().filter_map(|iface| {
        let state = interface_state(iface, translations);
        if state.is_none() {
            debug!(device = %device.name, interface_id = iface.id, "interface without a name, skipping");
        }
        state.map(|state| InventoryPort {
            interface_id: iface.id,
            state,
        })
    });
    InventoryState::new(device.name.clone(), device.id, ports)
}

fn usable_name(name: Option<&str>) -> Option<&str> {
    name.map(str::trim).filter(|n| !n.is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{TaggedVlans, VlanId, VlanRef};

    fn vid(n: i64) -> VlanIdentity {
        VlanIdentity::Vid(VlanId::new(n).unwrap())
    }

    fn port(name: &str, native: &str, allowed: &[&str]) -> SourcePort {
        SourcePort {
            name: Some(name.into()),
            native: Some(native.into()),
            allowed: allowed.iter().map(|a| VlanRef::from(*a)).collect(),
            all_vlans: false,
        }
    }

    fn switch(ports: Vec<SourcePort>) -> SourceSwitch {
        SourceSwitch {
            name: "SW1".into(),
            ports,
        }
    }

    #[test]
    fn native_is_excluded_from_tagged() {
        let sw = switch(vec![port("port1", "vlan90", &["vlan90", "vlan50"])]);
        let state = switch_state(&sw, &VlanTranslations::new());
        let p = state.get("port1").unwrap();
        assert_eq!(p.mode(), PortMode::Tagged);
        assert_eq!(p.native(), Some(&vid(90)));
        assert_eq!(p.tagged().as_set().unwrap().len(), 1);
        assert!(p.tagged().as_set().unwrap().contains(&vid(50)));
    }

    #[test]
    fn only_native_makes_access_port() {
        let sw = switch(vec![port("port1", "vlan90", &["vlan90"])]);
        let state = switch_state(&sw, &VlanTranslations::new());
        let p = state.get("port1").unwrap();
        assert_eq!(p.mode(), PortMode::Access);
        assert!(p.tagged().is_empty());
    }

    #[test]
    fn all_vlans_flag_wins_over_list() {
        let mut p = port("port49", "_default", &["vlan10", "vlan20"]);
        p.all_vlans = true;
        let mut translations = VlanTranslations::new();
        translations.insert("_default", VlanId::new(1).unwrap());

        let state = switch_state(&switch(vec![p]), &translations);
        let p = state.get("port49").unwrap();
        assert_eq!(p.mode(), PortMode::TaggedAll);
        assert_eq!(p.tagged(), &TaggedVlans::All);
        assert_eq!(p.native(), Some(&vid(1)));
    }

    #[test]
    fn nameless_ports_are_skipped() {
        let mut unnamed = port("x", "vlan1", &[]);
        unnamed.name = None;
        let blank = port("  ", "vlan1", &[]);
        let state = switch_state(
            &switch(vec![unnamed, blank, port("port1", "vlan1", &[])]),
            &VlanTranslations::new(),
        );
        assert_eq!(state.len(), 1);
    }

    #[test]
    fn inventory_access_mode_is_authoritative() {
        let iface = InventoryInterface {
            id: 11,
            name: Some("port1".into()),
            mode: Some("access".into()),
            native: Some(VlanRef::Vid(90)),
            tagged: vec![VlanRef::Vid(50)],
        };
        let state = interface_state(&iface, &VlanTranslations::new()).unwrap();
        assert_eq!(state.mode(), PortMode::Access);
        assert!(state.tagged().is_empty());
    }

    #[test]
    fn inventory_tagged_all_ignores_list() {
        let iface = InventoryInterface {
            id: 12,
            name: Some("port49".into()),
            mode: Some("tagged-all".into()),
            native: Some(VlanRef::Vid(1)),
            tagged: vec![VlanRef::Vid(50)],
        };
        let state = interface_state(&iface, &VlanTranslations::new()).unwrap();
        assert!(state.is_tagged_all());
    }

    #[test]
    fn inventory_null_mode_keeps_tagged() {
        let iface = InventoryInterface {
            id: 13,
            name: Some("port2".into()),
            mode: None,
            native: None,
            tagged: vec![VlanRef::Vid(50), VlanRef::Vid(0)],
        };
        let state = interface_state(&iface, &VlanTranslations::new()).unwrap();
        assert_eq!(state.mode(), PortMode::Unknown);
        assert_eq!(state.tagged().as_set().unwrap().len(), 1);
    }

    #[test]
    fn inventory_state_dedups_case_collisions() {
        let device = InventoryDevice {
            id: 7,
            name: "SW1".into(),
        };
        let make = |id, name: &str| InventoryInterface {
            id,
            name: Some(name.into()),
            mode: Some("access".into()),
            ..InventoryInterface::default()
        };
        let state = inventory_state(
            &device,
            &[make(1, "Port1"), make(2, "port1"), make(3, "port2")],
            &VlanTranslations::new(),
        );
        assert_eq!(state.len(), 2);
        let (_, first) = state.iter().next().unwrap();
        assert_eq!(first.interface_id, 1);
    }

    #[test]
    fn access_invariant_holds_on_both_paths() {
        let translations = VlanTranslations::new();
        let sw = switch(vec![
            port("port1", "vlan10", &[]),
            port("port2", "vlan10", &["vlan10"]),
            port("port3", "", &["vlan20"]),
        ]);
        for (_, p) in switch_state(&sw, &translations).iter() {
            if p.mode() == PortMode::Access {
                assert!(p.tagged().is_empty());
            }
        }

        for mode in ["access", "tagged", "tagged-all", "bogus"] {
            let iface = InventoryInterface {
                id: 1,
                name: Some("p".into()),
                mode: Some(mode.into()),
                native: None,
                tagged: vec![VlanRef::Vid(10), VlanRef::Vid(20)],
            };
            let state = interface_state(&iface, &translations).unwrap();
            if state.mode() == PortMode::Access {
                assert!(state.tagged().is_empty());
            }
        }
    }
}
