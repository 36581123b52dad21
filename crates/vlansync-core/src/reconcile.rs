// ── Reconciliation engine ──
//
// Directional diff: the switch is the truth, NetBox is corrected to match.
// Ports are walked in natural order and looked up case-insensitively.
// If either side is tagged-all only the native VLAN is compared.

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::{error, info, warn};

use crate::model::{
    InventoryState, PortKey, PortMode, PortVlanState, SwitchState, TaggedVlans, VlanIdentity,
};

/// Target state for one inventory interface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DesiredState {
    pub mode: PortMode,
    pub native: Option<VlanIdentity>,
    pub tagged: BTreeSet<VlanIdentity>,
}

impl DesiredState {
    /// "Make the inventory look like the switch."
    ///
    /// Tagged-all on the switch side is reproduced as NetBox tagged-all
    /// with an empty explicit list.
    pub fn from_switch(state: &PortVlanState) -> Self {
        let native = state.native().cloned();
        match state.tagged() {
            TaggedVlans::All => Self {
                mode: PortMode::TaggedAll,
                native,
                tagged: BTreeSet::new(),
            },
            TaggedVlans::Set(set) => Self {
                mode: if set.is_empty() {
                    PortMode::Access
                } else {
                    PortMode::Tagged
                },
                native,
                tagged: set.clone(),
            },
        }
    }

    /// Whether an observed inventory state satisfies this target.
    ///
    /// Tagged-all targets only check mode and native.
    pub fn is_satisfied_by(&self, observed: &PortVlanState) -> bool {
        if observed.mode() != self.mode || observed.native() != self.native.as_ref() {
            return false;
        }
        match (self.mode, observed.tagged()) {
            (PortMode::TaggedAll, _) => true,
            (_, TaggedVlans::Set(set)) => *set == self.tagged,
            (_, TaggedVlans::All) => false,
        }
    }

    pub fn summary(&self) -> String {
        let native = self
            .native
            .as_ref()
            .map_or_else(|| "-".to_owned(), ToString::to_string);
        let tagged = if self.tagged.is_empty() {
            "-".to_owned()
        } else {
            self.tagged
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(",")
        };
        format!("{} native={native} tagged={tagged}", self.mode)
    }
}

/// One port whose inventory record disagrees with the switch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Mismatch {
    pub switch: String,
    pub port: String,
    pub interface_id: u64,
    pub switch_state: PortVlanState,
    pub inventory_state: PortVlanState,
    pub desired: DesiredState,
}

/// Outcome of comparing a single switch port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PortComparison {
    Match {
        port: String,
        interface_id: u64,
        state: PortVlanState,
    },
    Mismatch(Mismatch),
    Missing {
        port: String,
        switch_state: PortVlanState,
    },
}

impl PortComparison {
    pub fn port(&self) -> &str {
        match self {
            Self::Match { port, .. } | Self::Missing { port, .. } => port,
            Self::Mismatch(m) => &m.port,
        }
    }
}

/// Aggregated result for one switch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Reconciliation {
    pub matched: Vec<String>,
    pub missing: Vec<String>,
    pub mismatches: Vec<Mismatch>,
}

/// Compare every switch port against the inventory, in natural order.
pub fn compare(switch: &SwitchState, inventory: &InventoryState) -> Vec<PortComparison> {
    switch
        .iter()
        .map(|(key, sw_state)| compare_port(switch.name(), key, sw_state, inventory))
        .collect()
}

fn compare_port(
    switch: &str,
    key: &PortKey,
    sw_state: &PortVlanState,
    inventory: &InventoryState,
) -> PortComparison {
    let port = sw_state.port_name().to_owned();
    let Some(inv) = inventory.get(key) else {
        return PortComparison::Missing {
            port,
            switch_state: sw_state.clone(),
        };
    };

    if states_agree(sw_state, &inv.state) {
        PortComparison::Match {
            port,
            interface_id: inv.interface_id,
            state: sw_state.clone(),
        }
    } else {
        PortComparison::Mismatch(Mismatch {
            switch: switch.to_owned(),
            port,
            interface_id: inv.interface_id,
            switch_state: sw_state.clone(),
            inventory_state: inv.state.clone(),
            desired: DesiredState::from_switch(sw_state),
        })
    }
}

fn states_agree(switch: &PortVlanState, inventory: &PortVlanState) -> bool {
    if switch.native() != inventory.native() {
        return false;
    }
    if switch.is_tagged_all() || inventory.is_tagged_all() {
        return true;
    }
    switch.tagged() == inventory.tagged()
}

/// Compare and log: info for matches, warn for ports NetBox lacks,
/// error for mismatches.
pub fn reconcile(switch: &SwitchState, inventory: &InventoryState) -> Reconciliation {
    let mut result = Reconciliation::default();

    for comparison in compare(switch, inventory) {
        match comparison {
            PortComparison::Match {
                port,
                interface_id,
                state,
            } => {
                info!(
                    switch = switch.name(),
                    port = %port,
                    interface_id,
                    state = %state.summary(),
                    "port matches"
                );
                result.matched.push(port);
            }
            PortComparison::Missing { port, .. } => {
                warn!(switch = switch.name(), port = %port, "port missing in NetBox");
                result.missing.push(port);
            }
            PortComparison::Mismatch(m) => {
                error!(
                    switch = switch.name(),
                    port = %m.port,
                    interface_id = m.interface_id,
                    fortigate = %m.switch_state.summary(),
                    netbox = %m.inventory_state.summary(),
                    desired = %m.desired.summary(),
                    "VLAN mismatch"
                );
                result.mismatches.push(m);
            }
        }
    }

    result
}
