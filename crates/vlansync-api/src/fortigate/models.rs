// FortiGate CMDB response types for `switch-controller/managed-switch`.
//
// Field names follow the FortiOS JSON (kebab-case). Everything the
// reconciliation path does not strictly need is optional so that a
// partially populated switch does not fail the whole response.

use serde::{Deserialize, Serialize};

/// The `{ results: [...] }` envelope wrapping every CMDB listing.
#[derive(Debug, Clone, Deserialize)]
pub struct CmdbResponse<T> {
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
    pub status: Option<String>,
}

/// A FortiSwitch managed by the FortiGate switch controller.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ManagedSwitch {
    #[serde(rename = "switch-id")]
    pub switch_id: Option<String>,
    /// CMDB primary key; equals `switch-id` on current FortiOS releases.
    pub q_origin_key: Option<String>,
    pub name: Option<String>,
    #[serde(default)]
    pub ports: Vec<SwitchPortRecord>,
}

impl ManagedSwitch {
    /// The switch's inventory-facing name: `switch-id`, else
    /// `q_origin_key`, else `name`.
    pub fn display_name(&self) -> Option<&str> {
        first_non_blank(&[
            self.switch_id.as_deref(),
            self.q_origin_key.as_deref(),
            self.name.as_deref(),
        ])
    }
}

/// One physical or logical port on a managed switch.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SwitchPortRecord {
    #[serde(rename = "port-name")]
    pub port_name: Option<String>,
    /// Older firmware reports the port under `name` only.
    pub name: Option<String>,

    /// Native VLAN object name (e.g. `vlan90`, `_default`).
    pub vlan: Option<String>,

    #[serde(rename = "allowed-vlans", default)]
    pub allowed_vlans: Vec<VlanMember>,

    #[serde(rename = "allowed-vlans-all")]
    pub allowed_vlans_all: Option<FortiFlag>,

    /// Reported separately by FortiOS and may disagree with `vlan`.
    #[serde(rename = "untagged-vlans", default)]
    pub untagged_vlans: Vec<VlanMember>,
}

impl SwitchPortRecord {
    /// `port-name`, else `name`.
    pub fn display_name(&self) -> Option<&str> {
        first_non_blank(&[self.port_name.as_deref(), self.name.as_deref()])
    }

    /// Whether the controller permits every VLAN on this port.
    pub fn allows_all_vlans(&self) -> bool {
        self.allowed_vlans_all
            .as_ref()
            .is_some_and(FortiFlag::is_enabled)
    }
}

fn first_non_blank<'a>(candidates: &[Option<&'a str>]) -> Option<&'a str> {
    candidates
        .iter()
        .copied()
        .flatten()
        .map(str::trim)
        .find(|s| !s.is_empty())
}

/// Entry of an `allowed-vlans` / `untagged-vlans` table.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct VlanMember {
    #[serde(rename = "vlan-name")]
    pub vlan_name: Option<String>,
}

/// FortiOS toggles arrive as `"enable"`/`"disable"`, occasionally as bools.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum FortiFlag {
    Bool(bool),
    Text(String),
}

impl FortiFlag {
    pub fn is_enabled(&self) -> bool {
        match self {
            Self::Bool(b) => *b,
            Self::Text(s) => s.eq_ignore_ascii_case("enable"),
        }
    }
}
