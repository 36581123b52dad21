// NetBox REST response and request types (DCIM + IPAM subset).

use serde::{Deserialize, Serialize};

/// Offset-paginated list envelope used by every NetBox list endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct Page<T> {
    pub next: Option<String>,
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
}

/// A DCIM device. Only the fields used for lookup are modelled.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Device {
    pub id: u64,
    pub name: Option<String>,
}

/// VLAN reference nested inside an interface.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct NestedVlan {
    pub id: u64,
    pub vid: Option<i64>,
    pub name: Option<String>,
    pub display: Option<String>,
}

/// Choice field `{ value, label }` as returned for `mode`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct InterfaceMode {
    pub value: Option<String>,
    pub label: Option<String>,
}

/// A DCIM interface with its 802.1Q assignment.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Interface {
    pub id: u64,
    pub name: Option<String>,
    pub mode: Option<InterfaceMode>,
    pub untagged_vlan: Option<NestedVlan>,
    #[serde(default)]
    pub tagged_vlans: Vec<NestedVlan>,
}

impl Interface {
    /// The raw mode value (`access`, `tagged`, `tagged-all`), if set.
    pub fn mode_value(&self) -> Option<&str> {
        self.mode.as_ref().and_then(|m| m.value.as_deref())
    }
}

/// An IPAM VLAN.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Vlan {
    pub id: u64,
    pub vid: i64,
    pub name: Option<String>,
}

/// Body of `PATCH /api/dcim/interfaces/{id}/`.
///
/// `untagged_vlan` serializes as `null` when cleared; NetBox treats a
/// missing key as "leave unchanged", which is not what a write-back wants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InterfaceVlanPatch {
    pub mode: String,
    pub untagged_vlan: Option<u64>,
    pub tagged_vlans: Vec<u64>,
}
