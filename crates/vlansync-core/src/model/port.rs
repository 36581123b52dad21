// ── Per-port VLAN state ──
//
// Side-agnostic port model shared by the switch and inventory views.
// Port names are keyed case-insensitively and ordered naturally
// (port2 < port10).

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;

use serde::{Serialize, Serializer};
use strum::{AsRefStr, Display, EnumString};

use super::vlan::VlanIdentity;

// ── PortKey ─────────────────────────────────────────────────────────

/// Lower-cased port name used for lookups and ordering.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PortKey(String);

impl PortKey {
    /// `None` for a blank name.
    pub fn new(name: &str) -> Option<Self> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_lowercase()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Ord for PortKey {
    fn cmp(&self, other: &Self) -> Ordering {
        natural_cmp(&self.0, &other.0).then_with(|| self.0.cmp(&other.0))
    }
}

impl PartialOrd for PortKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Compare two strings treating runs of ASCII digits as numbers.
///
/// Leading zeros are ignored numerically, so `port01` and `port1` compare
/// equal here; callers break such ties themselves.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let (mut a, mut b) = (a, b);
    loop {
        match (a.is_empty(), b.is_empty()) {
            (true, true) => return Ordering::Equal,
            (true, false) => return Ordering::Less,
            (false, true) => return Ordering::Greater,
            (false, false) => {}
        }

        let a_digit = a.as_bytes().first().is_some_and(u8::is_ascii_digit);
        let b_digit = b.as_bytes().first().is_some_and(u8::is_ascii_digit);

        let (a_run, a_rest) = split_run(a, a_digit);
        let (b_run, b_rest) = split_run(b, b_digit);

        let ord = if a_digit && b_digit {
            let a_num = a_run.trim_start_matches('0');
            let b_num = b_run.trim_start_matches('0');
            a_num.len().cmp(&b_num.len()).then_with(|| a_num.cmp(b_num))
        } else {
            a_run.cmp(b_run)
        };

        if ord != Ordering::Equal {
            return ord;
        }
        a = a_rest;
        b = b_rest;
    }
}

fn split_run(s: &str, digits: bool) -> (&str, &str) {
    let end = s
        .char_indices()
        .find(|(_, c)| c.is_ascii_digit() != digits)
        .map_or(s.len(), |(i, _)| i);
    s.split_at(end)
}

// ── PortMode ────────────────────────────────────────────────────────

/// 802.1Q mode of a port, spelled the way NetBox spells it.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr, Serialize,
)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
#[serde(rename_all = "kebab-case")]
pub enum PortMode {
    Access,
    Tagged,
    TaggedAll,
    Unknown,
}

impl PortMode {
    /// Parse an inventory mode value; missing or unrecognised is `Unknown`.
    pub fn from_inventory(value: Option<&str>) -> Self {
        value
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(Self::Unknown)
    }
}

// ── TaggedVlans ─────────────────────────────────────────────────────

/// Tagged membership: an explicit set, or every VLAN.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaggedVlans {
    Set(BTreeSet<VlanIdentity>),
    All,
}

impl TaggedVlans {
    pub fn empty() -> Self {
        Self::Set(BTreeSet::new())
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Set(set) if set.is_empty())
    }

    pub fn as_set(&self) -> Option<&BTreeSet<VlanIdentity>> {
        match self {
            Self::Set(set) => Some(set),
            Self::All => None,
        }
    }
}

impl fmt::Display for TaggedVlans {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Set(set) if set.is_empty() => f.write_str("-"),
            Self::Set(set) => {
                let parts: Vec<String> = set.iter().map(ToString::to_string).collect();
                f.write_str(&parts.join(","))
            }
        }
    }
}

impl Serialize for TaggedVlans {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::All => serializer.serialize_str("all"),
            Self::Set(set) => serializer.collect_seq(set),
        }
    }
}

// ── PortVlanState ───────────────────────────────────────────────────

/// VLAN configuration of one port on either side.
///
/// Fields are private: the constructor enforces that access ports carry
/// no tagged VLANs and that tagged-all ports carry the `All` sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PortVlanState {
    port_name: String,
    mode: PortMode,
    native: Option<VlanIdentity>,
    tagged: TaggedVlans,
}

impl PortVlanState {
    pub fn new(
        port_name: impl Into<String>,
        mode: PortMode,
        native: Option<VlanIdentity>,
        tagged: impl IntoIterator<Item = VlanIdentity>,
    ) -> Self {
        let tagged = match mode {
            PortMode::Access => TaggedVlans::empty(),
            PortMode::TaggedAll => TaggedVlans::All,
            PortMode::Tagged | PortMode::Unknown => TaggedVlans::Set(tagged.into_iter().collect()),
        };
        Self {
            port_name: port_name.into(),
            mode,
            native,
            tagged,
        }
    }

    /// Port name with its original casing.
    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    pub fn mode(&self) -> PortMode {
        self.mode
    }

    pub fn native(&self) -> Option<&VlanIdentity> {
        self.native.as_ref()
    }

    pub fn tagged(&self) -> &TaggedVlans {
        &self.tagged
    }

    pub fn is_tagged_all(&self) -> bool {
        self.tagged.is_all()
    }

    /// Short `native / tagged` rendering for logs and tables.
    pub fn summary(&self) -> String {
        let native = self
            .native
            .as_ref()
            .map_or_else(|| "-".to_owned(), ToString::to_string);
        format!("{} native={native} tagged={}", self.mode, self.tagged)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::vlan::VlanId;

    fn vid(n: i64) -> VlanIdentity {
        VlanIdentity::Vid(VlanId::new(n).unwrap())
    }

    #[test]
    fn natural_order_of_ports() {
        let mut keys: Vec<PortKey> = ["port10", "port2", "port1"]
            .into_iter()
            .filter_map(PortKey::new)
            .collect();
        keys.sort();
        let names: Vec<&str> = keys.iter().map(PortKey::as_str).collect();
        assert_eq!(names, vec!["port1", "port2", "port10"]);
    }

    #[test]
    fn natural_order_multiple_numeric_runs() {
        assert_eq!(natural_cmp("1/0/10", "1/0/9"), Ordering::Greater);
        assert_eq!(natural_cmp("internal", "port1"), Ordering::Less);
        assert_eq!(natural_cmp("port", "port1"), Ordering::Less);
        assert_eq!(natural_cmp("port01", "port1"), Ordering::Equal);
        assert_ne!(
            PortKey::new("port01").unwrap().cmp(&PortKey::new("port1").unwrap()),
            Ordering::Equal
        );
    }

    #[test]
    fn key_is_case_insensitive() {
        assert_eq!(PortKey::new("Port1"), PortKey::new("port1"));
        assert_eq!(PortKey::new("  "), None);
    }

    #[test]
    fn access_mode_drops_tagged() {
        let state = PortVlanState::new("port1", PortMode::Access, Some(vid(10)), [vid(20), vid(30)]);
        assert!(state.tagged().is_empty());
        assert_eq!(state.native(), Some(&vid(10)));
    }

    #[test]
    fn tagged_all_uses_sentinel() {
        let state = PortVlanState::new("port1", PortMode::TaggedAll, None, [vid(20)]);
        assert!(state.is_tagged_all());
    }

    #[test]
    fn mode_parsing() {
        assert_eq!(PortMode::from_inventory(Some("tagged-all")), PortMode::TaggedAll);
        assert_eq!(PortMode::from_inventory(Some("Access")), PortMode::Access);
        assert_eq!(PortMode::from_inventory(Some("q-in-q")), PortMode::Unknown);
        assert_eq!(PortMode::from_inventory(None), PortMode::Unknown);
        assert_eq!(PortMode::TaggedAll.to_string(), "tagged-all");
    }

    #[test]
    fn summary_rendering() {
        let state = PortVlanState::new("port1", PortMode::Tagged, Some(vid(90)), [vid(50), vid(40)]);
        assert_eq!(state.summary(), "tagged native=VLAN-90 tagged=VLAN-40,VLAN-50");
    }
}
