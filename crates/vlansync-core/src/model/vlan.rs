// ── VLAN identity ──
//
// FortiGate and NetBox name VLANs differently: FortiOS uses object names
// (`vlan90`, `VLAN-90`, `_default`), NetBox exposes numeric vids and
// display strings like `VLAN-90 (90)`. Everything is folded into a
// `VlanIdentity` before comparison.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Serialize, Serializer};

// ── VlanId ──────────────────────────────────────────────────────────

/// An 802.1Q VLAN id, always within `1..=4094`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct VlanId(u16);

impl VlanId {
    pub const MIN: u16 = 1;
    pub const MAX: u16 = 4094;

    /// `None` for 0, negatives and anything above 4094.
    pub fn new(vid: i64) -> Option<Self> {
        u16::try_from(vid)
            .ok()
            .filter(|v| (Self::MIN..=Self::MAX).contains(v))
            .map(Self)
    }

    pub fn get(self) -> u16 {
        self.0
    }
}

impl fmt::Display for VlanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── VlanRef ─────────────────────────────────────────────────────────

/// A raw, not yet normalized VLAN reference as a collaborator reports it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VlanRef {
    Vid(i64),
    Name(String),
}

impl From<i64> for VlanRef {
    fn from(vid: i64) -> Self {
        Self::Vid(vid)
    }
}

impl From<&str> for VlanRef {
    fn from(name: &str) -> Self {
        Self::Name(name.to_owned())
    }
}

impl From<String> for VlanRef {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl From<&VlanIdentity> for VlanRef {
    fn from(identity: &VlanIdentity) -> Self {
        match identity {
            VlanIdentity::Vid(vid) => Self::Vid(i64::from(vid.get())),
            VlanIdentity::Name(name) => Self::Name(name.clone()),
        }
    }
}

// ── VlanIdentity ────────────────────────────────────────────────────

/// Canonical VLAN reference.
///
/// `Name` keeps the original casing for display, but equality, hashing
/// and ordering are case-insensitive. Every `Vid` sorts before every `Name`.
#[derive(Debug, Clone)]
pub enum VlanIdentity {
    Vid(VlanId),
    Name(String),
}

impl VlanIdentity {
    pub fn vid(&self) -> Option<VlanId> {
        match self {
            Self::Vid(vid) => Some(*vid),
            Self::Name(_) => None,
        }
    }

    fn folded_name(&self) -> Option<String> {
        match self {
            Self::Vid(_) => None,
            Self::Name(name) => Some(name.to_lowercase()),
        }
    }
}

impl From<VlanId> for VlanIdentity {
    fn from(vid: VlanId) -> Self {
        Self::Vid(vid)
    }
}

impl PartialEq for VlanIdentity {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Vid(a), Self::Vid(b)) => a == b,
            (Self::Name(a), Self::Name(b)) => a.to_lowercase() == b.to_lowercase(),
            _ => false,
        }
    }
}

impl Eq for VlanIdentity {}

impl Hash for VlanIdentity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Self::Vid(vid) => {
                0u8.hash(state);
                vid.hash(state);
            }
            Self::Name(_) => {
                1u8.hash(state);
                self.folded_name().hash(state);
            }
        }
    }
}

impl Ord for VlanIdentity {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Vid(a), Self::Vid(b)) => a.cmp(b),
            (Self::Vid(_), Self::Name(_)) => Ordering::Less,
            (Self::Name(_), Self::Vid(_)) => Ordering::Greater,
            (Self::Name(_), Self::Name(_)) => self.folded_name().cmp(&other.folded_name()),
        }
    }
}

impl PartialOrd for VlanIdentity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for VlanIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vid(vid) => write!(f, "VLAN-{vid}"),
            Self::Name(name) => f.write_str(name),
        }
    }
}

impl Serialize for VlanIdentity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Vid(vid) => serializer.serialize_u16(vid.get()),
            Self::Name(name) => serializer.serialize_str(name),
        }
    }
}

// ── Normalization ───────────────────────────────────────────────────

/// Operator-supplied aliases from raw VLAN names to vids, consulted
/// before any pattern matching (e.g. `_default` -> 1).
#[derive(Debug, Clone, Default)]
pub struct VlanTranslations {
    table: HashMap<String, VlanId>,
}

impl VlanTranslations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, raw: impl Into<String>, vid: VlanId) {
        self.table.insert(raw.into(), vid);
    }

    pub fn get(&self, raw: &str) -> Option<VlanId> {
        self.table.get(raw).copied()
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Normalize a raw reference. `None` means "no VLAN", which is
    /// distinct from any identity.
    ///
    /// Surrounding whitespace is ignored. Order: exact translation hit,
    /// then the `vlanNN` / `VLAN-NN (NN)` patterns, then an opaque name.
    /// Integers outside `1..=4094` and blank strings yield `None`.
    pub fn normalize(&self, raw: &VlanRef) -> Option<VlanIdentity> {
        match raw {
            VlanRef::Vid(vid) => VlanId::new(*vid).map(VlanIdentity::Vid),
            VlanRef::Name(name) => {
                let trimmed = name.trim();
                if trimmed.is_empty() {
                    return None;
                }
                if let Some(vid) = self.get(trimmed) {
                    return Some(VlanIdentity::Vid(vid));
                }
                Some(match parse_vlan_digits(trimmed).and_then(VlanId::new) {
                    Some(vid) => VlanIdentity::Vid(vid),
                    None => VlanIdentity::Name(trimmed.to_owned()),
                })
            }
        }
    }

    /// Re-normalize an identity (used to check idempotence).
    pub fn renormalize(&self, identity: &VlanIdentity) -> Option<VlanIdentity> {
        self.normalize(&VlanRef::from(identity))
    }
}

impl FromIterator<(String, VlanId)> for VlanTranslations {
    fn from_iter<I: IntoIterator<Item = (String, VlanId)>>(iter: I) -> Self {
        Self {
            table: iter.into_iter().collect(),
        }
    }
}

/// Normalize without any translation table.
pub fn normalize(raw: &VlanRef) -> Option<VlanIdentity> {
    VlanTranslations::default().normalize(raw)
}

static VLAN_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:vlan[- ]?)?(\d+)$").expect("VLAN_NAME_RE is a valid regex pattern")
});

static VLAN_DISPLAY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:vlan[- ]?)?(\d+)\s*\(\d+\)$")
        .expect("VLAN_DISPLAY_RE is a valid regex pattern")
});

/// Vid digits of a `vlanNN` name or a `VLAN-NN (NN)` display string.
///
/// `None` when neither pattern matches or the digits overflow `i64`.
fn parse_vlan_digits(s: &str) -> Option<i64> {
    VLAN_NAME_RE
        .captures(s)
        .or_else(|| VLAN_DISPLAY_RE.captures(s))
        .and_then(|caps| caps.get(1))
        .and_then(|digits| digits.as_str().parse().ok())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn vid(n: i64) -> VlanIdentity {
        VlanIdentity::Vid(VlanId::new(n).unwrap())
    }

    #[test]
    fn equivalent_spellings() {
        let expected = Some(vid(31));
        assert_eq!(normalize(&"vlan31".into()), expected);
        assert_eq!(normalize(&"VLAN-31".into()), expected);
        assert_eq!(normalize(&"VLAN-31 (31)".into()), expected);
        assert_eq!(normalize(&"vlan 31".into()), expected);
        assert_eq!(normalize(&"31".into()), expected);
        assert_eq!(normalize(&VlanRef::Vid(31)), expected);
    }

    #[test]
    fn normalization_is_idempotent() {
        let translations: VlanTranslations =
            [("_default".to_owned(), VlanId::new(1).unwrap())].into_iter().collect();
        let inputs: Vec<VlanRef> = vec![
            "vlan90".into(),
            "VLAN-4094 (4094)".into(),
            "_default".into(),
            "_default ".into(),
            "  Guest-WiFi ".into(),
            " vlan31 ".into(),
            "vlan5000".into(),
            "vlan0".into(),
            VlanRef::Vid(12),
        ];
        for raw in inputs {
            let once = translations.normalize(&raw).unwrap();
            let twice = translations.renormalize(&once).unwrap();
            assert_eq!(once, twice, "{raw:?}");
            assert_eq!(once.to_string(), twice.to_string(), "{raw:?}");
        }
    }

    #[test]
    fn absent_and_invalid_values() {
        assert_eq!(normalize(&"".into()), None);
        assert_eq!(normalize(&"   ".into()), None);
        assert_eq!(normalize(&VlanRef::Vid(0)), None);
        assert_eq!(normalize(&VlanRef::Vid(-3)), None);
        assert_eq!(normalize(&VlanRef::Vid(4095)), None);
    }

    #[test]
    fn out_of_range_names_stay_opaque() {
        assert_eq!(
            normalize(&"vlan0".into()),
            Some(VlanIdentity::Name("vlan0".into()))
        );
        assert_eq!(
            normalize(&"vlan99999999999999999999".into()),
            Some(VlanIdentity::Name("vlan99999999999999999999".into()))
        );
    }

    #[test]
    fn non_matching_strings_are_opaque() {
        let raws = [
            "_default",
            "vlan",
            "vlan-",
            "vlan90x",
            "VLAN-90 (x)",
            "VLAN-90 ()",
            "vlan--90",
            "vlan31 (31",
            "31)",
            "vlan_31",
            "VLAN-90 (90) x",
        ];
        for raw in raws {
            assert!(
                matches!(normalize(&raw.into()), Some(VlanIdentity::Name(_))),
                "{raw} should be opaque"
            );
        }
    }

    #[test]
    fn translation_takes_precedence() {
        let mut translations = VlanTranslations::new();
        translations.insert("vlan90", VlanId::new(190).unwrap());
        translations.insert("_default", VlanId::new(1).unwrap());

        assert_eq!(translations.normalize(&"vlan90".into()), Some(vid(190)));
        assert_eq!(translations.normalize(&"_default".into()), Some(vid(1)));
        assert_eq!(translations.normalize(&" _default ".into()), Some(vid(1)));
        // Exact match only.
        assert_eq!(translations.normalize(&"VLAN90".into()), Some(vid(90)));
    }

    #[test]
    fn opaque_names_compare_case_insensitively() {
        let a = VlanIdentity::Name("Guest".into());
        let b = VlanIdentity::Name("GUEST".into());
        assert_eq!(a, b);
        assert_eq!(a.cmp(&b), Ordering::Equal);
        assert_ne!(a, vid(5));
        assert!(vid(4094) < a);
    }

    #[test]
    fn display_round_trips_through_normalize() {
        assert_eq!(vid(90).to_string(), "VLAN-90");
        assert_eq!(normalize(&vid(90).to_string().into()), Some(vid(90)));
    }
}
