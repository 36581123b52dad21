// ── Domain model ──
//
// Strongly-typed view of VLANs and ports. Raw collaborator records are
// parsed into these types at the boundary (see `extract`); reconciliation
// never touches untyped data.

pub mod port;
pub mod switch;
pub mod vlan;

pub use port::{PortKey, PortMode, PortVlanState, TaggedVlans, natural_cmp};
pub use switch::{InventoryPort, InventoryState, SwitchState};
pub use vlan::{VlanId, VlanIdentity, VlanRef, VlanTranslations, normalize};
