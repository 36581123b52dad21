//! VLAN reconciliation engine between FortiGate-managed switches and NetBox.
//!
//! Data flows one way:
//!
//! - **[`source`]** — collaborator traits ([`SwitchSource`], [`Inventory`])
//!   and their implementations over `vlansync-api` clients.
//! - **[`extract`]** — raw records → typed [`SwitchState`] / [`InventoryState`].
//! - **[`reconcile`]** — port-by-port diff producing [`Mismatch`]es whose
//!   [`DesiredState`] always mirrors the switch.
//! - **[`writeback`]** — bounded, verified NetBox updates under an
//!   [`UpdateBudget`] (the kill-switch).
//! - **[`orchestrator`]** — [`run_reconciliation()`] and [`check_switch()`],
//!   the only entry points the CLI needs.

pub mod config;
pub mod error;
pub mod extract;
pub mod model;
pub mod orchestrator;
pub mod reconcile;
pub mod report;
pub mod source;
pub mod writeback;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{CacheConfig, InventoryConfig, SourceConfig, SyncConfig};
pub use error::CoreError;
pub use model::{
    InventoryState, PortKey, PortMode, PortVlanState, SwitchState, TaggedVlans, VlanId,
    VlanIdentity, VlanRef, VlanTranslations,
};
pub use orchestrator::{RunOptions, check_switch, reconcile_all, run_reconciliation};
pub use reconcile::{DesiredState, Mismatch, PortComparison};
pub use report::{RunMode, RunOutcome, RunReport, SwitchCheck, SwitchSummary};
pub use source::{Inventory, SwitchSource};
pub use writeback::{UpdateBudget, WriteResult, WriteStatus};
