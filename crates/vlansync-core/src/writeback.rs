// ── Bounded write-back ──
//
// Applies mismatches to NetBox one at a time under an update budget:
//
//   1. resolve every desired VLAN to a NetBox object id
//      (an unresolvable VLAN skips the port and costs nothing)
//   2. PATCH mode / untagged_vlan / tagged_vlans
//   3. invalidate the device's cached interface listing
//   4. re-read the interface and verify it matches the target
//      (a failure is recorded, never retried)
//   5. spend one unit of budget
//
// HTTP failures on the write itself propagate and abort the run.
// The budget is a plain value passed in and handed back.

use serde::Serialize;
use tracing::{error, info, warn};

use crate::error::CoreError;
use crate::extract::interface_state;
use crate::model::{PortMode, PortVlanState, VlanIdentity, VlanTranslations};
use crate::reconcile::{DesiredState, Mismatch};
use crate::source::{Inventory, InterfaceWrite};

// ── UpdateBudget ────────────────────────────────────────────────────

/// Remaining number of NetBox writes allowed in this run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct UpdateBudget(u32);

impl UpdateBudget {
    pub fn new(max_updates: u32) -> Self {
        Self(max_updates)
    }

    pub fn remaining(self) -> u32 {
        self.0
    }

    pub fn is_exhausted(self) -> bool {
        self.0 == 0
    }

    /// One write spent. Saturates at zero.
    #[must_use]
    pub fn spend(self) -> Self {
        Self(self.0.saturating_sub(1))
    }
}

// ── Results ─────────────────────────────────────────────────────────

/// What happened to a single mismatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum WriteStatus {
    /// Written and confirmed by a fresh read.
    Verified,
    /// Written, but the re-read disagrees with the target.
    VerificationFailed { observed: Option<PortVlanState> },
    /// Not written: a desired VLAN has no NetBox counterpart.
    SkippedUnresolvable { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WriteResult {
    pub port: String,
    pub interface_id: u64,
    pub desired: DesiredState,
    #[serde(flatten)]
    pub status: WriteStatus,
}

impl WriteResult {
    /// Whether a write was actually issued.
    pub fn was_written(&self) -> bool {
        !matches!(self.status, WriteStatus::SkippedUnresolvable { .. })
    }
}

/// Terminal state of one write-back pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteBackState {
    /// Every mismatch was processed.
    Stopped,
    /// Budget ran out with mismatches left over.
    Exhausted { remaining_mismatches: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WriteBack {
    pub results: Vec<WriteResult>,
    pub state: WriteBackState,
    pub budget: UpdateBudget,
}

// ── Controller ──────────────────────────────────────────────────────

/// Apply `mismatches` for one device, spending at most `budget` writes.
pub async fn apply<I: Inventory>(
    inventory: &I,
    device_id: u64,
    mismatches: &[Mismatch],
    translations: &VlanTranslations,
    budget: UpdateBudget,
) -> Result<WriteBack, CoreError> {
    let mut budget = budget;
    let mut results = Vec::with_capacity(mismatches.len());

    for (index, mismatch) in mismatches.iter().enumerate() {
        if budget.is_exhausted() {
            let remaining_mismatches = mismatches.len() - index;
            warn!(
                switch = %mismatch.switch,
                applied = results.iter().filter(|r: &&WriteResult| r.was_written()).count(),
                remaining_mismatches,
                "kill-switch: update budget exhausted, stopping"
            );
            return Ok(WriteBack {
                results,
                state: WriteBackState::Exhausted {
                    remaining_mismatches,
                },
                budget,
            });
        }

        let result = apply_one(inventory, device_id, mismatch, translations).await?;
        if result.was_written() {
            budget = budget.spend();
        }
        results.push(result);
    }

    Ok(WriteBack {
        results,
        state: WriteBackState::Stopped,
        budget,
    })
}

async fn apply_one<I: Inventory>(
    inventory: &I,
    device_id: u64,
    mismatch: &Mismatch,
    translations: &VlanTranslations,
) -> Result<WriteResult, CoreError> {
    let desired = &mismatch.desired;
    let result = |status| WriteResult {
        port: mismatch.port.clone(),
        interface_id: mismatch.interface_id,
        desired: desired.clone(),
        status,
    };

    let write = match resolve(inventory, desired).await {
        Ok(write) => write,
        Err(CoreError::UnresolvableVlan { vlan }) => {
            error!(
                switch = %mismatch.switch,
                port = %mismatch.port,
                vlan = %vlan,
                "cannot resolve VLAN in NetBox, skipping port"
            );
            return Ok(result(WriteStatus::SkippedUnresolvable {
                reason: format!("no NetBox VLAN for {vlan}"),
            }));
        }
        Err(e) => return Err(e),
    };

    info!(
        switch = %mismatch.switch,
        port = %mismatch.port,
        interface_id = mismatch.interface_id,
        desired = %desired.summary(),
        "updating NetBox interface"
    );
    inventory
        .write_interface(mismatch.interface_id, &write)
        .await?;

    if let Err(e) = inventory.invalidate(device_id) {
        warn!(device_id, error = %e, "failed to invalidate cached interfaces");
    }

    let fresh = inventory.read_interface(mismatch.interface_id).await?;
    let observed = interface_state(&fresh, translations);

    match &observed {
        Some(state) if desired.is_satisfied_by(state) => {
            info!(
                switch = %mismatch.switch,
                port = %mismatch.port,
                interface_id = mismatch.interface_id,
                state = %state.summary(),
                "post-update verification OK"
            );
            Ok(result(WriteStatus::Verified))
        }
        _ => {
            error!(
                switch = %mismatch.switch,
                port = %mismatch.port,
                interface_id = mismatch.interface_id,
                desired = %desired.summary(),
                observed = %observed.as_ref().map_or_else(|| "-".to_owned(), PortVlanState::summary),
                "post-update verification failed"
            );
            Ok(result(WriteStatus::VerificationFailed { observed }))
        }
    }
}

/// Turn a desired state into NetBox object ids.
async fn resolve<I: Inventory>(
    inventory: &I,
    desired: &DesiredState,
) -> Result<InterfaceWrite, CoreError> {
    let native = match &desired.native {
        Some(vlan) => Some(resolve_one(inventory, vlan).await?),
        None => None,
    };

    let mut tagged = Vec::new();
    if desired.mode == PortMode::Tagged {
        for vlan in &desired.tagged {
            tagged.push(resolve_one(inventory, vlan).await?);
        }
    }

    Ok(InterfaceWrite {
        mode: desired.mode,
        native,
        tagged,
    })
}

async fn resolve_one<I: Inventory>(inventory: &I, vlan: &VlanIdentity) -> Result<u64, CoreError> {
    let unresolvable = || CoreError::UnresolvableVlan {
        vlan: vlan.to_string(),
    };
    let vid = vlan.vid().ok_or_else(unresolvable)?;
    inventory.resolve_vlan(vid).await?.ok_or_else(unresolvable)
}
