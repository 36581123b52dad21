// ── Run orchestrator ──
//
// Walks every FortiGate, then every managed switch, strictly one at a
// time. For each switch: find the NetBox device (missing is fatal), fetch
// its interfaces, extract both states, reconcile, and, only when a single
// target switch was requested, hand the mismatches to the write-back
// controller. Full runs never write.

use std::sync::Arc;

use tracing::{error, info, warn};
use vlansync_api::{FortiGateClient, NetBoxClient, ResponseCache};

use crate::config::SyncConfig;
use crate::error::CoreError;
use crate::extract;
use crate::model::VlanTranslations;
use crate::reconcile::{self, compare};
use crate::report::{RunMode, RunOutcome, RunReport, SwitchCheck, SwitchSummary};
use crate::source::{FortiGateSource, Inventory, InventoryDevice, SourceSwitch, SwitchSource};
use crate::writeback::{self, UpdateBudget, WriteBackState};

/// Per-run knobs.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Single-switch mode: only this switch is compared, and written back.
    pub target: Option<String>,
    pub max_updates: u32,
}

// ── Entry points ────────────────────────────────────────────────────

/// Build the API clients from `config` and run a reconciliation pass.
///
/// `target` selects single-switch mode, which is the only mode that
/// writes to NetBox.
pub async fn run_reconciliation(
    config: &SyncConfig,
    target: Option<&str>,
) -> Result<RunReport, CoreError> {
    let (sources, inventory) = connect(config)?;
    let options = RunOptions {
        target: target.map(str::to_owned),
        max_updates: config.max_updates,
    };
    reconcile_all(&sources, &inventory, &config.translations, &options).await
}

/// Compare a single switch without writing anything.
pub async fn check_switch(config: &SyncConfig, switch: &str) -> Result<SwitchCheck, CoreError> {
    let (sources, inventory) = connect(config)?;
    check_with(&sources, &inventory, &config.translations, switch).await
}

/// Instantiate one client per FortiGate plus the NetBox client, sharing
/// a response cache when one is configured.
pub fn connect(config: &SyncConfig) -> Result<(Vec<FortiGateSource>, NetBoxClient), CoreError> {
    let cache = match &config.cache.dir {
        Some(dir) => Some(Arc::new(ResponseCache::open(
            dir.clone(),
            config.cache.use_cached_data,
        )?)),
        None => None,
    };

    let mut inventory = NetBoxClient::new(
        config.netbox.url.clone(),
        &config.netbox.token,
        &config.netbox.transport(),
        config.netbox.retry(),
    )?;
    if let Some(cache) = &cache {
        inventory = inventory.with_cache(Arc::clone(cache));
    }

    let mut sources = Vec::with_capacity(config.fortigates.len());
    for fg in &config.fortigates {
        let mut client = FortiGateClient::new(
            fg.url.clone(),
            &fg.token,
            fg.vdom.clone(),
            &fg.transport(),
        )?;
        if let Some(cache) = &cache {
            client = client.with_cache(Arc::clone(cache));
        }
        sources.push(FortiGateSource::new(fg.name.clone(), client));
    }

    Ok((sources, inventory))
}

// ── Core loop ───────────────────────────────────────────────────────

/// Reconcile every switch reported by `sources` against `inventory`.
pub async fn reconcile_all<S, I>(
    sources: &[S],
    inventory: &I,
    translations: &VlanTranslations,
    options: &RunOptions,
) -> Result<RunReport, CoreError>
where
    S: SwitchSource,
    I: Inventory,
{
    let target = options.target.as_deref();
    let mode = target.map_or(RunMode::Full, |switch| RunMode::Targeted {
        switch: switch.to_owned(),
    });
    let mut budget = UpdateBudget::new(options.max_updates);
    let mut report = RunReport::new(mode, budget);
    let mut matched_any = false;

    for source in sources {
        info!(fortigate = source.label(), "processing FortiGate");
        let switches = fetch_switches(source).await?;

        for switch in switches
            .iter()
            .filter(|sw| target.is_none_or(|t| sw.name == t))
        {
            matched_any = true;
            let (device, mut summary) =
                reconcile_switch(source.label(), switch, inventory, translations).await?;

            if target.is_none() || summary.mismatches.is_empty() {
                report.switches.push(summary);
                continue;
            }

            if budget.is_exhausted() {
                warn!(
                    switch = %switch.name,
                    max_updates = options.max_updates,
                    "single-switch mode active, but max_updates is 0; no NetBox updates will be performed"
                );
                report.switches.push(summary);
                return Ok(report.finish(RunOutcome::Completed, budget));
            }

            let wb = writeback::apply(
                inventory,
                device.id,
                &summary.mismatches,
                translations,
                budget,
            )
            .await?;
            budget = wb.budget;
            summary.writes = wb.results;
            report.switches.push(summary);

            let outcome = match wb.state {
                WriteBackState::Exhausted { .. } => RunOutcome::BudgetExhausted,
                WriteBackState::Stopped => {
                    info!(switch = %switch.name, "all mismatches applied, stopping");
                    RunOutcome::TargetApplied
                }
            };
            return Ok(report.finish(outcome, budget));
        }
    }

    if let Some(name) = target.filter(|_| !matched_any) {
        error!(switch = name, "switch not found on any configured FortiGate");
        return Err(CoreError::TargetNotFound {
            name: name.to_owned(),
        });
    }

    info!(
        switches = report.switches.len(),
        mismatches = report.total_mismatches(),
        "reconciliation complete"
    );
    Ok(report.finish(RunOutcome::Completed, budget))
}

/// Dry-run comparison of one switch, searched across every source.
pub async fn check_with<S, I>(
    sources: &[S],
    inventory: &I,
    translations: &VlanTranslations,
    switch_name: &str,
) -> Result<SwitchCheck, CoreError>
where
    S: SwitchSource,
    I: Inventory,
{
    for source in sources {
        let switches = fetch_switches(source).await?;
        let Some(switch) = switches.iter().find(|sw| sw.name == switch_name) else {
            continue;
        };

        let device = find_device(inventory, &switch.name).await?;
        let interfaces = inventory.fetch_interfaces(device.id).await?;
        let sw_state = extract::switch_state(switch, translations);
        let inv_state = extract::inventory_state(&device, &interfaces, translations);

        return Ok(SwitchCheck {
            source: source.label().to_owned(),
            switch: switch.name.clone(),
            device_id: device.id,
            ports: compare(&sw_state, &inv_state),
        });
    }

    Err(CoreError::TargetNotFound {
        name: switch_name.to_owned(),
    })
}

// ── Steps ───────────────────────────────────────────────────────────

async fn fetch_switches<S: SwitchSource>(source: &S) -> Result<Vec<SourceSwitch>, CoreError> {
    match source.fetch_switches().await {
        Ok(switches) => Ok(switches),
        Err(e) => {
            error!(fortigate = source.label(), error = %e, "failed to retrieve switches");
            Err(match e {
                CoreError::SourceFetch { .. } => e,
                other => CoreError::SourceFetch {
                    device: source.label().to_owned(),
                    message: other.to_string(),
                },
            })
        }
    }
}

async fn find_device<I: Inventory>(inventory: &I, name: &str) -> Result<InventoryDevice, CoreError> {
    if let Some(device) = inventory.find_device(name).await? {
        return Ok(device);
    }
    error!(switch = name, "switch not found in NetBox, stopping");
    Err(CoreError::MissingDevice {
        name: name.to_owned(),
    })
}

async fn reconcile_switch<I: Inventory>(
    source: &str,
    switch: &SourceSwitch,
    inventory: &I,
    translations: &VlanTranslations,
) -> Result<(InventoryDevice, SwitchSummary), CoreError> {
    let device = find_device(inventory, &switch.name).await?;
    let interfaces = inventory.fetch_interfaces(device.id).await?;

    let sw_state = extract::switch_state(switch, translations);
    let inv_state = extract::inventory_state(&device, &interfaces, translations);
    info!(
        switch = %switch.name,
        device_id = device.id,
        switch_ports = sw_state.len(),
        netbox_interfaces = inv_state.len(),
        "comparing"
    );

    let result = reconcile::reconcile(&sw_state, &inv_state);
    let summary = SwitchSummary::new(source, switch.name.clone(), device.id, result);
    Ok((device, summary))
}
