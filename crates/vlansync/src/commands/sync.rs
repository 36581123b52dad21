//! `sync` handler: run a reconciliation pass and print its report.

use tabled::Tabled;

use vlansync_core::{RunOutcome, RunReport, WriteStatus, run_reconciliation};

use crate::cli::{GlobalOpts, SyncArgs};
use crate::config::Loaded;
use crate::error::CliError;
use crate::output::{self, Tone, paint};

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct SwitchRow {
    #[tabled(rename = "FortiGate")]
    source: String,
    #[tabled(rename = "Switch")]
    switch: String,
    #[tabled(rename = "Device")]
    device_id: u64,
    #[tabled(rename = "Matched")]
    matched: usize,
    #[tabled(rename = "Missing")]
    missing: usize,
    #[tabled(rename = "Mismatched")]
    mismatched: String,
}

#[derive(Tabled)]
struct MismatchRow {
    #[tabled(rename = "Switch")]
    switch: String,
    #[tabled(rename = "Port")]
    port: String,
    #[tabled(rename = "FortiGate")]
    switch_state: String,
    #[tabled(rename = "NetBox")]
    inventory_state: String,
    #[tabled(rename = "Desired")]
    desired: String,
}

#[derive(Tabled)]
struct WriteRow {
    #[tabled(rename = "Port")]
    port: String,
    #[tabled(rename = "Interface")]
    interface_id: u64,
    #[tabled(rename = "Written")]
    desired: String,
    #[tabled(rename = "Result")]
    result: String,
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(args: &SyncArgs, loaded: &Loaded, global: &GlobalOpts) -> Result<(), CliError> {
    let mut config = loaded.config.clone();
    if let Some(max_updates) = args.max_updates {
        config.runtime.max_updates = max_updates;
    }
    let sync_config = config.to_sync_config()?;

    let target = args
        .switch
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .or_else(|| config.test_switch());

    let report = run_reconciliation(&sync_config, target).await?;

    let color = output::should_color(global.color);
    let rendered = output::render(global.output, &report, |r| render_report(r, color))?;
    output::print_output(&rendered, global.quiet);

    if report.outcome == RunOutcome::BudgetExhausted {
        return Err(CliError::BudgetExhausted {
            remaining: pending_mismatches(&report),
        });
    }
    Ok(())
}

/// Mismatches the write-back never reached.
fn pending_mismatches(report: &RunReport) -> usize {
    let processed = report.writes_applied() + report.skipped_unresolvable();
    report.total_mismatches().saturating_sub(processed)
}

// ── Table rendering ─────────────────────────────────────────────────

fn render_report(report: &RunReport, color: bool) -> String {
    let mut sections = Vec::new();

    let switches: Vec<SwitchRow> = report
        .switches
        .iter()
        .map(|s| SwitchRow {
            source: s.source.clone(),
            switch: s.switch.clone(),
            device_id: s.device_id,
            matched: s.matched.len(),
            missing: s.missing.len(),
            mismatched: if s.mismatches.is_empty() {
                paint("0", Tone::Good, color)
            } else {
                paint(&s.mismatches.len().to_string(), Tone::Bad, color)
            },
        })
        .collect();
    sections.push(output::render_table(&switches));

    let mismatches: Vec<MismatchRow> = report
        .switches
        .iter()
        .flat_map(|s| s.mismatches.iter())
        .map(|m| MismatchRow {
            switch: m.switch.clone(),
            port: m.port.clone(),
            switch_state: m.switch_state.summary(),
            inventory_state: m.inventory_state.summary(),
            desired: m.desired.summary(),
        })
        .collect();
    if !mismatches.is_empty() {
        sections.push(output::render_table(&mismatches));
    }

    let writes: Vec<WriteRow> = report
        .switches
        .iter()
        .flat_map(|s| s.writes.iter())
        .map(|w| WriteRow {
            port: w.port.clone(),
            interface_id: w.interface_id,
            desired: w.desired.summary(),
            result: match &w.status {
                WriteStatus::Verified => paint("verified", Tone::Good, color),
                WriteStatus::VerificationFailed { .. } => {
                    paint("verification failed", Tone::Bad, color)
                }
                WriteStatus::SkippedUnresolvable { reason } => {
                    paint(&format!("skipped: {reason}"), Tone::Warn, color)
                }
            },
        })
        .collect();
    if !writes.is_empty() {
        sections.push(output::render_table(&writes));
    }

    let mode = report
        .mode
        .target()
        .map_or_else(|| "full (read-only)".to_owned(), |t| format!("targeted ({t})"));
    let outcome_tone = if report.outcome.is_success() {
        Tone::Good
    } else {
        Tone::Warn
    };
    sections.push(format!(
        "mode: {mode}  outcome: {}  mismatches: {}  missing: {}  budget remaining: {}",
        paint(&report.outcome.to_string(), outcome_tone, color),
        report.total_mismatches(),
        report.total_missing(),
        report.budget_remaining,
    ));

    sections.join("\n\n")
}
