//! `check` handler: side-by-side comparison of one switch, never writes.

use tabled::Tabled;

use vlansync_core::{PortComparison, SwitchCheck, check_switch};

use crate::cli::{CheckArgs, GlobalOpts};
use crate::config::Loaded;
use crate::error::CliError;
use crate::output::{self, Tone, paint};

#[derive(Tabled)]
struct PortRow {
    #[tabled(rename = "Port")]
    port: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "FortiGate")]
    switch_state: String,
    #[tabled(rename = "NetBox")]
    inventory_state: String,
}

pub async fn handle(args: &CheckArgs, loaded: &Loaded, global: &GlobalOpts) -> Result<(), CliError> {
    let sync_config = loaded.config.to_sync_config()?;
    let check = check_switch(&sync_config, args.switch.trim()).await?;

    let color = output::should_color(global.color);
    let rendered = output::render(global.output, &check, |c| render_check(c, color))?;
    output::print_output(&rendered, global.quiet);
    Ok(())
}

fn render_check(check: &SwitchCheck, color: bool) -> String {
    let rows: Vec<PortRow> = check
        .ports
        .iter()
        .map(|p| match p {
            PortComparison::Match { port, state, .. } => PortRow {
                port: port.clone(),
                status: paint("match", Tone::Good, color),
                switch_state: state.summary(),
                inventory_state: state.summary(),
            },
            PortComparison::Mismatch(m) => PortRow {
                port: m.port.clone(),
                status: paint("mismatch", Tone::Bad, color),
                switch_state: m.switch_state.summary(),
                inventory_state: m.inventory_state.summary(),
            },
            PortComparison::Missing { port, switch_state } => PortRow {
                port: port.clone(),
                status: paint("missing", Tone::Warn, color),
                switch_state: switch_state.summary(),
                inventory_state: "-".into(),
            },
        })
        .collect();

    format!(
        "{} on {} (NetBox device {})\n{}",
        check.switch,
        check.source,
        check.device_id,
        output::render_table(&rows)
    )
}
