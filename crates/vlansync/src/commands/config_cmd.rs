//! Config subcommand handlers.

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts, OutputFormat};
use crate::config;
use crate::error::CliError;
use crate::output;

pub fn handle(args: &ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Path => {
            let source = config::config_source(global);
            output::print_output(&source.path().display().to_string(), global.quiet);
            Ok(())
        }

        ConfigCommand::Show => {
            let loaded = config::load(global)?;
            let redacted = loaded.config.redacted();
            let rendered = match global.output {
                // Tables make no sense for a nested document; show TOML.
                OutputFormat::Table => redacted.to_toml()?,
                format => output::render(format, &redacted, |_| String::new())?,
            };
            output::print_output(&rendered, global.quiet);
            Ok(())
        }

        ConfigCommand::Validate => {
            let loaded = config::load_required(global)?;
            let sync = loaded.config.to_sync_config()?;
            output::print_output(
                &format!(
                    "{}: OK ({} FortiGate(s), {} VLAN translation(s), NetBox {})",
                    loaded.source.path().display(),
                    sync.fortigates.len(),
                    sync.translations.len(),
                    sync.netbox.url,
                ),
                global.quiet,
            );
            Ok(())
        }
    }
}
