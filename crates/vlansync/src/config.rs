//! Config loading for the CLI: resolves the file from global flags and
//! hands back both the raw config and where it came from.

use vlansync_config::{Config, ConfigSource, load_config};

use crate::cli::GlobalOpts;
use crate::error::CliError;

pub struct Loaded {
    pub source: ConfigSource,
    pub config: Config,
}

pub fn config_source(global: &GlobalOpts) -> ConfigSource {
    ConfigSource::resolve(global.config.as_deref())
}

/// Load the layered config, tolerating a missing default file.
pub fn load(global: &GlobalOpts) -> Result<Loaded, CliError> {
    let source = config_source(global);
    let config = load_config(&source)?;
    Ok(Loaded { source, config })
}

/// Load the config for commands that talk to FortiGate / NetBox. A missing
/// file at the default location is an error here.
pub fn load_required(global: &GlobalOpts) -> Result<Loaded, CliError> {
    let source = config_source(global);
    if !source.path().is_file() {
        return Err(CliError::NoConfig {
            path: source.path().display().to_string(),
        });
    }
    let config = load_config(&source)?;
    Ok(Loaded { source, config })
}
