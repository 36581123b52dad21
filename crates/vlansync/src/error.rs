//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors with
//! actionable help text and a process exit code.

use miette::Diagnostic;
use thiserror::Error;

use vlansync_config::ConfigError;
use vlansync_core::CoreError;

pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const FATAL: i32 = 1;
    pub const BUDGET_EXHAUSTED: i32 = 3;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Fatal run conditions ─────────────────────────────────────────

    #[error("Missing switch in NetBox: name={name}")]
    #[diagnostic(
        code(vlansync::missing_device),
        help(
            "The FortiGate manages a switch NetBox does not know about.\n\
             Create a NetBox device named exactly '{name}' before re-running."
        )
    )]
    MissingDevice { name: String },

    #[error("Switch not found on any FortiGate: name={name}")]
    #[diagnostic(
        code(vlansync::target_not_found),
        help("Switch names are matched exactly. Run: vlansync sync (without --switch) to list them")
    )]
    TargetNotFound { name: String },

    #[error("Failed to retrieve switches from FortiGate {device}")]
    #[diagnostic(
        code(vlansync::source_fetch),
        help("{message}\nCheck the host, API token and verify_ssl for this FortiGate.")
    )]
    SourceFetch { device: String, message: String },

    #[error("NetBox request failed: {message}")]
    #[diagnostic(code(vlansync::netbox))]
    Inventory { message: String },

    #[error("Cannot resolve {vlan} to a NetBox VLAN")]
    #[diagnostic(code(vlansync::unresolvable_vlan))]
    UnresolvableVlan { vlan: String },

    // ── Kill-switch ──────────────────────────────────────────────────

    #[error("Update budget exhausted with {remaining} mismatch(es) still pending")]
    #[diagnostic(
        code(vlansync::budget_exhausted),
        help("Re-run to continue, or raise the budget with --max-updates.")
    )]
    BudgetExhausted { remaining: usize },

    // ── Configuration ────────────────────────────────────────────────

    #[error("Configuration file not found")]
    #[diagnostic(
        code(vlansync::no_config),
        help("Create one, or point --config / VLANSYNC_CONFIG at it.\nExpected at: {path}")
    )]
    NoConfig { path: String },

    #[error("No API token configured for {target}")]
    #[diagnostic(
        code(vlansync::no_credentials),
        help("Set one of api_token_env, api_token_file or api_token.")
    )]
    NoCredentials { target: String },

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(vlansync::validation))]
    Validation { field: String, reason: String },

    #[error("{message}")]
    #[diagnostic(code(vlansync::config))]
    Config { message: String },

    // ── Cache / IO / Serialization ───────────────────────────────────

    #[error(transparent)]
    #[diagnostic(code(vlansync::cache))]
    Cache(#[from] vlansync_api::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render output: {message}")]
    #[diagnostic(code(vlansync::render))]
    Render { message: String },
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::BudgetExhausted { .. } => exit_code::BUDGET_EXHAUSTED,
            _ => exit_code::FATAL,
        }
    }

    /// Short machine-readable line printed ahead of the full diagnostic.
    pub fn fatal_line(&self) -> Option<String> {
        match self {
            Self::MissingDevice { .. } | Self::TargetNotFound { .. } => Some(self.to_string()),
            _ => None,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::MissingDevice { name } => CliError::MissingDevice { name },
            CoreError::TargetNotFound { name } => CliError::TargetNotFound { name },
            CoreError::SourceFetch { device, message } => {
                CliError::SourceFetch { device, message }
            }
            CoreError::Inventory { message, .. } => CliError::Inventory { message },
            CoreError::UnresolvableVlan { vlan } => CliError::UnresolvableVlan { vlan },
            CoreError::Config { message } => CliError::Config { message },
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NotFound { path } => CliError::NoConfig {
                path: path.display().to_string(),
            },
            ConfigError::NoCredentials { target } => CliError::NoCredentials { target },
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::Io(e) => CliError::Io(e),
            other @ (ConfigError::Serialization(_) | ConfigError::Figment(_)) => {
                CliError::Config {
                    message: other.to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes() {
        assert_eq!(
            CliError::BudgetExhausted { remaining: 2 }.exit_code(),
            exit_code::BUDGET_EXHAUSTED
        );
        assert_eq!(
            CliError::from(CoreError::MissingDevice { name: "SW1".into() }).exit_code(),
            exit_code::FATAL
        );
        assert_eq!(
            CliError::from(ConfigError::NoCredentials {
                target: "netbox".into()
            })
            .exit_code(),
            exit_code::FATAL
        );
    }

    #[test]
    fn fatal_lines_are_machine_readable() {
        let missing = CliError::from(CoreError::MissingDevice { name: "SW1".into() });
        assert_eq!(
            missing.fatal_line().as_deref(),
            Some("Missing switch in NetBox: name=SW1")
        );

        let target = CliError::from(CoreError::TargetNotFound { name: "SW9".into() });
        assert_eq!(
            target.fatal_line().as_deref(),
            Some("Switch not found on any FortiGate: name=SW9")
        );

        assert!(CliError::BudgetExhausted { remaining: 1 }.fatal_line().is_none());
    }
}
