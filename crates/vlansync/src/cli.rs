//! Clap derive structures for the `vlansync` CLI.
//!
//! Defines the command tree, global flags, and shared value enums. Kept
//! free of crate-internal imports so `build.rs` can include it for man
//! page generation.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// vlansync -- reconcile FortiGate switch VLANs into NetBox
#[derive(Debug, Parser)]
#[command(
    name = "vlansync",
    version,
    about = "Reconcile FortiGate switch port VLANs against NetBox",
    long_about = "Compares the per-port VLAN configuration of FortiGate-managed\n\
        switches with the interface records in NetBox.\n\n\
        A full run only reports. Targeting a single switch (--switch or\n\
        runtime.test_switch) also writes corrections back to NetBox, bounded\n\
        by an update budget (--max-updates).",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Config file (TOML or YAML); falls back to $VLANSYNC_CONFIG
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, short = 'o', default_value = "table", global = true)]
    pub output: OutputFormat,

    /// Log line format on stderr
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,
}

// ── Output, Log & Color Enums ────────────────────────────────────────

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// YAML
    Yaml,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines
    Text,
    /// One JSON object per line
    Json,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Reconcile switches against NetBox (writes only with a target switch)
    Sync(SyncArgs),

    /// Compare one switch against NetBox without writing
    Check(CheckArgs),

    /// Inspect or clear the local response cache
    Cache(CacheArgs),

    /// Show, locate, or validate the configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Sync / Check ─────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct SyncArgs {
    /// Only reconcile this switch, and write corrections back to NetBox
    #[arg(long, short = 's')]
    pub switch: Option<String>,

    /// NetBox updates allowed in this run (overrides runtime.max_updates)
    #[arg(long, short = 'm')]
    pub max_updates: Option<u32>,
}

#[derive(Debug, Args)]
pub struct CheckArgs {
    /// Switch name as reported by the FortiGate
    pub switch: String,
}

// ── Cache ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CacheArgs {
    #[command(subcommand)]
    pub command: CacheCommand,
}

#[derive(Debug, Subcommand)]
pub enum CacheCommand {
    /// List cached responses
    #[command(alias = "ls")]
    List,

    /// Delete every cached response
    Clear,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the effective configuration (secrets redacted)
    Show,

    /// Print the config file path in use
    Path,

    /// Validate the configuration and credentials, then exit
    Validate,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
