mod cli;
mod commands;
mod config;
mod error;
mod output;

use std::io::IsTerminal;

use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, fmt, prelude::*};

use vlansync_config::RuntimeSection;

use crate::cli::{Cli, Command, GlobalOpts, LogFormat};
use crate::error::{CliError, exit_code};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let code = match run(cli).await {
        Ok(()) => exit_code::SUCCESS,
        Err(err) => {
            let code = err.exit_code();
            if let Some(line) = err.fatal_line() {
                eprintln!("{line}");
            }
            eprintln!("{:?}", miette::Report::new(err));
            code
        }
    };
    std::process::exit(code);
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let global = &cli.global;
    match cli.command {
        // Config commands must work even when the config is broken
        Command::Config(args) => {
            let _guard = init_tracing(global, None);
            commands::config_cmd::handle(&args, global)
        }

        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "vlansync", &mut std::io::stdout());
            Ok(())
        }

        cmd => {
            let loaded = if matches!(cmd, Command::Cache(_)) {
                config::load(global)?
            } else {
                config::load_required(global)?
            };
            let _guard = init_tracing(global, Some(&loaded.config.runtime));

            tracing::debug!(
                command = ?cmd,
                config = %loaded.source.path().display(),
                "dispatching command"
            );
            commands::dispatch(cmd, &loaded, global).await
        }
    }
}

/// Install the global subscriber: stderr (text or JSON) plus an optional
/// timestamped log file under `runtime.log_dir`.
///
/// Filter precedence: `RUST_LOG`, then `-v`/`-q`, then `runtime.log_level`.
/// The returned guard flushes the file writer on drop.
fn init_tracing(global: &GlobalOpts, runtime: Option<&RuntimeSection>) -> Option<WorkerGuard> {
    let level = match global.verbose {
        0 if global.quiet => "error",
        0 => runtime.map_or("warn", |r| r.log_level.as_str()),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let stderr_layer = match global.log_format {
        LogFormat::Text => fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(std::io::stderr().is_terminal())
            .with_target(false)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .boxed(),
    };

    let (file_layer, guard) = match runtime.and_then(|r| r.log_dir.as_deref()) {
        Some(dir) => match std::fs::create_dir_all(dir) {
            Ok(()) => {
                let file_name = chrono::Local::now()
                    .format("vlansync_%Y-%m-%d__%H_%M_%S.log")
                    .to_string();
                let appender = tracing_appender::rolling::never(dir, file_name);
                let (writer, guard) = tracing_appender::non_blocking(appender);
                let layer = fmt::layer()
                    .with_writer(writer)
                    .with_ansi(false)
                    .with_target(true)
                    .boxed();
                (Some(layer), Some(guard))
            }
            Err(e) => {
                eprintln!(
                    "error: cannot create log directory {}: {e} (file logging disabled)",
                    dir.display()
                );
                (None, None)
            }
        },
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();

    guard
}
