//! `cache` handlers: list and clear the local response cache.

use tabled::Tabled;

use vlansync_api::{CacheEntry, ResponseCache};

use crate::cli::{CacheArgs, CacheCommand, GlobalOpts};
use crate::config::Loaded;
use crate::error::CliError;
use crate::output;

#[derive(Tabled)]
struct EntryRow {
    #[tabled(rename = "Key")]
    key: String,
    #[tabled(rename = "Size")]
    size: String,
    #[tabled(rename = "Modified")]
    modified: String,
}

impl From<&CacheEntry> for EntryRow {
    fn from(e: &CacheEntry) -> Self {
        Self {
            key: e.key.clone(),
            size: format!("{} B", e.size_bytes),
            modified: e.modified.map_or_else(
                || "-".into(),
                |m| m.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            ),
        }
    }
}

pub fn handle(args: &CacheArgs, loaded: &Loaded, global: &GlobalOpts) -> Result<(), CliError> {
    let dir = loaded
        .config
        .runtime
        .cache_dir
        .as_deref()
        .ok_or_else(|| CliError::Validation {
            field: "runtime.cache_dir".into(),
            reason: "is not set, so there is no response cache".into(),
        })?;
    let cache = ResponseCache::open(dir, false)?;

    match args.command {
        CacheCommand::List => {
            let entries = cache.list()?;
            let rendered = output::render(global.output, &entries, |e| {
                if e.is_empty() {
                    format!("No cached responses in {}", dir.display())
                } else {
                    let rows: Vec<EntryRow> = e.iter().map(EntryRow::from).collect();
                    output::render_table(&rows)
                }
            })?;
            output::print_output(&rendered, global.quiet);
        }
        CacheCommand::Clear => {
            let removed = cache.clear()?;
            tracing::info!(removed, dir = %dir.display(), "response cache cleared");
            output::print_output(
                &format!("Removed {removed} cached response(s) from {}", dir.display()),
                global.quiet,
            );
        }
    }
    Ok(())
}
