//! Tracing setup. The terminal belongs to the UI, so logs only go to a file.

use anyhow::{Context, Result, anyhow};
use std::fs::File;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Install a fmt subscriber writing to `path`, filtered by `filter`
/// (`RUST_LOG` syntax, e.g. `info` or `mergetui=debug`). No-op without a path.
pub fn init(path: Option<&Path>, filter: &str) -> Result<()> {
    let Some(path) = path else {
        return Ok(());
    };
    let file = File::create(path)
        .with_context(|| format!("creating log file {}", path.display()))?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(filter).context("invalid log filter")?)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow!("installing tracing subscriber: {e}"))?;
    Ok(())
}
