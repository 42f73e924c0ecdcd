mod app;
mod fireflies;
mod input;
mod render;

use anyhow::{Context, Result};
use shroomling::config::{project_paths, Paths};
use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "SHROOMLING_LOG";

fn main() -> Result<()> {
    let paths = project_paths()?;
    init_tracing(&paths)?;
    app::run(paths)
}

// The terminal is in raw alternate-screen mode, so logs go to a file.
fn init_tracing(paths: &Paths) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&paths.log_path)
        .with_context(|| format!("opening log file {}", paths.log_path.display()))?;
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_target(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}
