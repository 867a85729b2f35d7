use std::process::ExitCode;

use hakata_core::config::{AppConfig, LoadOptions};

fn main() -> anyhow::Result<ExitCode> {
    // Commands report config problems themselves; logging just falls back to defaults.
    let config = AppConfig::load(LoadOptions::default()).unwrap_or_default();
    hakata_cli::logging::init(&config)?;

    Ok(hakata_cli::run())
}
