use std::{path::PathBuf, sync::Arc};

use anyhow::Context;
use volkano_fs::PhysicalFs;
use volkano_window::{EngineConfig, LOG_TARGET};

const CONFIG_ENV: &str = "VOLKANO_CONFIG";
const DEFAULT_CONFIG: &str = "volkano.json";

/// Loads the config named by `VOLKANO_CONFIG`, or `volkano.json` when it
/// exists, or the defaults.
fn load_config() -> anyhow::Result<EngineConfig> {
    if let Some(path) = std::env::var_os(CONFIG_ENV) {
        let path = PathBuf::from(path);
        return EngineConfig::load(&path)
            .with_context(|| format!("loading {CONFIG_ENV}={}", path.display()));
    }

    let path = PathBuf::from(DEFAULT_CONFIG);
    if path.exists() {
        return Ok(EngineConfig::load(&path)?);
    }

    Ok(EngineConfig::default())
}

fn run() -> anyhow::Result<()> {
    let config = load_config()?;

    volkano_window::register_log_categories();
    volkano_log::init(&config.log)?;

    log::info!(target: LOG_TARGET, "starting with {:?} backend", config.renderer.backend);

    let fs = Arc::new(PhysicalFs::new(config.renderer.asset_root.clone()));
    let result = volkano_window::run(config, fs);

    volkano_log::shutdown();
    result
}

fn main() -> anyhow::Result<()> {
    run()
}
