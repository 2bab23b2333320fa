mod count;
mod export;
mod import;
mod load;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use stocktake_core::api::StocklistApi;
use stocktake_core::cache::LocalCache;
use stocktake_core::config::{StocktakeConfig, load_config, resolve_config_path};
use stocktake_core::doctor::{DoctorReport, run_doctor};

pub use count::{CountError, CountResult};
pub use export::{DataUriExport, ExportResult, ExportSource, write_export};
pub use import::{ImportRequest, ImportSummary};

pub struct App<'a> {
    pub api: &'a dyn StocklistApi,
    pub config: StocktakeConfig,
    config_dir: PathBuf,
}

impl<'a> App<'a> {
    pub fn new(api: &'a dyn StocklistApi, config: StocktakeConfig, config_dir: PathBuf) -> Self {
        Self {
            api,
            config,
            config_dir,
        }
    }

    pub fn store_id(&self) -> u64 {
        self.config.store.id
    }

    pub fn title(&self) -> &str {
        &self.config.store.title
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn cache(&self) -> LocalCache {
        LocalCache::for_store(&self.config_dir, self.store_id())
    }
}

pub fn doctor() -> Result<DoctorReport> {
    Ok(run_doctor())
}

pub fn ensure_config_ready() -> Result<StocktakeConfig> {
    let config_path = resolve_config_path().context("failed to resolve config path")?;

    if !config_path.exists() {
        bail!(
            "missing config at {}\nCreate ~/.config/stocktake/config.toml and see README.md for setup instructions.",
            config_path.display()
        );
    }

    load_config(&config_path).map_err(|error| {
        anyhow!(
            "invalid config at {}: {error}\nFix the config and retry. See README.md for setup instructions.",
            config_path.display()
        )
    })
}
