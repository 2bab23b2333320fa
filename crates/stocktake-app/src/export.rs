use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use stocktake_core::csv_export::{data_uri, export_rows, file_name, to_csv};
use stocktake_core::model::ItemsSnapshot;

use crate::App;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportSource {
    Server,
    Cache,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportResult {
    pub path: PathBuf,
    pub items: usize,
    pub source: ExportSource,
}

/// The export as a `data:` URI that a browser opens as a CSV download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUriExport {
    pub uri: String,
    pub items: usize,
    pub source: ExportSource,
}

impl<'a> App<'a> {
    pub fn default_export_path(&self) -> PathBuf {
        PathBuf::from(file_name(self.title()))
    }

    pub fn export_csv(&self, output: Option<&Path>, offline: bool) -> Result<ExportResult> {
        let (snapshot, source) = self.export_snapshot(offline)?;
        let path = output
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.default_export_path());
        let items = write_export(&snapshot, &path)?;
        Ok(ExportResult {
            path,
            items,
            source,
        })
    }

    pub fn export_data_uri(&self, offline: bool) -> Result<DataUriExport> {
        let (snapshot, source) = self.export_snapshot(offline)?;
        let csv = to_csv(&export_rows(&snapshot.items, &snapshot.lists))?;
        tracing::info!(items = snapshot.items.len(), "exported csv as data uri");
        Ok(DataUriExport {
            uri: data_uri(&csv),
            items: snapshot.items.len(),
            source,
        })
    }

    fn export_snapshot(&self, offline: bool) -> Result<(ItemsSnapshot, ExportSource)> {
        if !offline {
            return Ok((self.fetch_snapshot()?, ExportSource::Server));
        }

        let cache = self.cache();
        let Some(state) = cache.load()? else {
            bail!(
                "no cached data for store {} at {}\nRun without --offline once to fill the cache.",
                self.store_id(),
                cache.path().display()
            );
        };
        Ok((state.snapshot(), ExportSource::Cache))
    }
}

/// Writes the items by lists matrix to `path`, returning the item count.
pub fn write_export(snapshot: &ItemsSnapshot, path: &Path) -> Result<usize> {
    let csv = to_csv(&export_rows(&snapshot.items, &snapshot.lists))?;
    fs::write(path, csv).with_context(|| format!("failed to write {}", path.display()))?;
    tracing::info!(path = %path.display(), items = snapshot.items.len(), "exported csv");
    Ok(snapshot.items.len())
}
