use std::path::PathBuf;

use anyhow::{Context, Result};
use stocktake_core::counting::CountingSession;
use stocktake_core::csv_import::{ColumnRole, ImportPlan, StagedCsv, import_payload};

use crate::App;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportRequest {
    pub path: PathBuf,
    pub name_columns: Vec<String>,
    pub quantity_column: Option<String>,
    pub delimiter: Option<u8>,
}

#[derive(Debug, Clone)]
pub struct ImportSummary {
    pub imported: usize,
    pub session: Option<CountingSession>,
}

impl<'a> App<'a> {
    pub fn import_file(&self, request: &ImportRequest) -> Result<ImportSummary> {
        let staged = StagedCsv::from_path(&request.path, request.delimiter)?;
        let mut roles = staged.column_roles();

        for field in &request.name_columns {
            roles.set_role_by_field(field, ColumnRole::ItemName)?;
        }
        if let Some(field) = &request.quantity_column {
            roles.set_role_by_field(field, ColumnRole::ItemQuantity)?;
        }

        let plan = roles.plan()?;
        self.import_plan(&staged, &plan)
    }

    /// Sends the mapped rows, then reloads the store so lists and counts
    /// reflect what the server created.
    pub fn import_plan(&self, staged: &StagedCsv, plan: &ImportPlan) -> Result<ImportSummary> {
        let items = staged.map_rows(plan);
        let imported = items.len();
        let payload = import_payload(items);

        self.api
            .import_items(self.store_id(), &payload)
            .with_context(|| format!("failed to import items into store {}", self.store_id()))?;
        tracing::info!(store_id = self.store_id(), imported, "import posted");

        let session = self.load_session()?;
        Ok(ImportSummary { imported, session })
    }
}
