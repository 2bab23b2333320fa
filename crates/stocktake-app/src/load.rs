use anyhow::{Context, Result};
use stocktake_core::counting::CountingSession;
use stocktake_core::items_table::ItemsTable;
use stocktake_core::model::ItemsSnapshot;

use crate::App;

impl<'a> App<'a> {
    pub fn fetch_snapshot(&self) -> Result<ItemsSnapshot> {
        self.api
            .fetch_items(self.store_id())
            .with_context(|| format!("failed to load items for store {}", self.store_id()))
    }

    /// Fetches the store and opens a counting session. `None` means the
    /// store has nothing to count yet and needs an import first. A cache
    /// left over from earlier contents is dropped then.
    pub fn load_session(&self) -> Result<Option<CountingSession>> {
        let snapshot = self.fetch_snapshot()?;
        if snapshot.is_empty() || snapshot.lists.is_empty() {
            tracing::info!(store_id = self.store_id(), "store has nothing to count");
            if let Err(error) = self.cache().clear() {
                tracing::warn!(
                    store_id = self.store_id(),
                    error = %error,
                    "failed to clear local cache"
                );
            }
            return Ok(None);
        }

        let session = CountingSession::new(snapshot)?;
        self.mirror(&session);
        Ok(Some(session))
    }

    /// Best-effort copy of the session into the local cache.
    pub fn mirror(&self, session: &CountingSession) {
        let cache = self.cache();
        if let Err(error) = cache.store(&session.cache_state(self.store_id())) {
            tracing::warn!(
                store_id = self.store_id(),
                error = %error,
                "failed to update local cache"
            );
        }
    }

    pub fn items_table(&self) -> Result<ItemsTable> {
        let snapshot = self.fetch_snapshot()?;
        Ok(ItemsTable::build(&snapshot.items, &snapshot.lists, None))
    }
}
