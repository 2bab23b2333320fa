use anyhow::{Context, Result};
use stocktake_core::cache::CacheState;
use stocktake_core::counting::first_incomplete_list;
use stocktake_core::model::Amount;
use thiserror::Error;

use crate::App;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CountError {
    #[error("no item named '{0}' in this store")]
    UnknownItem(String),
    #[error("no list named '{0}' in this store")]
    UnknownList(String),
    #[error("list '{0}' is not a Count list")]
    NotCountList(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CountResult {
    pub item: String,
    pub list: String,
    pub amount: Amount,
    pub created: bool,
    /// The list already held this amount, so nothing was sent.
    pub unchanged: bool,
}

impl<'a> App<'a> {
    /// Records one amount by item and list name, outside the counter.
    pub fn count_by_name(&self, item: &str, list: &str, amount: &str) -> Result<CountResult> {
        let amount = Amount::parse_input(amount)?;
        let mut snapshot = self.fetch_snapshot()?;

        let item_index = snapshot
            .items
            .iter()
            .position(|candidate| candidate.name.trim() == item.trim())
            .ok_or_else(|| CountError::UnknownItem(item.to_string()))?;
        let list_index = snapshot
            .lists
            .iter()
            .position(|candidate| candidate.name.trim() == list.trim())
            .ok_or_else(|| CountError::UnknownList(list.to_string()))?;

        let target = &snapshot.lists[list_index];
        if !target.kind.is_count() {
            return Err(CountError::NotCountList(target.name.clone()).into());
        }
        let list_id = target.id;
        let item_id = snapshot.items[item_index].id;

        let unchanged = snapshot.items[item_index].amount_for(list_id) == Some(amount);
        let created = if unchanged {
            tracing::info!(item_id, list_id, "amount unchanged, nothing to send");
            false
        } else {
            let created = self
                .api
                .create_list_item(list_id, item_id, amount)
                .with_context(|| format!("failed to record amount for '{}'", item.trim()))?
                .created;
            let inserted = snapshot.items[item_index].upsert_amount(list_id, amount);
            if created && inserted {
                snapshot.lists[list_index].count += 1;
            }
            created
        };

        let list_cursor = first_incomplete_list(&snapshot.lists, snapshot.items.len());
        let state = CacheState::new(self.store_id(), &snapshot, list_cursor, item_index);
        if let Err(error) = self.cache().store(&state) {
            tracing::warn!(
                store_id = self.store_id(),
                error = %error,
                "failed to update local cache"
            );
        }

        Ok(CountResult {
            item: snapshot.items[item_index].name.clone(),
            list: snapshot.lists[list_index].name.clone(),
            amount,
            created,
            unchanged,
        })
    }
}
