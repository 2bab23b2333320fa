use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::csv_import::ImportListEntry;
use crate::model::{Amount, ItemId, ItemsSnapshot, ListId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CreateListItemResponse {
    #[serde(default)]
    pub created: bool,
}

/// Whatever the server replied to an import; only logged.
pub type ImportAck = serde_json::Value;

#[derive(Debug, Clone, Serialize)]
pub(crate) struct CreateListItemBody {
    pub amount: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("request to {url} failed: {message}")]
    Network { url: String, message: String },
    #[error("server rejected request to {url}: {message}")]
    Server {
        url: String,
        status: Option<u16>,
        message: String,
    },
    #[error("unexpected response from {url}: {message}")]
    Decode { url: String, message: String },
}

impl ApiError {
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network { .. })
    }
}

/// Store backend used by the counter and by the import/export commands.
pub trait StocklistApi: Send + Sync {
    fn fetch_items(&self, store_id: u64) -> Result<ItemsSnapshot, ApiError>;

    fn create_list_item(
        &self,
        list_id: ListId,
        item_id: ItemId,
        amount: Amount,
    ) -> Result<CreateListItemResponse, ApiError>;

    fn import_items(
        &self,
        store_id: u64,
        payload: &[ImportListEntry],
    ) -> Result<ImportAck, ApiError>;
}

/// Pulls the message out of an `{error}` / `{validation_error}` envelope.
pub fn error_envelope(body: &serde_json::Value) -> Option<String> {
    let object = body.as_object()?;
    ["error", "validation_error"].iter().find_map(|key| {
        object.get(*key).map(|value| match value {
            serde_json::Value::String(message) => message.clone(),
            other => other.to_string(),
        })
    })
}
