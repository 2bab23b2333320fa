use std::collections::VecDeque;
use std::sync::Mutex;

use crate::api::{ApiError, CreateListItemResponse, ImportAck, StocklistApi};
use crate::csv_import::ImportListEntry;
use crate::model::{Amount, ItemId, ItemsSnapshot, ListId};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    FetchItems { store_id: u64 },
    CreateListItem {
        list_id: ListId,
        item_id: ItemId,
        amount: Amount,
    },
    ImportItems {
        store_id: u64,
        payload: Vec<ImportListEntry>,
    },
}

#[derive(Default)]
pub struct RecordingApi {
    fetches: Mutex<VecDeque<Result<ItemsSnapshot, ApiError>>>,
    creates: Mutex<VecDeque<Result<CreateListItemResponse, ApiError>>>,
    imports: Mutex<VecDeque<Result<ImportAck, ApiError>>>,
    calls: Mutex<Vec<Call>>,
}

impl RecordingApi {
    pub fn push_fetch(&self, result: Result<ItemsSnapshot, ApiError>) {
        self.fetches.lock().expect("fetches lock").push_back(result);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().expect("calls lock").clone()
    }
}

impl StocklistApi for RecordingApi {
    fn fetch_items(&self, store_id: u64) -> Result<ItemsSnapshot, ApiError> {
        self.calls
            .lock()
            .expect("calls lock")
            .push(Call::FetchItems { store_id });
        self.fetches
            .lock()
            .expect("fetches lock")
            .pop_front()
            .unwrap_or_else(|| Err(missing("fetch_items")))
    }

    fn create_list_item(
        &self,
        list_id: ListId,
        item_id: ItemId,
        amount: Amount,
    ) -> Result<CreateListItemResponse, ApiError> {
        self.calls
            .lock()
            .expect("calls lock")
            .push(Call::CreateListItem {
                list_id,
                item_id,
                amount,
            });
        self.creates
            .lock()
            .expect("creates lock")
            .pop_front()
            .unwrap_or_else(|| Err(missing("create_list_item")))
    }

    fn import_items(
        &self,
        store_id: u64,
        payload: &[ImportListEntry],
    ) -> Result<ImportAck, ApiError> {
        self.calls
            .lock()
            .expect("calls lock")
            .push(Call::ImportItems {
                store_id,
                payload: payload.to_vec(),
            });
        self.imports
            .lock()
            .expect("imports lock")
            .pop_front()
            .unwrap_or_else(|| Err(missing("import_items")))
    }
}

fn missing(method: &str) -> ApiError {
    ApiError::Decode {
        url: format!("fake://{method}"),
        message: "missing canned response".to_string(),
    }
}

pub fn network_failure() -> ApiError {
    ApiError::Network {
        url: "http://127.0.0.1:8000/items/3".to_string(),
        message: "connection refused".to_string(),
    }
}
