use std::collections::VecDeque;
use std::sync::Mutex;

use stocktake_core::api::{
    ApiError, CreateListItemResponse, ImportAck, StocklistApi,
};
use stocktake_core::config::{ServerConfig, StocktakeConfig, StoreConfig};
use stocktake_core::csv_import::ImportListEntry;
use stocktake_core::model::{
    Amount, Item, ItemId, ItemsSnapshot, List, ListId, ListItemRef, ListKind,
};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Fetch(u64),
    Create {
        list_id: ListId,
        item_id: ItemId,
        amount: Amount,
    },
    Import(u64, Vec<ImportListEntry>),
}

#[derive(Default)]
pub struct QueueApi {
    fetches: Mutex<VecDeque<Result<ItemsSnapshot, ApiError>>>,
    creates: Mutex<VecDeque<Result<CreateListItemResponse, ApiError>>>,
    imports: Mutex<VecDeque<Result<ImportAck, ApiError>>>,
    calls: Mutex<Vec<Call>>,
}

impl QueueApi {
    pub fn with_fetches(fetches: Vec<Result<ItemsSnapshot, ApiError>>) -> Self {
        let api = Self::default();
        *api.fetches.lock().expect("fetches lock") = fetches.into();
        api
    }

    pub fn push_create(&self, result: Result<CreateListItemResponse, ApiError>) {
        self.creates.lock().expect("creates lock").push_back(result);
    }

    pub fn push_import(&self, result: Result<ImportAck, ApiError>) {
        self.imports.lock().expect("imports lock").push_back(result);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().expect("calls lock").clone()
    }
}

impl StocklistApi for QueueApi {
    fn fetch_items(&self, store_id: u64) -> Result<ItemsSnapshot, ApiError> {
        self.calls.lock().expect("calls lock").push(Call::Fetch(store_id));
        self.fetches
            .lock()
            .expect("fetches lock")
            .pop_front()
            .unwrap_or_else(|| Err(missing()))
    }

    fn create_list_item(
        &self,
        list_id: ListId,
        item_id: ItemId,
        amount: Amount,
    ) -> Result<CreateListItemResponse, ApiError> {
        self.calls.lock().expect("calls lock").push(Call::Create {
            list_id,
            item_id,
            amount,
        });
        self.creates
            .lock()
            .expect("creates lock")
            .pop_front()
            .unwrap_or_else(|| Err(missing()))
    }

    fn import_items(
        &self,
        store_id: u64,
        payload: &[ImportListEntry],
    ) -> Result<ImportAck, ApiError> {
        self.calls
            .lock()
            .expect("calls lock")
            .push(Call::Import(store_id, payload.to_vec()));
        self.imports
            .lock()
            .expect("imports lock")
            .pop_front()
            .unwrap_or_else(|| Err(missing()))
    }
}

fn missing() -> ApiError {
    ApiError::Decode {
        url: "fake://".to_string(),
        message: "missing scripted response".to_string(),
    }
}

pub fn config() -> StocktakeConfig {
    StocktakeConfig {
        version: 1,
        server: ServerConfig {
            base_url: "http://127.0.0.1:8000".to_string(),
        },
        store: StoreConfig {
            id: 3,
            title: "Main Store".to_string(),
        },
    }
}

pub fn snapshot() -> ItemsSnapshot {
    ItemsSnapshot {
        items: vec![
            Item {
                id: 1,
                name: "Milk ".to_string(),
                list_items: vec![ListItemRef {
                    list_id: 10,
                    amount: Amount::new(4.0),
                }],
            },
            Item {
                id: 2,
                name: "Bread ".to_string(),
                list_items: vec![ListItemRef {
                    list_id: 10,
                    amount: Amount::new(2.0),
                }],
            },
        ],
        lists: vec![
            List {
                id: 10,
                name: "Import".to_string(),
                kind: ListKind::Addition,
                count: 2,
            },
            List {
                id: 20,
                name: "Start".to_string(),
                kind: ListKind::Count,
                count: 0,
            },
            List {
                id: 30,
                name: "End".to_string(),
                kind: ListKind::Count,
                count: 0,
            },
        ],
    }
}
