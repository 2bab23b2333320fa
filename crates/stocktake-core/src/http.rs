use std::sync::Arc;

use reqwest::Url;
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::REFERER;
use serde::de::DeserializeOwned;

use crate::api::{
    ApiError, CreateListItemBody, CreateListItemResponse, ImportAck, StocklistApi, error_envelope,
};
use crate::config::ServerConfig;
use crate::cookie::{CSRF_COOKIE, CSRF_HEADER, cookie_value};
use crate::csv_import::ImportListEntry;
use crate::model::{Amount, ItemId, ItemsSnapshot, ListId};

/// `StocklistApi` over HTTP. Clones share the connection pool and the
/// cookie store.
#[derive(Debug, Clone)]
pub struct HttpStocklistApi {
    client: Client,
    jar: Arc<Jar>,
    server: ServerConfig,
}

impl HttpStocklistApi {
    pub fn new(server: ServerConfig) -> Result<Self, ApiError> {
        let jar = Arc::new(Jar::default());
        let client = Client::builder()
            .cookie_provider(Arc::clone(&jar))
            .build()
            .map_err(|error| ApiError::Network {
                url: server.base_url.clone(),
                message: error.to_string(),
            })?;

        Ok(Self {
            client,
            jar,
            server,
        })
    }

    /// Loads the store page so the server hands out a CSRF cookie.
    pub fn prime(&self, store_id: u64) -> Result<(), ApiError> {
        let url = self.server.url(&format!("store/{store_id}"));
        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|error| network_error(&url, error))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Server {
                url,
                status: Some(status.as_u16()),
                message: status.to_string(),
            });
        }

        tracing::debug!(store_id, has_token = self.csrf_token().is_some(), "primed session");
        Ok(())
    }

    pub fn csrf_token(&self) -> Option<String> {
        let base = Url::parse(&self.server.base_url).ok()?;
        let header = self.jar.cookies(&base)?;
        cookie_value(header.to_str().ok()?, CSRF_COOKIE)
    }

    fn mutating(&self, builder: RequestBuilder) -> RequestBuilder {
        let builder = builder.header(REFERER, self.server.base_url.as_str());
        match self.csrf_token() {
            Some(token) => builder.header(CSRF_HEADER, token),
            None => {
                tracing::warn!("no csrf token available for request");
                builder
            }
        }
    }

    fn send<T: DeserializeOwned>(&self, url: &str, builder: RequestBuilder) -> Result<T, ApiError> {
        let response = builder.send().map_err(|error| network_error(url, error))?;
        let status = response.status();
        let body = response.text().map_err(|error| network_error(url, error))?;
        let value = serde_json::from_str::<serde_json::Value>(&body).ok();

        if let Some(message) = value.as_ref().and_then(error_envelope) {
            return Err(ApiError::Server {
                url: url.to_string(),
                status: Some(status.as_u16()),
                message,
            });
        }
        if !status.is_success() {
            return Err(ApiError::Server {
                url: url.to_string(),
                status: Some(status.as_u16()),
                message: status.to_string(),
            });
        }

        let Some(value) = value else {
            return Err(ApiError::Decode {
                url: url.to_string(),
                message: "response body is not JSON".to_string(),
            });
        };
        serde_json::from_value(value).map_err(|error| ApiError::Decode {
            url: url.to_string(),
            message: error.to_string(),
        })
    }
}

impl StocklistApi for HttpStocklistApi {
    fn fetch_items(&self, store_id: u64) -> Result<ItemsSnapshot, ApiError> {
        if self.csrf_token().is_none() {
            self.prime(store_id)?;
        }

        let url = self.server.url(&format!("items/{store_id}"));
        let snapshot: ItemsSnapshot = self.send(&url, self.client.get(&url))?;
        tracing::info!(
            store_id,
            items = snapshot.items.len(),
            lists = snapshot.lists.len(),
            "fetched items"
        );
        Ok(snapshot)
    }

    fn create_list_item(
        &self,
        list_id: ListId,
        item_id: ItemId,
        amount: Amount,
    ) -> Result<CreateListItemResponse, ApiError> {
        let url = self
            .server
            .url(&format!("create_list_item/{list_id}/{item_id}"));
        let request = self
            .mutating(self.client.post(&url))
            .json(&CreateListItemBody { amount });

        let response: CreateListItemResponse = self.send(&url, request)?;
        tracing::debug!(
            list_id,
            item_id,
            created = response.created,
            "recorded amount"
        );
        Ok(response)
    }

    fn import_items(
        &self,
        store_id: u64,
        payload: &[ImportListEntry],
    ) -> Result<ImportAck, ApiError> {
        if self.csrf_token().is_none() {
            self.prime(store_id)?;
        }

        let url = self.server.url(&format!("import_items/{store_id}"));
        let request = self.mutating(self.client.post(&url)).json(payload);
        let ack: ImportAck = self.send(&url, request)?;
        tracing::info!(store_id, response = %ack, "import acknowledged");
        Ok(ack)
    }
}

fn network_error(url: &str, error: reqwest::Error) -> ApiError {
    tracing::warn!(url, error = %error, "request failed");
    ApiError::Network {
        url: url.to_string(),
        message: error.to_string(),
    }
}
