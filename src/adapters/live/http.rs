//! Live snapshot store backed by the game's REST API.

use std::marker::PhantomData;

use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use super::json_file::JsonFileStore;
use crate::error::StoreError;
use crate::ports::snapshot_store::{SnapshotStore, StoreFuture};

/// Loads documents with `GET <url>` and saves them with `PUT <url>`.
///
/// Requests carry the session JWT as a bearer token when one is
/// configured. Every document that crosses the wire is mirrored into an
/// optional local cache file, which is what [`SnapshotStore::cached`] reads.
pub struct HttpStore<T> {
    client: Client,
    url: String,
    token: Option<String>,
    cache: Option<JsonFileStore<T>>,
    _document: PhantomData<fn() -> T>,
}

impl<T> HttpStore<T> {
    /// Creates a store for the document at `url`.
    pub fn new(url: impl Into<String>, token: Option<String>) -> Self {
        Self { client: Client::new(), url: url.into(), token, cache: None, _document: PhantomData }
    }

    /// Mirrors remote reads and writes into a local JSON cache.
    #[must_use]
    pub fn with_cache(mut self, cache: JsonFileStore<T>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Endpoint URL for this document.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

impl<T: Serialize> HttpStore<T> {
    async fn mirror(&self, value: &T) {
        if let Some(cache) = &self.cache {
            if let Err(e) = cache.write(value).await {
                warn!(path = %cache.path().display(), error = %e, "failed to update local cache");
            }
        }
    }
}

impl<T> SnapshotStore<T> for HttpStore<T>
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    fn cached(&self) -> Option<T> {
        self.cache.as_ref().and_then(JsonFileStore::read_sync)
    }

    fn hydrate(&self) -> StoreFuture<'_, Option<T>> {
        Box::pin(async move {
            let response = self.authorize(self.client.get(&self.url)).send().await?;
            let status = response.status();
            if status == StatusCode::NOT_FOUND {
                debug!(url = %self.url, "remote store has no document yet");
                return Ok(None);
            }
            let body = response.text().await?;
            if !status.is_success() {
                return Err(StoreError::Status { status: status.as_u16(), body });
            }
            let value: T = serde_json::from_str(&body)?;
            self.mirror(&value).await;
            Ok(Some(value))
        })
    }

    fn persist(&self, value: &T) -> StoreFuture<'_, ()> {
        let encoded = serde_json::to_value(value);
        let mirrored = serde_json::to_string_pretty(value);
        Box::pin(async move {
            let body = encoded?;
            let response = self.authorize(self.client.put(&self.url)).json(&body).send().await?;
            let status = response.status();
            if !status.is_success() {
                let text = response.text().await.unwrap_or_default();
                return Err(StoreError::Status { status: status.as_u16(), body: text });
            }
            if let (Some(cache), Ok(json)) = (&self.cache, mirrored) {
                if let Err(e) = super::json_file::write_atomically(cache.path(), json).await {
                    warn!(path = %cache.path().display(), error = %e, "failed to update local cache");
                }
            }
            Ok(())
        })
    }
}
