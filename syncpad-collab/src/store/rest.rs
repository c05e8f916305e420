//! REST + websocket client for the hosted document store.
//!
//! Wire contract (PostgREST-style rows plus a realtime feed):
//!
//! - `GET    {rest}/documents?id=eq.{id}&select=*` → `[Document]`
//! - `POST   {rest}/documents` with a full row
//! - `PATCH  {rest}/documents?id=eq.{id}` with a partial field set
//! - `DELETE {rest}/documents?id=eq.{id}`
//! - `WS     {realtime}/documents/{id}` → JSON [`DocumentChange`] frames,
//!   one per committed update, delivered in commit order
//!
//! Every HTTP request carries the project `apikey` header and a bearer
//! token: the user's access token when present, the API key otherwise.

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Method;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use uuid::Uuid;

use syncpad_core::{Document, DocumentChange, DocumentId, DocumentPatch};

use super::{ChangeFeed, DocumentStore, StoreError};
use crate::config::StoreConfig;

/// Hosted store backend.
pub struct RestStore {
    http: reqwest::Client,
    config: StoreConfig,
}

impl RestStore {
    pub fn new(config: StoreConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    fn rows_url(&self) -> String {
        format!("{}/documents", self.config.rest_url.trim_end_matches('/'))
    }

    fn feed_url(&self, id: &DocumentId) -> String {
        format!(
            "{}/documents/{}",
            self.config.realtime_url.trim_end_matches('/'),
            id
        )
    }

    fn bearer(&self) -> &str {
        self.config
            .access_token
            .as_deref()
            .unwrap_or(&self.config.api_key)
    }

    fn request(&self, method: Method, url: String) -> reqwest::RequestBuilder {
        self.http
            .request(method, url)
            .header("apikey", &self.config.api_key)
            .bearer_auth(self.bearer())
    }
}

#[async_trait]
impl DocumentStore for RestStore {
    async fn fetch(&self, id: &DocumentId) -> Result<Document, StoreError> {
        let url = format!("{}?id=eq.{}&select=*", self.rows_url(), id);
        let rows: Vec<Document> = self
            .request(Method::GET, url)
            .send()
            .await
            .map_err(|e| StoreError::ReadFailed(e.to_string()))?
            .error_for_status()
            .map_err(|e| StoreError::ReadFailed(e.to_string()))?
            .json()
            .await
            .map_err(|e| StoreError::ReadFailed(e.to_string()))?;

        rows.into_iter()
            .next()
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    async fn create(&self, doc: &Document) -> Result<(), StoreError> {
        self.request(Method::POST, self.rows_url())
            .header("prefer", "return=minimal")
            .json(doc)
            .send()
            .await
            .map_err(|e| StoreError::WriteFailed(e.to_string()))?
            .error_for_status()
            .map_err(|e| StoreError::WriteFailed(e.to_string()))?;
        Ok(())
    }

    async fn update(&self, id: &DocumentId, patch: DocumentPatch) -> Result<(), StoreError> {
        if patch.is_empty() {
            return Ok(());
        }
        let url = format!("{}?id=eq.{}", self.rows_url(), id);
        self.request(Method::PATCH, url)
            .header("prefer", "return=minimal")
            .json(&patch)
            .send()
            .await
            .map_err(|e| StoreError::WriteFailed(e.to_string()))?
            .error_for_status()
            .map_err(|e| StoreError::WriteFailed(e.to_string()))?;
        Ok(())
    }

    async fn delete(&self, id: &DocumentId) -> Result<(), StoreError> {
        let url = format!("{}?id=eq.{}", self.rows_url(), id);
        self.request(Method::DELETE, url)
            .send()
            .await
            .map_err(|e| StoreError::WriteFailed(e.to_string()))?
            .error_for_status()
            .map_err(|e| StoreError::WriteFailed(e.to_string()))?;
        Ok(())
    }

    async fn list_owned(&self, owner_id: Uuid) -> Result<Vec<Document>, StoreError> {
        let url = format!(
            "{}?user_id=eq.{}&select=*&order=created_at.desc",
            self.rows_url(),
            owner_id
        );
        self.request(Method::GET, url)
            .send()
            .await
            .map_err(|e| StoreError::ReadFailed(e.to_string()))?
            .error_for_status()
            .map_err(|e| StoreError::ReadFailed(e.to_string()))?
            .json()
            .await
            .map_err(|e| StoreError::ReadFailed(e.to_string()))
    }

    async fn subscribe(&self, id: &DocumentId) -> Result<ChangeFeed, StoreError> {
        let url = self.feed_url(id);
        let (ws, _) = tokio_tungstenite::connect_async(&url)
            .await
            .map_err(|e| StoreError::SubscribeFailed(e.to_string()))?;
        log::debug!("change feed connected for {id}");

        let (_write, mut read) = ws.split();
        let (tx, rx) = mpsc::channel(64);
        let id = id.clone();

        // Reader task: decode JSON frames into the feed channel.
        let pump = tokio::spawn(async move {
            while let Some(msg) = read.next().await {
                match msg {
                    Ok(Message::Text(text)) => {
                        match serde_json::from_str::<DocumentChange>(text.as_str()) {
                            Ok(change) => {
                                if tx.send(change).await.is_err() {
                                    break;
                                }
                            }
                            Err(e) => log::warn!("undecodable feed frame for {id}: {e}"),
                        }
                    }
                    Ok(Message::Close(_)) => break,
                    Err(e) => {
                        log::warn!("change feed for {id} lost: {e}");
                        break;
                    }
                    _ => {}
                }
            }
            log::debug!("change feed for {id} ended");
        });

        Ok(ChangeFeed::new(rx, Some(pump)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(token: Option<&str>) -> RestStore {
        let mut config = StoreConfig::new("https://h/rest/v1/", "wss://h/realtime/v1/", "anon");
        if let Some(t) = token {
            config = config.with_access_token(t);
        }
        RestStore::new(config)
    }

    #[test]
    fn test_rows_url_trims_trailing_slash() {
        assert_eq!(store(None).rows_url(), "https://h/rest/v1/documents");
    }

    #[test]
    fn test_feed_url_embeds_document_id() {
        let id = DocumentId::from("abc12345");
        assert_eq!(
            store(None).feed_url(&id),
            "wss://h/realtime/v1/documents/abc12345"
        );
    }

    #[test]
    fn test_bearer_falls_back_to_api_key() {
        assert_eq!(store(None).bearer(), "anon");
        assert_eq!(store(Some("jwt")).bearer(), "jwt");
    }
}
