use super::http::{insert_bearer, insert_header, normalize_endpoint, HttpClient, RetryPolicy};
use super::wire::{decode_created, decode_listing, entry_payload, row_payload};
use super::{DeleteOutcome, RemoteStore, StoreSemantics};
use crate::error::{RideboardError, Result};
use crate::model::Entry;
use async_trait::async_trait;
use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::instrument;

/// Wire flavor of a hosted collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// Realtime-database style: `{collection}.json`, entries keyed by push id.
    Keyed,
    /// REST-over-SQL style: array of rows, delete by `?id=eq.{id}` filter.
    Rows,
}

/// Hosted document store with full read/write of individual entries.
pub struct DocumentStore {
    http: HttpClient,
    endpoint: String,
    collection: String,
    dialect: Dialect,
}

impl DocumentStore {
    pub fn new(
        endpoint: &str,
        collection: &str,
        dialect: Dialect,
        api_key: Option<&str>,
        timeout: Duration,
        retry: RetryPolicy,
    ) -> Result<Self> {
        let endpoint = normalize_endpoint(endpoint)?;
        let collection = collection.trim().trim_matches('/').to_string();
        if collection.is_empty() {
            return Err(RideboardError::Config(
                "document store needs a collection name".to_string(),
            ));
        }

        let mut headers = HeaderMap::new();
        if let Some(key) = api_key.filter(|k| !k.is_empty()) {
            if dialect == Dialect::Rows {
                insert_header(&mut headers, "apikey", key)?;
            }
            insert_bearer(&mut headers, key)?;
        }

        Ok(Self {
            http: HttpClient::new(timeout, headers, retry)?,
            endpoint,
            collection,
            dialect,
        })
    }

    fn collection_url(&self) -> String {
        match self.dialect {
            Dialect::Keyed => format!("{}/{}.json", self.endpoint, self.collection),
            Dialect::Rows => format!("{}/{}", self.endpoint, self.collection),
        }
    }

    fn entry_url(&self, id: &str) -> String {
        match self.dialect {
            Dialect::Keyed => format!("{}/{}/{}.json", self.endpoint, self.collection, id),
            Dialect::Rows => format!("{}/{}?id=eq.{}", self.endpoint, self.collection, id),
        }
    }
}

#[async_trait]
impl RemoteStore for DocumentStore {
    fn tag(&self) -> &'static str {
        match self.dialect {
            Dialect::Keyed => "document-keyed",
            Dialect::Rows => "document-rows",
        }
    }

    fn semantics(&self) -> StoreSemantics {
        StoreSemantics::FullReadWrite
    }

    #[instrument(name = "document_list", skip(self), fields(collection = %self.collection))]
    async fn list(&self) -> Result<Vec<Entry>> {
        let reply = self.http.get(&self.collection_url()).await?;
        decode_listing(reply.status.as_u16(), reply.body)
    }

    #[instrument(name = "document_create", skip(self, entry), fields(collection = %self.collection))]
    async fn create(&self, entry: &Entry) -> Result<Entry> {
        let mut extra = HeaderMap::new();
        let payload = match self.dialect {
            Dialect::Keyed => entry_payload(entry)?,
            Dialect::Rows => {
                insert_header(&mut extra, "prefer", "return=representation")?;
                row_payload(entry)?
            }
        };
        let reply = self
            .http
            .post(&self.collection_url(), &payload, extra)
            .await?;
        // An empty acknowledgment keeps the client id.
        Ok(decode_created(reply.body, entry).unwrap_or_else(|| entry.clone()))
    }

    #[instrument(name = "document_delete", skip(self), fields(collection = %self.collection))]
    async fn delete(&self, id: &str) -> Result<DeleteOutcome> {
        match self.http.delete(&self.entry_url(id)).await {
            Ok(_) => Ok(DeleteOutcome::Deleted),
            Err(RideboardError::RemoteRejected { status: 404, .. }) => Ok(DeleteOutcome::NotFound),
            Err(e) => Err(e),
        }
    }
}
