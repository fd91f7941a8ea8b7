use super::http::{insert_header, normalize_endpoint, HttpClient, RetryPolicy};
use super::wire::{decode_rows, document_rows, row_id};
use super::{DeleteOutcome, RemoteStore, StoreSemantics};
use crate::error::{RideboardError, Result};
use crate::model::Entry;
use async_trait::async_trait;
use reqwest::header::HeaderMap;
use serde_json::{json, Value};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::instrument;

/// Whole-document store: the board is one JSON bin, read as
/// `{"record": {"entries": [...]}}` and replaced with `PUT {"entries": [...]}`.
///
/// Every write is a read-modify-write of the full document. Rows are rewritten as the
/// raw JSON that was read, so rows from other clients survive even when this client
/// cannot decode them. A create that fails
/// halfway leaves the caller unsure whether it landed. The repository re-lists after
/// a failed create against this store.
pub struct BinStore {
    http: HttpClient,
    bin_url: String,
    write_lock: Mutex<()>,
}

impl BinStore {
    pub fn new(
        endpoint: &str,
        bin_id: &str,
        api_key: Option<&str>,
        timeout: Duration,
        retry: RetryPolicy,
    ) -> Result<Self> {
        let endpoint = normalize_endpoint(endpoint)?;
        let bin_id = bin_id.trim();
        if bin_id.is_empty() {
            return Err(RideboardError::Config("bin store needs a bin_id".to_string()));
        }

        let mut headers = HeaderMap::new();
        if let Some(key) = api_key.filter(|k| !k.is_empty()) {
            insert_header(&mut headers, "x-access-key", key)?;
        }

        Ok(Self {
            http: HttpClient::new(timeout, headers, retry)?,
            bin_url: format!("{}/{}", endpoint, bin_id),
            write_lock: Mutex::new(()),
        })
    }

    async fn fetch(&self) -> Result<Vec<Value>> {
        let reply = self.http.get(&format!("{}/latest", self.bin_url)).await?;
        document_rows(reply.status.as_u16(), reply.body)
    }

    async fn replace(&self, rows: &[Value]) -> Result<()> {
        self.http
            .put(&self.bin_url, &json!({ "entries": rows }))
            .await?;
        Ok(())
    }
}

#[async_trait]
impl RemoteStore for BinStore {
    fn tag(&self) -> &'static str {
        "bin"
    }

    fn semantics(&self) -> StoreSemantics {
        StoreSemantics::AppendOnly
    }

    #[instrument(name = "bin_list", skip(self))]
    async fn list(&self) -> Result<Vec<Entry>> {
        Ok(decode_rows(self.fetch().await?))
    }

    #[instrument(name = "bin_create", skip(self, entry), fields(id = %entry.id))]
    async fn create(&self, entry: &Entry) -> Result<Entry> {
        let _guard = self.write_lock.lock().await;
        let mut rows = self.fetch().await?;
        if rows.iter().any(|row| row_id(row).as_deref() == Some(entry.id.as_str())) {
            // Already landed on an earlier attempt.
            return Ok(entry.clone());
        }
        rows.insert(0, serde_json::to_value(entry)?);
        self.replace(&rows).await?;
        Ok(entry.clone())
    }

    #[instrument(name = "bin_delete", skip(self))]
    async fn delete(&self, id: &str) -> Result<DeleteOutcome> {
        let _guard = self.write_lock.lock().await;
        let mut rows = self.fetch().await?;
        let before = rows.len();
        rows.retain(|row| row_id(row).as_deref() != Some(id));
        if rows.len() == before {
            return Ok(DeleteOutcome::NotFound);
        }
        self.replace(&rows).await?;
        Ok(DeleteOutcome::Deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requires_bin_id() {
        let result = BinStore::new(
            "https://bins.example.test/v3/b",
            "  ",
            None,
            Duration::from_secs(1),
            RetryPolicy::default(),
        );
        assert!(matches!(result, Err(RideboardError::Config(_))));
    }

    #[test]
    fn bin_url_joins_endpoint_and_id() {
        let store = BinStore::new(
            "https://bins.example.test/v3/b/",
            "abc123",
            Some("key"),
            Duration::from_secs(1),
            RetryPolicy::default(),
        )
        .unwrap();
        assert_eq!(store.bin_url, "https://bins.example.test/v3/b/abc123");
        assert_eq!(store.semantics(), StoreSemantics::AppendOnly);
    }
}
