//! Firestore REST store.
//!
//! Talks to `{documents_url}/{collection}/{id}` with the typed-value JSON
//! encoding of the Firestore v1 API. `PATCH` without an update mask replaces
//! the whole document, which is the create-or-overwrite the cache relies on.

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use url::Url;
use uvmap_core::error::ReqwestErrorExt;

use super::{CacheStore, StoreError, StoreResult};
use crate::record::{ReadingRecord, StoredReading};

const PAGE_SIZE: u32 = 300;

#[derive(Debug, Deserialize)]
struct Document {
    name: String,
    #[serde(default)]
    fields: HashMap<String, Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    #[serde(default)]
    documents: Vec<Document>,
    next_page_token: Option<String>,
}

/// Firestore-backed reading store.
#[derive(Debug, Clone)]
pub struct FirestoreCacheStore {
    client: Arc<Client>,
    documents_url: Url,
    collection: String,
    api_key: Option<String>,
}

fn transport(err: reqwest::Error) -> StoreError {
    StoreError::unavailable(err.into_network_error().to_string())
}

impl FirestoreCacheStore {
    /// `documents_url` is the REST root ending in `/documents`.
    pub fn new(
        documents_url: &str,
        collection: impl Into<String>,
        api_key: Option<String>,
    ) -> StoreResult<Self> {
        let client = Client::builder()
            .user_agent(concat!("uvmap/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(transport)?;

        let documents_url = Url::parse(documents_url)
            .map_err(|e| StoreError::unavailable(format!("Invalid Firestore URL: {}", e)))?;
        if documents_url.cannot_be_a_base() {
            return Err(StoreError::unavailable("Firestore URL cannot be a base"));
        }

        Ok(Self {
            client: Arc::new(client),
            documents_url,
            collection: collection.into(),
            api_key,
        })
    }

    fn url_for(&self, id: Option<&str>) -> Url {
        let mut url = self.documents_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(&self.collection);
            if let Some(id) = id {
                segments.push(id);
            }
        }
        if let Some(key) = &self.api_key {
            url.query_pairs_mut().append_pair("key", key);
        }
        url
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.client.request(method, url)
    }

    async fn check(response: Response) -> StoreResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(StoreError::unavailable(format!(
            "Firestore returned {}: {}",
            status,
            body.trim()
        )))
    }

    async fn list_page(&self, page_token: Option<&str>) -> StoreResult<ListResponse> {
        let mut url = self.url_for(None);
        url.query_pairs_mut()
            .append_pair("pageSize", &PAGE_SIZE.to_string());
        if let Some(token) = page_token {
            url.query_pairs_mut().append_pair("pageToken", token);
        }

        let response = self
            .request(Method::GET, url)
            .send()
            .await
            .map_err(transport)?;
        let response = Self::check(response).await?;
        response
            .json::<ListResponse>()
            .await
            .map_err(|e| StoreError::codec(e.to_string()))
    }
}

#[async_trait]
impl CacheStore for FirestoreCacheStore {
    async fn get(&self, key: &str) -> StoreResult<Option<ReadingRecord>> {
        let response = self
            .request(Method::GET, self.url_for(Some(key)))
            .send()
            .await
            .map_err(transport)?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let document: Document = Self::check(response)
            .await?
            .json()
            .await
            .map_err(|e| StoreError::codec(e.to_string()))?;

        decode_fields(&document.fields).map(Some)
    }

    async fn put(&self, key: &str, record: &ReadingRecord) -> StoreResult<()> {
        let body = json!({ "fields": encode_fields(record) });
        let response = self
            .request(Method::PATCH, self.url_for(Some(key)))
            .json(&body)
            .send()
            .await
            .map_err(transport)?;
        Self::check(response).await?;
        tracing::debug!("Stored document {}/{}", self.collection, key);
        Ok(())
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        let response = self
            .request(Method::DELETE, self.url_for(Some(key)))
            .send()
            .await
            .map_err(transport)?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }
        Self::check(response).await?;
        Ok(())
    }

    async fn list_all(&self) -> StoreResult<Vec<StoredReading>> {
        let mut readings = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let page = self.list_page(page_token.as_deref()).await?;
            for document in page.documents {
                let id = document_id(&document.name);
                match decode_fields(&document.fields) {
                    Ok(record) => readings.push(StoredReading { id, record }),
                    Err(e) => tracing::warn!("Skipping unreadable document {}: {}", id, e),
                }
            }

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(readings)
    }
}

/// Last path segment of a document resource name.
fn document_id(name: &str) -> String {
    name.rsplit('/').next().unwrap_or(name).to_string()
}

fn encode_fields(record: &ReadingRecord) -> Map<String, Value> {
    let mut fields = Map::new();
    fields.insert("uv".into(), json!({ "doubleValue": record.uv }));
    fields.insert(
        "timestamp".into(),
        json!({ "integerValue": record.captured_at_ms.to_string() }),
    );
    fields.insert(
        "dateString".into(),
        json!({ "stringValue": record.date_string }),
    );
    fields.insert("lat".into(), json!({ "doubleValue": record.lat }));
    fields.insert("lng".into(), json!({ "doubleValue": record.lng }));
    if let Some(comment) = &record.comment {
        fields.insert("comment".into(), json!({ "stringValue": comment }));
    }
    fields
}

/// Numbers written from JavaScript land as `integerValue` when integral, so
/// both encodings are accepted. `integerValue` is a string on the wire.
fn number(fields: &HashMap<String, Value>, name: &str) -> StoreResult<f64> {
    let value = fields
        .get(name)
        .ok_or_else(|| StoreError::codec(format!("missing field `{}`", name)))?;

    if let Some(v) = value.get("doubleValue").and_then(Value::as_f64) {
        return Ok(v);
    }
    match value.get("integerValue") {
        Some(Value::String(s)) => s
            .parse::<i64>()
            .map(|v| v as f64)
            .map_err(|e| StoreError::codec(format!("field `{}`: {}", name, e))),
        Some(Value::Number(n)) => n
            .as_f64()
            .ok_or_else(|| StoreError::codec(format!("field `{}` out of range", name))),
        _ => Err(StoreError::codec(format!("field `{}` is not a number", name))),
    }
}

fn string(fields: &HashMap<String, Value>, name: &str) -> Option<String> {
    fields
        .get(name)
        .and_then(|v| v.get("stringValue"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn decode_fields(fields: &HashMap<String, Value>) -> StoreResult<ReadingRecord> {
    Ok(ReadingRecord {
        uv: number(fields, "uv")?,
        captured_at_ms: number(fields, "timestamp")? as i64,
        date_string: string(fields, "dateString").unwrap_or_default(),
        lat: number(fields, "lat")?,
        lng: number(fields, "lng")?,
        comment: string(fields, "comment"),
    })
}
