//! PostgREST (Supabase) binding for the remote store
//!
//! Tables are addressed as `{url}/rest/v1/{table}`; the project's anon key is
//! sent both as `apikey` and as a bearer token. Error bodies are classified
//! by their PostgREST / Postgres error code, never by message wording.

use super::{Filter, Order, RemoteStore, Row, StoreError};
use async_trait::async_trait;
use rdc_common::config::ResolvedStore;
use reqwest::{Method, RequestBuilder};
use serde::Deserialize;
use std::time::Duration;

const USER_AGENT: &str = concat!("rdc-catalog/", env!("CARGO_PKG_VERSION"));

/// Postgres `undefined_column`
const PG_UNDEFINED_COLUMN: &str = "42703";
/// PostgREST "column not found in schema cache"
const PGRST_COLUMN_NOT_FOUND: &str = "PGRST204";

/// Error body returned by PostgREST
#[derive(Debug, Deserialize)]
struct PostgrestErrorBody {
    code: Option<String>,
    message: Option<String>,
    details: Option<String>,
    hint: Option<String>,
}

/// Remote store client speaking the PostgREST dialect
pub struct PostgrestStore {
    http_client: reqwest::Client,
    base_url: String,
    anon_key: String,
}

impl PostgrestStore {
    pub fn new(url: &str, anon_key: &str, timeout: Duration) -> Result<Self, StoreError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| StoreError::unavailable(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
        })
    }

    pub fn from_config(store: &ResolvedStore) -> Result<Self, StoreError> {
        Self::new(&store.url, &store.anon_key, store.timeout)
    }

    fn request(&self, method: Method, table: &str) -> RequestBuilder {
        let url = format!("{}/rest/v1/{}", self.base_url, table);
        self.http_client
            .request(method, url)
            .header("apikey", &self.anon_key)
            .bearer_auth(&self.anon_key)
    }

    /// Send a request and decode a JSON array of rows (empty body → no rows)
    async fn send_rows(&self, request: RequestBuilder) -> Result<Vec<Row>, StoreError> {
        let response = request
            .send()
            .await
            .map_err(|e| StoreError::unavailable(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| StoreError::unavailable(e.to_string()))?;

        if !status.is_success() {
            return Err(classify(status.as_u16(), &body));
        }

        if body.trim().is_empty() {
            return Ok(Vec::new());
        }

        serde_json::from_str(&body).map_err(|e| StoreError::decode(e.to_string()))
    }
}

/// Query string pairs for filters and ordering
fn query_params(filters: &[Filter], order: Option<&Order>) -> Vec<(String, String)> {
    let mut params: Vec<(String, String)> = filters
        .iter()
        .map(|f| (f.column.clone(), format!("eq.{}", f.value)))
        .collect();

    if let Some(order) = order {
        let direction = if order.ascending { "asc" } else { "desc" };
        params.push(("order".to_string(), format!("{}.{}", order.column, direction)));
    }

    params
}

/// Map an error response onto a typed [`StoreError`]
pub fn classify(status: u16, body: &str) -> StoreError {
    let parsed: Option<PostgrestErrorBody> = serde_json::from_str(body).ok();

    let (code, message) = match parsed {
        Some(err) => {
            let mut message = err.message.unwrap_or_else(|| body.to_string());
            if let Some(details) = err.details.filter(|d| !d.is_empty()) {
                message = format!("{} ({})", message, details);
            }
            if let Some(hint) = err.hint.filter(|h| !h.is_empty()) {
                message = format!("{} [hint: {}]", message, hint);
            }
            (err.code, message)
        }
        None if body.trim().is_empty() => (None, format!("HTTP {}", status)),
        None => (None, body.to_string()),
    };

    match code.as_deref() {
        Some(PG_UNDEFINED_COLUMN) | Some(PGRST_COLUMN_NOT_FOUND) => {
            StoreError::missing_column(quoted_name(&message), message)
        }
        _ if status >= 500 => StoreError::unavailable(message),
        _ => StoreError::rejected(status, code, message),
    }
}

/// First identifier quoted with `'…'` or `"…"` in a diagnostic
fn quoted_name(message: &str) -> Option<String> {
    let start = message.find(['\'', '"'])?;
    let quote = message[start..].chars().next()?;
    let rest = &message[start + 1..];
    let end = rest.find(quote)?;
    let name = &rest[..end];
    (!name.is_empty()).then(|| name.to_string())
}

#[async_trait]
impl RemoteStore for PostgrestStore {
    async fn select(
        &self,
        table: &str,
        filters: &[Filter],
        order: Option<&Order>,
    ) -> Result<Vec<Row>, StoreError> {
        let mut params = vec![("select".to_string(), "*".to_string())];
        params.extend(query_params(filters, order));

        tracing::debug!(table = %table, filters = filters.len(), "PostgREST select");
        self.send_rows(self.request(Method::GET, table).query(&params))
            .await
    }

    async fn insert(&self, table: &str, rows: Vec<Row>) -> Result<Vec<Row>, StoreError> {
        tracing::debug!(table = %table, rows = rows.len(), "PostgREST insert");
        let request = self
            .request(Method::POST, table)
            .header("Prefer", "return=representation")
            .json(&rows);
        self.send_rows(request).await
    }

    async fn update(
        &self,
        table: &str,
        patch: Row,
        filters: &[Filter],
    ) -> Result<Vec<Row>, StoreError> {
        tracing::debug!(table = %table, fields = patch.len(), "PostgREST update");
        let request = self
            .request(Method::PATCH, table)
            .query(&query_params(filters, None))
            .header("Prefer", "return=representation")
            .json(&patch);
        self.send_rows(request).await
    }

    async fn delete(&self, table: &str, filters: &[Filter]) -> Result<(), StoreError> {
        tracing::debug!(table = %table, "PostgREST delete");
        let request = self
            .request(Method::DELETE, table)
            .query(&query_params(filters, None));
        self.send_rows(request).await.map(|_| ())
    }
}
