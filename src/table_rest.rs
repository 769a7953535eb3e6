//! PostgREST table store.
//!
//! Inserts records with `POST <url>/rest/v1/<table>`, the REST surface that
//! Supabase and plain PostgREST deployments expose for Postgres tables.
//!
//! # Configuration
//!
//! ```toml
//! [table]
//! backend = "rest"
//! name = "items"
//! url = "https://<project>.supabase.co"
//! ```
//!
//! The API key is read from `TRACKBACK_TABLE_API_KEY` and sent both as the
//! `apikey` header and as a bearer token.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use std::time::Duration;

use crate::config::{is_identifier, TableConfig};
use crate::models::Record;
use crate::traits::TableStore;

pub struct RestTableStore {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl RestTableStore {
    /// Create a store from `[table]`.
    ///
    /// # Errors
    ///
    /// Returns an error if `table.url` is not set or
    /// `TRACKBACK_TABLE_API_KEY` is not in the environment.
    pub fn new(config: &TableConfig) -> Result<Self> {
        let api_key = std::env::var("TRACKBACK_TABLE_API_KEY")
            .context("TRACKBACK_TABLE_API_KEY environment variable not set")?;
        let base_url = config
            .url
            .clone()
            .ok_or_else(|| anyhow::anyhow!("table.url required for rest backend"))?;
        Self::with_api_key(&base_url, api_key, config.timeout_secs)
    }

    pub fn with_api_key(base_url: &str, api_key: String, timeout_secs: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }
}

#[async_trait]
impl TableStore for RestTableStore {
    async fn insert(&self, table: &str, record: &Record) -> Result<String> {
        if !is_identifier(table) {
            bail!("invalid table name: '{}'", table);
        }

        let resp = self
            .client
            .post(self.table_url(table))
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Prefer", "return=representation")
            .json(record)
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to insert into {}: {}", table, e))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            bail!(
                "Insert into {} failed (HTTP {}): {}",
                table,
                status,
                body.chars().take(500).collect::<String>()
            );
        }

        let json: serde_json::Value = resp.json().await?;
        parse_inserted_id(&json)
    }
}

/// Extract the assigned id from a `return=representation` response.
///
/// PostgREST returns the inserted rows as an array; ids may be text (UUID) or
/// integer (identity column).
fn parse_inserted_id(json: &serde_json::Value) -> Result<String> {
    let row = match json {
        serde_json::Value::Array(rows) => rows.first(),
        other => Some(other),
    };
    match row.and_then(|r| r.get("id")) {
        Some(serde_json::Value::String(id)) => Ok(id.clone()),
        Some(serde_json::Value::Number(id)) => Ok(id.to_string()),
        _ => bail!("Insert response did not include an id"),
    }
}
