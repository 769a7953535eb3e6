//! SQLite table store.
//!
//! Stores records in a local SQLite database created by `trackback init`.
//! Ids are UUID v4 strings; `created_at` is a Unix timestamp used to order
//! recent listings.

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::config::{is_identifier, Config};
use crate::db;
use crate::models::Record;
use crate::traits::TableStore;

/// A stored record and when it was inserted.
#[derive(Debug, Clone)]
pub struct StoredRecord {
    pub record: Record,
    pub created_at: i64,
}

pub struct SqliteTableStore {
    pool: SqlitePool,
}

impl SqliteTableStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn connect(config: &Config) -> Result<Self> {
        Ok(Self::new(db::connect(config).await?))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Most recently inserted records first.
    pub async fn recent(&self, table: &str, limit: i64) -> Result<Vec<StoredRecord>> {
        check_table(table)?;
        let rows = sqlx::query(&format!(
            "SELECT id, name, category, description, location, phone_number, image_url, user_id, status, created_at \
             FROM {} ORDER BY created_at DESC, rowid DESC LIMIT ?",
            table
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| StoredRecord {
                record: Record {
                    id: row.get("id"),
                    name: row.get("name"),
                    category: row.get("category"),
                    description: row.get("description"),
                    location: row.get("location"),
                    phone_number: row.get("phone_number"),
                    image_url: row.get("image_url"),
                    user_id: row.get("user_id"),
                    status: row.get("status"),
                },
                created_at: row.get("created_at"),
            })
            .collect())
    }
}

#[async_trait]
impl TableStore for SqliteTableStore {
    async fn insert(&self, table: &str, record: &Record) -> Result<String> {
        check_table(table)?;
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().timestamp();

        sqlx::query(&format!(
            "INSERT INTO {} (id, name, category, description, location, phone_number, image_url, user_id, status, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            table
        ))
        .bind(&id)
        .bind(&record.name)
        .bind(&record.category)
        .bind(&record.description)
        .bind(&record.location)
        .bind(&record.phone_number)
        .bind(&record.image_url)
        .bind(&record.user_id)
        .bind(&record.status)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(id)
    }
}

fn check_table(table: &str) -> Result<()> {
    if !is_identifier(table) {
        bail!("invalid table name: '{}'", table);
    }
    Ok(())
}
