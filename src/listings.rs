//! Recent listings.
//!
//! Prints the latest found-item records from the SQLite table store. Used by
//! the `trackback list` command.

use anyhow::{bail, Result};

use crate::config::Config;
use crate::table_sqlite::{SqliteTableStore, StoredRecord};

pub const DEFAULT_LIMIT: i64 = 20;

/// Latest records, newest first.
pub async fn recent_listings(config: &Config, limit: Option<i64>) -> Result<Vec<StoredRecord>> {
    if config.table.backend != "sqlite" {
        bail!(
            "Listing requires the sqlite table backend (configured: '{}')",
            config.table.backend
        );
    }

    let limit = limit.unwrap_or(DEFAULT_LIMIT);
    if limit < 1 {
        bail!("limit must be >= 1");
    }

    let store = SqliteTableStore::connect(config).await?;
    let items = store.recent(&config.table.name, limit).await;
    store.pool().close().await;
    items
}

pub async fn run_list(config: &Config, limit: Option<i64>) -> Result<()> {
    let items = recent_listings(config, limit).await?;

    if items.is_empty() {
        println!("No listings.");
        return Ok(());
    }

    for (i, item) in items.iter().enumerate() {
        let record = &item.record;
        let date = chrono::DateTime::from_timestamp(item.created_at, 0)
            .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default();

        println!("{}. [{}] {}", i + 1, record.status, record.name);
        if !record.category.is_empty() {
            println!("    category: {}", record.category);
        }
        println!("    location: {}", record.location);
        println!("    contact: {}", record.phone_number);
        println!("    image: {}", record.image_url);
        println!("    posted: {}", date);
        println!("    id: {}", record.id);
        println!();
    }

    Ok(())
}
