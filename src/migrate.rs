use anyhow::Result;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::db;

pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    create_items_table(&pool, &config.table.name).await?;
    pool.close().await;
    Ok(())
}

/// Create the items table and its index. Idempotent.
///
/// `table` must already be validated as an identifier.
pub async fn create_items_table(pool: &SqlitePool, table: &str) -> Result<()> {
    sqlx::query(&format!(
        r#"
        CREATE TABLE IF NOT EXISTS {table} (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            category TEXT NOT NULL DEFAULT '',
            description TEXT NOT NULL,
            location TEXT NOT NULL,
            phone_number TEXT NOT NULL,
            image_url TEXT NOT NULL,
            user_id TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'FOUND',
            created_at INTEGER NOT NULL
        )
        "#
    ))
    .execute(pool)
    .await?;

    sqlx::query(&format!(
        "CREATE INDEX IF NOT EXISTS idx_{table}_created_at ON {table}(created_at DESC)"
    ))
    .execute(pool)
    .await?;

    Ok(())
}
