use crate::error::AppError;
use crate::quota::{DailyUsageCounter, UsageStore};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use tracing::{info, warn};

pub async fn init_db(db_url: &str) -> Result<SqlitePool, sqlx::Error> {
    info!("Initializing database at: {}", db_url);

    let options = SqliteConnectOptions::from_str(db_url)?.create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    migrate(&pool).await?;

    info!("Database initialized and migrations applied.");

    Ok(pool)
}

pub async fn migrate(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS usage_records (
            key TEXT PRIMARY KEY,
            record TEXT NOT NULL,
            updated_at INTEGER NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}

/// Usage records stored as JSON text keyed by name, mirroring a browser local-storage entry.
#[derive(Clone)]
pub struct SqliteUsageStore {
    pool: SqlitePool,
}

impl SqliteUsageStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn raw_record(&self, key: &str) -> Result<Option<String>, AppError> {
        let row: Option<(String,)> = sqlx::query_as("SELECT record FROM usage_records WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|(record,)| record))
    }

    pub async fn put_raw_record(&self, key: &str, record: &str) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO usage_records (key, record, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET record = excluded.record, updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(record)
        .bind(Utc::now().timestamp())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl UsageStore for SqliteUsageStore {
    async fn get(&self, key: &str) -> Result<Option<DailyUsageCounter>, AppError> {
        let Some(raw) = self.raw_record(key).await? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(record) => Ok(Some(record)),
            Err(e) => {
                // A corrupt record is treated as missing and gets overwritten.
                warn!(key, error = %e, "Discarding unreadable usage record");
                Ok(None)
            }
        }
    }

    async fn set(&self, key: &str, record: &DailyUsageCounter) -> Result<(), AppError> {
        let raw = serde_json::to_string(record)?;
        self.put_raw_record(key, &raw).await
    }
}
