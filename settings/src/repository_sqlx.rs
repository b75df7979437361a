use std::sync::Arc;

use anyhow::{Context, anyhow};
use async_trait::async_trait;
use common::time::now_ms;
use sqlx::{AnyPool, Row};

use crate::repository::SettingsRepository;

/// SQLx-backed implementation of SettingsRepository.
/// Responsible only for persistence; the document is stored as JSON text.
pub struct SqlxSettingsRepository {
    pool: Arc<AnyPool>,
}

impl SqlxSettingsRepository {
    pub fn new(pool: Arc<AnyPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SettingsRepository for SqlxSettingsRepository {
    async fn load(&self, account_id: &str) -> anyhow::Result<Option<String>> {
        let row = sqlx::query(
            r#"
SELECT document
FROM settings
WHERE account_id = ?;
"#,
        )
        .bind(account_id.to_string())
        .fetch_optional(self.pool.as_ref())
        .await
        .context("settings select failed")?;

        Ok(row.map(|r| r.get::<String, _>("document")))
    }

    async fn persist(&self, account_id: &str, version: u64, document: &str) -> anyhow::Result<()> {
        sqlx::query(
            r#"
INSERT INTO settings (account_id, version, document, updated_ms)
VALUES (?, ?, ?, ?)
ON CONFLICT(account_id) DO UPDATE SET
  version = excluded.version,
  document = excluded.document,
  updated_ms = excluded.updated_ms;
"#,
        )
        .bind(account_id.to_string())
        .bind(u64_to_i64(version)?)
        .bind(document.to_string())
        .bind(u64_to_i64(now_ms())?)
        .execute(self.pool.as_ref())
        .await
        .context("settings upsert failed")?;

        Ok(())
    }
}

fn u64_to_i64(v: u64) -> anyhow::Result<i64> {
    if v > i64::MAX as u64 {
        return Err(anyhow!("u64 too large for i64: {v}"));
    }
    Ok(v as i64)
}
