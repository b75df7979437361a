use anyhow::Result;
use async_trait::async_trait;

/// Durable storage for the raw settings document of each account.
///
/// The repository never interprets the document; coercion and defaults are
/// the store's job so a corrupted row can still be recovered field by field.
#[async_trait]
pub trait SettingsRepository: Send + Sync {
    async fn load(&self, account_id: &str) -> Result<Option<String>>;

    async fn persist(&self, account_id: &str, version: u64, document: &str) -> Result<()>;
}
