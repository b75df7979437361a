use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use parking_lot::Mutex;

use crate::repository::SettingsRepository;

/// Process-local repository. Nothing survives a restart; used by tests and
/// by dry runs that must not touch a database.
#[derive(Default)]
pub struct MemorySettingsRepository {
    docs: Mutex<HashMap<String, (u64, String)>>,
    writes: Mutex<u64>,
}

impl MemorySettingsRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a raw document, e.g. to simulate a corrupted row.
    pub fn with_document(account_id: &str, document: impl Into<String>) -> Self {
        let repo = Self::default();
        repo.docs
            .lock()
            .insert(account_id.to_string(), (0, document.into()));
        repo
    }

    pub fn document(&self, account_id: &str) -> Option<String> {
        self.docs.lock().get(account_id).map(|(_, d)| d.clone())
    }

    pub fn write_count(&self) -> u64 {
        *self.writes.lock()
    }
}

#[async_trait]
impl SettingsRepository for MemorySettingsRepository {
    async fn load(&self, account_id: &str) -> Result<Option<String>> {
        Ok(self.document(account_id))
    }

    async fn persist(&self, account_id: &str, version: u64, document: &str) -> Result<()> {
        self.docs
            .lock()
            .insert(account_id.to_string(), (version, document.to_string()));
        *self.writes.lock() += 1;
        Ok(())
    }
}
