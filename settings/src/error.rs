use thiserror::Error;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("failed to load settings for account {account_id}: {reason}")]
    Load { account_id: String, reason: String },

    #[error("failed to persist settings for account {account_id}: {reason}")]
    Persist { account_id: String, reason: String },

    #[error("failed to serialize settings: {0}")]
    Serialize(#[from] serde_json::Error),
}
