use game::GameError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CheckError {
    #[error("game request failed: {0}")]
    Game(#[from] GameError),

    #[error("another purchase holds the action lock")]
    LockHeld,

    #[error("purchase amount must be positive")]
    EmptyPurchase,
}
