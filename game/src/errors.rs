use thiserror::Error;

#[derive(Error, Debug)]
pub enum GameError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("game rejected {endpoint}: {message}")]
    Api {
        endpoint: &'static str,
        message: String,
    },

    #[error("invalid response from game: {0}")]
    InvalidResponse(String),
}
