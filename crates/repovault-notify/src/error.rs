use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Webhook request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Webhook rejected the report with status {0}")]
    Rejected(u16),
}

pub type Result<T> = std::result::Result<T, Error>;
