use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Repository listing error: {0}")]
    Listing(String),
}

pub type Result<T> = std::result::Result<T, Error>;
