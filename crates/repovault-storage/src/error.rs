use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Upload failed: {0}")]
    Upload(String),

    #[error("Inventory listing failed: {0}")]
    List(String),

    #[error("Delete failed: {0}")]
    Delete(String),
}

pub type Result<T> = std::result::Result<T, Error>;
