use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Token exchange or repository listing failed; the run aborts with
    /// nothing to back up.
    #[error(transparent)]
    Catalog(#[from] repovault_bitbucket::Error),

    #[error("Failed to prepare working directory: {0}")]
    Workspace(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
