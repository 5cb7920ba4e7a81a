pub mod client;
pub mod error;

// Re-exports
pub use client::BitbucketClient;
pub use error::{Error, Result};
