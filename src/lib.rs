// keystore - key/value store persisted as a single JSON file

pub mod config;
pub mod entry;
pub mod error;
pub mod jsonfile;
pub mod store;

// Re-export main types for convenience
pub use config::Config;
pub use entry::{Entry, TypeTag, classify};
pub use error::{Result, StoreError};
pub use jsonfile::Access;
pub use store::Store;
