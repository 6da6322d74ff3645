#![forbid(unsafe_code)]

pub mod auth;
pub mod progress_store;
pub mod repository;
pub mod sqlite;

pub use auth::AuthorizationGate;
pub use progress_store::ProgressStore;
pub use repository::{InMemoryKeyValueStore, KeyValueStore, Storage, StorageError, StorageKeys};
