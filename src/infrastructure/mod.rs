//! Infrastructure layer - external adapters (database, filesystem).
//!
//! This layer handles all I/O operations and external dependencies.

pub mod config;
pub mod sqlite_store;
pub mod store_paths;

pub use config::{load_config, load_config_from_file};
pub use sqlite_store::SqliteMessageStore;
pub use store_paths::resolve_store_database;
