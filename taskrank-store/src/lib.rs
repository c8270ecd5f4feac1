//! taskrank-store: comma-terminated task/roster logs with single-generation backups

pub mod records;
pub mod store;

pub use store::{LogStore, Snapshot, StoreConfig, backup_path};
