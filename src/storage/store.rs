//! Stores.
//!
//! - [`MemoryStore`]: an in-memory store.
//! - [`FilesystemStore`]: a store of files in a directory tree.

mod filesystem_store;
mod memory_store;

pub use filesystem_store::{FilesystemStore, FilesystemStoreCreateError};
pub use memory_store::MemoryStore;
