//! Stores.
//!
//! The [`MemoryStore`] keeps values in memory and is useful for tests and scratch arrays.
//! The [`FilesystemStore`] maps each key onto a file below a base directory.

mod filesystem_store;
mod memory_store;

pub use filesystem_store::{FilesystemStore, FilesystemStoreCreateError};
pub use memory_store::MemoryStore;
