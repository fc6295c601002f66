//! # formcraft-persistence
//!
//! Keeps in-progress field values alive according to each form's
//! persistence mode.
//!
//! ## Modules
//!
//! - [`backend`] - The `StorageBackend` trait with in-memory and file implementations
//! - [`manager`] - `PersistenceManager`: load, save, clear, and expiry handling

pub mod backend;
pub mod manager;

pub use backend::{FileStorage, InMemoryStorage, StorageBackend, StorageSession};
pub use manager::{storage_key, PermanentEntry, PersistenceManager};
