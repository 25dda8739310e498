//! Storage module for uploaded file contents
//!
//! Provides a local-disk store for uploaded bytes. Metadata lives in the
//! in-memory store; this module only owns the bytes on disk.

mod local_storage;

pub use local_storage::LocalStorage;
