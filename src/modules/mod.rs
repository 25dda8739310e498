//! Modules layer - Infrastructure components
//!
//! Contains the in-memory record store and the local disk storage for uploads.

pub mod memstore;
pub mod storage;
