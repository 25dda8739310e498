//! In-memory store for users, tool usage and file records
//!
//! Replaces a database for this service: one `MemStore` is built at startup
//! and shared with every feature service.

mod clock;
mod models;
mod store;

#[cfg(test)]
pub use clock::ManualClock;
pub use clock::{Clock, SystemClock};
pub use models::{NewToolUsage, NewUser, NewUserFile, ToolUsage, ToolUsageStats, User, UserFile};
pub use store::MemStore;
