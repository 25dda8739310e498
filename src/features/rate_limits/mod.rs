pub mod dtos;
pub mod handlers;
pub mod identity;
pub mod routes;
pub mod services;

pub use identity::ClientIdentity;
pub use routes::routes;
pub use services::{RateLimitDecision, RateLimitService};
