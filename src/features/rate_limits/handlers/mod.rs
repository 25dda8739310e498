pub mod rate_limit_handler;

pub use rate_limit_handler::{__path_get_rate_limit_status, get_rate_limit_status};
