pub mod csrf_handler;

pub use csrf_handler::{__path_get_csrf_token, get_csrf_token};
