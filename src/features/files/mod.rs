pub mod dtos;
pub mod handlers;
pub mod range;
pub mod routes;
pub mod services;
pub mod validation;
pub mod workers;

pub use routes::routes;
pub use services::FileService;
pub use workers::FileSweeper;
