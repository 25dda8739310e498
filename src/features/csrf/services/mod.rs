mod csrf_service;

pub use csrf_service::CsrfService;
