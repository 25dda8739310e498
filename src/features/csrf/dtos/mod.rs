mod csrf_dto;

pub use csrf_dto::CsrfTokenDto;
