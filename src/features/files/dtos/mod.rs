mod file_dto;

pub use file_dto::{
    RawUploadQuery, UploadFileDto, UploadResponseDto, UserFileResponseDto,
};
