pub mod request_dto;
