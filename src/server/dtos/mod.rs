pub mod health_dto;
pub mod portal_dto;
pub mod stalker_dto;
