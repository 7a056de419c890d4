pub mod analysis_dto;
pub mod collection_dto;
pub mod snapshot_dto;
