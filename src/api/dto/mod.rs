//! Request/response DTOs for the REST surface.

pub mod tag_dto;

pub use tag_dto::{TagListResponse, TagRecordDto, TagUpsertResponse, UpsertTagRequest};
