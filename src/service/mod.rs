//! Service layer: tag name enrichment over the persistence gateway.

pub mod tag_service;

pub use tag_service::TagService;
