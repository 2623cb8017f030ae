pub mod image_normalizer;
pub mod listing_service;
pub mod storage;
pub mod upload_service;
