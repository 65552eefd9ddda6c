pub mod fetch_service;
pub mod indicator_service;
pub mod merge_service;
