// Infrastructure layer - configuration, persistence records and profile stores
pub mod config;
pub mod json_store;
pub mod memory_store;
pub mod profile_record;
