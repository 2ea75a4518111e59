pub mod converter;
pub mod schema_cache;
pub mod schema_registry;
