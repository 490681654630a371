/// Database model definitions.
pub mod models;
/// Game and review persistence backends.
pub mod record_store;
/// Storage abstraction layer for database operations.
pub mod storage;
