/// Database model definitions.
pub mod models;
/// Player registration and score persistence.
pub mod player_store;
/// Storage abstraction layer for database operations.
pub mod storage;
