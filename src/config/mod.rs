pub mod schema;

pub use schema::{Config, StorageConfig, TelegramConfig};
