pub mod store;
pub mod types;

pub use store::{SessionStore, SqliteSessionStore, StoreError};
pub use types::SessionData;
