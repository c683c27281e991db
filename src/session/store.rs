//! Durable session store over SQLite.
//!
//! One row per scope key, holding the session document as JSON. The store is
//! read before every inbound event and written back by the handler that
//! mutated it, so the load-mutate-save cycle around one event is the unit of
//! atomicity.

use super::types::SessionData;
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use tokio::sync::Mutex;

/// Errors from the session store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("session database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("session document error: {0}")]
    Document(#[from] serde_json::Error),
}

/// Durable scope-key → session-document mapping.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Load the session for a scope key; a fresh empty session if none exists.
    async fn load(&self, scope_key: &str) -> Result<SessionData, StoreError>;

    /// Persist the session for a scope key.
    async fn save(&self, scope_key: &str, data: &SessionData) -> Result<(), StoreError>;
}

/// SQLite-backed store. A single connection behind a mutex is plenty here:
/// the dispatcher processes one event at a time.
pub struct SqliteSessionStore {
    conn: Mutex<Connection>,
}

impl SqliteSessionStore {
    /// Open (or create) the store at `path`.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                let _ = std::fs::create_dir_all(parent);
            }
        }
        let conn = Connection::open(path)?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// In-memory store, used by tests.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn init_schema(conn: &Connection) -> Result<(), StoreError> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS sessions (
                scope_key  TEXT PRIMARY KEY,
                data       TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            );",
        )?;
        Ok(())
    }
}

#[async_trait]
impl SessionStore for SqliteSessionStore {
    async fn load(&self, scope_key: &str) -> Result<SessionData, StoreError> {
        let conn = self.conn.lock().await;
        let row: Option<String> = conn
            .query_row(
                "SELECT data FROM sessions WHERE scope_key = ?1",
                params![scope_key],
                |row| row.get(0),
            )
            .optional()?;

        match row {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => {
                tracing::debug!("No session for scope {scope_key}, starting fresh");
                Ok(SessionData::default())
            }
        }
    }

    async fn save(&self, scope_key: &str, data: &SessionData) -> Result<(), StoreError> {
        let json = serde_json::to_string(data)?;
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO sessions (scope_key, data, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(scope_key) DO UPDATE SET data = excluded.data,
                                                  updated_at = excluded.updated_at",
            params![scope_key, json, Utc::now().timestamp()],
        )?;
        tracing::debug!("Saved session for scope {scope_key} ({} bytes)", json.len());
        Ok(())
    }
}
