// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite-backed key-value store.
//!
//! All access is serialized through `tokio-rusqlite`'s single background
//! thread. Do NOT open additional connections to the same file for writes.

use std::path::Path;

use async_trait::async_trait;
use rusqlite::OptionalExtension;
use tokio_rusqlite::Connection;
use tracing::{debug, info};

use tether_config::model::StorageConfig;
use tether_core::{KeyValueStore, TetherError};

/// Durable store over the `kv` table.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open the database named by `config`, creating parent directories.
    pub async fn from_config(config: &StorageConfig) -> Result<Self, TetherError> {
        Self::open(&config.database_path).await
    }

    /// Open (or create) the database at `path` and apply migrations.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, TetherError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| TetherError::Storage {
                        source: Box::new(e),
                    })?;
            }
        }

        let conn = Connection::open(path).await.map_err(map_tr_err)?;
        conn.call(|conn| -> Result<(), TetherError> {
            conn.execute_batch(
                "PRAGMA journal_mode = WAL;
                 PRAGMA synchronous = NORMAL;
                 PRAGMA busy_timeout = 5000;",
            )
            .map_err(|e| TetherError::Storage {
                source: Box::new(e),
            })?;
            crate::migrations::run_migrations(conn)
        })
        .await
        .map_err(map_tr_err)?;

        info!(path = %path.display(), "key-value store opened");
        Ok(Self { conn })
    }

    /// An in-memory SQLite database, migrated. Used by tests.
    pub async fn open_in_memory() -> Result<Self, TetherError> {
        let conn = Connection::open_in_memory().await.map_err(map_tr_err)?;
        conn.call(|conn| -> Result<(), TetherError> { crate::migrations::run_migrations(conn) })
            .await
            .map_err(map_tr_err)?;
        Ok(Self { conn })
    }

    /// Number of stored keys.
    pub async fn key_count(&self) -> Result<usize, TetherError> {
        self.conn
            .call(|conn| -> Result<usize, rusqlite::Error> {
                conn.query_row("SELECT COUNT(*) FROM kv", [], |row| row.get::<_, i64>(0))
                    .map(|n| n as usize)
            })
            .await
            .map_err(map_tr_err)
    }
}

/// Flatten a `tokio-rusqlite` error into a storage error.
fn map_tr_err<E: std::fmt::Display>(e: E) -> TetherError {
    TetherError::Storage {
        source: e.to_string().into(),
    }
}

#[async_trait]
impl KeyValueStore for SqliteStore {
    async fn get(&self, key: &str) -> Result<Option<String>, TetherError> {
        let key = key.to_string();
        self.conn
            .call(move |conn| -> Result<Option<String>, rusqlite::Error> {
                conn.query_row("SELECT value FROM kv WHERE key = ?1", [&key], |row| {
                    row.get(0)
                })
                .optional()
            })
            .await
            .map_err(map_tr_err)
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), TetherError> {
        let key = key.to_string();
        let value = value.to_string();
        debug!(key = %key, "kv set");
        self.conn
            .call(move |conn| -> Result<(), rusqlite::Error> {
                conn.execute(
                    "INSERT INTO kv (key, value) VALUES (?1, ?2)
                     ON CONFLICT(key) DO UPDATE SET
                         value = excluded.value,
                         updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
                    [&key, &value],
                )?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }

    async fn remove(&self, key: &str) -> Result<(), TetherError> {
        let key = key.to_string();
        debug!(key = %key, "kv remove");
        self.conn
            .call(move |conn| -> Result<(), rusqlite::Error> {
                conn.execute("DELETE FROM kv WHERE key = ?1", [&key])?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }
}
