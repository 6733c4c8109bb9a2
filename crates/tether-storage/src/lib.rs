// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Key-value store implementations for the Tether client core.
//!
//! [`SqliteStore`] is the durable store used on device: WAL-mode SQLite with
//! an embedded migration, all access serialized through `tokio-rusqlite`'s
//! background thread. [`MemoryStore`] is a process-local store for tests and
//! simulation.

pub mod memory;
pub mod migrations;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
