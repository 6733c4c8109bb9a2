// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedded database migrations using refinery.
//!
//! SQL files under `migrations/` are compiled into the binary via
//! `embed_migrations!` and applied when the store opens.

use tether_core::TetherError;

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations");
}

/// Run all pending migrations against the given connection.
pub fn run_migrations(conn: &mut rusqlite::Connection) -> Result<(), TetherError> {
    embedded::migrations::runner()
        .run(conn)
        .map_err(|e| TetherError::Storage {
            source: Box::new(e),
        })?;
    Ok(())
}
