// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the Tether client core.
//!
//! Every section rejects unknown keys. Files are looked up in `/etc`, the
//! user config dir and the working directory, then `TETHER_*` variables
//! override them.
//!
//! ```no_run
//! match tether_config::load_and_validate() {
//!     Ok(config) => println!("backend at {}", config.backend.base_url),
//!     Err(errors) => tether_config::render_errors(&errors),
//! }
//! ```

use std::path::{Path, PathBuf};

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

pub use diagnostic::{render_errors, ConfigError};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::TetherConfig;

/// Loads from the XDG hierarchy plus `TETHER_*` env vars, then validates.
///
/// Returns every problem found: figment errors as diagnostics with source
/// spans and suggestions, or all failed semantic checks.
pub fn load_and_validate() -> Result<TetherConfig, Vec<ConfigError>> {
    checked(loader::load_config(), || collect_toml_sources(None))
}

/// Like [`load_and_validate`] but reads `path` instead of the hierarchy.
/// Env overrides still apply.
pub fn load_and_validate_path(path: &Path) -> Result<TetherConfig, Vec<ConfigError>> {
    checked(loader::load_config_from_path(path), || {
        collect_toml_sources(Some(path))
    })
}

/// Validates a TOML string with no files and no env involved.
pub fn load_and_validate_str(toml_content: &str) -> Result<TetherConfig, Vec<ConfigError>> {
    checked(loader::load_config_from_str(toml_content), || {
        vec![("<inline>".to_string(), toml_content.to_string())]
    })
}

/// Sources are only read back when there is an error to point into.
fn checked(
    loaded: Result<TetherConfig, figment::Error>,
    sources: impl FnOnce() -> Vec<(String, String)>,
) -> Result<TetherConfig, Vec<ConfigError>> {
    let config = loaded.map_err(|err| diagnostic::figment_to_config_errors(err, &sources()))?;
    validation::validate_config(&config)?;
    Ok(config)
}

/// Contents of the candidate TOML files, keyed by display path.
fn collect_toml_sources(explicit: Option<&Path>) -> Vec<(String, String)> {
    let mut candidates = Vec::new();
    match explicit {
        Some(path) => candidates.push(path.to_path_buf()),
        None => {
            if let Ok(dir) = std::env::current_dir() {
                candidates.push(dir.join("tether.toml"));
            }
            if let Some(config_dir) = dirs::config_dir() {
                candidates.push(config_dir.join("tether/tether.toml"));
            }
            candidates.push(PathBuf::from("/etc/tether/tether.toml"));
        }
    }

    candidates
        .into_iter()
        .filter_map(|path| {
            std::fs::read_to_string(&path)
                .ok()
                .map(|content| (path.display().to_string(), content))
        })
        .collect()
}
