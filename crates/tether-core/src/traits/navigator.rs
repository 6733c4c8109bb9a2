// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! UI navigator handle trait.

use serde_json::Value;

use crate::error::TetherError;
use crate::types::Route;

/// Handle to the UI screen stack.
pub trait Navigator: Send + Sync + 'static {
    /// Whether the screen stack is mounted and accepts dispatches.
    fn is_ready(&self) -> bool;

    /// Pushes `route` with `params`.
    fn navigate(&self, route: &Route, params: &Value) -> Result<(), TetherError>;

    /// Pops the current screen.
    fn go_back(&self) -> Result<(), TetherError>;

    /// Replaces the whole stack with `route`.
    fn reset(&self, route: &Route, params: &Value) -> Result<(), TetherError>;
}
