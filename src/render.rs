//! Renderer contract.
//!
//! The engine never assumes a specific rendering technology; it paints
//! through this narrow trait and lets the host decide what a [`Material`]
//! looks like. Occupancy and build-height queries live on the same seam
//! because the engine reads the world through the surface it paints on.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::RenderError;
use crate::region::BlockPos;

/// Result type alias for renderer operations.
pub type Result<T> = std::result::Result<T, RenderError>;

/// A named block material, e.g. `"LIME_WOOL"`.
///
/// Materials are opaque to the engine; only the renderer interprets them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Material(pub String);

impl Material {
    /// Creates a material from a name.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the material name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Material {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Material {
    fn from(name: &str) -> Self {
        Self(name.to_owned())
    }
}

/// Rendering surface for war flags, beacons, and the countdown display.
///
/// Implementations are expected to be fast and synchronous; the engine calls
/// them from timer callbacks on the scheduler lane. Failures are reported
/// through [`RenderError`] and the engine logs and continues — a broken
/// renderer must never block registry or timer cleanup.
pub trait Renderer: Send + Sync {
    /// Sets the block at `pos` to `material`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the write.
    fn paint(&self, pos: &BlockPos, material: &Material) -> Result<()>;

    /// Restores the block at `pos` to an unoccupied state.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the write.
    fn clear(&self, pos: &BlockPos) -> Result<()>;

    /// Returns `true` if the block at `pos` is currently unoccupied.
    ///
    /// The beacon is only drawn into empty space so it never overwrites
    /// existing structures.
    fn is_empty(&self, pos: &BlockPos) -> bool;

    /// Returns the maximum build height of the named world.
    fn max_build_height(&self, world: &str) -> i32;

    /// Shows a floating countdown anchored near `pos` with the given
    /// initial text.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot create the display.
    fn show_countdown(&self, pos: &BlockPos, text: &str) -> Result<()>;

    /// Updates the countdown text shown by a prior
    /// [`show_countdown`](Self::show_countdown) at `pos`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the update.
    fn update_countdown(&self, pos: &BlockPos, text: &str) -> Result<()>;

    /// Deletes the countdown display at `pos`, if one exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the deletion.
    fn delete_countdown(&self, pos: &BlockPos) -> Result<()>;
}

/// Renderer that accepts everything and draws nothing.
///
/// Useful for headless operation and as a default collaborator in tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn paint(&self, _pos: &BlockPos, _material: &Material) -> Result<()> {
        Ok(())
    }

    fn clear(&self, _pos: &BlockPos) -> Result<()> {
        Ok(())
    }

    fn is_empty(&self, _pos: &BlockPos) -> bool {
        true
    }

    fn max_build_height(&self, _world: &str) -> i32 {
        320
    }

    fn show_countdown(&self, _pos: &BlockPos, _text: &str) -> Result<()> {
        Ok(())
    }

    fn update_countdown(&self, _pos: &BlockPos, _text: &str) -> Result<()> {
        Ok(())
    }

    fn delete_countdown(&self, _pos: &BlockPos) -> Result<()> {
        Ok(())
    }
}
