//! Weft Lattice Topology
//!
//! Toroidal 2-D grid geometry for the pulse-lattice engine.
//!
//! # Coordinate Model
//!
//! Cells are identified by a linear index in `[0, width * height)`. The
//! [`Torus`] converts between indices and `(x, y)` coordinates with both axes
//! wrapping modulo the grid extent, so every cell has a full neighborhood and
//! there are no edge effects.
//!
//! # Neighborhoods
//!
//! A [`Neighborhood`] precomputes the `(dx, dy)` offset table for a square
//! neighborhood of configured radius, excluding the center: `(2r+1)² − 1`
//! offsets in a deterministic row-major order. The table is immutable after
//! construction and shared read-only by every consumer; changing the radius
//! or grid dimensions means building a fresh `Torus`/`Neighborhood` pair (and
//! resetting all dependent state).
//!
//! # Validation
//!
//! Construction rejects empty grids and radii large enough for the
//! neighborhood to wrap onto itself (`2r ≥ min(width, height)`). After
//! construction no operation can fail: all coordinates wrap.

mod torus;
mod neighborhood;

pub use torus::Torus;
pub use neighborhood::{Neighborhood, Offset};

use thiserror::Error;

/// Errors detected while constructing lattice geometry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TopologyError {
    /// One or both grid dimensions are zero.
    #[error("lattice dimensions must be positive, got {width}x{height}")]
    EmptyLattice {
        /// Requested width.
        width: usize,
        /// Requested height.
        height: usize,
    },

    /// The neighborhood radius is zero (no neighbors at all).
    #[error("neighborhood radius must be at least 1")]
    ZeroRadius,

    /// The neighborhood would wrap onto itself on this grid.
    #[error("radius {radius} wraps onto itself on a {width}x{height} lattice")]
    RadiusWraps {
        /// Requested radius.
        radius: usize,
        /// Grid width.
        width: usize,
        /// Grid height.
        height: usize,
    },
}
