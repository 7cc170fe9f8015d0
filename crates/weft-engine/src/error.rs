//! Error types for weft-engine.

use thiserror::Error;
use weft_topology::TopologyError;

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building or reconfiguring an engine.
///
/// The hot update path never fails: every configuration that could make it
/// fail is rejected here, at construction or reconfiguration time.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid lattice geometry (empty grid, zero or wrapping radius).
    #[error("lattice geometry: {0}")]
    Topology(#[from] TopologyError),

    /// A step must perform at least one event.
    #[error("events per frame must be at least 1")]
    ZeroEvents,

    /// A probability or fraction parameter left the unit interval.
    #[error("{name} must lie in [0, 1], got {value}")]
    FractionOutOfRange {
        /// Name of the offending tuning field.
        name: &'static str,
        /// The rejected value.
        value: f32,
    },

    /// The knot influence region would wrap onto itself.
    #[error("knot radius {radius} wraps onto itself on a {width}x{height} lattice")]
    KnotRadiusWraps {
        /// Requested knot influence radius.
        radius: usize,
        /// Grid width.
        width: usize,
        /// Grid height.
        height: usize,
    },
}
