//! Precomputed square-neighborhood offset tables.
//!
//! Every update event visits the same `(2r+1)² − 1` relative offsets, so the
//! table is built once per configuration and reused for the lattice's
//! lifetime. The enumeration order is row-major (`dy` outer, `dx` inner) and
//! deterministic; consumers that distribute values over neighbors rely on
//! that order being stable.

use crate::{TopologyError, Torus};

/// A relative neighbor offset on the lattice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Offset {
    /// Horizontal displacement.
    pub dx: i32,
    /// Vertical displacement.
    pub dy: i32,
}

/// The immutable offset table for a square neighborhood of a given radius.
///
/// Excludes `(0, 0)`: a cell is never its own neighbor. Valid for any torus
/// whose shorter axis exceeds `2 * radius`, which construction enforces so
/// the neighborhood can never wrap onto itself (and is therefore never
/// empty and never aliases the center).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Neighborhood {
    radius: usize,
    offsets: Vec<Offset>,
}

impl Neighborhood {
    /// Build the offset table for `radius` on the given torus.
    pub fn new(radius: usize, torus: &Torus) -> Result<Self, TopologyError> {
        if radius == 0 {
            return Err(TopologyError::ZeroRadius);
        }
        if 2 * radius >= torus.width().min(torus.height()) {
            return Err(TopologyError::RadiusWraps {
                radius,
                width: torus.width(),
                height: torus.height(),
            });
        }

        let r = radius as i32;
        let mut offsets = Vec::with_capacity((2 * radius + 1).pow(2) - 1);
        for dy in -r..=r {
            for dx in -r..=r {
                if dx == 0 && dy == 0 {
                    continue;
                }
                offsets.push(Offset { dx, dy });
            }
        }
        Ok(Self { radius, offsets })
    }

    /// The configured radius.
    #[inline]
    pub const fn radius(&self) -> usize {
        self.radius
    }

    /// Number of neighbors: `(2r+1)² − 1`.
    #[inline]
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    /// Whether the neighborhood is empty (never, by construction).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// The ordered offset table.
    #[inline]
    pub fn offsets(&self) -> &[Offset] {
        &self.offsets
    }

    /// Resolve the neighbor indices of `center` into `out`.
    ///
    /// `out` is cleared first; on return it holds one wrapped linear index
    /// per offset, in table order. Callers reuse the buffer across events to
    /// keep the hot path allocation-free.
    pub fn fill_indices(&self, torus: &Torus, center: usize, out: &mut Vec<usize>) {
        out.clear();
        let (x, y) = torus.coords(center);
        for off in &self.offsets {
            out.push(torus.index(x as i64 + off.dx as i64, y as i64 + off.dy as i64));
        }
    }
}
