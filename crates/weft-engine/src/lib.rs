//! Weft Pulse-Lattice Engine
//!
//! An event-driven lattice automaton on a toroidal 2-D grid of ±1 published
//! cells. Each update event selects one cell, resolves its neighborhood
//! through the active mediation policy, and feeds two feedback subsystems:
//!
//! - **Stress shedding** - when local disagreement and internal magnitude
//!   exceed a threshold, part of the cell's internal state is redistributed
//!   into its neighborhood (plus a paired sign-flip emission in carrier
//!   mode), bounding runaway accumulation and breaking deadlocks.
//! - **Knot registry** - cells whose neighborhood stays disagreement-dense
//!   and sign-mixed accumulate a pinch score; crossing the persistence
//!   threshold nucleates a charged, finite-lifetime defect that biases
//!   nearby updates until it decays.
//!
//! # Mediation Policies
//!
//! Exactly one policy is active for the whole grid:
//!
//! - [`Mode::Carrier`] - a continuous integrator with 1-bit quantization
//!   feedback (sigma-delta form): neighborhood drive charges an accumulator,
//!   the published spin is its sign, and the published value feeds back
//!   negatively into the integrator.
//! - [`Mode::Phase`] - discrete majority vote; ambiguous neighborhoods
//!   resolve through a stochastically toggled per-cell phase bit.
//!
//! Switching modes invalidates the accumulator's meaning, so it always goes
//! through [`Engine::reconfigure`], which reseeds the field.
//!
//! # Usage
//!
//! ```
//! use weft_engine::{Engine, EngineConfig};
//!
//! let mut engine = Engine::new(EngineConfig::default()).unwrap();
//! engine.step();
//! engine.inject_at(10, 10, 4.0);
//!
//! let diag = engine.diagnostics();
//! assert!(diag.boundary_density >= 0.0);
//! ```

mod carrier;
mod config;
mod engine;
mod error;
mod knots;
mod phase;
mod shed;
pub mod stats;

pub use config::{EngineConfig, ReadMode, Tuning};
pub use engine::{Diagnostics, Engine, Knot};
pub use error::{Error, Result};
pub use stats::{neighbor_stats, NeighborStats};
pub use weft_field::{Mode, ACCUMULATOR_CLAMP};
