//! The driver: owns the field, the geometry, and the RNG.
//!
//! One `Engine` is the single logical owner of all shared arrays; Rust's
//! `&mut self` on every mutating entry point enforces the non-reentrant,
//! single-driver discipline the update rules assume. Within one [`Engine::step`]
//! events apply strictly sequentially, each seeing all prior mutations,
//! unless the configuration selects snapshot reads, in which case statistics
//! queries see the frame-start spins while publication still writes live.

use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::Serialize;
use tracing::{debug, info, trace};
use weft_field::{Field, Mode};
use weft_topology::{Neighborhood, Torus};

use crate::carrier::carrier_update;
use crate::config::{EngineConfig, ReadMode, Tuning};
use crate::error::Result;
use crate::knots;
use crate::phase::phase_update;
use crate::stats::neighbor_stats;

/// An active defect, reported for overlay drawing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Knot {
    /// Cell x coordinate.
    pub x: usize,
    /// Cell y coordinate.
    pub y: usize,
    /// Charge sampled at nucleation (±1).
    pub charge: i8,
    /// Remaining lifetime in touching events.
    pub remaining: u32,
}

/// Aggregate diagnostics from a full read-only scan.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Diagnostics {
    /// Mean fraction of disagreeing neighbor links per cell, in `[0, 1]`.
    pub boundary_density: f64,
    /// Mean |accumulator| over the grid.
    pub mean_accumulator: f64,
    /// Number of currently active knots.
    pub knot_count: usize,
    /// Frame counter value.
    pub frame: u64,
}

/// The event-driven lattice engine.
pub struct Engine {
    torus: Torus,
    hood: Neighborhood,
    field: Field,
    rng: StdRng,
    config: EngineConfig,
    /// Frame-start spin copy, used only in snapshot read mode.
    snapshot: Vec<i8>,
    /// Reusable neighbor-index buffer for the hot path.
    scratch_idx: Vec<usize>,
    /// Reusable neighbor-value buffer for the hot path.
    scratch_val: Vec<i8>,
}

impl Engine {
    /// Build an engine from a validated configuration.
    pub fn new(config: EngineConfig) -> Result<Self> {
        let torus = Torus::new(config.width, config.height)?;
        let hood = Neighborhood::new(config.radius, &torus)?;
        config.validate()?;

        let mut rng = StdRng::seed_from_u64(config.seed);
        let field = Field::new(torus.size(), config.mode, &mut rng);
        let neighbor_count = hood.len();

        info!(
            width = config.width,
            height = config.height,
            radius = config.radius,
            mode = ?config.mode,
            read_mode = ?config.read_mode,
            seed = config.seed,
            "engine initialized"
        );

        Ok(Self {
            torus,
            hood,
            field,
            rng,
            config,
            snapshot: Vec::new(),
            scratch_idx: Vec::with_capacity(neighbor_count),
            scratch_val: Vec::with_capacity(neighbor_count),
        })
    }

    /// Perform one frame: exactly `events_per_frame` random update events,
    /// then bump the frame counter.
    pub fn step(&mut self) {
        if self.config.read_mode == ReadMode::Snapshot {
            self.refresh_snapshot();
        }
        let size = self.torus.size();
        for _ in 0..self.config.events_per_frame {
            let idx = self.rng.gen_range(0..size);
            self.update_event(idx);
        }
        self.field.advance_frame();
    }

    /// Perform a single update event at the given (wrapped) cell.
    ///
    /// Does not advance the frame counter. In snapshot read mode the event
    /// sees a snapshot taken at its own start.
    pub fn update_at(&mut self, x: i64, y: i64) {
        if self.config.read_mode == ReadMode::Snapshot {
            self.refresh_snapshot();
        }
        let idx = self.torus.index(x, y);
        self.update_event(idx);
    }

    /// Externally bias a single cell.
    ///
    /// Coordinates wrap toroidally, like every other coordinate access.
    /// Carrier mode adds `strength` to the cell's accumulator; phase mode
    /// toggles its phase bit (the strength carries no further meaning there).
    pub fn inject_at(&mut self, x: i64, y: i64, strength: f32) {
        let idx = self.torus.index(x, y);
        match self.config.mode {
            Mode::Carrier => self.field.add_accumulator(idx, strength),
            Mode::Phase => self.field.toggle_phase_bit(idx),
        }
        debug!(x, y, strength, "external injection");
    }

    /// Full read-only scan: boundary density, mean |accumulator|, active
    /// knot count. Safe to call between events at any time.
    pub fn diagnostics(&self) -> Diagnostics {
        let spins = self.field.spins();
        let mut edges = 0u64;
        let mut magnitude = 0.0f64;

        let mut neighbors = Vec::with_capacity(self.hood.len());
        for i in 0..self.torus.size() {
            self.hood.fill_indices(&self.torus, i, &mut neighbors);
            edges += neighbors.iter().filter(|&&j| spins[j] != spins[i]).count() as u64;
            magnitude += f64::from(self.field.accumulator(i).abs());
        }

        let size = self.torus.size() as f64;
        Diagnostics {
            boundary_density: edges as f64 / (size * self.hood.len() as f64),
            mean_accumulator: magnitude / size,
            knot_count: self.field.active_knots(),
            frame: self.field.frame(),
        }
    }

    /// Currently active defects, for overlay drawing.
    pub fn knots(&self) -> Vec<Knot> {
        let lifetimes = self.field.knot_lifetimes();
        let charges = self.field.knot_charges();
        lifetimes
            .iter()
            .enumerate()
            .filter(|&(_, &life)| life > 0)
            .map(|(i, &life)| {
                let (x, y) = self.torus.coords(i);
                Knot {
                    x,
                    y,
                    charge: charges[i],
                    remaining: life,
                }
            })
            .collect()
    }

    /// Read-only view of the published spin array.
    pub fn spins(&self) -> &[i8] {
        self.field.spins()
    }

    /// Read-only view of the accumulator array (for shading).
    pub fn accumulators(&self) -> &[f32] {
        self.field.accumulators()
    }

    /// The active configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Frame counter.
    pub fn frame(&self) -> u64 {
        self.field.frame()
    }

    /// Apply new tuning constants live, without touching any array.
    pub fn set_tuning(&mut self, tuning: Tuning) -> Result<()> {
        tuning.validate(self.config.width, self.config.height)?;
        self.config.tuning = tuning;
        info!("tuning updated");
        Ok(())
    }

    /// Reseed every array and the RNG from the configured seed, restoring
    /// the engine to its initial state.
    pub fn reset(&mut self) {
        self.rng = StdRng::seed_from_u64(self.config.seed);
        self.field.reseed(&mut self.rng);
        info!(seed = self.config.seed, "field reseeded");
    }

    /// Replace the configuration wholesale, rebuilding topology and
    /// reseeding all arrays.
    ///
    /// Required for dimension, radius, mode, or read-source changes; mode
    /// switches in particular invalidate the accumulator's meaning, so they
    /// always pass through here.
    pub fn reconfigure(&mut self, config: EngineConfig) -> Result<()> {
        *self = Self::new(config)?;
        Ok(())
    }

    /// One update event: gather, mediate, then run the knot lifecycle.
    fn update_event(&mut self, idx: usize) {
        let mut neighbors = std::mem::take(&mut self.scratch_idx);
        let mut values = std::mem::take(&mut self.scratch_val);
        self.hood.fill_indices(&self.torus, idx, &mut neighbors);

        values.clear();
        let center = {
            let source: &[i8] = match self.config.read_mode {
                ReadMode::Snapshot => &self.snapshot,
                ReadMode::Live => self.field.spins(),
            };
            values.extend(neighbors.iter().map(|&j| source[j]));
            source[idx]
        };

        let stats = neighbor_stats(&values, center);
        let tuning = self.config.tuning;
        match self.config.mode {
            Mode::Carrier => carrier_update(
                &mut self.field,
                &mut self.rng,
                &self.torus,
                &tuning,
                idx,
                center,
                &stats,
                &neighbors,
                &values,
            ),
            Mode::Phase => phase_update(
                &mut self.field,
                &mut self.rng,
                &tuning,
                idx,
                center,
                &stats,
                &neighbors,
            ),
        }

        knots::update_pinch(&mut self.field, idx, &stats, &tuning);
        let nucleated = knots::try_nucleate(&mut self.field, &mut self.rng, idx, &tuning);
        if nucleated {
            let (x, y) = self.torus.coords(idx);
            debug!(x, y, charge = self.field.knot_charge(idx), "knot nucleated");
        } else if self.field.age_knot(idx) {
            let (x, y) = self.torus.coords(idx);
            trace!(x, y, "knot expired");
        }

        self.scratch_idx = neighbors;
        self.scratch_val = values;
    }

    fn refresh_snapshot(&mut self) {
        self.snapshot.clear();
        self.snapshot.extend_from_slice(self.field.spins());
    }
}
