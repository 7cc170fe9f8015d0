//! Engine configuration.
//!
//! Structural options (dimensions, radius, mode, read source, seed) require a
//! full rebuild when they change; the numeric [`Tuning`] block may be applied
//! live through [`Engine::set_tuning`](crate::Engine::set_tuning). Defaults
//! follow the proof-of-concept tuning the dynamics were calibrated with.

use serde::{Deserialize, Serialize};
use weft_field::Mode;

use crate::error::{Error, Result};

/// Which array statistics queries read from during a step.
///
/// `Live` sees every prior event's mutations inside the same step; `Snapshot`
/// reads a frame-start copy of the spins while publication still writes to
/// the live array. A configuration switch, never a per-call choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadMode {
    /// Read the live spin array.
    #[default]
    Live,
    /// Read a frame-start snapshot of the spin array.
    Snapshot,
}

/// Numeric tuning constants. May be updated live without a reset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Gain converting the neighborhood sum into accumulator drive.
    pub drive_gain: f32,
    /// Quantizer feedback subtracted per event times the published spin.
    pub feedback_gain: f32,
    /// Constant leak nudging the accumulator toward zero.
    pub leak_rate: f32,
    /// |sum| at or below this counts as an ambiguous neighborhood.
    pub ambiguity_band: f32,
    /// Scale of the symmetric dither injected in ambiguous neighborhoods.
    pub ambiguity_noise: f32,
    /// Probability of toggling the phase bit on an ambiguous event.
    pub phase_flip_bias: f32,
    /// Weight of edge density in the stress score.
    pub stress_edge_weight: f32,
    /// Weight of |accumulator| in the stress score.
    pub stress_accumulator_weight: f32,
    /// Stress above this triggers shedding.
    pub stress_threshold: f32,
    /// Fraction of the accumulator dumped into neighbors on shedding.
    pub shedding_fraction: f32,
    /// Pinch growth per disagreement-dense, sign-mixed event.
    pub pinch_increment: f32,
    /// Pinch decay per event otherwise (floored at zero).
    pub pinch_decay: f32,
    /// Edge density required for a pinch increment.
    pub pinch_edge_threshold: f32,
    /// Mix ratio required for a pinch increment.
    pub pinch_mix_threshold: f32,
    /// Pinch score that nucleates a knot.
    pub pinch_persistence: f32,
    /// Master switch for knot nucleation.
    pub knot_nucleation: bool,
    /// Lifetime (in touching events) of a nucleated knot.
    pub knot_lifetime: u32,
    /// Influence radius of an active knot.
    pub knot_radius: usize,
    /// Strength of the charge term in knot backreaction.
    pub knot_charge_bias: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            drive_gain: 0.08,
            feedback_gain: 0.05,
            leak_rate: 0.01,
            ambiguity_band: 4.0,
            ambiguity_noise: 0.3,
            phase_flip_bias: 0.35,
            stress_edge_weight: 1.0,
            stress_accumulator_weight: 0.5,
            stress_threshold: 10.0,
            shedding_fraction: 0.35,
            pinch_increment: 1.0,
            pinch_decay: 0.1,
            pinch_edge_threshold: 10.0,
            pinch_mix_threshold: 0.25,
            pinch_persistence: 12.0,
            knot_nucleation: true,
            knot_lifetime: 900,
            knot_radius: 2,
            knot_charge_bias: 0.15,
        }
    }
}

impl Tuning {
    /// Validate the constants that could fail at event time if left unchecked.
    ///
    /// `shedding_fraction` and `phase_flip_bias` feed `Rng::gen_bool`, which
    /// panics outside the unit interval, and the knot influence box must not
    /// wrap onto itself on the given grid.
    pub fn validate(&self, width: usize, height: usize) -> Result<()> {
        for (name, value) in [
            ("shedding_fraction", self.shedding_fraction),
            ("phase_flip_bias", self.phase_flip_bias),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::FractionOutOfRange { name, value });
            }
        }
        if 2 * self.knot_radius >= width.min(height) {
            return Err(Error::KnotRadiusWraps {
                radius: self.knot_radius,
                width,
                height,
            });
        }
        Ok(())
    }
}

/// Full engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Grid width in cells.
    pub width: usize,
    /// Grid height in cells.
    pub height: usize,
    /// Neighborhood radius (square neighborhood, center excluded).
    pub radius: usize,
    /// Update events performed per [`Engine::step`](crate::Engine::step).
    pub events_per_frame: usize,
    /// Active mediation policy.
    pub mode: Mode,
    /// Statistics read source.
    pub read_mode: ReadMode,
    /// RNG seed; identical seeds reproduce identical runs.
    pub seed: u64,
    /// Numeric tuning constants.
    pub tuning: Tuning,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            width: 120,
            height: 120,
            radius: 2,
            events_per_frame: 600,
            mode: Mode::Carrier,
            read_mode: ReadMode::Live,
            seed: 42,
            tuning: Tuning::default(),
        }
    }
}

impl EngineConfig {
    /// Validate everything the topology constructors do not already cover.
    pub fn validate(&self) -> Result<()> {
        if self.events_per_frame == 0 {
            return Err(Error::ZeroEvents);
        }
        self.tuning.validate(self.width, self.height)
    }
}
