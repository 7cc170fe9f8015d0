//! Weft Field State
//!
//! The [`Field`] is the single owner of every per-cell array in the
//! simulation: published spins, the carrier accumulator, phase bits, pinch
//! scores, and the dense knot registry (lifetime, charge, spin). All arrays
//! share one linear cell index; no other component keeps a copy - policies
//! and the driver operate on the shared arrays by index through the accessors
//! here.
//!
//! # Mode
//!
//! The accumulator array is dual-use: in [`Mode::Carrier`] it is the
//! sigma-delta integrator that decides the published spin; in [`Mode::Phase`]
//! it is only a clamped pseudo-stress proxy. To keep a reader of one mode's
//! history from silently misinterpreting the other's, the mode is part of the
//! field's identity: switching modes means constructing (reseeding) a fresh
//! field.
//!
//! # Seeding
//!
//! Initialization draws from a caller-supplied RNG: spins random ±1 (to avoid
//! trivial symmetry), accumulators a small uniform bias, phase bits random
//! 0/1. Pinch scores and the knot registry start empty.

use rand::Rng;

/// Upper bound for the phase-mode accumulator proxy.
///
/// Phase mode tracks `accumulator += new_spin - old_spin` purely so the same
/// stress formula applies in both modes; the clamp keeps the proxy in a fixed
/// symmetric range.
pub const ACCUMULATOR_CLAMP: f32 = 32.0;

/// The globally selected mediation policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Mode {
    /// Continuous integrator with 1-bit quantization feedback.
    #[default]
    Carrier,
    /// Discrete majority vote with stochastic phase-bit tie-break.
    Phase,
}

/// All per-cell simulation state, plus the frame counter.
#[derive(Debug, Clone)]
pub struct Field {
    mode: Mode,
    /// Published ±1 value per cell.
    spin: Vec<i8>,
    /// Carrier integrator, or phase-mode pseudo-stress proxy.
    accumulator: Vec<f32>,
    /// Phase bit (0/1), consumed only by the phase policy.
    phase: Vec<u8>,
    /// Persistence counter gating knot nucleation.
    pinch: Vec<f32>,
    /// Remaining knot lifetime; 0 means no defect at the cell.
    knot_life: Vec<u32>,
    /// Knot charge (±1 while active, 0 otherwise).
    knot_charge: Vec<i8>,
    /// Knot spin attribute sampled at nucleation (±1 while active).
    knot_spin: Vec<i8>,
    frame: u64,
}

impl Field {
    /// Create a seeded field of `size` cells.
    pub fn new<R: Rng>(size: usize, mode: Mode, rng: &mut R) -> Self {
        let mut field = Self {
            mode,
            spin: vec![0; size],
            accumulator: vec![0.0; size],
            phase: vec![0; size],
            pinch: vec![0.0; size],
            knot_life: vec![0; size],
            knot_charge: vec![0; size],
            knot_spin: vec![0; size],
            frame: 0,
        };
        field.reseed(rng);
        field
    }

    /// Re-randomize spins, accumulators, and phase bits; clear everything else.
    pub fn reseed<R: Rng>(&mut self, rng: &mut R) {
        for i in 0..self.spin.len() {
            self.spin[i] = if rng.gen_bool(0.5) { 1 } else { -1 };
            self.accumulator[i] = (rng.gen::<f32>() - 0.5) * 0.2;
            self.phase[i] = u8::from(rng.gen_bool(0.5));
            self.pinch[i] = 0.0;
            self.knot_life[i] = 0;
            self.knot_charge[i] = 0;
            self.knot_spin[i] = 0;
        }
        self.frame = 0;
    }

    /// Number of cells.
    #[inline]
    pub fn size(&self) -> usize {
        self.spin.len()
    }

    /// The mode this field was seeded for.
    #[inline]
    pub const fn mode(&self) -> Mode {
        self.mode
    }

    /// Frame counter (incremented once per driver step, diagnostics only).
    #[inline]
    pub const fn frame(&self) -> u64 {
        self.frame
    }

    /// Bump the frame counter.
    #[inline]
    pub fn advance_frame(&mut self) {
        self.frame += 1;
    }

    // --- published spins ---------------------------------------------------

    /// Read-only view of the published spin array.
    #[inline]
    pub fn spins(&self) -> &[i8] {
        &self.spin
    }

    #[inline]
    pub fn spin(&self, i: usize) -> i8 {
        self.spin[i]
    }

    #[inline]
    pub fn set_spin(&mut self, i: usize, value: i8) {
        debug_assert!(value == 1 || value == -1);
        self.spin[i] = value;
    }

    /// Negate the published value (dipole emission).
    #[inline]
    pub fn flip_spin(&mut self, i: usize) {
        self.spin[i] = -self.spin[i];
    }

    // --- accumulator -------------------------------------------------------

    /// Read-only view of the accumulator array (for shading / diagnostics).
    #[inline]
    pub fn accumulators(&self) -> &[f32] {
        &self.accumulator
    }

    #[inline]
    pub fn accumulator(&self, i: usize) -> f32 {
        self.accumulator[i]
    }

    #[inline]
    pub fn set_accumulator(&mut self, i: usize, value: f32) {
        self.accumulator[i] = value;
    }

    #[inline]
    pub fn add_accumulator(&mut self, i: usize, delta: f32) {
        self.accumulator[i] += delta;
    }

    // --- phase bits --------------------------------------------------------

    #[inline]
    pub fn phase_bit(&self, i: usize) -> u8 {
        self.phase[i]
    }

    #[inline]
    pub fn toggle_phase_bit(&mut self, i: usize) {
        self.phase[i] ^= 1;
    }

    // --- pinch scores ------------------------------------------------------

    #[inline]
    pub fn pinch(&self, i: usize) -> f32 {
        self.pinch[i]
    }

    #[inline]
    pub fn set_pinch(&mut self, i: usize, value: f32) {
        self.pinch[i] = value.max(0.0);
    }

    // --- knot registry -----------------------------------------------------

    /// Read-only view of remaining knot lifetimes.
    #[inline]
    pub fn knot_lifetimes(&self) -> &[u32] {
        &self.knot_life
    }

    /// Read-only view of knot charges.
    #[inline]
    pub fn knot_charges(&self) -> &[i8] {
        &self.knot_charge
    }

    #[inline]
    pub fn knot_life(&self, i: usize) -> u32 {
        self.knot_life[i]
    }

    #[inline]
    pub fn knot_charge(&self, i: usize) -> i8 {
        self.knot_charge[i]
    }

    #[inline]
    pub fn knot_spin(&self, i: usize) -> i8 {
        self.knot_spin[i]
    }

    /// Activate a knot at cell `i`.
    pub fn nucleate_knot(&mut self, i: usize, lifetime: u32, charge: i8, spin: i8) {
        self.knot_life[i] = lifetime;
        self.knot_charge[i] = charge;
        self.knot_spin[i] = spin;
        self.pinch[i] = 0.0;
    }

    /// Age an active knot by one touch. Returns `true` if it expired.
    pub fn age_knot(&mut self, i: usize) -> bool {
        if self.knot_life[i] == 0 {
            return false;
        }
        self.knot_life[i] -= 1;
        if self.knot_life[i] == 0 {
            self.knot_charge[i] = 0;
            self.knot_spin[i] = 0;
            return true;
        }
        false
    }

    /// Count of currently active knots.
    pub fn active_knots(&self) -> usize {
        self.knot_life.iter().filter(|&&life| life > 0).count()
    }
}
