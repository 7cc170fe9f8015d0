//! Phase mediation: discrete majority vote with stochastic tie-break.
//!
//! Decisive neighborhoods publish the sign of the neighbor sum directly.
//! Ambiguous neighborhoods consult the cell's phase bit - toggled with the
//! configured bias so contested regions keep churning - and fall back to the
//! previous published value when the vote lands exactly on zero.
//!
//! The accumulator is maintained as a clamped bookkeeping proxy
//! (`acc += new − old`) purely so the carrier-mode stress formula applies
//! unchanged.

use rand::Rng;
use weft_field::{Field, ACCUMULATOR_CLAMP};

use crate::config::Tuning;
use crate::shed::{phase_shed, stress_score};
use crate::stats::NeighborStats;

/// One phase-mode update event at `idx`.
///
/// `center` and `values` were gathered from the configured statistics source;
/// all writes go to the live field.
pub(crate) fn phase_update<R: Rng>(
    field: &mut Field,
    rng: &mut R,
    tuning: &Tuning,
    idx: usize,
    center: i8,
    stats: &NeighborStats,
    neighbors: &[usize],
) {
    let next = if (stats.sum as f32).abs() <= tuning.ambiguity_band {
        if rng.gen_bool(f64::from(tuning.phase_flip_bias)) {
            field.toggle_phase_bit(idx);
        }
        let direction = if field.phase_bit(idx) == 1 { 1.0 } else { -1.0 };
        let noise = (rng.gen::<f32>() - 0.5) * 2.0 * tuning.ambiguity_noise;
        let resolved = stats.sum as f32 + direction + noise;
        if resolved > 0.0 {
            1
        } else if resolved < 0.0 {
            -1
        } else {
            // Exactly zero and undecided: keep the previous published value.
            center
        }
    } else if stats.sum > 0 {
        1
    } else {
        -1
    };

    field.set_spin(idx, next);

    let acc = (field.accumulator(idx) + f32::from(next - center))
        .clamp(-ACCUMULATOR_CLAMP, ACCUMULATOR_CLAMP);
    field.set_accumulator(idx, acc);

    let stress = stress_score(
        stats.edge_density,
        acc,
        tuning.stress_edge_weight,
        tuning.stress_accumulator_weight,
    );
    if stress > tuning.stress_threshold {
        phase_shed(field, rng, neighbors, tuning.phase_flip_bias);
        field.set_accumulator(idx, acc * (1.0 - tuning.shedding_fraction));
    }
}
