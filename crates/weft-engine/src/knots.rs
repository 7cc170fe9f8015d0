//! Knot registry: pinch gating, nucleation, and backreaction.
//!
//! A knot is a transient, charged defect stored densely per cell (remaining
//! lifetime, charge, and a spin attribute sampled at nucleation). Dense
//! storage keeps the backreaction query a bounded box scan instead of an
//! unbounded list walk as defects accumulate.
//!
//! Lifecycle per cell: absent (lifetime 0) → active (lifetime counting down
//! once per touching event) → absent again, with charge and spin cleared on
//! expiry. Nucleation is gated by the pinch score, a persistence counter
//! that grows only while the cell's neighborhood is simultaneously
//! disagreement-dense and sign-mixed.

use rand::Rng;
use weft_field::Field;
use weft_topology::Torus;

use crate::config::Tuning;
use crate::stats::NeighborStats;

/// Weight of the spin-attribute term in the backreaction bias.
const SPIN_BIAS: f32 = 0.1;

/// Guard against division by zero in the falloff denominator.
const FALLOFF_EPS: f32 = 1e-5;

/// Advance the pinch score for one event at `idx`.
pub(crate) fn update_pinch(field: &mut Field, idx: usize, stats: &NeighborStats, tuning: &Tuning) {
    let dense = stats.edge_density as f32 >= tuning.pinch_edge_threshold;
    let mixed = stats.mix_ratio >= tuning.pinch_mix_threshold;
    let current = field.pinch(idx);
    if dense && mixed {
        field.set_pinch(idx, current + tuning.pinch_increment);
    } else {
        // set_pinch floors at zero.
        field.set_pinch(idx, current - tuning.pinch_decay);
    }
}

/// Nucleate a knot at `idx` if the pinch gate allows it.
///
/// No-op while a knot is already active at the cell. Returns whether a knot
/// was created; the event that nucleates must not also age the fresh knot.
pub(crate) fn try_nucleate<R: Rng>(
    field: &mut Field,
    rng: &mut R,
    idx: usize,
    tuning: &Tuning,
) -> bool {
    if !tuning.knot_nucleation {
        return false;
    }
    if field.pinch(idx) < tuning.pinch_persistence || field.knot_life(idx) > 0 {
        return false;
    }

    let charge = if rng.gen_bool(0.5) { 1 } else { -1 };
    let spin = if field.accumulator(idx) >= 0.0 { 1 } else { -1 };
    field.nucleate_knot(idx, tuning.knot_lifetime, charge, spin);
    true
}

/// Backreaction bias at `idx` from every active knot within the influence
/// radius.
///
/// Scans the `(2r+1)²` box around the cell; the wrap constraint on the knot
/// radius guarantees each lattice cell is visited at most once, so the box
/// offsets are themselves the minimal toroidal deltas and the Euclidean
/// distance needs no further wrapping.
pub(crate) fn backreaction_bias(torus: &Torus, field: &Field, idx: usize, tuning: &Tuning) -> f32 {
    let radius = tuning.knot_radius;
    let (x, y) = torus.coords(idx);
    let r = radius as i64;
    let limit = radius as f32;

    let mut bias = 0.0;
    for dy in -r..=r {
        for dx in -r..=r {
            let j = torus.index(x as i64 + dx, y as i64 + dy);
            if field.knot_life(j) == 0 {
                continue;
            }
            let dist = ((dx * dx + dy * dy) as f32).sqrt();
            if dist <= limit {
                let falloff = 1.0 - dist / (limit + FALLOFF_EPS);
                bias += f32::from(field.knot_charge(j)) * falloff * tuning.knot_charge_bias;
                bias += f32::from(field.knot_spin(j)) * falloff * SPIN_BIAS;
            }
        }
    }
    bias
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};
    use weft_field::Mode;

    fn setup(size: usize) -> (Field, StdRng) {
        let mut rng = StdRng::seed_from_u64(11);
        let field = Field::new(size, Mode::Carrier, &mut rng);
        (field, rng)
    }

    fn contested_stats() -> NeighborStats {
        NeighborStats {
            sum: 0,
            edge_density: 12,
            mix_ratio: 0.5,
        }
    }

    fn calm_stats() -> NeighborStats {
        NeighborStats {
            sum: 8,
            edge_density: 0,
            mix_ratio: 0.0,
        }
    }

    #[test]
    fn pinch_grows_under_contested_neighborhoods() {
        let (mut field, _) = setup(16);
        let tuning = Tuning::default();

        update_pinch(&mut field, 3, &contested_stats(), &tuning);
        update_pinch(&mut field, 3, &contested_stats(), &tuning);
        assert_eq!(field.pinch(3), 2.0 * tuning.pinch_increment);
    }

    #[test]
    fn pinch_decays_toward_zero_otherwise() {
        let (mut field, _) = setup(16);
        let tuning = Tuning::default();
        field.set_pinch(3, 0.05);

        update_pinch(&mut field, 3, &calm_stats(), &tuning);
        assert_eq!(field.pinch(3), 0.0);
        update_pinch(&mut field, 3, &calm_stats(), &tuning);
        assert_eq!(field.pinch(3), 0.0);
    }

    #[test]
    fn nucleation_requires_the_persistence_gate() {
        let (mut field, mut rng) = setup(16);
        let tuning = Tuning {
            pinch_persistence: 3.0,
            knot_lifetime: 7,
            ..Tuning::default()
        };

        field.set_pinch(5, 2.9);
        assert!(!try_nucleate(&mut field, &mut rng, 5, &tuning));

        field.set_pinch(5, 3.0);
        assert!(try_nucleate(&mut field, &mut rng, 5, &tuning));
        assert_eq!(field.knot_life(5), 7);
        assert!(field.knot_charge(5) == 1 || field.knot_charge(5) == -1);
        assert_eq!(field.pinch(5), 0.0);
    }

    #[test]
    fn nucleation_is_a_noop_while_active() {
        let (mut field, mut rng) = setup(16);
        let tuning = Tuning {
            pinch_persistence: 1.0,
            knot_lifetime: 10,
            ..Tuning::default()
        };

        field.set_pinch(5, 1.0);
        assert!(try_nucleate(&mut field, &mut rng, 5, &tuning));
        let charge = field.knot_charge(5);

        field.set_pinch(5, 1.0);
        assert!(!try_nucleate(&mut field, &mut rng, 5, &tuning));
        assert_eq!(field.knot_life(5), 10);
        assert_eq!(field.knot_charge(5), charge);
    }

    #[test]
    fn nucleation_disabled_by_switch() {
        let (mut field, mut rng) = setup(16);
        let tuning = Tuning {
            knot_nucleation: false,
            pinch_persistence: 1.0,
            ..Tuning::default()
        };
        field.set_pinch(5, 99.0);
        assert!(!try_nucleate(&mut field, &mut rng, 5, &tuning));
        assert_eq!(field.knot_life(5), 0);
    }

    #[test]
    fn backreaction_scales_with_charge_and_distance() {
        let torus = Torus::new(12, 12).unwrap();
        let (mut field, _) = setup(torus.size());
        let tuning = Tuning {
            knot_radius: 2,
            knot_charge_bias: 0.15,
            ..Tuning::default()
        };

        let knot_cell = torus.index(6, 6);
        field.nucleate_knot(knot_cell, 100, 1, 1);

        let at_one = backreaction_bias(&torus, &field, torus.index(7, 6), &tuning);
        let at_two = backreaction_bias(&torus, &field, torus.index(8, 6), &tuning);
        let beyond = backreaction_bias(&torus, &field, torus.index(9, 6), &tuning);

        assert!(at_one > at_two);
        assert!(at_two > 0.0);
        assert_eq!(beyond, 0.0);

        // Opposite charge produces the mirrored charge term.
        field.nucleate_knot(knot_cell, 100, -1, 1);
        let flipped = backreaction_bias(&torus, &field, torus.index(7, 6), &tuning);
        assert!(flipped < at_one);
    }

    #[test]
    fn backreaction_reaches_across_the_seam() {
        let torus = Torus::new(12, 12).unwrap();
        let (mut field, _) = setup(torus.size());
        let tuning = Tuning::default();

        field.nucleate_knot(torus.index(0, 0), 100, 1, 1);
        let wrapped = backreaction_bias(&torus, &field, torus.index(11, 11), &tuning);
        assert!(wrapped > 0.0);
    }
}
