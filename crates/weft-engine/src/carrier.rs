//! Carrier mediation: continuous integrator with 1-bit quantization feedback.
//!
//! Neighborhood influence (plus knot backreaction) drives a per-cell
//! accumulator; the published spin is the accumulator's sign. The published
//! value feeds back negatively into the integrator (sigma-delta form) and a
//! constant leak nudges the integrator toward zero independent of drive, so
//! the internal state cannot drift unboundedly even before shedding engages.

use rand::Rng;
use weft_field::Field;
use weft_topology::Torus;

use crate::config::Tuning;
use crate::knots::backreaction_bias;
use crate::shed::{carrier_shed, stress_score};
use crate::stats::NeighborStats;

/// Sign with the zero case mapped to zero, so the leak never pushes an
/// exactly-zero accumulator off center.
#[inline]
fn signum_or_zero(value: f32) -> f32 {
    if value > 0.0 {
        1.0
    } else if value < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// One carrier-mode update event at `idx`.
///
/// `center` and `values` were gathered from the configured statistics source;
/// all writes go to the live field.
#[allow(clippy::too_many_arguments)]
pub(crate) fn carrier_update<R: Rng>(
    field: &mut Field,
    rng: &mut R,
    torus: &Torus,
    tuning: &Tuning,
    idx: usize,
    center: i8,
    stats: &NeighborStats,
    neighbors: &[usize],
    values: &[i8],
) {
    let backreaction = backreaction_bias(torus, field, idx, tuning);
    let mut drive = tuning.drive_gain * stats.sum as f32 + backreaction;

    // Dither ambiguous neighborhoods to avoid deterministic lock-in.
    if (stats.sum as f32).abs() <= tuning.ambiguity_band {
        drive += (rng.gen::<f32>() - 0.5) * 2.0 * tuning.ambiguity_noise;
    }

    let before = field.accumulator(idx);
    let acc = before + drive
        - tuning.feedback_gain * f32::from(center)
        - tuning.leak_rate * signum_or_zero(before);
    field.set_accumulator(idx, acc);

    // Quantize: the tie at zero publishes +1.
    field.set_spin(idx, if acc >= 0.0 { 1 } else { -1 });

    let stress = stress_score(
        stats.edge_density,
        acc,
        tuning.stress_edge_weight,
        tuning.stress_accumulator_weight,
    );
    if stress > tuning.stress_threshold {
        carrier_shed(
            field,
            rng,
            idx,
            acc * tuning.shedding_fraction,
            center,
            neighbors,
            values,
        );
        field.set_accumulator(idx, acc * (1.0 - tuning.shedding_fraction));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};
    use weft_field::Mode;

    fn quiet_tuning() -> Tuning {
        Tuning {
            drive_gain: 1.0,
            feedback_gain: 0.0,
            leak_rate: 0.0,
            ambiguity_band: 0.0,
            ambiguity_noise: 0.0,
            stress_threshold: f32::MAX,
            knot_nucleation: false,
            ..Tuning::default()
        }
    }

    fn setup() -> (Torus, Field, StdRng, Vec<usize>) {
        let torus = Torus::new(8, 8).unwrap();
        let mut rng = StdRng::seed_from_u64(5);
        let mut field = Field::new(torus.size(), Mode::Carrier, &mut rng);
        for i in 0..torus.size() {
            field.set_spin(i, 1);
            field.set_accumulator(i, 0.0);
        }
        let neighbors: Vec<usize> = (1..9).collect();
        (torus, field, rng, neighbors)
    }

    #[test]
    fn positive_drive_publishes_plus_one() {
        let (torus, mut field, mut rng, neighbors) = setup();
        let values = [1i8; 8];
        let stats = crate::stats::neighbor_stats(&values, 1);

        carrier_update(
            &mut field,
            &mut rng,
            &torus,
            &quiet_tuning(),
            0,
            1,
            &stats,
            &neighbors,
            &values,
        );
        assert_eq!(field.accumulator(0), 8.0);
        assert_eq!(field.spin(0), 1);
    }

    #[test]
    fn negative_drive_publishes_minus_one() {
        let (torus, mut field, mut rng, neighbors) = setup();
        let values = [-1i8; 8];
        let stats = crate::stats::neighbor_stats(&values, 1);

        carrier_update(
            &mut field,
            &mut rng,
            &torus,
            &quiet_tuning(),
            0,
            1,
            &stats,
            &neighbors,
            &values,
        );
        assert_eq!(field.accumulator(0), -8.0);
        assert_eq!(field.spin(0), -1);
    }

    #[test]
    fn zero_accumulator_tie_publishes_plus_one() {
        let (torus, mut field, mut rng, neighbors) = setup();
        field.set_spin(0, -1);
        let values = [1i8, -1, 1, -1, 1, -1, 1, -1];
        let stats = crate::stats::neighbor_stats(&values, -1);
        let tuning = Tuning {
            ambiguity_band: -1.0, // keep the dither branch closed even at sum 0
            ..quiet_tuning()
        };

        carrier_update(
            &mut field,
            &mut rng,
            &torus,
            &tuning,
            0,
            -1,
            &stats,
            &neighbors,
            &values,
        );
        assert_eq!(field.accumulator(0), 0.0);
        assert_eq!(field.spin(0), 1);
    }

    #[test]
    fn feedback_opposes_the_published_value() {
        let (torus, mut field, mut rng, neighbors) = setup();
        let values = [1i8; 8];
        let stats = crate::stats::neighbor_stats(&values, 1);
        let tuning = Tuning {
            feedback_gain: 0.5,
            ..quiet_tuning()
        };

        carrier_update(
            &mut field,
            &mut rng,
            &torus,
            &tuning,
            0,
            1,
            &stats,
            &neighbors,
            &values,
        );
        // 8.0 drive minus 0.5 feedback against the +1 published value.
        assert_eq!(field.accumulator(0), 7.5);
    }

    #[test]
    fn leak_pulls_toward_zero_without_drive() {
        let (torus, mut field, mut rng, neighbors) = setup();
        field.set_accumulator(0, 2.0);
        let values = [1i8, -1, 1, -1, 1, -1, 1, -1];
        let stats = crate::stats::neighbor_stats(&values, 1);
        let tuning = Tuning {
            drive_gain: 0.0,
            leak_rate: 0.25,
            ambiguity_band: -1.0,
            ..quiet_tuning()
        };

        carrier_update(
            &mut field,
            &mut rng,
            &torus,
            &tuning,
            0,
            1,
            &stats,
            &neighbors,
            &values,
        );
        assert_eq!(field.accumulator(0), 1.75);
    }

    #[test]
    fn stress_triggers_shedding_and_damping() {
        let (torus, mut field, mut rng, neighbors) = setup();
        let values = [1i8; 8];
        let stats = crate::stats::neighbor_stats(&values, 1);
        let tuning = Tuning {
            stress_threshold: 0.0,
            shedding_fraction: 0.5,
            ..quiet_tuning()
        };

        carrier_update(
            &mut field,
            &mut rng,
            &torus,
            &tuning,
            0,
            1,
            &stats,
            &neighbors,
            &values,
        );
        // Accumulator reached 8.0, then shed half.
        assert_eq!(field.accumulator(0), 4.0);
        let received: f32 = neighbors.iter().map(|&j| field.accumulator(j)).sum();
        assert!((received - 4.0).abs() < 1e-4);
    }
}
