//! Stress scoring and shedding.
//!
//! Shedding bounds local runaway state by pushing a fraction of a stressed
//! cell's internal state into its neighborhood. The action depends on the
//! active mode: carrier mode redistributes accumulator charge (preferring
//! disagreeing neighbors) and emits a locally neutral dipole; phase mode
//! emits a diffusive shock by toggling neighbor phase bits.

use rand::Rng;
use weft_field::Field;

/// Per-neighbor redistribution weight when the neighbor agrees with the
/// shedding cell. Disagreeing neighbors take full weight, so charge flows
/// toward the disagreement boundary preferentially.
const AGREEING_WEIGHT: f32 = 0.5;

/// Combined stress score: local disagreement plus internal magnitude.
#[inline]
pub(crate) fn stress_score(
    edge_density: u32,
    accumulator: f32,
    edge_weight: f32,
    accumulator_weight: f32,
) -> f32 {
    edge_density as f32 * edge_weight + accumulator.abs() * accumulator_weight
}

/// Carrier-mode shedding: weighted redistribution plus a dipole emission.
///
/// `dump` is the slice of accumulator being shed; `center` is the source
/// cell's value as read from the statistics source. The caller damps the
/// source accumulator afterwards. The dipole flips the source cell's live
/// spin together with one uniformly chosen neighbor's, so the emission is
/// locally neutral.
pub(crate) fn carrier_shed<R: Rng>(
    field: &mut Field,
    rng: &mut R,
    idx: usize,
    dump: f32,
    center: i8,
    neighbors: &[usize],
    values: &[i8],
) {
    let mut weight_sum = 0.0;
    for &v in values {
        weight_sum += if v == center { AGREEING_WEIGHT } else { 1.0 };
    }

    let normalized = dump / weight_sum;
    for (k, &j) in neighbors.iter().enumerate() {
        let weight = if values[k] == center { AGREEING_WEIGHT } else { 1.0 };
        field.add_accumulator(j, normalized * weight);
    }

    field.flip_spin(idx);
    let partner = neighbors[rng.gen_range(0..neighbors.len())];
    field.flip_spin(partner);
}

/// Phase-mode shedding: toggle each neighbor's phase bit independently at
/// half the configured flip bias. No agreement weighting, no dipole.
pub(crate) fn phase_shed<R: Rng>(
    field: &mut Field,
    rng: &mut R,
    neighbors: &[usize],
    flip_bias: f32,
) {
    let p = f64::from(flip_bias) * 0.5;
    for &j in neighbors {
        if rng.gen_bool(p) {
            field.toggle_phase_bit(j);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};
    use weft_field::Mode;

    fn uniform_field(size: usize) -> Field {
        let mut rng = StdRng::seed_from_u64(1);
        let mut field = Field::new(size, Mode::Carrier, &mut rng);
        for i in 0..size {
            field.set_spin(i, 1);
            field.set_accumulator(i, 0.0);
        }
        field
    }

    #[test]
    fn dipole_flips_exactly_source_and_one_neighbor() {
        let mut field = uniform_field(16);
        let mut rng = StdRng::seed_from_u64(3);
        let neighbors = [1usize, 4, 5, 3, 7, 12, 13, 15];
        let values = [1i8; 8];

        let before: Vec<i8> = field.spins().to_vec();
        carrier_shed(&mut field, &mut rng, 0, 4.0, 1, &neighbors, &values);

        let flipped: Vec<usize> = (0..16).filter(|&i| field.spin(i) != before[i]).collect();
        assert_eq!(flipped.len(), 2);
        assert!(flipped.contains(&0));
        assert!(flipped.iter().any(|i| neighbors.contains(i)));
    }

    #[test]
    fn redistribution_conserves_the_dump() {
        let mut field = uniform_field(16);
        let mut rng = StdRng::seed_from_u64(3);
        let neighbors = [1usize, 2, 3, 4, 5, 6, 7, 8];
        // Half the neighbors disagree with the center.
        let values = [1i8, 1, 1, 1, -1, -1, -1, -1];

        carrier_shed(&mut field, &mut rng, 0, 6.0, 1, &neighbors, &values);

        let received: f32 = neighbors.iter().map(|&j| field.accumulator(j)).sum();
        assert!((received - 6.0).abs() < 1e-4);

        // Disagreeing neighbors take twice the agreeing share.
        assert!((field.accumulator(5) - 2.0 * field.accumulator(1)).abs() < 1e-5);
    }

    #[test]
    fn phase_shock_toggles_bits_and_leaves_spins_alone() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut field = Field::new(64, Mode::Phase, &mut rng);
        let spins_before: Vec<i8> = field.spins().to_vec();
        let neighbors: Vec<usize> = (1..33).collect();
        let bits_before: Vec<u8> = neighbors.iter().map(|&j| field.phase_bit(j)).collect();

        phase_shed(&mut field, &mut rng, &neighbors, 1.0);

        assert_eq!(field.spins(), spins_before.as_slice());
        // p = 0.5 per neighbor over 32 neighbors; a zero-toggle draw has
        // probability 2^-32 and would indicate a broken RNG wiring.
        let toggled = neighbors
            .iter()
            .enumerate()
            .filter(|&(k, &j)| field.phase_bit(j) != bits_before[k])
            .count();
        assert!(toggled >= 1);
    }

    #[test]
    fn zero_flip_bias_is_a_no_op() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut field = Field::new(16, Mode::Phase, &mut rng);
        let neighbors = [1usize, 2, 3];
        let before: Vec<u8> = neighbors.iter().map(|&j| field.phase_bit(j)).collect();

        phase_shed(&mut field, &mut rng, &neighbors, 0.0);
        let after: Vec<u8> = neighbors.iter().map(|&j| field.phase_bit(j)).collect();
        assert_eq!(after, before);
    }

    #[test]
    fn stress_score_combines_both_terms() {
        assert_eq!(stress_score(4, -3.0, 1.0, 0.5), 5.5);
        assert_eq!(stress_score(0, 0.0, 1.0, 0.5), 0.0);
    }
}
