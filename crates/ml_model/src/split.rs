//! Seeded, reproducible train / validation / test splits.

/// Shuffles indices using a simple LCG-based shuffle.
pub fn shuffle_indices(indices: &mut [usize], seed: u64) {
    // Fisher-Yates with an LCG as the random source.
    let mut rng_state = seed.wrapping_add(12345);

    for i in (1..indices.len()).rev() {
        rng_state = rng_state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1);
        let j = ((rng_state >> 33) as usize) % (i + 1);
        indices.swap(i, j);
    }
}

/// Row positions assigned to each split.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SplitIndices {
    pub train: Vec<usize>,
    pub valid: Vec<usize>,
    pub test: Vec<usize>,
}

/// Rows held out for a fraction, rounded up, always leaving one row behind.
fn held_out(n: usize, fraction: f64) -> usize {
    if n <= 1 || fraction <= 0.0 {
        return 0;
    }
    let wanted = (fraction.min(1.0) * n as f64).ceil() as usize;
    wanted.min(n - 1)
}

/// Splits `n` rows into train, validation and test sets.
///
/// The test rows are taken first from a seeded permutation, then the
/// validation rows are carved from what remains with the same rounding.
/// The same `n`, fractions and seed always give the same partition.
#[must_use]
pub fn split_indices(n: usize, test_fraction: f64, valid_fraction: f64, seed: u64) -> SplitIndices {
    let mut order: Vec<usize> = (0..n).collect();
    shuffle_indices(&mut order, seed);

    let n_test = held_out(n, test_fraction);
    let rest = order.split_off(n_test);
    let n_valid = held_out(rest.len(), valid_fraction);

    SplitIndices {
        test: order,
        valid: rest[..n_valid].to_vec(),
        train: rest[n_valid..].to_vec(),
    }
}
