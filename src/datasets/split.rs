use log::debug;
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

use crate::error::{Error, Result};

use super::table::Table;

/// Partition a labeled table into `(train, test)`, stratified on the binary target.
///
/// Each class contributes to the test side in proportion to its share of the table, and both
/// sides keep at least one member of every class. The same `seed` always yields the same
/// partition. Duplicates are dropped again within each side after the split.
pub fn split(table: &Table, test_fraction: f64, seed: u64) -> Result<(Table, Table)> {
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(Error::Config(format!(
            "test fraction must be within (0, 1), got {test_fraction}"
        )));
    }

    let targets = table.targets()?;

    let mut strata: [Vec<usize>; 2] = [Vec::new(), Vec::new()];
    for (index, &target) in targets.iter().enumerate() {
        strata
            .get_mut(target as usize)
            .ok_or_else(|| Error::Schema(format!("row {index}: target {target} is not binary")))?
            .push(index);
    }

    for (class, members) in strata.iter().enumerate() {
        if members.len() < 2 {
            return Err(Error::InsufficientData(format!(
                "class {class} has {} member(s), at least 2 are needed to stratify",
                members.len()
            )));
        }
    }

    let counts = allocate(
        [strata[0].len(), strata[1].len()],
        (test_fraction * table.len() as f64).ceil() as usize,
    );

    let mut rng = StdRng::seed_from_u64(seed);

    let mut train = Vec::with_capacity(table.len());
    let mut test = Vec::with_capacity(counts.iter().sum());

    for (members, n_test) in strata.iter_mut().zip(counts) {
        members.shuffle(&mut rng);

        let (head, tail) = members.split_at(n_test);
        test.extend_from_slice(head);
        train.extend_from_slice(tail);
    }

    train.shuffle(&mut rng);
    test.shuffle(&mut rng);

    debug!(
        "Stratified split: {} train / {} test rows (test fraction {})",
        train.len(),
        test.len(),
        test_fraction
    );

    Ok((table.select(&train).dedup(), table.select(&test).dedup()))
}

/// Distribute `n_test` rows across the classes proportionally to their sizes, rounding by largest
/// remainder and keeping at least one row of each class on both sides
fn allocate(sizes: [usize; 2], n_test: usize) -> [usize; 2] {
    let total = (sizes[0] + sizes[1]) as f64;

    let exact = sizes.map(|size| n_test as f64 * size as f64 / total);
    let mut counts = exact.map(|value| value.floor() as usize);

    let remaining = n_test.saturating_sub(counts[0] + counts[1]);
    let mut order = [0, 1];
    order.sort_by(|&a, &b| {
        let fract = |i: usize| exact[i] - exact[i].floor();
        fract(b).total_cmp(&fract(a))
    });

    for &class in order.iter().take(remaining) {
        counts[class] += 1;
    }

    for (count, size) in counts.iter_mut().zip(sizes) {
        *count = (*count).clamp(1, size - 1);
    }

    counts
}
