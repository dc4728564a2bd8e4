use std::collections::BTreeMap;
use std::fmt::Display;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::{PipelineError, Result};

// Absorbs float noise such as 0.2 * 10 = 2.0000000000000004 before ceil.
const FRACTION_EPSILON: f64 = 1e-9;

/// Splits `items` into `(train, test)` while keeping each stratum's share.
///
/// The test side gets `ceil(test_fraction * n)` items, shared out across
/// strata by largest remainder. Every stratum keeps at least one item on each
/// side, so a stratum with fewer than two items is an error. Each call seeds
/// its own generator from `seed`.
pub fn stratified_split<T, K, F>(
    items: Vec<T>,
    stratum: F,
    test_fraction: f64,
    seed: u64,
) -> Result<(Vec<T>, Vec<T>)>
where
    K: Ord + Display,
    F: Fn(&T) -> K,
{
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(PipelineError::new(format!(
            "test fraction must lie strictly between 0 and 1, got {test_fraction}"
        )));
    }

    let total = items.len();
    let mut groups: BTreeMap<K, Vec<T>> = BTreeMap::new();
    for item in items {
        groups.entry(stratum(&item)).or_default().push(item);
    }

    if let Some((key, members)) = groups.iter().find(|(_, members)| members.len() < 2) {
        return Err(PipelineError::new(format!(
            "class \"{key}\" has {} attempt(s); at least 2 are needed to appear in both subsets",
            members.len()
        )));
    }

    let test_total = ((test_fraction * total as f64) - FRACTION_EPSILON).ceil() as usize;
    let counts: Vec<usize> = groups.values().map(Vec::len).collect();
    let allocation = allocate(&counts, total, test_total);

    let mut rng = StdRng::seed_from_u64(seed);
    let mut train = Vec::with_capacity(total);
    let mut test = Vec::with_capacity(test_total);
    for (mut members, take) in groups.into_values().zip(allocation) {
        members.shuffle(&mut rng);
        let rest = members.split_off(take);
        test.extend(members);
        train.extend(rest);
    }
    Ok((train, test))
}

/// Largest-remainder share of `target` across strata, clamped so that every
/// stratum leaves at least one item on both sides.
fn allocate(counts: &[usize], total: usize, target: usize) -> Vec<usize> {
    let exact: Vec<f64> = counts
        .iter()
        .map(|&count| count as f64 * target as f64 / total.max(1) as f64)
        .collect();
    let mut shares: Vec<usize> = exact.iter().map(|value| value.floor() as usize).collect();
    let assigned: usize = shares.iter().sum();

    let mut order: Vec<usize> = (0..counts.len()).collect();
    // Stable sort keeps stratum order on equal remainders.
    order.sort_by(|&a, &b| {
        let ra = exact[a] - exact[a].floor();
        let rb = exact[b] - exact[b].floor();
        rb.total_cmp(&ra)
    });
    for &idx in order.iter().take(target.saturating_sub(assigned)) {
        shares[idx] += 1;
    }

    shares
        .iter()
        .zip(counts)
        .map(|(&share, &count)| share.clamp(1, count - 1))
        .collect()
}
