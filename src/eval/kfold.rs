// Stratified k-fold splitting for multi-label targets
//
// Plain k-fold can starve a fold of a rare label combination entirely.
// Exact stratification is impossible in general for multi-label data, so
// rows are grouped by their exact label combination and each group is
// dealt round-robin across the folds: every fold receives close to the
// same share of every combination, which preserves class proportions as
// closely as feasible.
//
// The split is fully deterministic: groups are visited in combination
// order and rows within a group in row order.

use ndarray::ArrayView2;
use std::collections::BTreeMap;

/// Test-row indices for each of `n_folds` folds
///
/// Every row index appears in exactly one fold. `n_folds` must be >= 2
/// and <= the number of rows; the caller validates this.
pub fn stratified_folds(labels: &ArrayView2<u8>, n_folds: usize) -> Vec<Vec<usize>> {
    let mut groups: BTreeMap<Vec<u8>, Vec<usize>> = BTreeMap::new();
    for (row, combination) in labels.outer_iter().enumerate() {
        groups
            .entry(combination.iter().copied().collect())
            .or_default()
            .push(row);
    }

    let mut folds: Vec<Vec<usize>> = vec![Vec::new(); n_folds];
    let mut cursor = 0usize;
    for rows in groups.values() {
        for &row in rows {
            folds[cursor % n_folds].push(row);
            cursor += 1;
        }
    }

    for fold in &mut folds {
        fold.sort_unstable();
    }
    folds
}

/// All row indices not present in `test_rows`
pub fn complement(n_rows: usize, test_rows: &[usize]) -> Vec<usize> {
    let mut in_test = vec![false; n_rows];
    for &row in test_rows {
        in_test[row] = true;
    }
    (0..n_rows).filter(|&row| !in_test[row]).collect()
}
