// FeatureBuilder - sparse count matrices and binarized label targets
//
// Converts the per-track signature profiles of one pattern family into a
// sparse numeric feature matrix (one column per distinct signature
// observed in that family) and the parallel multi-label genre targets
// into a 0/1 indicator matrix. Both vocabularies are discovered from the
// data and fixed once fitted; fits are family-local and never shared
// across families.

use std::collections::{BTreeSet, HashMap};

use ndarray::Array2;

use crate::corpus::{FamilyAggregate, SignatureProfile};

/// Compressed sparse row matrix of f64 values
///
/// Signature-count matrices are overwhelmingly sparse (each track holds a
/// handful of the corpus-wide vocabulary), so rows store only their
/// non-zero columns. Column indices within a row are ascending.
#[derive(Debug, Clone)]
pub struct CsrMatrix {
    n_rows: usize,
    n_cols: usize,
    indptr: Vec<usize>,
    indices: Vec<usize>,
    values: Vec<f64>,
}

impl CsrMatrix {
    /// Build from per-row (column, value) pairs, ascending by column
    pub fn from_rows(n_cols: usize, rows: &[Vec<(usize, f64)>]) -> Self {
        let mut indptr = Vec::with_capacity(rows.len() + 1);
        let mut indices = Vec::new();
        let mut values = Vec::new();

        indptr.push(0);
        for row in rows {
            for &(col, value) in row {
                debug_assert!(col < n_cols);
                indices.push(col);
                values.push(value);
            }
            indptr.push(indices.len());
        }

        Self {
            n_rows: rows.len(),
            n_cols,
            indptr,
            indices,
            values,
        }
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    /// Non-zero entries of one row as parallel (columns, values) slices
    pub fn row(&self, row: usize) -> (&[usize], &[f64]) {
        let start = self.indptr[row];
        let end = self.indptr[row + 1];
        (&self.indices[start..end], &self.values[start..end])
    }

    /// New matrix holding the given rows, in the given order
    ///
    /// Used to split the corpus matrix into train/test fold partitions.
    pub fn select_rows(&self, rows: &[usize]) -> Self {
        let mut indptr = Vec::with_capacity(rows.len() + 1);
        let mut indices = Vec::new();
        let mut values = Vec::new();

        indptr.push(0);
        for &row in rows {
            let (cols, vals) = self.row(row);
            indices.extend_from_slice(cols);
            values.extend_from_slice(vals);
            indptr.push(indices.len());
        }

        Self {
            n_rows: rows.len(),
            n_cols: self.n_cols,
            indptr,
            indices,
            values,
        }
    }

    /// Dot product of one row with a dense vector
    pub fn row_dot(&self, row: usize, dense: &[f64]) -> f64 {
        let (cols, vals) = self.row(row);
        cols.iter()
            .zip(vals)
            .map(|(&col, &val)| val * dense[col])
            .sum()
    }

    /// Largest squared L2 norm over all rows
    pub fn max_row_sq_norm(&self) -> f64 {
        (0..self.n_rows)
            .map(|row| self.row(row).1.iter().map(|v| v * v).sum::<f64>())
            .fold(0.0, f64::max)
    }
}

/// Assigns one feature column per distinct signature
///
/// Mirrors a categorical dict-vectorizer: the vocabulary is the sorted
/// union of all signatures observed during `fit`, and `transform` maps
/// only known signatures, so unseen columns can never appear afterwards.
#[derive(Debug, Clone)]
pub struct SignatureVectorizer {
    vocabulary: Vec<String>,
    index: HashMap<String, usize>,
}

impl SignatureVectorizer {
    /// Discover the sorted signature vocabulary of one family
    pub fn fit(profiles: &[SignatureProfile]) -> Self {
        let distinct: BTreeSet<&str> = profiles
            .iter()
            .flat_map(|profile| profile.keys().map(String::as_str))
            .collect();
        let vocabulary: Vec<String> = distinct.into_iter().map(str::to_string).collect();
        let index = vocabulary
            .iter()
            .enumerate()
            .map(|(i, sig)| (sig.clone(), i))
            .collect();
        Self { vocabulary, index }
    }

    /// Count matrix for the given profiles, one row each
    pub fn transform(&self, profiles: &[SignatureProfile]) -> CsrMatrix {
        let rows: Vec<Vec<(usize, f64)>> = profiles
            .iter()
            .map(|profile| {
                // BTreeMap iteration is sorted, and vocabulary indices
                // follow the same order, so columns come out ascending
                profile
                    .iter()
                    .filter_map(|(sig, &count)| {
                        self.index.get(sig).map(|&col| (col, count as f64))
                    })
                    .collect()
            })
            .collect();
        CsrMatrix::from_rows(self.vocabulary.len(), &rows)
    }

    pub fn vocabulary(&self) -> &[String] {
        &self.vocabulary
    }
}

/// Binarizes multi-label genre sets into a 0/1 indicator matrix
#[derive(Debug, Clone)]
pub struct LabelBinarizer {
    classes: Vec<String>,
}

impl LabelBinarizer {
    /// Discover the sorted union of observed labels
    pub fn fit(label_sets: &[BTreeSet<String>]) -> Self {
        let distinct: BTreeSet<&str> = label_sets
            .iter()
            .flat_map(|set| set.iter().map(String::as_str))
            .collect();
        Self {
            classes: distinct.into_iter().map(str::to_string).collect(),
        }
    }

    /// Indicator matrix aligned row-for-row with the input
    pub fn transform(&self, label_sets: &[BTreeSet<String>]) -> Array2<u8> {
        let mut matrix = Array2::zeros((label_sets.len(), self.classes.len()));
        for (row, labels) in label_sets.iter().enumerate() {
            for (col, class) in self.classes.iter().enumerate() {
                if labels.contains(class) {
                    matrix[[row, col]] = 1;
                }
            }
        }
        matrix
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }
}

/// Fitted matrices for one pattern family
#[derive(Debug, Clone)]
pub struct FamilyMatrices {
    pub features: CsrMatrix,
    pub labels: Array2<u8>,
    pub signatures: Vec<String>,
    pub classes: Vec<String>,
}

/// Fit both vectorizers on one family and transform its rows
pub fn build_family_matrices(aggregate: &FamilyAggregate) -> FamilyMatrices {
    let vectorizer = SignatureVectorizer::fit(&aggregate.profiles);
    let binarizer = LabelBinarizer::fit(&aggregate.label_sets);
    FamilyMatrices {
        features: vectorizer.transform(&aggregate.profiles),
        labels: binarizer.transform(&aggregate.label_sets),
        signatures: vectorizer.vocabulary().to_vec(),
        classes: binarizer.classes().to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(entries: &[(&str, u64)]) -> SignatureProfile {
        entries
            .iter()
            .map(|(sig, count)| (sig.to_string(), *count))
            .collect()
    }

    fn labels(entries: &[&str]) -> BTreeSet<String> {
        entries.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_vectorizer_sorted_vocabulary() {
        let profiles = vec![profile(&[("0|2|4", 1)]), profile(&[("0|1|3", 2), ("0|2|4", 1)])];
        let vectorizer = SignatureVectorizer::fit(&profiles);
        assert_eq!(vectorizer.vocabulary(), &["0|1|3", "0|2|4"]);
    }

    #[test]
    fn test_vectorizer_counts_and_zeros() {
        let profiles = vec![
            profile(&[("a", 3)]),
            profile(&[("b", 1), ("c", 5)]),
        ];
        let vectorizer = SignatureVectorizer::fit(&profiles);
        let matrix = vectorizer.transform(&profiles);

        assert_eq!(matrix.n_rows(), 2);
        assert_eq!(matrix.n_cols(), 3);
        assert_eq!(matrix.row(0), (&[0usize][..], &[3.0][..]));
        assert_eq!(matrix.row(1), (&[1usize, 2][..], &[1.0, 5.0][..]));
        assert_eq!(matrix.row_dot(0, &[1.0, 1.0, 1.0]), 3.0);
        assert_eq!(matrix.row_dot(1, &[0.0, 2.0, 1.0]), 7.0);
    }

    #[test]
    fn test_vectorizer_ignores_unseen_signatures() {
        let fitted = vec![profile(&[("a", 1)])];
        let vectorizer = SignatureVectorizer::fit(&fitted);
        let other = vec![profile(&[("a", 2), ("zzz", 9)])];
        let matrix = vectorizer.transform(&other);

        // The unseen signature gets no column
        assert_eq!(matrix.n_cols(), 1);
        assert_eq!(matrix.row(0), (&[0usize][..], &[2.0][..]));
    }

    #[test]
    fn test_binarizer_alignment() {
        let sets = vec![labels(&["Pop_Rock"]), labels(&["Jazz", "Pop_Rock"]), labels(&[])];
        let binarizer = LabelBinarizer::fit(&sets);
        assert_eq!(binarizer.classes(), &["Jazz", "Pop_Rock"]);

        let matrix = binarizer.transform(&sets);
        assert_eq!(matrix.shape(), &[3, 2]);
        assert_eq!(matrix[[0, 0]], 0);
        assert_eq!(matrix[[0, 1]], 1);
        assert_eq!(matrix[[1, 0]], 1);
        assert_eq!(matrix[[1, 1]], 1);
        assert_eq!(matrix[[2, 0]], 0);
        assert_eq!(matrix[[2, 1]], 0);
    }

    #[test]
    fn test_select_rows() {
        let rows = vec![
            vec![(0, 1.0)],
            vec![(1, 2.0)],
            vec![(0, 3.0), (2, 4.0)],
        ];
        let matrix = CsrMatrix::from_rows(3, &rows);
        let subset = matrix.select_rows(&[2, 0]);

        assert_eq!(subset.n_rows(), 2);
        assert_eq!(subset.row(0), (&[0usize, 2][..], &[3.0, 4.0][..]));
        assert_eq!(subset.row(1), (&[0usize][..], &[1.0][..]));
    }

    #[test]
    fn test_max_row_sq_norm() {
        let rows = vec![vec![(0, 3.0), (1, 4.0)], vec![(2, 1.0)]];
        let matrix = CsrMatrix::from_rows(3, &rows);
        assert_eq!(matrix.max_row_sq_norm(), 25.0);
    }
}
