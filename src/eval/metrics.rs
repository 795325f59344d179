// Multi-label scoring criteria
//
// Two averaging modes over the per-label scores:
// - weighted: per-label metric averaged with the label's positive
//   support as weight
// - samples: per-row metric averaged over rows
//
// Accuracy is subset accuracy (a row counts only when every label
// matches). ROC-AUC is the rank-based Mann-Whitney statistic per label,
// with average ranks on ties; labels whose truth column lacks either
// class carry no information and are excluded from the weighted average.
// Divisions by an empty denominator yield 0, never NaN.

use ndarray::ArrayView2;

/// Fraction of rows whose entire label vector is predicted exactly
pub fn subset_accuracy(y_true: &ArrayView2<u8>, y_pred: &ArrayView2<u8>) -> f64 {
    let n_rows = y_true.nrows();
    if n_rows == 0 {
        return 0.0;
    }
    let exact = y_true
        .outer_iter()
        .zip(y_pred.outer_iter())
        .filter(|(truth, pred)| truth == pred)
        .count();
    exact as f64 / n_rows as f64
}

/// Support-weighted precision, recall and F1 over labels
pub fn weighted_precision_recall_f1(
    y_true: &ArrayView2<u8>,
    y_pred: &ArrayView2<u8>,
) -> (f64, f64, f64) {
    let n_labels = y_true.ncols();
    let mut weighted_precision = 0.0;
    let mut weighted_recall = 0.0;
    let mut weighted_f1 = 0.0;
    let mut total_support = 0.0;

    for label in 0..n_labels {
        let truth = y_true.column(label);
        let pred = y_pred.column(label);

        let mut tp = 0.0;
        let mut fp = 0.0;
        let mut fn_ = 0.0;
        for (&t, &p) in truth.iter().zip(pred.iter()) {
            match (t, p) {
                (1, 1) => tp += 1.0,
                (0, 1) => fp += 1.0,
                (1, 0) => fn_ += 1.0,
                _ => {}
            }
        }

        let support = tp + fn_;
        let precision = safe_div(tp, tp + fp);
        let recall = safe_div(tp, tp + fn_);
        let f1 = safe_div(2.0 * precision * recall, precision + recall);

        weighted_precision += support * precision;
        weighted_recall += support * recall;
        weighted_f1 += support * f1;
        total_support += support;
    }

    (
        safe_div(weighted_precision, total_support),
        safe_div(weighted_recall, total_support),
        safe_div(weighted_f1, total_support),
    )
}

/// Sample-averaged precision, recall and F1 over rows
pub fn samples_precision_recall_f1(
    y_true: &ArrayView2<u8>,
    y_pred: &ArrayView2<u8>,
) -> (f64, f64, f64) {
    let n_rows = y_true.nrows();
    if n_rows == 0 {
        return (0.0, 0.0, 0.0);
    }

    let mut sum_precision = 0.0;
    let mut sum_recall = 0.0;
    let mut sum_f1 = 0.0;

    for (truth, pred) in y_true.outer_iter().zip(y_pred.outer_iter()) {
        let intersection = truth
            .iter()
            .zip(pred.iter())
            .filter(|(&t, &p)| t == 1 && p == 1)
            .count() as f64;
        let n_true = truth.iter().filter(|&&t| t == 1).count() as f64;
        let n_pred = pred.iter().filter(|&&p| p == 1).count() as f64;

        let precision = safe_div(intersection, n_pred);
        let recall = safe_div(intersection, n_true);
        sum_precision += precision;
        sum_recall += recall;
        sum_f1 += safe_div(2.0 * precision * recall, precision + recall);
    }

    (
        sum_precision / n_rows as f64,
        sum_recall / n_rows as f64,
        sum_f1 / n_rows as f64,
    )
}

/// Support-weighted ROC-AUC over labels
///
/// # Returns
/// `None` when every label column is degenerate (single-class truth), so
/// the caller can omit the entry instead of recording an undefined value
pub fn weighted_roc_auc(y_true: &ArrayView2<u8>, scores: &ArrayView2<f64>) -> Option<f64> {
    let n_labels = y_true.ncols();
    let mut weighted_sum = 0.0;
    let mut total_support = 0.0;

    for label in 0..n_labels {
        let truth: Vec<u8> = y_true.column(label).iter().copied().collect();
        let column: Vec<f64> = scores.column(label).iter().copied().collect();
        let n_pos = truth.iter().filter(|&&t| t == 1).count();
        let n_neg = truth.len() - n_pos;
        if n_pos == 0 || n_neg == 0 {
            continue;
        }

        let auc = binary_roc_auc(&truth, &column);
        weighted_sum += n_pos as f64 * auc;
        total_support += n_pos as f64;
    }

    if total_support > 0.0 {
        Some(weighted_sum / total_support)
    } else {
        None
    }
}

/// Mann-Whitney AUC with average ranks on tied scores
///
/// The caller guarantees both classes are present.
fn binary_roc_auc(truth: &[u8], scores: &[f64]) -> f64 {
    let n = scores.len();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]));

    // Average rank per index, 1-based, ties share their mean rank
    let mut ranks = vec![0.0; n];
    let mut i = 0;
    while i < n {
        let mut j = i;
        while j + 1 < n && scores[order[j + 1]] == scores[order[i]] {
            j += 1;
        }
        let mean_rank = (i + 1 + j + 1) as f64 / 2.0;
        for &idx in &order[i..=j] {
            ranks[idx] = mean_rank;
        }
        i = j + 1;
    }

    let n_pos = truth.iter().filter(|&&t| t == 1).count() as f64;
    let n_neg = n as f64 - n_pos;
    let rank_sum: f64 = truth
        .iter()
        .zip(&ranks)
        .filter(|(&t, _)| t == 1)
        .map(|(_, &r)| r)
        .sum();

    (rank_sum - n_pos * (n_pos + 1.0) / 2.0) / (n_pos * n_neg)
}

fn safe_div(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}
