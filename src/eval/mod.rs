// Evaluation module - cross-validated one-vs-rest classification
//
// Pipeline per pattern family:
//   FamilyMatrices -> stratified folds -> OneVsRest fit per fold ->
//   scoring criteria per split -> ResultsStore checkpoint
//
// Families are evaluated one at a time; after each family the
// accumulated results are persisted before the next family begins, so an
// interrupted multi-family run keeps everything already computed.

use std::io;

use ndarray::Array2;

use crate::config::EvalConfig;
use crate::corpus::CorpusAggregate;
use crate::error::{log_eval_error, EvalError};
use crate::features::{build_family_matrices, CsrMatrix, FamilyMatrices};
use crate::store::{FamilyScores, ResultsStore};

pub mod kfold;
pub mod logistic;
pub mod metrics;

use kfold::{complement, stratified_folds};
use logistic::{OneVsRest, TrainConfig};

/// One skipped family and why it could not be evaluated
#[derive(Debug, Clone)]
pub struct SkippedFamily {
    pub family: String,
    pub reason: EvalError,
}

/// Outcome of a full evaluation run
#[derive(Debug, Clone, Default)]
pub struct EvaluationRun {
    pub evaluated: Vec<String>,
    pub skipped: Vec<SkippedFamily>,
}

/// Cross-validates a one-vs-rest classifier per pattern family
#[derive(Debug, Clone)]
pub struct CrossValidatedEvaluator {
    n_folds: usize,
    train_config: TrainConfig,
}

impl CrossValidatedEvaluator {
    pub fn new(config: &EvalConfig) -> Self {
        Self {
            n_folds: config.n_folds,
            train_config: TrainConfig::from_eval(config),
        }
    }

    /// Evaluate every family of the aggregated corpus
    ///
    /// Results are recorded family by family through the store
    /// (write-through checkpointing). Degenerate families are skipped
    /// with a logged reason; only a persistence failure is fatal.
    pub fn evaluate_corpus(
        &self,
        corpus: &CorpusAggregate,
        store: &mut ResultsStore,
    ) -> io::Result<EvaluationRun> {
        let mut run = EvaluationRun::default();

        for (family, aggregate) in &corpus.families {
            let matrices = build_family_matrices(aggregate);
            match self.evaluate_family(family, &matrices) {
                Ok(scores) => {
                    store.record(family, scores)?;
                    log::info!(
                        "Evaluated family {} ({} tracks, {} signatures, {} classes)",
                        family,
                        matrices.features.n_rows(),
                        matrices.signatures.len(),
                        matrices.classes.len()
                    );
                    run.evaluated.push(family.clone());
                }
                Err(reason) => {
                    log_eval_error(&reason, "evaluate_corpus");
                    run.skipped.push(SkippedFamily {
                        family: family.clone(),
                        reason,
                    });
                }
            }
        }
        Ok(run)
    }

    /// Cross-validate one family
    ///
    /// # Errors
    /// [`EvalError`] when the family cannot be cross-validated: fewer
    /// than 2 observed classes, an empty feature matrix, or fewer tracks
    /// than folds.
    pub fn evaluate_family(
        &self,
        family: &str,
        matrices: &FamilyMatrices,
    ) -> Result<FamilyScores, EvalError> {
        let n_rows = matrices.features.n_rows();

        if matrices.classes.len() < 2 {
            return Err(EvalError::DegenerateLabels {
                family: family.to_string(),
                classes: matrices.classes.len(),
            });
        }
        if n_rows == 0 || matrices.features.n_cols() == 0 {
            return Err(EvalError::EmptyFeatures {
                family: family.to_string(),
            });
        }
        if n_rows < self.n_folds {
            return Err(EvalError::TooFewRows {
                family: family.to_string(),
                rows: n_rows,
                folds: self.n_folds,
            });
        }

        let folds = stratified_folds(&matrices.labels.view(), self.n_folds);
        let mut scores = FamilyScores::new();

        for test_rows in &folds {
            let train_rows = complement(n_rows, test_rows);

            let x_train = matrices.features.select_rows(&train_rows);
            let y_train = select_label_rows(&matrices.labels, &train_rows);
            let x_test = matrices.features.select_rows(test_rows);
            let y_test = select_label_rows(&matrices.labels, test_rows);

            let model = OneVsRest::fit(&x_train, &y_train.view(), &self.train_config);
            record_split(&mut scores, "train", &model, &x_train, &y_train);
            record_split(&mut scores, "test", &model, &x_test, &y_test);
        }

        Ok(scores)
    }
}

/// Score one partition and append the per-fold values
fn record_split(
    scores: &mut FamilyScores,
    split: &str,
    model: &OneVsRest,
    features: &CsrMatrix,
    labels: &Array2<u8>,
) {
    let predictions = model.predict(features);
    let decision = model.decision_matrix(features);
    let truth = labels.view();
    let pred = predictions.view();

    let (precision, recall, f1_weighted) = metrics::weighted_precision_recall_f1(&truth, &pred);
    let (prec_samples, rec_samples, f1_samples) = metrics::samples_precision_recall_f1(&truth, &pred);

    push(scores, split, "precision", precision);
    push(scores, split, "recall", recall);
    push(scores, split, "accuracy", metrics::subset_accuracy(&truth, &pred));
    push(scores, split, "prec_sampl", prec_samples);
    push(scores, split, "rec_sampl", rec_samples);
    push(scores, split, "f1_samples", f1_samples);
    push(scores, split, "f1_weighted", f1_weighted);
    if let Some(auc) = metrics::weighted_roc_auc(&truth, &decision.view()) {
        push(scores, split, "roc_auc", auc);
    }
}

fn push(scores: &mut FamilyScores, split: &str, name: &str, value: f64) {
    scores
        .entry(format!("{}_{}", split, name))
        .or_default()
        .push(value);
}

fn select_label_rows(labels: &Array2<u8>, rows: &[usize]) -> Array2<u8> {
    let n_cols = labels.ncols();
    let mut selected = Array2::zeros((rows.len(), n_cols));
    for (out_row, &src_row) in rows.iter().enumerate() {
        for col in 0..n_cols {
            selected[[out_row, col]] = labels[[src_row, col]];
        }
    }
    selected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::FamilyAggregate;
    use std::collections::BTreeSet;

    fn eval_config(n_folds: usize) -> EvalConfig {
        EvalConfig {
            n_folds,
            ..EvalConfig::default()
        }
    }

    /// Family where signature "a" marks Rock tracks and "b" marks Jazz
    fn separable_family(tracks_per_genre: usize) -> FamilyAggregate {
        let mut aggregate = FamilyAggregate::default();
        for i in 0..tracks_per_genre {
            aggregate.track_ids.push(format!("TRROCK{}", i));
            aggregate
                .profiles
                .push([("a".to_string(), 2 + (i as u64 % 3))].into_iter().collect());
            aggregate
                .label_sets
                .push(BTreeSet::from(["Rock".to_string()]));

            aggregate.track_ids.push(format!("TRJAZZ{}", i));
            aggregate
                .profiles
                .push([("b".to_string(), 1 + (i as u64 % 2))].into_iter().collect());
            aggregate
                .label_sets
                .push(BTreeSet::from(["Jazz".to_string()]));
        }
        aggregate
    }

    #[test]
    fn test_evaluate_family_records_all_metrics_per_fold() {
        let evaluator = CrossValidatedEvaluator::new(&eval_config(3));
        let matrices = build_family_matrices(&separable_family(6));
        let scores = evaluator.evaluate_family("Patterns5", &matrices).unwrap();

        for split in ["train", "test"] {
            for name in [
                "precision",
                "recall",
                "accuracy",
                "prec_sampl",
                "rec_sampl",
                "f1_samples",
                "f1_weighted",
                "roc_auc",
            ] {
                let key = format!("{}_{}", split, name);
                let values = scores.get(&key).unwrap_or_else(|| panic!("missing {}", key));
                assert_eq!(values.len(), 3, "{} per-fold length", key);
                for &value in values {
                    assert!(value.is_finite(), "{} produced {}", key, value);
                    assert!((0.0..=1.0).contains(&value), "{} out of range: {}", key, value);
                }
            }
        }
    }

    #[test]
    fn test_separable_family_scores_high() {
        let evaluator = CrossValidatedEvaluator::new(&eval_config(3));
        let matrices = build_family_matrices(&separable_family(9));
        let scores = evaluator.evaluate_family("Patterns5", &matrices).unwrap();

        for &accuracy in &scores["test_accuracy"] {
            assert!(accuracy > 0.9, "separable data scored {}", accuracy);
        }
        for &auc in &scores["test_roc_auc"] {
            assert!(auc > 0.9, "separable data AUC {}", auc);
        }
    }

    #[test]
    fn test_single_class_family_is_skipped() {
        let mut aggregate = FamilyAggregate::default();
        for i in 0..8 {
            aggregate.track_ids.push(format!("TR{}", i));
            aggregate
                .profiles
                .push([("a".to_string(), 1)].into_iter().collect());
            aggregate
                .label_sets
                .push(BTreeSet::from(["Rock".to_string()]));
        }

        let evaluator = CrossValidatedEvaluator::new(&eval_config(3));
        let matrices = build_family_matrices(&aggregate);
        let err = evaluator.evaluate_family("Patterns5", &matrices).unwrap_err();
        assert!(matches!(err, EvalError::DegenerateLabels { classes: 1, .. }));
    }

    #[test]
    fn test_too_few_rows_is_skipped() {
        let evaluator = CrossValidatedEvaluator::new(&eval_config(5));
        let matrices = build_family_matrices(&separable_family(2));
        let err = evaluator.evaluate_family("Patterns5", &matrices).unwrap_err();
        assert!(matches!(err, EvalError::TooFewRows { rows: 4, folds: 5, .. }));
    }

    #[test]
    fn test_evaluate_corpus_checkpoints_and_reports() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.json");

        let mut corpus = CorpusAggregate::default();
        corpus
            .families
            .insert("Patterns5".to_string(), separable_family(6));
        // Degenerate family: one class only
        let mut degenerate = FamilyAggregate::default();
        for i in 0..6 {
            degenerate.track_ids.push(format!("TR{}", i));
            degenerate
                .profiles
                .push([("z".to_string(), 1)].into_iter().collect());
            degenerate
                .label_sets
                .push(BTreeSet::from(["Rock".to_string()]));
        }
        corpus.families.insert("Patterns9".to_string(), degenerate);

        let evaluator = CrossValidatedEvaluator::new(&eval_config(3));
        let mut store = ResultsStore::new(&path);
        let run = evaluator.evaluate_corpus(&corpus, &mut store).unwrap();

        assert_eq!(run.evaluated, vec!["Patterns5"]);
        assert_eq!(run.skipped.len(), 1);
        assert_eq!(run.skipped[0].family, "Patterns9");

        let on_disk: std::collections::BTreeMap<String, FamilyScores> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert!(on_disk.contains_key("Patterns5"));
        assert!(!on_disk.contains_key("Patterns9"));
    }
}
