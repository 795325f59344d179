// Signature-count summary - descriptive statistics per genre
//
// The alternate entry point next to classification: instead of training
// anything, count how many tracks of each genre contain each rhythm-only
// signature. Signatures are deduplicated within a track before counting,
// so the count is "tracks containing", not raw occurrences. Output shape:
//   {dataset: {family: {genre: {signature: count}}}}

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use crate::config::{CorpusConfig, EncodingConfig};
use crate::corpus::patterns::{discover_pattern_files, track_id_from_path, PatternFile};
use crate::corpus::tables::{GenreTable, ResolutionTable};
use crate::corpus::{AggregationReport, SkippedTrack};
use crate::encoding::PatternEncoder;
use crate::error::{log_data_error, DataError};

/// dataset -> family -> genre -> signature -> number of tracks
pub type SignatureCountSummary =
    BTreeMap<String, BTreeMap<String, BTreeMap<String, BTreeMap<String, u64>>>>;

/// Counts rhythm-only signatures per genre across the corpus
pub struct SignatureCounter<'a> {
    encoder: PatternEncoder,
    genres: &'a GenreTable,
    resolutions: &'a ResolutionTable,
    corpus: &'a CorpusConfig,
    min_raw_events: usize,
    max_raw_events: usize,
}

impl<'a> SignatureCounter<'a> {
    pub fn new(
        encoding: &EncodingConfig,
        corpus: &'a CorpusConfig,
        genres: &'a GenreTable,
        resolutions: &'a ResolutionTable,
    ) -> Self {
        Self {
            encoder: PatternEncoder::new(encoding),
            genres,
            resolutions,
            corpus,
            min_raw_events: encoding.min_raw_events,
            max_raw_events: encoding.max_raw_events,
        }
    }

    /// Count signatures for every requested dataset
    ///
    /// A track absent from one dataset's label table is simply not
    /// counted there; a track absent from the resolution table (or with
    /// an unparsable file) is skipped with a warning.
    pub fn count(
        &self,
        patterns_dir: &Path,
        datasets: &[String],
    ) -> Result<(SignatureCountSummary, AggregationReport), DataError> {
        let files = discover_pattern_files(patterns_dir)?;
        let mut summary = SignatureCountSummary::new();
        let mut report = AggregationReport {
            tracks_seen: files.len(),
            ..AggregationReport::default()
        };

        for path in files {
            let Some(track_id) = track_id_from_path(&path) else {
                continue;
            };
            match self.count_track(&track_id, &path, datasets, &mut summary) {
                Ok(contributed) => {
                    if contributed {
                        report.tracks_aggregated += 1;
                    }
                }
                Err(reason) => {
                    log_data_error(&reason, "count_signatures");
                    report.skipped.push(SkippedTrack { track_id, reason });
                }
            }
        }
        Ok((summary, report))
    }

    fn count_track(
        &self,
        track_id: &str,
        path: &Path,
        datasets: &[String],
        summary: &mut SignatureCountSummary,
    ) -> Result<bool, DataError> {
        let tpqn = self
            .resolutions
            .tpqn_for(track_id)
            .ok_or_else(|| DataError::MissingResolution {
                track_id: track_id.to_string(),
            })?;

        let file = PatternFile::load(path, &self.corpus.reserved_keys)?;

        // Distinct signatures per family; shared by every dataset/genre
        // this track belongs to
        let mut family_signatures: BTreeMap<&str, BTreeSet<String>> = BTreeMap::new();
        for (family, patterns) in &file.families {
            let signatures: BTreeSet<String> = patterns
                .iter()
                .filter(|p| p.len() >= self.min_raw_events && p.len() <= self.max_raw_events)
                .filter_map(|pattern| self.encoder.encode_rhythm_only(pattern, tpqn))
                .collect();
            family_signatures.insert(family.as_str(), signatures);
        }

        let mut contributed = false;
        for dataset in datasets {
            let Some(labels) = self.genres.labels_for(dataset, track_id) else {
                continue;
            };
            for genre in labels {
                for (family, signatures) in &family_signatures {
                    let counts = summary
                        .entry(dataset.clone())
                        .or_default()
                        .entry((*family).to_string())
                        .or_default()
                        .entry(genre.clone())
                        .or_default();
                    for signature in signatures {
                        *counts.entry(signature.clone()).or_insert(0) += 1;
                    }
                }
            }
            contributed = true;
        }
        Ok(contributed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::fs;

    fn genre_table() -> GenreTable {
        let mut topmagd = HashMap::new();
        topmagd.insert("TRAAA".to_string(), vec!["Pop_Rock".to_string()]);
        topmagd.insert("TRBBB".to_string(), vec!["Pop_Rock".to_string()]);
        let mut masd = HashMap::new();
        masd.insert("TRAAA".to_string(), vec!["Metal_Alternative".to_string()]);
        let mut datasets = HashMap::new();
        datasets.insert("topmagd".to_string(), topmagd);
        datasets.insert("masd".to_string(), masd);
        GenreTable::from_map(datasets)
    }

    fn resolution_table() -> ResolutionTable {
        let mut map = HashMap::new();
        map.insert("TRAAA".to_string(), 24);
        map.insert("TRBBB".to_string(), 24);
        ResolutionTable::from_map(map)
    }

    // Two instances of the same rhythm; dedup keeps one per track
    const TRACK: &str = r#"{
        "PatternsRythm2": [
            [[0, 0], [6, 0], [12, 0]],
            [[0, 0], [6, 0], [12, 0]]
        ]
    }"#;

    #[test]
    fn test_counts_tracks_not_occurrences() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("TRAAA.json"), TRACK).unwrap();
        fs::write(dir.path().join("TRBBB.json"), TRACK).unwrap();

        let encoding = EncodingConfig::default();
        let corpus = CorpusConfig::default();
        let genres = genre_table();
        let resolutions = resolution_table();
        let counter = SignatureCounter::new(&encoding, &corpus, &genres, &resolutions);

        let (summary, report) = counter
            .count(dir.path(), &["topmagd".to_string()])
            .unwrap();

        // Both tracks contain 0|1|3 once each after per-track dedup
        assert_eq!(
            summary["topmagd"]["PatternsRythm2"]["Pop_Rock"]["0|1|3"],
            2
        );
        assert_eq!(report.tracks_aggregated, 2);
    }

    #[test]
    fn test_multiple_datasets_counted_independently() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("TRAAA.json"), TRACK).unwrap();

        let encoding = EncodingConfig::default();
        let corpus = CorpusConfig::default();
        let genres = genre_table();
        let resolutions = resolution_table();
        let counter = SignatureCounter::new(&encoding, &corpus, &genres, &resolutions);

        let (summary, _) = counter
            .count(dir.path(), &["topmagd".to_string(), "masd".to_string()])
            .unwrap();

        assert_eq!(summary["topmagd"]["PatternsRythm2"]["Pop_Rock"]["0|1|3"], 1);
        assert_eq!(
            summary["masd"]["PatternsRythm2"]["Metal_Alternative"]["0|1|3"],
            1
        );
    }

    #[test]
    fn test_track_without_resolution_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("TRZZZ.json"), TRACK).unwrap();

        let encoding = EncodingConfig::default();
        let corpus = CorpusConfig::default();
        let genres = genre_table();
        let resolutions = resolution_table();
        let counter = SignatureCounter::new(&encoding, &corpus, &genres, &resolutions);

        let (summary, report) = counter
            .count(dir.path(), &["topmagd".to_string()])
            .unwrap();

        assert!(summary.is_empty());
        assert_eq!(report.skipped.len(), 1);
        assert!(matches!(
            report.skipped[0].reason,
            DataError::MissingResolution { .. }
        ));
    }
}
