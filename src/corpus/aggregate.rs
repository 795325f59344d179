// PatternAggregator - per-track signature profiles and label sets
//
// Scans the combined-pattern directory, joins each track against the
// metadata tables, encodes every length-eligible pattern instance, and
// accumulates signature counts into per-family profiles. Tracks
// contribute parallel (profile, label set) rows; a track with no
// non-empty signature in a family gets no row there.
//
// Per-item failures (missing metadata, malformed files) skip the track
// with a warning and an entry in the aggregation report; the batch always
// continues.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use crate::config::{CorpusConfig, EncodingConfig};
use crate::corpus::patterns::{discover_pattern_files, track_id_from_path, PatternFile, RawPattern};
use crate::corpus::tables::{GenreTable, ResolutionTable};
use crate::encoding::PatternEncoder;
use crate::error::{log_data_error, DataError};

/// Per-track signature occurrence counts
pub type SignatureProfile = BTreeMap<String, u64>;

/// Parallel per-track rows for one pattern family
#[derive(Debug, Clone, Default)]
pub struct FamilyAggregate {
    pub track_ids: Vec<String>,
    pub profiles: Vec<SignatureProfile>,
    pub label_sets: Vec<BTreeSet<String>>,
}

impl FamilyAggregate {
    fn push(&mut self, track_id: String, profile: SignatureProfile, labels: BTreeSet<String>) {
        self.track_ids.push(track_id);
        self.profiles.push(profile);
        self.label_sets.push(labels);
    }
}

/// One skipped track and the reason it was excluded
#[derive(Debug, Clone)]
pub struct SkippedTrack {
    pub track_id: String,
    pub reason: DataError,
}

/// Run-level accounting of the aggregation pass
#[derive(Debug, Clone, Default)]
pub struct AggregationReport {
    /// Pattern files found in the combined directory
    pub tracks_seen: usize,
    /// Tracks that contributed at least one family row
    pub tracks_aggregated: usize,
    pub skipped: Vec<SkippedTrack>,
}

/// Aggregation output: per-family rows plus the run report
#[derive(Debug, Clone, Default)]
pub struct CorpusAggregate {
    pub families: BTreeMap<String, FamilyAggregate>,
    pub report: AggregationReport,
}

/// Builds per-track signature profiles for every pattern family
pub struct PatternAggregator<'a> {
    encoder: PatternEncoder,
    genres: &'a GenreTable,
    resolutions: &'a ResolutionTable,
    corpus: &'a CorpusConfig,
    min_raw_events: usize,
    max_raw_events: usize,
}

impl<'a> PatternAggregator<'a> {
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

    /// Aggregate every track under `combined_dir`
    ///
    /// When `rhythm_dir` is given, a track must have a rhythm-pattern file
    /// of the same name or it is skipped entirely, and the rhythm
    /// signatures of its rhythm family key are merged into each of the
    /// track's family profiles.
    ///
    /// # Errors
    /// Only an unreadable `combined_dir` is fatal; everything per-track is
    /// reported and skipped.
    pub fn aggregate(
        &self,
        combined_dir: &Path,
        rhythm_dir: Option<&Path>,
    ) -> Result<CorpusAggregate, DataError> {
        let files = discover_pattern_files(combined_dir)?;
        let mut corpus = CorpusAggregate::default();
        corpus.report.tracks_seen = files.len();

        for path in files {
            let Some(track_id) = track_id_from_path(&path) else {
                continue;
            };
            match self.aggregate_track(&track_id, &path, rhythm_dir, &mut corpus.families) {
                Ok(contributed) => {
                    if contributed {
                        corpus.report.tracks_aggregated += 1;
                    }
                }
                Err(reason) => {
                    log_data_error(&reason, "aggregate");
                    corpus.report.skipped.push(SkippedTrack { track_id, reason });
                }
            }
        }

        log::info!(
            "Aggregated {}/{} tracks into {} famil{}",
            corpus.report.tracks_aggregated,
            corpus.report.tracks_seen,
            corpus.families.len(),
            if corpus.families.len() == 1 { "y" } else { "ies" }
        );
        Ok(corpus)
    }

    /// Process one track; returns whether it contributed any family row
    fn aggregate_track(
        &self,
        track_id: &str,
        combined_path: &Path,
        rhythm_dir: Option<&Path>,
        families: &mut BTreeMap<String, FamilyAggregate>,
    ) -> Result<bool, DataError> {
        let rhythm_path = rhythm_dir.map(|dir| {
            let file_name = combined_path.file_name().unwrap_or_default();
            dir.join(file_name)
        });
        if let Some(ref rhythm_path) = rhythm_path {
            if !rhythm_path.is_file() {
                return Err(DataError::MissingRhythmFile {
                    track_id: track_id.to_string(),
                });
            }
        }

        let dataset = &self.corpus.genre_dataset;
        let labels: BTreeSet<String> = self
            .genres
            .labels_for(dataset, track_id)
            .ok_or_else(|| DataError::MissingGenre {
                track_id: track_id.to_string(),
                dataset: dataset.clone(),
            })?
            .iter()
            .cloned()
            .collect();

        let tpqn = self
            .resolutions
            .tpqn_for(track_id)
            .ok_or_else(|| DataError::MissingResolution {
                track_id: track_id.to_string(),
            })?;

        let combined = PatternFile::load(combined_path, &self.corpus.reserved_keys)?;
        let rhythm_signatures = match rhythm_path {
            Some(ref path) => {
                let rhythm_file = PatternFile::load(path, &self.corpus.reserved_keys)?;
                self.encode_rhythm_family(&rhythm_file, tpqn)
            }
            None => Vec::new(),
        };

        let mut contributed = false;
        for (family, patterns) in &combined.families {
            let mut profile = SignatureProfile::new();

            for pattern in self.length_eligible(patterns) {
                if let Some(signature) = self.encoder.encode_combined(pattern, tpqn) {
                    *profile.entry(signature).or_insert(0) += 1;
                }
            }
            for signature in &rhythm_signatures {
                *profile.entry(signature.clone()).or_insert(0) += 1;
            }

            if !profile.is_empty() {
                families.entry(family.clone()).or_default().push(
                    track_id.to_string(),
                    profile,
                    labels.clone(),
                );
                contributed = true;
            }
        }
        Ok(contributed)
    }

    /// Rhythm-only signatures from the track's rhythm family key
    fn encode_rhythm_family(&self, rhythm_file: &PatternFile, tpqn: u32) -> Vec<String> {
        let Some(patterns) = rhythm_file.families.get(&self.corpus.rhythm_family_key) else {
            return Vec::new();
        };
        self.length_eligible(patterns)
            .filter_map(|pattern| self.encoder.encode_rhythm_only(pattern, tpqn))
            .collect()
    }

    fn length_eligible<'p>(
        &self,
        patterns: &'p [RawPattern],
    ) -> impl Iterator<Item = &'p RawPattern> {
        let min = self.min_raw_events;
        let max = self.max_raw_events;
        patterns
            .iter()
            .filter(move |p| p.len() >= min && p.len() <= max)
    }
}
