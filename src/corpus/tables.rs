// Metadata tables: genre labels and tick resolutions
//
// Both tables are produced by the external extraction stage and consumed
// read-only here. Their JSON shapes are fixed:
//   genre table:      {dataset: {track_id: [label, ...]}}
//   resolution table: {track_id: tpqn}

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::DataError;

/// Genre-label table: dataset name -> track id -> genre labels
///
/// A dataset is one of a small fixed set of label taxonomies applied to
/// the same corpus; each is an independent classification target set.
#[derive(Debug, Clone)]
pub struct GenreTable {
    datasets: HashMap<String, HashMap<String, Vec<String>>>,
}

impl GenreTable {
    /// Load the table from a JSON file
    ///
    /// A missing or malformed table is a configuration-level failure: the
    /// caller should treat it as fatal before the batch begins.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, DataError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|err| DataError::Unreadable {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })?;
        let datasets = serde_json::from_str(&contents).map_err(|err| DataError::Malformed {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })?;
        Ok(Self { datasets })
    }

    /// Labels for a track within one dataset, if any
    pub fn labels_for(&self, dataset: &str, track_id: &str) -> Option<&[String]> {
        self.datasets
            .get(dataset)?
            .get(track_id)
            .map(|labels| labels.as_slice())
    }

    /// Whether the table contains the named dataset at all
    pub fn has_dataset(&self, dataset: &str) -> bool {
        self.datasets.contains_key(dataset)
    }

    /// Names of the datasets present in the table
    pub fn dataset_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.datasets.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    #[cfg(test)]
    pub fn from_map(datasets: HashMap<String, HashMap<String, Vec<String>>>) -> Self {
        Self { datasets }
    }
}

/// Resolution table: track id -> ticks per quarter note
#[derive(Debug, Clone)]
pub struct ResolutionTable {
    resolutions: HashMap<String, u32>,
}

impl ResolutionTable {
    /// Load the table from a JSON file
    ///
    /// Non-positive entries are dropped with a warning; a track without a
    /// usable resolution is later excluded from aggregation.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, DataError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|err| DataError::Unreadable {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })?;
        let raw: HashMap<String, i64> =
            serde_json::from_str(&contents).map_err(|err| DataError::Malformed {
                path: path.to_path_buf(),
                reason: err.to_string(),
            })?;

        let mut resolutions = HashMap::with_capacity(raw.len());
        for (track_id, tpqn) in raw {
            match u32::try_from(tpqn) {
                Ok(tpqn) if tpqn > 0 => {
                    resolutions.insert(track_id, tpqn);
                }
                _ => {
                    log::warn!(
                        "Dropping non-positive resolution {} for track {}",
                        tpqn,
                        track_id
                    );
                }
            }
        }
        Ok(Self { resolutions })
    }

    /// Resolution for a track, if known
    pub fn tpqn_for(&self, track_id: &str) -> Option<u32> {
        self.resolutions.get(track_id).copied()
    }

    #[cfg(test)]
    pub fn from_map(resolutions: HashMap<String, u32>) -> Self {
        Self { resolutions }
    }
}
