// Per-track pattern files
//
// A pattern file maps pattern-family keys to lists of raw patterns, where
// each raw pattern is a list of [tick, pitch] pairs. The extraction stage
// also writes reserved diagnostic keys (status flags and the like) that
// carry no pattern data; those are skipped during parsing regardless of
// their JSON shape.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::encoding::PatternEvent;
use crate::error::DataError;

/// One extracted pattern instance: ordered (tick, pitch) events
pub type RawPattern = Vec<PatternEvent>;

/// Parsed per-track pattern file: family key -> pattern instances
///
/// BTreeMap keeps family iteration deterministic across runs.
#[derive(Debug, Clone, Default)]
pub struct PatternFile {
    pub families: BTreeMap<String, Vec<RawPattern>>,
}

impl PatternFile {
    /// Load and parse one pattern file
    ///
    /// Reserved keys are dropped. Any non-reserved key whose value is not
    /// a pattern list makes the whole file malformed; the caller skips
    /// the track and the batch continues.
    pub fn load(path: &Path, reserved_keys: &[String]) -> Result<Self, DataError> {
        let contents = fs::read_to_string(path).map_err(|err| DataError::Unreadable {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })?;
        let raw: BTreeMap<String, serde_json::Value> =
            serde_json::from_str(&contents).map_err(|err| DataError::Malformed {
                path: path.to_path_buf(),
                reason: err.to_string(),
            })?;

        let mut families = BTreeMap::new();
        for (key, value) in raw {
            if reserved_keys.iter().any(|reserved| reserved == &key) {
                continue;
            }
            let patterns: Vec<RawPattern> =
                serde_json::from_value(value).map_err(|err| DataError::Malformed {
                    path: path.to_path_buf(),
                    reason: format!("family {}: {}", key, err),
                })?;
            families.insert(key, patterns);
        }
        Ok(Self { families })
    }
}

/// Derive the track id from a pattern file path (the file stem)
pub fn track_id_from_path(path: &Path) -> Option<String> {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .map(str::to_string)
}

/// List the pattern files in a directory, sorted by filename
///
/// Sorting keeps skip reports and aggregation order deterministic.
pub fn discover_pattern_files(dir: &Path) -> Result<Vec<std::path::PathBuf>, DataError> {
    let entries = fs::read_dir(dir).map_err(|err| DataError::Unreadable {
        path: dir.to_path_buf(),
        reason: err.to_string(),
    })?;

    let mut files: Vec<std::path::PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    files.sort();
    Ok(files)
}
