// ResultsStore - incremental persistence of cross-validation results
//
// The evaluator records one family at a time; after every record the full
// accumulated document is rewritten through a temp-file-and-rename, so
// the results file on disk is always a complete, valid JSON document
// containing every family processed so far. A crash between families
// loses nothing that was already recorded.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Per-family scores: metric-name(+split) -> per-fold values
pub type FamilyScores = BTreeMap<String, Vec<f64>>;

/// Durable store for per-family cross-validation results
#[derive(Debug)]
pub struct ResultsStore {
    path: PathBuf,
    results: BTreeMap<String, FamilyScores>,
}

impl ResultsStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            results: BTreeMap::new(),
        }
    }

    /// Merge one family's scores and immediately persist everything
    ///
    /// Recording the same family twice overwrites its previous entry.
    pub fn record(&mut self, family: &str, scores: FamilyScores) -> io::Result<()> {
        self.results.insert(family.to_string(), scores);
        self.checkpoint()
    }

    /// Rewrite the results file atomically
    ///
    /// Serializes to a sibling temp file first and renames it over the
    /// destination, so readers never observe a torn document.
    fn checkpoint(&self) -> io::Result<()> {
        let json = serde_json::to_string_pretty(&self.results)
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;

        let file_name = self
            .path
            .file_name()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "results path has no file name"))?;
        let tmp_path = self
            .path
            .with_file_name(format!("{}.tmp", file_name.to_string_lossy()));

        fs::write(&tmp_path, json)?;
        fs::rename(&tmp_path, &self.path)
    }

    /// Families recorded so far
    pub fn results(&self) -> &BTreeMap<String, FamilyScores> {
        &self.results
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
