//! Configuration management for the classification pipeline
//!
//! This module provides runtime configuration loading from JSON files,
//! enabling experiments with alternative resolution regimes and evaluation
//! settings without recompilation. Every quantization constant of the
//! encoding pipeline is an explicit parameter here rather than a
//! process-wide constant.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub encoding: EncodingConfig,
    pub corpus: CorpusConfig,
    pub eval: EvalConfig,
}

/// Tick normalization and signature encoding parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodingConfig {
    /// Standard fine resolution in units per quarter note; all signatures
    /// are expressed at this resolution
    pub fine_resolution: u32,
    /// Intermediate coarse resolution used by the rhythm-only policy
    /// before near-duplicate collapsing
    pub coarse_resolution: u32,
    /// Two rescaled ticks closer than this (at coarse resolution) are
    /// considered quantization jitter and collapsed
    pub dedup_threshold: i64,
    /// Ticks at or beyond this bound (at fine resolution) are dropped;
    /// scopes a pattern to roughly one bar
    pub max_tick: i64,
    /// A gap wider than this between consecutive final ticks rejects the
    /// pattern as not a single connected phrase
    pub max_gap: i64,
    /// Minimum number of ticks that must survive filtering
    pub min_ticks: usize,
    /// Minimum raw event count for a pattern to be encoded at all
    pub min_raw_events: usize,
    /// Maximum raw event count for a pattern to be encoded at all
    pub max_raw_events: usize,
    /// Divide rhythm-only signatures by the gcd of their ticks
    pub normalize_gcd: bool,
}

impl Default for EncodingConfig {
    fn default() -> Self {
        Self {
            fine_resolution: 6,
            coarse_resolution: 96,
            dedup_threshold: 3,
            max_tick: 22,
            max_gap: 24,
            min_ticks: 3,
            min_raw_events: 3,
            max_raw_events: 19,
            normalize_gcd: false,
        }
    }
}

/// Corpus scanning and metadata-join parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorpusConfig {
    /// Genre dataset (label taxonomy) used for classification runs
    pub genre_dataset: String,
    /// Pattern-family key holding rhythm-only extractions in the
    /// rhythm-pattern files
    pub rhythm_family_key: String,
    /// Diagnostic keys in pattern files that carry no pattern data
    pub reserved_keys: Vec<String>,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            genre_dataset: "topmagd".to_string(),
            rhythm_family_key: "PatternsRythm2".to_string(),
            reserved_keys: vec![
                "jsDsRhythm".to_string(),
                "dsChroma".to_string(),
                "status".to_string(),
            ],
        }
    }
}

/// Cross-validation and classifier training parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalConfig {
    /// Number of cross-validation folds
    pub n_folds: usize,
    /// Inverse L2 regularization strength (larger = weaker regularization)
    pub c: f64,
    /// Iteration cap for the gradient-descent solver
    pub max_iterations: usize,
    /// Solver stops once the gradient norm falls below this
    pub tolerance: f64,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            n_folds: 5,
            c: 1.0,
            max_iterations: 500,
            tolerance: 1e-4,
        }
    }
}

impl AppConfig {
    /// Load configuration from a JSON file
    ///
    /// # Arguments
    /// * `path` - Path to JSON config file
    ///
    /// # Returns
    /// Loaded configuration; falls back to defaults with a logged warning
    /// if the file is missing or invalid
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    log::info!("[Config] Loaded configuration from {:?}", path.as_ref());
                    config
                }
                Err(err) => {
                    log::warn!(
                        "[Config] Failed to parse JSON from {:?}: {}. Using defaults.",
                        path.as_ref(),
                        err
                    );
                    Self::default()
                }
            },
            Err(err) => {
                log::warn!(
                    "[Config] Failed to read config file {:?}: {}. Using defaults.",
                    path.as_ref(),
                    err
                );
                Self::default()
            }
        }
    }
}
