// Corpus module - metadata tables, pattern files, and aggregation
//
// Everything here consumes artifacts produced by the external extraction
// stage: the genre-label table, the tick-resolution table, and the
// per-track pattern files. The aggregator joins them into per-family
// signature profiles.

pub mod aggregate;
pub mod patterns;
pub mod tables;

pub use aggregate::{
    AggregationReport, CorpusAggregate, FamilyAggregate, PatternAggregator, SignatureProfile,
    SkippedTrack,
};
pub use patterns::{discover_pattern_files, track_id_from_path, PatternFile, RawPattern};
pub use tables::{GenreTable, ResolutionTable};
