// Genre Patterns - pattern-signature genre classification
//
// Batch pipeline over a symbolic-music corpus: canonicalize extracted
// note patterns into discrete signatures, aggregate per-track signature
// counts, and cross-validate one-vs-rest genre classifiers against them.

// Module declarations
pub mod config;
pub mod corpus;
pub mod encoding;
pub mod error;
pub mod eval;
pub mod features;
pub mod report;
pub mod store;

// Re-exports for convenience
pub use config::AppConfig;
pub use corpus::{CorpusAggregate, GenreTable, PatternAggregator, ResolutionTable};
pub use encoding::{PatternEncoder, TickNormalizer};
pub use eval::CrossValidatedEvaluator;
pub use features::build_family_matrices;
pub use report::SignatureCounter;
pub use store::ResultsStore;
