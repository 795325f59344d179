// Encoding module - tick normalization and signature serialization
//
// Pipeline: TickNormalizer -> PatternEncoder
// Raw (tick, pitch) sequences become canonical string signatures that are
// comparable across tracks with different native resolutions.

pub mod encoder;
pub mod normalizer;

pub use encoder::{PatternEncoder, PatternEvent};
pub use normalizer::TickNormalizer;
