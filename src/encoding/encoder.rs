// PatternEncoder - canonical string signatures for note patterns
//
// Serializes a normalized tick sequence (optionally paired with pitch
// values) into a canonical signature. Two signatures are equal iff their
// normalized event sequences are identical, which makes signatures usable
// as bag-of-patterns keys.
//
// Two policies:
// - Combined: pitch and rhythm together, `(tick|pitch)` tokens
// - Rhythm-only: tick component alone, `|`-joined integers
//
// The combined policy intentionally skips the collapse/range/gap filtering
// that the rhythm-only policy applies; closely-spaced events remain
// distinguishable there because pitch is part of the token.

use crate::config::EncodingConfig;
use crate::encoding::normalizer::TickNormalizer;

/// One extracted note occurrence: (tick, pitch-or-voice)
pub type PatternEvent = (i64, i64);

/// Encodes raw patterns into canonical discrete signatures
#[derive(Debug, Clone)]
pub struct PatternEncoder {
    normalizer: TickNormalizer,
    normalize_gcd: bool,
}

impl PatternEncoder {
    /// Create an encoder from the encoding configuration
    pub fn new(config: &EncodingConfig) -> Self {
        Self {
            normalizer: TickNormalizer::new(config),
            normalize_gcd: config.normalize_gcd,
        }
    }

    /// Encode a pattern under the combined (pitch + rhythm) policy
    ///
    /// Ticks are offset and rescaled straight to the fine resolution, then
    /// each surviving (tick, pitch) pair becomes a `(tick|pitch)` token,
    /// concatenated in order with no separator.
    ///
    /// # Returns
    /// The signature, or `None` for an unencodable instance (empty input
    /// or zero tpqn)
    pub fn encode_combined(&self, events: &[PatternEvent], tpqn: u32) -> Option<String> {
        let ticks: Vec<i64> = events.iter().map(|(tick, _)| *tick).collect();
        let rescaled = self.normalizer.rescale_fine(&ticks, tpqn)?;

        let mut encoded = String::new();
        for (tick, (_, pitch)) in rescaled.iter().zip(events) {
            encoded.push('(');
            encoded.push_str(&tick.to_string());
            encoded.push('|');
            encoded.push_str(&pitch.to_string());
            encoded.push(')');
        }
        Some(encoded)
    }

    /// Encode a pattern under the rhythm-only policy
    ///
    /// The tick component alone goes through the full normalization
    /// pipeline (coarse rescale, near-duplicate collapse, fine rescale,
    /// range filter, optional gcd normalization, gap check); pitch is
    /// discarded. Surviving ticks are serialized `|`-joined.
    ///
    /// # Returns
    /// The signature, or `None` when the normalizer rejects the pattern
    pub fn encode_rhythm_only(&self, events: &[PatternEvent], tpqn: u32) -> Option<String> {
        let ticks: Vec<i64> = events.iter().map(|(tick, _)| *tick).collect();
        self.encode_ticks(&ticks, tpqn)
    }

    /// Encode a bare tick sequence under the rhythm-only policy
    pub fn encode_ticks(&self, ticks: &[i64], tpqn: u32) -> Option<String> {
        let normalized = self.normalizer.normalize(ticks, tpqn, self.normalize_gcd)?;
        Some(
            normalized
                .iter()
                .map(|t| t.to_string())
                .collect::<Vec<_>>()
                .join("|"),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoder() -> PatternEncoder {
        PatternEncoder::new(&EncodingConfig::default())
    }

    fn normalizing_encoder() -> PatternEncoder {
        let config = EncodingConfig {
            normalize_gcd: true,
            ..EncodingConfig::default()
        };
        PatternEncoder::new(&config)
    }

    #[test]
    fn test_combined_literal_signature() {
        // tpqn 24 with fine resolution 6: every tick divided by 4
        let events = vec![(0, 60), (12, 64), (24, 60)];
        assert_eq!(
            encoder().encode_combined(&events, 24),
            Some("(0|60)(3|64)(6|60)".to_string())
        );
    }

    #[test]
    fn test_combined_keeps_closely_spaced_events() {
        // The combined policy applies no collapse or range filtering, so
        // events that quantize onto the same tick all survive
        let events = vec![(0, 60), (1, 62), (2, 64)];
        assert_eq!(
            encoder().encode_combined(&events, 24),
            Some("(0|60)(0|62)(0|64)".to_string())
        );
    }

    #[test]
    fn test_combined_offsets_to_zero() {
        let events = vec![(480, 55), (492, 57), (504, 59)];
        assert_eq!(
            encoder().encode_combined(&events, 24),
            Some("(0|55)(3|57)(6|59)".to_string())
        );
    }

    #[test]
    fn test_combined_rejects_empty() {
        assert_eq!(encoder().encode_combined(&[], 24), None);
    }

    #[test]
    fn test_rhythm_only_accepts_connected_phrase() {
        let events = vec![(0, 60), (6, 62), (12, 64)];
        assert_eq!(
            encoder().encode_rhythm_only(&events, 24),
            Some("0|1|3".to_string())
        );
    }

    #[test]
    fn test_rhythm_only_rejects_clustered_input() {
        let events = vec![(0, 60), (2, 61), (100, 62), (102, 63), (104, 64)];
        assert_eq!(encoder().encode_rhythm_only(&events, 24), None);
    }

    #[test]
    fn test_rhythm_only_discards_pitch() {
        let a = vec![(0, 60), (6, 62), (12, 64)];
        let b = vec![(0, 10), (6, 20), (12, 30)];
        assert_eq!(
            encoder().encode_rhythm_only(&a, 24),
            encoder().encode_rhythm_only(&b, 24)
        );
    }

    #[test]
    fn test_rhythm_only_gcd_normalization() {
        // tpqn 24: [0, 24, 48] raw -> fine [0, 6, 12], gcd 6 -> [0, 1, 2]
        let ticks = vec![0, 24, 48];
        assert_eq!(
            normalizing_encoder().encode_ticks(&ticks, 24),
            Some("0|1|2".to_string())
        );
        assert_eq!(encoder().encode_ticks(&ticks, 24), Some("0|6|12".to_string()));
    }

    #[test]
    fn test_rhythm_only_reencoding_is_idempotent() {
        // Re-normalizing an accepted signature's ticks at the fine
        // resolution must reproduce the signature exactly
        let enc = encoder();
        let raw = vec![0, 6, 18, 30, 42];
        let signature = enc.encode_ticks(&raw, 24).expect("accepted pattern");

        let decoded: Vec<i64> = signature
            .split('|')
            .map(|t| t.parse().unwrap())
            .collect();
        let reencoded = enc.encode_ticks(&decoded, 6).expect("accepted re-encode");
        assert_eq!(reencoded, signature);
    }

    #[test]
    fn test_rhythm_only_reencoding_idempotent_with_gcd() {
        let enc = normalizing_encoder();
        let raw = vec![0, 24, 48, 72];
        let signature = enc.encode_ticks(&raw, 24).expect("accepted pattern");

        let decoded: Vec<i64> = signature
            .split('|')
            .map(|t| t.parse().unwrap())
            .collect();
        let reencoded = enc.encode_ticks(&decoded, 6).expect("accepted re-encode");
        assert_eq!(reencoded, signature);
    }
}
