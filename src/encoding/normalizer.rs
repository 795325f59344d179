// TickNormalizer - canonical quantization of raw tick sequences
//
// This module rescales and filters a raw tick sequence to a canonical
// resolution, removing near-duplicate and out-of-range events. The result
// is comparable across tracks regardless of each source file's native
// ticks-per-quarter-note resolution.
//
// The pipeline is a fixed sequence of named stages:
// 1. Offset & rescale: shift the sequence to start at 0, rescale by
//    target_resolution / tpqn using integer floor division
// 2. Near-duplicate collapse: drop values within the dedup threshold of
//    the last kept value (quantization jitter)
// 3. Range filter: keep strictly-changing values below the range bound
// 4. Optional gcd normalization: divide all values by their gcd
// 5. Gap check: reject sequences with a gap wider than the bound
//
// Each stage is an independently testable method; rejection conditions are
// explicit (`None`) rather than embedded in control flow.

use crate::config::EncodingConfig;

/// Normalizes raw tick sequences to a canonical resolution
///
/// All resolution and threshold constants are explicit parameters taken
/// from [`EncodingConfig`], so tests can exercise alternative resolution
/// regimes without shared mutable state.
#[derive(Debug, Clone)]
pub struct TickNormalizer {
    fine_resolution: u32,
    coarse_resolution: u32,
    dedup_threshold: i64,
    max_tick: i64,
    max_gap: i64,
    min_ticks: usize,
}

impl TickNormalizer {
    /// Create a normalizer from the encoding configuration
    pub fn new(config: &EncodingConfig) -> Self {
        Self {
            fine_resolution: config.fine_resolution,
            coarse_resolution: config.coarse_resolution,
            dedup_threshold: config.dedup_threshold,
            max_tick: config.max_tick,
            max_gap: config.max_gap,
            min_ticks: config.min_ticks,
        }
    }

    /// Offset and rescale straight to the fine resolution
    ///
    /// This is the combined-policy entry point: no collapsing, range
    /// filtering, gcd normalization or gap checking is applied.
    ///
    /// # Arguments
    /// * `ticks` - Raw tick values, ascending
    /// * `tpqn` - Source ticks per quarter note (must be positive)
    ///
    /// # Returns
    /// `None` only for an empty input or a zero `tpqn`
    pub fn rescale_fine(&self, ticks: &[i64], tpqn: u32) -> Option<Vec<i64>> {
        if ticks.is_empty() || tpqn == 0 {
            return None;
        }
        let offset = Self::offset_to_zero(ticks);
        Some(Self::rescale(&offset, self.fine_resolution, tpqn))
    }

    /// Run the full three-stage normalization pipeline
    ///
    /// This is the rhythm-only-policy entry point: coarse rescale,
    /// near-duplicate collapse, fine rescale, range filter, optional gcd
    /// normalization, gap check.
    ///
    /// # Arguments
    /// * `ticks` - Raw tick values, ascending
    /// * `tpqn` - Source ticks per quarter note (must be positive)
    /// * `normalize_gcd` - Divide the surviving ticks by their gcd
    ///
    /// # Returns
    /// The canonical tick sequence, or `None` when the pattern is rejected
    /// (fewer than `min_ticks` survivors, or an excessive gap). The gap
    /// check runs against the final, possibly gcd-normalized sequence.
    pub fn normalize(&self, ticks: &[i64], tpqn: u32, normalize_gcd: bool) -> Option<Vec<i64>> {
        if ticks.is_empty() || tpqn == 0 {
            return None;
        }

        let offset = Self::offset_to_zero(ticks);
        let coarse = Self::rescale(&offset, self.coarse_resolution, tpqn);
        let collapsed = self.collapse_near_duplicates(&coarse);
        let fine = Self::rescale(&collapsed, self.fine_resolution, self.coarse_resolution);
        let filtered = self.filter_in_range(&fine);

        if filtered.len() < self.min_ticks {
            return None;
        }

        let finalized = if normalize_gcd {
            Self::normalize_by_gcd(&filtered)
        } else {
            filtered
        };

        if self.exceeds_gap(&finalized) {
            return None;
        }

        Some(finalized)
    }

    /// Shift a tick sequence so its minimum becomes 0
    pub fn offset_to_zero(ticks: &[i64]) -> Vec<i64> {
        let min_tick = ticks.iter().copied().min().unwrap_or(0);
        ticks.iter().map(|t| t - min_tick).collect()
    }

    /// Rescale every value by `to / from` using integer floor division
    ///
    /// Inputs are non-negative after the offset stage, so truncating
    /// division is floor division and the arithmetic stays exact in i64.
    fn rescale(ticks: &[i64], to: u32, from: u32) -> Vec<i64> {
        ticks
            .iter()
            .map(|t| t * i64::from(to) / i64::from(from))
            .collect()
    }

    /// Drop values within the dedup threshold of the last kept value
    ///
    /// Sweeps in order; a value survives only if it exceeds the previously
    /// kept value by more than `dedup_threshold`. The first value is
    /// always kept.
    pub fn collapse_near_duplicates(&self, ticks: &[i64]) -> Vec<i64> {
        let mut kept = Vec::with_capacity(ticks.len());
        let mut last: Option<i64> = None;
        for &tick in ticks {
            if last.map_or(true, |l| tick - l > self.dedup_threshold) {
                kept.push(tick);
                last = Some(tick);
            }
        }
        kept
    }

    /// Keep strictly-changing values below the range bound
    ///
    /// A value survives only if it differs from the last kept value and is
    /// strictly less than `max_tick`.
    pub fn filter_in_range(&self, ticks: &[i64]) -> Vec<i64> {
        let mut kept = Vec::with_capacity(ticks.len());
        let mut last: Option<i64> = None;
        for &tick in ticks {
            if last != Some(tick) && tick < self.max_tick {
                kept.push(tick);
                last = Some(tick);
            }
        }
        kept
    }

    /// Divide every value by the gcd of all values
    ///
    /// A gcd of 0 (all values zero) or 1 disables the division rather
    /// than failing.
    pub fn normalize_by_gcd(ticks: &[i64]) -> Vec<i64> {
        let divisor = ticks.iter().fold(0i64, |acc, &t| gcd(acc, t));
        if divisor > 1 {
            ticks.iter().map(|t| t / divisor).collect()
        } else {
            ticks.to_vec()
        }
    }

    /// Whether any consecutive gap exceeds the gap bound
    pub fn exceeds_gap(&self, ticks: &[i64]) -> bool {
        ticks.windows(2).any(|w| w[1] - w[0] > self.max_gap)
    }
}

/// Greatest common divisor of two non-negative values
fn gcd(a: i64, b: i64) -> i64 {
    if b == 0 {
        a
    } else {
        gcd(b, a % b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_normalizer() -> TickNormalizer {
        TickNormalizer::new(&EncodingConfig::default())
    }

    #[test]
    fn test_offset_to_zero() {
        assert_eq!(TickNormalizer::offset_to_zero(&[10, 14, 22]), vec![0, 4, 12]);
        assert_eq!(TickNormalizer::offset_to_zero(&[0, 5]), vec![0, 5]);
        assert_eq!(TickNormalizer::offset_to_zero(&[]), Vec::<i64>::new());
    }

    #[test]
    fn test_rescale_uses_floor_division() {
        // 6/24 ratio: every tick divided by 4, remainder discarded
        assert_eq!(TickNormalizer::rescale(&[0, 3, 12, 25], 6, 24), vec![0, 0, 3, 6]);
        // 96/24 ratio: multiplication by 4
        assert_eq!(TickNormalizer::rescale(&[0, 2, 100], 96, 24), vec![0, 8, 400]);
    }

    #[test]
    fn test_collapse_near_duplicates() {
        let normalizer = default_normalizer();
        // Threshold 3: values must exceed the last kept one by more than 3
        assert_eq!(
            normalizer.collapse_near_duplicates(&[0, 1, 2, 3, 4, 8, 10]),
            vec![0, 4, 8]
        );
        // First value always survives
        assert_eq!(normalizer.collapse_near_duplicates(&[5]), vec![5]);
    }

    #[test]
    fn test_filter_in_range() {
        let normalizer = default_normalizer();
        // Duplicates dropped, values >= 22 dropped
        assert_eq!(
            normalizer.filter_in_range(&[0, 0, 1, 1, 3, 21, 22, 25]),
            vec![0, 1, 3, 21]
        );
    }

    #[test]
    fn test_normalize_by_gcd_divides_exactly() {
        assert_eq!(TickNormalizer::normalize_by_gcd(&[0, 4, 8]), vec![0, 1, 2]);
        assert_eq!(TickNormalizer::normalize_by_gcd(&[0, 6, 15]), vec![0, 2, 5]);
    }

    #[test]
    fn test_normalize_by_gcd_zero_and_one_are_noops() {
        // All zeros: gcd is 0, division disabled
        assert_eq!(TickNormalizer::normalize_by_gcd(&[0, 0, 0]), vec![0, 0, 0]);
        // Coprime values: gcd is 1, division is a no-op
        assert_eq!(TickNormalizer::normalize_by_gcd(&[0, 2, 3]), vec![0, 2, 3]);
    }

    #[test]
    fn test_exceeds_gap() {
        let normalizer = default_normalizer();
        assert!(!normalizer.exceeds_gap(&[0, 10, 20]));
        assert!(!normalizer.exceeds_gap(&[0, 24]));
        assert!(normalizer.exceeds_gap(&[0, 25]));
    }

    #[test]
    fn test_pipeline_accepts_connected_phrase() {
        let normalizer = default_normalizer();
        // tpqn 24: coarse x4 -> [0, 24, 48], fine /16 -> [0, 1, 3]
        assert_eq!(
            normalizer.normalize(&[0, 6, 12], 24, false),
            Some(vec![0, 1, 3])
        );
    }

    #[test]
    fn test_pipeline_rejects_clustered_input() {
        let normalizer = default_normalizer();
        // Two clusters far apart: the second lands beyond the range bound,
        // leaving fewer than 3 survivors
        assert_eq!(normalizer.normalize(&[0, 2, 100, 102, 104], 24, false), None);
    }

    #[test]
    fn test_pipeline_rejects_empty_and_zero_tpqn() {
        let normalizer = default_normalizer();
        assert_eq!(normalizer.normalize(&[], 24, false), None);
        assert_eq!(normalizer.normalize(&[0, 6, 12], 0, false), None);
        assert_eq!(normalizer.rescale_fine(&[], 24), None);
        assert_eq!(normalizer.rescale_fine(&[0, 6], 0), None);
    }

    #[test]
    fn test_gap_check_runs_on_normalized_sequence() {
        // Widen the range bound so the gap check becomes reachable, and
        // verify it applies after gcd division, not before
        let config = EncodingConfig {
            max_tick: 1000,
            max_gap: 24,
            ..EncodingConfig::default()
        };
        let normalizer = TickNormalizer::new(&config);
        // tpqn 96: coarse x1, fine /16 -> [0, 10, 50]: raw gap 40 > 24,
        // but gcd 10 shrinks it to [0, 1, 5]
        assert_eq!(
            normalizer.normalize(&[0, 160, 800], 96, true),
            Some(vec![0, 1, 5])
        );
        // Without gcd normalization the same sequence is rejected
        assert_eq!(normalizer.normalize(&[0, 160, 800], 96, false), None);
    }

    #[test]
    fn test_output_has_no_adjacent_duplicates_and_bounded_gaps() {
        let normalizer = default_normalizer();
        let inputs: Vec<Vec<i64>> = vec![
            vec![0, 6, 12, 18, 24],
            vec![0, 1, 2, 3, 96, 97, 192],
            vec![10, 34, 58, 82],
            vec![0, 48, 96, 144, 192, 240],
        ];
        for (tpqn, ticks) in [(24u32, &inputs[0]), (96, &inputs[1]), (24, &inputs[2]), (96, &inputs[3])] {
            for normalize_gcd in [false, true] {
                if let Some(out) = normalizer.normalize(ticks, tpqn, normalize_gcd) {
                    assert!(out.len() >= 3);
                    for w in out.windows(2) {
                        assert_ne!(w[0], w[1], "adjacent duplicates in {:?}", out);
                        assert!(w[1] - w[0] <= 24, "gap too wide in {:?}", out);
                    }
                }
            }
        }
    }
}
