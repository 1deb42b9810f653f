//! Safe manipulation indices.
//!
//! A manipulation index is a position in `[0, n]` (n = event count, with
//! n meaning "after the last event") at which the sequence may be cut or
//! extended without violating a property. Per-property sets are bitsets of
//! width n+1; intersecting them word-wise dominates hash-set intersection
//! for the trace sizes seen in long conversations.

use std::ops::Range;

use prism_model::Event;

use crate::properties::{standard_properties, ViewProperty};

const WORD_BITS: usize = u64::BITS as usize;

/// Bitset over the cut positions `0..=n` of a sequence of n events.
#[derive(Debug, Clone, PartialEq)]
pub struct SafeIndexSet {
    event_count: usize,
    words: Vec<u64>,
}

impl SafeIndexSet {
    /// The complete set: every position in `[0, n]` is safe.
    pub fn full(event_count: usize) -> Self {
        let bits = event_count + 1;
        let mut words = vec![u64::MAX; bits.div_ceil(WORD_BITS)];
        let tail = bits % WORD_BITS;
        if tail != 0 {
            if let Some(last) = words.last_mut() {
                *last = (1u64 << tail) - 1;
            }
        }
        Self { event_count, words }
    }

    /// Number of events the set ranges over (positions go up to and
    /// including this value).
    pub fn event_count(&self) -> usize {
        self.event_count
    }

    pub fn contains(&self, index: usize) -> bool {
        index <= self.event_count
            && self.words[index / WORD_BITS] & (1u64 << (index % WORD_BITS)) != 0
    }

    pub fn remove(&mut self, index: usize) {
        if index <= self.event_count {
            self.words[index / WORD_BITS] &= !(1u64 << (index % WORD_BITS));
        }
    }

    /// Remove every position in the half-open range.
    pub fn remove_range(&mut self, range: Range<usize>) {
        for index in range {
            self.remove(index);
        }
    }

    /// Keep only positions present in both sets. Both must range over the
    /// same sequence length.
    pub fn intersect_with(&mut self, other: &SafeIndexSet) {
        debug_assert_eq!(self.event_count, other.event_count);
        for (word, other_word) in self.words.iter_mut().zip(&other.words) {
            *word &= other_word;
        }
    }

    /// Positions in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        (0..=self.event_count).filter(|&index| self.contains(index))
    }

    /// Lower into the sorted-list form used by the condenser.
    pub fn into_manipulation_indices(self) -> ManipulationIndices {
        ManipulationIndices {
            indices: self.iter().collect(),
            event_count: self.event_count,
        }
    }
}

/// Sorted list of positions safe with respect to every property.
#[derive(Debug, Clone, PartialEq)]
pub struct ManipulationIndices {
    indices: Vec<usize>,
    event_count: usize,
}

impl ManipulationIndices {
    pub fn as_slice(&self) -> &[usize] {
        &self.indices
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn contains(&self, index: usize) -> bool {
        self.indices.binary_search(&index).is_ok()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, usize> {
        self.indices.iter()
    }

    /// The smallest safe index at or past `threshold` (strictly past if
    /// `strict`). Clips to the largest safe index when none qualifies;
    /// with no safe indices at all, returns the sequence length.
    pub fn next_index(&self, threshold: usize, strict: bool) -> usize {
        let bound = if strict { threshold + 1 } else { threshold };
        let position = self.indices.partition_point(|&index| index < bound);
        match self.indices.get(position) {
            Some(&index) => index,
            None => self
                .indices
                .last()
                .copied()
                .unwrap_or(self.event_count),
        }
    }
}

/// Intersects the safe-index sets of an ordered list of properties.
pub struct ManipulationIndexCalculator {
    properties: Vec<Box<dyn ViewProperty>>,
}

impl ManipulationIndexCalculator {
    pub fn new(properties: Vec<Box<dyn ViewProperty>>) -> Self {
        Self { properties }
    }

    /// Calculator over the engine's standard property set.
    pub fn standard() -> Self {
        Self::new(standard_properties())
    }

    /// Sorted intersection of every property's safe indices. With zero
    /// properties this is the complete set `{0..n}`.
    pub fn compute(&self, events: &[Event]) -> ManipulationIndices {
        let mut safe = SafeIndexSet::full(events.len());
        for property in &self.properties {
            safe.intersect_with(&property.safe_indices(events));
        }
        safe.into_manipulation_indices()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_of_empty_sequence_is_zero_only() {
        let safe = SafeIndexSet::full(0);
        assert_eq!(safe.iter().collect::<Vec<_>>(), vec![0]);
    }

    #[test]
    fn full_covers_zero_through_n() {
        let safe = SafeIndexSet::full(3);
        assert_eq!(safe.iter().collect::<Vec<_>>(), vec![0, 1, 2, 3]);
        assert!(!safe.contains(4));
    }

    #[test]
    fn full_handles_word_boundaries() {
        // 63, 64, and 65 events straddle the u64 word edge.
        for n in [63, 64, 65, 130] {
            let safe = SafeIndexSet::full(n);
            assert_eq!(safe.iter().count(), n + 1, "n = {n}");
            assert!(safe.contains(n));
        }
    }

    #[test]
    fn remove_range_is_half_open() {
        let mut safe = SafeIndexSet::full(5);
        safe.remove_range(2..4);
        assert_eq!(safe.iter().collect::<Vec<_>>(), vec![0, 1, 4, 5]);
    }

    #[test]
    fn intersection_keeps_common_positions() {
        let mut a = SafeIndexSet::full(5);
        a.remove_range(1..3);
        let mut b = SafeIndexSet::full(5);
        b.remove(4);
        a.intersect_with(&b);
        assert_eq!(a.iter().collect::<Vec<_>>(), vec![0, 3, 5]);
    }

    fn indices(values: &[usize], event_count: usize) -> ManipulationIndices {
        let mut safe = SafeIndexSet::full(event_count);
        for index in 0..=event_count {
            if !values.contains(&index) {
                safe.remove(index);
            }
        }
        safe.into_manipulation_indices()
    }

    #[test]
    fn next_index_finds_smallest_at_or_past_threshold() {
        let idx = indices(&[0, 1, 5, 6], 6);
        assert_eq!(idx.next_index(0, false), 0);
        assert_eq!(idx.next_index(2, false), 5);
        assert_eq!(idx.next_index(5, false), 5);
    }

    #[test]
    fn next_index_strict_skips_equal_threshold() {
        let idx = indices(&[0, 1, 5, 6], 6);
        assert_eq!(idx.next_index(1, true), 5);
        assert_eq!(idx.next_index(5, true), 6);
    }

    #[test]
    fn next_index_clips_to_largest_known() {
        let idx = indices(&[0, 1, 5], 6);
        assert_eq!(idx.next_index(6, false), 5);
        assert_eq!(idx.next_index(5, true), 5);
    }

    #[test]
    fn next_index_with_no_safe_indices_returns_length() {
        let idx = indices(&[], 4);
        assert!(idx.is_empty());
        assert_eq!(idx.next_index(0, false), 4);
    }

    #[test]
    fn zero_properties_yield_complete_set() {
        let calculator = ManipulationIndexCalculator::new(Vec::new());
        let events: Vec<prism_model::Event> = Vec::new();
        assert_eq!(calculator.compute(&events).as_slice(), &[0]);
    }
}
