/// A capacity-bounded counter over a sliding, contiguous window of signed
/// bucket indices.
///
/// The counter stores one `u64` count per index in `[start_index, end_index]`
/// and transparently widens that window as new indices arrive, up to a fixed
/// maximum width.  Widening past the cap is refused rather than evicting old
/// counts: [`BucketCounter::increment`] returns `false` and the caller reacts
/// by reducing resolution (see [`BucketCounter::downscale`]) so that the index
/// fits again.
///
/// Backing storage is a plain `Vec<u64>` indexed by `index - start_index`; the
/// vector grows lazily with the window, so an empty counter allocates nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketCounter {
    counts: Vec<u64>,
    start_index: i32,
    max_size: usize,
}

impl BucketCounter {
    /// Creates an empty counter whose window may grow to at most `max_size`
    /// contiguous indices.
    pub fn new(max_size: usize) -> Self {
        Self { counts: Vec::new(), start_index: 0, max_size }
    }

    /// Returns the maximum window width.
    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Returns `true` if no count has been recorded since creation or the last
    /// [`clear`](Self::clear).
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Resets the counter to its empty state, keeping its capacity bound.
    pub fn clear(&mut self) {
        self.counts.clear();
        self.start_index = 0;
    }

    /// Returns the lowest populated index.  Only meaningful when the counter
    /// is non-empty.
    pub fn start_index(&self) -> i32 {
        self.start_index
    }

    /// Returns the highest populated index.  Only meaningful when the counter
    /// is non-empty.
    pub fn end_index(&self) -> i32 {
        self.start_index + self.counts.len() as i32 - 1
    }

    /// Returns the raw window counts, ordered from [`start_index`](Self::start_index)
    /// upward.  Exporters combine this with the start index as a bucket offset.
    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    /// Returns the sum of every count in the window.
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Adds `count` at `index`, sliding the window to include `index` if
    /// needed.
    ///
    /// Returns `false` — without mutating anything — when including `index`
    /// would require a window wider than `max_size`.  That refusal is a signal
    /// for the caller to downscale, not an error.  Counts saturate at
    /// `u64::MAX` instead of wrapping.
    #[must_use]
    pub fn increment(&mut self, index: i32, count: u64) -> bool {
        if self.counts.is_empty() {
            if self.max_size == 0 {
                return false;
            }
            self.start_index = index;
            self.counts.push(count);
            return true;
        }

        // Index deltas are computed in i64: windows at extreme scales can span
        // more than i32::MAX raw indices before downscaling kicks in.
        if index > self.end_index() {
            let width = i64::from(index) - i64::from(self.start_index) + 1;
            if width > self.max_size as i64 {
                return false;
            }
            self.counts.resize(width as usize, 0);
        } else if index < self.start_index {
            let width = i64::from(self.end_index()) - i64::from(index) + 1;
            if width > self.max_size as i64 {
                return false;
            }
            let pad = (self.start_index - index) as usize;
            self.counts.splice(0..0, std::iter::repeat(0).take(pad));
            self.start_index = index;
        }

        let slot = (index - self.start_index) as usize;
        self.counts[slot] = self.counts[slot].saturating_add(count);
        true
    }

    /// Returns the count at `index`, or 0 when `index` lies outside the
    /// current window (including when the counter is empty).
    pub fn get(&self, index: i32) -> u64 {
        if self.counts.is_empty() || index < self.start_index || index > self.end_index() {
            return 0;
        }
        self.counts[(index - self.start_index) as usize]
    }

    /// Halves the resolution `by` times: every index is replaced by
    /// `index >> by`, merging the counts of indices that collapse onto the
    /// same coarser bucket.
    ///
    /// Counts are preserved exactly; only boundary precision is lost.  The
    /// rebuilt window is never wider than the original, so this cannot fail.
    pub fn downscale(&mut self, by: u32) {
        if by == 0 || self.counts.is_empty() {
            return;
        }

        let mut rebuilt = Self::new(self.max_size);
        for (slot, &count) in self.counts.iter().enumerate() {
            if count == 0 {
                continue;
            }
            let index = self.start_index + slot as i32;
            let fits = rebuilt.increment(index >> by, count);
            debug_assert!(fits, "downscaled window is narrower than the original");
        }
        *self = rebuilt;
    }
}

#[cfg(test)]
mod tests {
    use super::BucketCounter;
    use proptest::collection::vec;
    use proptest::prelude::*;

    #[test]
    fn get_returns_zero_outside_window() {
        let mut counter = BucketCounter::new(10);
        assert_eq!(counter.get(0), 0);
        assert_eq!(counter.get(100), 0);

        assert!(counter.increment(2, 1));
        assert!(counter.increment(9, 1));
        assert_eq!(counter.get(0), 0);
        assert_eq!(counter.get(2), 1);
        assert_eq!(counter.get(9), 1);
        assert_eq!(counter.get(100), 0);
    }

    #[test]
    fn window_expands_in_both_directions() {
        let mut counter = BucketCounter::new(160);
        assert!(counter.increment(10, 1));
        // Below the first index recorded.
        assert!(counter.increment(0, 1));
        assert_eq!(counter.get(10), 1);
        assert_eq!(counter.get(0), 1);
        assert_eq!(counter.start_index(), 0);
        assert_eq!(counter.end_index(), 10);
        // And above it.
        assert!(counter.increment(20, 1));
        assert_eq!(counter.get(20), 1);
        assert_eq!(counter.start_index(), 0);
        assert_eq!(counter.end_index(), 20);
    }

    #[test]
    fn increment_fails_at_capacity_without_mutating() {
        let mut counter = BucketCounter::new(10);
        assert!(counter.increment(10, 1));
        assert!(counter.increment(15, 2));
        assert!(counter.increment(6, 3));
        assert_eq!(counter.start_index(), 6);
        assert_eq!(counter.end_index(), 15);

        assert!(!counter.increment(5, 1));
        assert!(!counter.increment(16, 1));
        // Untouched by the failed calls.
        assert_eq!(counter.start_index(), 6);
        assert_eq!(counter.end_index(), 15);
        assert_eq!(counter.get(6), 3);
        assert_eq!(counter.get(10), 1);
        assert_eq!(counter.get(15), 2);
    }

    #[test]
    fn handles_extreme_index_spans() {
        // Raw index distance wider than i32::MAX must fail cleanly, not wrap.
        let mut counter = BucketCounter::new(160);
        assert!(counter.increment(-1_126_000_000, 1));
        assert!(!counter.increment(1_073_000_000, 1));
        assert_eq!(counter.get(-1_126_000_000), 1);
    }

    #[test]
    fn clear_resets_the_window() {
        let mut counter = BucketCounter::new(10);
        assert!(counter.is_empty());
        assert!(counter.increment(2, 1));
        assert!(counter.increment(8, 1));
        assert!(!counter.is_empty());
        assert_eq!(counter.start_index(), 2);
        assert_eq!(counter.end_index(), 8);

        counter.clear();
        assert!(counter.is_empty());
        assert_eq!(counter.get(2), 0);
        assert_eq!(counter.max_size(), 10);
    }

    #[test]
    fn counts_saturate_instead_of_wrapping() {
        let mut counter = BucketCounter::new(4);
        assert!(counter.increment(0, u64::MAX));
        assert!(counter.increment(0, 5));
        assert_eq!(counter.get(0), u64::MAX);
    }

    #[test]
    fn downscale_merges_adjacent_buckets() {
        let mut counter = BucketCounter::new(8);
        assert!(counter.increment(0, 1));
        assert!(counter.increment(1, 2));
        assert!(counter.increment(2, 4));
        assert!(counter.increment(3, 8));

        counter.downscale(1);
        assert_eq!(counter.start_index(), 0);
        assert_eq!(counter.end_index(), 1);
        assert_eq!(counter.get(0), 3);
        assert_eq!(counter.get(1), 12);
        assert_eq!(counter.total(), 15);
    }

    #[test]
    fn downscale_uses_arithmetic_shift_for_negative_indices() {
        let mut counter = BucketCounter::new(8);
        assert!(counter.increment(-3, 1));
        assert!(counter.increment(-2, 2));
        assert!(counter.increment(2, 4));

        counter.downscale(1);
        // -3 >> 1 == -2, -2 >> 1 == -1, 2 >> 1 == 1.
        assert_eq!(counter.get(-2), 1);
        assert_eq!(counter.get(-1), 2);
        assert_eq!(counter.get(1), 4);
        assert_eq!(counter.total(), 7);
    }

    fn populated(entries: &[(i32, u8)]) -> BucketCounter {
        let mut counter = BucketCounter::new(160);
        for &(index, count) in entries {
            // Entries past the capacity are simply dropped; the property only
            // cares that both sides drop the same ones.
            let _ = counter.increment(index, u64::from(count));
        }
        counter
    }

    proptest! {
        #[test]
        fn downscale_is_associative(
            entries in vec((-500i32..500, 1u8..=255), 1..64),
            first in 0u32..4,
            second in 0u32..4,
        ) {
            let mut stepwise = populated(&entries);
            stepwise.downscale(first);
            stepwise.downscale(second);

            let mut combined = populated(&entries);
            combined.downscale(first + second);

            prop_assert_eq!(stepwise, combined);
        }

        #[test]
        fn downscale_preserves_totals(
            entries in vec((-500i32..500, 1u8..=255), 1..64),
            by in 0u32..8,
        ) {
            let original = populated(&entries);
            let mut scaled = original.clone();
            scaled.downscale(by);
            prop_assert_eq!(original.total(), scaled.total());
        }
    }
}
