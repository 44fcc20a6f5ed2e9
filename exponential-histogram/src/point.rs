//! Point-in-time representations of aggregated metric data.

use crate::bucket::BucketCounter;
use crate::config::{ExponentialHistogramConfig, MIN_SCALE};

/// A single exported metric point.
///
/// This is the closed set of point kinds an aggregation can produce; an
/// exporter matches on it to pick a wire representation.  The histogram
/// aggregator in this crate produces exactly the
/// [`ExponentialHistogram`](MetricPoint::ExponentialHistogram) variant.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricPoint {
    /// A running total, as produced by counter-style instruments.
    Sum {
        /// The accumulated total.
        value: f64,
        /// Whether the total only ever increases.
        monotonic: bool,
    },
    /// The most recent value, as produced by gauge-style instruments.
    LastValue {
        /// The last observed value.
        value: f64,
    },
    /// An adaptive base-2 exponential histogram.
    ExponentialHistogram(ExponentialHistogramPoint),
    /// Measurements were recorded against a dropped aggregation and carry no
    /// data.
    Drop,
}

/// An immutable point-in-time copy of exponential histogram state.
///
/// Snapshots are value types: they can be encoded, [merged](Self::merge), or
/// [diffed](Self::diff) without any locking, long after the aggregator that
/// produced them has moved on.
#[derive(Debug, Clone, PartialEq)]
pub struct ExponentialHistogramPoint {
    pub(crate) scale: i32,
    pub(crate) max_buckets: usize,
    pub(crate) sum: f64,
    pub(crate) count: u64,
    pub(crate) zero_count: u64,
    pub(crate) record_min_max: bool,
    pub(crate) min: f64,
    pub(crate) max: f64,
    pub(crate) positive: BucketCounter,
    pub(crate) negative: BucketCounter,
}

impl ExponentialHistogramPoint {
    pub(crate) fn new(config: &ExponentialHistogramConfig) -> Self {
        Self {
            scale: config.max_scale(),
            max_buckets: config.max_buckets(),
            sum: 0.0,
            count: 0,
            zero_count: 0,
            record_min_max: config.record_min_max(),
            // Deliberately +/- infinity so that the first value recorded —
            // whatever its sign — becomes both the min and the max.
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
            positive: BucketCounter::new(config.max_buckets()),
            negative: BucketCounter::new(config.max_buckets()),
        }
    }

    /// Returns the scale the bucket indices are relative to.
    pub fn scale(&self) -> i32 {
        self.scale
    }

    /// Returns the maximum bucket window width per sign.
    pub fn max_buckets(&self) -> usize {
        self.max_buckets
    }

    /// Returns the sum of all recorded values.
    pub fn sum(&self) -> f64 {
        self.sum
    }

    /// Returns the number of recorded values.
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Returns the number of recorded zeros.
    pub fn zero_count(&self) -> u64 {
        self.zero_count
    }

    /// Returns whether this point carries min/max information.
    pub fn record_min_max(&self) -> bool {
        self.record_min_max
    }

    /// Returns the smallest recorded value, or `None` when min/max tracking
    /// is disabled or nothing has been recorded.
    pub fn min(&self) -> Option<f64> {
        (self.record_min_max && self.min <= self.max).then_some(self.min)
    }

    /// Returns the largest recorded value, or `None` when min/max tracking is
    /// disabled or nothing has been recorded.
    pub fn max(&self) -> Option<f64> {
        (self.record_min_max && self.min <= self.max).then_some(self.max)
    }

    /// Returns the bucket counts for positive magnitudes.
    pub fn positive(&self) -> &BucketCounter {
        &self.positive
    }

    /// Returns the bucket counts for negative magnitudes.
    pub fn negative(&self) -> &BucketCounter {
        &self.negative
    }

    /// Reduces resolution by `by` halvings, rebuilding both counters and
    /// lowering the scale.  Clamps at [`MIN_SCALE`] and returns the reduction
    /// actually applied.
    pub(crate) fn downscale(&mut self, by: u32) -> u32 {
        let headroom = (self.scale - MIN_SCALE).max(0) as u32;
        let by = by.min(headroom);
        if by == 0 {
            return 0;
        }

        self.positive.downscale(by);
        self.negative.downscale(by);
        self.scale -= by as i32;
        by
    }

    /// Combines two independently accumulated snapshots of the same stream.
    ///
    /// The operands are first aligned to the coarser of the two scales, and
    /// coarsened further if the union of their bucket windows would not fit
    /// the combined capacity.  Scalar fields add; min/max survive only when
    /// both operands recorded them.  The result is the same regardless of
    /// operand order.
    pub fn merge(&self, other: &Self) -> Self {
        let (mut low, mut high) = if self.scale <= other.scale {
            (self.clone(), other.clone())
        } else {
            (other.clone(), self.clone())
        };
        high.downscale((high.scale - low.scale) as u32);

        let max_buckets = low.max_buckets.max(high.max_buckets);
        let further = union_reduction(&low.positive, &high.positive, max_buckets)
            .max(union_reduction(&low.negative, &high.negative, max_buckets));
        if further > 0 {
            low.downscale(further);
            high.downscale(further);
        }

        let record_min_max = low.record_min_max && high.record_min_max;
        Self {
            scale: low.scale,
            max_buckets,
            sum: low.sum + high.sum,
            count: low.count + high.count,
            zero_count: low.zero_count + high.zero_count,
            record_min_max,
            min: if record_min_max { low.min.min(high.min) } else { f64::INFINITY },
            max: if record_min_max { low.max.max(high.max) } else { f64::NEG_INFINITY },
            positive: merge_buckets(max_buckets, &low.positive, &high.positive),
            negative: merge_buckets(max_buckets, &low.negative, &high.negative),
        }
    }

    /// Subtracts this cumulative snapshot from a later one, yielding the
    /// delta recorded in between.
    ///
    /// Scales are aligned exactly as in [`merge`](Self::merge).  Every
    /// subtraction — count, sum, zero count, and each bucket — is floored at
    /// zero, so measurement-ordering anomalies degrade into an undersized
    /// delta rather than a negative one.  Min/max are not well-defined under
    /// subtraction and are always absent from the result.
    pub fn diff(&self, next: &Self) -> Self {
        let mut prior = self.clone();
        let mut next = next.clone();
        if prior.scale > next.scale {
            prior.downscale((prior.scale - next.scale) as u32);
        } else {
            next.downscale((next.scale - prior.scale) as u32);
        }

        let max_buckets = prior.max_buckets.max(next.max_buckets);
        let further = union_reduction(&prior.positive, &next.positive, max_buckets)
            .max(union_reduction(&prior.negative, &next.negative, max_buckets));
        if further > 0 {
            prior.downscale(further);
            next.downscale(further);
        }

        Self {
            scale: prior.scale,
            max_buckets,
            sum: (next.sum - prior.sum).max(0.0),
            count: next.count.saturating_sub(prior.count),
            zero_count: next.zero_count.saturating_sub(prior.zero_count),
            record_min_max: false,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
            positive: diff_buckets(max_buckets, &prior.positive, &next.positive),
            negative: diff_buckets(max_buckets, &prior.negative, &next.negative),
        }
    }
}

/// Returns the minimal number of halvings after which the window
/// `[start, end]` fits within `max_buckets` indices.
pub(crate) fn scale_reduction(start: i32, end: i32, max_buckets: usize) -> u32 {
    let mut start = i64::from(start);
    let mut end = i64::from(end);
    let mut reduction = 0;
    while end - start + 1 > max_buckets as i64 {
        start >>= 1;
        end >>= 1;
        reduction += 1;
    }
    reduction
}

fn union_reduction(first: &BucketCounter, second: &BucketCounter, max_buckets: usize) -> u32 {
    if first.is_empty() || second.is_empty() {
        // A lone window already fits its own capacity, which the combined
        // capacity is at least as large as.
        return 0;
    }
    scale_reduction(
        first.start_index().min(second.start_index()),
        first.end_index().max(second.end_index()),
        max_buckets,
    )
}

fn merge_buckets(max_size: usize, first: &BucketCounter, second: &BucketCounter) -> BucketCounter {
    let mut merged = BucketCounter::new(max_size);
    let (start, end) = match (first.is_empty(), second.is_empty()) {
        (true, true) => return merged,
        (false, true) => (first.start_index(), first.end_index()),
        (true, false) => (second.start_index(), second.end_index()),
        (false, false) => (
            first.start_index().min(second.start_index()),
            first.end_index().max(second.end_index()),
        ),
    };

    for index in start..=end {
        let count = first.get(index).saturating_add(second.get(index));
        if count > 0 {
            let fits = merged.increment(index, count);
            debug_assert!(fits, "union range was reduced to fit the merged capacity");
        }
    }
    merged
}

fn diff_buckets(max_size: usize, prior: &BucketCounter, next: &BucketCounter) -> BucketCounter {
    let mut delta = BucketCounter::new(max_size);
    if next.is_empty() {
        // Whatever prior holds, every clamped difference would be zero.
        return delta;
    }

    for index in next.start_index()..=next.end_index() {
        let count = next.get(index).saturating_sub(prior.get(index));
        if count > 0 {
            let fits = delta.increment(index, count);
            debug_assert!(fits, "delta window is no wider than the next snapshot's");
        }
    }
    delta
}
