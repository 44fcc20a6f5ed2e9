//! The measurement-side histogram aggregator.

use parking_lot::Mutex;
use tracing::trace;

use crate::config::ExponentialHistogramConfig;
use crate::indexer::BucketIndexer;
use crate::point::{scale_reduction, ExponentialHistogramPoint, MetricPoint};

/// A thread-safe, adaptive base-2 exponential histogram.
///
/// Any number of threads may [`record`](Self::record) into the same histogram;
/// each call mutates the shared state under a short mutex-guarded critical
/// section.  A collection path periodically takes a [`snapshot`](Self::snapshot)
/// under the same lock and hands the copy to an exporter.
///
/// The critical section is O(1) except when a value falls outside the current
/// bucket window and forces a downscale, which rebuilds the (capacity-bounded)
/// bucket windows once.
#[derive(Debug)]
pub struct ExponentialHistogram {
    inner: Mutex<Inner>,
}

#[derive(Debug)]
struct Inner {
    point: ExponentialHistogramPoint,
    indexer: BucketIndexer,
}

impl Default for ExponentialHistogram {
    fn default() -> Self {
        Self::new(ExponentialHistogramConfig::default())
    }
}

impl ExponentialHistogram {
    /// Creates a histogram from a validated configuration.
    pub fn new(config: ExponentialHistogramConfig) -> Self {
        Self {
            inner: Mutex::new(Inner {
                point: ExponentialHistogramPoint::new(&config),
                indexer: BucketIndexer::new(config.max_scale()),
            }),
        }
    }

    /// Records a single measurement.
    pub fn record(&self, value: f64) {
        self.record_many(value, 1);
    }

    /// Records `n` observations of the same value in one critical section.
    pub fn record_many(&self, value: f64, n: u64) {
        if n == 0 {
            return;
        }

        let mut inner = self.inner.lock();
        let Inner { point, indexer } = &mut *inner;

        point.count += n;
        if value.is_nan() {
            // NaN contributes to the observation count but poisons every other
            // field, so it stops here.
            return;
        }

        point.sum += value * n as f64;
        if point.record_min_max {
            point.min = point.min.min(value);
            point.max = point.max.max(value);
        }
        if value == 0.0 {
            point.zero_count += n;
            return;
        }

        let index = indexer.compute_index(value);
        let counter = if value > 0.0 { &mut point.positive } else { &mut point.negative };
        if counter.increment(index, n) {
            return;
        }

        // The window cannot grow to reach `index`: reduce resolution until the
        // widened window fits, then retry at the coarser index.
        let start = counter.start_index().min(index);
        let end = counter.end_index().max(index);
        let reduction = scale_reduction(start, end, point.max_buckets);
        let applied = point.downscale(reduction);
        *indexer = BucketIndexer::new(point.scale);
        trace!(scale = point.scale, reduction = applied, "reduced histogram resolution");

        let counter = if value > 0.0 { &mut point.positive } else { &mut point.negative };
        let fits = counter.increment(index >> applied, n);
        debug_assert!(fits, "downscaled index fits the reduced window");
    }

    /// Returns a point-in-time copy of the aggregation state.
    pub fn snapshot(&self) -> ExponentialHistogramPoint {
        self.inner.lock().point.clone()
    }

    /// Returns the snapshot wrapped in the exported point representation.
    pub fn point(&self) -> MetricPoint {
        MetricPoint::ExponentialHistogram(self.snapshot())
    }
}
