//! Adaptive base-2 exponential histogram aggregation.
//!
//! This crate provides the measurement-aggregation core of a metrics pipeline: it
//! folds a stream of individual `f64` measurements into a compact, mergeable
//! summary with bucket boundaries at powers of `2^(2^-scale)`.
//!
//! # Overview
//!
//! An [`ExponentialHistogram`] owns one sparse [`BucketCounter`] for positive
//! magnitudes and one for negative magnitudes, plus scalar state (sum, count,
//! zero count, optional min/max).  Buckets are never preconfigured: the histogram
//! starts at its configured `max_scale` and trades resolution for range on
//! demand.  When a recorded value would require a bucket window wider than
//! `max_buckets`, the histogram *downscales* — it halves its resolution, merging
//! adjacent bucket pairs, until the new value fits.  Downscaling loses boundary
//! precision but never loses counts.
//!
//! # Recording and collecting
//!
//! [`ExponentialHistogram::record`] is safe to call from many threads at once;
//! each call mutates the shared state under a short critical section.  A
//! collection path calls [`ExponentialHistogram::snapshot`] to obtain an
//! [`ExponentialHistogramPoint`], an immutable point-in-time copy that can be
//! encoded or combined without further locking.
//!
//! Two snapshots of the same stream can be combined with
//! [`ExponentialHistogramPoint::merge`] (e.g. across shards), or subtracted with
//! [`ExponentialHistogramPoint::diff`] to convert cumulative totals into a delta.
//! Both operations align the operands to the coarser of the two scales first.
//!
//! ```
//! use exponential_histogram::{ExponentialHistogram, ExponentialHistogramConfig};
//!
//! let config = ExponentialHistogramConfig::new(160, 20, true)?;
//! let histogram = ExponentialHistogram::new(config);
//!
//! histogram.record(0.5);
//! histogram.record(4.2);
//! histogram.record(0.0);
//!
//! let point = histogram.snapshot();
//! assert_eq!(point.count(), 3);
//! assert_eq!(point.zero_count(), 1);
//! assert_eq!(point.max(), Some(4.2));
//! # Ok::<(), exponential_histogram::ConfigError>(())
//! ```
#![deny(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg), deny(broken_intra_doc_links))]

mod bucket;
pub use bucket::BucketCounter;

mod config;
pub use config::{ConfigError, ExponentialHistogramConfig, MAX_SCALE, MIN_SCALE};

mod histogram;
pub use histogram::ExponentialHistogram;

mod indexer;
pub use indexer::BucketIndexer;

mod point;
pub use point::{ExponentialHistogramPoint, MetricPoint};
