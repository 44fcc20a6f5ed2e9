use thiserror::Error;

/// The highest supported resolution.
///
/// At scale 20 the relative bucket width is roughly one part per million, which
/// exhausts the precision gains available from an `f64` measurement.
pub const MAX_SCALE: i32 = 20;

/// The lowest resolution downscaling will ever reach.
///
/// At scale -11 a single bucket spans more than the entire finite `f64` range,
/// so no measurement stream can require a coarser resolution.  Downscaling
/// clamps here rather than reducing resolution without bound.
pub const MIN_SCALE: i32 = -11;

/// Errors returned when validating an [`ExponentialHistogramConfig`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// `max_buckets` was smaller than the two buckets needed to cover both
    /// halves of the index range at [`MIN_SCALE`].
    #[error("max_buckets must be at least 2, got {0}")]
    MaxBucketsTooSmall(usize),

    /// `max_scale` was outside the supported scale range.
    #[error("max_scale must be within [{MIN_SCALE}, {MAX_SCALE}], got {0}")]
    MaxScaleOutOfRange(i32),
}

/// Configuration for an [`ExponentialHistogram`](crate::ExponentialHistogram).
///
/// Immutable once constructed.  The defaults — 160 buckets per sign, starting
/// scale 20, min/max recording enabled — begin at maximum fidelity and let the
/// first recorded values pull the scale down to whatever the observed dynamic
/// range actually requires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExponentialHistogramConfig {
    max_buckets: usize,
    max_scale: i32,
    record_min_max: bool,
}

impl Default for ExponentialHistogramConfig {
    fn default() -> Self {
        Self { max_buckets: 160, max_scale: MAX_SCALE, record_min_max: true }
    }
}

impl ExponentialHistogramConfig {
    /// Creates a validated configuration.
    ///
    /// `max_buckets` bounds the bucket window of each sign's counter and thus
    /// the histogram's memory footprint.  `max_scale` is the starting (and
    /// highest) resolution; recording never raises it, only lowers it.
    ///
    /// # Errors
    ///
    /// Returns an error if `max_buckets < 2` or `max_scale` is outside
    /// `[MIN_SCALE, MAX_SCALE]`.
    pub fn new(
        max_buckets: usize,
        max_scale: i32,
        record_min_max: bool,
    ) -> Result<Self, ConfigError> {
        if max_buckets < 2 {
            return Err(ConfigError::MaxBucketsTooSmall(max_buckets));
        }
        if !(MIN_SCALE..=MAX_SCALE).contains(&max_scale) {
            return Err(ConfigError::MaxScaleOutOfRange(max_scale));
        }

        Ok(Self { max_buckets, max_scale, record_min_max })
    }

    /// Returns the maximum bucket window width per sign.
    pub fn max_buckets(&self) -> usize {
        self.max_buckets
    }

    /// Returns the starting scale.
    pub fn max_scale(&self) -> i32 {
        self.max_scale
    }

    /// Returns whether min/max tracking is enabled.
    pub fn record_min_max(&self) -> bool {
        self.record_min_max
    }
}
