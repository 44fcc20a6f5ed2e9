//! Bucket-boundary index computation at a runtime-adjustable scale.

const SIGNIFICAND_WIDTH: u32 = 52;
const SIGNIFICAND_MASK: u64 = 0x000f_ffff_ffff_ffff;
const EXPONENT_BIAS: i32 = 1023;
// Subnormals encode `significand * 2^-1074` with a zero exponent field.
const MIN_SUBNORMAL_EXPONENT: i32 = -1074;

/// Maps a positive magnitude to the bucket index it falls into.
///
/// At scale `s`, bucket boundaries are powers of `base = 2^(2^-s)`, and
/// [`compute_index`](Self::compute_index) returns the unique `i` with
/// `base^i < magnitude <= base^(i+1)`.  The indexer is a pure function of the
/// scale; the aggregator replaces it whenever downscaling changes the scale.
#[derive(Debug, Clone, Copy)]
pub struct BucketIndexer {
    scale: i32,
    scale_factor: f64,
}

impl BucketIndexer {
    /// Creates an indexer for the given scale.
    pub fn new(scale: i32) -> Self {
        // log2(e) * 2^scale, so that `ln(m) * scale_factor == log2(m) * 2^scale`.
        Self { scale, scale_factor: std::f64::consts::LOG2_E * (scale as f64).exp2() }
    }

    /// Returns the scale this indexer was built for.
    pub fn scale(&self) -> i32 {
        self.scale
    }

    /// Returns the bucket index for `value`'s magnitude.
    ///
    /// The caller guarantees `value != 0`; zero measurements are tracked in a
    /// dedicated zero count and never reach the bucket counters.  Exact powers
    /// of two — the bucket boundaries themselves for non-positive scales —
    /// take an integer-only path, so there is no floating-point rounding slop
    /// at boundaries.  Values whose magnitude is infinite land in the bucket
    /// past the largest finite one.
    pub fn compute_index(&self, value: f64) -> i32 {
        let magnitude = value.abs();
        debug_assert!(magnitude > 0.0, "zero is tracked outside the bucket counters");

        let (exponent, exact_power_of_two) = decompose(magnitude);

        if self.scale > 0 {
            if exact_power_of_two {
                // 2^e == base^(e << scale); the upper-inclusive boundary
                // convention puts it in the bucket below.
                return (exponent << self.scale) - 1;
            }
            return (magnitude.ln() * self.scale_factor).ceil() as i32 - 1;
        }

        let exponent = if exact_power_of_two { exponent - 1 } else { exponent };
        exponent >> -self.scale
    }
}

/// Splits a positive magnitude into its power-of-two exponent and whether the
/// magnitude is exactly `2^exponent`, normalizing subnormals.
fn decompose(magnitude: f64) -> (i32, bool) {
    let bits = magnitude.to_bits();
    let raw_exponent = ((bits >> SIGNIFICAND_WIDTH) & 0x7ff) as i32;
    let significand = bits & SIGNIFICAND_MASK;

    if raw_exponent == 0 {
        let highest_bit = 63 - significand.leading_zeros() as i32;
        let exact = significand & (significand - 1) == 0;
        (MIN_SUBNORMAL_EXPONENT + highest_bit, exact)
    } else {
        (raw_exponent - EXPONENT_BIAS, significand == 0)
    }
}
