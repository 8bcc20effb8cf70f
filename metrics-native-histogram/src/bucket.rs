use std::fmt;

use crate::boundary::boundary;
use crate::layout::Side;

/// A decoded histogram bucket.
///
/// Buckets are never stored; they are produced by the bucket iterators of a
/// [`FloatHistogram`](crate::FloatHistogram). Each bucket specifies whether its limits are
/// inclusive, using the usual mathematical notation: inclusive limits create a closed interval,
/// and non-inclusive limits an open interval.
///
/// To represent cumulative buckets, `lower` is set to negative infinity and `count` includes the
/// counts of all buckets for smaller values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bucket {
    /// Lower limit of the bucket.
    pub lower: f64,
    /// Upper limit of the bucket.
    pub upper: f64,
    /// Whether `lower` belongs to the bucket.
    pub lower_inclusive: bool,
    /// Whether `upper` belongs to the bucket.
    pub upper_inclusive: bool,
    /// Number of observations in the bucket.
    pub count: f64,
    /// Index within the schema. Allows comparing buckets of the same schema and side, and is
    /// meaningless for the zero bucket.
    pub index: i32,
}

impl Bucket {
    /// Creates the bucket with the given index on one side of the zero bucket.
    pub(crate) fn regular(side: Side, index: i32, count: f64, schema: i32) -> Bucket {
        let upper = boundary(index, schema);
        let lower = boundary(index.saturating_sub(1), schema);
        let (lower, upper) = match side {
            Side::Positive => (lower, upper),
            Side::Negative => (-upper, -lower),
        };

        Bucket {
            lower,
            upper,
            lower_inclusive: lower < 0.0,
            upper_inclusive: upper > 0.0,
            count,
            index,
        }
    }

    /// Creates the zero bucket, covering `[-threshold, threshold]`.
    pub(crate) fn zero(threshold: f64, count: f64) -> Bucket {
        Bucket {
            lower: -threshold,
            upper: threshold,
            lower_inclusive: true,
            upper_inclusive: true,
            count,
            index: 0,
        }
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let open = if self.lower_inclusive { '[' } else { '(' };
        let close = if self.upper_inclusive { ']' } else { ')' };
        write!(f, "{}{},{}{}:{}", open, self.lower, self.upper, close, self.count)
    }
}
