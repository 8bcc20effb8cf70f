use thiserror::Error;

/// Errors that could occur while building, combining, or reading a histogram.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HistogramError {
    /// The schema is outside of the supported range.
    #[error("schema {0} is outside of the supported range [-4, 8]")]
    InvalidSchema(i32),

    /// The zero threshold is negative or NaN.
    #[error("zero threshold must be non-negative, got {0}")]
    InvalidZeroThreshold(f64),

    /// The bucket factor does not describe growing buckets.
    #[error("bucket factor must be greater than 1.0, got {0}")]
    InvalidBucketFactor(f64),

    /// The spans of a layout do not describe as many buckets as were provided.
    #[error("spans describe {expected} buckets but {actual} bucket counts were provided")]
    SpanBucketMismatch {
        /// Number of buckets described by the spans.
        expected: u64,
        /// Number of bucket counts provided.
        actual: usize,
    },

    /// A span other than the first one has a negative offset, so bucket indexes are not ascending.
    #[error("span {position} has negative offset {offset}")]
    InvalidSpanOffset {
        /// Position of the offending span.
        position: usize,
        /// Offset of the offending span.
        offset: i32,
    },

    /// Buckets can only be merged into a coarser (or equal) schema.
    #[error("cannot merge buckets from schema {from} into finer schema {to}")]
    SchemaMerge {
        /// Schema of the histogram being iterated.
        from: i32,
        /// Requested target schema.
        to: i32,
    },

    /// Cumulative iteration was requested for a histogram with negative buckets.
    #[error("cumulative iteration is not supported for histograms with negative buckets")]
    NegativeBuckets,

    /// Two histograms with different schemas were combined.
    #[error("cannot combine histograms with different schemas ({left} and {right})")]
    SchemaMismatch {
        /// Schema of the receiving histogram.
        left: i32,
        /// Schema of the operand.
        right: i32,
    },

    /// Two histograms with different zero thresholds were combined.
    #[error("cannot combine histograms with different zero thresholds ({left} and {right})")]
    ZeroThresholdMismatch {
        /// Zero threshold of the receiving histogram.
        left: f64,
        /// Zero threshold of the operand.
        right: f64,
    },

    /// A bucket index was inserted after a larger one within the same insertion pass.
    #[error("bucket index {index} was inserted after index {previous}")]
    OutOfOrderIndex {
        /// Index of the previously inserted bucket.
        previous: i32,
        /// Index that was attempted to be inserted.
        index: i32,
    },
}
