use crate::boundary::{is_valid_schema, schema_from_bucket_factor};
use crate::HistogramError;

/// Configuration for a native histogram.
///
/// Determines the resolution of the exponential buckets and the width of the zero bucket. Two
/// histograms can only be added to or subtracted from each other if they share the same
/// configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistogramConfig {
    /// The schema of the exponential buckets, within `[-4, 8]`.
    schema: i32,
    /// The zero threshold. Values within [`-zero_threshold`, `zero_threshold`] are
    /// considered zero and tracked in a special zero bucket.
    zero_threshold: f64,
}

impl HistogramConfig {
    /// Creates a new configuration from an explicit schema.
    ///
    /// # Errors
    /// Returns an error if `schema` is outside of `[-4, 8]`, or if `zero_threshold` is negative or
    /// NaN.
    pub fn new(schema: i32, zero_threshold: f64) -> Result<Self, HistogramError> {
        if !is_valid_schema(schema) {
            return Err(HistogramError::InvalidSchema(schema));
        }
        if zero_threshold.is_nan() || zero_threshold < 0.0 {
            return Err(HistogramError::InvalidZeroThreshold(zero_threshold));
        }

        Ok(Self { schema, zero_threshold })
    }

    /// Creates a new configuration from a bucket growth factor.
    ///
    /// The base for the exponential buckets must be greater than 1. Common values are 2.0 for
    /// power-of-2 buckets, or smaller values like 1.1 for finer granularity. The factor is mapped
    /// to the closest supported schema.
    ///
    /// # Errors
    /// Returns an error if `bucket_factor` is not greater than 1.0, or if `zero_threshold` is
    /// negative or NaN.
    pub fn from_bucket_factor(bucket_factor: f64, zero_threshold: f64) -> Result<Self, HistogramError> {
        let schema = schema_from_bucket_factor(bucket_factor)?;
        Self::new(schema, zero_threshold)
    }

    /// Returns the schema.
    pub fn schema(&self) -> i32 {
        self.schema
    }

    /// Returns the zero threshold.
    pub fn zero_threshold(&self) -> f64 {
        self.zero_threshold
    }
}
