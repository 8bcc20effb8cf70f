use std::fmt;

use tracing::debug;

use crate::iter::{AllBuckets, CumulativeBuckets, ForwardBuckets, ReverseBuckets};
use crate::layout::{Side, SparseLayout};
use crate::{Bucket, HistogramConfig, HistogramError, InsertCursor};

/// A sparse, exponentially bucketed histogram with floating-point counts.
///
/// Observations are sorted into a zero bucket, covering `[-zero_threshold, zero_threshold]`, and
/// into exponential buckets on either side of it. The boundaries of the exponential buckets are
/// determined by the schema: every power of two is divided into `2^schema` buckets. Only
/// populated buckets are stored, using one [`SparseLayout`] per side.
///
/// Counts are floats so that the histogram can hold the results of aggregations and rate
/// computations, which is also why nothing prevents them from going negative while subtracting.
///
/// `FloatHistogram` is a plain value: cloning it produces a fully independent deep copy, and all
/// mutating operations return `&mut Self` so that they can be chained.
#[derive(Debug, Clone, PartialEq)]
pub struct FloatHistogram {
    /// Resolution of the exponential buckets, within `[-4, 8]`.
    ///
    /// Bucket boundaries of a histogram with a schema outside of that range are computed at the
    /// nearest supported schema. Resampling such a histogram fails, and
    /// [`detect_reset`](FloatHistogram::detect_reset) reports a reset.
    pub schema: i32,
    /// Half-width of the zero bucket.
    pub zero_threshold: f64,
    /// Number of observations in the zero bucket.
    pub zero_count: f64,
    /// Total number of observations, including the zero bucket.
    pub count: f64,
    /// Sum of all observations.
    pub sum: f64,
    /// Buckets for observations greater than `zero_threshold`.
    pub positive: SparseLayout,
    /// Buckets for observations less than `-zero_threshold`, indexed by absolute value.
    pub negative: SparseLayout,
}

impl FloatHistogram {
    /// Creates a new, empty histogram.
    pub fn new(config: HistogramConfig) -> FloatHistogram {
        FloatHistogram {
            schema: config.schema(),
            zero_threshold: config.zero_threshold(),
            zero_count: 0.0,
            count: 0.0,
            sum: 0.0,
            positive: SparseLayout::new(),
            negative: SparseLayout::new(),
        }
    }

    /// Creates a histogram from already decoded parts.
    ///
    /// # Errors
    /// Returns an error if the spans of either layout do not match its buckets.
    pub fn from_parts(
        config: HistogramConfig,
        zero_count: f64,
        count: f64,
        sum: f64,
        positive: SparseLayout,
        negative: SparseLayout,
    ) -> Result<FloatHistogram, HistogramError> {
        positive.validate()?;
        negative.validate()?;

        Ok(FloatHistogram {
            schema: config.schema(),
            zero_threshold: config.zero_threshold(),
            zero_count,
            count,
            sum,
            positive,
            negative,
        })
    }

    /// Returns the zero bucket.
    pub fn zero_bucket(&self) -> Bucket {
        Bucket::zero(self.zero_threshold, self.zero_count)
    }

    /// Multiplies the zero count, count, sum, and all bucket counts by `factor`.
    ///
    /// The factor is not validated. A negative factor results in negative counts.
    pub fn scale(&mut self, factor: f64) -> &mut Self {
        self.zero_count *= factor;
        self.count *= factor;
        self.sum *= factor;
        self.positive.scale(factor);
        self.negative.scale(factor);
        self
    }

    /// Adds `other` to this histogram.
    ///
    /// All buckets of `other` are accumulated into the matching buckets of this histogram, which
    /// are created if necessary. The result is not compacted, so it may contain empty buckets and
    /// spans without a gap between them.
    ///
    /// # Errors
    /// Returns an error if the histograms differ in schema or zero threshold, or if either has
    /// a malformed layout. This histogram is left unmodified in that case.
    pub fn add(&mut self, other: &FloatHistogram) -> Result<&mut Self, HistogramError> {
        self.accumulate(other, 1.0)?;
        Ok(self)
    }

    /// Subtracts `other` from this histogram.
    ///
    /// Works like [`FloatHistogram::add`], with all counts of `other` negated.
    ///
    /// # Errors
    /// Returns an error if the histograms differ in schema or zero threshold, or if either has
    /// a malformed layout. This histogram is left unmodified in that case.
    pub fn sub(&mut self, other: &FloatHistogram) -> Result<&mut Self, HistogramError> {
        self.accumulate(other, -1.0)?;
        Ok(self)
    }

    /// Compacts both layouts. See [`SparseLayout::compact`].
    pub fn compact(&mut self, max_empty_buckets: usize) -> &mut Self {
        self.positive.compact(max_empty_buckets);
        self.negative.compact(max_empty_buckets);
        self
    }

    /// Iterates over the positive buckets in ascending order.
    pub fn positive_buckets(&self) -> ForwardBuckets<'_> {
        ForwardBuckets::new(&self.positive, Side::Positive, self.schema)
    }

    /// Iterates over the negative buckets in descending order of value, starting next to the zero
    /// bucket.
    pub fn negative_buckets(&self) -> ForwardBuckets<'_> {
        ForwardBuckets::new(&self.negative, Side::Negative, self.schema)
    }

    /// Iterates over the buckets of one side, starting next to the zero bucket.
    ///
    /// Buckets whose upper boundary (as an absolute value) is not greater than
    /// `absolute_start_value` are skipped, and the remaining buckets are merged into
    /// `target_schema`.
    ///
    /// # Errors
    /// Returns an error if the schema of the histogram or `target_schema` is invalid, or if
    /// `target_schema` is finer than the schema of the histogram.
    pub fn bucket_iter(
        &self,
        side: Side,
        absolute_start_value: f64,
        target_schema: i32,
    ) -> Result<ForwardBuckets<'_>, HistogramError> {
        ForwardBuckets::resampled(self.layout(side), side, self.schema, absolute_start_value, target_schema)
    }

    /// Iterates over the positive buckets in descending order.
    pub fn positive_reverse_buckets(&self) -> ReverseBuckets<'_> {
        ReverseBuckets::new(&self.positive, Side::Positive, self.schema)
    }

    /// Iterates over the negative buckets in ascending order of value, ending next to the zero
    /// bucket.
    pub fn negative_reverse_buckets(&self) -> ReverseBuckets<'_> {
        ReverseBuckets::new(&self.negative, Side::Negative, self.schema)
    }

    /// Iterates over all buckets in ascending order of value.
    pub fn all_buckets(&self) -> AllBuckets<'_> {
        AllBuckets::new(self.negative_reverse_buckets(), self.zero_bucket(), self.positive_buckets())
    }

    /// Iterates over the cumulative zero and positive buckets.
    ///
    /// # Errors
    /// Returns an error if the histogram has any negative buckets.
    pub fn cumulative_buckets(&self) -> Result<CumulativeBuckets<'_>, HistogramError> {
        if !self.negative.is_empty() {
            return Err(HistogramError::NegativeBuckets);
        }
        Ok(CumulativeBuckets::new(&self.positive, self.schema, self.zero_threshold, self.zero_count))
    }

    pub(crate) fn layout(&self, side: Side) -> &SparseLayout {
        match side {
            Side::Positive => &self.positive,
            Side::Negative => &self.negative,
        }
    }

    fn accumulate(&mut self, other: &FloatHistogram, sign: f64) -> Result<(), HistogramError> {
        self.check_compatible(other)?;

        self.zero_count += sign * other.zero_count;
        self.count += sign * other.count;
        self.sum += sign * other.sum;
        merge_layout(&mut self.positive, &other.positive, sign)?;
        merge_layout(&mut self.negative, &other.negative, sign)
    }

    fn check_compatible(&self, other: &FloatHistogram) -> Result<(), HistogramError> {
        if self.schema != other.schema {
            debug!(left = self.schema, right = other.schema, "Rejected combining histograms with different schemas.");
            return Err(HistogramError::SchemaMismatch { left: self.schema, right: other.schema });
        }
        if self.zero_threshold != other.zero_threshold {
            debug!(
                left = self.zero_threshold,
                right = other.zero_threshold,
                "Rejected combining histograms with different zero thresholds."
            );
            return Err(HistogramError::ZeroThresholdMismatch {
                left: self.zero_threshold,
                right: other.zero_threshold,
            });
        }

        // With all layouts well-formed, merging cannot fail halfway through.
        for layout in [&self.positive, &self.negative, &other.positive, &other.negative] {
            if let Err(e) = layout.validate() {
                debug!(error = %e, "Rejected combining histograms with a malformed layout.");
                return Err(e);
            }
        }
        Ok(())
    }
}

fn merge_layout(target: &mut SparseLayout, source: &SparseLayout, sign: f64) -> Result<(), HistogramError> {
    let mut cursor = InsertCursor::new();
    for (index, count) in source.iter() {
        target.insert_or_accumulate(index, sign * count, &mut cursor)?;
    }
    Ok(())
}

impl fmt::Display for FloatHistogram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{count:{}, sum:{}", self.count, self.sum)?;
        for bucket in self.negative_reverse_buckets().filter(|b| b.count != 0.0) {
            write!(f, ", {}", bucket)?;
        }
        if self.zero_count != 0.0 {
            write!(f, ", {}", self.zero_bucket())?;
        }
        for bucket in self.positive_buckets().filter(|b| b.count != 0.0) {
            write!(f, ", {}", bucket)?;
        }
        write!(f, "}}")
    }
}
