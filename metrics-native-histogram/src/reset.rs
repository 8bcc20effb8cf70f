//! Counter reset detection.
//!
//! The counts of a histogram series only ever grow, unless the series was reset. Comparing two
//! consecutive samples therefore tells us whether a reset happened in between. Resolution and
//! zero bucket width may change between samples, so the previous sample is reconciled to the
//! layout of the current one before comparing bucket by bucket.

use tracing::trace;

use crate::boundary::{boundary, is_valid_schema};
use crate::iter::ForwardBuckets;
use crate::layout::Side;
use crate::FloatHistogram;

impl FloatHistogram {
    /// Returns `true` if this histogram, compared to the `previous` sample of the same series,
    /// indicates a counter reset.
    ///
    /// This is the case if the total count decreased, if the schema got finer, if the zero
    /// bucket shrank or cannot be widened to the current zero threshold without splitting a
    /// populated bucket, or if any bucket count decreased. Buckets of the previous sample are
    /// merged into the current schema before comparing them, and buckets absorbed by a widened
    /// zero bucket count towards the zero bucket.
    pub fn detect_reset(&self, previous: &FloatHistogram) -> bool {
        if self.count < previous.count {
            trace!(current = self.count, previous = previous.count, "Reset detected: count decreased.");
            return true;
        }
        if !is_valid_schema(self.schema) || !is_valid_schema(previous.schema) {
            trace!(current = self.schema, previous = previous.schema, "Reset detected: schema out of range.");
            return true;
        }
        if self.schema > previous.schema {
            trace!(current = self.schema, previous = previous.schema, "Reset detected: schema increased.");
            return true;
        }

        let Some(previous_zero_count) = previous.zero_count_for_larger_threshold(self.zero_threshold) else {
            trace!(
                current = self.zero_threshold,
                previous = previous.zero_threshold,
                "Reset detected: zero threshold cannot be reconciled."
            );
            return true;
        };
        if self.zero_count < previous_zero_count {
            trace!(current = self.zero_count, previous = previous_zero_count, "Reset detected: zero count decreased.");
            return true;
        }

        [Side::Positive, Side::Negative].into_iter().any(|side| self.side_reset(previous, side))
    }

    /// Returns the zero count `self` would have with its zero threshold widened to `threshold`.
    ///
    /// Every bucket whose lower boundary lies below the new threshold is absorbed into the zero
    /// bucket. A bucket whose upper boundary equals the threshold is absorbed entirely. Returns
    /// `None` if the threshold is smaller than the current one, or if it would end up inside a
    /// populated bucket.
    pub fn zero_count_for_larger_threshold(&self, threshold: f64) -> Option<f64> {
        if threshold == self.zero_threshold {
            return Some(self.zero_count);
        }
        if threshold.is_nan() || threshold < self.zero_threshold {
            return None;
        }

        let mut count = self.zero_count;
        for layout in [&self.positive, &self.negative] {
            for (index, bucket_count) in layout.iter() {
                if boundary(index.saturating_sub(1), self.schema) >= threshold {
                    break;
                }
                if boundary(index, self.schema) > threshold {
                    // The threshold splits this bucket.
                    if bucket_count != 0.0 {
                        return None;
                    }
                    break;
                }
                count += bucket_count;
            }
        }
        Some(count)
    }

    fn side_reset(&self, previous: &FloatHistogram, side: Side) -> bool {
        let iterators = self.bucket_iter(side, self.zero_threshold, self.schema).and_then(|current| {
            previous.bucket_iter(side, self.zero_threshold, self.schema).map(|previous| (current, previous))
        });
        match iterators {
            Ok((current, previous)) => buckets_reset(current, previous, side),
            Err(e) => {
                trace!(error = %e, ?side, "Reset detected: buckets cannot be compared.");
                true
            }
        }
    }
}

/// Walks both sides in ascending index order, looking for a previous bucket that shrank or is
/// missing from the current sample.
fn buckets_reset(mut current: ForwardBuckets<'_>, previous: ForwardBuckets<'_>, side: Side) -> bool {
    let mut current_bucket = current.next();
    for previous_bucket in previous {
        while current_bucket.is_some_and(|b| b.index < previous_bucket.index) {
            current_bucket = current.next();
        }

        let reset = match current_bucket {
            Some(b) if b.index == previous_bucket.index => b.count < previous_bucket.count,
            // Only present in the previous sample.
            _ => previous_bucket.count != 0.0,
        };
        if reset {
            trace!(
                ?side,
                index = previous_bucket.index,
                current = current_bucket.filter(|b| b.index == previous_bucket.index).map_or(0.0, |b| b.count),
                previous = previous_bucket.count,
                "Reset detected: bucket count decreased."
            );
            return true;
        }
    }
    false
}
