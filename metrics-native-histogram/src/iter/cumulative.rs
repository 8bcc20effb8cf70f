use crate::boundary::boundary;
use crate::layout::{Span, SparseLayout};
use crate::Bucket;

/// Iterates over a cumulative view of the positive buckets.
///
/// Every yielded bucket has a lower limit of negative infinity, and its count includes the zero
/// bucket and all positive buckets up to and including its upper limit. The populated zero bucket
/// comes first. Between two spans, one bucket is yielded for every unpopulated index, so that the
/// upper limits advance one bucket width at a time.
#[derive(Debug, Clone)]
pub struct CumulativeBuckets<'a> {
    spans: &'a [Span],
    buckets: &'a [f64],
    schema: i32,
    zero: Option<(f64, f64)>,
    span_idx: usize,
    idx_in_span: u32,
    bucket_idx: usize,
    next_index: i32,
    // Unpopulated indexes left to yield before the current span starts.
    pending_empty: u32,
    cumulative_count: f64,
}

impl<'a> CumulativeBuckets<'a> {
    pub(crate) fn new(
        positive: &'a SparseLayout,
        schema: i32,
        zero_threshold: f64,
        zero_count: f64,
    ) -> CumulativeBuckets<'a> {
        // Empty spans at either end would yield buckets outside of the populated index range.
        let end = positive.spans.iter().rposition(|span| span.length > 0).map_or(0, |last| last + 1);
        let spans = &positive.spans[..end];
        let first = spans.iter().position(|span| span.length > 0).unwrap_or(0);
        let next_index = spans.iter().take(first + 1).fold(0i32, |index, span| index.wrapping_add(span.offset));

        CumulativeBuckets {
            spans,
            buckets: &positive.buckets,
            schema,
            zero: Some((zero_threshold, zero_count)),
            span_idx: first,
            idx_in_span: 0,
            bucket_idx: 0,
            next_index,
            pending_empty: 0,
            cumulative_count: 0.0,
        }
    }

    fn current(&self, upper: f64, index: i32) -> Bucket {
        Bucket {
            lower: f64::NEG_INFINITY,
            upper,
            lower_inclusive: true,
            upper_inclusive: true,
            count: self.cumulative_count,
            index,
        }
    }
}

impl Iterator for CumulativeBuckets<'_> {
    type Item = Bucket;

    fn next(&mut self) -> Option<Bucket> {
        if let Some((threshold, count)) = self.zero.take() {
            if count != 0.0 {
                self.cumulative_count = count;
                return Some(self.current(threshold, 0));
            }
        }

        loop {
            if self.pending_empty > 0 {
                self.pending_empty -= 1;
                let index = self.next_index;
                self.next_index = self.next_index.wrapping_add(1);
                return Some(self.current(boundary(index, self.schema), index));
            }

            let span = self.spans.get(self.span_idx)?;
            if self.idx_in_span < span.length {
                self.cumulative_count += *self.buckets.get(self.bucket_idx)?;
                self.idx_in_span += 1;
                self.bucket_idx += 1;

                let index = self.next_index;
                self.next_index = self.next_index.wrapping_add(1);
                return Some(self.current(boundary(index, self.schema), index));
            }

            // Move on to the next span, walking through the gap in front of it first.
            self.span_idx += 1;
            self.idx_in_span = 0;
            if let Some(next) = self.spans.get(self.span_idx) {
                match u32::try_from(next.offset) {
                    Ok(gap) => self.pending_empty = gap,
                    Err(_) => self.next_index = self.next_index.wrapping_add(next.offset),
                }
            }
        }
    }
}
