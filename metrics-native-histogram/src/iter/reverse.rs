use crate::layout::{Side, Span, SparseLayout};
use crate::Bucket;

/// Iterates over the buckets of one side in descending index order.
///
/// For the positive side, this starts at the highest bucket and goes down towards the zero bucket.
/// For the negative side, it starts at the lowest bucket and goes up towards the zero bucket.
#[derive(Debug, Clone)]
pub struct ReverseBuckets<'a> {
    spans: &'a [Span],
    buckets: &'a [f64],
    side: Side,
    schema: i32,
    // Number of spans not yet fully consumed; the current span is `spans[span_idx - 1]`.
    span_idx: usize,
    remaining_in_span: u32,
    // Number of buckets not yet consumed.
    bucket_idx: usize,
    // One past the index of the next bucket to yield.
    end_index: i32,
}

impl<'a> ReverseBuckets<'a> {
    pub(crate) fn new(layout: &'a SparseLayout, side: Side, schema: i32) -> ReverseBuckets<'a> {
        let spans = layout.spans.as_slice();
        let end_index = spans
            .iter()
            .fold(0i32, |end, span| end.wrapping_add(span.offset).wrapping_add_unsigned(span.length));

        ReverseBuckets {
            spans,
            buckets: &layout.buckets,
            side,
            schema,
            span_idx: spans.len(),
            remaining_in_span: spans.last().map_or(0, |span| span.length),
            bucket_idx: layout.buckets.len(),
            end_index,
        }
    }
}

impl Iterator for ReverseBuckets<'_> {
    type Item = Bucket;

    fn next(&mut self) -> Option<Bucket> {
        loop {
            if self.remaining_in_span > 0 {
                self.bucket_idx = self.bucket_idx.checked_sub(1)?;
                self.remaining_in_span -= 1;
                self.end_index = self.end_index.wrapping_sub(1);

                let count = *self.buckets.get(self.bucket_idx)?;
                return Some(Bucket::regular(self.side, self.end_index, count, self.schema));
            }

            // Step over the gap in front of the exhausted span. Pathological spans of length
            // zero are skipped the same way.
            if self.span_idx <= 1 {
                self.span_idx = 0;
                return None;
            }
            self.end_index = self.end_index.wrapping_sub(self.spans[self.span_idx - 1].offset);
            self.span_idx -= 1;
            self.remaining_in_span = self.spans[self.span_idx - 1].length;
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.bucket_idx))
    }
}
