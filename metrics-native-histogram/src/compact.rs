use tracing::{debug, trace};

use crate::layout::{Span, SparseLayout};

impl SparseLayout {
    /// Brings the layout into canonical form.
    ///
    /// Spans without a gap between them are merged, zero-length spans are removed, and runs of
    /// empty buckets are cut out. Afterwards, spans separated by at most `max_empty_buckets`
    /// unpopulated indexes are merged again, storing the gap as explicit empty buckets. Runs of
    /// at most `max_empty_buckets` empty buckets inside a span are kept for the same reason.
    ///
    /// The set of populated indexes and their counts is unchanged. Layouts whose spans do not
    /// match their buckets are left untouched.
    pub fn compact(&mut self, max_empty_buckets: usize) {
        if let Err(e) = self.validate() {
            debug!(error = %e, "Skipping compaction of invalid layout.");
            return;
        }
        if self.buckets.is_empty() {
            // Only zero-length spans can be left.
            self.spans.clear();
            return;
        }

        let (spans_before, buckets_before) = (self.spans.len(), self.buckets.len());

        self.merge_adjacent_spans();
        self.remove_empty_spans();
        self.cut_empty_buckets(max_empty_buckets);
        if max_empty_buckets > 0 {
            self.merge_close_spans(max_empty_buckets);
        }

        if spans_before != self.spans.len() || buckets_before != self.buckets.len() {
            trace!(
                spans_before,
                spans_after = self.spans.len(),
                buckets_before,
                buckets_after = self.buckets.len(),
                "Compacted layout."
            );
        }
    }

    /// Folds spans with a zero offset into their predecessor.
    fn merge_adjacent_spans(&mut self) {
        self.spans.dedup_by(|next, previous| {
            if next.offset == 0 {
                previous.length += next.length;
                true
            } else {
                false
            }
        });
    }

    /// Drops zero-length spans, moving their offset onto the following span.
    fn remove_empty_spans(&mut self) {
        let mut carried = 0;
        self.spans.retain_mut(|span| {
            if span.length == 0 {
                carried += span.offset;
                return false;
            }
            span.offset += carried;
            carried = 0;
            true
        });
    }

    fn cut_empty_buckets(&mut self, max_empty_buckets: usize) {
        let mut bucket_idx = 0;
        let mut span_idx = 0;
        let mut in_span = 0u32;

        while bucket_idx < self.buckets.len() {
            let span_length = self.spans[span_idx].length;
            let left_in_span = span_length - in_span;
            let empty = self.buckets[bucket_idx..]
                .iter()
                .take(left_in_span as usize)
                .take_while(|count| **count == 0.0)
                .count();

            if empty == 0 {
                bucket_idx += 1;
                in_span += 1;
                if in_span >= span_length {
                    span_idx += 1;
                    in_span = 0;
                }
                continue;
            }

            // Short runs strictly inside a span stay.
            #[allow(clippy::cast_possible_truncation)]
            let run = empty as u32;
            if in_span > 0 && run < left_in_span && empty <= max_empty_buckets {
                bucket_idx += empty;
                in_span += run;
                continue;
            }

            self.buckets.drain(bucket_idx..bucket_idx + empty);

            if in_span == 0 {
                if run == span_length {
                    // The whole span is empty.
                    let removed = self.spans.remove(span_idx);
                    if let Some(next) = self.spans.get_mut(span_idx) {
                        next.offset += removed.offset + removed.length as i32;
                    }
                } else {
                    // Cut off the start of the span.
                    let span = &mut self.spans[span_idx];
                    span.length -= run;
                    span.offset += run as i32;
                }
                continue;
            }

            // Cut from the middle or the end of the span, splitting off the rest.
            let rest = Span::new(run as i32, span_length - in_span - run);
            self.spans[span_idx].length = in_span;
            span_idx += 1;
            in_span = 0;
            if rest.length == 0 {
                if let Some(next) = self.spans.get_mut(span_idx) {
                    next.offset += rest.offset;
                }
            } else {
                self.spans.insert(span_idx, rest);
            }
        }
    }

    fn merge_close_spans(&mut self, max_empty_buckets: usize) {
        let Some(first) = self.spans.first() else {
            return;
        };
        let mut bucket_idx = first.length as usize;
        let mut span_idx = 1;

        while span_idx < self.spans.len() {
            let span = self.spans[span_idx];
            let gap = usize::try_from(span.offset).unwrap_or(usize::MAX);
            if gap > max_empty_buckets {
                bucket_idx += span.length as usize;
                span_idx += 1;
                continue;
            }

            #[allow(clippy::cast_possible_truncation)]
            {
                self.spans[span_idx - 1].length += gap as u32 + span.length;
            }
            self.spans.remove(span_idx);
            self.buckets.splice(bucket_idx..bucket_idx, std::iter::repeat(0.0).take(gap));
            bucket_idx += gap + span.length as usize;
        }
    }
}
