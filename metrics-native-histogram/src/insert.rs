//! Inserting buckets into a sparse layout.
//!
//! Insertion is driven by an [`InsertCursor`] that remembers the last bucket touched, so that a
//! pass over ascending bucket indexes only ever scans forward through the layout.

use tracing::debug;

use crate::layout::{Span, SparseLayout};
use crate::HistogramError;

/// Position of the last bucket touched by [`SparseLayout::insert_or_accumulate`].
///
/// A cursor is only valid for a single pass of insertions with monotonically increasing indexes
/// into a single layout. Start every pass with a fresh cursor, and never share a cursor between
/// layouts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InsertCursor {
    position: Option<Position>,
    index: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Position {
    span: usize,
    bucket: usize,
    in_span: u32,
}

impl Position {
    const FIRST: Position = Position { span: 0, bucket: 0, in_span: 0 };
}

impl InsertCursor {
    /// Creates a cursor for a new insertion pass.
    pub fn new() -> InsertCursor {
        Default::default()
    }

    /// Index of the last bucket inserted or accumulated, if any.
    pub fn last_index(&self) -> Option<i32> {
        self.position.map(|_| self.index)
    }
}

impl SparseLayout {
    /// Adds `count` to the bucket at `index`, inserting the bucket if it does not exist yet.
    ///
    /// New buckets extend a directly adjacent span where possible, and otherwise get a new span
    /// of their own. A bucket closing the gap between two spans joins them, so no span with a
    /// zero offset is ever created. Existing buckets are never removed, even if their count drops
    /// to zero.
    ///
    /// Within one pass, `index` must not decrease from call to call. The total cost of a pass is
    /// linear in the size of the layout plus the number of insertions.
    ///
    /// # Errors
    /// Returns an error if `index` is smaller than the index of the previous call with the same
    /// cursor, or if the layout's spans do not match its buckets. The layout is left unmodified
    /// in both cases.
    pub fn insert_or_accumulate(
        &mut self,
        index: i32,
        count: f64,
        cursor: &mut InsertCursor,
    ) -> Result<(), HistogramError> {
        let (start, start_index) = match cursor.position {
            Some(position) => {
                if index < cursor.index {
                    debug!(previous = cursor.index, index, "Rejected out-of-order bucket insertion.");
                    return Err(HistogramError::OutOfOrderIndex { previous: cursor.index, index });
                }
                (position, cursor.index)
            }
            None => match self.insert_at_front(index, count)? {
                Some(position) => {
                    cursor.position = Some(position);
                    cursor.index = index;
                    return Ok(());
                }
                // We are behind the first bucket, so start from there.
                None => (Position::FIRST, self.spans[0].offset),
            },
        };

        let position = self.insert_from(start, i64::from(index) - i64::from(start_index), count)?;
        cursor.position = Some(position);
        cursor.index = index;
        Ok(())
    }

    /// Handles the first insertion of a pass, if it lands at or before the first bucket.
    fn insert_at_front(&mut self, index: i32, count: f64) -> Result<Option<Position>, HistogramError> {
        let Some(first) = self.spans.first_mut() else {
            if !self.buckets.is_empty() {
                return Err(self.mismatch());
            }
            self.spans.push(Span::new(index, 1));
            self.buckets.push(count);
            return Ok(Some(Position::FIRST));
        };

        if index < first.offset {
            if first.offset == index + 1 {
                first.offset -= 1;
                first.length += 1;
            } else {
                // The formerly first span now needs an offset relative to the new one.
                first.offset -= index + 1;
                self.spans.insert(0, Span::new(index, 1));
            }
            self.buckets.insert(0, count);
            return Ok(Some(Position::FIRST));
        }

        if index == first.offset && first.length > 0 {
            let Some(bucket) = self.buckets.first_mut() else {
                return Err(self.mismatch());
            };
            *bucket += count;
            return Ok(Some(Position::FIRST));
        }

        Ok(None)
    }

    /// Walks forward `delta` indexes from `start` and accumulates or inserts the bucket there.
    fn insert_from(&mut self, start: Position, mut delta: i64, count: f64) -> Result<Position, HistogramError> {
        let Position { span: mut span_idx, bucket: mut bucket_idx, mut in_span } = start;

        loop {
            let span = self.spans[span_idx];
            let remaining = i64::from(span.length) - i64::from(in_span);
            if delta < remaining {
                // The bucket is in the current span.
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                {
                    bucket_idx += delta as usize;
                    in_span += delta as u32;
                }
                let Some(bucket) = self.buckets.get_mut(bucket_idx) else {
                    return Err(self.mismatch());
                };
                *bucket += count;
                return Ok(Position { span: span_idx, bucket: bucket_idx, in_span });
            }

            delta -= remaining;
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            {
                bucket_idx += remaining as usize;
            }
            span_idx += 1;

            let in_gap = self.spans.get(span_idx).map_or(true, |next| delta < i64::from(next.offset));
            if !in_gap {
                // Try the start of the next span.
                delta -= i64::from(self.spans[span_idx].offset);
                in_span = 0;
                continue;
            }

            // The bucket is in the gap behind the previous span, or there are no further spans.
            if bucket_idx > self.buckets.len() {
                return Err(self.mismatch());
            }
            self.buckets.insert(bucket_idx, count);

            if delta == 0 {
                // Directly after the previous span, so extend it.
                span_idx -= 1;
                let previous = &mut self.spans[span_idx];
                in_span = previous.length;
                previous.length += 1;
                if let Some(next) = self.spans.get_mut(span_idx + 1) {
                    next.offset -= 1;
                    if next.offset == 0 {
                        // The gap is closed, so both spans become one.
                        let next = self.spans.remove(span_idx + 1);
                        self.spans[span_idx].length += next.length;
                    }
                }
            } else if self.spans.get(span_idx).is_some_and(|next| delta == i64::from(next.offset) - 1) {
                // Directly before the next span, so extend it.
                let next = &mut self.spans[span_idx];
                next.offset -= 1;
                next.length += 1;
                in_span = 0;
            } else {
                // Gaps between valid bucket indexes always fit into an offset.
                #[allow(clippy::cast_possible_truncation)]
                let gap = delta as i32;
                if let Some(next) = self.spans.get_mut(span_idx) {
                    next.offset -= gap + 1;
                }
                self.spans.insert(span_idx, Span::new(gap, 1));
                in_span = 0;
            }
            return Ok(Position { span: span_idx, bucket: bucket_idx, in_span });
        }
    }

    fn mismatch(&self) -> HistogramError {
        let expected = self.spans.iter().map(|span| u64::from(span.length)).sum();
        HistogramError::SpanBucketMismatch { expected, actual: self.buckets.len() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn insert_all(layout: &mut SparseLayout, buckets: &[(i32, f64)]) {
        let mut cursor = InsertCursor::new();
        for &(index, count) in buckets {
            layout.insert_or_accumulate(index, count, &mut cursor).unwrap();
        }
    }

    fn layout(spans: Vec<Span>, buckets: Vec<f64>) -> SparseLayout {
        SparseLayout::from_parts(spans, buckets).unwrap()
    }

    #[test]
    fn test_insert_into_empty_layout() {
        let mut layout = SparseLayout::new();
        insert_all(&mut layout, &[(-1, 1.0), (0, 2.0), (2, 3.0)]);

        assert_eq!(layout.spans, vec![Span::new(-1, 2), Span::new(1, 1)]);
        assert_eq!(layout.buckets, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_accumulate_existing_buckets() {
        let mut layout = layout(vec![Span::new(0, 2), Span::new(2, 2)], vec![1.0, 2.0, 3.0, 4.0]);
        insert_all(&mut layout, &[(0, 1.0), (1, 1.0), (4, 1.0), (5, 1.0)]);

        assert_eq!(layout.spans, vec![Span::new(0, 2), Span::new(2, 2)]);
        assert_eq!(layout.buckets, vec![2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_insert_before_first_span() {
        // Adjacent to the first span: extend it.
        let mut adjacent = layout(vec![Span::new(3, 1)], vec![1.0]);
        insert_all(&mut adjacent, &[(2, 5.0)]);
        assert_eq!(adjacent.spans, vec![Span::new(2, 2)]);
        assert_eq!(adjacent.buckets, vec![5.0, 1.0]);

        // Not adjacent: new span, with the old first span made relative.
        let mut apart = layout(vec![Span::new(3, 1), Span::new(1, 1)], vec![1.0, 2.0]);
        insert_all(&mut apart, &[(-2, 5.0)]);
        assert_eq!(apart.spans, vec![Span::new(-2, 1), Span::new(4, 1), Span::new(1, 1)]);
        assert_eq!(apart.buckets, vec![5.0, 1.0, 2.0]);
        assert_eq!(apart.iter().map(|(i, _)| i).collect::<Vec<_>>(), vec![-2, 3, 5]);
    }

    #[test]
    fn test_insert_into_gaps() {
        let mut layout = layout(vec![Span::new(0, 1), Span::new(5, 1)], vec![1.0, 2.0]);
        // 1 extends the span at 0, 5 extends the span at 6 backwards, and 3 sits alone.
        insert_all(&mut layout, &[(1, 3.0), (3, 4.0), (5, 5.0)]);

        assert_eq!(layout.spans, vec![Span::new(0, 2), Span::new(1, 1), Span::new(1, 2)]);
        assert_eq!(layout.buckets, vec![1.0, 3.0, 4.0, 5.0, 2.0]);
        assert_eq!(layout.iter().map(|(i, _)| i).collect::<Vec<_>>(), vec![0, 1, 3, 5, 6]);
    }

    #[test]
    fn test_insert_closing_a_gap_merges_spans() {
        let mut layout = layout(vec![Span::new(0, 1), Span::new(1, 1), Span::new(3, 1)], vec![1.0, 2.0, 4.0]);
        insert_all(&mut layout, &[(1, 3.0), (2, 1.0), (4, 5.0)]);

        assert_eq!(layout.spans, vec![Span::new(0, 3), Span::new(1, 1), Span::new(1, 1)]);
        assert_eq!(layout.buckets, vec![1.0, 3.0, 3.0, 5.0, 4.0]);
        assert_eq!(layout.iter().map(|(i, _)| i).collect::<Vec<_>>(), vec![0, 1, 2, 4, 6]);
    }

    #[test]
    fn test_insert_after_last_span() {
        let mut layout = layout(vec![Span::new(0, 2)], vec![1.0, 2.0]);
        insert_all(&mut layout, &[(2, 3.0), (10, 4.0), (11, 5.0)]);

        assert_eq!(layout.spans, vec![Span::new(0, 3), Span::new(7, 2)]);
        assert_eq!(layout.buckets, vec![1.0, 2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_reject_out_of_order_index() {
        let mut layout = SparseLayout::new();
        let mut cursor = InsertCursor::new();
        layout.insert_or_accumulate(4, 1.0, &mut cursor).unwrap();
        layout.insert_or_accumulate(4, 1.0, &mut cursor).unwrap();
        assert_eq!(cursor.last_index(), Some(4));

        let result = layout.insert_or_accumulate(3, 1.0, &mut cursor);
        assert_eq!(result, Err(HistogramError::OutOfOrderIndex { previous: 4, index: 3 }));
        assert_eq!(layout.spans, vec![Span::new(4, 1)]);
        assert_eq!(layout.buckets, vec![2.0]);
    }

    #[test]
    fn test_reject_mismatched_layout() {
        let mut layout = SparseLayout { spans: vec![], buckets: vec![1.0] };
        let result = layout.insert_or_accumulate(0, 1.0, &mut InsertCursor::new());
        assert_eq!(result, Err(HistogramError::SpanBucketMismatch { expected: 0, actual: 1 }));
    }
}
