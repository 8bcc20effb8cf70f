//! The sparse bucket layout shared by both sides of a histogram.
//!
//! A layout stores only populated bucket slots. The slots are described by a sequence of
//! [`Span`]s, each covering a run of consecutive bucket indexes, and the counts of all described
//! slots are stored back to back in `buckets`.
//!
//! The offset of the first span is the absolute index of its first bucket. The offset of every
//! following span is the number of unpopulated indexes between the end of the previous span and
//! its own start. For example, the spans `[{offset: -1, length: 2}, {offset: 1, length: 1}]`
//! describe the bucket indexes -1, 0, and 2.

use crate::HistogramError;

/// A run of consecutive bucket slots, preceded by a gap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Span {
    /// Absolute index of the first bucket for the first span, otherwise the number of unpopulated
    /// bucket indexes between the previous span and this one.
    pub offset: i32,
    /// Number of consecutive bucket slots covered.
    pub length: u32,
}

impl Span {
    /// Creates a new [`Span`].
    pub const fn new(offset: i32, length: u32) -> Span {
        Span { offset, length }
    }
}

/// Which side of the zero bucket a layout describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    /// Observations greater than the zero threshold.
    Positive,
    /// Observations less than the negated zero threshold. Indexes refer to absolute values.
    Negative,
}

/// Spans and bucket counts of one side of a histogram.
///
/// The lengths of all spans add up to the number of buckets. Layouts produced by addition or
/// subtraction may contain empty buckets, zero-length spans, or spans without a gap between them;
/// [`SparseLayout::compact`] brings them back into canonical form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseLayout {
    /// Spans describing which bucket indexes are present.
    pub spans: Vec<Span>,
    /// Counts of all present buckets, in span order.
    pub buckets: Vec<f64>,
}

impl SparseLayout {
    /// Creates a new, empty layout.
    pub fn new() -> SparseLayout {
        Default::default()
    }

    /// Creates a layout from existing spans and bucket counts.
    ///
    /// # Errors
    /// Returns an error if the spans do not describe exactly as many buckets as were given.
    pub fn from_parts(spans: Vec<Span>, buckets: Vec<f64>) -> Result<SparseLayout, HistogramError> {
        let layout = SparseLayout { spans, buckets };
        layout.validate()?;
        Ok(layout)
    }

    /// Checks that the spans describe exactly as many buckets as are stored, in ascending index
    /// order.
    ///
    /// # Errors
    /// Returns an error if the number of buckets described by the spans does not match the
    /// number of stored bucket counts, or if any span but the first has a negative offset.
    pub fn validate(&self) -> Result<(), HistogramError> {
        let expected = self.described_buckets();
        if usize::try_from(expected).map_or(true, |expected| expected != self.buckets.len()) {
            return Err(HistogramError::SpanBucketMismatch { expected, actual: self.buckets.len() });
        }
        if let Some((position, span)) = self.spans.iter().enumerate().skip(1).find(|(_, span)| span.offset < 0) {
            return Err(HistogramError::InvalidSpanOffset { position, offset: span.offset });
        }
        Ok(())
    }

    /// Returns `true` if no bucket slots are stored.
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Number of stored bucket slots, including empty ones.
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    /// Returns the absolute index and count of every stored bucket slot, in ascending index order.
    pub fn iter(&self) -> IndexedBuckets<'_> {
        IndexedBuckets::new(&self.spans, &self.buckets)
    }

    /// Sum of all bucket counts.
    pub fn total(&self) -> f64 {
        self.buckets.iter().sum()
    }

    pub(crate) fn scale(&mut self, factor: f64) {
        for count in self.buckets.iter_mut() {
            *count *= factor;
        }
    }

    fn described_buckets(&self) -> u64 {
        self.spans.iter().map(|span| u64::from(span.length)).sum()
    }
}

/// Decodes the spans of a layout into absolute bucket indexes.
///
/// Created by [`SparseLayout::iter`].
#[derive(Debug, Clone)]
pub struct IndexedBuckets<'a> {
    spans: &'a [Span],
    buckets: &'a [f64],
    span_idx: usize,
    idx_in_span: u32,
    bucket_idx: usize,
    span_entered: bool,
    next_index: i32,
}

impl<'a> IndexedBuckets<'a> {
    pub(crate) fn new(spans: &'a [Span], buckets: &'a [f64]) -> IndexedBuckets<'a> {
        IndexedBuckets {
            spans,
            buckets,
            span_idx: 0,
            idx_in_span: 0,
            bucket_idx: 0,
            span_entered: false,
            next_index: 0,
        }
    }
}

impl Iterator for IndexedBuckets<'_> {
    type Item = (i32, f64);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let span = self.spans.get(self.span_idx)?;
            if !self.span_entered {
                self.next_index = self.next_index.wrapping_add(span.offset);
                self.span_entered = true;
            }

            if self.idx_in_span < span.length {
                let count = *self.buckets.get(self.bucket_idx)?;
                let index = self.next_index;
                self.next_index = self.next_index.wrapping_add(1);
                self.idx_in_span += 1;
                self.bucket_idx += 1;
                return Some((index, count));
            }

            // Span exhausted (or of zero length), so move on to the next one.
            self.span_idx += 1;
            self.idx_in_span = 0;
            self.span_entered = false;
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.buckets.len().saturating_sub(self.bucket_idx)))
    }
}

#[cfg(test)]
mod tests {
    use super::{HistogramError, Span, SparseLayout};

    #[test]
    fn test_from_parts_validates_lengths() {
        let layout = SparseLayout::from_parts(vec![Span::new(-1, 2), Span::new(1, 1)], vec![1.0, 2.0, 3.0]);
        assert!(layout.is_ok());

        let layout = SparseLayout::from_parts(vec![Span::new(0, 2)], vec![1.0]);
        assert_eq!(layout, Err(HistogramError::SpanBucketMismatch { expected: 2, actual: 1 }));

        let layout = SparseLayout::from_parts(vec![], vec![1.0]);
        assert_eq!(layout, Err(HistogramError::SpanBucketMismatch { expected: 0, actual: 1 }));

        let layout = SparseLayout::from_parts(vec![Span::new(-3, 1), Span::new(-1, 1)], vec![1.0, 2.0]);
        assert_eq!(layout, Err(HistogramError::InvalidSpanOffset { position: 1, offset: -1 }));
    }

    #[test]
    fn test_iter_decodes_absolute_indexes() {
        let layout = SparseLayout::from_parts(
            vec![Span::new(-1, 2), Span::new(1, 1), Span::new(3, 2)],
            vec![1.0, 2.0, 3.0, 4.0, 5.0],
        )
        .unwrap();

        let decoded = layout.iter().collect::<Vec<_>>();
        assert_eq!(decoded, vec![(-1, 1.0), (0, 2.0), (2, 3.0), (6, 4.0), (7, 5.0)]);
        assert_eq!(layout.total(), 15.0);
        assert_eq!(layout.len(), 5);
    }

    #[test]
    fn test_iter_handles_degenerate_spans() {
        // Zero-length spans still contribute their offset, and zero offsets continue a run.
        let layout = SparseLayout::from_parts(
            vec![Span::new(2, 1), Span::new(3, 0), Span::new(1, 1), Span::new(0, 2)],
            vec![1.0, 2.0, 3.0, 4.0],
        )
        .unwrap();

        let indexes = layout.iter().map(|(index, _)| index).collect::<Vec<_>>();
        assert_eq!(indexes, vec![2, 7, 8, 9]);
    }

    #[test]
    fn test_empty_layout() {
        let layout = SparseLayout::new();
        assert!(layout.is_empty());
        assert!(layout.validate().is_ok());
        assert_eq!(layout.iter().next(), None);
    }
}
