use std::iter::Peekable;

use crate::boundary::{boundary, is_valid_schema, target_index};
use crate::layout::{IndexedBuckets, Side, SparseLayout};
use crate::{Bucket, HistogramError};

/// Iterates over the buckets of one side in ascending index order.
///
/// For the positive side, this starts next to the zero bucket and goes up. For the negative side,
/// it also starts next to the zero bucket but goes down, as negative indexes refer to absolute
/// values.
///
/// The iterator can merge the buckets to a coarser target schema on the fly: all consecutive
/// source buckets falling into the same target bucket are summed up and reported as one bucket of
/// the target schema.
#[derive(Debug, Clone)]
pub struct ForwardBuckets<'a> {
    source: Peekable<IndexedBuckets<'a>>,
    side: Side,
    schema: i32,
    target_schema: i32,
}

impl<'a> ForwardBuckets<'a> {
    pub(crate) fn new(layout: &'a SparseLayout, side: Side, schema: i32) -> ForwardBuckets<'a> {
        ForwardBuckets { source: layout.iter().peekable(), side, schema, target_schema: schema }
    }

    /// Creates an iterator that skips leading buckets and merges buckets into `target_schema`.
    ///
    /// All buckets whose upper boundary (as an absolute value) is not greater than
    /// `absolute_start_value` are skipped. Skipping happens at the resolution of `schema`, before
    /// any merging, so a target bucket only ever sums up source buckets that were not skipped.
    pub(crate) fn resampled(
        layout: &'a SparseLayout,
        side: Side,
        schema: i32,
        absolute_start_value: f64,
        target_schema: i32,
    ) -> Result<ForwardBuckets<'a>, HistogramError> {
        if !is_valid_schema(schema) {
            return Err(HistogramError::InvalidSchema(schema));
        }
        if target_schema > schema {
            return Err(HistogramError::SchemaMerge { from: schema, to: target_schema });
        }
        if !is_valid_schema(target_schema) {
            return Err(HistogramError::InvalidSchema(target_schema));
        }

        let mut source = layout.iter().peekable();
        if absolute_start_value > 0.0 {
            while let Some(&(index, _)) = source.peek() {
                if boundary(index, schema) > absolute_start_value {
                    break;
                }
                source.next();
            }
        }

        Ok(ForwardBuckets { source, side, schema, target_schema })
    }
}

impl Iterator for ForwardBuckets<'_> {
    type Item = Bucket;

    fn next(&mut self) -> Option<Bucket> {
        let (index, mut count) = self.source.next()?;
        if self.schema == self.target_schema {
            return Some(Bucket::regular(self.side, index, count, self.schema));
        }

        let merged = target_index(index, self.schema, self.target_schema);
        while let Some(&(next, next_count)) = self.source.peek() {
            if target_index(next, self.schema, self.target_schema) != merged {
                break;
            }
            count += next_count;
            self.source.next();
        }

        Some(Bucket::regular(self.side, merged, count, self.target_schema))
    }
}
