use super::{ForwardBuckets, ReverseBuckets};
use crate::Bucket;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Negative,
    Zero,
    Positive,
    Done,
}

/// Iterates over all negative, zero, and positive buckets in ascending order of value.
///
/// The zero bucket is only included if it is populated.
#[derive(Debug, Clone)]
pub struct AllBuckets<'a> {
    negative: ReverseBuckets<'a>,
    zero: Bucket,
    positive: ForwardBuckets<'a>,
    phase: Phase,
}

impl<'a> AllBuckets<'a> {
    pub(crate) fn new(negative: ReverseBuckets<'a>, zero: Bucket, positive: ForwardBuckets<'a>) -> AllBuckets<'a> {
        AllBuckets { negative, zero, positive, phase: Phase::Negative }
    }
}

impl Iterator for AllBuckets<'_> {
    type Item = Bucket;

    fn next(&mut self) -> Option<Bucket> {
        loop {
            match self.phase {
                Phase::Negative => match self.negative.next() {
                    Some(bucket) => return Some(bucket),
                    None => self.phase = Phase::Zero,
                },
                Phase::Zero => {
                    self.phase = Phase::Positive;
                    if self.zero.count > 0.0 {
                        return Some(self.zero);
                    }
                }
                Phase::Positive => match self.positive.next() {
                    Some(bucket) => return Some(bucket),
                    None => self.phase = Phase::Done,
                },
                Phase::Done => return None,
            }
        }
    }
}
