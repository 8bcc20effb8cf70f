//! Iterators decoding the sparse layout of a histogram into [`Bucket`](crate::Bucket)s.
//!
//! All iterators borrow the histogram they were created from, so it cannot be mutated while any
//! of them is alive. They are all obtained through methods on
//! [`FloatHistogram`](crate::FloatHistogram):
//!
//! - [`ForwardBuckets`]: one side, ascending index order, optionally skipping leading buckets and
//!   merging buckets into a coarser schema.
//! - [`ReverseBuckets`]: one side, descending index order.
//! - [`AllBuckets`]: negative, zero, and positive buckets in ascending order of value.
//! - [`CumulativeBuckets`]: cumulative counts over the zero and positive buckets.
mod all;
pub use self::all::AllBuckets;

mod cumulative;
pub use self::cumulative::CumulativeBuckets;

mod forward;
pub use self::forward::ForwardBuckets;

mod reverse;
pub use self::reverse::ReverseBuckets;
