//! Sparse, exponentially bucketed histograms with floating-point counts.
//!
//! This crate implements the in-memory representation of Prometheus native histograms along with
//! the algorithms that operate on it: scaling, addition and subtraction of histograms with
//! differing bucket sets, compaction of the sparse bucket layout, iteration over the decoded
//! buckets, and counter reset detection between two samples of the same series.
//!
//! # Bucket layout
//! The bucket boundaries are determined by a schema between -4 and 8: every power of two is split
//! into `2^schema` logarithmically equal buckets, so bucket `i` covers
//! `(boundary(i - 1), boundary(i)]` with `boundary(i) = 2^(i / 2^schema)`. Observations close to
//! zero land in a separate zero bucket instead. See [`boundary::boundary`].
//!
//! Only populated buckets are stored. Each side of the zero bucket uses a [`SparseLayout`], which
//! describes runs of populated bucket indexes as [`Span`]s next to a flat list of counts.
//!
//! # Example
//! ```
//! use metrics_native_histogram::{FloatHistogram, HistogramConfig, InsertCursor, SparseLayout};
//!
//! let config = HistogramConfig::new(0, 0.001)?;
//! let mut positive = SparseLayout::new();
//! let mut cursor = InsertCursor::new();
//! positive.insert_or_accumulate(-1, 1.0, &mut cursor)?;
//! positive.insert_or_accumulate(0, 2.0, &mut cursor)?;
//! positive.insert_or_accumulate(2, 3.0, &mut cursor)?;
//!
//! let previous = FloatHistogram::from_parts(config, 0.0, 6.0, 9.0, positive, SparseLayout::new())?;
//! let mut current = previous.clone();
//! current.add(&previous)?.compact(0);
//!
//! assert_eq!(current.to_string(), "{count:12, sum:18, (0.25,0.5]:2, (0.5,1]:4, (2,4]:6}");
//! assert!(!current.detect_reset(&previous));
//! assert!(previous.detect_reset(&current));
//! # Ok::<(), metrics_native_histogram::HistogramError>(())
//! ```
#![deny(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg), deny(rustdoc::broken_intra_doc_links))]

pub mod boundary;

mod bucket;
pub use self::bucket::Bucket;

mod config;
pub use self::config::HistogramConfig;

mod error;
pub use self::error::HistogramError;

mod layout;
pub use self::layout::{IndexedBuckets, Side, Span, SparseLayout};

mod insert;
pub use self::insert::InsertCursor;

mod compact;

mod histogram;
pub use self::histogram::FloatHistogram;

pub mod iter;

mod reset;
