//! Sparse set of non-negative integer indices, stored as runs.
//!
//! An [`IndexSet`] tracks which indices out of an unbounded index space are
//! present, without materializing individual indices. It suits workloads
//! where indices cluster into long runs: selected rows, dirty regions,
//! visible items of a large list.
//!
//! The boundary map stores one entry per run start, plus a few hint entries
//! near each run start at spacings of [`HINT_STRIDE`] and its multiples by
//! powers of [`HINT_FANOUT`]. Locating the run for any index never walks
//! further than one stride window, and a run costs the same number of
//! entries whether it spans ten indices or `u64::MAX - 1`.
//!
//! ```
//! use index_set::IndexSet;
//!
//! let mut set = IndexSet::new();
//! set.insert_range(0..100).unwrap();
//! set.remove_range(40..50).unwrap();
//!
//! assert_eq!(set.len(), 90);
//! assert!(set.contains(39));
//! assert!(!set.contains(40));
//! assert_eq!(set.ranges().collect::<Vec<_>>(), vec![0..40, 50..100]);
//! ```

mod entry;
mod enumerable;
mod error;
#[cfg(any(test, fuzzing))]
mod invariants;
mod observer;
mod ops;
mod set;

#[cfg(test)]
mod tests_model;

pub use enumerable::{Enumerable, Enumerator, IndexCursor, Iter, Objects, Ranges};
pub use error::{Error, Result};
pub use observer::{ObserverId, RangeObserver};
pub use set::IndexSet;

/// Default spacing of the finest hint level.
pub const HINT_STRIDE: u64 = 256;

/// Ratio between the spacings of consecutive hint levels.
pub const HINT_FANOUT: u64 = 8;
