use std::ops::{Bound, Range, RangeBounds};

use thiserror::Error;

/// Errors reported by [`IndexSet`](crate::IndexSet) operations.
///
/// Every failing call leaves the set exactly as it was and fires no observer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The range is reversed, or one of its bounds falls outside `0..u64::MAX`.
    #[error("invalid range: start {start:?}, end {end:?}")]
    InvalidRange { start: Bound<u64>, end: Bound<u64> },

    /// A hint stride of zero cannot tile the index space.
    #[error("hint stride must be non-zero")]
    ZeroHintStride,
}

/// A specialized Result type for index set operations
pub type Result<T> = std::result::Result<T, Error>;

/// Resolve `range` to a half-open `start..end` inside the index space.
///
/// An unbounded end resolves to `u64::MAX`, the exclusive end of the space.
pub(crate) fn resolve(range: impl RangeBounds<u64>) -> Result<Range<u64>> {
    let invalid = || Error::InvalidRange {
        start: range.start_bound().cloned(),
        end: range.end_bound().cloned(),
    };

    let start = match range.start_bound() {
        Bound::Included(&n) => Some(n),
        Bound::Excluded(&n) => n.checked_add(1),
        Bound::Unbounded => Some(0),
    };
    let end = match range.end_bound() {
        Bound::Included(&n) => n.checked_add(1),
        Bound::Excluded(&n) => Some(n),
        Bound::Unbounded => Some(u64::MAX),
    };

    match (start, end) {
        (Some(start), Some(end)) if start <= end => Ok(start..end),
        _ => Err(invalid()),
    }
}

/// Resolve a `(start, length)` pair, rejecting spans that overflow the space.
pub(crate) fn resolve_span(start: u64, length: u64) -> Result<Range<u64>> {
    match start.checked_add(length) {
        Some(end) => Ok(start..end),
        None => Err(Error::InvalidRange {
            start: Bound::Included(start),
            end: Bound::Unbounded,
        }),
    }
}
