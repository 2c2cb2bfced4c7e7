use std::fmt;
use std::ops::{Range, RangeBounds};

use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use crate::HINT_STRIDE;
use crate::entry::Entry;
use crate::enumerable::{Enumerator, Iter, Objects, Ranges};
use crate::error::{Error, Result, resolve, resolve_span};
use crate::observer::{ObserverId, RangeObserver, Registration};

/// A sparse set of `u64` indices stored as alternating present/absent runs.
///
/// The boundary map keeps one entry per run start, plus hint entries near
/// each run start. Each hint level is [`HINT_FANOUT`](crate::HINT_FANOUT)
/// times coarser than the one below, starting from `hint_stride`. A hint
/// points at the run covering its position. Locating the run for any index
/// looks up one aligned position per level, then walks over the runs starting
/// inside one stride window, independent of how fragmented the rest of the
/// set is. Each run carries a bounded number of hints whatever its length.
///
/// Indices at or past the [frontier](Self::frontier) are implicitly absent.
///
/// The set is `Send`, and so are its observers.
#[cfg_attr(feature = "allocative", derive(allocative::Allocative))]
pub struct IndexSet {
    pub(crate) entries: FxHashMap<u64, Entry>,
    pub(crate) len: u64,
    pub(crate) frontier: u64,
    pub(crate) hint_stride: u64,
    #[cfg_attr(feature = "allocative", allocative(skip))]
    observers: Vec<Registration>,
    next_observer: u64,
}

impl IndexSet {
    /// Create an empty set using the default [`HINT_STRIDE`].
    pub fn new() -> Self {
        Self::build(HINT_STRIDE)
    }

    /// Create an empty set whose finest hints are `stride` indices apart.
    ///
    /// Smaller strides make lookups in fragmented sets cheaper at the cost of
    /// more hint entries.
    pub fn with_hint_stride(stride: u64) -> Result<Self> {
        if stride == 0 {
            return Err(Error::ZeroHintStride);
        }
        Ok(Self::build(stride))
    }

    fn build(hint_stride: u64) -> Self {
        let mut entries = FxHashMap::default();
        entries.insert(0, Entry::Frontier);

        Self {
            entries,
            len: 0,
            frontier: 0,
            hint_stride,
            observers: Vec::new(),
            next_observer: 0,
        }
    }

    /// Build a set from individual indices, in any order.
    pub fn from_indices(indices: impl IntoIterator<Item = u64>) -> Result<Self> {
        let mut set = Self::new();
        for index in indices {
            set.insert(index)?;
        }
        Ok(set)
    }

    /// Build a set from a collection of ranges, in any order.
    pub fn from_ranges<R: RangeBounds<u64>>(ranges: impl IntoIterator<Item = R>) -> Result<Self> {
        let mut set = Self::new();
        for range in ranges {
            set.insert_range(range)?;
        }
        Ok(set)
    }

    /// Number of present indices.
    pub fn len(&self) -> u64 {
        self.len
    }

    /// Returns `true` if no index is present.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// One past the last present index (0 for an empty set).
    pub fn frontier(&self) -> u64 {
        self.frontier
    }

    /// Spacing of the finest hint level.
    pub fn hint_stride(&self) -> u64 {
        self.hint_stride
    }

    /// The smallest present index, or `None` if empty.
    pub fn min(&self) -> Option<u64> {
        self.present_at_or_after(0).map(|(index, _)| index)
    }

    /// The largest present index, or `None` if empty.
    ///
    /// The frontier is always retracted to the end of the last present run.
    pub fn max(&self) -> Option<u64> {
        self.frontier.checked_sub(1)
    }

    /// Start of the run (present or absent) that covers `index`.
    ///
    /// Everything at or past the frontier is treated as one unbounded absent
    /// run starting at the frontier.
    pub fn run_start_for(&self, index: u64) -> u64 {
        if index >= self.frontier {
            return self.frontier;
        }

        let mut start = match self.entries.get(&index) {
            Some(Entry::Hint(start)) => *start,
            Some(_) => return index,
            None => self.anchor_for(index),
        };

        loop {
            let end = self.run_end(start);
            if end > index {
                return start;
            }
            start = end;
        }
    }

    /// Test whether `index` is present.
    pub fn contains(&self, index: u64) -> bool {
        let start = self.run_start_for(index);
        matches!(self.entry(start), Entry::Present(end) if end > index)
    }

    /// Test whether every index in `range` is present.
    ///
    /// An empty range is vacuously contained.
    pub fn contains_range(&self, range: impl RangeBounds<u64>) -> Result<bool> {
        Ok(self.covers(resolve(range)?))
    }

    /// Test whether at least one index in `range` is present.
    pub fn intersects(&self, range: impl RangeBounds<u64>) -> Result<bool> {
        Ok(self.overlaps(resolve(range)?))
    }

    /// Count the present indices inside `range`.
    ///
    /// Walks only the runs overlapping the range.
    pub fn count_in(&self, range: impl RangeBounds<u64>) -> Result<u64> {
        let Range { start, end } = resolve(range)?;

        let mut count = 0;
        let mut key = self.run_start_for(start);
        while key < end && key < self.frontier {
            let (run_end, present) = self.run_at(key);
            if present {
                count += run_end.min(end) - key.max(start);
            }
            key = run_end;
        }
        Ok(count)
    }

    /// Test whether every index of `other` is present in `self`.
    pub fn contains_set(&self, other: &IndexSet) -> bool {
        other.ranges().all(|range| self.covers(range))
    }

    /// Test whether `self` and `other` share at least one index.
    pub fn intersects_set(&self, other: &IndexSet) -> bool {
        other.ranges().any(|range| self.overlaps(range))
    }

    /// The nearest present index strictly after `index`.
    pub fn index_after(&self, index: u64) -> Option<u64> {
        let next = index.checked_add(1)?;
        self.present_at_or_after(next).map(|(index, _)| index)
    }

    /// The nearest present index strictly before `index`.
    pub fn index_before(&self, index: u64) -> Option<u64> {
        let prev = index.checked_sub(1)?;
        if prev >= self.frontier {
            return self.max();
        }

        let start = self.run_start_for(prev);
        match self.entry(start) {
            Entry::Present(_) => Some(prev),
            // An absent run is always preceded by a present one.
            _ => start.checked_sub(1),
        }
    }

    /// Mark `index` present.
    pub fn insert(&mut self, index: u64) -> Result<()> {
        self.insert_range(index..=index)
    }

    /// Mark every index in `range` present, coalescing with neighbouring runs.
    ///
    /// Re-inserting indices that are already present changes nothing but
    /// still notifies observers with the requested range. The map grows with
    /// the number of runs, not with the magnitude of the indices.
    pub fn insert_range(&mut self, range: impl RangeBounds<u64>) -> Result<()> {
        let range = resolve(range)?;
        self.apply(range, true);
        Ok(())
    }

    /// Mark `length` indices starting at `start` present.
    pub fn insert_span(&mut self, start: u64, length: u64) -> Result<()> {
        let range = resolve_span(start, length)?;
        self.apply(range, true);
        Ok(())
    }

    /// Mark `index` absent.
    pub fn remove(&mut self, index: u64) -> Result<()> {
        self.remove_range(index..=index)
    }

    /// Mark every index in `range` absent, splitting partially covered runs.
    ///
    /// Removing the tail of the set retracts the frontier.
    pub fn remove_range(&mut self, range: impl RangeBounds<u64>) -> Result<()> {
        let range = resolve(range)?;
        self.apply(range, false);
        Ok(())
    }

    /// Mark `length` indices starting at `start` absent.
    pub fn remove_span(&mut self, start: u64, length: u64) -> Result<()> {
        let range = resolve_span(start, length)?;
        self.apply(range, false);
        Ok(())
    }

    /// Insert every range of `other`, notifying once per range.
    pub fn insert_set(&mut self, other: &IndexSet) {
        for range in other.ranges() {
            self.apply(range, true);
        }
    }

    /// Remove every range of `other`, notifying once per range.
    pub fn remove_set(&mut self, other: &IndexSet) {
        for range in other.ranges() {
            self.apply(range, false);
        }
    }

    /// Insert every index at which `object` appears in `source`.
    pub fn insert_object<T: PartialEq>(&mut self, source: &[T], object: &T) {
        for range in matching_runs(source, object) {
            self.apply(range, true);
        }
    }

    /// Remove every index at which `object` appears in `source`.
    pub fn remove_object<T: PartialEq>(&mut self, source: &[T], object: &T) {
        for range in matching_runs(source, object) {
            self.apply(range, false);
        }
    }

    /// Remove every index, notifying observers with `(0, old frontier)`.
    pub fn clear(&mut self) {
        let old_frontier = self.frontier;

        self.entries.clear();
        self.entries.insert(0, Entry::Frontier);
        self.len = 0;
        self.frontier = 0;

        debug!(old_frontier, "cleared index set");
        self.notify(0, old_frontier);
    }

    /// Register an observer fired after every completed mutation.
    pub fn observe(&mut self, observer: impl RangeObserver + Send + 'static) -> ObserverId {
        let id = ObserverId(self.next_observer);
        self.next_observer += 1;
        self.observers.push(Registration {
            id,
            observer: Box::new(observer),
        });
        id
    }

    /// Unregister an observer. Returns `false` if `id` is unknown.
    pub fn unobserve(&mut self, id: ObserverId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|registration| registration.id != id);
        self.observers.len() != before
    }

    /// Iterate over present indices in ascending order.
    pub fn iter(&self) -> Iter<'_> {
        Enumerator::new(self)
    }

    /// Iterate over maximal present runs in ascending order.
    pub fn ranges(&self) -> Ranges<'_> {
        Ranges::new(self)
    }

    /// Iterate over the objects of `source` at present indices.
    ///
    /// Stops at the first present index past the end of `source`.
    pub fn objects<'a, T>(&'a self, source: &'a [T]) -> Objects<'a, T> {
        Objects::new(self.iter(), source)
    }

    /// The next maximal present run after `previous` (or the first one).
    ///
    /// If `previous` ends inside a present run, the remainder of that run is
    /// returned.
    pub fn next_range(&self, previous: Option<Range<u64>>) -> Option<Range<u64>> {
        let from = previous.map_or(0, |range| range.end);
        self.present_at_or_after(from)
            .map(|(start, end)| start..end)
    }

    /// Every stored entry as `key:value`, sorted by key.
    ///
    /// Runs render their end (negated when absent), hints render the run
    /// start they point at, and the frontier sentinel renders `0`. The
    /// format is diagnostic only.
    pub fn dump(&self) -> String {
        let mut entries: Vec<_> = self.entries.iter().collect();
        entries.sort_unstable_by_key(|(key, _)| **key);

        entries
            .iter()
            .map(|(key, entry)| format!("{key}:{entry}"))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Approximate number of heap bytes held by the boundary map.
    pub fn heap_bytes(&self) -> usize {
        self.entries.capacity() * (size_of::<u64>() + size_of::<Entry>())
    }

    /// Test whether `range` lies inside a single present run.
    fn covers(&self, range: Range<u64>) -> bool {
        if range.is_empty() {
            return true;
        }
        let start = self.run_start_for(range.start);
        matches!(self.entry(start), Entry::Present(end) if end >= range.end)
    }

    fn overlaps(&self, range: Range<u64>) -> bool {
        if range.is_empty() {
            return false;
        }
        self.present_at_or_after(range.start)
            .is_some_and(|(index, _)| index < range.end)
    }

    /// Flip `range` to the given occupancy and notify observers.
    fn apply(&mut self, range: Range<u64>, present: bool) {
        let len_before = self.len;

        if !range.is_empty() {
            if present && range.start >= self.frontier {
                self.append(range.clone());
            } else if present {
                self.splice(range.clone(), true);
            } else {
                let end = range.end.min(self.frontier);
                if range.start < end {
                    self.splice(range.start..end, false);
                }
            }
        }

        let length = range.end - range.start;
        trace!(
            start = range.start,
            length,
            present,
            len_before,
            len = self.len,
            frontier = self.frontier,
            "applied range"
        );
        self.notify(range.start, length);
    }

    fn notify(&mut self, start: u64, length: u64) {
        if self.observers.is_empty() {
            return;
        }

        // Observers only see `&IndexSet`, so none can register or drop
        // observers while the list is detached.
        let mut observers = std::mem::take(&mut self.observers);
        for registration in &mut observers {
            registration.observer.range_changed(self, start, length);
        }
        self.observers = observers;
    }
}

/// Group the positions of `object` in `source` into contiguous ranges.
fn matching_runs<'a, T: PartialEq>(
    source: &'a [T],
    object: &'a T,
) -> impl Iterator<Item = Range<u64>> + 'a {
    let mut positions = source
        .iter()
        .enumerate()
        .filter(move |(_, item)| *item == object)
        .map(|(index, _)| index as u64)
        .peekable();

    std::iter::from_fn(move || {
        let start = positions.next()?;
        let mut end = start + 1;
        while positions.next_if_eq(&end).is_some() {
            end += 1;
        }
        Some(start..end)
    })
}

impl Default for IndexSet {
    fn default() -> Self {
        Self::new()
    }
}

/// Deep copy of the boundary map. Observers stay with the original.
impl Clone for IndexSet {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
            len: self.len,
            frontier: self.frontier,
            hint_stride: self.hint_stride,
            observers: Vec::new(),
            next_observer: 0,
        }
    }
}

/// Sets are equal when they hold the same indices, whatever their strides.
impl PartialEq for IndexSet {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.frontier == other.frontier && self.ranges().eq(other.ranges())
    }
}

impl Eq for IndexSet {}

impl fmt::Debug for IndexSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexSet")
            .field("len", &self.len)
            .field("frontier", &self.frontier)
            .field("hint_stride", &self.hint_stride)
            .field("ranges", &self.ranges().collect::<Vec<_>>())
            .finish()
    }
}

/// Lists present runs with inclusive bounds, e.g. `IndexSet<0..9, 15>`.
impl fmt::Display for IndexSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("IndexSet<")?;
        for (i, range) in self.ranges().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            if range.end - range.start == 1 {
                write!(f, "{}", range.start)?;
            } else {
                write!(f, "{}..{}", range.start, range.end - 1)?;
            }
        }
        f.write_str(">")
    }
}

impl<'a> IntoIterator for &'a IndexSet {
    type Item = u64;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Iter<'a> {
        self.iter()
    }
}
