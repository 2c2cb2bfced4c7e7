use std::iter::FusedIterator;
use std::ops::Range;

use crate::set::IndexSet;

/// Pull-based enumeration: produce the next item from the previous one.
///
/// Implementors keep no iteration state of their own. Everything a traversal
/// needs beyond the previous item lives in the caller-owned `Cursor`, so
/// several traversals can run over the same collection at once. Wrap any
/// implementor in an [`Enumerator`] to get a regular [`Iterator`].
pub trait Enumerable {
    type Item: Clone;
    type Cursor: Default;

    /// Return the item following `previous`, or the first item when
    /// `previous` is `None`. `None` ends the sequence.
    fn next_item(&self, previous: Option<Self::Item>, cursor: &mut Self::Cursor)
    -> Option<Self::Item>;

    /// Drive [`next_item`](Self::next_item) as an iterator.
    fn enumerator(&self) -> Enumerator<'_, Self>
    where
        Self: Sized,
    {
        Enumerator::new(self)
    }
}

/// Cursor for [`IndexSet`] enumeration: the end of the present run that the
/// previous index belongs to.
///
/// A default cursor carries no run, so the next call re-derives it from the
/// previous index.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IndexCursor {
    run_end: u64,
}

impl Enumerable for IndexSet {
    type Item = u64;
    type Cursor = IndexCursor;

    fn next_item(&self, previous: Option<u64>, cursor: &mut IndexCursor) -> Option<u64> {
        let from = match previous {
            None => 0,
            Some(previous) => {
                let next = previous.checked_add(1)?;
                if next < cursor.run_end {
                    return Some(next);
                }
                next
            }
        };

        let (index, run_end) = self.present_at_or_after(from)?;
        cursor.run_end = run_end;
        Some(index)
    }
}

/// Adapts an [`Enumerable`] to [`Iterator`].
pub struct Enumerator<'a, E: Enumerable> {
    source: &'a E,
    previous: Option<E::Item>,
    cursor: E::Cursor,
    done: bool,
}

impl<'a, E: Enumerable> Enumerator<'a, E> {
    pub fn new(source: &'a E) -> Self {
        Self {
            source,
            previous: None,
            cursor: E::Cursor::default(),
            done: false,
        }
    }
}

impl<E: Enumerable> Iterator for Enumerator<'_, E> {
    type Item = E::Item;

    fn next(&mut self) -> Option<E::Item> {
        if self.done {
            return None;
        }

        match self.source.next_item(self.previous.take(), &mut self.cursor) {
            Some(item) => {
                self.previous = Some(item.clone());
                Some(item)
            }
            None => {
                self.done = true;
                None
            }
        }
    }
}

impl<E: Enumerable> FusedIterator for Enumerator<'_, E> {}

/// Iterator over present indices of an [`IndexSet`].
pub type Iter<'a> = Enumerator<'a, IndexSet>;

/// Iterator over maximal present runs of an [`IndexSet`].
pub struct Ranges<'a> {
    set: &'a IndexSet,
    previous: Option<Range<u64>>,
    done: bool,
}

impl<'a> Ranges<'a> {
    pub(crate) fn new(set: &'a IndexSet) -> Self {
        Self {
            set,
            previous: None,
            done: false,
        }
    }
}

impl Iterator for Ranges<'_> {
    type Item = Range<u64>;

    fn next(&mut self) -> Option<Range<u64>> {
        if self.done {
            return None;
        }

        match self.set.next_range(self.previous.take()) {
            Some(range) => {
                self.previous = Some(range.clone());
                Some(range)
            }
            None => {
                self.done = true;
                None
            }
        }
    }
}

impl FusedIterator for Ranges<'_> {}

/// Iterator over the objects of a source slice at present indices.
pub struct Objects<'a, T> {
    indices: Iter<'a>,
    source: &'a [T],
}

impl<'a, T> Objects<'a, T> {
    pub(crate) fn new(indices: Iter<'a>, source: &'a [T]) -> Self {
        Self { indices, source }
    }
}

impl<'a, T> Iterator for Objects<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        let index = self.indices.next()?;
        // Indices ascend, so the first miss ends the sequence.
        self.source.get(usize::try_from(index).ok()?)
    }
}

impl<T> FusedIterator for Objects<'_, T> {}
