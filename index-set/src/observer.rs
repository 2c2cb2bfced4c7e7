use crate::IndexSet;

/// Receives a notification after every completed mutation of an [`IndexSet`].
///
/// The set passed to [`range_changed`](Self::range_changed) already satisfies
/// all of its invariants, so observers may query or enumerate it. They only
/// get a shared borrow: mutating the set from inside a notification does not
/// compile. Registered observers must be `Send` so that the set can move
/// between threads.
///
/// `start` and `length` are the arguments of the mutating call, not the
/// (possibly smaller) sub-range that actually flipped.
pub trait RangeObserver {
    fn range_changed(&mut self, set: &IndexSet, start: u64, length: u64);
}

impl<F> RangeObserver for F
where
    F: FnMut(&IndexSet, u64, u64),
{
    fn range_changed(&mut self, set: &IndexSet, start: u64, length: u64) {
        self(set, start, length)
    }
}

/// Handle returned by [`IndexSet::observe`], used to unregister an observer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ObserverId(pub(crate) u64);

pub(crate) struct Registration {
    pub(crate) id: ObserverId,
    pub(crate) observer: Box<dyn RangeObserver + Send>,
}
