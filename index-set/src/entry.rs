use std::fmt;

/// A single slot of the boundary map.
///
/// Run entries sit at the first index of a run. Hint entries sit at
/// stride-aligned indices inside a run, near its start, and point back to
/// that start. The `Frontier` sentinel marks the end of the tiled space.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "allocative", derive(allocative::Allocative))]
pub(crate) enum Entry {
    /// `[key, end)` is present.
    Present(u64),
    /// `[key, end)` is absent.
    Absent(u64),
    /// The run covering `key` starts at the wrapped index.
    Hint(u64),
    /// Zero-length absent run at the frontier.
    Frontier,
}

impl Entry {
    /// Build a run entry with the given occupancy.
    #[inline]
    pub(crate) fn run(end: u64, present: bool) -> Self {
        if present {
            Entry::Present(end)
        } else {
            Entry::Absent(end)
        }
    }
}

/// Signed rendering used by the debug dump: the sign carries occupancy and
/// the magnitude carries the run end (or the hinted run start).
impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Entry::Present(end) => write!(f, "{end}"),
            Entry::Absent(end) => write!(f, "-{end}"),
            Entry::Hint(start) => write!(f, "{start}"),
            Entry::Frontier => f.write_str("0"),
        }
    }
}
