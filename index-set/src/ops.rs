use std::ops::Range;

use tracing::{debug, trace};

use crate::HINT_FANOUT;
use crate::entry::Entry;
use crate::set::IndexSet;

impl IndexSet {
    /// The entry stored at `key`. Panics if the key holds nothing, which
    /// only happens if a run chain is broken.
    #[inline]
    pub(crate) fn entry(&self, key: u64) -> Entry {
        self.entries[&key]
    }

    /// End and occupancy of the run starting at `key`.
    ///
    /// The frontier sentinel reads as an empty absent run.
    #[inline]
    pub(crate) fn run_at(&self, key: u64) -> (u64, bool) {
        match self.entry(key) {
            Entry::Present(end) => (end, true),
            Entry::Absent(end) => (end, false),
            Entry::Frontier => (key, false),
            Entry::Hint(_) => unreachable!("hint entry at run start {key}"),
        }
    }

    #[inline]
    pub(crate) fn run_end(&self, key: u64) -> u64 {
        self.run_at(key).0
    }

    /// First present index at or after `from`, with the end of its run.
    pub(crate) fn present_at_or_after(&self, from: u64) -> Option<(u64, u64)> {
        let mut key = self.run_start_for(from);
        loop {
            match self.entry(key) {
                Entry::Present(end) => return Some((key.max(from), end)),
                Entry::Absent(end) => key = end,
                Entry::Frontier => return None,
                Entry::Hint(_) => unreachable!("hint entry at run start {key}"),
            }
        }
    }

    /// Insert a range starting at or past the frontier.
    ///
    /// A gap run is written at the old frontier when `range.start` leaves
    /// one. When the range starts exactly at the frontier, the present run
    /// ending there is extended instead.
    pub(crate) fn append(&mut self, range: Range<u64>) {
        let old_frontier = self.frontier;

        let (old_runs, new_runs) = if range.start == old_frontier && old_frontier > 0 {
            let last = self.run_start_for(old_frontier - 1);
            debug_assert!(matches!(self.entry(last), Entry::Present(_)));

            self.entries.remove(&old_frontier);
            self.entries.insert(last, Entry::Present(range.end));
            (vec![(last, old_frontier)], vec![(last, range.end)])
        } else {
            let mut new_runs = Vec::with_capacity(2);
            if range.start > old_frontier {
                self.entries
                    .insert(old_frontier, Entry::Absent(range.start));
                new_runs.push((old_frontier, range.start));
            }
            self.entries.insert(range.start, Entry::Present(range.end));
            new_runs.push((range.start, range.end));
            (Vec::new(), new_runs)
        };

        self.entries.insert(range.end, Entry::Frontier);
        self.frontier = range.end;
        self.len += range.end - range.start;

        self.refresh_hints(&old_runs, &new_runs);
    }

    /// Rewrite the runs around `range` so that it has the given occupancy.
    ///
    /// Requires `range.start < frontier`; removals must also clamp
    /// `range.end` to the frontier. The rewritten window spans from the run
    /// holding `range.start - 1` up to the run holding `range.end`, so the
    /// result coalesces with both neighbours.
    pub(crate) fn splice(&mut self, range: Range<u64>, present: bool) {
        let Range { start, end } = range;
        let old_frontier = self.frontier;
        debug_assert!(start < old_frontier);

        let first = self.run_start_for(start.saturating_sub(1));

        let mut runs: Vec<(u64, u64, bool)> = Vec::new();
        let mut key = first;
        while key < old_frontier && key <= end {
            let (run_end, run_present) = self.run_at(key);
            runs.push((key, run_end, run_present));
            key = run_end;
        }
        let reaches_tail = key >= old_frontier;

        let mut flipped = 0;
        for &(run_start, run_end, run_present) in &runs {
            if run_present != present {
                flipped += run_end.min(end).saturating_sub(run_start.max(start));
            }
        }
        if present && end > old_frontier {
            flipped += end - old_frontier;
        }

        let mut segments = Vec::with_capacity(runs.len() + 2);
        for &(run_start, run_end, run_present) in &runs {
            push_segment(&mut segments, run_start, run_end.min(start), run_present);
        }
        push_segment(&mut segments, start, end, present);
        for &(run_start, run_end, run_present) in &runs {
            push_segment(&mut segments, run_start.max(end), run_end, run_present);
        }

        if reaches_tail {
            while matches!(segments.last(), Some(&(_, _, false))) {
                segments.pop();
            }
        }

        for &(run_start, _, _) in &runs {
            self.entries.remove(&run_start);
        }
        for &(seg_start, seg_end, seg_present) in &segments {
            self.entries
                .insert(seg_start, Entry::run(seg_end, seg_present));
        }

        if reaches_tail {
            let new_frontier = segments.last().map_or(first, |&(_, seg_end, _)| seg_end);
            self.entries.remove(&old_frontier);
            self.entries.insert(new_frontier, Entry::Frontier);

            if new_frontier < old_frontier {
                debug!(old_frontier, new_frontier, "frontier retracted");
            }
            self.frontier = new_frontier;
        }

        if present {
            self.len += flipped;
        } else {
            self.len -= flipped;
        }

        let old_runs: Vec<_> = runs.iter().map(|&(s, e, _)| (s, e)).collect();
        let new_runs: Vec<_> = segments.iter().map(|&(s, e, _)| (s, e)).collect();
        self.refresh_hints(&old_runs, &new_runs);
    }

    /// Replace the hints of `old_runs` with those of `new_runs`.
    ///
    /// Both lists hold `(start, end)` pairs and the run entries must already
    /// describe `new_runs`. A position inside an old run may now be a run
    /// start, so only hint entries are dropped.
    pub(crate) fn refresh_hints(&mut self, old_runs: &[(u64, u64)], new_runs: &[(u64, u64)]) {
        let stride = self.hint_stride;

        let mut dropped = 0u64;
        for &(start, end) in old_runs {
            for pos in hint_positions(stride, start, end) {
                if matches!(self.entries.get(&pos), Some(Entry::Hint(_))) {
                    self.entries.remove(&pos);
                    dropped += 1;
                }
            }
        }

        let mut written = 0u64;
        for &(start, end) in new_runs {
            for pos in hint_positions(stride, start, end) {
                self.entries.insert(pos, Entry::Hint(start));
                written += 1;
            }
        }

        trace!(dropped, written, "refreshed hints");
    }

    /// Nearest entry at or below `index` that resolves to a run start, found
    /// by looking up one aligned position per level, finest first.
    ///
    /// An empty aligned position lies inside the same run as the next level's
    /// position, so the run returned covers `floor(index, stride)`.
    pub(crate) fn anchor_for(&self, index: u64) -> u64 {
        let mut span = Some(self.hint_stride);
        while let Some(step) = span {
            let aligned = index - index % step;
            match self.entries.get(&aligned) {
                Some(Entry::Hint(start)) => return *start,
                Some(_) => return aligned,
                None => {}
            }
            span = step.checked_mul(HINT_FANOUT);
        }
        0
    }
}

/// Positions inside `(start, end)` that hold a hint for the run
/// `[start, end)`.
///
/// Level `j` uses the spacing `stride * HINT_FANOUT^j` and covers the span
/// from `start` up to the next multiple of the level above. A run of any
/// length carries at most `HINT_FANOUT` hints per level, and no position is
/// produced by two levels.
pub(crate) fn hint_positions(stride: u64, start: u64, end: u64) -> impl Iterator<Item = u64> {
    std::iter::successors(Some(stride), |span| span.checked_mul(HINT_FANOUT))
        .map_while(move |span| {
            let first = next_multiple(start, span)?;
            (first < end).then_some((span, first))
        })
        .flat_map(move |(span, first)| {
            let limit = span
                .checked_mul(HINT_FANOUT)
                .and_then(|next| next_multiple(start, next))
                .map_or(end, |bound| bound.min(end));
            std::iter::successors(Some(first), move |pos| pos.checked_add(span))
                .take_while(move |&pos| pos < limit)
        })
}

/// Smallest multiple of `span` strictly greater than `value`.
#[inline]
fn next_multiple(value: u64, span: u64) -> Option<u64> {
    (value / span).checked_add(1)?.checked_mul(span)
}

/// Append `[start, end)` to `segments`, merging with the previous segment
/// when it touches and has the same occupancy. Empty segments are dropped.
fn push_segment(segments: &mut Vec<(u64, u64, bool)>, start: u64, end: u64, present: bool) {
    if start >= end {
        return;
    }

    if let Some(last) = segments.last_mut() {
        if last.1 == start && last.2 == present {
            last.1 = end;
            return;
        }
    }
    segments.push((start, end, present));
}
