use crate::entry::Entry;
use crate::ops::hint_positions;
use crate::set::IndexSet;

impl IndexSet {
    /// Verify the boundary map by full scan. Panics on the first violation.
    ///
    /// Checks that runs tile `[0, frontier)` with alternating occupancy, that
    /// the last run is present, that the cached length matches, and that the
    /// hint entries are exactly the ones each run calls for.
    #[doc(hidden)]
    pub fn check_invariants(&self) {
        let mut starts = Vec::new();
        let mut previous: Option<bool> = None;
        let mut count = 0u64;

        let mut key = 0;
        while key < self.frontier {
            let (end, present) = self.run_at(key);
            assert!(end > key, "empty run at {key}: {}", self.dump());
            assert_ne!(previous, Some(present), "uncoalesced run at {key}: {}", self.dump());

            if present {
                count += end - key;
            }
            starts.push(key);
            previous = Some(present);
            key = end;
        }

        assert_eq!(key, self.frontier, "runs overshoot the frontier: {}", self.dump());
        assert_eq!(
            self.entries.get(&self.frontier),
            Some(&Entry::Frontier),
            "missing frontier sentinel: {}",
            self.dump()
        );
        if self.frontier > 0 {
            assert_eq!(previous, Some(true), "trailing absent run: {}", self.dump());
        }
        assert_eq!(count, self.len, "cached length is stale: {}", self.dump());

        let mut expected_hints = 0usize;
        for (i, &start) in starts.iter().enumerate() {
            let end = starts.get(i + 1).copied().unwrap_or(self.frontier);
            for pos in hint_positions(self.hint_stride, start, end) {
                assert_eq!(
                    self.entries.get(&pos),
                    Some(&Entry::Hint(start)),
                    "missing hint at {pos}: {}",
                    self.dump()
                );
                expected_hints += 1;
            }
        }

        let mut hints = 0usize;
        for (&key, &entry) in &self.entries {
            match entry {
                Entry::Hint(_) => {
                    assert_eq!(key % self.hint_stride, 0, "unaligned hint at {key}");
                    assert!(key < self.frontier, "hint past frontier at {key}: {}", self.dump());
                    hints += 1;
                }
                Entry::Frontier => assert_eq!(key, self.frontier),
                Entry::Present(_) | Entry::Absent(_) => {
                    assert!(starts.binary_search(&key).is_ok(), "orphan run at {key}: {}", self.dump());
                }
            }
        }
        assert_eq!(hints, expected_hints, "stray hints: {}", self.dump());
    }
}
