//! Bounded, overwriting command history with cursored traversal.
//!
//! The ring holds the last [`CAPACITY`] submitted lines. A cursor walks the
//! ring in both directions; an unset cursor means "not currently recalling".
//! Empty slots act as a hard boundary: the cursor parks on the first empty
//! slot it meets and refuses to move past it, so exhausting the ring never
//! silently wraps back into live entries.

/// Fixed ring capacity.
pub const CAPACITY: usize = 1000;

/// Sentinel for "cursor not set", distinct from every valid index.
const UNSET: usize = usize::MAX;

/// Bounded overwriting history buffer.
pub struct HistoryRing {
    commands: Vec<String>,
    /// Next slot to write.
    insertion_index: usize,
    /// Current recall cursor, or [`UNSET`].
    fetched_index: usize,
}

impl Default for HistoryRing {
    fn default() -> Self {
        Self::new()
    }
}

impl HistoryRing {
    pub fn new() -> Self {
        Self {
            commands: vec![String::new(); CAPACITY],
            insertion_index: 0,
            fetched_index: UNSET,
        }
    }

    /// Store a command line. Whitespace-only lines are discarded.
    pub fn insert(&mut self, line: &str) {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return;
        }
        self.commands[self.insertion_index] = trimmed.to_string();
        self.insertion_index = (self.insertion_index + 1) % CAPACITY;
    }

    /// Step the cursor towards older entries and return the record there.
    ///
    /// The first call after [`reset`](Self::reset) lands on the most recent
    /// insert. Hitting an empty slot parks the cursor: the empty string is
    /// returned and further `older` calls do not advance.
    pub fn older(&mut self) -> String {
        let candidate = if self.fetched_index == UNSET {
            prev_index(self.insertion_index)
        } else {
            prev_index(self.fetched_index)
        };

        // Two consecutive empty slots at the cursor: parked at the boundary.
        if self.fetched_index != UNSET
            && self.commands[self.fetched_index].is_empty()
            && self.commands[candidate].is_empty()
        {
            return String::new();
        }

        self.fetched_index = candidate;
        self.commands[candidate].clone()
    }

    /// Step the cursor towards newer entries and return the record there.
    pub fn newer(&mut self) -> String {
        let candidate = if self.fetched_index == UNSET {
            self.insertion_index
        } else {
            next_index(self.fetched_index)
        };

        if self.fetched_index != UNSET
            && self.commands[self.fetched_index].is_empty()
            && self.commands[candidate].is_empty()
        {
            return String::new();
        }

        self.fetched_index = candidate;
        self.commands[candidate].clone()
    }

    /// Forget the recall position.
    pub fn reset(&mut self) {
        self.fetched_index = UNSET;
    }

    /// All stored records, most recent first.
    ///
    /// Walks `older` until the empty boundary, then resets the cursor.
    pub fn all_newest_first(&mut self) -> Vec<String> {
        self.reset();
        let mut out = Vec::new();
        for _ in 0..CAPACITY {
            let record = self.older();
            if record.is_empty() {
                break;
            }
            out.push(record);
        }
        self.reset();
        out
    }
}

fn prev_index(i: usize) -> usize {
    if i == 0 { CAPACITY - 1 } else { i - 1 }
}

fn next_index(i: usize) -> usize {
    (i + 1) % CAPACITY
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_discards_whitespace_only() {
        let mut ring = HistoryRing::new();
        ring.insert("   ");
        ring.insert("\t");
        assert_eq!(ring.all_newest_first(), Vec::<String>::new());
    }

    #[test]
    fn insert_trims() {
        let mut ring = HistoryRing::new();
        ring.insert("  pwd  ");
        assert_eq!(ring.older(), "pwd");
    }

    #[test]
    fn older_walks_backwards() {
        let mut ring = HistoryRing::new();
        ring.insert("one");
        ring.insert("two");
        ring.insert("three");
        assert_eq!(ring.older(), "three");
        assert_eq!(ring.older(), "two");
        assert_eq!(ring.older(), "one");
    }

    #[test]
    fn older_then_newer_returns_to_same_slot() {
        let mut ring = HistoryRing::new();
        ring.insert("one");
        ring.insert("two");
        assert_eq!(ring.older(), "two");
        assert_eq!(ring.older(), "one");
        assert_eq!(ring.newer(), "two");
        assert_eq!(ring.older(), "one");
    }

    #[test]
    fn older_parks_at_empty_boundary() {
        let mut ring = HistoryRing::new();
        ring.insert("only");
        assert_eq!(ring.older(), "only");
        // Steps onto the empty slot behind the single record...
        assert_eq!(ring.older(), "");
        // ...and refuses to advance any further.
        assert_eq!(ring.older(), "");
        assert_eq!(ring.older(), "");
    }

    #[test]
    fn newer_recovers_after_overshooting_the_oldest() {
        let mut ring = HistoryRing::new();
        ring.insert("a");
        assert_eq!(ring.older(), "a");
        // Step past the oldest onto the empty edge...
        assert_eq!(ring.older(), "");
        // ...and back into live data.
        assert_eq!(ring.newer(), "a");
    }

    #[test]
    fn older_on_untouched_ring_returns_empty() {
        let mut ring = HistoryRing::new();
        assert_eq!(ring.older(), "");
        assert_eq!(ring.older(), "");
    }

    #[test]
    fn full_ring_keeps_most_recent_cap_entries() {
        let mut ring = HistoryRing::new();
        for i in 0..CAPACITY + 10 {
            ring.insert(&format!("cmd-{i}"));
        }
        let all = ring.all_newest_first();
        assert_eq!(all.len(), CAPACITY);
        assert_eq!(all[0], format!("cmd-{}", CAPACITY + 9));
        assert_eq!(all[CAPACITY - 1], "cmd-10");
        assert!(all.iter().all(|s| !s.is_empty()));
    }

    #[test]
    fn wrapped_ring_older_returns_most_recent_first() {
        let mut ring = HistoryRing::new();
        for i in 0..CAPACITY {
            ring.insert(&format!("cmd-{i}"));
        }
        // insertion_index has wrapped to 0; most recent is at CAPACITY - 1.
        assert_eq!(ring.older(), format!("cmd-{}", CAPACITY - 1));
    }

    #[test]
    fn all_newest_first_resets_cursor() {
        let mut ring = HistoryRing::new();
        ring.insert("a");
        ring.insert("b");
        let _ = ring.all_newest_first();
        // Cursor was reset: next older starts from the most recent again.
        assert_eq!(ring.older(), "b");
    }
}
