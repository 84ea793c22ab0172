/// Out-of-order header cache.
///
/// Gossip may deliver headers well ahead of the locally committed chain.
/// Those headers are already verified, so instead of dropping them they are
/// kept here as contiguous ascending runs ([`Range`]) until the catch-up
/// loop reaches them.
///
/// ## Invariants
///
/// - Ranges are sorted ascending by start height
/// - No two ranges overlap, and no two are adjacent: a header extending the
///   highest known height is appended to the last range
/// - Consumed prefixes are removed for good; emptied ranges are reclaimed
///   lazily by [`Ranges::back`]
use header::Header;
use parking_lot::{MappedMutexGuard, Mutex, MutexGuard};
use tracing::{debug, trace};

/// Contiguous ascending run of headers starting at `start`.
#[derive(Debug, Clone)]
pub struct Range<H> {
    start: u64,
    headers: Vec<H>,
}

impl<H: Header> Range<H> {
    pub fn new(header: H) -> Self {
        Self {
            start: header.height(),
            headers: vec![header],
        }
    }

    /// Height of the first header.
    pub fn start(&self) -> u64 {
        self.start
    }

    pub fn len(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    /// Extends the tail. Each header must be exactly the next height.
    pub fn append(&mut self, headers: impl IntoIterator<Item = H>) {
        for header in headers {
            debug_assert_eq!(
                header.height(),
                self.start + self.headers.len() as u64,
                "non-contiguous append to range"
            );
            self.headers.push(header);
        }
    }

    /// Highest header of the range.
    pub fn head(&self) -> Option<&H> {
        self.headers.last()
    }

    pub fn pop_head(&mut self) -> Option<H> {
        self.headers.pop()
    }

    /// Cuts off and returns all headers below height `end`.
    ///
    /// The remainder keeps its place and `start` moves to its first header.
    pub fn before(&mut self, end: u64) -> Vec<H> {
        let amount = (end.saturating_sub(self.start) as usize).min(self.headers.len());
        let out: Vec<H> = self.headers.drain(..amount).collect();
        if let Some(first) = self.headers.first() {
            self.start = first.height();
        }
        out
    }
}

/// Ordered set of disjoint, non-adjacent [`Range`]s.
///
/// Every operation runs under a single mutex. Gossip handlers call
/// [`Ranges::add`] concurrently; the syncer is the only consumer.
#[derive(Debug)]
pub struct Ranges<H> {
    ranges: Mutex<Vec<Range<H>>>,
}

impl<H: Header> Default for Ranges<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: Header> Ranges<H> {
    pub fn new() -> Self {
        Self {
            ranges: Mutex::new(Vec::new()),
        }
    }

    /// Highest cached header, if any.
    pub fn head(&self) -> Option<H> {
        let ranges = self.ranges.lock();
        ranges.iter().rev().find_map(|range| range.head().cloned())
    }

    /// Removes and returns the highest cached header.
    pub fn pop_head(&self) -> Option<H> {
        let mut ranges = self.ranges.lock();
        ranges.iter_mut().rev().find_map(Range::pop_head)
    }

    /// Absorbs a gossiped header.
    ///
    /// Headers at or below the cached head are discarded. A header right
    /// above the cached head extends the last range; anything higher opens
    /// a new range, leaving a gap for the catch-up loop to fill.
    pub fn add(&self, header: H) {
        let mut ranges = self.ranges.lock();
        while ranges.last().is_some_and(Range::is_empty) {
            ranges.pop();
        }

        let height = header.height();
        match ranges.last_mut() {
            Some(last) => {
                let head = last.start + last.len() as u64 - 1;
                if height <= head {
                    debug!(height, head, "Received headers in wrong order, dropping");
                } else if height == head + 1 {
                    trace!(height, "Extending cached range");
                    last.append([header]);
                } else {
                    debug!(height, head, "Opening new cached range");
                    ranges.push(Range::new(header));
                }
            }
            None => {
                debug!(height, "Opening new cached range");
                ranges.push(Range::new(header));
            }
        }
    }

    /// Lowest non-empty range, reclaiming emptied ranges in front of it.
    ///
    /// The range stays locked for as long as the returned guard lives.
    pub fn back(&self) -> Option<MappedMutexGuard<'_, Range<H>>> {
        let mut ranges = self.ranges.lock();
        match ranges.iter().position(|range| !range.is_empty()) {
            Some(idx) => {
                ranges.drain(..idx);
                Some(MutexGuard::map(ranges, |ranges| &mut ranges[0]))
            }
            None => {
                ranges.clear();
                None
            }
        }
    }

    /// Lowest non-empty range, only if it starts within `[start, end)`.
    pub fn back_within(&self, start: u64, end: u64) -> Option<MappedMutexGuard<'_, Range<H>>> {
        let range = self.back()?;
        if range.start >= start && range.start < end {
            Some(range)
        } else {
            None
        }
    }

    /// Drops every cached header below `height`.
    pub fn prune_below(&self, height: u64) {
        let mut ranges = self.ranges.lock();
        for range in ranges.iter_mut() {
            if range.start >= height {
                break;
            }
            let pruned = range.before(height);
            if !pruned.is_empty() {
                trace!(height, pruned = pruned.len(), "Pruned committed headers from cache");
            }
        }
        ranges.retain(|range| !range.is_empty());
    }

    /// Number of non-empty ranges.
    pub fn len(&self) -> usize {
        self.ranges
            .lock()
            .iter()
            .filter(|range| !range.is_empty())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
