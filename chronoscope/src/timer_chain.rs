//! # Timer Chains
//!
//! Append-only storage for the timers of one track row. Records are kept in
//! delivery order inside fixed-capacity blocks; every block remembers the
//! `[min_start, max_end]` hull of its records so range queries can skip whole
//! blocks without touching them.
//!
//! ```text
//! TimerChain
//!  ├─ TimerBlock [min_start=0,   max_end=950 ]  r0 r1 r2 … r1023
//!  ├─ TimerBlock [min_start=951, max_end=2100]  r1024 …
//!  └─ TimerBlock [min_start=…]                   (current, partially filled)
//! ```
//!
//! Delivery is close to time-ordered per source but not guaranteed. The chain
//! tracks whether every append so far had a non-decreasing start; while that
//! holds, neighbor lookups use binary search over blocks, otherwise they fall
//! back to an overlap-pruned scan.
//!
//! # Performance
//!
//! - `append()`: O(1) amortized
//! - `query_overlap()`: O(blocks) hull checks, lazily
//! - `depth_neighbor()`: O(log n) while time-ordered, O(n) worst case otherwise

use chronoscope_common::TimerInfo;

use crate::domain::Tick;

/// Default number of records per block
pub const DEFAULT_BLOCK_CAPACITY: usize = 1024;

/// Which side of a reference record a lookup walks to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Before,
    After,
}

// =============================================================================
// TIMER BLOCK
// =============================================================================

/// A fixed-capacity run of consecutive records
#[derive(Debug)]
pub struct TimerBlock {
    records: Vec<TimerInfo>,
    min_start: Tick,
    max_end: Tick,
}

impl TimerBlock {
    fn with_capacity(capacity: usize) -> Self {
        Self { records: Vec::with_capacity(capacity), min_start: Tick::MAX, max_end: 0 }
    }

    fn push(&mut self, record: TimerInfo) {
        self.min_start = self.min_start.min(record.start);
        self.max_end = self.max_end.max(record.end);
        self.records.push(record);
    }

    /// True if the block hull intersects `[lo, hi]`
    #[must_use]
    pub fn intersects(&self, lo: Tick, hi: Tick) -> bool {
        !self.records.is_empty() && self.min_start <= hi && self.max_end >= lo
    }

    #[must_use]
    pub fn min_start(&self) -> Tick {
        self.min_start
    }

    #[must_use]
    pub fn max_end(&self) -> Tick {
        self.max_end
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TimerInfo> {
        self.records.iter()
    }

    #[must_use]
    pub fn records(&self) -> &[TimerInfo] {
        &self.records
    }
}

// =============================================================================
// TIMER CHAIN
// =============================================================================

#[derive(Debug)]
pub struct TimerChain {
    blocks: Vec<TimerBlock>,
    block_capacity: usize,
    len: usize,
    /// Every append so far had `start >= previous start`
    time_ordered: bool,
    last_start: Tick,
}

impl Default for TimerChain {
    fn default() -> Self {
        Self::new(DEFAULT_BLOCK_CAPACITY)
    }
}

impl TimerChain {
    #[must_use]
    pub fn new(block_capacity: usize) -> Self {
        Self {
            blocks: Vec::new(),
            block_capacity: block_capacity.max(1),
            len: 0,
            time_ordered: true,
            last_start: 0,
        }
    }

    /// Append a record, opening a new block when the current one is full
    pub fn append(&mut self, record: TimerInfo) {
        if record.start < self.last_start {
            self.time_ordered = false;
        }
        self.last_start = record.start;

        let needs_block = self.blocks.last().map_or(true, |b| b.len() >= self.block_capacity);
        if needs_block {
            self.blocks.push(TimerBlock::with_capacity(self.block_capacity));
        }
        if let Some(block) = self.blocks.last_mut() {
            block.push(record);
        }
        self.len += 1;
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[must_use]
    pub fn is_time_ordered(&self) -> bool {
        self.time_ordered
    }

    /// Earliest start of any record
    #[must_use]
    pub fn min_start(&self) -> Option<Tick> {
        self.blocks.iter().filter(|b| !b.is_empty()).map(TimerBlock::min_start).min()
    }

    /// Latest end of any record
    #[must_use]
    pub fn max_end(&self) -> Option<Tick> {
        self.blocks.iter().filter(|b| !b.is_empty()).map(TimerBlock::max_end).max()
    }

    /// Record at `index` in append order
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&TimerInfo> {
        self.blocks
            .get(index / self.block_capacity)
            .and_then(|b| b.records.get(index % self.block_capacity))
    }

    pub fn blocks(&self) -> std::slice::Iter<'_, TimerBlock> {
        self.blocks.iter()
    }

    /// All records in append order
    pub fn iter(&self) -> impl Iterator<Item = &TimerInfo> + '_ {
        self.blocks.iter().flat_map(TimerBlock::iter)
    }

    /// Blocks whose hull intersects `[lo, hi]`, lazily
    pub fn query_overlap(&self, lo: Tick, hi: Tick) -> impl Iterator<Item = &TimerBlock> + '_ {
        self.blocks.iter().filter(move |b| b.intersects(lo, hi))
    }

    /// Records overlapping `[lo, hi]`, in append order
    pub fn records_in_range(&self, lo: Tick, hi: Tick) -> impl Iterator<Item = &TimerInfo> + '_ {
        self.query_overlap(lo, hi).flat_map(TimerBlock::iter).filter(move |r| r.overlaps(lo, hi))
    }

    // -------------------------------------------------------------------------
    // Nearest-neighbor lookups
    // -------------------------------------------------------------------------

    /// Latest-ending record with `end < time` that satisfies `predicate`.
    ///
    /// Ties keep the first record found in append order.
    pub fn nearest_before<P>(&self, predicate: P, time: Tick) -> Option<&TimerInfo>
    where
        P: Fn(&TimerInfo) -> bool,
    {
        let mut best: Option<&TimerInfo> = None;
        for block in &self.blocks {
            let floor = best.map_or(0, |b| b.end);
            if !block.intersects(floor, time) {
                continue;
            }
            for record in block.iter() {
                if record.end < time
                    && best.map_or(true, |b| b.end < record.end)
                    && predicate(record)
                {
                    best = Some(record);
                }
            }
        }
        best
    }

    /// Earliest-ending record with `end > time` that satisfies `predicate`.
    ///
    /// Ties keep the first record found in append order.
    pub fn nearest_after<P>(&self, predicate: P, time: Tick) -> Option<&TimerInfo>
    where
        P: Fn(&TimerInfo) -> bool,
    {
        let mut best: Option<&TimerInfo> = None;
        for block in &self.blocks {
            let ceiling = best.map_or(Tick::MAX, |b| b.end);
            if !block.intersects(time, ceiling) {
                continue;
            }
            for record in block.iter() {
                if record.end > time
                    && best.map_or(true, |b| record.end < b.end)
                    && predicate(record)
                {
                    best = Some(record);
                }
            }
        }
        best
    }

    /// First record (append order) whose span contains `time`
    #[must_use]
    pub fn record_containing(&self, time: Tick) -> Option<&TimerInfo> {
        self.query_overlap(time, time).flat_map(TimerBlock::iter).find(|r| r.contains(time))
    }

    /// Earliest-starting record with `lo <= start < hi`
    #[must_use]
    pub fn first_starting_in(&self, lo: Tick, hi: Tick) -> Option<&TimerInfo> {
        let mut best: Option<&TimerInfo> = None;
        for record in self.query_overlap(lo, hi).flat_map(TimerBlock::iter) {
            let in_range = record.start >= lo && (record.start < hi || (lo == hi && record.start == lo));
            if in_range && best.map_or(true, |b| record.start < b.start) {
                best = Some(record);
            }
        }
        best
    }

    // -------------------------------------------------------------------------
    // Same-row neighbors
    // -------------------------------------------------------------------------

    /// Append index of `record`, if this chain holds it.
    ///
    /// Identical copies are told apart by their delivery `sequence`; a record
    /// that was never ingested resolves to the first equal copy.
    #[must_use]
    pub fn position_of(&self, record: &TimerInfo) -> Option<usize> {
        let mut first_equal = None;
        // True when `candidate` is the very record asked for
        let mut exact = |i: usize, candidate: &TimerInfo| {
            if candidate != record {
                return false;
            }
            if record.sequence != 0 && candidate.sequence == record.sequence {
                return true;
            }
            first_equal.get_or_insert(i);
            false
        };

        if self.time_ordered {
            let first = self.first_index_starting_at_or_after(record.start);
            for i in first..self.len {
                let Some(candidate) = self.get(i).filter(|r| r.start == record.start) else { break };
                if exact(i, candidate) {
                    return Some(i);
                }
            }
        } else {
            let mut offset = 0;
            for block in &self.blocks {
                if block.intersects(record.start, record.end) {
                    for (i, candidate) in block.records.iter().enumerate() {
                        if exact(offset + i, candidate) {
                            return Some(offset + i);
                        }
                    }
                }
                offset += block.len();
            }
        }
        first_equal
    }

    /// The record starting immediately before/after `record` in this chain.
    ///
    /// Records are ordered by `(start, append index)`, so neighbors are
    /// symmetric: walking `After` then `Before` returns to the same record.
    #[must_use]
    pub fn depth_neighbor(&self, record: &TimerInfo, direction: Direction) -> Option<&TimerInfo> {
        let index = self.position_of(record)?;

        if self.time_ordered {
            return match direction {
                Direction::Before => index.checked_sub(1).and_then(|i| self.get(i)),
                Direction::After => self.get(index + 1),
            };
        }

        let key = (record.start, index);
        let mut best: Option<((Tick, usize), &TimerInfo)> = None;
        let mut offset = 0;
        for block in &self.blocks {
            let candidate_block = match direction {
                Direction::Before => block.min_start <= record.start,
                Direction::After => block.max_end >= record.start,
            };
            if candidate_block && !block.is_empty() {
                for (i, r) in block.records.iter().enumerate() {
                    let k = (r.start, offset + i);
                    let better = match direction {
                        Direction::Before => k < key && best.map_or(true, |(b, _)| k > b),
                        Direction::After => k > key && best.map_or(true, |(b, _)| k < b),
                    };
                    if better {
                        best = Some((k, r));
                    }
                }
            }
            offset += block.len();
        }
        best.map(|(_, r)| r)
    }

    /// Binary search (time-ordered chains only) for the first index whose
    /// record starts at or after `start`
    fn first_index_starting_at_or_after(&self, start: Tick) -> usize {
        let block_index =
            self.blocks.partition_point(|b| b.records.last().is_some_and(|r| r.start < start));
        let Some(block) = self.blocks.get(block_index) else {
            return self.len;
        };
        let within = block.records.partition_point(|r| r.start < start);
        block_index * self.block_capacity + within
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chronoscope_common::{FunctionId, ThreadId};

    fn span(start: Tick, end: Tick) -> TimerInfo {
        TimerInfo::function_span(start, end, ThreadId(1), 0)
    }

    fn chain_of(capacity: usize, spans: &[(Tick, Tick)]) -> TimerChain {
        let mut chain = TimerChain::new(capacity);
        for &(s, e) in spans {
            chain.append(span(s, e));
        }
        chain
    }

    #[test]
    fn test_append_splits_into_blocks() {
        let chain = chain_of(2, &[(0, 10), (10, 20), (20, 30), (30, 40), (40, 50)]);
        assert_eq!(chain.len(), 5);
        assert_eq!(chain.blocks().count(), 3);
        let hulls: Vec<_> = chain.blocks().map(|b| (b.min_start(), b.max_end())).collect();
        assert_eq!(hulls, vec![(0, 20), (20, 40), (40, 50)]);
        assert_eq!(chain.get(4).map(|r| r.start), Some(40));
        assert!(chain.get(5).is_none());
    }

    #[test]
    fn test_query_overlap_prunes_blocks() {
        let chain = chain_of(2, &[(0, 10), (10, 20), (20, 30), (30, 40), (40, 50)]);
        let blocks: Vec<_> = chain.query_overlap(25, 35).map(TimerBlock::min_start).collect();
        assert_eq!(blocks, vec![20]);
        let records: Vec<_> = chain.records_in_range(25, 35).map(|r| r.start).collect();
        assert_eq!(records, vec![20, 30]);
    }

    #[test]
    fn test_extent_tracks_out_of_order_records() {
        let chain = chain_of(4, &[(50, 60), (10, 20), (70, 90)]);
        assert_eq!(chain.min_start(), Some(10));
        assert_eq!(chain.max_end(), Some(90));
        assert!(!chain.is_time_ordered());
        assert!(TimerChain::default().min_start().is_none());
    }

    #[test]
    fn test_nearest_before_and_after() {
        let mut chain = TimerChain::new(2);
        for (i, (s, e)) in [(0, 10), (20, 30), (40, 50), (60, 70)].into_iter().enumerate() {
            let id = if i % 2 == 0 { FunctionId(1) } else { FunctionId(2) };
            chain.append(span(s, e).with_function(id));
        }
        let is_f1 = |r: &TimerInfo| r.function_id == Some(FunctionId(1));

        assert_eq!(chain.nearest_before(is_f1, 50).map(|r| r.start), Some(0));
        assert_eq!(chain.nearest_before(is_f1, 51).map(|r| r.start), Some(40));
        assert_eq!(chain.nearest_after(is_f1, 10).map(|r| r.start), Some(40));
        assert!(chain.nearest_after(is_f1, 50).is_none());
        assert_eq!(chain.nearest_after(|_| true, 10).map(|r| r.start), Some(20));
    }

    #[test]
    fn test_nearest_tie_keeps_first_in_append_order() {
        let mut chain = TimerChain::new(8);
        chain.append(span(5, 30).with_function(FunctionId(1)));
        chain.append(span(10, 30).with_function(FunctionId(2)));
        let found = chain.nearest_after(|_| true, 20).unwrap();
        assert_eq!(found.function_id, Some(FunctionId(1)));
        let found = chain.nearest_before(|_| true, 40).unwrap();
        assert_eq!(found.function_id, Some(FunctionId(1)));
    }

    #[test]
    fn test_depth_neighbor_time_ordered() {
        let chain = chain_of(2, &[(0, 10), (10, 20), (20, 30), (30, 40), (40, 50)]);
        let third = span(20, 30);
        assert_eq!(chain.depth_neighbor(&third, Direction::Before).map(|r| r.start), Some(10));
        assert_eq!(chain.depth_neighbor(&third, Direction::After).map(|r| r.start), Some(30));
        assert!(chain.depth_neighbor(&span(0, 10), Direction::Before).is_none());
        assert!(chain.depth_neighbor(&span(40, 50), Direction::After).is_none());
        assert!(chain.depth_neighbor(&span(1, 2), Direction::After).is_none());
    }

    #[test]
    fn test_depth_neighbor_out_of_order_is_by_start() {
        let chain = chain_of(2, &[(40, 50), (0, 10), (20, 30), (10, 20)]);
        assert!(!chain.is_time_ordered());
        let middle = span(20, 30);
        assert_eq!(chain.depth_neighbor(&middle, Direction::Before).map(|r| r.start), Some(10));
        assert_eq!(chain.depth_neighbor(&middle, Direction::After).map(|r| r.start), Some(40));
        assert!(chain.depth_neighbor(&span(0, 10), Direction::Before).is_none());
    }

    #[test]
    fn test_duplicate_records_resolve_by_sequence() {
        for spans in [vec![(0, 10), (20, 20), (20, 20)], vec![(20, 20), (0, 10), (20, 20)]] {
            let mut chain = TimerChain::new(2);
            for (sequence, &(s, e)) in (1..).zip(&spans) {
                chain.append(TimerInfo { sequence, ..span(s, e) });
            }
            let copies: Vec<TimerInfo> = chain.iter().filter(|r| r.start == 20).cloned().collect();
            assert_ne!(chain.position_of(&copies[0]), chain.position_of(&copies[1]));

            for record in chain.iter() {
                if let Some(next) = chain.depth_neighbor(record, Direction::After) {
                    let back = chain.depth_neighbor(&next.clone(), Direction::Before).unwrap();
                    assert_eq!(back.sequence, record.sequence);
                }
            }
        }
    }

    #[test]
    fn test_depth_neighbor_symmetry() {
        for spans in [
            vec![(0, 10), (10, 20), (20, 30), (30, 40), (40, 50)],
            vec![(30, 40), (0, 10), (40, 50), (10, 20), (20, 30)],
        ] {
            let chain = chain_of(2, &spans);
            for record in chain.iter() {
                if let Some(next) = chain.depth_neighbor(record, Direction::After) {
                    let back = chain.depth_neighbor(next, Direction::Before).unwrap();
                    assert_eq!(back, record);
                }
            }
        }
    }

    #[test]
    fn test_record_containing_and_first_starting_in() {
        let chain = chain_of(2, &[(0, 100), (100, 150), (150, 300)]);
        assert_eq!(chain.record_containing(120).map(|r| r.start), Some(100));
        assert_eq!(chain.record_containing(100).map(|r| r.start), Some(100));
        assert!(chain.record_containing(300).is_none());
        assert_eq!(chain.first_starting_in(90, 200).map(|r| r.start), Some(100));
        assert!(chain.first_starting_in(301, 400).is_none());
    }
}
