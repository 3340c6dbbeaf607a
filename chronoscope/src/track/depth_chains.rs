//! Rows of timer chains keyed by call depth
//!
//! Shared by thread and GPU tracks: both nest spans by depth and navigate the
//! same way.

use std::collections::BTreeMap;

use chronoscope_common::TimerInfo;

use crate::domain::Color;
use crate::render::{push_row_shapes, FrameParams, Shape};
use crate::timer_chain::{Direction, TimerChain};

#[derive(Debug)]
pub struct DepthChains {
    chains: BTreeMap<u32, TimerChain>,
    block_capacity: usize,
}

impl DepthChains {
    #[must_use]
    pub fn new(block_capacity: usize) -> Self {
        Self { chains: BTreeMap::new(), block_capacity }
    }

    pub fn append(&mut self, record: TimerInfo) {
        let capacity = self.block_capacity;
        self.chains.entry(record.depth).or_insert_with(|| TimerChain::new(capacity)).append(record);
    }

    /// Number of rows needed to draw every depth (0 when empty)
    #[must_use]
    pub fn depth_count(&self) -> u32 {
        self.chains.keys().next_back().map_or(0, |max| max + 1)
    }

    #[must_use]
    pub fn chain(&self, depth: u32) -> Option<&TimerChain> {
        self.chains.get(&depth)
    }

    pub fn chains(&self) -> impl Iterator<Item = &TimerChain> + '_ {
        self.chains.values()
    }

    // -------------------------------------------------------------------------
    // Navigation
    // -------------------------------------------------------------------------

    /// Previous record at the same depth
    #[must_use]
    pub fn left(&self, from: &TimerInfo) -> Option<&TimerInfo> {
        self.chain(from.depth)?.depth_neighbor(from, Direction::Before)
    }

    /// Next record at the same depth
    #[must_use]
    pub fn right(&self, from: &TimerInfo) -> Option<&TimerInfo> {
        self.chain(from.depth)?.depth_neighbor(from, Direction::After)
    }

    /// Enclosing record one depth shallower
    #[must_use]
    pub fn up(&self, from: &TimerInfo) -> Option<&TimerInfo> {
        let parent_depth = from.depth.checked_sub(1)?;
        self.chain(parent_depth)?.record_containing(from.start)
    }

    /// Record one depth deeper containing `from.start`, else the earliest
    /// deeper record starting inside `from`
    #[must_use]
    pub fn down(&self, from: &TimerInfo) -> Option<&TimerInfo> {
        let chain = self.chain(from.depth.checked_add(1)?)?;
        chain.record_containing(from.start).or_else(|| chain.first_starting_in(from.start, from.end))
    }

    // -------------------------------------------------------------------------
    // Primitives
    // -------------------------------------------------------------------------

    /// Span shapes for every row, row `d` drawn at `top + d * row_height`
    pub fn push_shapes<F>(
        &self,
        frame: &FrameParams<'_>,
        top: f32,
        row_height: f32,
        mut color_of: F,
        out: &mut Vec<Shape>,
    ) where
        F: FnMut(&TimerInfo) -> Color,
    {
        for (depth, chain) in &self.chains {
            #[allow(clippy::cast_precision_loss)]
            let y = top + *depth as f32 * row_height;
            push_row_shapes(
                chain.records_in_range(frame.min_tick, frame.max_tick),
                chain.is_time_ordered(),
                frame,
                y,
                row_height,
                &mut color_of,
                out,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chronoscope_common::ThreadId;

    fn nested() -> DepthChains {
        let mut rows = DepthChains::new(4);
        // depth 0: [0, 100) [100, 200)
        // depth 1:   [10, 40) [50, 90)   [120, 180)
        // depth 2:    [10, 20)
        for (s, e, d) in [(0, 100, 0), (10, 40, 1), (10, 20, 2), (50, 90, 1), (100, 200, 0), (120, 180, 1)] {
            rows.append(TimerInfo::function_span(s, e, ThreadId(1), d));
        }
        rows
    }

    fn span(s: u64, e: u64, d: u32) -> TimerInfo {
        TimerInfo::function_span(s, e, ThreadId(1), d)
    }

    #[test]
    fn test_depth_count() {
        assert_eq!(nested().depth_count(), 3);
        assert_eq!(DepthChains::new(4).depth_count(), 0);
    }

    #[test]
    fn test_left_right_stay_on_depth() {
        let rows = nested();
        assert_eq!(rows.right(&span(10, 40, 1)), Some(&span(50, 90, 1)));
        assert_eq!(rows.right(&span(50, 90, 1)), Some(&span(120, 180, 1)));
        assert_eq!(rows.left(&span(100, 200, 0)), Some(&span(0, 100, 0)));
        assert!(rows.left(&span(0, 100, 0)).is_none());
    }

    #[test]
    fn test_up_finds_enclosing_parent() {
        let rows = nested();
        assert_eq!(rows.up(&span(50, 90, 1)), Some(&span(0, 100, 0)));
        assert_eq!(rows.up(&span(120, 180, 1)), Some(&span(100, 200, 0)));
        assert!(rows.up(&span(0, 100, 0)).is_none());
    }

    #[test]
    fn test_down_prefers_child_at_start_then_first_child() {
        let rows = nested();
        assert_eq!(rows.down(&span(10, 40, 1)), Some(&span(10, 20, 2)));
        assert_eq!(rows.down(&span(0, 100, 0)), Some(&span(10, 40, 1)));
        assert!(rows.down(&span(10, 20, 2)).is_none());
    }
}
