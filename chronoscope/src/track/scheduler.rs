use std::collections::BTreeMap;

use chronoscope_common::{CoreId, TimerInfo};

use super::{TrackCommon, TrackNeighbor};
use crate::config::TrackLayout;
use crate::domain::Color;
use crate::render::{push_row_shapes, thread_color, FrameParams, Shape};
use crate::timer_chain::{Direction, TimerChain};

const SCHEDULER_GRAY: Color = Color::rgb(120, 120, 120);

/// CPU scheduling slices, one row per observed core
#[derive(Debug)]
pub struct SchedulerTrack {
    pub(crate) common: TrackCommon,
    cores: BTreeMap<CoreId, TimerChain>,
    block_capacity: usize,
}

impl SchedulerTrack {
    #[must_use]
    pub fn new(block_capacity: usize) -> Self {
        let mut track = Self {
            common: TrackCommon::new("Scheduler", SCHEDULER_GRAY),
            cores: BTreeMap::new(),
            block_capacity,
        };
        track.refresh_label();
        track
    }

    /// Append a slice to the row of its core.
    ///
    /// Records without a core id land on core 0.
    pub fn on_timer(&mut self, record: TimerInfo) {
        let core = record.core_id.unwrap_or(CoreId(0));
        let capacity = self.block_capacity;
        let is_new_core = !self.cores.contains_key(&core);

        self.common.record(record.start, record.end);
        self.cores.entry(core).or_insert_with(|| TimerChain::new(capacity)).append(record);
        if is_new_core {
            self.refresh_label();
        }
    }

    #[must_use]
    pub fn core_count(&self) -> usize {
        self.cores.len()
    }

    /// Cores that received at least one slice, ascending
    pub fn cores(&self) -> impl Iterator<Item = CoreId> + '_ {
        self.cores.keys().copied()
    }

    pub fn chains(&self) -> impl Iterator<Item = &TimerChain> + '_ {
        self.cores.values()
    }

    fn refresh_label(&mut self) {
        self.common.label = format!("Scheduler ({} cores)", self.cores.len());
    }

    pub(crate) fn content_height(&self, layout: &TrackLayout) -> f32 {
        #[allow(clippy::cast_precision_loss)]
        let rows = self.cores.len().max(1) as f32;
        rows * layout.core_height
    }

    pub(crate) fn push_shapes(&self, frame: &FrameParams<'_>, top: f32, out: &mut Vec<Shape>) {
        let row_height = frame.layout.core_height;
        for (row, chain) in self.cores.values().enumerate() {
            #[allow(clippy::cast_precision_loss)]
            let y = top + row as f32 * row_height;
            push_row_shapes(
                chain.records_in_range(frame.min_tick, frame.max_tick),
                chain.is_time_ordered(),
                frame,
                y,
                row_height,
                // Slices take the color of the thread that ran
                |timer| thread_color(timer.thread_id),
                out,
            );
        }
    }

    pub(crate) fn neighbor(&self, from: &TimerInfo, direction: TrackNeighbor) -> Option<&TimerInfo> {
        let chain = self.cores.get(&from.core_id.unwrap_or(CoreId(0)))?;
        match direction {
            TrackNeighbor::Left => chain.depth_neighbor(from, Direction::Before),
            TrackNeighbor::Right => chain.depth_neighbor(from, Direction::After),
            TrackNeighbor::Up | TrackNeighbor::Down => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chronoscope_common::ThreadId;

    #[test]
    fn test_multiplexes_by_core() {
        let mut track = SchedulerTrack::new(8);
        assert_eq!(track.common.label, "Scheduler (0 cores)");
        track.on_timer(TimerInfo::core_activity(50, 90, ThreadId(7), CoreId(2)));
        track.on_timer(TimerInfo::core_activity(90, 120, ThreadId(8), CoreId(0)));
        track.on_timer(TimerInfo::core_activity(95, 130, ThreadId(9), CoreId(2)));

        assert_eq!(track.cores().collect::<Vec<_>>(), vec![CoreId(0), CoreId(2)]);
        assert_eq!(track.common.label, "Scheduler (2 cores)");
        assert_eq!(track.common.num_timers(), 3);
    }

    #[test]
    fn test_left_right_within_core() {
        let mut track = SchedulerTrack::new(8);
        let a = TimerInfo::core_activity(50, 90, ThreadId(7), CoreId(2));
        let other_core = TimerInfo::core_activity(60, 70, ThreadId(8), CoreId(1));
        let b = TimerInfo::core_activity(95, 130, ThreadId(9), CoreId(2));
        for timer in [&a, &other_core, &b] {
            track.on_timer(timer.clone());
        }
        assert_eq!(track.neighbor(&a, TrackNeighbor::Right), Some(&b));
        assert_eq!(track.neighbor(&b, TrackNeighbor::Left), Some(&a));
        assert!(track.neighbor(&a, TrackNeighbor::Up).is_none());
    }
}
