use chronoscope_common::TimerInfo;

use super::{TrackCommon, TrackNeighbor};
use crate::config::TrackLayout;
use crate::domain::Tick;
use crate::render::{color_for_name, push_row_shapes, FrameParams, Shape};
use crate::timer_chain::{Direction, TimerChain};

/// Spans of one named async series.
///
/// Async spans may overlap freely, so each one is placed on the first lane
/// whose last span ended at or before its start. No two spans on a lane
/// overlap.
#[derive(Debug)]
pub struct AsyncTrack {
    pub(crate) common: TrackCommon,
    lanes: Vec<TimerChain>,
    lane_ends: Vec<Tick>,
    block_capacity: usize,
}

impl AsyncTrack {
    #[must_use]
    pub fn new(name: &str, block_capacity: usize) -> Self {
        Self {
            common: TrackCommon::new(name, color_for_name(name)),
            lanes: Vec::new(),
            lane_ends: Vec::new(),
            block_capacity,
        }
    }

    pub fn on_timer(&mut self, record: TimerInfo) {
        self.common.record(record.start, record.end);
        let lane = match self.lane_ends.iter().position(|end| *end <= record.start) {
            Some(lane) => lane,
            None => {
                self.lanes.push(TimerChain::new(self.block_capacity));
                self.lane_ends.push(0);
                self.lanes.len() - 1
            }
        };
        self.lane_ends[lane] = record.end;
        self.lanes[lane].append(record);
    }

    #[must_use]
    pub fn lane_count(&self) -> usize {
        self.lanes.len()
    }

    pub fn chains(&self) -> impl Iterator<Item = &TimerChain> + '_ {
        self.lanes.iter()
    }

    pub(crate) fn content_height(&self, layout: &TrackLayout) -> f32 {
        #[allow(clippy::cast_precision_loss)]
        let rows = self.lanes.len().max(1) as f32;
        rows * layout.text_box_height
    }

    pub(crate) fn push_shapes(&self, frame: &FrameParams<'_>, top: f32, out: &mut Vec<Shape>) {
        let color = self.common.color;
        let row_height = frame.layout.text_box_height;
        for (row, lane) in self.lanes.iter().enumerate() {
            #[allow(clippy::cast_precision_loss)]
            let y = top + row as f32 * row_height;
            push_row_shapes(
                lane.records_in_range(frame.min_tick, frame.max_tick),
                lane.is_time_ordered(),
                frame,
                y,
                row_height,
                |_| color,
                out,
            );
        }
    }

    /// Left/right stay on the lane holding `from`; lanes have no depth
    pub(crate) fn neighbor(&self, from: &TimerInfo, direction: TrackNeighbor) -> Option<&TimerInfo> {
        let direction = match direction {
            TrackNeighbor::Left => Direction::Before,
            TrackNeighbor::Right => Direction::After,
            TrackNeighbor::Up | TrackNeighbor::Down => return None,
        };
        let lane = self.lanes.iter().find(|lane| lane.position_of(from).is_some())?;
        lane.depth_neighbor(from, direction)
    }
}
