use chronoscope_common::{ThreadId, TimerInfo};

use super::{DepthChains, TrackCommon, TrackNeighbor};
use crate::config::TrackLayout;
use crate::render::{color_for_id, thread_color, FrameParams, Shape};

/// Spans of one thread, one row per call depth.
///
/// The synthetic [`ThreadId::ALL_THREADS`] instance is the process track.
#[derive(Debug)]
pub struct ThreadTrack {
    pub(crate) common: TrackCommon,
    thread_id: ThreadId,
    rows: DepthChains,
}

impl ThreadTrack {
    #[must_use]
    pub fn new(thread_id: ThreadId, block_capacity: usize) -> Self {
        Self {
            common: TrackCommon::new(thread_id.0.to_string(), thread_color(thread_id)),
            thread_id,
            rows: DepthChains::new(block_capacity),
        }
    }

    #[must_use]
    pub fn thread_id(&self) -> ThreadId {
        self.thread_id
    }

    #[must_use]
    pub fn is_process_track(&self) -> bool {
        self.thread_id.is_all_threads()
    }

    #[must_use]
    pub fn rows(&self) -> &DepthChains {
        &self.rows
    }

    pub fn on_timer(&mut self, record: TimerInfo) {
        self.common.record(record.start, record.end);
        self.rows.append(record);
    }

    pub(crate) fn content_height(&self, layout: &TrackLayout) -> f32 {
        #[allow(clippy::cast_precision_loss)]
        let rows = self.rows.depth_count().max(1) as f32;
        rows * layout.text_box_height
    }

    pub(crate) fn push_shapes(&self, frame: &FrameParams<'_>, top: f32, out: &mut Vec<Shape>) {
        let track_color = self.common.color;
        self.rows.push_shapes(
            frame,
            top,
            frame.layout.text_box_height,
            |timer| timer.function_id.map_or(track_color, |f| color_for_id(f.0)),
            out,
        );
    }

    /// Previous timer at the same depth
    #[must_use]
    pub fn get_left(&self, from: &TimerInfo) -> Option<&TimerInfo> {
        self.rows.left(from)
    }

    /// Next timer at the same depth
    #[must_use]
    pub fn get_right(&self, from: &TimerInfo) -> Option<&TimerInfo> {
        self.rows.right(from)
    }

    /// Caller of `from`
    #[must_use]
    pub fn get_up(&self, from: &TimerInfo) -> Option<&TimerInfo> {
        self.rows.up(from)
    }

    /// First callee of `from`
    #[must_use]
    pub fn get_down(&self, from: &TimerInfo) -> Option<&TimerInfo> {
        self.rows.down(from)
    }

    pub(crate) fn neighbor(&self, from: &TimerInfo, direction: TrackNeighbor) -> Option<&TimerInfo> {
        match direction {
            TrackNeighbor::Left => self.get_left(from),
            TrackNeighbor::Right => self.get_right(from),
            TrackNeighbor::Up => self.get_up(from),
            TrackNeighbor::Down => self.get_down(from),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_on_timer_indexes_by_depth() {
        let mut track = ThreadTrack::new(ThreadId(7), 8);
        track.on_timer(TimerInfo::function_span(100, 200, ThreadId(7), 0));
        track.on_timer(TimerInfo::function_span(110, 150, ThreadId(7), 1));
        track.on_timer(TimerInfo::function_span(300, 400, ThreadId(7), 0));

        assert_eq!(track.common.num_timers(), 3);
        assert_eq!(track.rows().depth_count(), 2);
        assert_eq!(track.rows().chain(0).map(|c| c.len()), Some(2));
        assert_eq!(track.common.min_time(), Some(100));
        assert_eq!(track.common.max_time(), Some(400));
    }

    #[test]
    fn test_four_directions() {
        let mut track = ThreadTrack::new(ThreadId(7), 8);
        let root = TimerInfo::function_span(100, 200, ThreadId(7), 0);
        let child = TimerInfo::function_span(110, 150, ThreadId(7), 1);
        let next_root = TimerInfo::function_span(300, 400, ThreadId(7), 0);
        for timer in [&root, &child, &next_root] {
            track.on_timer(timer.clone());
        }

        assert_eq!(track.get_right(&root), Some(&next_root));
        assert_eq!(track.get_left(&next_root), Some(&root));
        assert_eq!(track.get_down(&root), Some(&child));
        assert_eq!(track.get_up(&child), Some(&root));
        assert!(track.get_up(&root).is_none());
    }

    #[test]
    fn test_process_track_identity() {
        assert!(ThreadTrack::new(ThreadId::ALL_THREADS, 8).is_process_track());
        assert!(!ThreadTrack::new(ThreadId(1), 8).is_process_track());
    }
}
