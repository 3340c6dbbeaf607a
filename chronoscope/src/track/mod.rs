//! # Tracks
//!
//! A track is one timeline lane owned by one identity. Five families share
//! the same lifecycle (created on first event, destroyed on `clear()`) but
//! ingest and draw differently:
//!
//! | Variant     | Identity           | Rows                         |
//! |-------------|--------------------|------------------------------|
//! | `Scheduler` | singleton          | one chain per CPU core       |
//! | `Thread`    | thread id          | one chain per call depth     |
//! | `Gpu`       | timeline id        | one chain per depth          |
//! | `Graph`     | series name        | scalar samples, no chains    |
//! | `Async`     | series name        | lanes packed to avoid overlap|
//!
//! [`Track`] is a tagged enum; each variant owns its chains outright.

mod async_track;
mod depth_chains;
mod gpu;
mod graph;
mod scheduler;
mod thread;

pub use async_track::AsyncTrack;
pub use depth_chains::DepthChains;
pub use gpu::{gpu_timeline_label, GpuTrack};
pub use graph::GraphTrack;
pub use scheduler::SchedulerTrack;
pub use thread::ThreadTrack;

use chronoscope_common::TimerInfo;

use crate::config::TrackLayout;
use crate::domain::{Color, Tick, TrackId};
use crate::render::{FrameParams, Shape, TrackKind, TrackPrimitives};
use crate::timer_chain::TimerChain;

/// Direction for per-track navigation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackNeighbor {
    Left,
    Right,
    Up,
    Down,
}

// =============================================================================
// COMMON STATE
// =============================================================================

/// Attributes every track variant carries
#[derive(Debug, Clone)]
pub struct TrackCommon {
    pub name: String,
    pub label: String,
    pub color: Color,
    min_time: Tick,
    max_time: Tick,
    num_timers: usize,
}

impl TrackCommon {
    #[must_use]
    pub fn new(name: impl Into<String>, color: Color) -> Self {
        let name = name.into();
        Self { label: name.clone(), name, color, min_time: Tick::MAX, max_time: 0, num_timers: 0 }
    }

    /// Widen the extent and count one more event
    pub fn record(&mut self, start: Tick, end: Tick) {
        self.min_time = self.min_time.min(start);
        self.max_time = self.max_time.max(end);
        self.num_timers += 1;
    }

    #[must_use]
    pub fn num_timers(&self) -> usize {
        self.num_timers
    }

    /// Earliest start seen, `None` while empty
    #[must_use]
    pub fn min_time(&self) -> Option<Tick> {
        (self.num_timers > 0).then_some(self.min_time)
    }

    /// Latest end seen, `None` while empty
    #[must_use]
    pub fn max_time(&self) -> Option<Tick> {
        (self.num_timers > 0).then_some(self.max_time)
    }
}

// =============================================================================
// TRACK
// =============================================================================

#[derive(Debug)]
pub enum Track {
    Scheduler(SchedulerTrack),
    Thread(ThreadTrack),
    Gpu(GpuTrack),
    Graph(GraphTrack),
    Async(AsyncTrack),
}

impl Track {
    #[must_use]
    pub fn kind(&self) -> TrackKind {
        match self {
            Track::Scheduler(_) => TrackKind::Scheduler,
            Track::Thread(_) => TrackKind::Thread,
            Track::Gpu(_) => TrackKind::Gpu,
            Track::Graph(_) => TrackKind::Graph,
            Track::Async(_) => TrackKind::Async,
        }
    }

    #[must_use]
    pub fn common(&self) -> &TrackCommon {
        match self {
            Track::Scheduler(t) => &t.common,
            Track::Thread(t) => &t.common,
            Track::Gpu(t) => &t.common,
            Track::Graph(t) => &t.common,
            Track::Async(t) => &t.common,
        }
    }

    pub fn common_mut(&mut self) -> &mut TrackCommon {
        match self {
            Track::Scheduler(t) => &mut t.common,
            Track::Thread(t) => &mut t.common,
            Track::Gpu(t) => &mut t.common,
            Track::Graph(t) => &mut t.common,
            Track::Async(t) => &mut t.common,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.event_count() == 0
    }

    #[must_use]
    pub fn event_count(&self) -> usize {
        self.common().num_timers()
    }

    #[must_use]
    pub fn min_time(&self) -> Option<Tick> {
        self.common().min_time()
    }

    #[must_use]
    pub fn max_time(&self) -> Option<Tick> {
        self.common().max_time()
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.common().name
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.common().label
    }

    /// Ingest one record
    pub fn on_timer(&mut self, record: TimerInfo) {
        match self {
            Track::Scheduler(t) => t.on_timer(record),
            Track::Thread(t) => t.on_timer(record),
            Track::Gpu(t) => t.on_timer(record),
            Track::Graph(t) => t.on_timer(&record),
            Track::Async(t) => t.on_timer(record),
        }
    }

    /// World-space height of the track, margins included
    #[must_use]
    pub fn height(&self, layout: &TrackLayout) -> f32 {
        let content = match self {
            Track::Scheduler(t) => t.content_height(layout),
            Track::Thread(t) => t.content_height(layout),
            Track::Gpu(t) => t.content_height(layout),
            Track::Graph(_) => layout.graph_track_height,
            Track::Async(t) => t.content_height(layout),
        };
        layout.track_top_margin + content + layout.track_bottom_margin
    }

    /// Rebuild the shapes covering `[frame.min_tick, frame.max_tick]`
    #[must_use]
    pub fn update_primitives(&self, id: TrackId, frame: &FrameParams<'_>, y: f32) -> TrackPrimitives {
        let content_top = y + frame.layout.track_top_margin;
        let mut shapes: Vec<Shape> = Vec::new();
        match self {
            Track::Scheduler(t) => t.push_shapes(frame, content_top, &mut shapes),
            Track::Thread(t) => t.push_shapes(frame, content_top, &mut shapes),
            Track::Gpu(t) => t.push_shapes(frame, content_top, &mut shapes),
            Track::Graph(t) => t.push_shapes(frame, content_top, &mut shapes),
            Track::Async(t) => t.push_shapes(frame, content_top, &mut shapes),
        }
        let common = self.common();
        TrackPrimitives {
            track: id,
            kind: self.kind(),
            label: common.label.clone(),
            color: common.color,
            y,
            height: self.height(frame.layout),
            shapes,
        }
    }

    /// Neighbor of `from` inside this track; `None` if the track does not
    /// hold `from` or has nothing in that direction
    #[must_use]
    pub fn neighbor(&self, from: &TimerInfo, direction: TrackNeighbor) -> Option<&TimerInfo> {
        match self {
            Track::Thread(t) => t.neighbor(from, direction),
            Track::Gpu(t) => t.neighbor(from, direction),
            Track::Scheduler(t) => t.neighbor(from, direction),
            Track::Async(t) => t.neighbor(from, direction),
            Track::Graph(_) => None,
        }
    }

    /// Every chain this track owns
    #[must_use]
    pub fn chains(&self) -> Vec<&TimerChain> {
        match self {
            Track::Scheduler(t) => t.chains().collect(),
            Track::Thread(t) => t.rows().chains().collect(),
            Track::Gpu(t) => t.rows().chains().collect(),
            Track::Async(t) => t.chains().collect(),
            Track::Graph(_) => Vec::new(),
        }
    }

    #[must_use]
    pub fn as_scheduler(&self) -> Option<&SchedulerTrack> {
        match self {
            Track::Scheduler(t) => Some(t),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_graph(&self) -> Option<&GraphTrack> {
        match self {
            Track::Graph(t) => Some(t),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chronoscope_common::{CoreId, EncodedValue, ThreadId};

    #[test]
    fn test_common_extent_is_none_while_empty() {
        let mut common = TrackCommon::new("main", Color::rgb(1, 2, 3));
        assert!(common.min_time().is_none());
        common.record(50, 90);
        common.record(10, 20);
        assert_eq!(common.min_time(), Some(10));
        assert_eq!(common.max_time(), Some(90));
        assert_eq!(common.num_timers(), 2);
        assert_eq!(common.label, "main");
    }

    #[test]
    fn test_dispatch_by_variant() {
        let mut thread = Track::Thread(ThreadTrack::new(ThreadId(7), 16));
        thread.on_timer(TimerInfo::function_span(100, 200, ThreadId(7), 0));
        assert_eq!(thread.kind(), TrackKind::Thread);
        assert_eq!(thread.event_count(), 1);
        assert_eq!(thread.chains().len(), 1);

        let mut scheduler = Track::Scheduler(SchedulerTrack::new(16));
        scheduler.on_timer(TimerInfo::core_activity(50, 90, ThreadId(7), CoreId(2)));
        assert_eq!(scheduler.as_scheduler().map(|s| s.core_count()), Some(1));

        let mut graph = Track::Graph(GraphTrack::new("fps"));
        graph.on_timer(TimerInfo::value_sample("fps", 10, ThreadId(7), EncodedValue::from_f64(60.0)));
        assert!(graph.chains().is_empty());
        assert!(graph.neighbor(&TimerInfo::function_span(0, 1, ThreadId(7), 0), TrackNeighbor::Left).is_none());
    }

    #[test]
    fn test_height_includes_margins() {
        let layout = TrackLayout::default();
        let mut thread = Track::Thread(ThreadTrack::new(ThreadId(7), 16));
        thread.on_timer(TimerInfo::function_span(0, 10, ThreadId(7), 2));
        let expected = layout.track_top_margin + 3.0 * layout.text_box_height + layout.track_bottom_margin;
        assert_eq!(thread.height(&layout), expected);
    }
}
