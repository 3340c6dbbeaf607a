//! # Timeline Engine
//!
//! [`TimeGraph`] is the single coordination point between the delivery side
//! (producer) and the render/query side (consumer):
//!
//! ```text
//!  delivery thread                         UI / query thread
//!  ───────────────                         ─────────────────
//!  process_timer(record) ─┐           ┌── update_primitives(ctx, viewport)
//!                         ▼           ▼
//!                  ┌──────────────────────────┐
//!                  │  Mutex<GraphState>       │
//!                  │   arena: Vec<Track>      │
//!                  │   identity → TrackId     │
//!                  │   draw order, window,    │
//!                  │   extent, selection      │
//!                  └──────────────────────────┘
//!                         │ needs_redraw (AtomicBool)
//! ```
//!
//! Every registry, track and extent access happens under one lock. Track
//! creation, ingestion, per-frame iteration and the count/extent scans all
//! serialize on it; producer and consumer contend, but no reader ever sees a
//! half-appended record.
//!
//! The engine owns no threads and performs no I/O. Capture metadata (thread
//! names, the callstack index) is read through a [`CaptureContext`] passed
//! into the calls that need it.
//!
//! ## Lifecycle
//!
//! `Empty → Capturing → Idle`. The first `process_timer` starts capturing,
//! [`TimeGraph::finish_capture`] enters the static view, and
//! [`TimeGraph::clear`] returns to `Empty`.

mod navigation;
mod selection;
mod sort;
mod window;

pub use navigation::{JumpDirection, JumpScope};
pub use window::Visibility;

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use chronoscope_common::{
    CallstackEvent, CoreId, FunctionInfo, FunctionRole, ThreadId, TimelineId, TimerInfo, TimerKind,
};
use log::{debug, info, warn};
use parking_lot::Mutex;

use crate::capture::CaptureContext;
use crate::config::{TimeGraphConfig, TrackLayout};
use crate::domain::{Tick, TrackId};
use crate::overlay::IteratorOverlay;
use crate::render::{FrameParams, PickingMode, RenderBatch, TrackKind, INTROSPECTION_GREEN};
use crate::time_mapping::{tick_to_us, TimeMapping, TimeWindow, Viewport};
use crate::track::{AsyncTrack, GpuTrack, GraphTrack, SchedulerTrack, ThreadTrack, Track};

/// Capture lifecycle as seen by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    /// Nothing ingested since construction or the last `clear()`
    Empty,
    /// Records are arriving; track re-sorting is throttled
    Capturing,
    /// Capture finished; the view is static
    Idle,
}

/// Snapshot of one track for callers outside the lock
#[derive(Debug, Clone, PartialEq)]
pub struct TrackSummary {
    pub id: TrackId,
    pub kind: TrackKind,
    pub name: String,
    pub label: String,
    pub event_count: usize,
    pub min_time: Option<Tick>,
    pub max_time: Option<Tick>,
    pub height: f32,
}

// =============================================================================
// LOCKED STATE
// =============================================================================

#[derive(Debug)]
struct CachedFrame {
    viewport: Viewport,
    window: TimeWindow,
    batch: RenderBatch,
}

/// Everything guarded by the engine lock
#[derive(Debug)]
pub(crate) struct GraphState {
    tracks: Vec<Track>,
    scheduler: TrackId,
    process: TrackId,
    thread_tracks: BTreeMap<ThreadId, TrackId>,
    gpu_tracks: BTreeMap<TimelineId, TrackId>,
    graph_tracks: BTreeMap<String, TrackId>,
    async_tracks: BTreeMap<String, TrackId>,
    draw_order: Vec<TrackId>,

    window: TimeWindow,
    /// `[capture_min_tick, capture_max_tick]`, `None` until data arrives
    extent: Option<(Tick, Tick)>,
    capture_state: CaptureState,

    last_reorder: Option<Instant>,
    force_reorder: bool,
    thread_filter: String,

    selection: BTreeMap<ThreadId, Vec<CallstackEvent>>,
    overlay: IteratorOverlay,
    selected: Option<TimerInfo>,

    cores_seen: BTreeSet<CoreId>,
    /// Instrumented timers per thread, drives the thread ordering
    thread_timer_counts: BTreeMap<ThreadId, usize>,

    cached: Option<CachedFrame>,
    block_capacity: usize,
    /// Next delivery ordinal handed to an ingested record
    next_sequence: u64,
}

impl GraphState {
    fn new(block_capacity: usize) -> Self {
        let mut state = Self {
            tracks: Vec::new(),
            scheduler: TrackId(0),
            process: TrackId(0),
            thread_tracks: BTreeMap::new(),
            gpu_tracks: BTreeMap::new(),
            graph_tracks: BTreeMap::new(),
            async_tracks: BTreeMap::new(),
            draw_order: Vec::new(),
            window: TimeWindow::default(),
            extent: None,
            capture_state: CaptureState::Empty,
            last_reorder: None,
            force_reorder: true,
            thread_filter: String::new(),
            selection: BTreeMap::new(),
            overlay: IteratorOverlay::default(),
            selected: None,
            cores_seen: BTreeSet::new(),
            thread_timer_counts: BTreeMap::new(),
            cached: None,
            block_capacity,
            next_sequence: 1,
        };
        state.scheduler = state.push_track(Track::Scheduler(SchedulerTrack::new(block_capacity)));
        // The process track is the thread track of the synthetic all-threads id
        state.process = state.get_or_create_thread(ThreadId::ALL_THREADS);
        state
    }

    fn push_track(&mut self, track: Track) -> TrackId {
        let id = TrackId(self.tracks.len());
        debug!("Created {:?} track {} ({})", track.kind(), id, track.name());
        self.tracks.push(track);
        id
    }

    fn track(&self, id: TrackId) -> Option<&Track> {
        self.tracks.get(id.0)
    }

    fn track_mut(&mut self, id: TrackId) -> Option<&mut Track> {
        self.tracks.get_mut(id.0)
    }

    // -------------------------------------------------------------------------
    // Registry
    // -------------------------------------------------------------------------

    fn get_or_create_thread(&mut self, thread_id: ThreadId) -> TrackId {
        if let Some(id) = self.thread_tracks.get(&thread_id) {
            return *id;
        }
        let id = self.push_track(Track::Thread(ThreadTrack::new(thread_id, self.block_capacity)));
        self.thread_tracks.insert(thread_id, id);
        id
    }

    fn get_or_create_gpu(&mut self, timeline_id: TimelineId) -> TrackId {
        if let Some(id) = self.gpu_tracks.get(&timeline_id) {
            return *id;
        }
        // Named on the next sort, once the capture context is at hand
        let id = self.push_track(Track::Gpu(GpuTrack::new(timeline_id, "", self.block_capacity)));
        self.gpu_tracks.insert(timeline_id, id);
        id
    }

    fn get_or_create_graph(&mut self, name: &str) -> TrackId {
        if let Some(id) = self.graph_tracks.get(name) {
            return *id;
        }
        let id = self.push_track(Track::Graph(GraphTrack::new(name)));
        self.graph_tracks.insert(name.to_string(), id);
        id
    }

    fn get_or_create_async(&mut self, name: &str) -> TrackId {
        if let Some(id) = self.async_tracks.get(name) {
            return *id;
        }
        let id = self.push_track(Track::Async(AsyncTrack::new(name, self.block_capacity)));
        self.async_tracks.insert(name.to_string(), id);
        id
    }

    fn deliver(&mut self, id: TrackId, record: TimerInfo) {
        if let Some(track) = self.track_mut(id) {
            track.on_timer(record);
        }
    }

    // -------------------------------------------------------------------------
    // Ingestion
    // -------------------------------------------------------------------------

    fn widen_extent(&mut self, lo: Tick, hi: Tick) {
        let (min, max) = match self.extent {
            None => (lo, hi),
            Some((min, max)) => (min.min(lo), max.max(hi)),
        };
        self.set_extent(min, max);
    }

    /// Replace the extent, shifting the window so it keeps showing the same
    /// absolute ticks when `capture_min_tick` moves
    fn set_extent(&mut self, min: Tick, max: Tick) {
        let old_min = self.extent.map(|(old_min, _)| old_min);
        self.extent = Some((min, max));
        if let Some(old_min) = old_min.filter(|old| *old != min) {
            let shift_us = tick_to_us(min, old_min);
            self.set_min_max(self.window.min_us + shift_us, self.window.max_us + shift_us);
        }
    }

    fn process_timer(&mut self, mut record: TimerInfo, function: Option<&FunctionInfo>) {
        record.sequence = self.next_sequence;
        self.next_sequence += 1;
        self.widen_extent(record.start, record.end);
        if self.capture_state == CaptureState::Empty {
            info!("Capture started");
            self.capture_state = CaptureState::Capturing;
        }

        if let Some(function) = function.filter(|f| f.role == FunctionRole::TrackValue) {
            self.process_value_tracking(&record, &function.name);
        }

        match record.kind {
            TimerKind::GpuActivity => {
                let timeline = record.timeline_id.unwrap_or(TimelineId(0));
                let id = self.get_or_create_gpu(timeline);
                self.deliver(id, record);
            }
            TimerKind::CoreActivity => {
                self.get_or_create_thread(record.thread_id);
                self.cores_seen.insert(record.core_id.unwrap_or(CoreId(0)));
                let id = self.scheduler;
                self.deliver(id, record);
            }
            TimerKind::AsyncSpan => match record.series.clone() {
                Some(series) => {
                    let id = self.get_or_create_async(&series);
                    self.deliver(id, record);
                }
                None => warn!("Dropping async span at {} without a series name", record.start),
            },
            TimerKind::ValueSample => match record.series.clone() {
                Some(series) => {
                    let id = self.get_or_create_graph(&series);
                    self.deliver(id, record);
                }
                None => warn!("Dropping value sample at {} without a series name", record.start),
            },
            TimerKind::FunctionSpan | TimerKind::Introspection => {
                let id = self.get_or_create_thread(record.thread_id);
                if record.kind == TimerKind::Introspection {
                    if let Some(track) = self.track_mut(id) {
                        track.common_mut().color = INTROSPECTION_GREEN;
                    }
                }
                *self.thread_timer_counts.entry(record.thread_id).or_insert(0) += 1;
                self.deliver(id, record);
            }
        }
    }

    /// A timer of a value-tracking function is also a sample of the series
    /// named after the function
    fn process_value_tracking(&mut self, record: &TimerInfo, series: &str) {
        let sample = TimerInfo {
            kind: TimerKind::ValueSample,
            end: record.start,
            series: Some(Arc::from(series)),
            ..record.clone()
        };
        let id = self.get_or_create_graph(series);
        self.deliver(id, sample);
    }

    // -------------------------------------------------------------------------
    // Extent
    // -------------------------------------------------------------------------

    fn capture_min_tick(&self) -> Tick {
        self.extent.map_or(0, |(min, _)| min)
    }

    fn capture_span_us(&self) -> f64 {
        self.extent.map_or(0.0, |(min, max)| tick_to_us(min, max))
    }

    fn update_capture_extent(&mut self, ctx: &dyn CaptureContext) -> bool {
        let non_empty = self.tracks.iter().filter(|t| !t.is_empty());
        let mut min = non_empty.clone().filter_map(Track::min_time).min();
        let mut max = non_empty.filter_map(Track::max_time).max();

        if ctx.callstack_event_count() > 0 {
            min = min.into_iter().chain(ctx.callstack_min_time()).min();
            max = max.into_iter().chain(ctx.callstack_max_time()).max();
        }

        match (min, max) {
            (Some(min), Some(max)) => {
                // The maximum never moves backwards
                let max = self.extent.map_or(max, |(_, old_max)| old_max.max(max));
                self.set_extent(min, max.max(min));
                true
            }
            _ => false,
        }
    }

    /// Widen the extent with the callstack index; true if it changed
    fn include_callstacks(&mut self, ctx: &dyn CaptureContext) -> bool {
        let before = self.extent;
        if let (Some(lo), Some(hi)) = (ctx.callstack_min_time(), ctx.callstack_max_time()) {
            self.widen_extent(lo, hi);
        }
        before != self.extent
    }

    // -------------------------------------------------------------------------
    // Primitives
    // -------------------------------------------------------------------------

    fn build_batch(
        &self,
        ctx: &dyn CaptureContext,
        viewport: Viewport,
        picking: PickingMode,
        layout: &TrackLayout,
    ) -> RenderBatch {
        let mapping = TimeMapping::new(self.capture_min_tick(), self.window, viewport);
        let (min_tick, max_tick) = mapping.visible_ticks();
        let frame = FrameParams { mapping, min_tick, max_tick, layout, picking, selected: self.selected.as_ref() };

        let mut y = viewport.top_y();
        let mut tracks = Vec::with_capacity(self.draw_order.len());
        for id in &self.draw_order {
            let Some(track) = self.track(*id) else { continue };
            let primitives = track.update_primitives(*id, &frame, y);
            y += primitives.height + layout.space_between_tracks;
            tracks.push(primitives);
        }

        RenderBatch {
            tracks,
            overlay: self.overlay.annotations(ctx, &mapping, layout),
            total_height: y - viewport.top_y(),
            min_tick,
            max_tick,
        }
    }

    fn summary(&self, id: TrackId, layout: &TrackLayout) -> Option<TrackSummary> {
        let track = self.track(id)?;
        Some(TrackSummary {
            id,
            kind: track.kind(),
            name: track.name().to_string(),
            label: track.label().to_string(),
            event_count: track.event_count(),
            min_time: track.min_time(),
            max_time: track.max_time(),
            height: track.height(layout),
        })
    }
}

// =============================================================================
// ENGINE
// =============================================================================

/// Thread-safe timeline engine, shared as `Arc<TimeGraph>` between the
/// producer and the consumer
#[derive(Debug)]
pub struct TimeGraph {
    config: TimeGraphConfig,
    state: Mutex<GraphState>,
    needs_redraw: AtomicBool,
}

impl Default for TimeGraph {
    fn default() -> Self {
        Self::new(TimeGraphConfig::default())
    }
}

impl TimeGraph {
    /// Engine with the scheduler and process tracks already in place
    #[must_use]
    pub fn new(config: TimeGraphConfig) -> Self {
        let state = GraphState::new(config.block_capacity);
        Self { config, state: Mutex::new(state), needs_redraw: AtomicBool::new(true) }
    }

    #[must_use]
    pub fn config(&self) -> &TimeGraphConfig {
        &self.config
    }

    fn mark_dirty(&self) {
        self.needs_redraw.store(true, Ordering::Release);
    }

    /// Best-effort hint that the last batch is stale
    #[must_use]
    pub fn needs_redraw(&self) -> bool {
        self.needs_redraw.load(Ordering::Acquire)
    }

    pub fn request_redraw(&self) {
        self.mark_dirty();
    }

    // -------------------------------------------------------------------------
    // Ingestion and lifecycle
    // -------------------------------------------------------------------------

    /// Route one record to its track, creating the track on first use.
    ///
    /// `function` is the metadata of the instrumented function the record
    /// measured, if known.
    pub fn process_timer(&self, record: TimerInfo, function: Option<&FunctionInfo>) {
        self.state.lock().process_timer(record, function);
        self.mark_dirty();
    }

    /// Enter the static view: re-sorting is no longer throttled
    pub fn finish_capture(&self) {
        let mut state = self.state.lock();
        if state.capture_state == CaptureState::Capturing {
            info!("Capture finished: {} tracks, {} cores", state.tracks.len(), state.cores_seen.len());
        }
        state.capture_state = CaptureState::Idle;
        state.force_reorder = true;
        drop(state);
        self.mark_dirty();
    }

    #[must_use]
    pub fn capture_state(&self) -> CaptureState {
        self.state.lock().capture_state
    }

    /// Drop every track, extent, selection and marker.
    ///
    /// The scheduler and process tracks are recreated; the thread filter is
    /// kept.
    pub fn clear(&self) {
        let mut state = self.state.lock();
        let filter = std::mem::take(&mut state.thread_filter);
        *state = GraphState::new(self.config.block_capacity);
        state.thread_filter = filter;
        drop(state);
        info!("Timeline cleared");
        self.mark_dirty();
    }

    // -------------------------------------------------------------------------
    // Registry
    // -------------------------------------------------------------------------

    pub fn get_or_create_thread_track(&self, thread_id: ThreadId) -> TrackId {
        self.state.lock().get_or_create_thread(thread_id)
    }

    pub fn get_or_create_gpu_track(&self, timeline_id: TimelineId) -> TrackId {
        self.state.lock().get_or_create_gpu(timeline_id)
    }

    pub fn get_or_create_graph_track(&self, name: &str) -> TrackId {
        self.state.lock().get_or_create_graph(name)
    }

    pub fn get_or_create_async_track(&self, name: &str) -> TrackId {
        self.state.lock().get_or_create_async(name)
    }

    #[must_use]
    pub fn scheduler_track(&self) -> TrackId {
        self.state.lock().scheduler
    }

    #[must_use]
    pub fn process_track(&self) -> TrackId {
        self.state.lock().process
    }

    /// Existing track of `thread_id`, without creating one
    #[must_use]
    pub fn thread_track(&self, thread_id: ThreadId) -> Option<TrackId> {
        self.state.lock().thread_tracks.get(&thread_id).copied()
    }

    /// Run `f` on a track while holding the engine lock
    pub fn with_track<R>(&self, id: TrackId, f: impl FnOnce(&Track) -> R) -> Option<R> {
        self.state.lock().track(id).map(f)
    }

    #[must_use]
    pub fn track_count(&self) -> usize {
        self.state.lock().tracks.len()
    }

    #[must_use]
    pub fn track_summary(&self, id: TrackId) -> Option<TrackSummary> {
        self.state.lock().summary(id, &self.config.layout)
    }

    /// Every track in creation order
    #[must_use]
    pub fn track_summaries(&self) -> Vec<TrackSummary> {
        let state = self.state.lock();
        (0..state.tracks.len()).filter_map(|i| state.summary(TrackId(i), &self.config.layout)).collect()
    }

    /// Track handles in the order they are drawn, top first
    #[must_use]
    pub fn draw_order(&self) -> Vec<TrackId> {
        self.state.lock().draw_order.clone()
    }

    /// Events held by every track
    #[must_use]
    pub fn num_timers(&self) -> usize {
        self.state.lock().tracks.iter().map(Track::event_count).sum()
    }

    #[must_use]
    pub fn num_cores(&self) -> usize {
        self.state.lock().cores_seen.len()
    }

    #[must_use]
    pub fn cores_seen(&self) -> Vec<CoreId> {
        self.state.lock().cores_seen.iter().copied().collect()
    }

    // -------------------------------------------------------------------------
    // Extent
    // -------------------------------------------------------------------------

    /// `[capture_min_tick, capture_max_tick]`, `None` before any data
    #[must_use]
    pub fn capture_extent(&self) -> Option<(Tick, Tick)> {
        self.state.lock().extent
    }

    #[must_use]
    pub fn capture_min_tick(&self) -> Tick {
        self.state.lock().capture_min_tick()
    }

    #[must_use]
    pub fn capture_max_tick(&self) -> Tick {
        self.state.lock().extent.map_or(0, |(_, max)| max)
    }

    /// Duration of the capture in microseconds
    #[must_use]
    pub fn capture_span_us(&self) -> f64 {
        self.state.lock().capture_span_us()
    }

    /// Recompute the extent from the non-empty tracks and the callstack
    /// index; returns whether any data exists
    pub fn update_capture_extent(&self, ctx: &dyn CaptureContext) -> bool {
        self.state.lock().update_capture_extent(ctx)
    }

    // -------------------------------------------------------------------------
    // Primitives
    // -------------------------------------------------------------------------

    /// Recompute (or reuse) the drawable primitives for `viewport`.
    ///
    /// The cached batch is reused only when nothing changed since it was
    /// built; picking passes always rebuild.
    pub fn update_primitives(
        &self,
        ctx: &dyn CaptureContext,
        viewport: Viewport,
        picking: PickingMode,
    ) -> RenderBatch {
        let mut state = self.state.lock();
        let widened = state.include_callstacks(ctx);
        let reordered = state.sort_tracks(ctx, self.config.reorder_interval);
        let dirty = self.needs_redraw.swap(false, Ordering::AcqRel);

        if !(dirty || widened || reordered || picking.is_picking()) {
            if let Some(cached) = state.cached.as_ref() {
                if cached.viewport == viewport && cached.window == state.window {
                    return cached.batch.clone();
                }
            }
        }

        let batch = state.build_batch(ctx, viewport, picking, &self.config.layout);
        let window = state.window;
        state.cached = Some(CachedFrame { viewport, window, batch: batch.clone() });
        batch
    }

    /// Same as [`TimeGraph::update_primitives`]
    pub fn render(&self, ctx: &dyn CaptureContext, viewport: Viewport, picking: PickingMode) -> RenderBatch {
        self.update_primitives(ctx, viewport, picking)
    }
}
