//! Range selection of sampled callstacks and the iterator overlay

use std::collections::BTreeMap;

use chronoscope_common::{CallstackEvent, ThreadId, TimerInfo};
use log::debug;

use super::{GraphState, TimeGraph};
use crate::capture::CaptureContext;
use crate::domain::MarkerId;
use crate::overlay::OverlayAnnotations;
use crate::time_mapping::{TimeMapping, Viewport};

impl GraphState {
    fn select_range(
        &mut self,
        ctx: &dyn CaptureContext,
        viewport: Viewport,
        world_lo: f32,
        world_hi: f32,
        thread_scope: ThreadId,
    ) -> Vec<CallstackEvent> {
        let (lo_x, hi_x) = if world_lo <= world_hi { (world_lo, world_hi) } else { (world_hi, world_lo) };
        let mapping = TimeMapping::new(self.capture_min_tick(), self.window, viewport);
        let lo = mapping.tick_from_world_x(lo_x);
        let hi = mapping.tick_from_world_x(hi_x);

        let events = if thread_scope.is_all_threads() {
            ctx.callstack_events_in_range(lo, hi)
        } else {
            ctx.callstack_events_of_thread_in_range(thread_scope, lo, hi)
        };

        let mut selection: BTreeMap<ThreadId, Vec<CallstackEvent>> = BTreeMap::new();
        for event in &events {
            selection.entry(event.thread_id).or_default().push(*event);
        }
        selection.insert(ThreadId::ALL_THREADS, events.clone());
        self.selection = selection;

        debug!("Selected {} callstack samples in [{lo}, {hi}]", events.len());
        events
    }
}

impl TimeGraph {
    /// Select the sampled callstacks between two world x coordinates.
    ///
    /// The bounds may be given in either order. `thread_scope` is a single
    /// thread, or [`ThreadId::ALL_THREADS`] for the whole process. Returns
    /// the selected events; the all-threads bucket receives every one of them.
    pub fn select_range(
        &self,
        ctx: &dyn CaptureContext,
        viewport: Viewport,
        world_lo: f32,
        world_hi: f32,
        thread_scope: ThreadId,
    ) -> Vec<CallstackEvent> {
        let events = self.state.lock().select_range(ctx, viewport, world_lo, world_hi, thread_scope);
        self.mark_dirty();
        events
    }

    /// Events of the last range selection that belong to `thread_id`
    #[must_use]
    pub fn selected_events(&self, thread_id: ThreadId) -> Vec<CallstackEvent> {
        self.state.lock().selection.get(&thread_id).cloned().unwrap_or_default()
    }

    // -------------------------------------------------------------------------
    // Iterator overlay
    // -------------------------------------------------------------------------

    /// Replace every iterator marker
    pub fn set_iterator_overlay(&self, iterators: BTreeMap<MarkerId, TimerInfo>) {
        self.state.lock().overlay.set(iterators);
        self.mark_dirty();
    }

    pub fn add_iterator(&self, timer: TimerInfo) -> MarkerId {
        let id = self.state.lock().overlay.add(timer);
        self.mark_dirty();
        id
    }

    pub fn remove_iterator(&self, id: MarkerId) -> Option<TimerInfo> {
        let removed = self.state.lock().overlay.remove(id);
        if removed.is_some() {
            self.mark_dirty();
        }
        removed
    }

    /// Markers ordered by start time
    #[must_use]
    pub fn iterators(&self) -> Vec<(MarkerId, TimerInfo)> {
        self.state.lock().overlay.ordered().into_iter().map(|(id, t)| (id, t.clone())).collect()
    }

    /// Marker lines and interval annotations for `viewport`; `None` without
    /// markers
    #[must_use]
    pub fn overlay_annotations(&self, ctx: &dyn CaptureContext, viewport: Viewport) -> Option<OverlayAnnotations> {
        let state = self.state.lock();
        let mapping = TimeMapping::new(state.capture_min_tick(), state.window, viewport);
        state.overlay.annotations(ctx, &mapping, &self.config.layout)
    }
}
