//! Track ordering and labels
//!
//! Draw order, top first:
//!
//! ```text
//!   Scheduler            (if it holds slices)
//!   GPU timelines        by timeline id
//!   Graph series         by name
//!   Async series         by name
//!   <process> (all threads)
//!   instrumented threads by timer count, descending
//!   sampled-only threads by callstack count, descending
//! ```
//!
//! Empty tracks are left out, and so are threads whose name matches none of
//! the space-separated words of the thread filter.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use chronoscope_common::ThreadId;
use log::debug;

use super::{CaptureState, GraphState, TimeGraph};
use crate::capture::CaptureContext;
use crate::domain::TrackId;
use crate::track::{gpu_timeline_label, TrackCommon};

/// Set name and label, returning whether either changed
fn set_text(common: &mut TrackCommon, name: String, label: String) -> bool {
    if common.name == name && common.label == label {
        return false;
    }
    common.name = name;
    common.label = label;
    true
}

fn matches_filter(filter: &str, name: &str) -> bool {
    let mut words = filter.split_whitespace().peekable();
    words.peek().is_none() || words.any(|word| name.contains(word))
}

impl GraphState {
    /// Pull thread and timeline names from the capture; true if a label
    /// changed
    fn refresh_labels(&mut self, ctx: &dyn CaptureContext) -> bool {
        let mut changed = false;

        let threads: Vec<(ThreadId, TrackId)> = self.thread_tracks.iter().map(|(t, id)| (*t, *id)).collect();
        for (thread_id, id) in threads {
            let (name, label) = if thread_id.is_all_threads() {
                let process = ctx.process_name().to_string();
                let label = format!("{process} (all threads)");
                (process, label)
            } else {
                match ctx.thread_name(thread_id) {
                    Some(name) => (name.to_string(), format!("{name} [{}]", thread_id.0)),
                    None => (thread_id.0.to_string(), thread_id.0.to_string()),
                }
            };
            if let Some(track) = self.track_mut(id) {
                changed |= set_text(track.common_mut(), name, label);
            }
        }

        let timelines: Vec<_> = self.gpu_tracks.iter().map(|(t, id)| (*t, *id)).collect();
        for (timeline_id, id) in timelines {
            let name = ctx.timeline_name(timeline_id).unwrap_or_default().to_string();
            let label = gpu_timeline_label(&name);
            if let Some(track) = self.track_mut(id) {
                changed |= set_text(track.common_mut(), name, label);
            }
        }

        changed
    }

    fn non_empty<'a>(&'a self, ids: impl Iterator<Item = TrackId> + 'a) -> impl Iterator<Item = TrackId> + 'a {
        ids.filter(|id| self.track(*id).is_some_and(|t| !t.is_empty()))
    }

    fn sorted_threads(&self, callstack_counts: &BTreeMap<ThreadId, usize>) -> Vec<TrackId> {
        let callstacks_of = |tid: &ThreadId| callstack_counts.get(tid).copied().unwrap_or(0);
        let timers_of = |tid: &ThreadId| self.thread_timer_counts.get(tid).copied().unwrap_or(0);

        let mut instrumented = Vec::new();
        let mut sampled = Vec::new();
        for (tid, id) in &self.thread_tracks {
            if tid.is_all_threads() {
                continue;
            }
            let Some(track) = self.track(*id) else { continue };
            if track.is_empty() && callstacks_of(tid) == 0 {
                continue;
            }
            if !matches_filter(&self.thread_filter, track.name()) {
                continue;
            }
            if timers_of(tid) > 0 {
                instrumented.push((*tid, *id));
            } else {
                sampled.push((*tid, *id));
            }
        }

        // Stable sorts over tid-ordered input: ties stay by ascending tid
        instrumented.sort_by_key(|(tid, _)| std::cmp::Reverse(timers_of(tid)));
        sampled.sort_by_key(|(tid, _)| std::cmp::Reverse(callstacks_of(tid)));
        instrumented.into_iter().chain(sampled).map(|(_, id)| id).collect()
    }

    fn compute_draw_order(&self, ctx: &dyn CaptureContext, callstack_counts: &BTreeMap<ThreadId, usize>) -> Vec<TrackId> {
        let mut order: Vec<TrackId> = self.non_empty(std::iter::once(self.scheduler)).collect();
        order.extend(self.non_empty(self.gpu_tracks.values().copied()));
        order.extend(self.non_empty(self.graph_tracks.values().copied()));
        order.extend(self.non_empty(self.async_tracks.values().copied()));

        let process_has_data =
            self.track(self.process).is_some_and(|t| !t.is_empty()) || ctx.callstack_event_count() > 0;
        if process_has_data {
            order.push(self.process);
        }

        order.extend(self.sorted_threads(callstack_counts));
        order
    }

    /// Refresh labels and, unless throttled, recompute the draw order.
    ///
    /// While capturing, the order is recomputed at most once per `interval`.
    /// Returns whether the draw order or any label changed.
    pub(crate) fn sort_tracks(&mut self, ctx: &dyn CaptureContext, interval: Duration) -> bool {
        let callstack_counts = ctx.callstack_counts_per_thread();
        for thread_id in callstack_counts.keys() {
            self.get_or_create_thread(*thread_id);
        }
        let labels_changed = self.refresh_labels(ctx);

        let throttled = self.capture_state == CaptureState::Capturing
            && !self.force_reorder
            && self.last_reorder.is_some_and(|at| at.elapsed() < interval);
        if throttled {
            return labels_changed;
        }

        let order = self.compute_draw_order(ctx, &callstack_counts);
        self.last_reorder = Some(Instant::now());
        self.force_reorder = false;

        let order_changed = order != self.draw_order;
        if order_changed {
            debug!("Re-sorted tracks: {} of {} drawn", order.len(), self.tracks.len());
            self.draw_order = order;
        }
        order_changed || labels_changed
    }
}

impl TimeGraph {
    /// Recompute the draw order now (subject to the capture throttle).
    ///
    /// Returns whether the order or any label changed.
    pub fn sort_tracks(&self, ctx: &dyn CaptureContext) -> bool {
        let changed = self.state.lock().sort_tracks(ctx, self.config.reorder_interval);
        if changed {
            self.mark_dirty();
        }
        changed
    }

    /// Show only threads whose name contains one of the space-separated
    /// words of `filter`; an empty filter shows every thread.
    ///
    /// Takes effect on the next re-sort.
    pub fn set_thread_filter(&self, filter: &str) {
        self.state.lock().thread_filter = filter.to_string();
        self.mark_dirty();
    }

    #[must_use]
    pub fn thread_filter(&self) -> String {
        self.state.lock().thread_filter.clone()
    }
}
