//! Jumping between timers and the selected timer

use chronoscope_common::{FunctionId, ThreadId, TimerInfo, TimerKind};
use log::debug;

use super::{GraphState, TimeGraph, Visibility};
use crate::domain::Tick;
use crate::timer_chain::Direction;
use crate::track::{Track, TrackNeighbor};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JumpDirection {
    Previous,
    Next,
    /// Enclosing call
    Top,
    /// First callee
    Down,
}

/// Which timers `Previous`/`Next` may land on; ignored by `Top`/`Down`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JumpScope {
    /// Neighbor in the same row of the same track
    SameDepth,
    /// Closest call of the same function on any thread
    SameFunction,
    /// Closest call of the same function on the same thread
    SameThreadSameFunction,
}

impl GraphState {
    /// Track that holds `record`, if any
    fn owning_track(&self, record: &TimerInfo) -> Option<&Track> {
        let id = match record.kind {
            TimerKind::FunctionSpan | TimerKind::Introspection => self.thread_tracks.get(&record.thread_id),
            TimerKind::CoreActivity => Some(&self.scheduler),
            TimerKind::GpuActivity => record.timeline_id.and_then(|t| self.gpu_tracks.get(&t)),
            TimerKind::AsyncSpan => record.series.as_deref().and_then(|s| self.async_tracks.get(s)),
            TimerKind::ValueSample => None,
        }?;
        self.track(*id)
    }

    /// Closest call of `function` ending strictly before/after `time`,
    /// searched over every thread track.
    ///
    /// Ties keep the first call found (tracks by thread id, then rows).
    fn find_function_call(
        &self,
        function: FunctionId,
        time: Tick,
        thread: Option<ThreadId>,
        direction: Direction,
    ) -> Option<&TimerInfo> {
        let matches =
            |r: &TimerInfo| r.function_id == Some(function) && thread.map_or(true, |tid| r.thread_id == tid);

        let mut best: Option<&TimerInfo> = None;
        let thread_tracks = self.thread_tracks.values().filter_map(|id| self.track(*id));
        for chain in thread_tracks.flat_map(Track::chains) {
            let candidate = match direction {
                Direction::Before => chain.nearest_before(matches, time),
                Direction::After => chain.nearest_after(matches, time),
            };
            let Some(candidate) = candidate else { continue };
            let closer = best.map_or(true, |b| match direction {
                Direction::Before => candidate.end > b.end,
                Direction::After => candidate.end < b.end,
            });
            if closer {
                best = Some(candidate);
            }
        }
        best
    }

    pub(crate) fn find_neighbor(
        &self,
        from: &TimerInfo,
        direction: JumpDirection,
        scope: JumpScope,
    ) -> Option<&TimerInfo> {
        let along_row = match direction {
            JumpDirection::Top => return self.owning_track(from)?.neighbor(from, TrackNeighbor::Up),
            JumpDirection::Down => return self.owning_track(from)?.neighbor(from, TrackNeighbor::Down),
            JumpDirection::Previous => (TrackNeighbor::Left, Direction::Before),
            JumpDirection::Next => (TrackNeighbor::Right, Direction::After),
        };
        let (neighbor, search) = along_row;

        match scope {
            JumpScope::SameDepth => self.owning_track(from)?.neighbor(from, neighbor),
            JumpScope::SameFunction => self.find_function_call(from.function_id?, from.end, None, search),
            JumpScope::SameThreadSameFunction => {
                self.find_function_call(from.function_id?, from.end, Some(from.thread_id), search)
            }
        }
    }

    fn select(&mut self, timer: TimerInfo, bias: f64) {
        self.ensure_visible(Visibility::PartlyVisible, timer.start, timer.end, bias);
        self.selected = Some(timer);
    }
}

impl TimeGraph {
    /// Neighbor of `from` without changing the selection or the window
    #[must_use]
    pub fn find_neighbor(&self, from: &TimerInfo, direction: JumpDirection, scope: JumpScope) -> Option<TimerInfo> {
        self.state.lock().find_neighbor(from, direction, scope).cloned()
    }

    /// Jump from `from` to its neighbor, select it and move it into view.
    ///
    /// Returns the new selection; `None` (and no change) when there is no
    /// neighbor or no track holds `from`.
    pub fn navigate(&self, from: &TimerInfo, direction: JumpDirection, scope: JumpScope) -> Option<TimerInfo> {
        let mut state = self.state.lock();
        let goal = state.find_neighbor(from, direction, scope).cloned()?;
        debug!("Jump {direction:?}/{scope:?} from {} to {}", from.start, goal.start);
        state.select(goal.clone(), self.config.move_into_view_bias);
        drop(state);
        self.mark_dirty();
        Some(goal)
    }

    /// Select `timer` and move it into view
    pub fn select_timer(&self, timer: &TimerInfo) {
        self.state.lock().select(timer.clone(), self.config.move_into_view_bias);
        self.mark_dirty();
    }

    /// Zoom onto `timer`, then select it
    pub fn select_and_zoom(&self, timer: &TimerInfo) {
        let mut state = self.state.lock();
        state.zoom_to_range(timer.start, timer.end);
        state.select(timer.clone(), self.config.move_into_view_bias);
        drop(state);
        self.mark_dirty();
    }

    pub fn clear_selected_timer(&self) {
        self.state.lock().selected = None;
        self.mark_dirty();
    }

    #[must_use]
    pub fn selected_timer(&self) -> Option<TimerInfo> {
        self.state.lock().selected.clone()
    }
}
