//! Visible window: zoom, pan and move-into-view
//!
//! The window is kept in microseconds relative to `capture_min_tick` and is
//! always clamped to `[0, capture_span]`.

use log::debug;

use super::{GraphState, TimeGraph};
use crate::capture::CaptureContext;
use crate::domain::Tick;
use crate::time_mapping::{tick_to_us, TimeWindow};

/// Smallest window width a zoom may produce (one nanosecond)
const MIN_WINDOW_US: f64 = 0.001;

/// Margin factor applied around a range by `zoom_to_range`
const ZOOM_MARGIN: f64 = 1.1;

/// How much of a range must be on screen to count as visible
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    FullyVisible,
    PartlyVisible,
}

impl GraphState {
    /// Set the window, keeping its width (up to the span) but never leaving
    /// `[0, span]`
    pub(crate) fn set_min_max(&mut self, min_us: f64, max_us: f64) {
        if !(min_us.is_finite() && max_us.is_finite()) {
            return;
        }
        let span = self.capture_span_us();
        let width = (max_us - min_us).max(0.0).min(span);
        let min = min_us.clamp(0.0, (span - width).max(0.0));
        self.window = TimeWindow::new(min, (min + width).min(span));
    }

    pub(crate) fn zoom_to_range(&mut self, lo: Tick, hi: Tick) {
        let capture_min = self.capture_min_tick();
        let start = tick_to_us(capture_min, lo);
        let end = tick_to_us(capture_min, hi);
        let mid = start + (end - start) / 2.0;
        let extent = ZOOM_MARGIN * (end - start) / 2.0;
        self.set_min_max(mid - extent, mid + extent);
    }

    pub(crate) fn is_visible(&self, visibility: Visibility, lo: Tick, hi: Tick) -> bool {
        let capture_min = self.capture_min_tick();
        let (start, end) = (tick_to_us(capture_min, lo), tick_to_us(capture_min, hi));
        match visibility {
            Visibility::FullyVisible => self.window.is_fully_visible(start, end),
            Visibility::PartlyVisible => self.window.is_partly_visible(start, end),
        }
    }

    /// Reframe so that `[lo, hi]` is visible.
    ///
    /// `bias` places the range's midpoint at that fraction of the window,
    /// measured from the right edge; it is mirrored when the range lies left
    /// of the window so the view moves the same way both directions.
    pub(crate) fn ensure_visible(&mut self, visibility: Visibility, lo: Tick, hi: Tick, bias: f64) {
        if self.is_visible(visibility, lo, hi) {
            return;
        }

        let capture_min = self.capture_min_tick();
        let start = tick_to_us(capture_min, lo);
        let end = tick_to_us(capture_min, hi);
        let window_us = self.window.width_us();

        if visibility == Visibility::FullyVisible && window_us < end - start {
            self.zoom_to_range(lo, hi);
            return;
        }

        let mid = start + (end - start) / 2.0;
        let mut distance = if start < self.window.min_us { 1.0 - bias } else { bias };
        if visibility == Visibility::FullyVisible && window_us > 0.0 {
            // Keep both ends inside the new window
            let half = (end - start) / (2.0 * window_us);
            distance = distance.clamp(half, 1.0 - half);
        }

        self.set_min_max(mid - window_us * (1.0 - distance), mid + window_us * distance);
    }
}

impl TimeGraph {
    #[must_use]
    pub fn window(&self) -> TimeWindow {
        self.state.lock().window
    }

    /// Set the window to `[min_us, max_us]`, clamped to the capture
    pub fn set_min_max(&self, min_us: f64, max_us: f64) {
        self.state.lock().set_min_max(min_us, max_us);
        self.mark_dirty();
    }

    /// Show the last `history_seconds` of the capture; no-op without data
    pub fn zoom_to_fit(&self, ctx: &dyn CaptureContext) {
        let mut state = self.state.lock();
        if !state.update_capture_extent(ctx) {
            return;
        }
        let max_us = state.capture_span_us();
        let min_us = (max_us - self.config.history_us()).max(0.0);
        state.window = TimeWindow::new(min_us, max_us);
        debug!("Zoomed to fit: [{min_us:.3}, {max_us:.3}] us");
        drop(state);
        self.mark_dirty();
    }

    /// Center on `[lo, hi]` with a 10% margin
    pub fn zoom_to_range(&self, lo: Tick, hi: Tick) {
        self.state.lock().zoom_to_range(lo, hi);
        self.mark_dirty();
    }

    /// Drag the window: the time under `initial_x` when the drag started
    /// (`initial_time_us`) follows the pointer to `current_x`
    pub fn pan(&self, initial_x: f32, current_x: f32, width: f32, initial_time_us: f64) {
        if !(width.is_finite() && width > 0.0) {
            return;
        }
        let mut state = self.state.lock();
        let window_us = state.window.width_us();
        let initial_local = f64::from(initial_x) / f64::from(width) * window_us;
        let dt = f64::from(current_x - initial_x) / f64::from(width) * window_us;
        let current = initial_time_us - dt;
        let upper = (state.capture_span_us() - window_us).max(0.0);
        let min_us = (current - initial_local).clamp(0.0, upper);
        state.window = TimeWindow::new(min_us, min_us + window_us);
        drop(state);
        self.mark_dirty();
    }

    /// Scale the window by `factor` around the time at `mouse_ratio`.
    ///
    /// Factors above one zoom out. Results narrower than one nanosecond are
    /// rejected.
    pub fn zoom_by_factor(&self, factor: f64, mouse_ratio: f64) {
        if !(factor.is_finite() && factor > 0.0) {
            return;
        }
        let mut state = self.state.lock();
        let window = state.window;
        let anchor = window.time_at_ratio(mouse_ratio.clamp(0.0, 1.0));
        let left = (anchor - window.min_us).max(0.0);
        let right = (window.max_us - anchor).max(0.0);
        let (min_us, max_us) = (anchor - factor * left, anchor + factor * right);
        if max_us - min_us < MIN_WINDOW_US {
            return;
        }
        state.set_min_max(min_us, max_us);
        drop(state);
        self.mark_dirty();
    }

    /// One mouse-wheel notch: positive `delta` zooms out, negative zooms in
    pub fn zoom_time(&self, delta: f32, mouse_ratio: f64) {
        let step = 1.0 + self.config.zoom_increment;
        let factor = if delta > 0.0 { step } else { 1.0 / step };
        self.zoom_by_factor(factor, mouse_ratio);
    }

    /// Scrollbar drag: place the window at `ratio` of the scrollable range
    pub fn drag_to_ratio(&self, ratio: f64) {
        let mut state = self.state.lock();
        let window_us = state.window.width_us();
        let min_us = ratio.clamp(0.0, 1.0) * (state.capture_span_us() - window_us).max(0.0);
        state.window = TimeWindow::new(min_us, min_us + window_us);
        drop(state);
        self.mark_dirty();
    }

    /// Reframe so `[lo, hi]` is visible; no-op if it already is
    pub fn ensure_visible(&self, visibility: Visibility, lo: Tick, hi: Tick, bias: f64) {
        self.state.lock().ensure_visible(visibility, lo, hi, bias);
        self.mark_dirty();
    }

    #[must_use]
    pub fn is_visible(&self, visibility: Visibility, lo: Tick, hi: Tick) -> bool {
        self.state.lock().is_visible(visibility, lo, hi)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::CaptureData;
    use crate::time_mapping::{TimeMapping, Viewport};
    use chronoscope_common::{ThreadId, TimerInfo};

    const SECOND: Tick = 1_000_000_000;

    fn viewport() -> Viewport {
        Viewport::new(0.0, 100.0, 0.0, 100.0).unwrap()
    }

    /// Engine holding a 10 s capture starting at tick 0
    fn ten_second_graph() -> TimeGraph {
        let graph = TimeGraph::default();
        graph.process_timer(TimerInfo::function_span(0, 10 * SECOND, ThreadId(1), 0), None);
        graph
    }

    #[test]
    fn test_zoom_to_fit_shows_history() {
        let graph = ten_second_graph();
        graph.zoom_to_fit(&CaptureData::new("game"));
        assert_eq!(graph.window(), TimeWindow::new(8_000_000.0, 10_000_000.0));
    }

    #[test]
    fn test_zoom_to_fit_clamps_short_capture() {
        let graph = TimeGraph::default();
        graph.process_timer(TimerInfo::function_span(0, SECOND / 2, ThreadId(1), 0), None);
        graph.zoom_to_fit(&CaptureData::new("game"));
        assert_eq!(graph.window(), TimeWindow::new(0.0, 500_000.0));
    }

    #[test]
    fn test_zoom_to_fit_without_data_is_noop() {
        let graph = TimeGraph::default();
        graph.set_min_max(0.0, 0.0);
        graph.zoom_to_fit(&CaptureData::new("game"));
        assert_eq!(graph.window(), TimeWindow::default());
    }

    #[test]
    fn test_set_min_max_clamps_to_capture() {
        let graph = ten_second_graph();
        graph.set_min_max(-50.0, 100.0);
        assert_eq!(graph.window(), TimeWindow::new(0.0, 150.0));
        graph.set_min_max(9_999_000.0, 10_002_000.0);
        assert_eq!(graph.window(), TimeWindow::new(9_997_000.0, 10_000_000.0));
    }

    #[test]
    fn test_window_stays_ordered_for_ranges_past_the_capture() {
        let graph = ten_second_graph();
        let in_bounds = |w: TimeWindow| 0.0 <= w.min_us && w.min_us <= w.max_us && w.max_us <= 10_000_000.0;

        graph.set_min_max(20_000_000.0, 21_000_000.0);
        assert_eq!(graph.window(), TimeWindow::new(9_000_000.0, 10_000_000.0));

        graph.set_min_max(-5_000_000.0, 30_000_000.0);
        assert_eq!(graph.window(), TimeWindow::new(0.0, 10_000_000.0));

        graph.set_min_max(3_000.0, 1_000.0);
        assert!(in_bounds(graph.window()));

        graph.zoom_to_range(20 * SECOND, 21 * SECOND);
        assert!(in_bounds(graph.window()));
        assert!((graph.window().width_us() - 1_100_000.0).abs() < 1e-6);

        graph.set_min_max(1_000.0, 2_000.0);
        graph.zoom_by_factor(4.0, 3.0);
        assert!(in_bounds(graph.window()));
        graph.zoom_by_factor(4.0, -2.0);
        assert!(in_bounds(graph.window()));
    }

    #[test]
    fn test_earlier_record_keeps_visible_ticks() {
        let graph = TimeGraph::default();
        graph.process_timer(TimerInfo::function_span(5 * SECOND, 10 * SECOND, ThreadId(1), 0), None);
        graph.set_min_max(1_000_000.0, 2_000_000.0);
        let before = TimeMapping::new(graph.capture_min_tick(), graph.window(), viewport()).visible_ticks();
        assert_eq!(before, (6 * SECOND, 7 * SECOND));

        graph.process_timer(TimerInfo::function_span(SECOND, 2 * SECOND, ThreadId(2), 0), None);
        assert_eq!(graph.capture_min_tick(), SECOND);
        assert_eq!(graph.window(), TimeWindow::new(5_000_000.0, 6_000_000.0));
        let after = TimeMapping::new(graph.capture_min_tick(), graph.window(), viewport()).visible_ticks();
        assert_eq!(after, before);

        // Recomputing the extent from the tracks leaves the view in place too
        graph.update_capture_extent(&CaptureData::new("game"));
        assert_eq!(graph.window(), TimeWindow::new(5_000_000.0, 6_000_000.0));
    }

    #[test]
    fn test_zoom_to_range_adds_margin() {
        let graph = ten_second_graph();
        graph.zoom_to_range(1_000_000, 2_000_000);
        let window = graph.window();
        assert!((window.min_us - 950.0).abs() < 1e-9);
        assert!((window.max_us - 2_050.0).abs() < 1e-9);
    }

    #[test]
    fn test_zoom_by_factor_anchors_on_mouse() {
        let graph = ten_second_graph();
        graph.set_min_max(1_000.0, 2_000.0);
        graph.zoom_by_factor(0.5, 0.5);
        assert_eq!(graph.window(), TimeWindow::new(1_250.0, 1_750.0));

        graph.zoom_time(1.0, 0.0);
        let window = graph.window();
        assert_eq!(window.min_us, 1_250.0);
        assert!((window.width_us() - 550.0).abs() < 1e-9);
    }

    #[test]
    fn test_zoom_rejects_sub_nanosecond_window() {
        let graph = ten_second_graph();
        graph.set_min_max(1_000.0, 1_000.0015);
        graph.zoom_by_factor(0.5, 0.5);
        assert_eq!(graph.window(), TimeWindow::new(1_000.0, 1_000.0015));
    }

    #[test]
    fn test_pan_follows_pointer_and_clamps() {
        let graph = ten_second_graph();
        graph.set_min_max(1_000.0, 2_000.0);
        // Grab the midpoint (1500 us) and drag it 10 of 100 units left
        graph.pan(50.0, 40.0, 100.0, 1_500.0);
        assert_eq!(graph.window(), TimeWindow::new(1_100.0, 2_100.0));

        graph.pan(0.0, 100.0, 100.0, 0.0);
        assert_eq!(graph.window().min_us, 0.0);
        graph.pan(0.0, -1.0e9, 100.0, 1.0e9);
        assert_eq!(graph.window().max_us, 10_000_000.0);
    }

    #[test]
    fn test_drag_to_ratio() {
        let graph = ten_second_graph();
        graph.set_min_max(0.0, 1_000_000.0);
        graph.drag_to_ratio(1.0);
        assert_eq!(graph.window(), TimeWindow::new(9_000_000.0, 10_000_000.0));
    }

    #[test]
    fn test_ensure_visible_is_noop_when_visible() {
        let graph = ten_second_graph();
        graph.set_min_max(1_000.0, 2_000.0);
        graph.ensure_visible(Visibility::FullyVisible, 1_200_000, 1_300_000, 0.3);
        assert_eq!(graph.window(), TimeWindow::new(1_000.0, 2_000.0));
    }

    #[test]
    fn test_ensure_visible_moving_right_uses_bias() {
        let graph = ten_second_graph();
        graph.set_min_max(1_000.0, 2_000.0);
        graph.ensure_visible(Visibility::PartlyVisible, 5_000_000, 5_000_000, 0.3);
        // midpoint ends up 30% from the right edge
        assert_eq!(graph.window(), TimeWindow::new(4_300.0, 5_300.0));
    }

    #[test]
    fn test_ensure_visible_mirrors_bias_moving_left() {
        let graph = ten_second_graph();
        graph.set_min_max(5_000.0, 6_000.0);
        graph.ensure_visible(Visibility::PartlyVisible, 2_000_000, 2_000_000, 0.3);
        assert_eq!(graph.window(), TimeWindow::new(1_700.0, 2_700.0));
    }

    #[test]
    fn test_ensure_visible_zooms_out_for_wide_range() {
        let graph = ten_second_graph();
        graph.set_min_max(0.0, 100.0);
        graph.ensure_visible(Visibility::FullyVisible, 1_000_000, 2_000_000, 0.3);
        assert!(graph.is_visible(Visibility::FullyVisible, 1_000_000, 2_000_000));
    }

    #[test]
    fn test_ensure_visible_fully_is_idempotent() {
        let graph = ten_second_graph();
        graph.set_min_max(0.0, 1_000.0);
        graph.ensure_visible(Visibility::FullyVisible, 3_000_000, 3_900_000, 0.3);
        let first = graph.window();
        assert!(graph.is_visible(Visibility::FullyVisible, 3_000_000, 3_900_000));
        graph.ensure_visible(Visibility::FullyVisible, 3_000_000, 3_900_000, 0.3);
        assert_eq!(graph.window(), first);
    }
}
