//! Iterator overlay
//!
//! Marked timers ("iterators") are drawn as vertical lines with interval
//! annotations between neighbors:
//!
//! ```text
//!   |<-- A to B  1.200ms -->|<-- B to C  0.800ms -->|
//!   |<--------------- Total  2.000ms -------------->|
//!   A                       B                       C
//! ```
//!
//! Annotations are measured start-to-start. The text rows share the lower
//! half of the viewport.

use std::collections::BTreeMap;

use chronoscope_common::TimerInfo;

use crate::capture::CaptureContext;
use crate::config::TrackLayout;
use crate::domain::{Color, Duration, MarkerId};
use crate::render::thread_color;
use crate::time_mapping::TimeMapping;

const ANNOTATION_COLORS: [Color; 2] = [Color::rgba(177, 203, 250, 60), Color::rgba(81, 102, 157, 60)];
const TOTAL_COLOR: Color = Color::rgba(0, 0, 0, 0);

/// Vertical line at one marked timer
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayMarker {
    pub marker: MarkerId,
    pub x: f32,
    pub color: Color,
}

/// Interval box between two markers
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayAnnotation {
    pub x_start: f32,
    pub x_end: f32,
    pub label: String,
    pub elapsed: Duration,
    pub text_y: f32,
    pub color: Color,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct OverlayAnnotations {
    pub markers: Vec<OverlayMarker>,
    pub annotations: Vec<OverlayAnnotation>,
}

/// Marked timers keyed by marker id
#[derive(Debug, Default)]
pub struct IteratorOverlay {
    iterators: BTreeMap<MarkerId, TimerInfo>,
    next_id: u64,
}

impl IteratorOverlay {
    /// Replace every marker
    pub fn set(&mut self, iterators: BTreeMap<MarkerId, TimerInfo>) {
        self.next_id = iterators.keys().next_back().map_or(0, |id| id.0 + 1).max(self.next_id);
        self.iterators = iterators;
    }

    /// Mark a timer, returning its new marker id
    pub fn add(&mut self, timer: TimerInfo) -> MarkerId {
        let id = MarkerId(self.next_id);
        self.next_id += 1;
        self.iterators.insert(id, timer);
        id
    }

    pub fn remove(&mut self, id: MarkerId) -> Option<TimerInfo> {
        self.iterators.remove(&id)
    }

    pub fn clear(&mut self) {
        self.iterators.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.iterators.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.iterators.is_empty()
    }

    /// Markers ordered by start time, ties by marker id
    #[must_use]
    pub fn ordered(&self) -> Vec<(MarkerId, &TimerInfo)> {
        let mut ordered: Vec<(MarkerId, &TimerInfo)> = self.iterators.iter().map(|(id, t)| (*id, t)).collect();
        ordered.sort_by_key(|(id, t)| (t.start, *id));
        ordered
    }

    /// Lines and interval boxes for the current mapping; `None` when empty
    #[must_use]
    pub fn annotations(
        &self,
        ctx: &dyn CaptureContext,
        mapping: &TimeMapping,
        layout: &TrackLayout,
    ) -> Option<OverlayAnnotations> {
        if self.iterators.is_empty() {
            return None;
        }
        let ordered = self.ordered();
        let markers = ordered
            .iter()
            .map(|(id, timer)| OverlayMarker {
                marker: *id,
                x: mapping.world_x_from_tick(timer.start),
                color: thread_color(timer.thread_id),
            })
            .collect();

        // One marker has no interval to annotate
        if ordered.len() < 2 {
            return Some(OverlayAnnotations { markers, annotations: Vec::new() });
        }

        let viewport = mapping.viewport;
        let half_height = viewport.height() / 2.0;
        #[allow(clippy::cast_precision_loss)]
        let height_per_text = (half_height - layout.track_bottom_margin) / (ordered.len() - 1) as f32;
        let text_y = |row: usize| {
            #[allow(clippy::cast_precision_loss)]
            let offset = row as f32 * height_per_text;
            viewport.top_y() + half_height + offset
        };
        let name_of = |timer: &TimerInfo| {
            timer
                .function_id
                .and_then(|f| ctx.function_name(f))
                .map_or_else(|| "?".to_string(), str::to_string)
        };

        let mut annotations: Vec<OverlayAnnotation> = ordered
            .windows(2)
            .enumerate()
            .map(|(row, pair)| {
                let (from, to) = (pair[0].1, pair[1].1);
                OverlayAnnotation {
                    x_start: mapping.world_x_from_tick(from.start),
                    x_end: mapping.world_x_from_tick(to.start),
                    label: format!("{} to {}", name_of(from), name_of(to)),
                    elapsed: Duration::between(from.start, to.start),
                    text_y: text_y(row),
                    color: ANNOTATION_COLORS[row % ANNOTATION_COLORS.len()],
                }
            })
            .collect();

        if ordered.len() >= 3 {
            let (first, last) = (ordered[0].1, ordered[ordered.len() - 1].1);
            annotations.push(OverlayAnnotation {
                x_start: mapping.world_x_from_tick(first.start),
                x_end: mapping.world_x_from_tick(last.start),
                label: "Total".to_string(),
                elapsed: Duration::between(first.start, last.start),
                text_y: text_y(ordered.len() - 1),
                color: TOTAL_COLOR,
            });
        }

        Some(OverlayAnnotations { markers, annotations })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::CaptureData;
    use crate::time_mapping::{TimeWindow, Viewport};
    use chronoscope_common::{FunctionId, FunctionInfo, FunctionRole, ThreadId};

    fn context() -> CaptureData {
        let mut data = CaptureData::new("game");
        for (id, name) in [(1, "update"), (2, "render"), (3, "present")] {
            data.add_function(FunctionInfo { id: FunctionId(id), name: name.to_string(), role: FunctionRole::Regular });
        }
        data
    }

    fn mapping() -> TimeMapping {
        TimeMapping::new(0, TimeWindow::new(0.0, 100.0), Viewport::new(0.0, 100.0, 0.0, 110.0).unwrap())
    }

    fn marked(start: u64, function: u64) -> TimerInfo {
        TimerInfo::function_span(start, start + 500, ThreadId(1), 0).with_function(FunctionId(function))
    }

    #[test]
    fn test_single_marker_has_no_annotation() {
        let mut overlay = IteratorOverlay::default();
        overlay.add(marked(10_000, 1));
        let out = overlay.annotations(&context(), &mapping(), &TrackLayout::default()).unwrap();
        assert_eq!(out.markers.len(), 1);
        assert!(out.annotations.is_empty());
    }

    #[test]
    fn test_pairs_and_total_ordered_by_start() {
        let mut overlay = IteratorOverlay::default();
        overlay.add(marked(60_000, 3));
        overlay.add(marked(10_000, 1));
        overlay.add(marked(30_000, 2));
        let out = overlay.annotations(&context(), &mapping(), &TrackLayout::default()).unwrap();

        let labels: Vec<&str> = out.annotations.iter().map(|a| a.label.as_str()).collect();
        assert_eq!(labels, vec!["update to render", "render to present", "Total"]);
        assert_eq!(out.annotations[0].elapsed, Duration(20_000));
        assert_eq!(out.annotations[2].elapsed, Duration(50_000));
        assert_eq!(out.annotations[2].color, TOTAL_COLOR);
        assert_ne!(out.annotations[0].color, out.annotations[1].color);
        assert_eq!(out.annotations[0].x_start, 10.0);
        assert_eq!(out.annotations[0].x_end, 30.0);
    }

    #[test]
    fn test_text_rows_fill_lower_half() {
        let mut overlay = IteratorOverlay::default();
        for (start, f) in [(10_000, 1), (30_000, 2), (60_000, 3)] {
            overlay.add(marked(start, f));
        }
        let layout = TrackLayout::default();
        let out = overlay.annotations(&context(), &mapping(), &layout).unwrap();
        // (55 - 5) / 2 rows apart, starting at mid-height
        let rows: Vec<f32> = out.annotations.iter().map(|a| a.text_y).collect();
        assert_eq!(rows, vec![55.0, 80.0, 105.0]);
    }

    #[test]
    fn test_remove_and_unknown_function() {
        let mut overlay = IteratorOverlay::default();
        let a = overlay.add(marked(10_000, 1));
        overlay.add(marked(30_000, 99));
        let out = overlay.annotations(&context(), &mapping(), &TrackLayout::default()).unwrap();
        assert_eq!(out.annotations[0].label, "update to ?");

        assert!(overlay.remove(a).is_some());
        assert!(overlay.remove(a).is_none());
        assert_eq!(overlay.len(), 1);
    }
}
