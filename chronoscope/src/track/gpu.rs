use chronoscope_common::{TimelineId, TimerInfo};

use super::{DepthChains, TrackCommon, TrackNeighbor};
use crate::config::TrackLayout;
use crate::render::{color_for_id, color_for_name, FrameParams, Shape};

/// Work executed on one GPU timeline (hardware queue)
#[derive(Debug)]
pub struct GpuTrack {
    pub(crate) common: TrackCommon,
    timeline_id: TimelineId,
    rows: DepthChains,
}

/// Display label for a GPU timeline name.
///
/// Driver queues follow the `gfx`, `comp_<n>.<m>.<k>`, `sdma<n>` naming;
/// anything else is shown verbatim.
#[must_use]
pub fn gpu_timeline_label(timeline: &str) -> String {
    if timeline.is_empty() {
        return "GPU".to_string();
    }
    if timeline.starts_with("gfx") {
        return format!("Graphics queue ({timeline})");
    }
    if timeline.starts_with("comp") {
        return format!("Compute queue ({timeline})");
    }
    if timeline.starts_with("sdma") {
        return format!("DMA queue ({timeline})");
    }
    timeline.to_string()
}

impl GpuTrack {
    #[must_use]
    pub fn new(timeline_id: TimelineId, timeline_name: &str, block_capacity: usize) -> Self {
        let color = if timeline_name.is_empty() {
            color_for_id(timeline_id.0)
        } else {
            color_for_name(timeline_name)
        };
        let mut common = TrackCommon::new(timeline_name, color);
        common.label = gpu_timeline_label(timeline_name);
        Self { common, timeline_id, rows: DepthChains::new(block_capacity) }
    }

    #[must_use]
    pub fn timeline_id(&self) -> TimelineId {
        self.timeline_id
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
        let color = self.common.color;
        self.rows.push_shapes(frame, top, frame.layout.text_box_height, |_| color, out);
    }

    pub(crate) fn neighbor(&self, from: &TimerInfo, direction: TrackNeighbor) -> Option<&TimerInfo> {
        match direction {
            TrackNeighbor::Left => self.rows.left(from),
            TrackNeighbor::Right => self.rows.right(from),
            TrackNeighbor::Up => self.rows.up(from),
            TrackNeighbor::Down => self.rows.down(from),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chronoscope_common::ThreadId;

    #[test]
    fn test_timeline_labels() {
        assert_eq!(gpu_timeline_label("gfx"), "Graphics queue (gfx)");
        assert_eq!(gpu_timeline_label("comp_1.3.0"), "Compute queue (comp_1.3.0)");
        assert_eq!(gpu_timeline_label("sdma0"), "DMA queue (sdma0)");
        assert_eq!(gpu_timeline_label("video"), "video");
        assert_eq!(gpu_timeline_label(""), "GPU");
    }

    #[test]
    fn test_gpu_track_navigates_like_thread_track() {
        let mut track = GpuTrack::new(TimelineId(9), "gfx", 4);
        let first = TimerInfo::gpu_activity(0, 10, ThreadId(1), TimelineId(9), 0);
        let second = TimerInfo::gpu_activity(20, 30, ThreadId(1), TimelineId(9), 0);
        track.on_timer(first.clone());
        track.on_timer(second.clone());

        assert_eq!(track.common.label, "Graphics queue (gfx)");
        assert_eq!(track.neighbor(&first, TrackNeighbor::Right), Some(&second));
        assert_eq!(track.neighbor(&second, TrackNeighbor::Left), Some(&first));
    }
}
