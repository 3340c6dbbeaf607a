//! Drawable primitives produced for the rendering collaborator
//!
//! The engine never rasterizes anything. Each frame it hands out a
//! [`RenderBatch`]: tracks stacked top-down, each with world-space shapes,
//! plus the iterator overlay. A terminal, GPU or test renderer consumes the
//! same batch.

use chronoscope_common::{ThreadId, TimerInfo};

use crate::config::TrackLayout;
use crate::domain::{Color, Duration, Tick, TrackId};
use crate::overlay::OverlayAnnotations;
use crate::time_mapping::TimeMapping;

/// Whether the frame is drawn for display or for hit-testing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PickingMode {
    #[default]
    None,
    Hover,
    Click,
}

impl PickingMode {
    #[must_use]
    pub fn is_picking(self) -> bool {
        self != PickingMode::None
    }
}

/// Family a track belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackKind {
    Scheduler,
    Thread,
    Gpu,
    Graph,
    Async,
}

// =============================================================================
// SHAPES
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    /// A span at least one world unit wide
    Span { x0: f32, x1: f32, y: f32, height: f32, color: Color, timer: TimerInfo },
    /// One or more spans collapsed into a single world-unit column
    Tick { x: f32, y: f32, height: f32, color: Color, timer: TimerInfo },
    /// Value series, one point per sample
    Polyline { points: Vec<(f32, f32)>, color: Color },
}

impl Shape {
    /// Timer under this shape, for hit-testing
    #[must_use]
    pub fn timer(&self) -> Option<&TimerInfo> {
        match self {
            Shape::Span { timer, .. } | Shape::Tick { timer, .. } => Some(timer),
            Shape::Polyline { .. } => None,
        }
    }
}

/// Shapes of one track, already positioned
#[derive(Debug, Clone, PartialEq)]
pub struct TrackPrimitives {
    pub track: TrackId,
    pub kind: TrackKind,
    pub label: String,
    pub color: Color,
    /// Upper edge of the track in world space
    pub y: f32,
    pub height: f32,
    pub shapes: Vec<Shape>,
}

/// Everything the rendering collaborator needs for one frame
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RenderBatch {
    pub tracks: Vec<TrackPrimitives>,
    pub overlay: Option<OverlayAnnotations>,
    /// Sum of track heights and spacing
    pub total_height: f32,
    pub min_tick: Tick,
    pub max_tick: Tick,
}

impl RenderBatch {
    /// Topmost timer whose shape covers world point `(x, y)`
    #[must_use]
    pub fn pick(&self, x: f32, y: f32) -> Option<&TimerInfo> {
        self.tracks
            .iter()
            .filter(|t| y >= t.y && y < t.y + t.height)
            .flat_map(|t| t.shapes.iter())
            .find(|shape| match shape {
                Shape::Span { x0, x1, y: sy, height, .. } => {
                    x >= *x0 && x <= *x1 && y >= *sy && y < sy + height
                }
                Shape::Tick { x: sx, y: sy, height, .. } => {
                    (x - sx).abs() <= 0.5 && y >= *sy && y < sy + height
                }
                Shape::Polyline { .. } => false,
            })
            .and_then(Shape::timer)
    }
}

// =============================================================================
// FRAME PARAMETERS
// =============================================================================

/// Inputs shared by every track while primitives are rebuilt
#[derive(Debug, Clone, Copy)]
pub struct FrameParams<'a> {
    pub mapping: TimeMapping,
    pub min_tick: Tick,
    pub max_tick: Tick,
    pub layout: &'a TrackLayout,
    pub picking: PickingMode,
    pub selected: Option<&'a TimerInfo>,
}

impl FrameParams<'_> {
    #[must_use]
    pub fn is_selected(&self, timer: &TimerInfo) -> bool {
        self.selected.is_some_and(|s| s == timer)
    }
}

/// Emit span/tick shapes for the records of one row.
///
/// Records narrower than one world unit collapse: after a tick is emitted,
/// following records starting inside the same column are skipped. This only
/// holds while the row is time-ordered, so out-of-order rows emit every tick.
pub(crate) fn push_row_shapes<'r, I, F>(
    records: I,
    time_ordered: bool,
    frame: &FrameParams<'_>,
    y: f32,
    height: f32,
    mut color_of: F,
    out: &mut Vec<Shape>,
) where
    I: Iterator<Item = &'r TimerInfo>,
    F: FnMut(&TimerInfo) -> Color,
{
    let ticks_per_unit = frame.mapping.ticks_per_world_unit();
    let mut next_column_tick: Tick = 0;

    for record in records {
        let x0 = frame.mapping.world_x_from_tick(record.start);
        let x1 = frame.mapping.world_x_from_tick(record.end);
        let color = if frame.is_selected(record) { SELECTION_COLOR } else { color_of(record) };

        if x1 - x0 >= 1.0 {
            out.push(Shape::Span { x0, x1, y, height, color, timer: record.clone() });
        } else if !time_ordered || record.start >= next_column_tick {
            out.push(Shape::Tick { x: x0, y, height, color, timer: record.clone() });
            next_column_tick = record.start.saturating_add(ticks_per_unit);
        }
    }
}

// =============================================================================
// COLORS
// =============================================================================

/// Highlight applied to the selected timer
pub const SELECTION_COLOR: Color = Color::rgb(0, 128, 255);

/// Track color for introspection timers
pub const INTROSPECTION_GREEN: Color = Color::rgb(87, 166, 74);

const PALETTE: [Color; 6] = [
    Color::rgb(231, 68, 53),   // red
    Color::rgb(43, 145, 175),  // blue
    Color::rgb(185, 117, 181), // purple
    Color::rgb(87, 166, 74),   // green
    Color::rgb(215, 171, 105), // beige
    Color::rgb(248, 101, 22),  // orange
];

/// Palette color for a numeric id
#[must_use]
pub fn color_for_id(id: u64) -> Color {
    // Modulo of the palette length always fits in usize
    #[allow(clippy::cast_possible_truncation)]
    PALETTE[(id % PALETTE.len() as u64) as usize]
}

/// Palette color of a thread; negative ids wrap like the agent reports them
#[must_use]
pub fn thread_color(thread_id: ThreadId) -> Color {
    #[allow(clippy::cast_sign_loss)]
    color_for_id(u64::from(thread_id.0 as u32))
}

/// Palette color for a name, stable across runs (FNV-1a)
#[must_use]
pub fn color_for_name(name: &str) -> Color {
    let hash = name.bytes().fold(0xcbf2_9ce4_8422_2325_u64, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(0x0100_0000_01b3)
    });
    color_for_id(hash)
}

/// Pretty elapsed time between two ticks
#[must_use]
pub fn elapsed_label(from: Tick, to: Tick) -> String {
    Duration::between(from, to).to_string()
}
