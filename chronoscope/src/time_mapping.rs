//! # Time Mapping
//!
//! Conversions between the three coordinate systems of the timeline:
//!
//! ```text
//!  ticks (ns, absolute)  ──tick_to_us──▶  µs since capture start  ──▶  world x
//!        ▲                                   │   (visible window)         │
//!        └──────────────us_to_tick───────────┘◀──────tick_from_world_x────┘
//! ```
//!
//! The visible window lives in microseconds so zoom arithmetic stays in a
//! comfortable floating range; ticks stay integral so records are addressed
//! exactly. Everything in here is pure: the result depends only on
//! `(capture_min_tick, window, viewport)`.

// Ticks are u64, microseconds and world units are floats
#![allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]

use crate::domain::{Tick, ViewportError};

/// Microseconds between `capture_min_tick` and `tick` (negative if before)
#[must_use]
pub fn tick_to_us(capture_min_tick: Tick, tick: Tick) -> f64 {
    (i128::from(tick) - i128::from(capture_min_tick)) as f64 / 1_000.0
}

/// Tick that lies `us` microseconds after `capture_min_tick`.
///
/// Rounds to the nearest nanosecond and saturates to the `u64` range, so
/// `us_to_tick(m, tick_to_us(m, t)) == t` for every tick a capture produces.
#[must_use]
pub fn us_to_tick(capture_min_tick: Tick, us: f64) -> Tick {
    let nanos = (us * 1_000.0).round() as i128;
    (i128::from(capture_min_tick) + nanos).clamp(0, i128::from(u64::MAX)) as u64
}

// =============================================================================
// VIEWPORT
// =============================================================================

/// World-space rectangle the timeline is drawn into.
///
/// `top_y` is the upper edge; tracks grow downwards from it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    start_x: f32,
    width: f32,
    top_y: f32,
    height: f32,
}

impl Viewport {
    /// Build a viewport, rejecting degenerate geometry
    pub fn new(start_x: f32, width: f32, top_y: f32, height: f32) -> Result<Self, ViewportError> {
        if !(width.is_finite() && width > 0.0) {
            return Err(ViewportError::InvalidWidth(width));
        }
        if !(height.is_finite() && height >= 0.0) {
            return Err(ViewportError::InvalidHeight(height));
        }
        Ok(Self { start_x, width, top_y, height })
    }

    /// Viewport measured in character cells, origin at the top-left
    pub fn cells(columns: u16, rows: u16) -> Result<Self, ViewportError> {
        Self::new(0.0, f32::from(columns), 0.0, f32::from(rows))
    }

    #[must_use]
    pub fn start_x(&self) -> f32 {
        self.start_x
    }

    #[must_use]
    pub fn width(&self) -> f32 {
        self.width
    }

    #[must_use]
    pub fn top_y(&self) -> f32 {
        self.top_y
    }

    #[must_use]
    pub fn height(&self) -> f32 {
        self.height
    }
}

// =============================================================================
// VISIBLE WINDOW
// =============================================================================

/// The `[min_us, max_us]` range mapped onto the viewport
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TimeWindow {
    pub min_us: f64,
    pub max_us: f64,
}

impl TimeWindow {
    #[must_use]
    pub fn new(min_us: f64, max_us: f64) -> Self {
        Self { min_us, max_us }
    }

    #[must_use]
    pub fn width_us(&self) -> f64 {
        self.max_us - self.min_us
    }

    /// Absolute time at `ratio` of the window (0 = left edge, 1 = right edge)
    #[must_use]
    pub fn time_at_ratio(&self, ratio: f64) -> f64 {
        self.min_us + ratio * self.width_us()
    }

    /// `[lo, hi]` (µs) lies strictly within the window bounds, edges included
    #[must_use]
    pub fn is_fully_visible(&self, lo_us: f64, hi_us: f64) -> bool {
        lo_us >= self.min_us && hi_us <= self.max_us
    }

    /// `[lo, hi]` (µs) intersects the window
    #[must_use]
    pub fn is_partly_visible(&self, lo_us: f64, hi_us: f64) -> bool {
        !(self.min_us > hi_us || self.max_us < lo_us)
    }
}

// =============================================================================
// TICK ↔ WORLD MAPPING
// =============================================================================

/// Snapshot of everything needed to place ticks on screen
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeMapping {
    pub capture_min_tick: Tick,
    pub window: TimeWindow,
    pub viewport: Viewport,
}

impl TimeMapping {
    #[must_use]
    pub fn new(capture_min_tick: Tick, window: TimeWindow, viewport: Viewport) -> Self {
        Self { capture_min_tick, window, viewport }
    }

    /// Microseconds from the left edge of the window to `tick`
    #[must_use]
    pub fn us_from_tick(&self, tick: Tick) -> f64 {
        tick_to_us(self.capture_min_tick, tick) - self.window.min_us
    }

    /// World x of `tick`; `0.0` when the window has no width
    #[must_use]
    pub fn world_x_from_tick(&self, tick: Tick) -> f32 {
        let window_us = self.window.width_us();
        if window_us <= 0.0 {
            return 0.0;
        }
        let normalized = self.us_from_tick(tick) / window_us;
        (f64::from(self.viewport.start_x) + normalized * f64::from(self.viewport.width)) as f32
    }

    /// Tick under world coordinate `x`
    #[must_use]
    pub fn tick_from_world_x(&self, x: f32) -> Tick {
        let ratio = f64::from(x - self.viewport.start_x) / f64::from(self.viewport.width);
        us_to_tick(self.capture_min_tick, self.window.time_at_ratio(ratio))
    }

    /// Number of ticks covered by one world unit (at least one)
    #[must_use]
    pub fn ticks_per_world_unit(&self) -> u64 {
        let ticks = self.window.width_us() * 1_000.0 / f64::from(self.viewport.width);
        (ticks.ceil() as u64).max(1)
    }

    /// Tick range of the visible window
    #[must_use]
    pub fn visible_ticks(&self) -> (Tick, Tick) {
        (
            us_to_tick(self.capture_min_tick, self.window.min_us),
            us_to_tick(self.capture_min_tick, self.window.max_us),
        )
    }
}
