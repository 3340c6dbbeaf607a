//! Newtypes shared across the engine
//!
//! These newtype wrappers keep track handles, iterator markers and tick
//! durations from being mixed up with the raw integers they wrap.

use std::fmt;

pub use chronoscope_common::{CoreId, FunctionId, ThreadId, TimelineId};

/// Absolute timestamp in nanoseconds, capture-relative
pub type Tick = u64;

/// Stable handle of a track inside the engine's arena.
///
/// Handles are never reused while a capture session lives; `clear()` starts
/// a fresh arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TrackId(pub usize);

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Track#{}", self.0)
    }
}

/// Identity of one iterator placed on the overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MarkerId(pub u64);

/// RGBA color handed to the drawing collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    #[must_use]
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::rgba(r, g, b, 255)
    }
}

/// Duration in nanoseconds (ticks)
///
/// Display picks the unit that keeps the number readable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Duration(pub u64);

impl Duration {
    /// Elapsed time between two ticks, saturating at zero
    #[must_use]
    pub fn between(from: Tick, to: Tick) -> Self {
        Self(to.saturating_sub(from))
    }

    /// Convert to microseconds (f64)
    #[must_use]
    pub fn as_micros(self) -> f64 {
        self.0 as f64 / 1_000.0
    }

    /// Convert to milliseconds (f64)
    #[must_use]
    pub fn as_millis(self) -> f64 {
        self.0 as f64 / 1_000_000.0
    }

    /// Convert to seconds (f64)
    #[must_use]
    pub fn as_seconds(self) -> f64 {
        self.0 as f64 / 1_000_000_000.0
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 < 1_000 {
            write!(f, "{}ns", self.0)
        } else if self.0 < 1_000_000 {
            write!(f, "{:.3}us", self.as_micros())
        } else if self.0 < 1_000_000_000 {
            write!(f, "{:.3}ms", self.as_millis())
        } else {
            write!(f, "{:.3}s", self.as_seconds())
        }
    }
}
