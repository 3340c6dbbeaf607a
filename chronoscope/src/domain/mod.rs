//! Engine vocabulary: track and marker handles, ticks, colors, and the
//! error enums returned at the engine and capture boundaries.

pub mod errors;
pub mod types;

pub use types::{
    Color, CoreId, Duration, FunctionId, MarkerId, ThreadId, Tick, TimelineId, TrackId,
};

pub use errors::{CaptureError, ConfigError, ValueDecodeError, ViewportError};
