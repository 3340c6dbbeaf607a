//! # Shared Record Types (Delivery ↔ Timeline Engine)
//!
//! Defines the decoded event records exchanged between the capture-delivery
//! side (whatever turns a live agent stream or a recorded file into records)
//! and the timeline engine. Nothing in here knows about tracks, windows or
//! rendering.
//!
//! ## Key Types
//!
//! - [`TimerInfo`] - One timed event (span or sample), immutable once built
//! - [`TimerKind`] - Which track family a record is routed to
//! - [`EncodedValue`] - Raw payload of a value-tracking sample
//! - [`CallstackEvent`] - One sampled callstack, consumed by range selection
//! - [`FunctionInfo`] - Instrumented function metadata
//!
//! Enable the `serde` feature to (de)serialize every type.

use std::fmt;
use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

// ============================================================================
// Value Encoding Tags
// ============================================================================

/// Value sample carries an `i32` in the low 32 bits
pub const VALUE_ENCODING_I32: u32 = 1;

/// Value sample carries an `i64`
pub const VALUE_ENCODING_I64: u32 = 2;

/// Value sample carries a `u32` in the low 32 bits
pub const VALUE_ENCODING_U32: u32 = 3;

/// Value sample carries a `u64`
pub const VALUE_ENCODING_U64: u32 = 4;

/// Value sample carries the bit pattern of an `f32` in the low 32 bits
pub const VALUE_ENCODING_F32: u32 = 5;

/// Value sample carries the bit pattern of an `f64`
pub const VALUE_ENCODING_F64: u32 = 6;

/// Value sample carries an interned string id (not plottable)
pub const VALUE_ENCODING_STRING: u32 = 7;

// ============================================================================
// Identifiers
// ============================================================================

/// Thread ID as reported by the capture agent.
///
/// Signed because the synthetic "all threads" track uses `-1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(transparent))]
pub struct ThreadId(pub i32);

impl ThreadId {
    /// Synthetic id of the process-wide track aggregating every thread.
    pub const ALL_THREADS: ThreadId = ThreadId(-1);

    #[must_use]
    pub fn is_all_threads(self) -> bool {
        self == Self::ALL_THREADS
    }
}

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TID:{}", self.0)
    }
}

/// CPU core a scheduling slice ran on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(transparent))]
pub struct CoreId(pub u32);

impl fmt::Display for CoreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CPU:{}", self.0)
    }
}

/// GPU timeline (queue) identity, usually a hash of the timeline name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(transparent))]
pub struct TimelineId(pub u64);

/// Instrumented function identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(transparent))]
pub struct FunctionId(pub u64);

// ============================================================================
// Timer Records
// ============================================================================

/// What produced a timer, which decides the track it lands on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum TimerKind {
    /// Instrumented function call on a thread
    FunctionSpan,
    /// A thread scheduled on a CPU core
    CoreActivity,
    /// Work executed on a GPU timeline
    GpuActivity,
    /// Manually-instrumented span that may cross threads
    AsyncSpan,
    /// Profiler self-instrumentation
    Introspection,
    /// Scalar sample of a named series
    ValueSample,
}

/// Raw payload of a value-tracking sample.
///
/// `encoding` is one of the `VALUE_ENCODING_*` tags; unknown tags are kept
/// as-is so that the consumer can report and drop them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EncodedValue {
    pub encoding: u32,
    pub bits: u64,
}

impl EncodedValue {
    #[must_use]
    pub fn from_i64(value: i64) -> Self {
        Self { encoding: VALUE_ENCODING_I64, bits: value as u64 }
    }

    #[must_use]
    pub fn from_u64(value: u64) -> Self {
        Self { encoding: VALUE_ENCODING_U64, bits: value }
    }

    #[must_use]
    pub fn from_f64(value: f64) -> Self {
        Self { encoding: VALUE_ENCODING_F64, bits: value.to_bits() }
    }
}

/// One timed event.
///
/// Immutable once handed to the engine. `start` and `end` are absolute ticks
/// (1 tick = 1 ns) and `end >= start`. Samples have `start == end`.
///
/// Equality compares the event itself and ignores `sequence`.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TimerInfo {
    pub start: u64,
    pub end: u64,
    pub thread_id: ThreadId,
    /// Call-stack nesting level (0 = outermost)
    #[cfg_attr(feature = "serde", serde(default))]
    pub depth: u32,
    pub kind: TimerKind,
    #[cfg_attr(feature = "serde", serde(default))]
    pub function_id: Option<FunctionId>,
    /// Set for `CoreActivity` only
    #[cfg_attr(feature = "serde", serde(default))]
    pub core_id: Option<CoreId>,
    /// Set for `GpuActivity` only
    #[cfg_attr(feature = "serde", serde(default))]
    pub timeline_id: Option<TimelineId>,
    /// Series name for `AsyncSpan` and `ValueSample`
    #[cfg_attr(feature = "serde", serde(default))]
    pub series: Option<Arc<str>>,
    /// Payload for `ValueSample`
    #[cfg_attr(feature = "serde", serde(default))]
    pub value: Option<EncodedValue>,
    /// Delivery ordinal stamped by the engine on ingestion, 0 before that.
    /// Tells apart identical records held by the same row.
    #[cfg_attr(feature = "serde", serde(skip))]
    pub sequence: u64,
}

impl PartialEq for TimerInfo {
    fn eq(&self, other: &Self) -> bool {
        self.start == other.start
            && self.end == other.end
            && self.thread_id == other.thread_id
            && self.depth == other.depth
            && self.kind == other.kind
            && self.function_id == other.function_id
            && self.core_id == other.core_id
            && self.timeline_id == other.timeline_id
            && self.series == other.series
            && self.value == other.value
    }
}

impl TimerInfo {
    fn bare(start: u64, end: u64, thread_id: ThreadId, kind: TimerKind) -> Self {
        Self {
            start,
            end: end.max(start),
            thread_id,
            depth: 0,
            kind,
            function_id: None,
            core_id: None,
            timeline_id: None,
            series: None,
            value: None,
            sequence: 0,
        }
    }

    /// Instrumented function call at the given nesting depth
    #[must_use]
    pub fn function_span(start: u64, end: u64, thread_id: ThreadId, depth: u32) -> Self {
        Self { depth, ..Self::bare(start, end, thread_id, TimerKind::FunctionSpan) }
    }

    /// Scheduling slice of `thread_id` on `core`
    #[must_use]
    pub fn core_activity(start: u64, end: u64, thread_id: ThreadId, core: CoreId) -> Self {
        Self { core_id: Some(core), ..Self::bare(start, end, thread_id, TimerKind::CoreActivity) }
    }

    /// GPU work on `timeline`, submitted by `thread_id`
    #[must_use]
    pub fn gpu_activity(
        start: u64,
        end: u64,
        thread_id: ThreadId,
        timeline: TimelineId,
        depth: u32,
    ) -> Self {
        Self {
            depth,
            timeline_id: Some(timeline),
            ..Self::bare(start, end, thread_id, TimerKind::GpuActivity)
        }
    }

    /// Asynchronous span belonging to the named series
    #[must_use]
    pub fn async_span(series: &str, start: u64, end: u64, thread_id: ThreadId) -> Self {
        Self { series: Some(Arc::from(series)), ..Self::bare(start, end, thread_id, TimerKind::AsyncSpan) }
    }

    /// Scalar sample of the named series taken at `time`
    #[must_use]
    pub fn value_sample(series: &str, time: u64, thread_id: ThreadId, value: EncodedValue) -> Self {
        Self {
            series: Some(Arc::from(series)),
            value: Some(value),
            ..Self::bare(time, time, thread_id, TimerKind::ValueSample)
        }
    }

    /// Profiler self-instrumentation span
    #[must_use]
    pub fn introspection(start: u64, end: u64, thread_id: ThreadId, depth: u32) -> Self {
        Self { depth, ..Self::bare(start, end, thread_id, TimerKind::Introspection) }
    }

    /// Attach the instrumented function this timer measured
    #[must_use]
    pub fn with_function(mut self, function: FunctionId) -> Self {
        self.function_id = Some(function);
        self
    }

    #[must_use]
    pub fn duration_ns(&self) -> u64 {
        self.end - self.start
    }

    /// True if `[start, end]` intersects `[lo, hi]`
    #[must_use]
    pub fn overlaps(&self, lo: u64, hi: u64) -> bool {
        self.start <= hi && self.end >= lo
    }

    /// True if `time` falls inside the span (`start <= time < end`).
    ///
    /// Zero-length records contain their own start.
    #[must_use]
    pub fn contains(&self, time: u64) -> bool {
        if self.start == self.end {
            return time == self.start;
        }
        self.start <= time && time < self.end
    }
}

// ============================================================================
// Callstack Samples and Function Metadata
// ============================================================================

/// One sampled callstack, owned by the external callstack index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CallstackEvent {
    pub time: u64,
    pub thread_id: ThreadId,
    #[cfg_attr(feature = "serde", serde(default))]
    pub callstack_id: u64,
}

/// How the profiler treats timers of an instrumented function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FunctionRole {
    /// Ordinary instrumented function; timers become thread spans
    #[default]
    Regular,
    /// Manual-instrumentation "track value" entry point; timers carry a sample
    TrackValue,
}

/// Instrumented function metadata
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FunctionInfo {
    pub id: FunctionId,
    pub name: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub role: FunctionRole,
}
