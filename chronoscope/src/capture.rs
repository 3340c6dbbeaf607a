//! Capture data consumed by the engine
//!
//! The engine never owns the callstack index or the symbol tables; it reads
//! them through [`CaptureContext`], passed explicitly into every call that
//! needs them. [`CaptureData`] is the in-memory implementation used by the
//! replay binary and the tests, and [`CaptureFile`] is its JSON form.

use std::collections::BTreeMap;
use std::path::Path;

use chronoscope_common::{CallstackEvent, FunctionId, FunctionInfo, ThreadId, TimelineId, TimerInfo};
use serde::Deserialize;

use crate::domain::{CaptureError, Tick};

/// Read-only view of the capture the timeline is showing
pub trait CaptureContext {
    /// Sampled callstacks of every thread with `lo <= time <= hi`
    fn callstack_events_in_range(&self, lo: Tick, hi: Tick) -> Vec<CallstackEvent>;

    /// Sampled callstacks of one thread with `lo <= time <= hi`
    fn callstack_events_of_thread_in_range(&self, thread_id: ThreadId, lo: Tick, hi: Tick) -> Vec<CallstackEvent>;

    fn callstack_event_count(&self) -> usize;

    /// Number of sampled callstacks per thread
    fn callstack_counts_per_thread(&self) -> BTreeMap<ThreadId, usize>;

    fn callstack_min_time(&self) -> Option<Tick>;

    fn callstack_max_time(&self) -> Option<Tick>;

    fn thread_name(&self, thread_id: ThreadId) -> Option<&str>;

    fn process_name(&self) -> &str;

    fn function_name(&self, function_id: FunctionId) -> Option<&str>;

    fn timeline_name(&self, timeline_id: TimelineId) -> Option<&str>;
}

// =============================================================================
// IN-MEMORY CAPTURE
// =============================================================================

/// Symbol tables and callstack index of one capture, held in memory
#[derive(Debug, Clone, Default)]
pub struct CaptureData {
    process_name: String,
    thread_names: BTreeMap<ThreadId, String>,
    timeline_names: BTreeMap<TimelineId, String>,
    functions: BTreeMap<FunctionId, FunctionInfo>,
    /// Sorted by time
    callstacks: Vec<CallstackEvent>,
}

impl CaptureData {
    #[must_use]
    pub fn new(process_name: impl Into<String>) -> Self {
        Self { process_name: process_name.into(), ..Self::default() }
    }

    pub fn set_thread_name(&mut self, thread_id: ThreadId, name: impl Into<String>) {
        self.thread_names.insert(thread_id, name.into());
    }

    pub fn set_timeline_name(&mut self, timeline_id: TimelineId, name: impl Into<String>) {
        self.timeline_names.insert(timeline_id, name.into());
    }

    pub fn add_function(&mut self, function: FunctionInfo) {
        self.functions.insert(function.id, function);
    }

    #[must_use]
    pub fn function(&self, function_id: FunctionId) -> Option<&FunctionInfo> {
        self.functions.get(&function_id)
    }

    /// Copy of the function table, for a producer thread
    #[must_use]
    pub fn function_table(&self) -> BTreeMap<FunctionId, FunctionInfo> {
        self.functions.clone()
    }

    /// Insert a callstack sample, keeping the index sorted by time
    pub fn add_callstack(&mut self, event: CallstackEvent) {
        let at = self.callstacks.partition_point(|e| e.time <= event.time);
        self.callstacks.insert(at, event);
    }

    fn callstacks_in(&self, lo: Tick, hi: Tick) -> &[CallstackEvent] {
        if lo > hi {
            return &[];
        }
        let first = self.callstacks.partition_point(|e| e.time < lo);
        let last = self.callstacks.partition_point(|e| e.time <= hi);
        &self.callstacks[first..last]
    }
}

impl CaptureContext for CaptureData {
    fn callstack_events_in_range(&self, lo: Tick, hi: Tick) -> Vec<CallstackEvent> {
        self.callstacks_in(lo, hi).to_vec()
    }

    fn callstack_events_of_thread_in_range(&self, thread_id: ThreadId, lo: Tick, hi: Tick) -> Vec<CallstackEvent> {
        self.callstacks_in(lo, hi).iter().filter(|e| e.thread_id == thread_id).copied().collect()
    }

    fn callstack_event_count(&self) -> usize {
        self.callstacks.len()
    }

    fn callstack_counts_per_thread(&self) -> BTreeMap<ThreadId, usize> {
        let mut counts = BTreeMap::new();
        for event in &self.callstacks {
            *counts.entry(event.thread_id).or_insert(0) += 1;
        }
        counts
    }

    fn callstack_min_time(&self) -> Option<Tick> {
        self.callstacks.first().map(|e| e.time)
    }

    fn callstack_max_time(&self) -> Option<Tick> {
        self.callstacks.last().map(|e| e.time)
    }

    fn thread_name(&self, thread_id: ThreadId) -> Option<&str> {
        self.thread_names.get(&thread_id).map(String::as_str)
    }

    fn process_name(&self) -> &str {
        &self.process_name
    }

    fn function_name(&self, function_id: FunctionId) -> Option<&str> {
        self.functions.get(&function_id).map(|f| f.name.as_str())
    }

    fn timeline_name(&self, timeline_id: TimelineId) -> Option<&str> {
        self.timeline_names.get(&timeline_id).map(String::as_str)
    }
}

// =============================================================================
// CAPTURE FILE
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct ThreadEntry {
    pub id: ThreadId,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TimelineEntry {
    pub id: TimelineId,
    pub name: String,
}

/// A recorded capture, as stored on disk (JSON)
#[derive(Debug, Clone, Deserialize)]
pub struct CaptureFile {
    pub process_name: String,
    #[serde(default)]
    pub threads: Vec<ThreadEntry>,
    #[serde(default)]
    pub timelines: Vec<TimelineEntry>,
    #[serde(default)]
    pub functions: Vec<FunctionInfo>,
    /// Delivery order; need not be sorted by time
    #[serde(default)]
    pub timers: Vec<TimerInfo>,
    #[serde(default)]
    pub callstacks: Vec<CallstackEvent>,
}

impl CaptureFile {
    /// Load and validate a capture file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, CaptureError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, CaptureError> {
        let capture: Self =
            serde_json::from_str(content).map_err(|e| CaptureError::ParseFailed(e.to_string()))?;
        capture.validate()?;
        Ok(capture)
    }

    fn validate(&self) -> Result<(), CaptureError> {
        for (index, timer) in self.timers.iter().enumerate() {
            if timer.end < timer.start {
                return Err(CaptureError::InvalidTimer {
                    index,
                    reason: format!("end {} before start {}", timer.end, timer.start),
                });
            }
        }
        Ok(())
    }

    /// Split into the capture context and the timers to replay
    #[must_use]
    pub fn into_parts(self) -> (CaptureData, Vec<TimerInfo>) {
        let mut data = CaptureData::new(self.process_name);
        for thread in self.threads {
            data.set_thread_name(thread.id, thread.name);
        }
        for timeline in self.timelines {
            data.set_timeline_name(timeline.id, timeline.name);
        }
        for function in self.functions {
            data.add_function(function);
        }
        for event in self.callstacks {
            data.add_callstack(event);
        }
        (data, self.timers)
    }
}
