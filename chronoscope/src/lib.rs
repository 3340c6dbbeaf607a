//! # Chronoscope - Profiler Timeline Engine
//!
//! Chronoscope turns a stream of timing records (function spans, scheduler
//! slices, GPU work, async spans, value samples) into a zoomable,
//! navigable timeline. It ingests records from a producer thread while a
//! consumer renders and queries the same engine.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     Producer (delivery)                         │
//! │            capture replay, live instrumentation                 │
//! └───────────────────────┬─────────────────────────────────────────┘
//!                         │ process_timer(TimerInfo)
//!                         ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      TimeGraph (engine)                         │
//! │                                                                 │
//! │  ┌──────────────┐   ┌──────────────┐   ┌──────────────┐         │
//! │  │   Registry   │──▶│    Tracks    │──▶│ TimerChains  │         │
//! │  │ id → TrackId │   │ 5 variants   │   │ block lists  │         │
//! │  └──────────────┘   └──────────────┘   └──────────────┘         │
//! │         │                                                       │
//! │         ▼                                                       │
//! │  ┌──────────────┐   ┌──────────────┐   ┌──────────────┐         │
//! │  │ Window/Zoom  │   │  Navigation  │   │  Selection   │         │
//! │  │  (µs space)  │   │ (neighbors)  │   │  + overlay   │         │
//! │  └──────────────┘   └──────────────┘   └──────────────┘         │
//! └───────────────────────┬─────────────────────────────────────────┘
//!                         │ update_primitives(ctx, viewport)
//!                         ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │            RenderBatch → TUI / headless summary / tests         │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Structure
//!
//! ### Engine
//!
//! - [`time_graph`]: the thread-safe engine, track registry, sorting,
//!   zoom/pan, navigation and selection
//! - [`track`]: the five track variants and their ingestion rules
//! - [`timer_chain`]: append-only block lists with range and neighbor queries
//! - [`time_mapping`]: tick ↔ microsecond ↔ world-x conversions
//! - [`render`]: drawable primitives handed to the renderer
//! - [`overlay`]: iterator markers and interval annotations
//!
//! ### Data and Configuration
//!
//! - [`capture`]: the `CaptureContext` trait, in-memory capture and the
//!   JSON capture file
//! - [`config`]: engine tunables loaded from JSON
//! - [`domain`]: newtypes and error enums
//!
//! ### Binary Support
//!
//! - [`replay`]: feeds a loaded capture into the engine from a producer
//!   thread
//! - [`tui`]: terminal timeline viewer
//! - [`cli`]: command-line arguments
//!
//! ## Typical Usage
//!
//! ```bash
//! # Browse a recorded capture
//! chronoscope capture.json
//!
//! # Print the track summary without a terminal UI
//! chronoscope capture.json --headless
//! ```
//!
//! ## Key Concepts
//!
//! - **Tick**: nanosecond timestamp; the window is kept in microseconds
//!   relative to the first tick of the capture
//! - **Track**: one lane owned by a thread, a GPU timeline or a named series
//! - **Depth**: call-stack nesting level; each depth is one row
//! - **Iterator**: a timer marked on the overlay for interval measurement

pub mod capture;
pub mod cli;
pub mod config;
pub mod domain;
pub mod overlay;
pub mod render;
pub mod replay;
pub mod time_graph;
pub mod time_mapping;
pub mod timer_chain;
pub mod track;
pub mod tui;

pub use capture::{CaptureContext, CaptureData, CaptureFile};
pub use config::{TimeGraphConfig, TrackLayout};
pub use render::{PickingMode, RenderBatch, Shape, TrackKind};
pub use time_graph::{CaptureState, JumpDirection, JumpScope, TimeGraph, TrackSummary, Visibility};
pub use time_mapping::{TimeMapping, TimeWindow, Viewport};
