//! # chronoscope - Main Entry Point
//!
//! Loads a recorded capture and replays it into a shared timeline engine.
//! Supports two operational modes:
//! - **TUI** (default): browse the timeline while it fills
//! - **Headless** (`--headless`): replay to completion and print the tracks

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use std::sync::Arc;

use chronoscope::capture::{CaptureContext, CaptureData, CaptureFile};
use chronoscope::cli::Args;
use chronoscope::replay::{spawn_replay, ReplaySummary};
use chronoscope::time_graph::TimeGraph;
use chronoscope::tui::App;

// Exit codes
const EXIT_SUCCESS: i32 = 0;
const EXIT_ERROR: i32 = 1;
const EXIT_NOINPUT: i32 = 66;
const EXIT_DATAERR: i32 = 65;

fn main() {
    env_logger::init();
    std::process::exit(match run() {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            let code = exit_code_for(&e);
            eprintln!("error: {e:#}");
            code
        }
    });
}

fn exit_code_for(err: &anyhow::Error) -> i32 {
    let msg = format!("{err:#}").to_lowercase();
    if msg.contains("no such file") || msg.contains("not found") {
        EXIT_NOINPUT
    } else if msg.contains("failed to parse capture") || msg.contains("invalid timer") {
        EXIT_DATAERR
    } else {
        EXIT_ERROR
    }
}

fn run() -> Result<()> {
    let args = Args::parse();
    let config = args.time_graph_config()?;

    let capture = CaptureFile::from_file(&args.capture)
        .with_context(|| format!("Failed to load capture {}", args.capture.display()))?;
    let (ctx, timers) = capture.into_parts();
    info!("Loaded {} timers of process {}", timers.len(), ctx.process_name());

    let graph = Arc::new(TimeGraph::new(config));
    if let Some(filter) = &args.filter {
        graph.set_thread_filter(filter);
    }

    let replay = spawn_replay(Arc::clone(&graph), ctx.function_table(), timers, args.replay_rate)?;

    if args.headless {
        let summary = replay.wait()?;
        print_summary(&graph, &ctx, summary);
        return Ok(());
    }

    App::new(graph, ctx, Some(replay)).run()
}

/// Print the draw order and counters of a finished replay
#[allow(clippy::cast_precision_loss)]
fn print_summary(graph: &TimeGraph, ctx: &CaptureData, summary: ReplaySummary) {
    graph.update_capture_extent(ctx);
    graph.sort_tracks(ctx);

    println!("Process:  {}", ctx.process_name());
    println!(
        "Replayed: {}/{} timers in {:.2}s",
        summary.delivered,
        summary.total,
        summary.elapsed.as_secs_f64()
    );
    match graph.capture_extent() {
        Some((min, max)) => println!("Extent:   {min}..{max} ({:.3} ms)", (max - min) as f64 / 1_000_000.0),
        None => println!("Extent:   (no data)"),
    }
    println!("Cores:    {}", graph.num_cores());
    println!();
    println!("{:<40} {:<10} {:>10}", "TRACK", "KIND", "EVENTS");
    for summary in graph.draw_order().into_iter().filter_map(|id| graph.track_summary(id)) {
        println!("{:<40} {:<10} {:>10}", summary.label, format!("{:?}", summary.kind), summary.event_count);
    }
}
