//! Capture replay
//!
//! Feeds the timers of a loaded capture into a shared [`TimeGraph`] from a
//! dedicated producer thread, the way a live collector would deliver them.
//! Completion is reported over a `crossbeam-channel`; the consumer polls it
//! without blocking its render loop.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chronoscope_common::{FunctionId, FunctionInfo, TimerInfo};
use crossbeam_channel::{bounded, Receiver, Sender, TryRecvError};
use log::{debug, info};

use crate::time_graph::TimeGraph;

/// Outcome of one replay run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplaySummary {
    pub delivered: usize,
    pub total: usize,
    /// False when the replay was stopped early
    pub completed: bool,
    pub elapsed: Duration,
}

/// Running replay: completion signal, stop switch and the producer thread
pub struct ReplayHandle {
    done_rx: Receiver<ReplaySummary>,
    stop_tx: Sender<()>,
    thread: Option<JoinHandle<()>>,
}

/// Start replaying `timers` into `graph`.
///
/// `rate` is in timers per second; 0 delivers as fast as possible. The
/// capture is finished (`finish_capture`) once every timer is delivered.
pub fn spawn_replay(
    graph: Arc<TimeGraph>,
    functions: BTreeMap<FunctionId, FunctionInfo>,
    timers: Vec<TimerInfo>,
    rate: u64,
) -> Result<ReplayHandle> {
    let (done_tx, done_rx) = bounded(1);
    let (stop_tx, stop_rx) = bounded(1);

    let thread = std::thread::Builder::new()
        .name("chronoscope-replay".to_string())
        .spawn(move || {
            let summary = replay(&graph, &functions, timers, rate, &stop_rx);
            // Nobody listening means the consumer already went away
            let _ = done_tx.send(summary);
        })
        .context("Failed to spawn replay thread")?;

    Ok(ReplayHandle { done_rx, stop_tx, thread: Some(thread) })
}

#[allow(clippy::cast_precision_loss)]
fn replay(
    graph: &TimeGraph,
    functions: &BTreeMap<FunctionId, FunctionInfo>,
    timers: Vec<TimerInfo>,
    rate: u64,
    stop_rx: &Receiver<()>,
) -> ReplaySummary {
    let started = Instant::now();
    let total = timers.len();
    info!("Replaying {total} timers ({})", if rate == 0 { "unpaced".to_string() } else { format!("{rate}/s") });

    let mut delivered = 0;
    for timer in timers {
        if !matches!(stop_rx.try_recv(), Err(TryRecvError::Empty)) {
            debug!("Replay stopped after {delivered} of {total} timers");
            return ReplaySummary { delivered, total, completed: false, elapsed: started.elapsed() };
        }

        if rate > 0 {
            let due = started + Duration::from_secs_f64(delivered as f64 / rate as f64);
            if let Some(wait) = due.checked_duration_since(Instant::now()) {
                std::thread::sleep(wait);
            }
        }

        let function = timer.function_id.and_then(|id| functions.get(&id));
        graph.process_timer(timer, function);
        delivered += 1;
    }

    graph.finish_capture();
    let elapsed = started.elapsed();
    info!("Replay finished: {delivered} timers in {:.2}s", elapsed.as_secs_f64());
    ReplaySummary { delivered, total, completed: true, elapsed }
}

impl ReplayHandle {
    /// Summary if the replay has ended, without blocking
    #[must_use]
    pub fn try_finished(&self) -> Option<ReplaySummary> {
        self.done_rx.try_recv().ok()
    }

    /// Block until the replay ends
    pub fn wait(mut self) -> Result<ReplaySummary> {
        let summary = self.done_rx.recv().context("Replay thread exited without a summary")?;
        self.join()?;
        Ok(summary)
    }

    /// Ask the producer to stop and wait for it
    pub fn stop(mut self) -> Result<()> {
        // A full or closed channel means a stop is already pending or the
        // producer is done
        let _ = self.stop_tx.try_send(());
        self.join()
    }

    fn join(&mut self) -> Result<()> {
        if let Some(thread) = self.thread.take() {
            thread.join().map_err(|_| anyhow::anyhow!("Replay thread panicked"))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time_graph::CaptureState;
    use chronoscope_common::{EncodedValue, FunctionRole, ThreadId};

    fn spans(n: u64) -> Vec<TimerInfo> {
        (0..n).map(|i| TimerInfo::function_span(i * 100, i * 100 + 50, ThreadId(1), 0)).collect()
    }

    #[test]
    fn test_replay_delivers_everything_and_finishes() {
        let graph = Arc::new(TimeGraph::default());
        let handle = spawn_replay(Arc::clone(&graph), BTreeMap::new(), spans(500), 0).unwrap();
        let summary = handle.wait().unwrap();

        assert!(summary.completed);
        assert_eq!(summary.delivered, 500);
        assert_eq!(graph.num_timers(), 500);
        assert_eq!(graph.capture_state(), CaptureState::Idle);
    }

    #[test]
    fn test_replay_resolves_value_tracking_functions() {
        let graph = Arc::new(TimeGraph::default());
        let function = FunctionInfo { id: FunctionId(3), name: "queue_depth".to_string(), role: FunctionRole::TrackValue };
        let mut timer = TimerInfo::function_span(10, 20, ThreadId(1), 0).with_function(FunctionId(3));
        timer.value = Some(EncodedValue::from_i64(12));

        let functions = BTreeMap::from([(FunctionId(3), function)]);
        spawn_replay(Arc::clone(&graph), functions, vec![timer], 0).unwrap().wait().unwrap();

        let series = graph.get_or_create_graph_track("queue_depth");
        assert_eq!(graph.track_summary(series).map(|s| s.event_count), Some(1));
    }

    #[test]
    fn test_stop_interrupts_paced_replay() {
        let graph = Arc::new(TimeGraph::default());
        // One timer per second: the replay cannot finish on its own in time
        let handle = spawn_replay(Arc::clone(&graph), BTreeMap::new(), spans(60), 1).unwrap();
        handle.stop().unwrap();

        assert!(graph.num_timers() < 60);
        assert_ne!(graph.capture_state(), CaptureState::Idle);
    }
}
