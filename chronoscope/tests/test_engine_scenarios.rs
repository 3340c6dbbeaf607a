use chronoscope::capture::CaptureData;
use chronoscope::time_graph::{JumpDirection, JumpScope, TimeGraph, Visibility};
use chronoscope::time_mapping::{tick_to_us, us_to_tick};
use chronoscope::TrackKind;
use std::collections::BTreeSet;

use chronoscope_common::{CallstackEvent, CoreId, EncodedValue, FunctionId, ThreadId, TimelineId, TimerInfo};

const SECOND: u64 = 1_000_000_000;

#[test]
fn test_span_and_core_activity_scenario() {
    let graph = TimeGraph::default();
    graph.clear();
    graph.process_timer(TimerInfo::function_span(100, 200, ThreadId(7), 0), None);
    graph.process_timer(TimerInfo::core_activity(50, 90, ThreadId(7), CoreId(2)), None);

    assert_eq!(graph.capture_max_tick(), 200);
    let thread = graph.thread_track(ThreadId(7)).expect("thread track");
    let summary = graph.track_summary(thread).expect("summary");
    assert_eq!(summary.kind, TrackKind::Thread);
    assert_eq!(summary.event_count, 1);

    let cores = graph.with_track(graph.scheduler_track(), |t| {
        t.as_scheduler().map(|s| s.cores().collect::<Vec<_>>())
    });
    assert_eq!(cores, Some(Some(vec![CoreId(2)])));
    assert_eq!(graph.cores_seen(), vec![CoreId(2)]);
}

#[test]
fn test_tick_microsecond_round_trip_scenario() {
    assert_eq!(us_to_tick(1_000_000, tick_to_us(1_000_000, 1_050_000)), 1_050_000);
}

#[test]
fn test_empty_gpu_track_scenario() {
    let graph = TimeGraph::default();
    let ctx = CaptureData::new("game");
    graph.get_or_create_gpu_track(TimelineId(0));
    graph.process_timer(TimerInfo::function_span(0, 10, ThreadId(1), 0), None);
    graph.finish_capture();
    graph.sort_tracks(&ctx);

    assert_eq!(graph.draw_order(), vec![graph.thread_track(ThreadId(1)).expect("thread track")]);
}

#[test]
fn test_capture_extent_is_monotonic() {
    let graph = TimeGraph::default();
    let mut ctx = CaptureData::new("game");
    let mut last_max = 0;
    for (start, end) in [(500, 900), (100, 300), (2_000, 2_500), (1_000, 1_100)] {
        graph.process_timer(TimerInfo::function_span(start, end, ThreadId(1), 0), None);
        graph.update_capture_extent(&ctx);
        let max = graph.capture_max_tick();
        assert!(max >= last_max);
        last_max = max;
    }
    ctx.add_callstack(CallstackEvent { time: 50, thread_id: ThreadId(1), callstack_id: 0 });
    graph.update_capture_extent(&ctx);
    assert_eq!(graph.capture_extent(), Some((50, 2_500)));
}

#[test]
fn test_zoom_to_fit_bounds() {
    let graph = TimeGraph::default();
    let ctx = CaptureData::new("game");
    graph.process_timer(TimerInfo::function_span(3 * SECOND, 30 * SECOND, ThreadId(1), 0), None);
    graph.zoom_to_fit(&ctx);

    let window = graph.window();
    assert!(window.width_us() <= 2_000_000.0);
    assert!(window.min_us >= 0.0);
    assert_eq!(window.max_us, graph.capture_span_us());
}

#[test]
fn test_ensure_visible_is_idempotent() {
    let graph = TimeGraph::default();
    graph.process_timer(TimerInfo::function_span(0, 10 * SECOND, ThreadId(1), 0), None);
    graph.set_min_max(0.0, 1_000_000.0);

    let (lo, hi) = (6 * SECOND, 6 * SECOND + 1_000);
    graph.ensure_visible(Visibility::FullyVisible, lo, hi, 0.3);
    let once = graph.window();
    assert!(graph.is_visible(Visibility::FullyVisible, lo, hi));

    graph.ensure_visible(Visibility::FullyVisible, lo, hi, 0.3);
    assert_eq!(graph.window(), once);
}

#[test]
fn test_next_previous_symmetry() {
    let graph = TimeGraph::default();
    let timers: Vec<TimerInfo> = (0..50u64)
        .map(|i| TimerInfo::function_span(i * 100, i * 100 + 40, ThreadId(1), 0).with_function(FunctionId(i % 3)))
        .collect();
    for timer in &timers {
        graph.process_timer(timer.clone(), None);
    }

    for timer in &timers {
        if let Some(next) = graph.find_neighbor(timer, JumpDirection::Next, JumpScope::SameDepth) {
            let back = graph.find_neighbor(&next, JumpDirection::Previous, JumpScope::SameDepth);
            assert_eq!(back.as_ref(), Some(timer));
        }
        if let Some(next) = graph.find_neighbor(timer, JumpDirection::Next, JumpScope::SameFunction) {
            assert_eq!(next.function_id, timer.function_id);
            let back = graph.find_neighbor(&next, JumpDirection::Previous, JumpScope::SameFunction);
            assert_eq!(back.as_ref(), Some(timer));
        }
    }
}

#[test]
fn test_selection_bounds_swap_invariance() {
    let graph = TimeGraph::default();
    let mut ctx = CaptureData::new("game");
    for i in 0..20u64 {
        ctx.add_callstack(CallstackEvent { time: i * 50_000, thread_id: ThreadId(1), callstack_id: i });
    }
    graph.process_timer(TimerInfo::function_span(0, 1_000_000, ThreadId(1), 0), None);
    graph.set_min_max(0.0, 1_000.0);
    let viewport = chronoscope::Viewport::new(0.0, 200.0, 0.0, 100.0).expect("viewport");

    let forward = graph.select_range(&ctx, viewport, 30.0, 120.0, ThreadId::ALL_THREADS);
    let backward = graph.select_range(&ctx, viewport, 120.0, 30.0, ThreadId::ALL_THREADS);
    assert_eq!(forward, backward);
    assert!(!forward.is_empty());
}

#[test]
fn test_get_or_create_is_idempotent() {
    let graph = TimeGraph::default();
    let before = graph.track_count();
    for _ in 0..3 {
        graph.get_or_create_thread_track(ThreadId(4));
        graph.get_or_create_gpu_track(TimelineId(1));
        graph.get_or_create_graph_track("fps");
        graph.get_or_create_async_track("io");
    }
    assert_eq!(graph.track_count(), before + 4);
}

#[test]
fn test_draw_order_never_repeats_a_track() {
    let graph = TimeGraph::default();
    let ctx = CaptureData::new("game");
    for round in 0..5u64 {
        let thread = graph.get_or_create_thread_track(ThreadId(4));
        let gpu = graph.get_or_create_gpu_track(TimelineId(1));
        let series = graph.get_or_create_graph_track("fps");
        assert_eq!(graph.get_or_create_thread_track(ThreadId(4)), thread);
        assert_eq!(graph.get_or_create_gpu_track(TimelineId(1)), gpu);
        assert_eq!(graph.get_or_create_graph_track("fps"), series);

        let t = round * 100;
        graph.process_timer(TimerInfo::function_span(t, t + 50, ThreadId(4), 0), None);
        graph.process_timer(TimerInfo::gpu_activity(t, t + 20, ThreadId(4), TimelineId(1), 0), None);
        graph.process_timer(TimerInfo::value_sample("fps", t, ThreadId(4), EncodedValue::from_f64(60.0)), None);
        graph.finish_capture();
        graph.sort_tracks(&ctx);

        let order = graph.draw_order();
        let unique: BTreeSet<_> = order.iter().copied().collect();
        assert_eq!(unique.len(), order.len());
        assert!(order.contains(&thread) && order.contains(&gpu) && order.contains(&series));
    }
}
