//! # Terminal User Interface (TUI)
//!
//! Interactive terminal timeline using `ratatui`. The viewer is the consumer
//! side of the engine: it renders a [`RenderBatch`](crate::render::RenderBatch)
//! at 10 Hz while the replay thread keeps delivering timers.
//!
//! ## View Modes
//!
//! - **Timeline** - track lanes, zoom/pan and navigation (default)
//! - **Filter** - text input for the thread filter
//! - **Help** - keyboard shortcuts
//!
//! ## Sub-Modules
//!
//! - `lanes` - character-cell rendering of tracks
//! - `theme` - color scheme

#![allow(clippy::cast_precision_loss, clippy::too_many_lines)]

use anyhow::Result;
use chronoscope_common::TimerInfo;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use log::debug;
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Terminal,
};
use std::collections::BTreeMap;
use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};

pub mod lanes;
mod theme;

use theme::{CAUTION_AMBER, CRITICAL_RED, SCOPE_GREEN, INFO_DIM};

use crate::capture::{CaptureContext, CaptureData};
use crate::render::{elapsed_label, PickingMode, RenderBatch};
use crate::replay::{ReplayHandle, ReplaySummary};
use crate::time_graph::{CaptureState, JumpDirection, JumpScope, TimeGraph};
use crate::time_mapping::Viewport;

// =============================================================================
// STYLE CONSTANTS
// =============================================================================

const STYLE_HEADING: Style = Style::new().fg(SCOPE_GREEN).add_modifier(Modifier::BOLD);
const STYLE_LABEL: Style = Style::new().fg(CAUTION_AMBER).add_modifier(Modifier::BOLD);
const STYLE_DIM: Style = Style::new().fg(INFO_DIM);
const STYLE_KEY: Style = Style::new().fg(CAUTION_AMBER);
const STYLE_TEXT: Style = Style::new().fg(ratatui::style::Color::White);

/// Redraw period
const UPDATE_INTERVAL: Duration = Duration::from_millis(100);

/// Fraction of the window one pan key press moves
const PAN_STEP: f32 = 0.1;

// =============================================================================
// VIEW MODES
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
enum ViewMode {
    Timeline,
    /// Text input for the thread filter
    Filter,
    Help,
}

// =============================================================================
// APP
// =============================================================================

/// Timeline viewer over a shared engine
pub struct App {
    graph: Arc<TimeGraph>,
    ctx: CaptureData,
    replay: Option<ReplayHandle>,
    replay_summary: Option<ReplaySummary>,

    view_mode: ViewMode,
    filter_input: String,
    /// Lines scrolled off the top of the lane panel
    scroll: u16,
    /// Last drawn batch, used to pick a first timer for navigation
    last_batch: RenderBatch,
    fitted: bool,
    should_quit: bool,
}

impl App {
    #[must_use]
    pub fn new(graph: Arc<TimeGraph>, ctx: CaptureData, replay: Option<ReplayHandle>) -> Self {
        let filter_input = graph.thread_filter();
        Self {
            graph,
            ctx,
            replay,
            replay_summary: None,
            view_mode: ViewMode::Timeline,
            filter_input,
            scroll: 0,
            last_batch: RenderBatch::default(),
            fitted: false,
            should_quit: false,
        }
    }

    /// Collect the replay summary once the producer is done
    fn poll_replay(&mut self) {
        if let Some(summary) = self.replay.as_ref().and_then(ReplayHandle::try_finished) {
            debug!("Replay done: {summary:?}");
            self.replay_summary = Some(summary);
            // Show the whole history of the finished capture once
            self.fitted = false;
        }
        if !self.fitted && self.graph.capture_extent().is_some() {
            self.graph.zoom_to_fit(&self.ctx);
            self.fitted = true;
        }
    }

    fn first_visible_timer(&self) -> Option<TimerInfo> {
        self.last_batch.tracks.iter().flat_map(|t| t.shapes.iter()).find_map(|s| s.timer().cloned())
    }

    fn jump(&mut self, direction: JumpDirection, scope: JumpScope) {
        match self.graph.selected_timer() {
            Some(from) => {
                self.graph.navigate(&from, direction, scope);
            }
            None => {
                if let Some(first) = self.first_visible_timer() {
                    self.graph.select_timer(&first);
                }
            }
        }
    }

    /// Drag the window by `fraction` of its width; positive moves later
    fn pan_by(&self, fraction: f32) {
        let window = self.graph.window();
        let center = window.time_at_ratio(0.5);
        self.graph.pan(50.0, 50.0 - fraction * 100.0, 100.0, center);
    }

    fn handle_key(&mut self, key: KeyCode) {
        match self.view_mode {
            ViewMode::Timeline => match key {
                KeyCode::Char('q' | 'Q') => self.should_quit = true,
                KeyCode::Char('w' | 'W') => self.graph.zoom_time(-1.0, 0.5),
                KeyCode::Char('s' | 'S') => self.graph.zoom_time(1.0, 0.5),
                KeyCode::Char('a' | 'A') => self.pan_by(-PAN_STEP),
                KeyCode::Char('d' | 'D') => self.pan_by(PAN_STEP),
                KeyCode::Char('0') => self.graph.zoom_to_fit(&self.ctx),
                KeyCode::Left => self.jump(JumpDirection::Previous, JumpScope::SameDepth),
                KeyCode::Right => self.jump(JumpDirection::Next, JumpScope::SameDepth),
                KeyCode::Up => self.jump(JumpDirection::Top, JumpScope::SameDepth),
                KeyCode::Down => self.jump(JumpDirection::Down, JumpScope::SameDepth),
                KeyCode::Char('n') => self.jump(JumpDirection::Next, JumpScope::SameFunction),
                KeyCode::Char('p') => self.jump(JumpDirection::Previous, JumpScope::SameFunction),
                KeyCode::Char('N') => self.jump(JumpDirection::Next, JumpScope::SameThreadSameFunction),
                KeyCode::Char('P') => self.jump(JumpDirection::Previous, JumpScope::SameThreadSameFunction),
                KeyCode::Char('z' | 'Z') => {
                    if let Some(timer) = self.graph.selected_timer() {
                        self.graph.select_and_zoom(&timer);
                    }
                }
                KeyCode::Char('m' | 'M') => {
                    if let Some(timer) = self.graph.selected_timer() {
                        self.graph.add_iterator(timer);
                    }
                }
                KeyCode::Char('c' | 'C') => self.graph.set_iterator_overlay(BTreeMap::new()),
                KeyCode::Esc => self.graph.clear_selected_timer(),
                KeyCode::PageDown => self.scroll = self.scroll.saturating_add(5),
                KeyCode::PageUp => self.scroll = self.scroll.saturating_sub(5),
                KeyCode::Char('/') => {
                    self.filter_input = self.graph.thread_filter();
                    self.view_mode = ViewMode::Filter;
                }
                KeyCode::Char('?') => self.view_mode = ViewMode::Help,
                _ => {}
            },
            ViewMode::Filter => match key {
                KeyCode::Esc => self.view_mode = ViewMode::Timeline,
                KeyCode::Enter => {
                    self.graph.set_thread_filter(&self.filter_input);
                    self.graph.sort_tracks(&self.ctx);
                    self.view_mode = ViewMode::Timeline;
                }
                KeyCode::Backspace => {
                    self.filter_input.pop();
                }
                KeyCode::Char(c) => self.filter_input.push(c),
                _ => {}
            },
            ViewMode::Help => self.view_mode = ViewMode::Timeline,
        }
    }

    fn header_line(&self) -> Line<'static> {
        let state = match self.graph.capture_state() {
            CaptureState::Capturing => Span::styled("[REPLAY]", Style::new().fg(CRITICAL_RED).add_modifier(Modifier::BOLD)),
            CaptureState::Idle => Span::styled("[IDLE]", Style::new().fg(CAUTION_AMBER)),
            CaptureState::Empty => Span::styled("[EMPTY]", STYLE_DIM),
        };
        let span_ms = self.graph.capture_span_us() / 1_000.0;
        let window = self.graph.window();
        let replay = self.replay_summary.map_or_else(String::new, |s| {
            format!(" | replayed {}/{} in {:.2}s", s.delivered, s.total, s.elapsed.as_secs_f64())
        });
        Line::from(vec![
            Span::styled("CHRONOSCOPE", STYLE_HEADING),
            Span::styled(" | ", STYLE_DIM),
            state,
            Span::styled(" | ", STYLE_DIM),
            Span::styled(self.ctx.process_name().to_string(), Style::new().fg(SCOPE_GREEN)),
            Span::styled(" | ", STYLE_DIM),
            Span::styled(format!("{span_ms:.1}ms"), Style::new().fg(SCOPE_GREEN)),
            Span::styled(" | ", STYLE_DIM),
            Span::styled(format!("{} timers", self.graph.num_timers()), Style::new().fg(CAUTION_AMBER)),
            Span::styled(
                format!(" | window {:.1}..{:.1}ms", window.min_us / 1_000.0, window.max_us / 1_000.0),
                STYLE_DIM,
            ),
            Span::styled(replay, STYLE_DIM),
        ])
    }

    fn selection_line(&self) -> Line<'static> {
        let Some(timer) = self.graph.selected_timer() else {
            return Line::from(Span::styled("No selection (arrow keys select)", STYLE_DIM));
        };
        let name = timer
            .function_id
            .and_then(|id| self.ctx.function_name(id))
            .map_or_else(|| format!("{:?}", timer.kind), str::to_string);
        let markers = self.graph.iterators().len();
        Line::from(vec![
            Span::styled("Selected ", STYLE_LABEL),
            Span::styled(name, STYLE_TEXT),
            Span::styled(format!("  tid {}  depth {}  ", timer.thread_id, timer.depth), STYLE_DIM),
            Span::styled(elapsed_label(timer.start, timer.end), Style::new().fg(SCOPE_GREEN)),
            Span::styled(format!("  markers {markers}"), STYLE_DIM),
        ])
    }

    fn status_line(&self) -> Line<'static> {
        match self.view_mode {
            ViewMode::Timeline => Line::from(vec![
                Span::styled("Q", STYLE_KEY),
                Span::styled(":Quit ", STYLE_DIM),
                Span::styled("W/S", STYLE_KEY),
                Span::styled(":Zoom ", STYLE_DIM),
                Span::styled("A/D", STYLE_KEY),
                Span::styled(":Pan ", STYLE_DIM),
                Span::styled("0", STYLE_KEY),
                Span::styled(":Fit ", STYLE_DIM),
                Span::styled("←→↑↓", STYLE_KEY),
                Span::styled(":Jump ", STYLE_DIM),
                Span::styled("N/P", STYLE_KEY),
                Span::styled(":Same fn ", STYLE_DIM),
                Span::styled("M", STYLE_KEY),
                Span::styled(":Mark ", STYLE_DIM),
                Span::styled("/", STYLE_KEY),
                Span::styled(":Filter ", STYLE_DIM),
                Span::styled("?", STYLE_KEY),
                Span::styled(":Help", STYLE_DIM),
            ]),
            ViewMode::Filter => Line::from(vec![
                Span::styled("Enter", STYLE_KEY),
                Span::styled(":Apply ", STYLE_DIM),
                Span::styled("ESC", STYLE_KEY),
                Span::styled(":Cancel ", STYLE_DIM),
                Span::styled("[Filter]", Style::new().fg(CAUTION_AMBER)),
            ]),
            ViewMode::Help => Line::from(vec![
                Span::styled("Any key", STYLE_KEY),
                Span::styled(":Close ", STYLE_DIM),
                Span::styled("[Help]", Style::new().fg(SCOPE_GREEN)),
            ]),
        }
    }

    /// Run the TUI event loop until `q`
    ///
    /// # Errors
    /// Returns an error if terminal setup or rendering fails
    pub fn run(mut self) -> Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let mut last_update: Option<Instant> = None;
        loop {
            self.poll_replay();

            if last_update.map_or(true, |at| at.elapsed() >= UPDATE_INTERVAL) {
                terminal.draw(|f| {
                    let outer_layout = Layout::default()
                        .direction(Direction::Vertical)
                        .constraints([
                            Constraint::Length(3), // Header
                            Constraint::Min(0),    // Lanes
                            Constraint::Length(3), // Selection
                            Constraint::Length(3), // Keys
                        ])
                        .split(f.area());

                    let header = Paragraph::new(vec![self.header_line()])
                        .block(Block::default().borders(Borders::ALL).border_style(Style::new().fg(SCOPE_GREEN)));
                    f.render_widget(header, outer_layout[0]);

                    self.render_lanes(f, outer_layout[1]);

                    let selection = Paragraph::new(vec![self.selection_line()])
                        .block(Block::default().borders(Borders::ALL).border_style(Style::new().fg(SCOPE_GREEN)));
                    f.render_widget(selection, outer_layout[2]);

                    let status = Paragraph::new(vec![self.status_line()])
                        .block(Block::default().borders(Borders::ALL).border_style(Style::new().fg(SCOPE_GREEN)));
                    f.render_widget(status, outer_layout[3]);

                    match self.view_mode {
                        ViewMode::Filter => render_filter_overlay(f, f.area(), &self.filter_input),
                        ViewMode::Help => render_help_overlay(f, f.area()),
                        ViewMode::Timeline => {}
                    }
                })?;
                last_update = Some(Instant::now());
            }

            if event::poll(Duration::from_millis(50))? {
                match event::read()? {
                    Event::Key(key) if key.kind == KeyEventKind::Press => {
                        self.handle_key(key.code);
                        // Show the effect of the key right away
                        last_update = None;
                    }
                    Event::Resize(..) => {
                        self.graph.request_redraw();
                        last_update = None;
                    }
                    _ => {}
                }
            }

            if self.should_quit {
                break;
            }
        }

        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
        terminal.show_cursor()?;

        if let Some(replay) = self.replay.take() {
            replay.stop()?;
        }
        Ok(())
    }

    fn render_lanes(&mut self, f: &mut ratatui::Frame, area: Rect) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!(" Timeline ({} tracks) ", self.graph.draw_order().len()))
            .border_style(Style::new().fg(SCOPE_GREEN));
        let inner = block.inner(area);

        let lines = match Viewport::cells(inner.width.max(1), inner.height) {
            Ok(viewport) => {
                self.last_batch = self.graph.update_primitives(&self.ctx, viewport, PickingMode::None);
                let selected = self.graph.selected_timer();
                lanes::batch_lines(&self.last_batch, inner.width, selected.as_ref())
            }
            Err(e) => vec![Line::from(Span::styled(e.to_string(), Style::new().fg(CRITICAL_RED)))],
        };

        let max_scroll = u16::try_from(lines.len()).unwrap_or(u16::MAX).saturating_sub(1);
        self.scroll = self.scroll.min(max_scroll);
        f.render_widget(Paragraph::new(lines).block(block).scroll((self.scroll, 0)), area);
    }
}

// =============================================================================
// OVERLAY RENDERERS
// =============================================================================

fn render_help_overlay(f: &mut ratatui::Frame, area: Rect) {
    let popup_area = centered_popup(area, 70, 20);

    let key_line = |key: &'static str, text: &'static str| {
        Line::from(vec![Span::styled(format!("  {key:<10}"), STYLE_KEY), Span::styled(text, STYLE_TEXT)])
    };
    let help_text = vec![
        Line::from(""),
        Line::from(Span::styled("  What You're Looking At", STYLE_HEADING)),
        Line::from(Span::styled("  One lane per track: scheduler, GPU queues, value graphs,", STYLE_DIM)),
        Line::from(Span::styled("  async series, the whole process, then threads by activity.", STYLE_DIM)),
        Line::from(""),
        Line::from(Span::styled("  Keys", STYLE_HEADING)),
        key_line("W / S", "Zoom in / out"),
        key_line("A / D", "Pan left / right"),
        key_line("0", "Zoom to the last seconds of the capture"),
        key_line("← →", "Previous / next call at the same depth"),
        key_line("↑ ↓", "Caller / first callee"),
        key_line("n / p", "Next / previous call of the same function"),
        key_line("N / P", "Same, restricted to the selected thread"),
        key_line("Z", "Zoom onto the selection"),
        key_line("M / C", "Mark the selection / clear marks"),
        key_line("/", "Filter threads by name"),
        Line::from(""),
        Line::from(Span::styled("  Press any key to close", STYLE_DIM)),
    ];

    let help_widget = Paragraph::new(help_text).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Help ")
            .style(Style::new().bg(ratatui::style::Color::Black).fg(SCOPE_GREEN)),
    );

    f.render_widget(ratatui::widgets::Clear, popup_area);
    f.render_widget(help_widget, popup_area);
}

fn render_filter_overlay(f: &mut ratatui::Frame, area: Rect, input: &str) {
    let popup_area = centered_popup(area, 60, 3);
    let widget = Paragraph::new(format!("Threads: {input}_"))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Thread Filter (space-separated words)")
                .style(Style::new().bg(ratatui::style::Color::Black).fg(SCOPE_GREEN)),
        )
        .style(Style::new().fg(CAUTION_AMBER));

    f.render_widget(ratatui::widgets::Clear, popup_area);
    f.render_widget(widget, popup_area);
}

/// Create a centered popup area with given width percentage and height in lines
fn centered_popup(area: Rect, width_percent: u16, height_lines: u16) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Fill(1), Constraint::Length(height_lines), Constraint::Fill(1)])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - width_percent) / 2),
            Constraint::Percentage(width_percent),
            Constraint::Percentage((100 - width_percent) / 2),
        ])
        .split(vertical[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chronoscope_common::{FunctionId, ThreadId};

    const MS: u64 = 1_000_000;

    fn app() -> App {
        let graph = Arc::new(TimeGraph::default());
        for i in 0..4 {
            let timer = TimerInfo::function_span(i * 10 * MS, i * 10 * MS + 5 * MS, ThreadId(1), 0)
                .with_function(FunctionId(1));
            graph.process_timer(timer, None);
        }
        graph.finish_capture();
        let mut app = App::new(graph, CaptureData::new("game"), None);
        app.poll_replay();
        app
    }

    #[test]
    fn test_fit_on_first_data() {
        let app = app();
        assert!(app.fitted);
        assert_eq!(app.graph.window().max_us, 35_000.0);
    }

    #[test]
    fn test_zoom_keys() {
        let mut app = app();
        let before = app.graph.window().width_us();
        app.handle_key(KeyCode::Char('w'));
        assert!(app.graph.window().width_us() < before);
        app.handle_key(KeyCode::Char('0'));
        assert_eq!(app.graph.window().width_us(), before);
    }

    #[test]
    fn test_arrows_select_then_navigate() {
        let mut app = app();
        app.last_batch =
            app.graph.update_primitives(&app.ctx, Viewport::cells(80, 20).unwrap(), PickingMode::None);

        app.handle_key(KeyCode::Right);
        let first = app.graph.selected_timer().unwrap();
        assert_eq!(first.start, 0);

        app.handle_key(KeyCode::Right);
        assert_eq!(app.graph.selected_timer().map(|t| t.start), Some(10 * MS));
        app.handle_key(KeyCode::Char('p'));
        assert_eq!(app.graph.selected_timer(), Some(first));

        app.handle_key(KeyCode::Char('m'));
        assert_eq!(app.graph.iterators().len(), 1);
        app.handle_key(KeyCode::Esc);
        assert!(app.graph.selected_timer().is_none());
    }

    #[test]
    fn test_filter_input_mode() {
        let mut app = app();
        app.handle_key(KeyCode::Char('/'));
        assert_eq!(app.view_mode, ViewMode::Filter);
        for c in "main".chars() {
            app.handle_key(KeyCode::Char(c));
        }
        app.handle_key(KeyCode::Backspace);
        app.handle_key(KeyCode::Enter);
        assert_eq!(app.view_mode, ViewMode::Timeline);
        assert_eq!(app.graph.thread_filter(), "mai");
    }

    #[test]
    fn test_quit_key() {
        let mut app = app();
        app.handle_key(KeyCode::Char('q'));
        assert!(app.should_quit);
    }
}
