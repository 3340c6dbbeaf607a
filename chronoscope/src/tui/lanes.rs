//! Character-cell rendering of a [`RenderBatch`]
//!
//! The batch is built for a viewport measured in cells, so world x is the
//! terminal column. Each distinct shape row of a track becomes one text
//! line under the track's label.

#![allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]

use chronoscope_common::TimerInfo;
use ratatui::{
    style::{Modifier, Style},
    text::{Line, Span},
};

use super::theme::{level_glyph, term_color, CAUTION_AMBER};
use crate::domain::Color as TrackColor;
use crate::render::{RenderBatch, Shape, TrackPrimitives};

/// Rows drawn per track before the rest is cut off
const MAX_ROWS_PER_TRACK: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cell {
    Empty,
    Span { color: TrackColor, selected: bool },
    Tick { color: TrackColor, selected: bool },
    Level { glyph: char, color: TrackColor },
}

impl Cell {
    fn glyph(self) -> char {
        match self {
            Cell::Empty => ' ',
            Cell::Span { .. } => '█',
            Cell::Tick { .. } => '▏',
            Cell::Level { glyph, .. } => glyph,
        }
    }

    fn style(self) -> Style {
        match self {
            Cell::Empty => Style::new(),
            Cell::Span { selected: true, .. } | Cell::Tick { selected: true, .. } => {
                Style::new().fg(CAUTION_AMBER).add_modifier(Modifier::BOLD)
            }
            Cell::Span { color, .. } | Cell::Tick { color, .. } | Cell::Level { color, .. } => {
                Style::new().fg(term_color(color))
            }
        }
    }
}

fn column(x: f32, columns: usize) -> Option<usize> {
    if !x.is_finite() || x < 0.0 {
        return None;
    }
    let col = x.floor() as usize;
    (col < columns).then_some(col)
}

/// Cell grid of one track, one row per distinct shape row (top first)
#[must_use]
pub fn track_rows(track: &TrackPrimitives, columns: usize, selected: Option<&TimerInfo>) -> Vec<Vec<Cell>> {
    let mut row_ys: Vec<f32> = track
        .shapes
        .iter()
        .filter_map(|shape| match shape {
            Shape::Span { y, .. } | Shape::Tick { y, .. } => Some(*y),
            Shape::Polyline { .. } => None,
        })
        .collect();
    row_ys.sort_by(f32::total_cmp);
    row_ys.dedup();
    row_ys.truncate(MAX_ROWS_PER_TRACK);

    let mut rows = vec![vec![Cell::Empty; columns]; row_ys.len()];
    let row_of = |y: f32| row_ys.iter().position(|r| *r == y);
    let is_selected = |timer: &TimerInfo| selected.is_some_and(|s| s == timer);

    for shape in &track.shapes {
        match shape {
            Shape::Span { x0, x1, y, color, timer, .. } => {
                let Some(row) = row_of(*y) else { continue };
                let first = x0.max(0.0).floor() as usize;
                let last = (x1.ceil() as usize).saturating_sub(1).max(first).min(columns.saturating_sub(1));
                let cell = Cell::Span { color: *color, selected: is_selected(timer) };
                for slot in rows[row].iter_mut().take(last + 1).skip(first) {
                    *slot = cell;
                }
            }
            Shape::Tick { x, y, color, timer, .. } => {
                let (Some(row), Some(col)) = (row_of(*y), column(*x, columns)) else { continue };
                if rows[row][col] == Cell::Empty {
                    rows[row][col] = Cell::Tick { color: *color, selected: is_selected(timer) };
                }
            }
            Shape::Polyline { points, color } => {
                let mut levels = vec![Cell::Empty; columns];
                for (x, y) in points {
                    let Some(col) = column(*x, columns) else { continue };
                    let level = if track.height > 0.0 { (track.y + track.height - y) / track.height } else { 0.5 };
                    levels[col] = Cell::Level { glyph: level_glyph(level), color: *color };
                }
                rows.push(levels);
            }
        }
    }
    rows
}

/// Merge runs of equally styled cells into spans
fn row_line(cells: &[Cell]) -> Line<'static> {
    let mut spans = Vec::new();
    let mut text = String::new();
    let mut style: Option<Style> = None;
    for cell in cells {
        let cell_style = cell.style();
        if style.is_some_and(|s| s != cell_style) {
            spans.push(Span::styled(std::mem::take(&mut text), style.unwrap_or_default()));
        }
        style = Some(cell_style);
        text.push(cell.glyph());
    }
    if !text.is_empty() {
        spans.push(Span::styled(text, style.unwrap_or_default()));
    }
    Line::from(spans)
}

/// Label line plus cell rows for every track of the batch, in draw order
#[must_use]
pub fn batch_lines(batch: &RenderBatch, columns: u16, selected: Option<&TimerInfo>) -> Vec<Line<'static>> {
    let columns = usize::from(columns);
    let mut lines = Vec::new();
    for track in &batch.tracks {
        let label_style = Style::new().fg(term_color(track.color)).add_modifier(Modifier::BOLD);
        lines.push(Line::from(Span::styled(format!("▾ {}", track.label), label_style)));
        lines.extend(track_rows(track, columns, selected).iter().map(|row| row_line(row)));
    }
    lines
}
