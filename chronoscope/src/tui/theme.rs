//! TUI color theme
//!
//! Phosphor greens and ambers for the chrome; track content keeps the
//! engine's palette colors.

use ratatui::style::Color;

use crate::domain::Color as TrackColor;

pub const SCOPE_GREEN: Color = Color::Rgb(0, 255, 0);
pub const CRITICAL_RED: Color = Color::Rgb(255, 0, 0);
pub const CAUTION_AMBER: Color = Color::Rgb(255, 191, 0);
pub const INFO_DIM: Color = Color::Rgb(0, 180, 0);

/// Eighth-block glyphs, lowest first
const LEVELS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Terminal color of an engine color; alpha is ignored
#[must_use]
pub fn term_color(color: TrackColor) -> Color {
    Color::Rgb(color.r, color.g, color.b)
}

/// Block glyph for a level in `[0, 1]`
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
pub fn level_glyph(level: f32) -> char {
    let index = (level.clamp(0.0, 1.0) * (LEVELS.len() - 1) as f32).round() as usize;
    LEVELS[index.min(LEVELS.len() - 1)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_glyph_bounds() {
        assert_eq!(level_glyph(0.0), '▁');
        assert_eq!(level_glyph(1.0), '█');
        assert_eq!(level_glyph(-3.0), '▁');
        assert_eq!(level_glyph(f32::INFINITY), '█');
    }

    #[test]
    fn test_term_color_drops_alpha() {
        assert_eq!(term_color(TrackColor::rgba(1, 2, 3, 4)), Color::Rgb(1, 2, 3));
    }
}
