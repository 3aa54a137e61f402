//! Tilesets: how each block color is drawn
//!
//! A tileset only affects rendering. It maps the six block colors to a two
//! column glyph and a terminal color.

use crate::grid::{COLOR_COUNT, Color as BlockColor};
use ratatui::style::{Color, Style};

const N: usize = COLOR_COUNT as usize;

/// Glyphs and colors for the six block colors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tileset {
    pub name: &'static str,
    glyphs: [&'static str; N],
    colors: [Color; N],
}

impl Tileset {
    /// Glyph and style for a block color
    pub fn tile(&self, color: BlockColor) -> (&'static str, Style) {
        let i = usize::from(color.value() - 1);
        (self.glyphs[i], Style::default().fg(self.colors[i]))
    }
}

const BASE_COLORS: [Color; N] = [
    Color::Red,
    Color::Green,
    Color::Blue,
    Color::Yellow,
    Color::Magenta,
    Color::Cyan,
];

/// Built-in tilesets, in cycling order
pub const TILESETS: [Tileset; 4] = [
    Tileset {
        name: "Default",
        glyphs: ["██"; N],
        colors: BASE_COLORS,
    },
    Tileset {
        name: "Shiny",
        glyphs: ["◆◆", "●●", "▲▲", "■■", "★★", "♥♥"],
        colors: [
            Color::LightRed,
            Color::LightGreen,
            Color::LightBlue,
            Color::LightYellow,
            Color::LightMagenta,
            Color::LightCyan,
        ],
    },
    Tileset {
        name: "Animals",
        glyphs: ["🐙", "🐸", "🐳", "🐥", "🦄", "🐟"],
        colors: BASE_COLORS,
    },
    Tileset {
        name: "Doom",
        glyphs: ["▓▓", "▒▒", "░░", "▚▚", "▞▞", "╬╬"],
        colors: [
            Color::Red,
            Color::Green,
            Color::DarkGray,
            Color::Yellow,
            Color::LightRed,
            Color::Gray,
        ],
    },
];

/// Currently selected tileset
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TilesetSelector {
    index: usize,
}

impl TilesetSelector {
    /// Select a tileset by name (case-insensitive), falling back to the first
    pub fn by_name(name: &str) -> Self {
        match TILESETS.iter().position(|t| t.name.eq_ignore_ascii_case(name)) {
            Some(index) => Self { index },
            None => {
                let available: Vec<_> = names().collect();
                tracing::warn!(name, ?available, "unknown tileset, using {}", TILESETS[0].name);
                Self::default()
            }
        }
    }

    pub fn current(&self) -> &'static Tileset {
        &TILESETS[self.index]
    }

    pub fn next(&mut self) {
        self.index = (self.index + 1) % TILESETS.len();
        tracing::debug!(tileset = self.current().name, "tileset selected");
    }

    pub fn prev(&mut self) {
        self.index = (self.index + TILESETS.len() - 1) % TILESETS.len();
        tracing::debug!(tileset = self.current().name, "tileset selected");
    }
}

/// Names of all built-in tilesets
pub fn names() -> impl Iterator<Item = &'static str> {
    TILESETS.iter().map(|t| t.name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_by_name() {
        assert_eq!(TilesetSelector::by_name("doom").current().name, "Doom");
        assert_eq!(TilesetSelector::by_name("Shiny").current().name, "Shiny");
        assert_eq!(TilesetSelector::by_name("missing").current().name, "Default");
    }

    #[test]
    fn test_cycle_wraps() {
        let mut selector = TilesetSelector::default();
        selector.prev();
        assert_eq!(selector.current().name, "Doom");
        selector.next();
        selector.next();
        assert_eq!(selector.current().name, "Shiny");
    }

    #[test]
    fn test_every_color_has_a_tile() {
        for tileset in &TILESETS {
            for color in BlockColor::all() {
                let (glyph, _) = tileset.tile(color);
                assert!(!glyph.is_empty());
            }
        }
        assert_eq!(names().count(), 4);
    }
}
