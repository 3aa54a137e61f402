//! Terminal UI rendering with ratatui

use crate::collapse::ScoreEvent;
use crate::game::{GAME_OVER_ROW, GameSession, GameState};
use crate::grid::{Cell, HEIGHT, WIDTH};
use crate::piece::CELL;
use crate::settings::Settings;
use crate::tileset::TilesetSelector;
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
};
use std::collections::VecDeque;

const EMPTY: &str = "  ";
const TARGET: &str = "::";

/// Controls(30) + board(14) + next/stats(22)
const GAME_WIDTH: u16 = 66;
/// Field rows plus borders
const GAME_HEIGHT: u16 = HEIGHT as u16 + 2;
const BOARD_WIDTH: u16 = WIDTH as u16 * 2 + 2;

/// How long a floating score text stays up, in seconds
const POPUP_SECS: f32 = 1.0;
/// Rise speed of floating texts, in rows per second
const POPUP_RISE: f32 = 75.0 / CELL;
/// How long a score stays in the recent list, in seconds
const RECENT_SECS: f32 = 3.0;

/// Score text floating up from the cells it was scored on
#[derive(Debug, Clone, PartialEq)]
pub struct FloatingText {
    pub text: String,
    pub lane: usize,
    pub row: f32,
    /// Scored during a combo
    pub highlight: bool,
    age: f32,
}

/// Short-lived score feedback
#[derive(Debug, Default)]
pub struct Effects {
    pub floating: Vec<FloatingText>,
    /// Recent score texts, newest first, with their age
    pub recent: VecDeque<(String, f32)>,
}

impl Effects {
    pub fn push(&mut self, events: Vec<ScoreEvent>) {
        for event in events {
            self.recent.push_front((event.text.clone(), 0.0));
            self.floating.push(FloatingText {
                text: event.text,
                lane: event.lane,
                row: event.row as f32,
                highlight: event.combo > 0,
                age: 0.0,
            });
        }
    }

    /// Age every effect by `dt` seconds, dropping expired ones
    pub fn update(&mut self, dt: f32) {
        for text in &mut self.floating {
            text.age += dt;
            text.row -= POPUP_RISE * dt;
        }
        self.floating.retain(|text| text.age < POPUP_SECS);

        for (_, age) in &mut self.recent {
            *age += dt;
        }
        self.recent.retain(|(_, age)| *age < RECENT_SECS);
    }
}

/// Presentation state that lives outside the game session
pub struct View {
    pub tileset: TilesetSelector,
    pub show_target: bool,
    pub effects: Effects,
    controls: Vec<(String, &'static str)>,
}

impl View {
    pub fn new(settings: &Settings, tileset: TilesetSelector) -> Self {
        let keys = &settings.keys;
        let controls = [
            (format!("{} {}", keys.move_left.join("/"), keys.move_right.join("/")), "Move block"),
            (keys.rotate_forward.join("/"), "Rotate block"),
            (keys.rotate_backward.join("/"), "Rotate back"),
            (keys.soft_drop.join("/"), "Accelerate"),
            (keys.pause.join("/"), "Pause/unpause game"),
            (
                format!("{} {}", keys.next_tileset.join("/"), keys.prev_tileset.join("/")),
                "Select tileset",
            ),
            (keys.quit.join("/"), "Quit"),
        ];
        Self {
            tileset,
            show_target: settings.visual.show_target,
            effects: Effects::default(),
            controls: controls.into_iter().collect(),
        }
    }
}

/// Render the game screen
pub fn render_game(frame: &mut Frame, game: &GameSession, view: &View) {
    let area = frame.area();
    let game_area = center_rect(area, GAME_WIDTH, GAME_HEIGHT);

    // Create main layout: controls | board | next + stats
    let main_layout = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(30),
            Constraint::Length(BOARD_WIDTH),
            Constraint::Length(22),
        ])
        .split(game_area);

    render_controls(frame, main_layout[0], view);
    let board = render_board(frame, main_layout[1], game, view);

    let right_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(5), Constraint::Min(8)])
        .split(main_layout[2]);

    render_next(frame, right_layout[0], game, view);
    render_stats(frame, right_layout[1], game, view);
    render_floating(frame, board, view);

    match game.state {
        GameState::Paused => render_overlay(frame, area, "PAUSED", "Press P to resume"),
        GameState::GameOver => {
            let subtitle = format!("Final score: {}", game.score.points);
            render_overlay(frame, area, "GAME OVER!", &subtitle);
        }
        GameState::Playing => {}
    }
}

/// Center a rect within another rect
fn center_rect(area: Rect, width: u16, height: u16) -> Rect {
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect {
        x,
        y,
        width: width.min(area.width),
        height: height.min(area.height),
    }
}

fn render_controls(frame: &mut Frame, area: Rect, view: &View) {
    let block = Block::default()
        .title(" CONTROLS ")
        .title_alignment(Alignment::Center)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Gray));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut lines = Vec::new();
    for (keys, label) in &view.controls {
        lines.push(Line::from(Span::styled(keys.clone(), Style::default().fg(Color::Magenta))));
        lines.push(Line::from(Span::styled(
            format!("  {}", label),
            Style::default().fg(Color::Gray),
        )));
    }

    frame.render_widget(Paragraph::new(lines), inner);
}

/// Render the playing field, returns its inner area
fn render_board(frame: &mut Frame, area: Rect, game: &GameSession, view: &View) -> Rect {
    let tileset = view.tileset.current();
    let block = Block::default()
        .title(" TRIBLOCKS ")
        .title_alignment(Alignment::Center)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::White));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let piece = game.current_piece.as_ref();
    let segments = piece.map(|p| p.segments());
    let target = piece
        .filter(|_| view.show_target)
        .map(|p| (p.lane, p.landing_rows()));

    let mut lines: Vec<Line> = Vec::with_capacity(HEIGHT);
    for (row, cells) in game.grid.rows() {
        let mut spans = Vec::with_capacity(WIDTH);
        for (col, cell) in cells.iter().enumerate() {
            let falling = segments.and_then(|segments| {
                segments
                    .into_iter()
                    .find(|&(lane, y, _)| lane == col && y.round() as i32 == row as i32)
                    .map(|(_, _, color)| color)
            });
            let is_target = target
                .is_some_and(|(lane, rows)| lane == col && rows.contains(&(row as i32)));

            let (text, style) = match (falling, cell) {
                (Some(color), _) => tileset.tile(color),
                (None, Cell::Filled(color)) => tileset.tile(*color),
                (None, _) if is_target => (TARGET, Style::default().fg(Color::DarkGray)),
                // Danger zone: the spawn lane filling this high ends the game
                (None, _) if row <= GAME_OVER_ROW => {
                    (EMPTY, Style::default().bg(Color::Indexed(52)))
                }
                (None, _) => (EMPTY, Style::default()),
            };
            spans.push(Span::styled(text, style));
        }
        lines.push(Line::from(spans));
    }

    frame.render_widget(Paragraph::new(lines), inner);
    inner
}

/// Render the next piece preview
fn render_next(frame: &mut Frame, area: Rect, game: &GameSession, view: &View) {
    let block = Block::default()
        .title(" NEXT ")
        .title_alignment(Alignment::Center)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Gray));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let tileset = view.tileset.current();
    let lines: Vec<Line> = game
        .next_colors
        .iter()
        .map(|&color| {
            let (text, style) = tileset.tile(color);
            Line::from(Span::styled(text, style))
        })
        .collect();

    frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), inner);
}

/// Render stats panel
fn render_stats(frame: &mut Frame, area: Rect, game: &GameSession, view: &View) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Gray));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let hud = game.snapshot();
    let label =
        |text: &'static str| Line::from(Span::styled(text, Style::default().fg(Color::Gray)));

    let mut lines = vec![
        Line::from(Span::styled(
            format!("Score: {}", hud.score),
            Style::default().fg(Color::Yellow).bold(),
        )),
        Line::from(Span::styled(
            format!("PANIC: {}", hud.panic_level),
            Style::default().fg(Color::Red).bold(),
        )),
        Line::from(Span::styled(
            if hud.combo > 0 { format!("Combo: {}", hud.combo) } else { String::new() },
            Style::default().fg(Color::Magenta),
        )),
        label("BEST COMBO"),
        Line::from(Span::styled(
            format!("{}", hud.best_combo),
            Style::default().fg(Color::Cyan),
        )),
        label("CLEARED"),
        Line::from(Span::styled(
            format!("{}", hud.cells_cleared),
            Style::default().fg(Color::Green),
        )),
        label("TILESET"),
        Line::from(Span::styled(view.tileset.current().name, Style::default().fg(Color::Cyan))),
    ];

    if !view.effects.recent.is_empty() {
        lines.push(Line::raw(""));
        for (text, _) in &view.effects.recent {
            lines.push(Line::styled(text.clone(), Style::default().fg(Color::Magenta).bold()));
        }
    }

    frame.render_widget(Paragraph::new(lines), inner);
}

/// Draw floating score texts over the field
fn render_floating(frame: &mut Frame, board: Rect, view: &View) {
    let screen = frame.area();
    for text in &view.effects.floating {
        let row = text.row.round();
        if row < 0.0 || row >= board.height as f32 {
            continue;
        }
        let rect = Rect {
            x: board.x + text.lane as u16 * 2,
            y: board.y + row as u16,
            width: text.text.chars().count() as u16,
            height: 1,
        }
        .intersection(screen);
        if rect.is_empty() {
            continue;
        }
        let color = if text.highlight { Color::Yellow } else { Color::White };
        let line = Line::styled(text.text.as_str(), Style::default().fg(color).bold());
        frame.render_widget(Paragraph::new(line), rect);
    }
}

/// Render an overlay (for pause/game over)
fn render_overlay(frame: &mut Frame, area: Rect, title: &str, subtitle: &str) {
    let popup_width = 28u16;
    let popup_height = 5u16;
    let popup_area = center_rect(area, popup_width, popup_height);

    // Clear the background
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .style(Style::default().bg(Color::Black));

    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let text = vec![
        Line::styled(title, Style::default().fg(Color::Yellow).bold()),
        Line::raw(""),
        Line::styled(subtitle, Style::default().fg(Color::Gray)),
    ];

    let paragraph = Paragraph::new(text).alignment(Alignment::Center);
    frame.render_widget(paragraph, inner);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{Action, GameConfig};
    use ratatui::{Terminal, backend::TestBackend};

    fn event(text: &str) -> ScoreEvent {
        ScoreEvent {
            text: text.to_string(),
            lane: 2,
            row: 16,
            amount: 300,
            combo: 0,
        }
    }

    fn screen_text(game: &GameSession, view: &View) -> String {
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        terminal.draw(|frame| render_game(frame, game, view)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn test_floating_text_rises_and_expires() {
        let mut effects = Effects::default();
        effects.push(vec![event("+300")]);
        effects.update(0.5);
        assert_eq!(effects.floating.len(), 1);
        assert!(effects.floating[0].row < 16.0);

        effects.update(0.6);
        assert!(effects.floating.is_empty());
        assert_eq!(effects.recent.len(), 1);

        effects.update(2.0);
        assert!(effects.recent.is_empty());
    }

    #[test]
    fn test_recent_newest_first() {
        let mut effects = Effects::default();
        effects.push(vec![event("+300")]);
        effects.push(vec![event("2 combo! +1200")]);
        assert_eq!(effects.recent[0].0, "2 combo! +1200");
    }

    #[test]
    fn test_render_hud() {
        let game = GameSession::with_seed(GameConfig::default(), 1);
        let view = View::new(&Settings::default(), TilesetSelector::default());
        let text = screen_text(&game, &view);
        assert!(text.contains("Score: 0"));
        assert!(text.contains("PANIC: 1"));
        assert!(text.contains("Move block"));
        assert!(text.contains("NEXT"));
    }

    #[test]
    fn test_render_overlays() {
        let mut game = GameSession::with_seed(GameConfig::default(), 1);
        let view = View::new(&Settings::default(), TilesetSelector::default());
        game.process_action(Action::Pause);
        assert!(screen_text(&game, &view).contains("PAUSED"));
        game.process_action(Action::Quit);
        assert!(screen_text(&game, &view).contains("Final score: 0"));
    }
}
