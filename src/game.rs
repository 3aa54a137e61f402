//! Core game state and logic

use crate::bag::Bag;
use crate::collapse::{ScoreEvent, collapse_step, resolve_phase};
use crate::grid::{Cell, Color, Grid, HEIGHT};
use crate::matcher::find_runs;
use crate::piece::{PIECE_HEIGHT, Piece, Rotation, SPAWN_LANE, SPEEDUP, Shift};
use crate::score::Score;

/// Row checked in the spawn lane for game over (second row from the top)
pub const GAME_OVER_ROW: usize = 1;

/// Gameplay tuning for a session
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GameConfig {
    /// Initial fall speed in field units per second
    pub base_speed: f32,
    /// Speed added while soft drop is held
    pub speedup: f32,
    /// Speed added on every difficulty tick
    pub speed_increment: f32,
    /// Pause after each collapse in seconds (0 resolves cascades at once)
    pub collapse_delay: f32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            base_speed: 75.0,
            speedup: SPEEDUP,
            speed_increment: 1.0,
            collapse_delay: 0.35,
        }
    }
}

/// Game state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameState {
    Playing,
    Paused,
    GameOver,
}

/// Where the session is within one piece's lifecycle
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Phase {
    /// The active piece is falling
    Falling,
    /// Collapses are being resolved; the next step runs when `wait` runs out
    Cascading { wait: f32 },
}

/// Input actions the game can process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    MoveLeft,
    MoveRight,
    RotateForward,
    RotateBackward,
    /// Soft drop for the current tick, repeated while the key is held
    SoftDrop,
    Pause,
    Quit,
}

/// Plain data for the HUD, polled each frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hud {
    pub score: u64,
    pub panic_level: u32,
    pub combo: u32,
    pub best_combo: u32,
    pub collapses: u32,
    pub cells_cleared: u32,
    pub state: GameState,
}

/// One game from first piece to game over
pub struct GameSession {
    /// The playing field
    pub grid: Grid,
    /// Falling piece, `None` while a cascade is resolving
    pub current_piece: Option<Piece>,
    /// Colors of the piece that spawns next
    pub next_colors: [Color; PIECE_HEIGHT],
    /// Color generator
    bag: Bag,
    /// Score tracking
    pub score: Score,
    pub state: GameState,
    pub phase: Phase,
    config: GameConfig,
    /// Current fall speed for new pieces
    speed: f32,
    /// Difficulty ticks so far
    difficulty_ticks: u32,
    /// Score events not yet taken by the presentation layer
    events: Vec<ScoreEvent>,
}

impl GameSession {
    /// Create a new session with a random seed
    pub fn new(config: GameConfig) -> Self {
        Self::with_seed(config, rand::random())
    }

    /// Create a new session with a fixed seed
    pub fn with_seed(config: GameConfig, seed: u64) -> Self {
        let mut bag = Bag::with_seed(seed);
        let first = bag.next();
        let next_colors = bag.next();
        let grid = Grid::new();

        let mut piece = Piece::new(first, config.base_speed);
        piece.boost = config.speedup;
        piece.spawn(&grid);

        tracing::info!(seed, "new game");

        Self {
            grid,
            current_piece: Some(piece),
            next_colors,
            bag,
            score: Score::new(),
            state: GameState::Playing,
            phase: Phase::Falling,
            config,
            speed: config.base_speed,
            difficulty_ticks: 0,
            events: Vec::new(),
        }
    }

    /// Process an action
    pub fn process_action(&mut self, action: Action) {
        match self.state {
            GameState::Paused => match action {
                Action::Pause => self.state = GameState::Playing,
                Action::Quit => self.state = GameState::GameOver,
                _ => {}
            },
            GameState::Playing => match action {
                Action::Pause => self.state = GameState::Paused,
                Action::Quit => self.state = GameState::GameOver,
                _ => self.steer(action),
            },
            GameState::GameOver => {}
        }
    }

    fn steer(&mut self, action: Action) {
        let Some(piece) = &mut self.current_piece else {
            return;
        };
        match action {
            Action::MoveLeft => {
                piece.shift(Shift::Left, &self.grid);
            }
            Action::MoveRight => {
                piece.shift(Shift::Right, &self.grid);
            }
            Action::RotateForward => piece.rotate(Rotation::Forward),
            Action::RotateBackward => piece.rotate(Rotation::Backward),
            Action::SoftDrop => piece.set_speedup(),
            Action::Pause | Action::Quit => {}
        }
    }

    /// Advance the simulation by `dt` seconds
    pub fn tick(&mut self, dt: f32) {
        if self.state != GameState::Playing {
            return;
        }

        match self.phase {
            Phase::Falling => {
                let locked = self
                    .current_piece
                    .as_mut()
                    .is_some_and(|piece| piece.advance(dt));
                if locked {
                    self.lock_piece();
                }
            }
            Phase::Cascading { wait } => {
                let wait = wait - dt;
                if wait > 0.0 {
                    self.phase = Phase::Cascading { wait };
                } else {
                    self.cascade_step();
                }
            }
        }

        if self.phase == Phase::Falling && self.is_topped_out() {
            tracing::info!(score = self.score.points, "game over");
            self.state = GameState::GameOver;
        }
    }

    /// Raise the fall speed, called by the external difficulty timer
    pub fn tick_difficulty(&mut self) {
        if self.state != GameState::Playing {
            return;
        }
        self.speed += self.config.speed_increment;
        self.difficulty_ticks += 1;
        tracing::debug!(speed = self.speed, panic = self.panic_level(), "difficulty up");
    }

    /// Difficulty indicator, starts at 1
    pub fn panic_level(&self) -> u32 {
        self.difficulty_ticks + 1
    }

    /// Fall speed the next piece will use
    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// Snapshot for the HUD
    pub fn snapshot(&self) -> Hud {
        Hud {
            score: self.score.points,
            panic_level: self.panic_level(),
            combo: self.score.combo,
            best_combo: self.score.best_combo,
            collapses: self.score.collapses,
            cells_cleared: self.score.cells_cleared,
            state: self.state,
        }
    }

    /// Take the score events produced since the last call
    pub fn drain_events(&mut self) -> Vec<ScoreEvent> {
        std::mem::take(&mut self.events)
    }

    /// Check if the spawn lane has reached the game-over row
    pub fn is_topped_out(&self) -> bool {
        self.grid.cell(SPAWN_LANE, GAME_OVER_ROW) != Cell::Empty
    }

    /// Write the landed piece into the field and start matching
    fn lock_piece(&mut self) {
        let Some(piece) = self.current_piece.take() else {
            return;
        };

        for (row, color) in piece.landing_rows().into_iter().zip(piece.colors) {
            if (0..HEIGHT as i32).contains(&row) {
                self.grid.set(piece.lane, row as usize, Cell::Filled(color));
            } else {
                tracing::warn!(lane = piece.lane, row, "segment landed above the field");
            }
        }
        tracing::debug!(
            lane = piece.lane,
            rows = ?piece.landing_rows(),
            height = self.grid.column_height(piece.lane),
            "piece locked"
        );

        self.score.reset_combo();

        if self.config.collapse_delay <= 0.0 {
            let report = resolve_phase(&mut self.grid, &mut self.score);
            self.events.extend(report.events);
            self.spawn_next();
        } else {
            self.cascade_step();
        }
    }

    /// Resolve one collapse, or spawn when no runs are left
    fn cascade_step(&mut self) {
        let runs = find_runs(&self.grid);
        if runs.is_empty() {
            self.spawn_next();
            return;
        }
        let events = collapse_step(&mut self.grid, &runs, &mut self.score);
        let amount: u64 = events.iter().map(|e| e.amount).sum();
        tracing::debug!(runs = runs.len(), combo = self.score.combo, amount, "collapse");
        self.events.extend(events);
        self.phase = Phase::Cascading {
            wait: self.config.collapse_delay,
        };
    }

    /// Promote the next piece and draw a new one
    fn spawn_next(&mut self) {
        let colors = std::mem::replace(&mut self.next_colors, self.bag.next());
        let mut piece = Piece::new(colors, self.speed);
        piece.boost = self.config.speedup;
        piece.spawn(&self.grid);
        tracing::debug!(colors = ?piece.colors, speed = self.speed, "spawn");
        self.current_piece = Some(piece);
        self.phase = Phase::Falling;
    }
}

impl Default for GameSession {
    fn default() -> Self {
        Self::new(GameConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::FLOOR_ROW;

    const DT: f32 = 1.0 / 40.0;

    fn instant() -> GameConfig {
        GameConfig {
            collapse_delay: 0.0,
            ..GameConfig::default()
        }
    }

    fn colors(a: u8, b: u8, c: u8) -> [Color; 3] {
        [a, b, c].map(|v| Color::new(v).unwrap())
    }

    /// Replace the active piece's colors
    fn set_piece(game: &mut GameSession, piece_colors: [Color; 3]) {
        game.current_piece.as_mut().unwrap().colors = piece_colors;
    }

    /// Tick until the active piece locks
    fn drop_piece(game: &mut GameSession) {
        for _ in 0..10_000 {
            let before = game.current_piece.as_ref().map(|p| p.pos_y);
            game.tick(DT);
            let after = game.current_piece.as_ref().map(|p| p.pos_y);
            if game.phase != Phase::Falling || after < before || game.state != GameState::Playing {
                return;
            }
        }
        panic!("piece never locked");
    }

    #[test]
    fn test_new_game() {
        let game = GameSession::with_seed(instant(), 1);
        assert_eq!(game.state, GameState::Playing);
        assert_eq!(game.phase, Phase::Falling);
        assert!(game.grid.is_empty());
        assert_eq!(game.snapshot().panic_level, 1);
        assert_eq!(game.current_piece.as_ref().unwrap().lane, SPAWN_LANE);
    }

    #[test]
    fn test_lock_writes_colors_top_first() {
        let mut game = GameSession::with_seed(instant(), 1);
        set_piece(&mut game, colors(1, 2, 3));
        drop_piece(&mut game);
        assert_eq!(game.grid.cell(2, FLOOR_ROW - 3), Cell::Filled(Color::new(1).unwrap()));
        assert_eq!(game.grid.cell(2, FLOOR_ROW - 2), Cell::Filled(Color::new(2).unwrap()));
        assert_eq!(game.grid.cell(2, FLOOR_ROW - 1), Cell::Filled(Color::new(3).unwrap()));
        assert_eq!(game.score.points, 0);
        assert!(game.current_piece.is_some());
    }

    #[test]
    fn test_single_color_piece_collapses() {
        let mut game = GameSession::with_seed(instant(), 1);
        set_piece(&mut game, colors(1, 1, 1));
        drop_piece(&mut game);
        assert_eq!(game.score.points, 300);
        assert!(game.grid.is_empty());

        let events = game.drain_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].text, "+300");
        assert_eq!((events[0].lane, events[0].row), (2, 16));
        assert!(game.drain_events().is_empty());
    }

    #[test]
    fn test_animated_cascade_matches_instant() {
        // The piece completes the 1s row, then its 2 drops onto the other two
        let setup = |config| {
            let mut game = GameSession::with_seed(config, 9);
            game.grid = Grid::from_rows(&[".11...", "234...", "256..."]);
            set_piece(&mut game, colors(3, 2, 1));
            game.process_action(Action::MoveLeft);
            game.process_action(Action::MoveLeft);
            game
        };

        let mut instant_game = setup(instant());
        drop_piece(&mut instant_game);
        assert_eq!(instant_game.score.points, 1500);
        assert_eq!(instant_game.grid, Grid::from_rows(&[".34...", "356..."]));

        let mut animated = setup(GameConfig::default());
        drop_piece(&mut animated);
        assert!(matches!(animated.phase, Phase::Cascading { .. }));
        assert_eq!(animated.score.points, 300);
        for _ in 0..400 {
            if animated.phase == Phase::Falling {
                break;
            }
            animated.tick(DT);
        }
        assert_eq!(animated.phase, Phase::Falling);
        assert_eq!(animated.grid, instant_game.grid);
        assert_eq!(animated.score.points, instant_game.score.points);
    }

    #[test]
    fn test_combo_resets_between_pieces() {
        let mut game = GameSession::with_seed(instant(), 3);
        set_piece(&mut game, colors(1, 1, 1));
        drop_piece(&mut game);
        set_piece(&mut game, colors(2, 2, 2));
        drop_piece(&mut game);
        assert_eq!(game.score.points, 600);
        assert_eq!(game.score.best_combo, 1);
    }

    #[test]
    fn test_shift_into_full_lane_rejected() {
        let mut game = GameSession::with_seed(instant(), 4);
        game.grid = Grid::from_rows(&["...1.."; 16]);
        game.current_piece.as_mut().unwrap().spawn(&game.grid);
        game.process_action(Action::MoveRight);
        assert_eq!(game.current_piece.as_ref().unwrap().lane, SPAWN_LANE);
        game.process_action(Action::MoveLeft);
        assert_eq!(game.current_piece.as_ref().unwrap().lane, SPAWN_LANE - 1);
    }

    #[test]
    fn test_rotate_actions() {
        let mut game = GameSession::with_seed(instant(), 5);
        set_piece(&mut game, colors(1, 2, 3));
        game.process_action(Action::RotateForward);
        assert_eq!(game.current_piece.as_ref().unwrap().colors, colors(2, 3, 1));
        game.process_action(Action::RotateBackward);
        game.process_action(Action::RotateBackward);
        assert_eq!(game.current_piece.as_ref().unwrap().colors, colors(3, 1, 2));
    }

    #[test]
    fn test_soft_drop_falls_faster() {
        let mut slow = GameSession::with_seed(instant(), 6);
        let mut fast = GameSession::with_seed(instant(), 6);
        fast.process_action(Action::SoftDrop);
        slow.tick(DT);
        fast.tick(DT);
        let slow_y = slow.current_piece.as_ref().unwrap().pos_y;
        let fast_y = fast.current_piece.as_ref().unwrap().pos_y;
        assert!(fast_y > slow_y);
    }

    #[test]
    fn test_pause_freezes_simulation() {
        let mut game = GameSession::with_seed(instant(), 7);
        game.process_action(Action::Pause);
        assert_eq!(game.state, GameState::Paused);
        let before = game.current_piece.as_ref().unwrap().pos_y;
        game.tick(1.0);
        game.tick_difficulty();
        game.process_action(Action::MoveLeft);
        let piece = game.current_piece.as_ref().unwrap();
        assert_eq!(piece.pos_y, before);
        assert_eq!(piece.lane, SPAWN_LANE);
        assert_eq!(game.panic_level(), 1);
        game.process_action(Action::Pause);
        assert_eq!(game.state, GameState::Playing);
    }

    #[test]
    fn test_difficulty_raises_speed_of_next_piece() {
        let mut game = GameSession::with_seed(instant(), 8);
        game.tick_difficulty();
        game.tick_difficulty();
        assert_eq!(game.panic_level(), 3);
        assert_eq!(game.speed(), 77.0);
        set_piece(&mut game, colors(1, 2, 3));
        drop_piece(&mut game);
        assert_eq!(game.current_piece.as_ref().unwrap().speed, 77.0);
    }

    /// Spawn lane stacked `height` cells high, alternating colors so nothing collapses
    fn spawn_lane_stack(height: usize) -> Grid {
        let rows: Vec<&str> = (0..height)
            .map(|i| if i % 2 == 0 { "..1..." } else { "..2..." })
            .collect();
        Grid::from_rows(&rows)
    }

    /// Lock a (3, 4, 3) piece onto a spawn lane stack of `height` cells
    fn lock_onto_stack(seed: u64, height: usize) -> GameSession {
        let mut game = GameSession::with_seed(instant(), seed);
        game.grid = spawn_lane_stack(height);
        game.current_piece.as_mut().unwrap().spawn(&game.grid);
        set_piece(&mut game, colors(3, 4, 3));
        drop_piece(&mut game);
        game
    }

    #[test]
    fn test_game_over_when_spawn_lane_reaches_top() {
        let game = lock_onto_stack(10, 15);
        assert!(game.is_topped_out());
        assert_eq!(game.state, GameState::GameOver);
        assert_eq!(game.snapshot().state, GameState::GameOver);
    }

    #[test]
    fn test_game_over_once_second_row_is_filled() {
        let game = lock_onto_stack(13, 14);
        assert_eq!(game.state, GameState::GameOver);
        assert_eq!(
            game.grid.cell(SPAWN_LANE, GAME_OVER_ROW),
            Cell::Filled(Color::new(3).unwrap())
        );
        assert_eq!(game.grid.cell(SPAWN_LANE, 0), Cell::Empty);
        assert_eq!(game.grid.column_height(SPAWN_LANE), 17);
    }

    #[test]
    fn test_still_playing_with_third_row_filled() {
        let game = lock_onto_stack(14, 13);
        assert_eq!(game.state, GameState::Playing);
        assert!(!game.grid.cell(SPAWN_LANE, GAME_OVER_ROW + 1).is_empty());
        assert_eq!(game.grid.cell(SPAWN_LANE, GAME_OVER_ROW), Cell::Empty);
        assert_eq!(game.grid.column_height(SPAWN_LANE), 16);
    }

    #[test]
    fn test_no_game_over_below_top() {
        let game = lock_onto_stack(11, 12);
        assert_eq!(game.state, GameState::Playing);
        assert_eq!(game.grid.column_height(2), 15);
    }

    #[test]
    fn test_quit_ends_game() {
        let mut game = GameSession::with_seed(instant(), 12);
        game.process_action(Action::Quit);
        assert_eq!(game.state, GameState::GameOver);
    }
}
