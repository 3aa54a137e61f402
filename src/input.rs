//! Input handling with DAS (Delayed Auto Shift) and ARR (Auto Repeat Rate)
//!
//! Uses a polling-based approach that doesn't rely on key release events,
//! which are unreliable on Linux terminals. Soft drop is a held state that
//! the frame loop re-asserts every tick.

use crate::game::Action;
use crate::settings::Settings;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, ModifierKeyCode};
use std::time::{Duration, Instant};

/// Time after which we consider a key "released" if no repeat received
const KEY_TIMEOUT: Duration = Duration::from_millis(100);

/// Something the player asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Game(Action),
    NextTileset,
    PrevTileset,
}

/// Input handler with DAS/ARR support
pub struct InputHandler {
    /// Held state of the movement keys
    left_state: Option<KeyPressState>,
    right_state: Option<KeyPressState>,
    /// Last time a soft drop key was seen
    down_seen: Option<Instant>,
    /// Key bindings
    bindings: KeyBindings,
    /// DAS duration
    das: Duration,
    /// ARR duration
    arr: Duration,
}

#[derive(Debug, Clone)]
struct KeyPressState {
    first_press: Instant,
    last_seen: Instant,
    das_triggered: bool,
    last_arr: Option<Instant>,
}

impl KeyPressState {
    fn new(now: Instant) -> Self {
        Self {
            first_press: now,
            last_seen: now,
            das_triggered: false,
            last_arr: None,
        }
    }
}

/// Key bindings configuration - supports multiple keys per action
#[derive(Debug, Clone)]
pub struct KeyBindings {
    pub move_left: Vec<KeyCode>,
    pub move_right: Vec<KeyCode>,
    pub rotate_forward: Vec<KeyCode>,
    pub rotate_backward: Vec<KeyCode>,
    pub soft_drop: Vec<KeyCode>,
    pub pause: Vec<KeyCode>,
    pub quit: Vec<KeyCode>,
    pub next_tileset: Vec<KeyCode>,
    pub prev_tileset: Vec<KeyCode>,
}

impl KeyBindings {
    /// Parse a key string into KeyCode
    pub fn parse_key(s: &str) -> Option<KeyCode> {
        let lower = s.to_lowercase();
        let code = match lower.as_str() {
            "left" => KeyCode::Left,
            "right" => KeyCode::Right,
            "up" => KeyCode::Up,
            "down" => KeyCode::Down,
            "space" => KeyCode::Char(' '),
            "enter" => KeyCode::Enter,
            "tab" => KeyCode::Tab,
            "esc" | "escape" => KeyCode::Esc,
            "shift" | "lshift" => KeyCode::Modifier(ModifierKeyCode::LeftShift),
            "ctrl" | "control" | "lctrl" => KeyCode::Modifier(ModifierKeyCode::LeftControl),
            "alt" => KeyCode::Modifier(ModifierKeyCode::LeftAlt),
            s => {
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => KeyCode::Char(c),
                    _ => return None,
                }
            }
        };
        Some(code)
    }

    /// Parse a list of key strings into KeyCodes, skipping unknown names
    fn parse_keys(keys: &[String]) -> Vec<KeyCode> {
        keys.iter()
            .filter_map(|s| {
                let code = Self::parse_key(s);
                if code.is_none() {
                    tracing::warn!(key = %s, "unknown key name in settings");
                }
                code
            })
            .collect()
    }

    /// Create keybindings from settings
    pub fn from_settings(settings: &Settings) -> Self {
        let keys = &settings.keys;
        Self {
            move_left: Self::parse_keys(&keys.move_left),
            move_right: Self::parse_keys(&keys.move_right),
            rotate_forward: Self::parse_keys(&keys.rotate_forward),
            rotate_backward: Self::parse_keys(&keys.rotate_backward),
            soft_drop: Self::parse_keys(&keys.soft_drop),
            pause: Self::parse_keys(&keys.pause),
            quit: Self::parse_keys(&keys.quit),
            next_tileset: Self::parse_keys(&keys.next_tileset),
            prev_tileset: Self::parse_keys(&keys.prev_tileset),
        }
    }
}

impl InputHandler {
    /// Create input handler from settings
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            left_state: None,
            right_state: None,
            down_seen: None,
            bindings: KeyBindings::from_settings(settings),
            das: Duration::from_millis(settings.gameplay.das_ms),
            arr: Duration::from_millis(settings.gameplay.arr_ms),
        }
    }

    /// Handle a key press event - returns immediate commands
    pub fn key_down(&mut self, key: KeyEvent) -> Vec<Command> {
        self.key_down_at(key, Instant::now())
    }

    fn key_down_at(&mut self, key: KeyEvent, now: Instant) -> Vec<Command> {
        let mut commands = Vec::new();

        // Handle Ctrl+C for quit
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            commands.push(Command::Game(Action::Quit));
            return commands;
        }

        let code = normalize_key(key.code);
        let b = &self.bindings;

        if b.move_left.contains(&code) {
            match &mut self.left_state {
                Some(state) => state.last_seen = now,
                None => {
                    commands.push(Command::Game(Action::MoveLeft));
                    self.left_state = Some(KeyPressState::new(now));
                }
            }
            // Cancel opposite direction
            self.right_state = None;
        } else if b.move_right.contains(&code) {
            match &mut self.right_state {
                Some(state) => state.last_seen = now,
                None => {
                    commands.push(Command::Game(Action::MoveRight));
                    self.right_state = Some(KeyPressState::new(now));
                }
            }
            self.left_state = None;
        } else if b.soft_drop.contains(&code) {
            self.down_seen = Some(now);
        } else if b.rotate_forward.contains(&code) {
            commands.push(Command::Game(Action::RotateForward));
        } else if b.rotate_backward.contains(&code) {
            commands.push(Command::Game(Action::RotateBackward));
        } else if b.pause.contains(&code) {
            commands.push(Command::Game(Action::Pause));
        } else if b.quit.contains(&code) {
            commands.push(Command::Game(Action::Quit));
        } else if b.next_tileset.contains(&code) {
            commands.push(Command::NextTileset);
        } else if b.prev_tileset.contains(&code) {
            commands.push(Command::PrevTileset);
        }

        commands
    }

    /// Handle a key release event (may not be called on Linux)
    pub fn key_up(&mut self, key: KeyEvent) {
        let code = normalize_key(key.code);

        if self.bindings.move_left.contains(&code) {
            self.left_state = None;
        } else if self.bindings.move_right.contains(&code) {
            self.right_state = None;
        } else if self.bindings.soft_drop.contains(&code) {
            self.down_seen = None;
        }
    }

    /// Update held keys and return repeat commands (call every frame)
    pub fn update(&mut self) -> Vec<Command> {
        self.update_at(Instant::now())
    }

    fn update_at(&mut self, now: Instant) -> Vec<Command> {
        let mut commands = Vec::new();

        // Check for timed-out keys (no recent key event = released)
        let expired = |seen: Instant| now.duration_since(seen) > KEY_TIMEOUT;
        if self.left_state.as_ref().is_some_and(|s| expired(s.last_seen)) {
            self.left_state = None;
        }
        if self.right_state.as_ref().is_some_and(|s| expired(s.last_seen)) {
            self.right_state = None;
        }
        if self.down_seen.is_some_and(expired) {
            self.down_seen = None;
        }

        let (das, arr) = (self.das, self.arr);

        if let Some(state) = &mut self.left_state {
            if process_das_arr(state, now, das, arr) {
                commands.push(Command::Game(Action::MoveLeft));
            }
        }
        if let Some(state) = &mut self.right_state {
            if process_das_arr(state, now, das, arr) {
                commands.push(Command::Game(Action::MoveRight));
            }
        }

        commands
    }

    /// Check if soft drop is currently held
    pub fn soft_drop_held(&self) -> bool {
        self.down_seen.is_some()
    }

    /// Clear all held keys (useful for pause/resume)
    pub fn clear(&mut self) {
        self.left_state = None;
        self.right_state = None;
        self.down_seen = None;
    }
}

/// Process DAS/ARR logic for a key state, returns true if should trigger action
fn process_das_arr(state: &mut KeyPressState, now: Instant, das: Duration, arr: Duration) -> bool {
    let held_duration = now.duration_since(state.first_press);

    if held_duration >= das {
        if !state.das_triggered {
            // First trigger after DAS
            state.das_triggered = true;
            state.last_arr = Some(now);
            return true;
        } else if let Some(last) = state.last_arr {
            if now.duration_since(last) >= arr {
                state.last_arr = Some(now);
                return true;
            }
        }
    }

    false
}

/// Normalize key codes for consistent handling
fn normalize_key(code: KeyCode) -> KeyCode {
    match code {
        KeyCode::Char(c) => KeyCode::Char(c.to_ascii_lowercase()),
        other => other,
    }
}
