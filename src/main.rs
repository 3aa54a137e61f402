//! TRIBLOCKS - falling color columns for the terminal
//!
//! Line up three or more blocks of one color to collapse them.

mod bag;
mod collapse;
mod game;
mod grid;
mod input;
mod matcher;
mod piece;
mod score;
mod settings;
mod tileset;
mod ui;

use clap::Parser;
use crossterm::{
    event::{
        self, Event, KeyEventKind, KeyboardEnhancementFlags, PopKeyboardEnhancementFlags,
        PushKeyboardEnhancementFlags,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use game::{Action, GameSession, GameState};
use input::{Command, InputHandler};
use ratatui::{Terminal, backend::CrosstermBackend};
use settings::Settings;
use std::{
    io::{self, stdout},
    path::PathBuf,
    time::{Duration, Instant},
};
use tileset::TilesetSelector;
use ui::View;

/// Target frame rate
const TARGET_FPS: u64 = 60;
const FRAME_DURATION: Duration = Duration::from_micros(1_000_000 / TARGET_FPS);

/// Input delay after game over to prevent accidental exit
const GAME_OVER_INPUT_DELAY: Duration = Duration::from_secs(2);

/// Longest simulated step, so a stalled terminal does not teleport the piece
const MAX_FRAME_DT: f32 = 0.1;

/// Falling color columns in the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "triblocks",
    version,
    about = "Falling three-block columns: line up three or more of a color to collapse them."
)]
struct Args {
    /// Seed for the piece colors, for a replayable game
    #[arg(long, value_name = "N")]
    seed: Option<u64>,

    /// Tileset to start with (Default, Shiny, Animals, Doom)
    #[arg(short, long, value_name = "NAME")]
    tileset: Option<String>,

    /// Resolve cascades at once instead of pausing after each collapse
    #[arg(long)]
    instant_collapse: bool,

    /// Settings file to use instead of the platform config location
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Write the effective settings back to the settings file
    #[arg(long)]
    write_config: bool,
}

/// Get the triblocks temp directory, creating it if needed
fn triblocks_temp_dir() -> PathBuf {
    let dir = std::env::temp_dir().join("triblocks");
    let _ = std::fs::create_dir_all(&dir);
    dir
}

fn load_settings(args: &Args) -> Settings {
    let mut settings = match &args.config {
        Some(path) => Settings::load_or_default(path),
        None => Settings::load(),
    };
    if let Some(name) = &args.tileset {
        settings.visual.tileset = name.clone();
    }
    if args.instant_collapse {
        settings.gameplay.collapse_delay_ms = 0;
    }
    settings
}

fn main() -> io::Result<()> {
    let args = Args::parse();

    // Generate session ID for this instance
    let session_id: u32 = rand::random();
    let log_dir = triblocks_temp_dir();
    let log_file = format!("{:08x}.log", session_id);

    // Setup tracing to log file
    let file_appender = tracing_appender::rolling::never(&log_dir, &log_file);
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("triblocks=debug".parse().map_err(io::Error::other)?),
        )
        .with_ansi(false)
        .init();

    tracing::info!(
        "TRIBLOCKS starting up, session={:08x}, log={}",
        session_id,
        log_dir.join(&log_file).display()
    );

    let settings = load_settings(&args);

    if args.write_config {
        let saved = match &args.config {
            Some(path) => settings.save_to(path).map(|_| path.clone()),
            None => settings.save(),
        };
        match saved {
            Ok(path) => println!("Settings written to {}", path.display()),
            Err(e) => eprintln!("Warning: Could not save settings: {}", e),
        }
    }

    let config = settings.gameplay.game_config();
    let game = match args.seed {
        Some(seed) => GameSession::with_seed(config, seed),
        None => GameSession::new(config),
    };
    let view = View::new(&settings, TilesetSelector::by_name(&settings.visual.tileset));
    let input = InputHandler::from_settings(&settings);

    // Setup terminal
    enable_raw_mode()?;
    execute!(stdout(), EnterAlternateScreen)?;
    // Modifier keys (Shift, Ctrl) are only reported with enhanced keyboard support
    let _ = execute!(
        stdout(),
        PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_ALL_KEYS_AS_ESCAPE_CODES)
    );

    let backend = CrosstermBackend::new(stdout());
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    // Run app and capture result
    let result = run_app(&mut terminal, game, view, input, &settings);

    // Restore terminal
    let _ = execute!(stdout(), PopKeyboardEnhancementFlags);
    disable_raw_mode()?;
    execute!(stdout(), LeaveAlternateScreen)?;

    // Print final message
    if let Ok(game) = &result {
        let hud = game.snapshot();
        if hud.state == GameState::GameOver {
            println!("GAME OVER! Final score: {}", hud.score);
        } else {
            println!("Final score: {}", hud.score);
        }
        println!(
            "Best combo: {} | Collapses: {} | Blocks cleared: {}",
            hud.best_combo,
            hud.collapses,
            hud.cells_cleared
        );
        tracing::info!(score = hud.score, speed = game.speed(), "session finished");
    }

    result.map(|_| ())
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    mut game: GameSession,
    mut view: View,
    mut input: InputHandler,
    settings: &Settings,
) -> io::Result<GameSession> {
    let difficulty_interval =
        Duration::from_secs(settings.gameplay.difficulty_interval_secs.max(1));
    let mut last_frame = Instant::now();
    let mut last_difficulty = Instant::now();
    let mut game_over_time: Option<Instant> = None;

    loop {
        terminal.draw(|frame| ui::render_game(frame, &game, &view))?;

        let mut commands = Vec::new();
        if event::poll(FRAME_DURATION)? {
            if let Event::Key(key) = event::read()? {
                match key.kind {
                    KeyEventKind::Release => input.key_up(key),
                    _ if game.state == GameState::GameOver => {
                        if game_over_time.is_some_and(|t| t.elapsed() >= GAME_OVER_INPUT_DELAY) {
                            return Ok(game);
                        }
                    }
                    _ => commands.extend(input.key_down(key)),
                }
            }
        }
        commands.extend(input.update());

        for command in commands {
            match command {
                Command::Game(Action::Quit) => {
                    tracing::info!("quit");
                    return Ok(game);
                }
                Command::Game(action) => game.process_action(action),
                Command::NextTileset => view.tileset.next(),
                Command::PrevTileset => view.tileset.prev(),
            }
        }
        if input.soft_drop_held() {
            game.process_action(Action::SoftDrop);
        }

        let now = Instant::now();
        let elapsed = now.duration_since(last_frame);
        let dt = elapsed.as_secs_f32().min(MAX_FRAME_DT);
        last_frame = now;

        match game.state {
            GameState::Playing => {
                if now.duration_since(last_difficulty) >= difficulty_interval {
                    game.tick_difficulty();
                    last_difficulty = now;
                }
                game.tick(dt);
                view.effects.push(game.drain_events());
                view.effects.update(dt);
            }
            GameState::Paused => {
                input.clear();
                // Difficulty does not advance while paused
                last_difficulty += elapsed;
            }
            GameState::GameOver => {
                if game_over_time.is_none() {
                    game_over_time = Some(now);
                }
                view.effects.update(dt);
            }
        }
    }
}
