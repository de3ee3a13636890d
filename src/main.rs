//! scoreworks - show a quiz score in the terminal, with fireworks for high scores
//!
//! Score results arrive as JSON lines on stdin, for example
//! `{"type":"H5P_SCORE_RESULT","score":95,"maxScore":100}`.

use anyhow::{Result, bail};
use clap::Parser;
use crossterm::terminal;
use glam::Vec2;
use std::io::{BufRead, IsTerminal};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

mod app;
mod config;
mod error;
mod firework;
mod particle;
mod render;
mod scene;
mod score;

use app::App;
use config::SimConfig;
use score::ScoreResult;

/// Terminal score display with a fireworks celebration
#[derive(Parser, Debug)]
#[command(name = "scoreworks")]
#[command(about = "Terminal score display with a fireworks celebration", long_about = None)]
#[command(after_help = "Press 't' for a test score. 'q', ESC, or Ctrl+C exits.")]
struct Cli {
    /// Preset score, shown until a message replaces it
    #[arg(long, requires = "max_score")]
    score: Option<f64>,

    /// Maximum score for --score
    #[arg(long)]
    max_score: Option<f64>,

    /// Apply one raw JSON score message at startup
    #[arg(long)]
    message: Option<String>,

    /// Don't read score messages from stdin
    #[arg(long)]
    no_stdin: bool,

    /// Only accept messages whose "origin" field matches
    #[arg(long)]
    allowed_origin: Option<String>,

    /// Chance per frame of launching a firework while the score is excellent
    #[arg(long, default_value_t = 0.05)]
    spawn_chance: f32,

    /// Downward pull on every particle, in world pixels per tick squared
    #[arg(long, default_value_t = 0.2)]
    gravity: f32,

    /// Fragments per burst
    #[arg(long, default_value_t = 100)]
    fragments: usize,

    /// Simulation steps per second
    #[arg(long, default_value_t = 60)]
    fps: u32,

    /// Background color as hex (e.g. 1a1b26)
    #[arg(long, value_name = "RRGGBB", value_parser = parse_bg_color)]
    bg_color: Option<(u8, u8, u8)>,

    /// Seed for a reproducible show
    #[arg(long)]
    seed: Option<u64>,

    /// Log file (defaults to scoreworks.log in the temp directory)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn parse_bg_color(hex: &str) -> Result<(u8, u8, u8), String> {
    config::parse_hex_color(hex)
        .ok_or_else(|| format!("invalid hex color '{hex}', expected RRGGBB (e.g. 1a1b26)"))
}

impl Cli {
    fn sim_config(&self) -> Result<SimConfig> {
        if !(0.0..=1.0).contains(&self.spawn_chance) {
            bail!("--spawn-chance must be between 0 and 1");
        }
        if self.gravity <= 0.0 {
            bail!("--gravity must be positive, or rockets never reach their apex");
        }
        Ok(SimConfig {
            gravity: Vec2::new(0.0, self.gravity),
            spawn_chance: self.spawn_chance,
            fragment_count: self.fragments,
            ..SimConfig::default()
        })
    }
}

/// INFO unless `directives` (the value of RUST_LOG) says otherwise
fn log_filter(directives: Option<&str>) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .parse_lossy(directives.unwrap_or_default())
}

/// Log to a file; the terminal belongs to the animation
fn init_logging(path: &Path) {
    let directives = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = log_filter(directives.as_deref());

    match std::fs::File::create(path) {
        Ok(file) => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::sync::Mutex::new(file))
            .with_ansi(false)
            .init(),
        Err(_) => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::sink)
            .init(),
    }
}

/// Restore terminal state - called on panic
fn restore_terminal() {
    use crossterm::{cursor::Show, execute, terminal::LeaveAlternateScreen};
    let _ = terminal::disable_raw_mode();
    let _ = execute!(std::io::stdout(), Show, LeaveAlternateScreen);
}

/// Forward stdin lines to the frame loop, which owns all score state
fn listen_stdin() -> Result<Receiver<String>> {
    let (tx, rx) = mpsc::channel();
    std::thread::Builder::new()
        .name("score-listener".to_string())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                if tx.send(line).is_err() {
                    break;
                }
            }
        })?;
    Ok(rx)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = cli.sim_config()?;

    let log_path = cli
        .log_file
        .clone()
        .unwrap_or_else(|| std::env::temp_dir().join("scoreworks.log"));
    init_logging(&log_path);

    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        restore_terminal();
        original_hook(panic_info);
    }));

    tracing::info!(
        spawn_chance = config.spawn_chance,
        gravity = config.gravity.y,
        fragments = config.fragment_count,
        fragment_ticks = config.fragment_ticks(),
        fps = cli.fps,
        "Starting scoreworks"
    );

    let rng = match cli.seed {
        Some(seed) => fastrand::Rng::with_seed(seed),
        None => fastrand::Rng::new(),
    };
    let (cols, rows) = terminal::size()?;
    let mut app = App::new(
        cols as usize,
        rows as usize,
        config,
        rng,
        cli.bg_color.unwrap_or((0, 0, 0)),
        cli.allowed_origin.clone(),
    );

    if let (Some(score), Some(max_score)) = (cli.score, cli.max_score) {
        app.record(&ScoreResult { score, max_score });
    }
    if let Some(message) = &cli.message {
        if !app.handle_message(message) {
            tracing::warn!("--message was not a usable score message");
        }
    }

    // Reading stdin while it is the terminal would steal key presses
    let messages = if cli.no_stdin || std::io::stdin().is_terminal() {
        None
    } else {
        Some(listen_stdin()?)
    };

    app::run(&mut app, messages, cli.fps)?;

    tracing::info!(
        score = %app.board().fraction(),
        active = app.scene().fireworks().len(),
        "Exiting"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_filter_defaults_to_info() {
        assert_eq!(log_filter(None).max_level_hint(), Some(LevelFilter::INFO));
        assert_eq!(log_filter(Some("")).max_level_hint(), Some(LevelFilter::INFO));
    }

    #[test]
    fn test_log_filter_honors_rust_log() {
        assert_eq!(log_filter(Some("debug")).max_level_hint(), Some(LevelFilter::DEBUG));
        assert_eq!(log_filter(Some("warn")).max_level_hint(), Some(LevelFilter::WARN));
        assert_eq!(
            log_filter(Some("scoreworks=trace")).max_level_hint(),
            Some(LevelFilter::TRACE)
        );
    }

    #[test]
    fn test_cli_rejects_bad_tuning() {
        let cli = Cli::parse_from(["scoreworks", "--spawn-chance", "1.5"]);
        assert!(cli.sim_config().is_err());
        let cli = Cli::parse_from(["scoreworks", "--gravity", "0"]);
        assert!(cli.sim_config().is_err());
        let cli = Cli::parse_from(["scoreworks", "--fragments", "20"]);
        assert_eq!(cli.sim_config().unwrap().fragment_count, 20);
    }
}
