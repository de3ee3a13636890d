//! Application state and the terminal frame loop.

use crate::config::SimConfig;
use crate::render::{Canvas, Rgb, hue_to_rgb};
use crate::scene::Scene;
use crate::score::{ScoreBoard, ScoreResult};
use crossterm::{
    cursor::{Hide, Show},
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen},
};
use std::io::{BufWriter, Write, stdout};
use std::sync::mpsc::{Receiver, TryRecvError};
use std::time::{Duration, Instant};

const WHITE: Rgb = (255, 255, 255);

/// Everything that changes while the program runs.
///
/// Score messages and frame ticks are the only two ways in; both run on the
/// thread that owns the `App`.
pub struct App {
    board: ScoreBoard,
    scene: Scene,
    canvas: Canvas,
    allowed_origin: Option<String>,
}

impl App {
    /// `cols` x `rows` terminal cells, rendered as `cols` x `rows * 2` pixels.
    pub fn new(
        cols: usize,
        rows: usize,
        config: SimConfig,
        rng: fastrand::Rng,
        background: Rgb,
        allowed_origin: Option<String>,
    ) -> Self {
        let scale = config.scale_for(rows * 2);
        let canvas = Canvas::new(cols, rows * 2, scale, background);
        let (width, height) = canvas.world_size();
        Self {
            board: ScoreBoard::default(),
            scene: Scene::new(width, height, config, rng),
            canvas,
            allowed_origin,
        }
    }

    /// Apply a raw score message. Anything unrecognized is dropped.
    pub fn handle_message(&mut self, raw: &str) -> bool {
        match ScoreResult::decode(raw, self.allowed_origin.as_deref()) {
            Ok(result) => {
                self.record(&result);
                true
            }
            Err(e @ crate::error::MessageError::UntrustedOrigin(_)) => {
                tracing::warn!("Ignoring score message: {}", e);
                false
            }
            Err(e) => {
                tracing::debug!("Ignoring message: {}", e);
                false
            }
        }
    }

    pub fn record(&mut self, result: &ScoreResult) {
        self.board.record(result);
        tracing::info!(
            "Score received: {} ({:.1}%)",
            self.board.fraction(),
            self.board.percentage()
        );
    }

    /// Returns false when the user asked to quit.
    pub fn handle_event(&mut self, event: &Event) -> bool {
        match event {
            Event::Key(key) if key.kind != KeyEventKind::Release => match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return false,
                KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                    return false;
                }
                KeyCode::Char('t') | KeyCode::Char('T') => {
                    self.board.manual_test();
                    tracing::info!("Manual test mode enabled");
                }
                _ => {}
            },
            Event::Resize(cols, rows) => self.resize(*cols as usize, *rows as usize),
            _ => {}
        }
        true
    }

    pub fn resize(&mut self, cols: usize, rows: usize) {
        let scale = self.scene.config().scale_for(rows * 2);
        self.canvas = Canvas::new(cols, rows * 2, scale, self.canvas.background());
        let (width, height) = self.canvas.world_size();
        self.scene.resize(width, height);
        let bounds = self.scene.bounds();
        tracing::debug!(cols, rows, width = bounds.x, height = bounds.y, "Resized");
    }

    /// One simulation step.
    pub fn tick(&mut self) {
        let celebrating = self.board.tier(self.scene.config()).celebrates();
        self.scene.tick(celebrating);

        self.canvas.fade(self.scene.config().trail_fade);
        for firework in self.scene.fireworks() {
            self.canvas.draw_firework(firework);
        }
    }

    pub fn render<W: Write>(&mut self, out: &mut W) -> std::io::Result<()> {
        let frame = self.canvas.encode()?;
        out.write_all(frame)?;

        let tier = self.board.tier(self.scene.config());
        let middle = self.canvas.height().div_ceil(2) / 2;
        match tier.headline() {
            Some(headline) => {
                let color = tier.hue().map_or(WHITE, hue_to_rgb);
                self.canvas
                    .overlay_text(out, middle.saturating_sub(2), headline, color)?;
            }
            None => {
                self.canvas
                    .overlay_text(out, middle, &self.board.status, WHITE)?;
            }
        }
        let score_line = format!("Score: {}", self.board.fraction());
        self.canvas.overlay_text(out, middle + 2, &score_line, WHITE)?;

        out.flush()
    }

    pub fn board(&self) -> &ScoreBoard {
        &self.board
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }
}

/// Drive `app` at a fixed simulation rate until the user quits.
///
/// Raw score messages arriving on `messages` are applied at the start of
/// each frame.
pub fn run(app: &mut App, messages: Option<Receiver<String>>, fps: u32) -> anyhow::Result<()> {
    let stdout = stdout();
    let mut stdout = BufWriter::with_capacity(1024 * 64, stdout);

    terminal::enable_raw_mode()?;
    execute!(stdout, EnterAlternateScreen, Hide, Clear(ClearType::All))?;

    let result = frame_loop(app, messages, fps, &mut stdout);

    execute!(stdout, Show, LeaveAlternateScreen)?;
    terminal::disable_raw_mode()?;

    result
}

fn frame_loop<W: Write>(
    app: &mut App,
    mut messages: Option<Receiver<String>>,
    fps: u32,
    stdout: &mut W,
) -> anyhow::Result<()> {
    let fixed_dt = 1.0 / fps.max(1) as f32;
    let mut last_frame = Instant::now();
    let mut accumulator = 0.0f32;

    loop {
        if messages.as_ref().is_some_and(|rx| drain_messages(app, rx)) {
            tracing::debug!("Message source closed");
            messages = None;
        }

        if event::poll(Duration::from_millis(1))? {
            let event = event::read()?;
            if !app.handle_event(&event) {
                break;
            }
            if matches!(event, Event::Resize(..)) {
                execute!(stdout, Clear(ClearType::All))?;
            }
        }

        let now = Instant::now();
        accumulator += now.duration_since(last_frame).as_secs_f32();
        last_frame = now;

        // Don't try to catch up after a long stall
        if accumulator > fixed_dt * 3.0 {
            accumulator = fixed_dt * 3.0;
        }

        while accumulator >= fixed_dt {
            app.tick();
            accumulator -= fixed_dt;
        }

        app.render(stdout)?;
    }

    Ok(())
}

/// Apply every pending message. Returns true once the sender is gone.
fn drain_messages(app: &mut App, rx: &Receiver<String>) -> bool {
    loop {
        match rx.try_recv() {
            Ok(line) => {
                app.handle_message(&line);
            }
            Err(TryRecvError::Empty) => return false,
            Err(TryRecvError::Disconnected) => return true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::firework::Firework;
    use crossterm::event::KeyEvent;

    fn app(spawn_chance: f32) -> App {
        let config = SimConfig {
            spawn_chance,
            ..SimConfig::default()
        };
        App::new(80, 24, config, fastrand::Rng::with_seed(5), (0, 0, 0), None)
    }

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[test]
    fn test_high_score_message_starts_fireworks() {
        let mut app = app(1.0);
        assert!(app.handle_message(r#"{"type":"H5P_SCORE_RESULT","score":95,"maxScore":100}"#));
        app.tick();
        assert_eq!(app.scene().fireworks().len(), 1);
    }

    #[test]
    fn test_low_score_stays_quiet() {
        let mut app = app(1.0);
        assert!(app.handle_message(r#"{"type":"H5P_SCORE_RESULT","score":70,"maxScore":100}"#));
        for _ in 0..50 {
            app.tick();
        }
        assert!(app.scene().fireworks().is_empty());
    }

    #[test]
    fn test_ignored_message_keeps_score() {
        let mut app = app(0.0);
        app.handle_message(r#"{"type":"H5P_SCORE_RESULT","score":3,"maxScore":4}"#);
        assert!(!app.handle_message(r#"{"type":"OTHER"}"#));
        assert!(!app.handle_message("garbage"));
        assert_eq!(app.board().fraction(), "3/4");
    }

    #[test]
    fn test_origin_enforced_when_configured() {
        let mut app = App::new(
            10,
            10,
            SimConfig::default(),
            fastrand::Rng::with_seed(1),
            (0, 0, 0),
            Some("https://quiz.example".to_string()),
        );
        assert!(!app.handle_message(r#"{"type":"H5P_SCORE_RESULT","score":3,"maxScore":4}"#));
        assert!(app.handle_message(
            r#"{"type":"H5P_SCORE_RESULT","score":3,"maxScore":4,"origin":"https://quiz.example"}"#
        ));
    }

    #[test]
    fn test_drain_applies_queued_messages() {
        let mut app = app(0.0);
        let (tx, rx) = std::sync::mpsc::channel();
        tx.send(r#"{"type":"H5P_SCORE_RESULT","score":1,"maxScore":2}"#.to_string())
            .unwrap();
        tx.send(r#"{"type":"H5P_SCORE_RESULT","score":2,"maxScore":2}"#.to_string())
            .unwrap();
        assert!(!drain_messages(&mut app, &rx));
        assert_eq!(app.board().fraction(), "2/2");

        drop(tx);
        assert!(drain_messages(&mut app, &rx));
    }

    #[test]
    fn test_keys() {
        let mut app = app(0.0);
        assert!(app.handle_event(&key(KeyCode::Char('t'))));
        assert_eq!(app.board().fraction(), "95/100");

        assert!(!app.handle_event(&key(KeyCode::Char('q'))));
        assert!(!app.handle_event(&key(KeyCode::Esc)));
        assert!(!app.handle_event(&Event::Key(KeyEvent::new(
            KeyCode::Char('c'),
            KeyModifiers::CONTROL
        ))));
    }

    #[test]
    fn test_resize_keeps_fireworks() {
        let mut app = app(1.0);
        app.board.manual_test();
        app.tick();
        app.handle_event(&Event::Resize(40, 10));
        assert_eq!(app.scene().fireworks().len(), 1);
        // 20 pixels tall, stretched so the world stays 640 tall
        assert_eq!(app.scene().bounds(), glam::Vec2::new(40.0 * 32.0, 640.0));
    }

    #[test]
    fn test_bursts_stay_on_screen() {
        let app = app(0.0);
        let config = app.scene().config().clone();
        let bounds = app.scene().bounds();
        let mut rng = fastrand::Rng::with_seed(42);

        for _ in 0..1000 {
            let mut firework = Firework::launch(bounds.x, bounds.y, &config, &mut rng);
            while !firework.exploded() {
                firework.update(config.gravity, &config, &mut rng);
            }
            let apex = firework.rocket.position.y;
            assert!(apex >= 0.0 && apex < bounds.y, "burst at y={apex}");
        }
    }

    #[test]
    fn test_render_shows_status_and_score() {
        let mut app = app(0.0);
        let mut out = Vec::new();
        app.render(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Waiting for score..."));
        assert!(text.contains("Score: 0/1"));

        app.board.manual_test();
        let mut out = Vec::new();
        app.render(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Congratulations! Excellent score!"));
        assert!(text.contains("Score: 95/100"));
    }
}
