//! Half-block terminal canvas.
//!
//! Each terminal cell shows two vertical pixels: the upper one as the
//! background color and the lower one as the foreground of a `▄` glyph.
//! The canvas persists across frames and is faded toward the background
//! instead of cleared, which leaves short trails behind moving particles.

use crate::firework::Firework;
use crate::particle::Particle;
use std::io::Write;

pub type Rgb = (u8, u8, u8);

/// Convert a hue on the 0-255 wheel at full saturation and brightness.
pub fn hue_to_rgb(hue: f32) -> Rgb {
    let h = (hue.rem_euclid(255.0) / 255.0) * 6.0;
    let sector = h.floor();
    let f = h - sector;
    let rising = (f * 255.0).round() as u8;
    let falling = ((1.0 - f) * 255.0).round() as u8;
    match sector as u8 {
        0 => (255, rising, 0),
        1 => (falling, 255, 0),
        2 => (0, 255, rising),
        3 => (0, falling, 255),
        4 => (rising, 0, 255),
        _ => (255, 0, falling),
    }
}

fn blend(under: Rgb, over: Rgb, alpha: f32) -> Rgb {
    let alpha = alpha.clamp(0.0, 1.0);
    (
        (under.0 as f32 * (1.0 - alpha) + over.0 as f32 * alpha).round() as u8,
        (under.1 as f32 * (1.0 - alpha) + over.1 as f32 * alpha).round() as u8,
        (under.2 as f32 * (1.0 - alpha) + over.2 as f32 * alpha).round() as u8,
    )
}

// Always moves at least one step, so faded pixels reach the background
// instead of stalling a few levels above it.
fn approach(from: u8, to: u8, alpha: f32) -> u8 {
    let diff = to as f32 - from as f32;
    let step = (diff.abs() * alpha).ceil().min(diff.abs());
    (from as f32 + step * diff.signum()).round() as u8
}

pub struct Canvas {
    width: usize,
    height: usize,
    background: Rgb,
    pixels: Vec<Rgb>,
    /// World pixels per canvas pixel.
    scale: f32,
    output_buf: Vec<u8>,
}

impl Canvas {
    pub fn new(width: usize, height: usize, scale: f32, background: Rgb) -> Self {
        Self {
            width,
            height,
            background,
            pixels: vec![background; width * height],
            scale,
            output_buf: Vec::with_capacity(width * height * 25),
        }
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn background(&self) -> Rgb {
        self.background
    }

    /// World-space size covered by the canvas.
    pub fn world_size(&self) -> (f32, f32) {
        (self.width as f32 * self.scale, self.height as f32 * self.scale)
    }

    #[cfg(test)]
    pub fn pixel(&self, x: usize, y: usize) -> Option<Rgb> {
        (x < self.width && y < self.height).then(|| self.pixels[y * self.width + x])
    }

    /// Pull every pixel toward the background by `amount` out of 255.
    pub fn fade(&mut self, amount: u8) {
        let alpha = amount as f32 / 255.0;
        let bg = self.background;
        for pixel in &mut self.pixels {
            *pixel = (
                approach(pixel.0, bg.0, alpha),
                approach(pixel.1, bg.1, alpha),
                approach(pixel.2, bg.2, alpha),
            );
        }
    }

    fn plot(&mut self, x: i32, y: i32, color: Rgb, alpha: f32) {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return;
        }
        let idx = y as usize * self.width + x as usize;
        self.pixels[idx] = blend(self.pixels[idx], color, alpha);
    }

    pub fn draw_particle(&mut self, particle: &Particle) {
        let x = (particle.position.x / self.scale).floor() as i32;
        let y = (particle.position.y / self.scale).floor() as i32;
        let color = hue_to_rgb(particle.hue);
        let alpha = particle.opacity();

        if particle.is_rocket() {
            // Rockets get a soft halo around a solid core
            for dy in -1..=1 {
                for dx in -1..=1 {
                    if dx != 0 || dy != 0 {
                        self.plot(x + dx, y + dy, color, 0.35);
                    }
                }
            }
            self.plot(x, y, color, 1.0);
        } else {
            self.plot(x, y, color, alpha);
        }
    }

    pub fn draw_firework(&mut self, firework: &Firework) {
        for particle in firework.visible() {
            self.draw_particle(particle);
        }
    }

    /// Encode the canvas as half-block rows, starting from the top-left corner.
    pub fn encode(&mut self) -> std::io::Result<&[u8]> {
        self.output_buf.clear();
        self.output_buf.extend_from_slice(b"\x1b[H");

        let mut prev_top: Option<Rgb> = None;
        let mut prev_bot: Option<Rgb> = None;

        for y in (0..self.height).step_by(2) {
            for x in 0..self.width {
                let top = self.pixels[y * self.width + x];
                let bot = if y + 1 < self.height {
                    self.pixels[(y + 1) * self.width + x]
                } else {
                    top
                };

                if prev_top != Some(top) {
                    write!(self.output_buf, "\x1b[48;2;{};{};{}m", top.0, top.1, top.2)?;
                    prev_top = Some(top);
                }
                if prev_bot != Some(bot) {
                    write!(self.output_buf, "\x1b[38;2;{};{};{}m", bot.0, bot.1, bot.2)?;
                    prev_bot = Some(bot);
                }

                self.output_buf.extend_from_slice("▄".as_bytes());
            }
            self.output_buf.extend_from_slice(b"\x1b[0m");
            prev_top = None;
            prev_bot = None;
            if y + 2 < self.height {
                self.output_buf.extend_from_slice(b"\r\n");
            }
        }

        Ok(&self.output_buf)
    }

    /// Write `text` centered on terminal row `row`, over the canvas.
    pub fn overlay_text<W: Write>(
        &self,
        out: &mut W,
        row: usize,
        text: &str,
        color: Rgb,
    ) -> std::io::Result<()> {
        let rows = self.height.div_ceil(2);
        if row >= rows {
            return Ok(());
        }
        let len = text.chars().count().min(self.width);
        let col = (self.width - len) / 2;
        let text: String = text.chars().take(len).collect();
        write!(
            out,
            "\x1b[{};{}H\x1b[1m\x1b[38;2;{};{};{}m{}\x1b[0m",
            row + 1,
            col + 1,
            color.0,
            color.1,
            color.2,
            text
        )
    }
}
