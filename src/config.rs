//! Simulation tuning and command-line value parsing.

use glam::Vec2;
use std::ops::Range;

/// Tuning for the firework simulation.
///
/// Units are "world pixels" per tick. The renderer maps at least
/// `cell_scale` world pixels onto one half-block pixel, more on short
/// terminals so the world stays `min_world_height` tall.
#[derive(Debug, Clone)]
pub struct SimConfig {
    pub gravity: Vec2,
    /// Chance per tick of launching a firework while the score is excellent.
    pub spawn_chance: f32,
    /// Upward launch speed of a rocket; the sign is applied on launch.
    pub rocket_speed: Range<f32>,
    pub fragment_speed: Range<f32>,
    pub fragment_count: usize,
    pub fragment_damping: f32,
    pub fragment_lifespan: i32,
    pub fragment_decay: i32,
    /// Percentage at or above which fireworks are launched.
    pub excellent_threshold: f32,
    pub good_threshold: f32,
    pub cell_scale: f32,
    /// Rockets climb up to ~560 world pixels before bursting.
    pub min_world_height: f32,
    /// Background fade per frame, 0-255. Lower values leave longer trails.
    pub trail_fade: u8,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            gravity: Vec2::new(0.0, 0.2),
            spawn_chance: 0.05,
            rocket_speed: 10.0..15.0,
            fragment_speed: 1.0..8.0,
            fragment_count: 100,
            fragment_damping: 0.9,
            fragment_lifespan: 255,
            fragment_decay: 4,
            excellent_threshold: 90.0,
            good_threshold: 60.0,
            cell_scale: 8.0,
            min_world_height: 640.0,
            trail_fade: 25,
        }
    }
}

impl SimConfig {
    /// Ticks a fragment stays alive before `is_expired` reports true.
    pub fn fragment_ticks(&self) -> i32 {
        self.fragment_lifespan / self.fragment_decay.max(1) + 1
    }

    /// World pixels per canvas pixel for a canvas `canvas_height` pixels tall.
    pub fn scale_for(&self, canvas_height: usize) -> f32 {
        self.cell_scale.max(self.min_world_height / canvas_height.max(1) as f32)
    }
}

pub fn parse_hex_color(hex: &str) -> Option<(u8, u8, u8)> {
    let hex = hex.trim_start_matches('#');
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }

    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;

    Some((r, g, b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_fragment_ticks() {
        let config = SimConfig::default();
        assert_eq!(config.fragment_ticks(), 64);
    }

    #[test]
    fn test_scale_keeps_world_tall_enough() {
        let config = SimConfig::default();
        // 24 rows of half-blocks
        assert!(48.0 * config.scale_for(48) >= config.min_world_height);
        // Tall terminals keep the base scale
        assert_eq!(config.scale_for(200), config.cell_scale);
        assert!(config.scale_for(0).is_finite());
    }

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(parse_hex_color("1a1b26"), Some((0x1a, 0x1b, 0x26)));
        assert_eq!(parse_hex_color("#ffffff"), Some((255, 255, 255)));
        assert_eq!(parse_hex_color("fff"), None);
        assert_eq!(parse_hex_color("zzzzzz"), None);
    }
}
