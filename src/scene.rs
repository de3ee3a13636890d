//! Active fireworks, launched while the score calls for a celebration.

use crate::config::SimConfig;
use crate::firework::Firework;
use glam::Vec2;

/// The set of fireworks currently in flight.
pub struct Scene {
    width: f32,
    height: f32,
    fireworks: Vec<Firework>,
    config: SimConfig,
    rng: fastrand::Rng,
}

impl Scene {
    pub fn new(width: f32, height: f32, config: SimConfig, rng: fastrand::Rng) -> Self {
        Self {
            width,
            height,
            fireworks: Vec::new(),
            config,
            rng,
        }
    }

    /// Advance every firework by one tick, launching a new one first when
    /// `celebrating` and the dice allow it.
    pub fn tick(&mut self, celebrating: bool) {
        if celebrating && self.rng.f32() < self.config.spawn_chance {
            self.spawn();
        }

        let gravity = self.config.gravity;
        for firework in &mut self.fireworks {
            firework.update(gravity, &self.config, &mut self.rng);
        }

        let before = self.fireworks.len();
        self.fireworks.retain(|firework| !firework.is_finished());
        let finished = before - self.fireworks.len();
        if finished > 0 {
            tracing::trace!(finished, active = self.fireworks.len(), "fireworks retired");
        }
    }

    pub fn spawn(&mut self) {
        let firework = Firework::launch(self.width, self.height, &self.config, &mut self.rng);
        tracing::debug!(
            x = firework.rocket.position.x,
            hue = firework.hue,
            "firework launched"
        );
        self.fireworks.push(firework);
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.width = width;
        self.height = height;
    }

    pub fn fireworks(&self) -> &[Firework] {
        &self.fireworks
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn bounds(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }
}
