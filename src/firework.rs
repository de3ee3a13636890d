//! Rocket-to-burst lifecycle of a single firework.

use crate::config::SimConfig;
use crate::particle::Particle;
use glam::Vec2;

/// One firework: a rocket that climbs to its apex and bursts into fragments.
#[derive(Debug, Clone)]
pub struct Firework {
    pub hue: f32,
    pub rocket: Particle,
    pub fragments: Vec<Particle>,
    exploded: bool,
}

impl Firework {
    /// Launch from a random point along the bottom edge of a `width` x `height` scene.
    pub fn launch(width: f32, height: f32, config: &SimConfig, rng: &mut fastrand::Rng) -> Self {
        let hue = rng.f32() * 255.0;
        let origin = Vec2::new(rng.f32() * width.max(0.0), height);
        let rocket = Particle::rocket(origin, hue, config, rng);
        Self::from_rocket(rocket)
    }

    pub fn from_rocket(rocket: Particle) -> Self {
        Self {
            hue: rocket.hue,
            rocket,
            fragments: Vec::new(),
            exploded: false,
        }
    }

    pub fn update(&mut self, gravity: Vec2, config: &SimConfig, rng: &mut fastrand::Rng) {
        if !self.exploded {
            self.rocket.apply_force(gravity);
            self.rocket.update();

            // Screen y grows downward, so a non-negative vy means the rocket stopped climbing
            if self.rocket.velocity.y >= 0.0 {
                self.exploded = true;
                self.explode(config, rng);
            }
        }

        self.fragments.retain_mut(|fragment| {
            fragment.apply_force(gravity);
            fragment.update();
            !fragment.is_expired()
        });
    }

    fn explode(&mut self, config: &SimConfig, rng: &mut fastrand::Rng) {
        let origin = self.rocket.position;
        self.fragments.reserve(config.fragment_count);
        for _ in 0..config.fragment_count {
            self.fragments.push(Particle::fragment(origin, self.hue, config, rng));
        }
        tracing::trace!(x = origin.x, y = origin.y, hue = self.hue, "firework exploded");
    }

    pub fn exploded(&self) -> bool {
        self.exploded
    }

    pub fn is_finished(&self) -> bool {
        self.exploded && self.fragments.is_empty()
    }

    /// Particles currently visible: the rocket until it bursts, then the fragments.
    pub fn visible(&self) -> impl Iterator<Item = &Particle> {
        let rocket = (!self.exploded()).then_some(&self.rocket);
        rocket.into_iter().chain(self.fragments.iter())
    }
}
