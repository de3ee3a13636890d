//! Point-mass particles with simple Euler integration.
//!
//! A particle is either the rocket of a firework, which climbs until its apex,
//! or one of the fragments the rocket bursts into, which slow down under drag
//! and fade out as their lifespan runs down.

use crate::config::SimConfig;
use glam::Vec2;
use std::f32::consts::TAU;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Role {
    Rocket,
    Fragment {
        lifespan: i32,
        max_lifespan: i32,
        damping: f32,
        decay: i32,
    },
}

#[derive(Debug, Clone)]
pub struct Particle {
    pub position: Vec2,
    pub velocity: Vec2,
    pub acceleration: Vec2,
    pub hue: f32,
    pub role: Role,
}

impl Particle {
    /// A rocket launched straight up from `origin`.
    pub fn rocket(origin: Vec2, hue: f32, config: &SimConfig, rng: &mut fastrand::Rng) -> Self {
        let speed = uniform(rng, &config.rocket_speed);
        Self::launched(origin, Vec2::new(0.0, -speed.abs()), hue)
    }

    /// A rocket with a fixed launch velocity.
    pub fn launched(origin: Vec2, velocity: Vec2, hue: f32) -> Self {
        Self {
            position: origin,
            velocity,
            acceleration: Vec2::ZERO,
            hue,
            role: Role::Rocket,
        }
    }

    /// A fragment flying off from `origin` in a random direction.
    pub fn fragment(origin: Vec2, hue: f32, config: &SimConfig, rng: &mut fastrand::Rng) -> Self {
        let angle = rng.f32() * TAU;
        let speed = uniform(rng, &config.fragment_speed);
        Self::spark(origin, Vec2::from_angle(angle) * speed, hue, config)
    }

    /// A fragment with a fixed initial velocity.
    pub fn spark(origin: Vec2, velocity: Vec2, hue: f32, config: &SimConfig) -> Self {
        Self {
            position: origin,
            velocity,
            acceleration: Vec2::ZERO,
            hue,
            role: Role::Fragment {
                lifespan: config.fragment_lifespan,
                max_lifespan: config.fragment_lifespan,
                damping: config.fragment_damping,
                decay: config.fragment_decay,
            },
        }
    }

    pub fn apply_force(&mut self, force: Vec2) {
        self.acceleration += force;
    }

    pub fn update(&mut self) {
        if let Role::Fragment {
            lifespan,
            damping,
            decay,
            ..
        } = &mut self.role
        {
            self.velocity *= *damping;
            *lifespan -= *decay;
        }

        self.velocity += self.acceleration;
        self.position += self.velocity;
        self.acceleration = Vec2::ZERO;
    }

    pub fn is_expired(&self) -> bool {
        match self.role {
            Role::Rocket => false,
            Role::Fragment { lifespan, .. } => lifespan < 0,
        }
    }

    pub fn is_rocket(&self) -> bool {
        matches!(self.role, Role::Rocket)
    }

    /// Opacity in `0.0..=1.0`; rockets are always opaque.
    pub fn opacity(&self) -> f32 {
        match self.role {
            Role::Rocket => 1.0,
            Role::Fragment {
                lifespan,
                max_lifespan,
                ..
            } => (lifespan as f32 / max_lifespan.max(1) as f32).clamp(0.0, 1.0),
        }
    }
}

fn uniform(rng: &mut fastrand::Rng, range: &std::ops::Range<f32>) -> f32 {
    range.start + rng.f32() * (range.end - range.start)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rocket_launches_upward() {
        let config = SimConfig::default();
        let mut rng = fastrand::Rng::with_seed(7);
        for _ in 0..200 {
            let rocket = Particle::rocket(Vec2::new(10.0, 500.0), 42.0, &config, &mut rng);
            assert_eq!(rocket.velocity.x, 0.0);
            assert!(rocket.velocity.y <= -10.0 && rocket.velocity.y >= -15.0);
            assert_eq!(rocket.acceleration, Vec2::ZERO);
            assert!(rocket.is_rocket());
        }
    }

    #[test]
    fn test_fragment_speed_within_range() {
        let config = SimConfig::default();
        let mut rng = fastrand::Rng::with_seed(11);
        for _ in 0..200 {
            let fragment = Particle::fragment(Vec2::ZERO, 3.0, &config, &mut rng);
            let speed = fragment.velocity.length();
            assert!(speed >= 0.999 && speed <= 8.001, "speed {speed}");
            assert!(!fragment.is_expired());
        }
    }

    #[test]
    fn test_forces_accumulate_until_update() {
        let mut rocket = Particle::launched(Vec2::ZERO, Vec2::ZERO, 0.0);
        rocket.apply_force(Vec2::new(0.0, 0.25));
        rocket.apply_force(Vec2::new(0.5, 0.25));
        assert_eq!(rocket.acceleration, Vec2::new(0.5, 0.5));

        rocket.update();
        assert_eq!(rocket.velocity, Vec2::new(0.5, 0.5));
        assert_eq!(rocket.position, Vec2::new(0.5, 0.5));
        assert_eq!(rocket.acceleration, Vec2::ZERO);
    }

    #[test]
    fn test_damping_applies_before_force() {
        let config = SimConfig::default();
        let mut spark = Particle::spark(Vec2::ZERO, Vec2::new(10.0, 0.0), 0.0, &config);
        spark.apply_force(Vec2::new(1.0, 0.0));
        spark.update();
        // 10 * 0.9 + 1, not (10 + 1) * 0.9
        assert!((spark.velocity.x - 10.0).abs() < 1e-5);
    }

    #[test]
    fn test_rocket_never_decays() {
        let mut rocket = Particle::launched(Vec2::ZERO, Vec2::new(0.0, -3.0), 0.0);
        for _ in 0..1000 {
            rocket.update();
        }
        assert!(!rocket.is_expired());
        assert_eq!(rocket.velocity, Vec2::new(0.0, -3.0));
        assert_eq!(rocket.opacity(), 1.0);
    }

    #[test]
    fn test_fragment_expires_on_tick_64() {
        let config = SimConfig::default();
        let mut spark = Particle::spark(Vec2::ZERO, Vec2::new(3.0, -2.0), 0.0, &config);
        let mut last_opacity = spark.opacity();
        for _ in 0..63 {
            spark.update();
            assert!(!spark.is_expired());
            assert!(spark.opacity() < last_opacity);
            last_opacity = spark.opacity();
        }
        spark.update();
        assert!(spark.is_expired());
        assert_eq!(spark.opacity(), 0.0);
    }

    #[test]
    fn test_rocket_climb_slows_under_gravity() {
        let gravity = Vec2::new(0.0, 0.2);
        let mut rocket = Particle::launched(Vec2::new(100.0, 500.0), Vec2::new(0.0, -12.0), 0.0);
        let mut previous = rocket.velocity.y;
        while rocket.velocity.y < 0.0 {
            rocket.apply_force(gravity);
            rocket.update();
            assert!(rocket.velocity.y > previous);
            previous = rocket.velocity.y;
        }
        assert!(rocket.position.y < 500.0);
    }
}
