use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::vec2::Vec2;

/// Half-width of the uniform range spawn velocities are drawn from.
/// Each component of a fresh particle's velocity lands in [-2, 2].
pub const SPAWN_SPEED_RANGE: f64 = 2.0;

/// A single point particle. `id` is assigned once at creation and never
/// reused or mutated; `age` counts completed ticks since emission.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    pub id: u64,
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    pub age: u64,
}

impl Particle {
    /// Transient vector view over the position fields.
    pub fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    /// Transient vector view over the velocity fields.
    pub fn velocity(&self) -> Vec2 {
        Vec2::new(self.vx, self.vy)
    }
}

/// Caller-supplied field overrides for `ParticleFactory::spawn`. Any field
/// left as `None` takes the factory default.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpawnOverrides {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub vx: Option<f64>,
    pub vy: Option<f64>,
    pub age: Option<u64>,
}

impl SpawnOverrides {
    /// Overrides just the position, leaving velocity randomized.
    pub fn at(position: Vec2) -> Self {
        SpawnOverrides {
            x: Some(position.x),
            y: Some(position.y),
            ..SpawnOverrides::default()
        }
    }
}

/// Creates particles with unique, strictly increasing ids and randomized
/// spawn velocities. The RNG is injectable so tests can seed it.
pub struct ParticleFactory<R: Rng = StdRng> {
    next_id: u64,
    rng: R,
}

impl ParticleFactory<StdRng> {
    pub fn from_entropy() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> ParticleFactory<R> {
    pub fn with_rng(rng: R) -> Self {
        ParticleFactory { next_id: 1, rng }
    }

    /// Creates a particle with the next id. Defaults: position (0, 0),
    /// age 0, each velocity component uniform over [-2, 2]. Overrides win
    /// over defaults. The id counter advances exactly once per call.
    pub fn spawn(&mut self, overrides: SpawnOverrides) -> Particle {
        let id = self.next_id;
        self.next_id += 1;

        let vx = match overrides.vx {
            Some(v) => v,
            None => self.rng.gen_range(-SPAWN_SPEED_RANGE..=SPAWN_SPEED_RANGE),
        };
        let vy = match overrides.vy {
            Some(v) => v,
            None => self.rng.gen_range(-SPAWN_SPEED_RANGE..=SPAWN_SPEED_RANGE),
        };

        Particle {
            id,
            x: overrides.x.unwrap_or(0.0),
            y: overrides.y.unwrap_or(0.0),
            vx,
            vy,
            age: overrides.age.unwrap_or(0),
        }
    }

    /// The id the next spawned particle will receive.
    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    /// Winds the id counter back to its initial value. Does not reseed the
    /// RNG.
    pub fn reset(&mut self) {
        self.next_id = 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_start_at_one_and_strictly_increase() {
        let mut factory = ParticleFactory::seeded(42);
        let ids: Vec<u64> = (0..5)
            .map(|_| factory.spawn(SpawnOverrides::default()).id)
            .collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn defaults_are_origin_and_age_zero() {
        let mut factory = ParticleFactory::seeded(42);
        let p = factory.spawn(SpawnOverrides::default());
        assert_eq!(p.x, 0.0);
        assert_eq!(p.y, 0.0);
        assert_eq!(p.age, 0);
    }

    #[test]
    fn spawn_velocity_is_within_range() {
        let mut factory = ParticleFactory::seeded(7);
        for _ in 0..100 {
            let p = factory.spawn(SpawnOverrides::default());
            assert!(p.vx >= -SPAWN_SPEED_RANGE && p.vx <= SPAWN_SPEED_RANGE);
            assert!(p.vy >= -SPAWN_SPEED_RANGE && p.vy <= SPAWN_SPEED_RANGE);
        }
    }

    #[test]
    fn overrides_win_over_defaults() {
        let mut factory = ParticleFactory::seeded(42);
        let p = factory.spawn(SpawnOverrides {
            x: Some(9.0),
            vy: Some(-1.25),
            age: Some(3),
            ..SpawnOverrides::default()
        });
        assert_eq!(p.x, 9.0);
        assert_eq!(p.y, 0.0);
        assert_eq!(p.vy, -1.25);
        assert_eq!(p.age, 3);
    }

    #[test]
    fn id_counter_advances_once_regardless_of_overrides() {
        let mut factory = ParticleFactory::seeded(42);
        let fully_overridden = SpawnOverrides {
            x: Some(1.0),
            y: Some(2.0),
            vx: Some(3.0),
            vy: Some(4.0),
            age: Some(5),
        };
        assert_eq!(factory.spawn(fully_overridden).id, 1);
        assert_eq!(factory.spawn(SpawnOverrides::default()).id, 2);
    }

    #[test]
    fn reset_rewinds_the_id_counter() {
        let mut factory = ParticleFactory::seeded(42);
        factory.spawn(SpawnOverrides::default());
        factory.spawn(SpawnOverrides::default());
        factory.reset();
        assert_eq!(factory.spawn(SpawnOverrides::default()).id, 1);
    }

    #[test]
    fn position_and_velocity_views() {
        let p = Particle {
            id: 1,
            x: 1.0,
            y: 2.0,
            vx: -3.0,
            vy: 4.0,
            age: 0,
        };
        assert_eq!(p.position(), Vec2::new(1.0, 2.0));
        assert_eq!(p.velocity(), Vec2::new(-3.0, 4.0));
    }
}
