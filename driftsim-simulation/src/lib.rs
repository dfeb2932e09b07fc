use driftsim_core::{Particle, ParticleFactory, SpawnOverrides, Vec2};
use rand::Rng;

pub mod pipeline;
pub use pipeline::Pipeline;

/// A single named transformation applied to the particle collection during
/// a tick. Stages take the collection by value and return the next version
/// of it; only `Emit` touches the factory.
pub trait Stage<R: Rng> {
    fn name(&self) -> &'static str;
    fn run(&self, particles: Vec<Particle>, factory: &mut ParticleFactory<R>) -> Vec<Particle>;
}

/// Appends exactly one new particle at the emitter origin. Velocity stays
/// randomized; existing particles are untouched.
pub struct Emit {
    pub origin: Vec2,
}

impl<R: Rng> Stage<R> for Emit {
    fn name(&self) -> &'static str {
        "emit"
    }

    fn run(&self, mut particles: Vec<Particle>, factory: &mut ParticleFactory<R>) -> Vec<Particle> {
        particles.push(factory.spawn(SpawnOverrides::at(self.origin)));
        particles
    }
}

/// Shifts every particle's position by a fixed directional vector. Velocity,
/// age and id are untouched.
pub struct Wind {
    pub velocity: Vec2,
}

impl<R: Rng> Stage<R> for Wind {
    fn name(&self) -> &'static str {
        "wind"
    }

    fn run(&self, mut particles: Vec<Particle>, _factory: &mut ParticleFactory<R>) -> Vec<Particle> {
        for p in &mut particles {
            p.x += self.velocity.x;
            p.y += self.velocity.y;
        }
        particles
    }
}

/// Retains only particles with `age <= max_age`, preserving order among
/// survivors. Idempotent for a given threshold.
pub struct KillByAge {
    pub max_age: u64,
}

impl<R: Rng> Stage<R> for KillByAge {
    fn name(&self) -> &'static str {
        "kill_by_age"
    }

    fn run(&self, mut particles: Vec<Particle>, _factory: &mut ParticleFactory<R>) -> Vec<Particle> {
        particles.retain(|p| p.age <= self.max_age);
        particles
    }
}

/// Quadratic drag computed from velocity: dragMag = coeff * speed^2 along
/// the reversed velocity direction.
///
/// Note: the result overwrites the position fields instead of accumulating
/// into velocity. That quirk is kept intact, which is why this stage is not
/// wired into the standard pipeline.
pub struct Drag {
    pub coeff: f64,
}

impl<R: Rng> Stage<R> for Drag {
    fn name(&self) -> &'static str {
        "drag"
    }

    fn run(&self, mut particles: Vec<Particle>, _factory: &mut ParticleFactory<R>) -> Vec<Particle> {
        for p in &mut particles {
            let velocity = p.velocity();
            let speed = velocity.magnitude();
            let drag_mag = self.coeff * speed * speed;
            let drag = velocity.scale(-1.0).normalize().scale(drag_mag);
            p.x = drag.x;
            p.y = drag.y;
        }
        particles
    }
}

/// Unconditional motion and aging: position moves by velocity and age goes
/// up by one. Always the last stage of a tick.
pub struct Integrate;

impl<R: Rng> Stage<R> for Integrate {
    fn name(&self) -> &'static str {
        "integrate"
    }

    fn run(&self, mut particles: Vec<Particle>, _factory: &mut ParticleFactory<R>) -> Vec<Particle> {
        for p in &mut particles {
            p.x += p.vx;
            p.y += p.vy;
            p.age += 1;
        }
        particles
    }
}
