pub mod particle;
pub mod state;
pub mod vec2;

pub use particle::{Particle, ParticleFactory, SpawnOverrides};
pub use state::SimState;
pub use vec2::Vec2;
