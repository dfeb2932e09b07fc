use rand::rngs::StdRng;
use rand::Rng;

use crate::particle::{Particle, ParticleFactory};

/// The complete mutable simulation state: the particle collection plus the
/// factory that owns the id counter and spawn RNG.
///
/// Exclusive ownership is the concurrency model: `advance`-style updates go
/// through `apply(&mut self, ..)`, so the borrow checker serializes all
/// mutation and readers only ever see a fully-formed snapshot.
pub struct SimState<R: Rng = StdRng> {
    particles: Vec<Particle>,
    factory: ParticleFactory<R>,
}

impl SimState<StdRng> {
    pub fn from_entropy() -> Self {
        Self::new(ParticleFactory::from_entropy())
    }

    pub fn seeded(seed: u64) -> Self {
        Self::new(ParticleFactory::seeded(seed))
    }
}

impl<R: Rng> SimState<R> {
    pub fn new(factory: ParticleFactory<R>) -> Self {
        SimState {
            particles: Vec::new(),
            factory,
        }
    }

    /// Replaces the particle collection with the result of `transform`
    /// applied to the current collection. The transform receives the one
    /// evolving particle vector and the factory, and its output is written
    /// back wholesale; no intermediate state is observable.
    pub fn apply<F>(&mut self, transform: F)
    where
        F: FnOnce(Vec<Particle>, &mut ParticleFactory<R>) -> Vec<Particle>,
    {
        let current = std::mem::take(&mut self.particles);
        self.particles = transform(current, &mut self.factory);
    }

    /// Clears all particles and rewinds the id counter, so the next spawn
    /// gets id 1 again. Only ever called explicitly.
    pub fn reset(&mut self) {
        self.particles.clear();
        self.factory.reset();
    }

    /// Read-only view of the particle collection, in emission order.
    pub fn snapshot(&self) -> &[Particle] {
        &self.particles
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::particle::SpawnOverrides;

    #[test]
    fn starts_empty_with_next_id_one() {
        let mut state = SimState::seeded(42);
        assert!(state.is_empty());
        state.apply(|mut particles, factory| {
            particles.push(factory.spawn(SpawnOverrides::default()));
            particles
        });
        assert_eq!(state.snapshot()[0].id, 1);
    }

    #[test]
    fn apply_replaces_the_collection_wholesale() {
        let mut state = SimState::seeded(42);
        state.apply(|mut particles, factory| {
            particles.push(factory.spawn(SpawnOverrides::default()));
            particles.push(factory.spawn(SpawnOverrides::default()));
            particles
        });
        state.apply(|particles, _| particles.into_iter().skip(1).collect());
        assert_eq!(state.len(), 1);
        assert_eq!(state.snapshot()[0].id, 2);
    }

    #[test]
    fn reset_empties_state_and_rewinds_ids() {
        let mut state = SimState::seeded(42);
        state.apply(|mut particles, factory| {
            particles.push(factory.spawn(SpawnOverrides::default()));
            particles
        });
        state.reset();
        assert!(state.is_empty());
        state.apply(|mut particles, factory| {
            particles.push(factory.spawn(SpawnOverrides::default()));
            particles
        });
        assert_eq!(state.snapshot()[0].id, 1);
    }
}
