use driftsim_core::{Particle, ParticleFactory, SimState, Vec2};
use rand::rngs::StdRng;
use rand::Rng;

use crate::{Emit, Integrate, KillByAge, Stage, Wind};

/// An ordered composition of stages executed once per tick. Order is
/// significant: a particle emitted this tick is immediately subject to the
/// wind shift, the age cull and integration within the same tick.
pub struct Pipeline<R: Rng = StdRng> {
    stages: Vec<Box<dyn Stage<R>>>,
}

impl<R: Rng> Pipeline<R> {
    pub fn new() -> Self {
        Pipeline { stages: Vec::new() }
    }

    pub fn with_stage<S: Stage<R> + 'static>(mut self, stage: S) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    /// The standard tick composition: Emit, Wind, KillByAge, Integrate.
    pub fn standard(origin: Vec2, wind: Vec2, max_age: u64) -> Self {
        Pipeline::new()
            .with_stage(Emit { origin })
            .with_stage(Wind { velocity: wind })
            .with_stage(KillByAge { max_age })
            .with_stage(Integrate)
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Folds the particle collection through every stage in order. Total
    /// function; no stage can fail.
    pub fn run(&self, particles: Vec<Particle>, factory: &mut ParticleFactory<R>) -> Vec<Particle> {
        self.stages
            .iter()
            .fold(particles, |acc, stage| stage.run(acc, factory))
    }

    /// One tick: reads the current collection out of the state, runs the
    /// stages over it, writes the result back wholesale.
    pub fn advance(&self, state: &mut SimState<R>) {
        state.apply(|particles, factory| self.run(particles, factory));
        log::trace!("tick complete, {} particles", state.len());
    }
}

impl<R: Rng> Default for Pipeline<R> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORIGIN: Vec2 = Vec2 { x: 100.0, y: -50.0 };
    const WIND: Vec2 = Vec2 { x: -2.0, y: 1.0 };
    const MAX_AGE: u64 = 200;

    fn standard_pipeline() -> Pipeline {
        Pipeline::standard(ORIGIN, WIND, MAX_AGE)
    }

    #[test]
    fn standard_stage_order() {
        assert_eq!(
            standard_pipeline().stage_names(),
            vec!["emit", "wind", "kill_by_age", "integrate"]
        );
    }

    #[test]
    fn one_tick_from_empty_state() {
        let mut state = SimState::seeded(42);
        let pipeline = standard_pipeline();
        pipeline.advance(&mut state);

        assert_eq!(state.len(), 1);
        let p = state.snapshot()[0];
        assert_eq!(p.id, 1);
        assert_eq!(p.age, 1);
        // Emitted at the origin, shifted by wind, then moved by its own
        // randomized velocity. The velocity fields are untouched by the
        // tick, so the expected position can be reconstructed from them.
        assert!(p.vx >= -2.0 && p.vx <= 2.0);
        assert!(p.vy >= -2.0 && p.vy <= 2.0);
        assert_eq!(p.x, ORIGIN.x + WIND.x + p.vx);
        assert_eq!(p.y, ORIGIN.y + WIND.y + p.vy);
    }

    #[test]
    fn each_tick_emits_exactly_one_particle() {
        let mut state = SimState::seeded(42);
        let pipeline = standard_pipeline();
        for expected in 1..=10 {
            pipeline.advance(&mut state);
            assert_eq!(state.len(), expected);
        }
        let ids: Vec<u64> = state.snapshot().iter().map(|p| p.id).collect();
        assert_eq!(ids, (1..=10).collect::<Vec<u64>>());
    }

    #[test]
    fn old_particles_are_culled() {
        let mut state = SimState::seeded(42);
        let pipeline = standard_pipeline();

        // The cull runs before integration, so the first particle reaches
        // the threshold age during tick 201 and is removed on tick 202.
        for _ in 0..201 {
            pipeline.advance(&mut state);
        }
        assert!(state.snapshot().iter().any(|p| p.id == 1));

        pipeline.advance(&mut state);
        let snapshot = state.snapshot();
        assert!(!snapshot.iter().any(|p| p.id == 1));
        assert!(snapshot.iter().all(|p| p.age <= MAX_AGE + 1));
        // Later emissions are still present.
        assert!(snapshot.iter().any(|p| p.id == 2));
        assert!(snapshot.iter().any(|p| p.id == 202));
    }

    #[test]
    fn reset_restarts_id_assignment() {
        let mut state = SimState::seeded(42);
        let pipeline = standard_pipeline();
        pipeline.advance(&mut state);
        pipeline.advance(&mut state);

        state.reset();
        assert!(state.is_empty());

        pipeline.advance(&mut state);
        assert_eq!(state.snapshot()[0].id, 1);
    }

    #[test]
    fn newly_emitted_particle_dies_same_tick_with_zero_threshold() {
        // A fresh particle has age 0, so it survives any threshold except
        // none at all; with max_age 0 it still survives the cull (0 <= 0)
        // and leaves the tick with age 1, to be removed next tick.
        let mut state = SimState::seeded(42);
        let pipeline = Pipeline::standard(ORIGIN, WIND, 0);
        pipeline.advance(&mut state);
        assert_eq!(state.len(), 1);
        pipeline.advance(&mut state);
        // Tick 2: the first particle (age 1) is culled, the new emission
        // survives.
        assert_eq!(state.len(), 1);
        assert_eq!(state.snapshot()[0].id, 2);
    }
}
