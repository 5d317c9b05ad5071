//! Test utilities for the simulation crate.
//!
//! Provides hand-laid arena fixtures and proptest strategies shared by the
//! unit and property tests.

/// Fixtures for creating small deterministic arenas.
pub mod fixtures {
    use crate::simulation::Simulation;
    use crate::types::{Asteroid, BoundingBox, Goal, Racer};

    /// Standard racer used by all fixtures: at the origin with the shipped
    /// map radius.
    pub fn racer_at_origin() -> Racer {
        Racer {
            x: 0,
            y: 0,
            vx: 0,
            vy: 0,
            radius: 1_000,
        }
    }

    /// An empty walled arena: no asteroids, no goals. The ±100_000 square
    /// leaves plenty of room to accelerate before hitting a wall.
    pub fn open_arena() -> Simulation {
        Simulation::new(
            racer_at_origin(),
            Vec::new(),
            Vec::new(),
            Some(BoundingBox::new(-100_000, -100_000, 100_000, 100_000)),
        )
    }

    /// A small training arena: three asteroids off the cardinal flight
    /// lines and four goals laid out so that the straight line between any
    /// two consecutive greedy targets stays clear of the asteroids.
    pub fn training_arena() -> Simulation {
        Simulation::new(
            racer_at_origin(),
            vec![
                Asteroid::new(40_000, -30_000, 12_000),
                Asteroid::new(-50_000, 25_000, 9_000),
                Asteroid::new(-5_000, -40_000, 15_000),
            ],
            vec![
                Goal::new(90_000, 60_000, 15_000),
                Goal::new(-70_000, -70_000, 10_000),
                Goal::new(0, 80_000, 10_000),
                Goal::new(60_000, -75_000, 8_000),
            ],
            Some(BoundingBox::new(-100_000, -100_000, 100_000, 100_000)),
        )
    }

    /// A single goal already within touching distance of the racer, so the
    /// very first tick reaches it.
    pub fn goal_in_reach() -> Simulation {
        Simulation::new(
            racer_at_origin(),
            Vec::new(),
            vec![Goal::new(0, 5_000, 4_100)],
            Some(BoundingBox::new(-100_000, -100_000, 100_000, 100_000)),
        )
    }
}

/// Proptest strategies for simulation inputs.
pub mod strategies {
    use proptest::prelude::*;

    use crate::instruction::Instruction;

    /// Arbitrary normalized instructions, biased to include the axis
    /// extremes.
    pub fn instruction() -> impl Strategy<Value = Instruction> {
        (-200i64..=200, -200i64..=200).prop_map(|(vx, vy)| Instruction::new(vx, vy))
    }

    /// A short instruction sequence.
    pub fn instruction_sequence(max_length: usize) -> impl Strategy<Value = Vec<Instruction>> {
        proptest::collection::vec(instruction(), 0..max_length)
    }
}
