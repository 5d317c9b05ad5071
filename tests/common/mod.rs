//! Common fixtures and helpers for the integration tests.

use asteracer::simulation::Simulation;
use asteracer::{Asteroid, BoundingBox, Goal, Instruction, Racer};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Standard racer at the origin with the shipped map radius.
pub fn racer_at_origin() -> Racer {
    Racer {
        x: 0,
        y: 0,
        vx: 0,
        vy: 0,
        radius: 1_000,
    }
}

/// An empty walled arena: no asteroids, no goals.
pub fn open_arena() -> Simulation {
    Simulation::new(
        racer_at_origin(),
        Vec::new(),
        Vec::new(),
        Some(BoundingBox::new(-100_000, -100_000, 100_000, 100_000)),
    )
}

/// A small arena shaped like the shipped test map: a handful of asteroids
/// off the cardinal flight lines, and goals laid out so that flying right
/// hits the east wall, flying down from there collects the first goal, and
/// the straight line between any two consecutive greedy targets stays
/// clear of the asteroids.
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

/// Seeded random instruction stream; proposals may fall outside the disk
/// so the normalizer gets exercised too.
pub fn random_instructions(seed: u64, count: usize) -> Vec<Instruction> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| Instruction::new(rng.gen_range(-200..=200), rng.gen_range(-200..=200)))
        .collect()
}
