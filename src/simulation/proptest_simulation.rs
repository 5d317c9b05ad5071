//! Property-based tests for the simulation core.
//!
//! These drive random instruction sequences through the fixture arenas and
//! assert the contract-level invariants: determinism, save-state fidelity,
//! wall containment, and goal monotonicity.

use proptest::prelude::*;

use crate::instruction::Instruction;
use crate::test_utils::{fixtures, strategies};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Two simulations built from the same description and fed the same
    /// instructions stay bit-identical tick for tick.
    #[test]
    fn prop_determinism_across_instances(
        instructions in strategies::instruction_sequence(200),
    ) {
        let mut first = fixtures::training_arena();
        let mut second = fixtures::training_arena();

        for &instruction in &instructions {
            let first_flags = first.tick(instruction);
            let second_flags = second.tick(instruction);

            prop_assert_eq!(first_flags, second_flags);
            prop_assert_eq!(first.racer, second.racer);
            prop_assert_eq!(first.reached_goals(), second.reached_goals());
        }
    }

    /// push → ticks → pop restores racer and reached goals exactly;
    /// push → ticks → apply does too but leaves the stack intact.
    #[test]
    fn prop_push_pop_roundtrip(
        instructions in strategies::instruction_sequence(100),
    ) {
        let mut simulation = fixtures::training_arena();

        simulation.push();
        let racer = simulation.racer;
        let reached = simulation.reached_goals().to_vec();

        for &instruction in &instructions {
            simulation.tick(instruction);
        }

        simulation.apply();
        prop_assert_eq!(simulation.racer, racer);
        prop_assert_eq!(simulation.reached_goals(), reached.as_slice());
        prop_assert_eq!(simulation.pushed_state_count(), 1);

        for &instruction in &instructions {
            simulation.tick(instruction);
        }

        simulation.pop();
        prop_assert_eq!(simulation.racer, racer);
        prop_assert_eq!(simulation.reached_goals(), reached.as_slice());
        prop_assert_eq!(simulation.pushed_state_count(), 0);
    }

    /// After every tick the racer disk is inside the bounding box.
    #[test]
    fn prop_racer_stays_in_bounds(
        instructions in strategies::instruction_sequence(300),
    ) {
        let mut simulation = fixtures::training_arena();
        let bounds = simulation.bounding_box().unwrap();

        for &instruction in &instructions {
            simulation.tick(instruction);
            let racer = simulation.racer;

            prop_assert!(racer.x - racer.radius >= bounds.min_x);
            prop_assert!(racer.x + racer.radius <= bounds.max_x);
            prop_assert!(racer.y - racer.radius >= bounds.min_y);
            prop_assert!(racer.y + racer.radius <= bounds.max_y);
        }
    }

    /// Reached goals never flip back to unreached except via restart.
    #[test]
    fn prop_goal_flags_are_monotonic(
        instructions in strategies::instruction_sequence(300),
    ) {
        let mut simulation = fixtures::training_arena();
        let mut previous = simulation.reached_goals().to_vec();

        for &instruction in &instructions {
            simulation.tick(instruction);

            for (before, after) in previous.iter().zip(simulation.reached_goals()) {
                prop_assert!(!(*before && !after), "reached goal was forgotten");
            }
            previous = simulation.reached_goals().to_vec();
        }

        simulation.restart();
        prop_assert!(simulation.reached_goals().iter().all(|reached| !reached));
    }

    /// restart always lands on the load-time racer with zero velocity,
    /// regardless of what was driven before.
    #[test]
    fn prop_restart_is_total(
        instructions in strategies::instruction_sequence(150),
    ) {
        let mut simulation = fixtures::training_arena();
        let initial = simulation.initial_racer();

        for &instruction in &instructions {
            simulation.tick(instruction);
        }
        simulation.restart();

        prop_assert_eq!(simulation.racer, initial);
        prop_assert_eq!(simulation.racer.vx, 0);
        prop_assert_eq!(simulation.racer.vy, 0);
    }

    /// Replaying a recorded sequence with `simulate` reproduces the state
    /// reached by ticking it manually from a fresh restart.
    #[test]
    fn prop_simulate_matches_manual_replay(
        instructions in strategies::instruction_sequence(150),
    ) {
        let mut manual = fixtures::training_arena();
        manual.restart();
        for &instruction in &instructions {
            manual.tick(instruction);
        }

        let mut replayed = fixtures::training_arena();
        for _ in 0..25 {
            replayed.tick(Instruction::up());
        }
        replayed.simulate(&instructions);

        prop_assert_eq!(manual.racer, replayed.racer);
        prop_assert_eq!(manual.reached_goals(), replayed.reached_goals());
    }
}
