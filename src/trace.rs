//! Reference state traces: record or verify a per-tick oracle.
//!
//! A trace has one line per tick, `x y vx vy bitstring`, where the
//! bitstring holds one `0`/`1` per goal in index order. Traces are the
//! cross-implementation contract: an alternative implementation is correct
//! exactly when it reproduces a recorded trace byte for byte.

use std::fs;
use std::path::Path;

use crate::instruction::Instruction;
use crate::simulation::Simulation;

/// Error verifying a recorded trace.
#[derive(thiserror::Error, Debug)]
pub enum TraceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("trace ends before tick {tick}")]
    Truncated { tick: usize },

    #[error("state mismatch at tick {tick}: expected {expected:?}, found {found:?}")]
    Mismatch {
        tick: usize,
        expected: String,
        found: String,
    },
}

/// Render the racer state and reached goals as one trace line.
pub fn state_line(simulation: &Simulation) -> String {
    let racer = simulation.racer;
    let reached: String = simulation
        .reached_goals()
        .iter()
        .map(|&reached| if reached { '1' } else { '0' })
        .collect();

    format!("{} {} {} {} {}", racer.x, racer.y, racer.vx, racer.vy, reached)
}

/// Tick through the instructions from the simulation's current state and
/// write the resulting trace.
pub fn write_trace(
    simulation: &mut Simulation,
    instructions: &[Instruction],
    path: impl AsRef<Path>,
) -> std::io::Result<()> {
    let mut contents = String::new();

    for &instruction in instructions {
        simulation.tick(instruction);
        contents.push_str(&state_line(simulation));
        contents.push('\n');
    }

    fs::write(path, contents)
}

/// Tick through the instructions from the simulation's current state,
/// comparing each tick against a recorded trace. Fails on the first
/// diverging tick.
pub fn verify_trace(
    simulation: &mut Simulation,
    instructions: &[Instruction],
    path: impl AsRef<Path>,
) -> Result<(), TraceError> {
    let contents = fs::read_to_string(path)?;
    let mut expected_lines = contents.lines();

    for (tick, &instruction) in instructions.iter().enumerate() {
        simulation.tick(instruction);

        let expected = expected_lines
            .next()
            .ok_or(TraceError::Truncated { tick })?
            .trim_end();
        let found = state_line(simulation);

        // Goal-less maps leave a trailing space on the line; trim both
        // sides so the comparison is over the fields.
        if expected != found.trim_end() {
            return Err(TraceError::Mismatch {
                tick,
                expected: expected.to_string(),
                found,
            });
        }
    }

    Ok(())
}
