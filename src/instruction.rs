//! Per-tick acceleration instructions and the instruction-stream format.
//!
//! An instruction is a pair of signed 8-bit acceleration components. The
//! constructor normalizes arbitrary integer proposals onto the disk of
//! radius [`Instruction::MAX_ACCELERATION`] using the same truncating
//! integer arithmetic as the tick path, so equal stored pairs mean equal
//! behavior.

use std::fs;
use std::path::Path;

use crate::math::{distance_squared, euclidean_distance};
use crate::reader::{ParseError, RecordReader};

/// A single tick's acceleration vector, already normalized.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Instruction {
    pub vx: i8,
    pub vy: i8,
}

impl Instruction {
    /// Radius of the acceleration disk.
    pub const MAX_ACCELERATION: i64 = 127;

    /// Build an instruction from arbitrary integer proposals.
    ///
    /// Proposals outside the disk are scaled toward the origin:
    /// `v ← clamp(v · 127 / d, −127, 127)` with `d` the integer distance
    /// from the origin and `/` truncating toward zero. Proposals must be
    /// small enough that their squares fit in an `i64`; anything derived
    /// from arena coordinates is.
    pub fn new(vx: i64, vy: i64) -> Self {
        let max = Self::MAX_ACCELERATION;

        let (vx, vy) = if distance_squared(vx, vy, 0, 0) > max * max {
            let distance = euclidean_distance(vx, vy, 0, 0);
            (
                (vx * max / distance).clamp(-max, max),
                (vy * max / distance).clamp(-max, max),
            )
        } else {
            (vx, vy)
        };

        Self {
            vx: vx as i8,
            vy: vy as i8,
        }
    }

    /// Full acceleration upward (y grows downward).
    pub fn up() -> Self {
        Self::new(0, i64::from(i8::MIN))
    }

    /// Full acceleration downward.
    pub fn down() -> Self {
        Self::new(0, i64::from(i8::MAX))
    }

    /// Full acceleration to the left.
    pub fn left() -> Self {
        Self::new(i64::from(i8::MIN), 0)
    }

    /// Full acceleration to the right.
    pub fn right() -> Self {
        Self::new(i64::from(i8::MAX), 0)
    }
}

/// Error loading an instruction-stream file.
#[derive(thiserror::Error, Debug)]
pub enum InstructionFileError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid instruction file: {0}")]
    Parse(#[from] ParseError),
}

/// Save instructions as text: a count line, then one `vx vy` pair per line.
pub fn save_instructions(
    path: impl AsRef<Path>,
    instructions: &[Instruction],
) -> std::io::Result<()> {
    let mut contents = String::new();
    contents.push_str(&format!("{}\n", instructions.len()));

    for instruction in instructions {
        contents.push_str(&format!("{} {}\n", instruction.vx, instruction.vy));
    }

    fs::write(path, contents)
}

/// Load an instruction stream saved by [`save_instructions`].
///
/// Every pair is passed back through the normalizer, so out-of-disk pairs
/// in malformed files are silently clamped rather than rejected.
pub fn load_instructions(path: impl AsRef<Path>) -> Result<Vec<Instruction>, InstructionFileError> {
    let contents = fs::read_to_string(path)?;
    Ok(parse_instructions(&contents)?)
}

fn parse_instructions(contents: &str) -> Result<Vec<Instruction>, ParseError> {
    let mut reader = RecordReader::new(contents);
    let count = reader.next_count("instruction count")?;

    let mut instructions = Vec::with_capacity(count);
    for _ in 0..count {
        let (_, [vx, vy]) = reader.next_record::<2>("instruction")?;
        instructions.push(Instruction::new(vx, vy));
    }

    Ok(instructions)
}
