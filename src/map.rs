//! The map text format: save and load a simulation description.
//!
//! One record per line, ASCII whitespace-separated decimal integers:
//!
//! ```text
//! 0 0 5              // starting racer x/y/radius
//! -100 -100 100 100  // bounding box min_x/min_y/max_x/max_y
//! 5                  // number of asteroids
//! 10 -10 10          // asteroid x/y/radius, repeated
//! ...
//! 1                  // number of goals
//! 100 100 10         // goal x/y/radius, repeated
//! ```
//!
//! The initial racer velocity is implicitly zero. Loading never yields a
//! partial simulation: any malformed record fails the whole file.

use std::fs;
use std::path::Path;

use crate::reader::{ParseError, RecordReader};
use crate::simulation::Simulation;
use crate::types::{Asteroid, BoundingBox, Goal, Racer};

/// Error loading a map file.
#[derive(thiserror::Error, Debug)]
pub enum MapFileError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid map file: {0}")]
    Parse(#[from] ParseError),
}

impl Simulation {
    /// Load a simulation from a map file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, MapFileError> {
        let contents = fs::read_to_string(path)?;
        Ok(Self::from_map_str(&contents)?)
    }

    /// Parse a simulation from map-format text.
    pub fn from_map_str(contents: &str) -> Result<Self, ParseError> {
        let mut reader = RecordReader::new(contents);

        let (_, [x, y, radius]) = reader.next_record::<3>("racer record")?;
        let racer = Racer {
            x,
            y,
            vx: 0,
            vy: 0,
            radius,
        };

        let (_, [min_x, min_y, max_x, max_y]) = reader.next_record::<4>("bounding box record")?;
        let bounding_box = BoundingBox::new(min_x, min_y, max_x, max_y);

        let asteroid_count = reader.next_count("asteroid count")?;
        let mut asteroids = Vec::with_capacity(asteroid_count);
        for _ in 0..asteroid_count {
            let (_, [x, y, radius]) = reader.next_record::<3>("asteroid record")?;
            asteroids.push(Asteroid::new(x, y, radius));
        }

        let goal_count = reader.next_count("goal count")?;
        let mut goals = Vec::with_capacity(goal_count);
        for _ in 0..goal_count {
            let (_, [x, y, radius]) = reader.next_record::<3>("goal record")?;
            goals.push(Goal::new(x, y, radius));
        }

        Ok(Self::new(racer, asteroids, goals, Some(bounding_box)))
    }

    /// Save the simulation to a map file. The racer record holds the
    /// current position, so saving mid-race produces a map that starts
    /// where the racer is.
    pub fn save(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        fs::write(path, self.to_map_string())
    }

    /// Render the simulation in map format.
    pub fn to_map_string(&self) -> String {
        let mut contents = String::new();

        contents.push_str(&format!(
            "{} {} {}\n",
            self.racer.x, self.racer.y, self.racer.radius
        ));

        // Maps without a bounding box are not representable in the format;
        // all shipped maps have one.
        let bounds = self
            .bounding_box()
            .expect("cannot save a simulation without a bounding box");
        contents.push_str(&format!(
            "{} {} {} {}\n",
            bounds.min_x, bounds.min_y, bounds.max_x, bounds.max_y
        ));

        contents.push_str(&format!("{}\n", self.asteroids().len()));
        for asteroid in self.asteroids() {
            contents.push_str(&format!(
                "{} {} {}\n",
                asteroid.x, asteroid.y, asteroid.radius
            ));
        }

        contents.push_str(&format!("{}\n", self.goals().len()));
        for goal in self.goals() {
            contents.push_str(&format!("{} {} {}\n", goal.x, goal.y, goal.radius));
        }

        contents
    }
}
