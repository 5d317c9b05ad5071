//! The simulation core: the tick function and save states.
//!
//! A tick applies drag, acceleration, and translation to the racer, then
//! iteratively resolves collisions against asteroids and the arena walls,
//! halves the velocity once if anything collided, and finally tests the
//! goals. Everything is signed 64-bit integer arithmetic with truncating
//! division, so two simulations fed the same instructions stay
//! bit-identical forever.

#[cfg(test)]
mod proptest_simulation;

use crate::grid::SpatialGrid;
use crate::instruction::Instruction;
use crate::math::{distance_squared, euclidean_distance};
use crate::types::{Asteroid, BoundingBox, Goal, Racer, TickFlags};

/// Snapshot of the mutable simulation state, stackable via
/// [`Simulation::push`] and restorable via [`Simulation::pop`] /
/// [`Simulation::apply`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SaveState {
    pub racer: Racer,
    pub reached_goals: Vec<bool>,
}

/// A loaded race: one racer, static asteroids and goals, an optional
/// bounding box, and the spatial grid built over them.
///
/// The asteroid list, goal list, and grid are fixed after construction;
/// only the racer, the reached-goal flags, and the pushed-state stack
/// change over the simulation's lifetime.
#[derive(Clone, Debug)]
pub struct Simulation {
    /// Racer state as constructed; `restart` returns to this.
    initial_racer: Racer,
    /// The racer being driven. Public: callers read position and velocity
    /// directly after each tick.
    pub racer: Racer,
    asteroids: Vec<Asteroid>,
    goals: Vec<Goal>,
    reached_goals: Vec<bool>,
    bounding_box: Option<BoundingBox>,
    grid: SpatialGrid,
    pushed_states: Vec<SaveState>,
}

impl Simulation {
    /// Velocity fraction kept by drag at the start of every tick.
    pub const DRAG_FRACTION: (i64, i64) = (9, 10);

    /// Velocity fraction kept after a tick in which any collision occurred.
    pub const COLLISION_FRACTION: (i64, i64) = (1, 2);

    /// Hard cap on collision-resolution passes per tick. Residual overlap
    /// past the cap is carried into the next tick.
    pub const MAX_COLLISION_RESOLUTIONS: usize = 5;

    pub fn new(
        racer: Racer,
        asteroids: Vec<Asteroid>,
        goals: Vec<Goal>,
        bounding_box: Option<BoundingBox>,
    ) -> Self {
        let grid = SpatialGrid::build(bounding_box, &asteroids, racer.radius);
        let reached_goals = vec![false; goals.len()];

        Self {
            initial_racer: racer,
            racer,
            asteroids,
            goals,
            reached_goals,
            bounding_box,
            grid,
            pushed_states: Vec::new(),
        }
    }

    /// Simulate a single tick, returning the events it produced.
    pub fn tick(&mut self, instruction: Instruction) -> TickFlags {
        self.move_racer(instruction);

        let mut flags = TickFlags::NONE;
        if self.resolve_collisions() {
            flags |= TickFlags::COLLIDED;
        }
        if self.check_goals() {
            flags |= TickFlags::GOAL_REACHED;
        }
        flags
    }

    /// Restart and replay a full instruction sequence.
    pub fn simulate(&mut self, instructions: &[Instruction]) {
        self.restart();
        for &instruction in instructions {
            self.tick(instruction);
        }
    }

    /// Whether every goal has been reached.
    pub fn finished(&self) -> bool {
        self.reached_goals.iter().all(|&reached| reached)
    }

    /// Reset the racer to its load-time state, zero its velocity, and clear
    /// all reached goals. The pushed-state stack is left alone.
    pub fn restart(&mut self) {
        self.racer = self.initial_racer;
        self.racer.vx = 0;
        self.racer.vy = 0;

        for reached in &mut self.reached_goals {
            *reached = false;
        }
    }

    /// Push a snapshot of the mutable state (racer + reached goals).
    pub fn push(&mut self) {
        self.pushed_states.push(SaveState {
            racer: self.racer,
            reached_goals: self.reached_goals.clone(),
        });
    }

    /// Restore and remove the most recently pushed state.
    ///
    /// Panics when no state has been pushed; that is a driver bug, not a
    /// recoverable condition.
    pub fn pop(&mut self) {
        let state = self
            .pushed_states
            .pop()
            .expect("pop called with no pushed states");
        self.racer = state.racer;
        self.reached_goals = state.reached_goals;
    }

    /// Restore the most recently pushed state without removing it.
    ///
    /// Panics when no state has been pushed.
    pub fn apply(&mut self) {
        let state = self
            .pushed_states
            .last()
            .expect("apply called with no pushed states");
        self.racer = state.racer;
        self.reached_goals = state.reached_goals.clone();
    }

    pub fn asteroids(&self) -> &[Asteroid] {
        &self.asteroids
    }

    pub fn goals(&self) -> &[Goal] {
        &self.goals
    }

    /// Reached flags, index-parallel to [`Self::goals`].
    pub fn reached_goals(&self) -> &[bool] {
        &self.reached_goals
    }

    pub fn bounding_box(&self) -> Option<BoundingBox> {
        self.bounding_box
    }

    pub fn grid(&self) -> &SpatialGrid {
        &self.grid
    }

    pub fn initial_racer(&self) -> Racer {
        self.initial_racer
    }

    pub fn pushed_state_count(&self) -> usize {
        self.pushed_states.len()
    }

    /// Drag, acceleration, translation.
    fn move_racer(&mut self, instruction: Instruction) {
        let racer = &mut self.racer;

        racer.vx = racer.vx * Self::DRAG_FRACTION.0 / Self::DRAG_FRACTION.1;
        racer.vy = racer.vy * Self::DRAG_FRACTION.0 / Self::DRAG_FRACTION.1;

        racer.vx += i64::from(instruction.vx);
        racer.vy += i64::from(instruction.vy);

        racer.x += racer.vx;
        racer.y += racer.vy;
    }

    /// Iteratively push the racer out of asteroids and back inside the
    /// walls, at most [`Self::MAX_COLLISION_RESOLUTIONS`] passes. Returns
    /// whether any collision occurred; if so, the velocity is halved once.
    fn resolve_collisions(&mut self) -> bool {
        let mut collided = false;

        for _ in 0..Self::MAX_COLLISION_RESOLUTIONS {
            let mut collided_this_pass = false;

            let cell = self.grid.cell_of(self.racer.x, self.racer.y);
            for &index in self.grid.candidates(cell) {
                if push_out_of_asteroid(&mut self.racer, &self.asteroids[index]) {
                    collided_this_pass = true;
                    collided = true;
                    break;
                }
            }

            if let Some(bounds) = self.bounding_box {
                if push_inside_bounds(&mut self.racer, &bounds) {
                    collided_this_pass = true;
                    collided = true;
                }
            }

            if !collided_this_pass {
                break;
            }
        }

        if collided {
            self.racer.vx = self.racer.vx * Self::COLLISION_FRACTION.0 / Self::COLLISION_FRACTION.1;
            self.racer.vy = self.racer.vy * Self::COLLISION_FRACTION.0 / Self::COLLISION_FRACTION.1;
        }

        collided
    }

    /// Mark goals the racer is touching; returns whether a previously
    /// unreached goal flipped. Reached flags only reset on `restart`.
    fn check_goals(&mut self) -> bool {
        let mut new_goal_reached = false;

        for (goal, reached) in self.goals.iter().zip(self.reached_goals.iter_mut()) {
            let reach = self.racer.radius + goal.radius;
            if distance_squared(self.racer.x, self.racer.y, goal.x, goal.y) <= reach * reach {
                if !*reached {
                    new_goal_reached = true;
                }
                *reached = true;
            }
        }

        new_goal_reached
    }
}

impl Default for Simulation {
    fn default() -> Self {
        Self::new(Racer::default(), Vec::new(), Vec::new(), None)
    }
}

/// Displace the racer just outside an overlapping asteroid along the
/// center-to-center axis. Velocity is untouched; the caller halves it once
/// per colliding tick. Returns whether the racer was moved.
fn push_out_of_asteroid(racer: &mut Racer, asteroid: &Asteroid) -> bool {
    let reach = racer.radius + asteroid.radius;
    if distance_squared(racer.x, racer.y, asteroid.x, asteroid.y) > reach * reach {
        return false;
    }

    let distance = euclidean_distance(racer.x, racer.y, asteroid.x, asteroid.y);
    if distance == 0 {
        // Exactly coincident centers: there is no axis to push along.
        // Treated as non-colliding; the next tick's motion separates them.
        return false;
    }

    let nx = racer.x - asteroid.x;
    let ny = racer.y - asteroid.y;
    let push_by = distance - reach;

    racer.x -= nx * push_by / distance;
    racer.y -= ny * push_by / distance;

    true
}

/// Clamp the racer center so its full disk lies inside the walls, one axis
/// at a time. Returns whether any wall was violated.
fn push_inside_bounds(racer: &mut Racer, bounds: &BoundingBox) -> bool {
    let mut collided = false;

    if racer.x - racer.radius < bounds.min_x {
        racer.x = bounds.min_x + racer.radius;
        collided = true;
    }
    if racer.x + racer.radius > bounds.max_x {
        racer.x = bounds.max_x - racer.radius;
        collided = true;
    }
    if racer.y - racer.radius < bounds.min_y {
        racer.y = bounds.min_y + racer.radius;
        collided = true;
    }
    if racer.y + racer.radius > bounds.max_y {
        racer.y = bounds.max_y - racer.radius;
        collided = true;
    }

    collided
}
