//! Uniform spatial grid over the arena, pruning collision candidates.
//!
//! Built once when a simulation is constructed and read-only afterwards.
//! Each asteroid is registered in every cell touched by its bounding
//! square expanded by the racer radius, so looking up the single cell
//! containing the racer center is guaranteed to yield every asteroid the
//! racer could currently overlap.

use std::collections::HashMap;

use crate::types::{Asteroid, BoundingBox};

/// Sparse cell → asteroid-index mapping. Asteroids are referenced by their
/// index in the simulation's asteroid list; cells with no asteroids are
/// simply absent.
#[derive(Clone, Debug)]
pub struct SpatialGrid {
    grid_size: i64,
    bounds: Option<BoundingBox>,
    cells: HashMap<(i64, i64), Vec<usize>>,
}

impl SpatialGrid {
    /// Build the index. `grid_size` is one cell per ten asteroids (at least
    /// one); without a bounding box everything collapses into cell (0, 0).
    pub fn build(bounds: Option<BoundingBox>, asteroids: &[Asteroid], racer_radius: i64) -> Self {
        if let Some(bounds) = bounds {
            debug_assert!(
                bounds.width() > 0 && bounds.height() > 0,
                "degenerate bounding box"
            );
        }

        let grid_size = (asteroids.len() as i64 / 10).max(1);
        let mut grid = Self {
            grid_size,
            bounds,
            cells: HashMap::new(),
        };

        for (index, asteroid) in asteroids.iter().enumerate() {
            let reach = asteroid.radius + racer_radius;
            let (min_x, min_y) = grid.cell_of(asteroid.x - reach, asteroid.y - reach);
            let (max_x, max_y) = grid.cell_of(asteroid.x + reach, asteroid.y + reach);

            for cell_x in min_x..=max_x {
                for cell_y in min_y..=max_y {
                    grid.cells.entry((cell_x, cell_y)).or_default().push(index);
                }
            }
        }

        grid
    }

    /// Map a coordinate to its cell. Each cell covers `1/grid_size` of the
    /// arena's width and height; the mapping floors, so coordinates below
    /// the arena minimum land in negative cells.
    pub fn cell_of(&self, x: i64, y: i64) -> (i64, i64) {
        let Some(bounds) = self.bounds else {
            return (0, 0);
        };

        (
            ((x - bounds.min_x) * self.grid_size).div_euclid(bounds.width()),
            ((y - bounds.min_y) * self.grid_size).div_euclid(bounds.height()),
        )
    }

    /// Asteroid indices registered in the given cell.
    pub fn candidates(&self, cell: (i64, i64)) -> &[usize] {
        self.cells.get(&cell).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Asteroid indices registered for the cell containing the point.
    pub fn candidates_at(&self, x: i64, y: i64) -> &[usize] {
        self.candidates(self.cell_of(x, y))
    }

    pub fn grid_size(&self) -> i64 {
        self.grid_size
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::math::distance_squared;

    fn arena() -> BoundingBox {
        BoundingBox::new(-100_000, -100_000, 100_000, 100_000)
    }

    #[test]
    fn test_grid_size_scales_with_asteroid_count() {
        let asteroids: Vec<Asteroid> = (0..35)
            .map(|i| Asteroid::new(i * 1_000, 0, 100))
            .collect();

        let grid = SpatialGrid::build(Some(arena()), &asteroids, 1_000);
        assert_eq!(grid.grid_size(), 3);

        let grid = SpatialGrid::build(Some(arena()), &asteroids[..9], 1_000);
        assert_eq!(grid.grid_size(), 1);
    }

    #[test]
    fn test_single_cell_fallback_without_bounds() {
        let asteroids = vec![
            Asteroid::new(-90_000, -90_000, 500),
            Asteroid::new(90_000, 90_000, 500),
        ];

        let grid = SpatialGrid::build(None, &asteroids, 1_000);
        assert_eq!(grid.cell_of(-90_000, -90_000), (0, 0));
        assert_eq!(grid.cell_of(12_345, -54_321), (0, 0));
        assert_eq!(grid.candidates((0, 0)), &[0, 1]);
    }

    #[test]
    fn test_cell_mapping_floors_below_minimum() {
        let asteroids: Vec<Asteroid> = (0..20).map(|_| Asteroid::new(0, 0, 100)).collect();
        let grid = SpatialGrid::build(Some(arena()), &asteroids, 1_000);

        // grid_size = 2, cells are 100_000 wide.
        assert_eq!(grid.cell_of(-100_000, -100_000), (0, 0));
        assert_eq!(grid.cell_of(-1, -1), (0, 0));
        assert_eq!(grid.cell_of(0, 0), (1, 1));
        assert_eq!(grid.cell_of(-100_001, 0), (-1, 1));
    }

    #[test]
    fn test_asteroid_spanning_cells_is_registered_in_all() {
        let mut asteroids: Vec<Asteroid> = (0..20).map(|_| Asteroid::new(70_000, 70_000, 1)).collect();
        // One asteroid straddling the center of the arena.
        asteroids.push(Asteroid::new(0, 0, 5_000));

        let grid = SpatialGrid::build(Some(arena()), &asteroids, 1_000);
        let index = asteroids.len() - 1;

        for cell in [(0, 0), (0, 1), (1, 0), (1, 1)] {
            assert!(
                grid.candidates(cell).contains(&index),
                "central asteroid missing from cell {cell:?}"
            );
        }
    }

    proptest! {
        /// Any asteroid whose expanded disk contains a point appears among
        /// the candidates for that point's cell.
        #[test]
        fn prop_grid_candidates_are_sound(
            asteroids in proptest::collection::vec(
                (-90_000i64..90_000, -90_000i64..90_000, 100i64..30_000),
                1..40,
            ),
            x in -100_000i64..=100_000,
            y in -100_000i64..=100_000,
        ) {
            let racer_radius = 1_000;
            let asteroids: Vec<Asteroid> = asteroids
                .into_iter()
                .map(|(x, y, radius)| Asteroid::new(x, y, radius))
                .collect();

            let grid = SpatialGrid::build(Some(arena()), &asteroids, racer_radius);
            let candidates = grid.candidates_at(x, y);

            for (index, asteroid) in asteroids.iter().enumerate() {
                let reach = asteroid.radius + racer_radius;
                if distance_squared(x, y, asteroid.x, asteroid.y) <= reach * reach {
                    prop_assert!(
                        candidates.contains(&index),
                        "asteroid {} overlaps ({}, {}) but is not a candidate",
                        index, x, y
                    );
                }
            }
        }
    }
}
