//! Keypoint visibility graph over a loaded simulation.
//!
//! A static preprocessor for solvers: it rings every asteroid and goal
//! with candidate waypoints, connects mutually visible pairs whose
//! approach angles don't skim into the parent obstacle, and adds a vertex
//! at each goal's exact center. The builder uses floating-point geometry
//! and is advisory only — nothing here feeds back into the deterministic
//! tick path.
//!
//! Vertex generation and the quadratic visibility sweep are grid
//! accelerated, and the sweep is parallelized; the output order is still
//! deterministic for a given simulation and configuration.

use std::collections::HashMap;
use std::f64::consts::{PI, TAU};
use std::fs;
use std::path::Path;

use glam::DVec2;
use rayon::prelude::*;

use crate::reader::{ParseError, RecordReader};
use crate::simulation::Simulation;
use crate::types::{ASTEROID_RADIUS, Asteroid, BoundingBox, RACER_RADIUS};

/// Tuning parameters for the graph builder.
///
/// The defaults are calibrated for the shipped map scale (asteroid radii
/// around [`ASTEROID_RADIUS`], racer radius [`RACER_RADIUS`]).
#[derive(Clone, Debug)]
pub struct GraphConfig {
    /// Keypoint density coefficient for asteroids: a circle of radius `r`
    /// gets `round(sqrt(r · rate))` keypoints.
    pub asteroid_keypoint_rate: f64,
    /// Keypoint density coefficient for goals.
    pub goal_keypoint_rate: f64,
    /// How far outside an asteroid its keypoints sit.
    pub asteroid_keypoint_offset: f64,
    /// How far outside a goal its keypoints sit.
    pub goal_keypoint_offset: f64,
    /// Candidate edges longer than this are discarded.
    pub max_edge_length: f64,
    /// Maximum angle at a keypoint between the direction to its parent
    /// asteroid's center and the edge direction. Filters edges that graze
    /// tangentially into the obstacle.
    pub max_edge_angle: f64,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            asteroid_keypoint_rate: (20.0 * 20.0) / ASTEROID_RADIUS as f64,
            goal_keypoint_rate: (12.0 * 12.0) / ASTEROID_RADIUS as f64,
            asteroid_keypoint_offset: 1.75 * RACER_RADIUS as f64,
            goal_keypoint_offset: 0.25 * RACER_RADIUS as f64,
            max_edge_length: 10.0 * ASTEROID_RADIUS as f64,
            max_edge_angle: (3.0 / 5.0) * PI,
        }
    }
}

/// What a graph vertex stands for. Keypoints remember the index of the
/// asteroid or goal they ring.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VertexKind {
    /// The racer's starting position.
    Start,
    AsteroidKeypoint(usize),
    GoalKeypoint(usize),
}

/// A graph vertex: integer coordinates plus provenance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Vertex {
    pub x: i64,
    pub y: i64,
    pub kind: VertexKind,
}

impl Vertex {
    fn position(&self) -> DVec2 {
        DVec2::new(self.x as f64, self.y as f64)
    }
}

/// The built graph: vertices plus undirected edges as index pairs.
#[derive(Clone, Debug, Default)]
pub struct KeypointGraph {
    pub vertices: Vec<Vertex>,
    pub edges: Vec<(usize, usize)>,
}

/// Error loading a keypoint graph file.
#[derive(thiserror::Error, Debug)]
pub enum GraphFileError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid graph file: {0}")]
    Parse(#[from] ParseError),

    #[error("line {line}: unknown vertex tag {tag:?}")]
    UnknownTag { line: usize, tag: String },

    #[error("line {line}: unmatched asteroid vertex")]
    UnmatchedAsteroid { line: usize },

    #[error("line {line}: unmatched goal vertex")]
    UnmatchedGoal { line: usize },

    #[error("line {line}: edge endpoint is not a vertex of this graph")]
    UnknownEndpoint { line: usize },
}

impl KeypointGraph {
    /// Build the graph for a simulation.
    ///
    /// Vertex 0 is always the racer's starting position. Keypoints that
    /// land inside another asteroid or outside the arena are discarded.
    /// Goal-center vertices are appended after the visibility sweep with
    /// direct edges to the keypoints of their goal.
    pub fn build(simulation: &Simulation, config: &GraphConfig) -> Self {
        let mut vertices = vec![Vertex {
            x: simulation.racer.x,
            y: simulation.racer.y,
            kind: VertexKind::Start,
        }];

        for (index, asteroid) in simulation.asteroids().iter().enumerate() {
            place_keypoints(
                simulation,
                *asteroid,
                config.asteroid_keypoint_rate,
                config.asteroid_keypoint_offset,
                VertexKind::AsteroidKeypoint(index),
                &mut vertices,
            );
        }

        for (index, goal) in simulation.goals().iter().enumerate() {
            place_keypoints(
                simulation,
                *goal,
                config.goal_keypoint_rate,
                config.goal_keypoint_offset,
                VertexKind::GoalKeypoint(index),
                &mut vertices,
            );
        }

        let mut edges = connect_visible_pairs(simulation, &vertices, config);

        // Goal centers come last and skip the visibility sweep: they only
        // link to the ring of their own goal.
        for (index, goal) in simulation.goals().iter().enumerate() {
            let center = vertices.len();
            for (other, vertex) in vertices.iter().enumerate() {
                if vertex.kind == VertexKind::GoalKeypoint(index) {
                    edges.push((center, other));
                }
            }
            vertices.push(Vertex {
                x: goal.x,
                y: goal.y,
                kind: VertexKind::GoalKeypoint(index),
            });
        }

        Self { vertices, edges }
    }

    /// Save the graph as text: a `V E` header, one vertex line each
    /// (`x y S` or `x y A|G parent_x parent_y`), then one `x1 y1 x2 y2`
    /// line per edge.
    pub fn save(&self, simulation: &Simulation, path: impl AsRef<Path>) -> std::io::Result<()> {
        let mut contents = String::new();
        contents.push_str(&format!("{} {}\n", self.vertices.len(), self.edges.len()));

        for vertex in &self.vertices {
            match vertex.kind {
                VertexKind::Start => {
                    contents.push_str(&format!("{} {} S\n", vertex.x, vertex.y));
                }
                VertexKind::AsteroidKeypoint(index) => {
                    let parent = simulation.asteroids()[index];
                    contents.push_str(&format!(
                        "{} {} A {} {}\n",
                        vertex.x, vertex.y, parent.x, parent.y
                    ));
                }
                VertexKind::GoalKeypoint(index) => {
                    let parent = simulation.goals()[index];
                    contents.push_str(&format!(
                        "{} {} G {} {}\n",
                        vertex.x, vertex.y, parent.x, parent.y
                    ));
                }
            }
        }

        for &(i, j) in &self.edges {
            let (u, v) = (self.vertices[i], self.vertices[j]);
            contents.push_str(&format!("{} {} {} {}\n", u.x, u.y, v.x, v.y));
        }

        fs::write(path, contents)
    }

    /// Load a graph saved by [`Self::save`], resolving keypoint parents
    /// against the given simulation. `#` lines are comments.
    pub fn load(
        path: impl AsRef<Path>,
        simulation: &Simulation,
    ) -> Result<Self, GraphFileError> {
        let contents = fs::read_to_string(path)?;
        Self::from_graph_str(&contents, simulation)
    }

    /// Parse a graph from text. See [`Self::load`].
    pub fn from_graph_str(
        contents: &str,
        simulation: &Simulation,
    ) -> Result<Self, GraphFileError> {
        let mut reader = RecordReader::new(contents);

        let (header_line, [vertex_count, edge_count]) = reader.next_record::<2>("graph header")?;
        for count in [vertex_count, edge_count] {
            if count < 0 {
                return Err(ParseError::InvalidCount {
                    line: header_line,
                    value: count,
                }
                .into());
            }
        }

        let mut vertices = Vec::with_capacity(vertex_count as usize);
        let mut positions: HashMap<(i64, i64), usize> = HashMap::new();

        for _ in 0..vertex_count {
            let (line_number, line) = reader.next_line("vertex record")?;
            let vertex = parse_vertex(line, line_number, simulation)?;

            positions.entry((vertex.x, vertex.y)).or_insert(vertices.len());
            vertices.push(vertex);
        }

        let mut edges = Vec::with_capacity(edge_count as usize);
        for _ in 0..edge_count {
            let (line_number, [x1, y1, x2, y2]) = reader.next_record::<4>("edge record")?;

            let endpoint = |x, y| {
                positions
                    .get(&(x, y))
                    .copied()
                    .ok_or(GraphFileError::UnknownEndpoint { line: line_number })
            };
            edges.push((endpoint(x1, y1)?, endpoint(x2, y2)?));
        }

        Ok(Self { vertices, edges })
    }
}

fn parse_vertex(
    line: &str,
    line_number: usize,
    simulation: &Simulation,
) -> Result<Vertex, GraphFileError> {
    let [x, y] = crate::reader::parse_fields::<2>(line, line_number, "vertex coordinates")?;

    let tag = line
        .split_whitespace()
        .nth(2)
        .ok_or(ParseError::MissingField {
            line: line_number,
            expected: "vertex tag",
        })?;

    let kind = match tag {
        "S" => VertexKind::Start,
        "A" | "G" => {
            let parent_fields: Vec<&str> = line.split_whitespace().skip(3).take(2).collect();
            if parent_fields.len() < 2 {
                return Err(ParseError::MissingField {
                    line: line_number,
                    expected: "parent coordinates",
                }
                .into());
            }
            let parent: Vec<i64> = parent_fields
                .iter()
                .map(|token| {
                    token.parse().map_err(|_| ParseError::InvalidInteger {
                        line: line_number,
                        token: token.to_string(),
                    })
                })
                .collect::<Result<_, _>>()?;
            let (parent_x, parent_y) = (parent[0], parent[1]);

            if tag == "A" {
                let index = simulation
                    .grid()
                    .candidates_at(parent_x, parent_y)
                    .iter()
                    .copied()
                    .find(|&index| {
                        let asteroid = simulation.asteroids()[index];
                        asteroid.x == parent_x && asteroid.y == parent_y
                    })
                    .ok_or(GraphFileError::UnmatchedAsteroid { line: line_number })?;
                VertexKind::AsteroidKeypoint(index)
            } else {
                let index = simulation
                    .goals()
                    .iter()
                    .position(|goal| goal.x == parent_x && goal.y == parent_y)
                    .ok_or(GraphFileError::UnmatchedGoal { line: line_number })?;
                VertexKind::GoalKeypoint(index)
            }
        }
        other => {
            return Err(GraphFileError::UnknownTag {
                line: line_number,
                tag: other.to_string(),
            });
        }
    };

    Ok(Vertex { x, y, kind })
}

/// Ring a circle with evenly spaced keypoints, discarding any that fall
/// inside an asteroid or out of bounds.
fn place_keypoints(
    simulation: &Simulation,
    circle: Asteroid,
    rate: f64,
    offset: f64,
    kind: VertexKind,
    vertices: &mut Vec<Vertex>,
) {
    let count = (circle.radius as f64 * rate).sqrt().round() as usize;
    let center = DVec2::new(circle.x as f64, circle.y as f64);
    let ring_radius = circle.radius as f64 + offset;

    for k in 0..count {
        let angle = (k as f64 / count as f64) * TAU;
        let point = center + DVec2::new(angle.cos(), angle.sin()) * ring_radius;

        if point_in_any_asteroid(simulation, point)
            || !point_in_bounds(simulation.bounding_box(), point)
        {
            continue;
        }

        vertices.push(Vertex {
            x: point.x.round() as i64,
            y: point.y.round() as i64,
            kind,
        });
    }
}

/// The quadratic visibility sweep: every unordered vertex pair that passes
/// the length, angle, and clearance filters becomes an edge. Parallelized
/// over the first index; `flat_map_iter` keeps the output ordered.
fn connect_visible_pairs(
    simulation: &Simulation,
    vertices: &[Vertex],
    config: &GraphConfig,
) -> Vec<(usize, usize)> {
    let sweep_offset = simulation.racer.radius as f64;

    (0..vertices.len())
        .into_par_iter()
        .flat_map_iter(|i| {
            let u = vertices[i];
            (i + 1..vertices.len()).filter_map(move |j| {
                let v = vertices[j];

                if u.position().distance(v.position()) > config.max_edge_length {
                    return None;
                }
                if !edge_angles_ok(simulation, u, v, config.max_edge_angle) {
                    return None;
                }
                if !segment_is_clear(simulation, u.position(), v.position(), sweep_offset) {
                    return None;
                }

                Some((i, j))
            })
        })
        .collect()
}

/// Check the edge-to-parent angle at both endpoints. Only asteroid
/// keypoints constrain the angle: edges are supposed to enter goals.
fn edge_angles_ok(simulation: &Simulation, u: Vertex, v: Vertex, max_edge_angle: f64) -> bool {
    for (from, to) in [(u, v), (v, u)] {
        if let VertexKind::AsteroidKeypoint(index) = from.kind {
            let parent = simulation.asteroids()[index];
            let angle = angle_at(
                from.position(),
                DVec2::new(parent.x as f64, parent.y as f64),
                to.position(),
            );
            if angle > max_edge_angle {
                return false;
            }
        }
    }
    true
}

/// Angle at `vertex` between the directions to `first` and `second`.
/// Degenerate (zero-length) directions produce NaN, which never exceeds
/// the threshold and therefore keeps the edge.
fn angle_at(vertex: DVec2, first: DVec2, second: DVec2) -> f64 {
    let a = first - vertex;
    let b = second - vertex;
    let cos = (a.dot(b) / (a.length() * b.length())).clamp(-1.0, 1.0);
    cos.acos()
}

/// Whether the point lies strictly inside any asteroid (grid-accelerated:
/// only the point's cell is inspected).
fn point_in_any_asteroid(simulation: &Simulation, point: DVec2) -> bool {
    let candidates = simulation
        .grid()
        .candidates_at(point.x.round() as i64, point.y.round() as i64);

    candidates.iter().any(|&index| {
        let asteroid = simulation.asteroids()[index];
        point.distance(DVec2::new(asteroid.x as f64, asteroid.y as f64)) <= asteroid.radius as f64
    })
}

/// Absent bounding box means an unbounded arena.
fn point_in_bounds(bounds: Option<BoundingBox>, point: DVec2) -> bool {
    let Some(bounds) = bounds else {
        return true;
    };

    bounds.min_x as f64 <= point.x
        && point.x <= bounds.max_x as f64
        && bounds.min_y as f64 <= point.y
        && point.y <= bounds.max_y as f64
}

/// Whether the segment, swept by `offset`, stays clear of every asteroid
/// registered in the cells spanned by its endpoints' cell rectangle.
fn segment_is_clear(simulation: &Simulation, p1: DVec2, p2: DVec2, offset: f64) -> bool {
    let grid = simulation.grid();
    let (cx1, cy1) = grid.cell_of(p1.x.round() as i64, p1.y.round() as i64);
    let (cx2, cy2) = grid.cell_of(p2.x.round() as i64, p2.y.round() as i64);

    for cell_x in cx1.min(cx2)..=cx1.max(cx2) {
        for cell_y in cy1.min(cy2)..=cy1.max(cy2) {
            for &index in grid.candidates((cell_x, cell_y)) {
                let asteroid = simulation.asteroids()[index];
                let center = DVec2::new(asteroid.x as f64, asteroid.y as f64);
                if distance_to_segment(center, p1, p2) <= asteroid.radius as f64 + offset {
                    return false;
                }
            }
        }
    }

    true
}

/// Distance from a point to a line segment.
fn distance_to_segment(point: DVec2, a: DVec2, b: DVec2) -> f64 {
    let ab = b - a;
    let length_squared = ab.length_squared();
    if length_squared == 0.0 {
        return point.distance(a);
    }

    let t = ((point - a).dot(ab) / length_squared).clamp(0.0, 1.0);
    point.distance(a + ab * t)
}
