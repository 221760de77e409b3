//! Spatial partitioning for efficient neighbor queries.
//!
//! The grid is rebuilt once per tick from the ship query's iteration order and
//! queried once per ship at the largest radius any consumer needs. The
//! resulting [`NeighborLists`] are shared by flocking, targeting, and the
//! weapon line check; each consumer filters by its own squared radius.

use crate::components::Position;
use crate::config::SimConfig;
use bevy_ecs::prelude::*;
use glam::Vec2;
use std::collections::HashMap;

/// Grid-based spatial partitioning over dense agent indices.
#[derive(Resource, Debug)]
pub struct SpatialGrid {
    /// Cell size in world units.
    pub cell_size: f32,
    cells: HashMap<(i32, i32), Vec<u32>>,
    positions: Vec<Vec2>,
}

impl Default for SpatialGrid {
    fn default() -> Self {
        Self::new(10.0)
    }
}

impl SpatialGrid {
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size: cell_size.max(0.01),
            cells: HashMap::new(),
            positions: Vec::new(),
        }
    }

    #[inline]
    pub fn world_to_cell(&self, p: Vec2) -> (i32, i32) {
        (
            (p.x / self.cell_size).floor() as i32,
            (p.y / self.cell_size).floor() as i32,
        )
    }

    /// Replace the contents with `positions`; entry `i` is agent `i`.
    pub fn rebuild(&mut self, positions: &[Vec2]) {
        for bucket in self.cells.values_mut() {
            bucket.clear();
        }
        self.positions.clear();
        self.positions.extend_from_slice(positions);
        for (i, &p) in positions.iter().enumerate() {
            let cell = self.world_to_cell(p);
            self.cells.entry(cell).or_default().push(i as u32);
        }
        // cells nobody occupies any more
        self.cells.retain(|_, bucket| !bucket.is_empty());
    }

    /// Number of occupied cells.
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Agents within `radius` of `center`, as `(distance², index)` sorted
    /// nearest first (ties by index). `exclude` skips one agent.
    pub fn query_radius(&self, center: Vec2, radius: f32, exclude: Option<u32>, out: &mut Vec<(f32, u32)>) {
        out.clear();
        let radius_sq = radius * radius;
        let reach = (radius / self.cell_size).ceil() as i32;
        let (cx, cy) = self.world_to_cell(center);

        for dx in -reach..=reach {
            for dy in -reach..=reach {
                let Some(bucket) = self.cells.get(&(cx + dx, cy + dy)) else {
                    continue;
                };
                for &i in bucket {
                    if Some(i) == exclude {
                        continue;
                    }
                    let d2 = self.positions[i as usize].distance_squared(center);
                    if d2 <= radius_sq {
                        out.push((d2, i));
                    }
                }
            }
        }

        out.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
    }
}

/// Per-tick neighbor lists in compressed form: agent `i`'s neighbors are
/// `indices[start..start + count]` where `(start, count) = ranges[i]`.
#[derive(Resource, Debug, Default)]
pub struct NeighborLists {
    /// Ship entities in the dense order the lists were built for.
    pub entities: Vec<Entity>,
    indices: Vec<u32>,
    ranges: Vec<(u32, u32)>,
}

impl NeighborLists {
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn neighbors(&self, agent: usize) -> &[u32] {
        match self.ranges.get(agent) {
            Some(&(start, count)) => &self.indices[start as usize..(start + count) as usize],
            None => &[],
        }
    }

    /// Build lists for every agent in `grid`, capped at `max_neighbors` each.
    pub fn build(&mut self, grid: &SpatialGrid, radius: f32, max_neighbors: usize) {
        self.indices.clear();
        self.ranges.clear();
        let mut scratch = Vec::new();
        for i in 0..grid.len() {
            let start = self.indices.len() as u32;
            grid.query_radius(grid.positions[i], radius, Some(i as u32), &mut scratch);
            self.indices
                .extend(scratch.iter().take(max_neighbors).map(|&(_, j)| j));
            let count = self.indices.len() as u32 - start;
            self.ranges.push((start, count));
        }
    }
}

/// Rebuilds the grid and neighbor lists from every ship. Runs first each tick.
pub fn spatial_index_system(
    config: Res<SimConfig>,
    ships: Query<(Entity, &Position)>,
    mut grid: ResMut<SpatialGrid>,
    mut neighbors: ResMut<NeighborLists>,
) {
    let mut positions = Vec::with_capacity(neighbors.entities.len());
    neighbors.entities.clear();
    for (entity, position) in &ships {
        neighbors.entities.push(entity);
        positions.push(position.0);
    }

    grid.rebuild(&positions);
    neighbors.build(&grid, config.query_radius(), config.max_neighbors);
}
