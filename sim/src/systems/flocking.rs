//! Flocking stage - boid steering over the per-tick neighbor lists.
//!
//! The per-agent computation is a pure function over read-only slices, so
//! the whole stage is a data-parallel map. With the `parallel` feature the
//! agents are split across rayon's pool; results are collected in full
//! before any ship is written.

use crate::components::{Health, Player, Position, Velocity};
use crate::config::{FlockingConfig, SimConfig};
use crate::ship::Helm;
use crate::spatial::NeighborLists;
use bevy_ecs::prelude::*;
use glam::Vec2;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Below this squared distance two agents are treated as overlapping and
/// ignored, avoiding a division by zero.
const MIN_SQR_DISTANCE: f32 = 0.0001;

/// Read-only per-agent input to the steering and weapon stages.
#[derive(Debug, Clone, Copy, Default)]
pub struct AgentView {
    pub position: Vec2,
    pub velocity: Vec2,
    pub player: Player,
    /// False once the ship is pending death.
    pub alive: bool,
}

impl AgentView {
    pub fn new(position: &Position, velocity: &Velocity, player: &Player, health: &Health) -> Self {
        Self {
            position: position.0,
            velocity: velocity.0,
            player: *player,
            alive: health.is_alive(),
        }
    }
}

/// Separation, alignment, cohesion and enemy avoidance for one agent.
pub fn steer_agent(index: usize, agents: &[AgentView], neighbors: &[u32], config: &FlockingConfig) -> Vec2 {
    let me = agents[index];
    let sqr_neighbor = config.neighbor_radius * config.neighbor_radius;
    let sqr_separation = config.separation_distance * config.separation_distance;
    let sqr_avoidance = config.enemy_avoidance_radius * config.enemy_avoidance_radius;

    let mut separation = Vec2::ZERO;
    let mut alignment = Vec2::ZERO;
    let mut cohesion = Vec2::ZERO;
    let mut avoidance = Vec2::ZERO;
    let mut friends = 0u32;
    let mut enemies = 0u32;

    for &j in neighbors {
        let other = agents[j as usize];
        let to_other = other.position - me.position;
        let sqr_dist = to_other.length_squared();
        if sqr_dist <= MIN_SQR_DISTANCE {
            continue;
        }

        if other.player == me.player {
            if sqr_dist > sqr_neighbor {
                continue;
            }
            if sqr_dist < sqr_separation {
                separation -= to_other / sqr_dist;
            }
            alignment += other.velocity;
            cohesion += other.position;
            friends += 1;
        } else if sqr_dist <= sqr_avoidance {
            avoidance -= to_other / sqr_dist;
            enemies += 1;
        }
    }

    let mut result = Vec2::ZERO;
    if friends > 0 {
        let n = friends as f32;
        result += separation / n * config.separation_weight;
        result += (alignment / n).normalize_or_zero() * config.alignment_weight;
        result += (cohesion / n - me.position).normalize_or_zero() * config.cohesion_weight;
    }
    if enemies > 0 {
        result += avoidance / enemies as f32 * config.enemy_avoidance_weight;
    }
    result
}

/// Steering for every agent, indexed like `agents`.
pub fn compute_steering(agents: &[AgentView], lists: &NeighborLists, config: &FlockingConfig) -> Vec<Vec2> {
    #[cfg(feature = "parallel")]
    {
        (0..agents.len())
            .into_par_iter()
            .map(|i| steer_agent(i, agents, lists.neighbors(i), config))
            .collect()
    }

    #[cfg(not(feature = "parallel"))]
    {
        (0..agents.len())
            .map(|i| steer_agent(i, agents, lists.neighbors(i), config))
            .collect()
    }
}

/// Writes each ship's flocking vector for the movement stage.
pub fn flocking_system(
    config: Res<SimConfig>,
    neighbors: Res<NeighborLists>,
    mut ships: Query<(&Position, &Velocity, &Player, &Health, &mut Helm)>,
) {
    let agents: Vec<AgentView> = neighbors
        .entities
        .iter()
        .map(|&entity| match ships.get(entity) {
            Ok((position, velocity, player, health, _)) => AgentView::new(position, velocity, player, health),
            Err(_) => AgentView::default(),
        })
        .collect();

    let results = compute_steering(&agents, &neighbors, &config.flocking);
    for (&entity, steering) in neighbors.entities.iter().zip(results) {
        if let Ok((.., mut helm)) = ships.get_mut(entity) {
            helm.steering = steering;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spatial::SpatialGrid;

    fn agent(x: f32, y: f32, vx: f32, vy: f32, player: Player) -> AgentView {
        AgentView {
            position: Vec2::new(x, y),
            velocity: Vec2::new(vx, vy),
            player,
            alive: true,
        }
    }

    #[test]
    fn test_single_friend_combines_three_terms() {
        let agents = [
            agent(0.0, 0.0, 5.0, 0.0, Player::Player1),
            agent(1.0, 0.0, 0.0, 5.0, Player::Player1),
        ];
        let result = steer_agent(0, &agents, &[1], &FlockingConfig::default());
        // separation (-1.5, 0) + alignment (0, 1) + cohesion (1, 0)
        assert!((result - Vec2::new(-0.5, 1.0)).length() < 1e-5);
    }

    #[test]
    fn test_friend_at_separation_distance_only_aligns_and_coheres() {
        let agents = [
            agent(0.0, 0.0, 5.0, 0.0, Player::Player1),
            agent(2.0, 0.0, 0.0, 5.0, Player::Player1),
        ];
        let result = steer_agent(0, &agents, &[1], &FlockingConfig::default());
        // alignment (0, 1) + cohesion (1, 0), no separation term
        assert!((result - Vec2::new(1.0, 1.0)).length() < 1e-5);
    }

    #[test]
    fn test_enemy_avoidance_pushes_away() {
        let agents = [
            agent(0.0, 0.0, 5.0, 0.0, Player::Player1),
            agent(0.0, 2.0, 5.0, 0.0, Player::Player2),
        ];
        let result = steer_agent(0, &agents, &[1], &FlockingConfig::default());
        // -(0, 2) / 4 * weight 2
        assert!((result - Vec2::new(0.0, -1.0)).length() < 1e-5);
    }

    #[test]
    fn test_out_of_radius_and_overlapping_neighbors_ignored() {
        let agents = [
            agent(0.0, 0.0, 5.0, 0.0, Player::Player1),
            agent(0.0, 0.0, 0.0, 5.0, Player::Player1),
            agent(4.0, 0.0, 0.0, 5.0, Player::Player2),
            agent(6.0, 0.0, 0.0, 5.0, Player::Player1),
        ];
        let result = steer_agent(0, &agents, &[1, 2, 3], &FlockingConfig::default());
        assert_eq!(result, Vec2::ZERO);
    }

    #[test]
    fn test_no_neighbors_no_steering() {
        let agents = [agent(0.0, 0.0, 5.0, 0.0, Player::Player1)];
        assert_eq!(steer_agent(0, &agents, &[], &FlockingConfig::default()), Vec2::ZERO);
    }

    #[test]
    fn test_compute_steering_matches_per_agent() {
        let agents: Vec<AgentView> = (0..40)
            .map(|i| {
                let player = if i % 3 == 0 { Player::Player2 } else { Player::Player1 };
                agent((i % 7) as f32 * 1.3, (i / 7) as f32 * 1.1, 1.0, (i % 5) as f32, player)
            })
            .collect();
        let positions: Vec<Vec2> = agents.iter().map(|a| a.position).collect();
        let mut grid = SpatialGrid::new(3.0);
        grid.rebuild(&positions);
        let mut lists = NeighborLists::default();
        lists.build(&grid, 5.0, 20);

        let config = FlockingConfig::default();
        let batch = compute_steering(&agents, &lists, &config);
        for (i, v) in batch.iter().enumerate() {
            assert_eq!(*v, steer_agent(i, &agents, lists.neighbors(i), &config));
        }
    }

    #[test]
    fn test_system_writes_helm_steering() {
        use crate::components::ShipType;
        use crate::ship::ShipBundle;
        use crate::spatial::spatial_index_system;

        let config = SimConfig::default();
        let mut world = World::new();
        world.insert_resource(config.clone());
        world.insert_resource(SpatialGrid::default());
        world.insert_resource(NeighborLists::default());
        let ship = |x: f32, heading: Vec2| {
            ShipBundle::new(Player::Player1, ShipType::Red, Vec2::new(x, 0.0), heading, &config.ships, 0.0)
        };
        let a = world.spawn(ship(0.0, Vec2::X)).id();
        let b = world.spawn(ship(1.0, Vec2::Y)).id();

        let mut schedule = Schedule::default();
        schedule.add_systems((spatial_index_system, flocking_system).chain());
        schedule.run(&mut world);

        let steering = world.get::<Helm>(a).unwrap().steering;
        assert!((steering - Vec2::new(-0.5, 1.0)).length() < 1e-5);
        assert!(world.get::<Helm>(b).unwrap().steering.length() > 0.0);
    }
}
