//! Simulation tuning.
//!
//! Every knob the simulation reads lives here so the presentation layer can
//! ship a single JSON document instead of per-prefab settings. Missing fields
//! fall back to their defaults.

use crate::components::Player;
use crate::error::SimResult;
use bevy_ecs::prelude::*;
use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Top-level configuration, stored as a resource in the simulation world.
#[derive(Resource, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Fixed timestep in seconds (e.g., 1/30 = 0.0333 for 30 Hz).
    pub fixed_timestep: f32,
    /// Seed for the simulation RNG (spawn scatter, headings, jitter).
    pub seed: u64,
    /// Spatial grid cell size in world units.
    pub spatial_cell_size: f32,
    /// Upper bound on neighbors recorded per ship per tick.
    pub max_neighbors: usize,
    /// Capacity of the ship pool.
    pub max_ships: usize,
    /// Player whose fleet transfers are filtered by the active mask.
    pub human_player: Player,
    /// Global production-rate scaling factor.
    pub production_factor: f32,
    pub ships: ShipConfig,
    pub flocking: FlockingConfig,
    pub combat: CombatConfig,
    pub planets: PlanetConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            fixed_timestep: 1.0 / 30.0,
            seed: 0x5eed_3a51,
            spatial_cell_size: 10.0,
            max_neighbors: 20,
            max_ships: 2048,
            human_player: Player::Player1,
            production_factor: 1.0,
            ships: ShipConfig::default(),
            flocking: FlockingConfig::default(),
            combat: CombatConfig::default(),
            planets: PlanetConfig::default(),
        }
    }
}

impl SimConfig {
    /// Parse a configuration from JSON. Absent fields keep their defaults.
    pub fn from_json_str(json: &str) -> SimResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Radius the spatial index is queried at: the largest of the radii
    /// consumed during a tick.
    pub fn query_radius(&self) -> f32 {
        self.flocking
            .neighbor_radius
            .max(self.flocking.enemy_avoidance_radius)
            .max(self.combat.detection_radius)
            .max(self.combat.weapon_range + self.ships.hull_radius)
    }
}

/// Per-ship movement and lifecycle tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShipConfig {
    /// Constant speed magnitude (units per second).
    pub move_speed: f32,
    /// Turn rate a freshly spawned ship starts with (degrees per second).
    pub base_turn_rate: f32,
    /// Cap on turn rate after kill bonuses.
    pub max_turn_rate: f32,
    /// Turn rate added per kill.
    pub kill_turn_bonus: f32,
    /// Rate at which the kill bonus wears off (degrees per second, per second).
    pub turn_rate_recovery: f32,
    pub max_health: f32,
    /// Collision radius used by the weapon line check.
    pub hull_radius: f32,
    /// Seconds between enemy target re-evaluations.
    pub ai_update_interval: f32,
    /// Seconds without landing a hit before orbit-break mode engages.
    pub orbit_break_time: f32,
    pub aggressive_turn_multiplier: f32,
    pub orbit_break_jitter: f32,
    /// Minimum seconds between jitter re-rolls (plus up to 0.2 s random).
    pub jitter_interval: f32,
}

impl Default for ShipConfig {
    fn default() -> Self {
        Self {
            move_speed: 5.0,
            base_turn_rate: 90.0,
            max_turn_rate: 180.0,
            kill_turn_bonus: 15.0,
            turn_rate_recovery: 5.0,
            max_health: 100.0,
            hull_radius: 0.3,
            ai_update_interval: 0.1,
            orbit_break_time: 3.0,
            aggressive_turn_multiplier: 2.0,
            orbit_break_jitter: 0.5,
            jitter_interval: 0.3,
        }
    }
}

/// Boid weights and radii.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FlockingConfig {
    pub neighbor_radius: f32,
    pub separation_distance: f32,
    pub enemy_avoidance_radius: f32,
    pub separation_weight: f32,
    pub alignment_weight: f32,
    pub cohesion_weight: f32,
    pub enemy_avoidance_weight: f32,
    pub target_weight: f32,
    /// Ships stop chasing enemies once this far from their base target.
    pub max_distance_from_target: f32,
    /// Stand-off distance behind a pursued enemy's heading.
    pub target_behind_distance: f32,
}

impl Default for FlockingConfig {
    fn default() -> Self {
        Self {
            neighbor_radius: 5.0,
            separation_distance: 2.0,
            enemy_avoidance_radius: 3.0,
            separation_weight: 1.5,
            alignment_weight: 1.0,
            cohesion_weight: 1.0,
            enemy_avoidance_weight: 2.0,
            target_weight: 2.0,
            max_distance_from_target: 5.0,
            target_behind_distance: 3.0,
        }
    }
}

/// Weapon tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    pub detection_radius: f32,
    pub weapon_range: f32,
    /// Distance ahead of the hull where the weapon line starts.
    pub muzzle_offset: f32,
    pub fire_cooldown: f32,
    pub weapon_damage: f32,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            detection_radius: 10.0,
            weapon_range: 5.0,
            muzzle_offset: 0.5,
            fire_cooldown: 1.0,
            weapon_damage: 20.0,
        }
    }
}

/// Planet economy and siege tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanetConfig {
    pub max_stockpile: u32,
    pub min_production_interval: f32,
    pub siege_decay_interval: f32,
    /// Ownership radius = factor × planet size.
    pub ownership_radius_factor: f32,
    /// Production interval multiplier when the active mask matches the planet type.
    pub mask_match_multiplier: f32,
    /// Production interval multiplier when a different mask is active.
    pub mask_mismatch_multiplier: f32,
    pub max_fleet_size: usize,
    pub spawn_offset: Vec2,
}

impl Default for PlanetConfig {
    fn default() -> Self {
        Self {
            max_stockpile: 100,
            min_production_interval: 0.1,
            siege_decay_interval: 1.0,
            ownership_radius_factor: 2.8,
            mask_match_multiplier: 0.5,
            mask_mismatch_multiplier: 1.5,
            max_fleet_size: 20,
            spawn_offset: Vec2::X,
        }
    }
}
