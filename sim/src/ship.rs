//! Per-ship components and the bundle ships are spawned from.

use crate::components::{Health, Player, Position, ShipType, Target, Velocity};
use crate::config::ShipConfig;
use bevy_ecs::prelude::*;
use glam::Vec2;

/// Navigation state: the base target and the steering inputs movement reads.
#[derive(Component, Debug, Clone, Copy)]
pub struct Helm {
    pub target: Option<Target>,
    /// Attraction flips to repulsion inside this distance of the base target.
    pub min_target_distance: f32,
    /// Flocking result written by the steering stage.
    pub steering: Vec2,
    /// Current turn rate in degrees per second, including kill bonus.
    pub turn_rate: f32,
    pub orbit_jitter: Vec2,
    pub next_jitter_update: f32,
}

impl Helm {
    pub fn new(config: &ShipConfig, now: f32) -> Self {
        Self {
            target: None,
            min_target_distance: 0.0,
            steering: Vec2::ZERO,
            turn_rate: config.base_turn_rate,
            orbit_jitter: Vec2::ZERO,
            next_jitter_update: now,
        }
    }

    pub fn set_target(&mut self, target: Target, min_distance: f32) {
        self.target = Some(target);
        self.min_target_distance = min_distance;
    }

    /// Kill reward: faster turning, capped.
    pub fn register_kill(&mut self, config: &ShipConfig) {
        self.turn_rate = (self.turn_rate + config.kill_turn_bonus).min(config.max_turn_rate);
    }

    /// Let the kill bonus wear off toward the base turn rate.
    pub fn recover_turn_rate(&mut self, config: &ShipConfig, dt: f32) {
        if self.turn_rate > config.base_turn_rate {
            self.turn_rate =
                (self.turn_rate - config.turn_rate_recovery * dt).max(config.base_turn_rate);
        }
    }
}

/// Targeting and firing state.
#[derive(Component, Debug, Clone, Copy)]
pub struct Weapon {
    /// Cached enemy. Revalidated before every use.
    pub enemy: Option<Entity>,
    pub last_fire_time: Option<f32>,
    pub last_hit_time: f32,
    pub next_ai_update: f32,
}

impl Weapon {
    pub fn new(now: f32) -> Self {
        Self {
            enemy: None,
            last_fire_time: None,
            last_hit_time: now,
            next_ai_update: now,
        }
    }

    pub fn ready(&self, now: f32, cooldown: f32) -> bool {
        self.last_fire_time.map_or(true, |t| now - t >= cooldown)
    }
}

/// Everything a fleet unit is spawned with. Fleet membership is added
/// separately by the shipyard.
#[derive(Bundle, Debug, Clone)]
pub struct ShipBundle {
    pub player: Player,
    pub ship_type: ShipType,
    pub position: Position,
    pub velocity: Velocity,
    pub health: Health,
    pub helm: Helm,
    pub weapon: Weapon,
}

impl ShipBundle {
    pub fn new(
        player: Player,
        ship_type: ShipType,
        position: Vec2,
        heading: Vec2,
        config: &ShipConfig,
        now: f32,
    ) -> Self {
        let heading = heading.try_normalize().unwrap_or(Vec2::Y);
        Self {
            player,
            ship_type,
            position: Position(position),
            velocity: Velocity(heading * config.move_speed),
            health: Health::new(config.max_health),
            helm: Helm::new(config, now),
            weapon: Weapon::new(now),
        }
    }

    pub fn with_target(mut self, target: Target, min_distance: f32) -> Self {
        self.helm.set_target(target, min_distance);
        self
    }
}
